use chrono::{DateTime, TimeZone, Utc};
use focus_core::datastore::MemoryStore;
use focus_core::lifecycle::Outcome;
use focus_core::priority::Priority;
use focus_core::prompt::{Answer, InputRequest, InputResponse};
use focus_core::session::{Session, SessionOptions, Submission};
use focus_core::task::{NewTask, RepeatInterval, Status};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0)
        .single()
        .expect("valid now")
}

fn seeded() -> (Session<MemoryStore>, String) {
    let session = Session::open(MemoryStore::new(), now(), SessionOptions::default());
    let id = session.board().all()[0].id.clone();
    (session, id)
}

#[test]
fn two_minutes_five_seconds_of_work() {
    let (mut session, id) = seeded();
    session.start(&id, now()).expect("start");
    session.run_for(125);

    let task = session.board().find(&id).expect("task");
    assert_eq!(task.spent_minutes, 2);
    assert_eq!(session.timers().elapsed(&id), Some(125));
    assert_eq!(session.timers().unfolded(&id), Some(5));

    let card = session.view(now()).card(&id).cloned().expect("card");
    assert!(card.running);
    assert_eq!(card.priority, Some(Priority::Postpone));
}

#[test]
fn pause_and_resume_accumulate_into_one_minute() {
    let (mut session, id) = seeded();
    session.start(&id, now()).expect("start");
    session.run_for(30);

    assert_eq!(
        session.pause(&id, now()).expect("pause"),
        Outcome::Paused { folded: 0 }
    );
    session.run_for(10);
    assert_eq!(session.timers().elapsed(&id), Some(30));
    assert!(session.timers().is_paused(&id));

    assert_eq!(session.resume(&id, now()).expect("resume"), Outcome::Resumed);
    session.run_for(40);

    assert_eq!(session.board().find(&id).map(|t| t.spent_minutes), Some(1));
    assert_eq!(session.timers().elapsed(&id), Some(70));
    assert_eq!(session.timers().unfolded(&id), Some(10));
}

#[test]
fn completing_a_weekly_task_moves_its_deadline() {
    let mut session = Session::open(
        MemoryStore::new(),
        now(),
        SessionOptions { seed_empty: false },
    );
    let draft = NewTask {
        title: "Weekly review".to_string(),
        project: "Home".to_string(),
        planned_minutes: 20,
        deadline: "2024-01-10".to_string(),
        repeat: Some(String::new()),
    };

    let Submission::NeedsInput(request) = session.submit(draft, now()).expect("submit") else {
        panic!("expected a repeat interval question");
    };
    assert!(matches!(request, InputRequest::RepeatInterval { .. }));
    let Answer::Created { task_id } = session
        .answer(request, InputResponse::Text("weekly".to_string()), now())
        .expect("answer")
    else {
        panic!("expected a created task");
    };

    session.start(&task_id, now()).expect("start");
    session.run_for(90);
    let answer = session.complete(&task_id, now()).expect("complete");
    assert_eq!(
        answer,
        Answer::Completed {
            task_id: task_id.clone(),
            folded: 0,
            repeated: true,
        }
    );

    let task = session.board().find(&task_id).expect("task");
    assert_eq!(task.deadline, "2024-01-17");
    assert_eq!(task.spent_minutes, 0);
    assert_eq!(task.status, Status::Done);
    assert_eq!(task.repeat_interval, Some(RepeatInterval::Weekly));
    assert!(!session.timers().is_running(&task_id));
}

#[test]
fn finished_tasks_never_keep_a_timer() {
    let (mut session, id) = seeded();
    session.start(&id, now()).expect("start");
    session.run_for(59);
    session
        .move_task(&id, Status::Done, now())
        .expect("drag to done");
    session.run_for(120);

    let task = session.board().find(&id).expect("task");
    assert_eq!(task.status, Status::Done);
    assert_eq!(task.spent_minutes, 0);
    assert_eq!(task.start_time, None);
    assert_eq!(session.timers().running_count(), 0);
}

#[test]
fn declined_delete_changes_nothing() {
    let (mut session, id) = seeded();
    let request = session.request_delete(&id).expect("request");
    let answer = session
        .answer(request, InputResponse::Confirmed(false), now())
        .expect("answer");
    assert_eq!(answer, Answer::Declined);
    assert!(session.board().find(&id).is_some());

    let request = session.request_delete(&id).expect("request");
    session
        .answer(request, InputResponse::Confirmed(true), now())
        .expect("answer");
    assert!(session.board().is_empty());
}

#[test]
fn round_trip_keeps_every_task() {
    let (mut session, id) = seeded();
    session.start(&id, now()).expect("start");
    session.run_for(61);
    let before = session.board().clone();

    let backup = session.export().expect("export");
    let restored = focus_core::transfer::import(&backup).expect("import");
    assert_eq!(restored, before);
}

#[test]
fn corrupt_payload_opens_empty() {
    let session = Session::open(
        MemoryStore::with_payload("\u{0}garbage"),
        now(),
        SessionOptions { seed_empty: false },
    );
    assert!(session.board().is_empty());
}
