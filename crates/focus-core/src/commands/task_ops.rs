use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use super::modifiers::{parse_count, parse_new_task};
use super::{Prompter, report_answer, short};
use crate::datastore::Persistence;
use crate::lifecycle::Outcome;
use crate::prompt::{Answer, InputResponse};
use crate::session::{Session, Submission};
use crate::task::Status;

fn target(args: &[String], command: &str) -> anyhow::Result<String> {
    args.first()
        .cloned()
        .ok_or_else(|| anyhow!("{command} requires a task id"))
}

#[instrument(skip(session, prompter, args, now))]
pub(super) fn cmd_add<P: Persistence>(
    session: &mut Session<P>,
    prompter: Prompter,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command add");

    let draft = parse_new_task(args, now)?;
    match session.submit(draft, now)? {
        Submission::Created { task_id } => {
            report_answer(&Answer::Created { task_id });
        }
        Submission::NeedsInput(request) => {
            let response = prompter.ask(&request)?;
            let answer = session.answer(request, response, now)?;
            report_answer(&answer);
        }
    }
    Ok(())
}

#[instrument(skip(session, args, now))]
pub(super) fn cmd_start<P: Persistence>(
    session: &mut Session<P>,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command start");
    let token = target(args, "start")?;
    let outcome = session.start(&token, now)?;
    report_outcome(&token, &outcome);
    Ok(())
}

#[instrument(skip(session, args, now))]
pub(super) fn cmd_pause<P: Persistence>(
    session: &mut Session<P>,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command pause");
    let token = target(args, "pause")?;
    let outcome = session.pause(&token, now)?;
    report_outcome(&token, &outcome);
    Ok(())
}

#[instrument(skip(session, args, now))]
pub(super) fn cmd_resume<P: Persistence>(
    session: &mut Session<P>,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command resume");
    let token = target(args, "resume")?;
    let outcome = session.resume(&token, now)?;
    report_outcome(&token, &outcome);
    Ok(())
}

#[instrument(skip(session, prompter, args, now))]
pub(super) fn cmd_done<P: Persistence>(
    session: &mut Session<P>,
    prompter: Prompter,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command done");
    let token = target(args, "done")?;
    let request = session.request_complete(&token)?;
    let response = prompter.ask(&request)?;
    let answer = session.answer(request, response, now)?;
    report_answer(&answer);
    Ok(())
}

#[instrument(skip(session, args, now))]
pub(super) fn cmd_move<P: Persistence>(
    session: &mut Session<P>,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command move");
    let token = target(args, "move")?;
    let status = args
        .get(1)
        .ok_or_else(|| anyhow!("move requires a column: todo, in-progress or done"))
        .and_then(|raw| Status::from_str(raw))?;
    let outcome = session.move_task(&token, status, now)?;
    report_outcome(&token, &outcome);
    Ok(())
}

#[instrument(skip(session, prompter, args, now))]
pub(super) fn cmd_delete<P: Persistence>(
    session: &mut Session<P>,
    prompter: Prompter,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command delete");
    let token = target(args, "delete")?;
    let request = session.request_delete(&token)?;
    let response = prompter.ask(&request)?;
    let answer = session.answer(request, response, now)?;
    report_answer(&answer);
    Ok(())
}

/// `log <id> [minutes]`; asks for the minutes when they are not given.
#[instrument(skip(session, prompter, args, now))]
pub(super) fn cmd_log<P: Persistence>(
    session: &mut Session<P>,
    prompter: Prompter,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command log");
    let token = target(args, "log")?;
    let request = session.request_extra_minutes(&token)?;
    let response = match args.get(1) {
        Some(raw) => {
            parse_count(Some(raw), "minutes").context("log")?;
            InputResponse::Text(raw.clone())
        }
        None => prompter.ask(&request)?,
    };
    let answer = session.answer(request, response, now)?;
    report_answer(&answer);
    Ok(())
}

fn report_outcome(token: &str, outcome: &Outcome) {
    let id = short(token);
    match outcome {
        Outcome::Started => println!("Started task {id}."),
        Outcome::Paused { folded } => println!("Paused task {id} (+{folded}m)."),
        Outcome::Resumed => println!("Resumed task {id}."),
        Outcome::Completed { folded, repeated } => {
            println!("Completed task {id} (+{folded}m).");
            if *repeated {
                println!("Task repeats; deadline moved forward.");
            }
        }
        Outcome::Reverted => println!("Moved task {id} back to planned."),
        Outcome::Unchanged => println!("Task {id} unchanged."),
    }
}
