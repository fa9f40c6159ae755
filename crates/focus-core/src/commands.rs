mod io_and_views;
mod modifiers;
mod task_ops;

use std::io::{self, BufRead, Write};

use chrono::Utc;
use tracing::{debug, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::Persistence;
use crate::prompt::{Answer, InputRequest, InputResponse};
use crate::render::Renderer;
use crate::session::Session;

pub use modifiers::parse_new_task;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "board",
        "list",
        "info",
        "start",
        "pause",
        "resume",
        "done",
        "move",
        "delete",
        "log",
        "tick",
        "watch",
        "export",
        "import",
        "stats",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Answers the board's questions on the terminal.
#[derive(Debug, Clone, Copy)]
pub struct Prompter {
    assume_yes: bool,
}

impl Prompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    pub fn ask(&self, request: &InputRequest) -> anyhow::Result<InputResponse> {
        if self.assume_yes && request.is_confirmation() {
            debug!(request = %request.message(), "auto-confirmed");
            return Ok(InputResponse::Confirmed(true));
        }

        let mut out = io::stderr().lock();
        let suffix = if request.is_confirmation() { " [y/N]" } else { "" };
        write!(out, "{}{suffix} ", request.message())?;
        out.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(InputResponse::Cancelled);
        }

        if request.is_confirmation() {
            Ok(InputResponse::from_confirmation_line(&line))
        } else if line.trim().is_empty() {
            Ok(InputResponse::Cancelled)
        } else {
            Ok(InputResponse::Text(line.trim().to_string()))
        }
    }
}

#[instrument(skip(session, cfg, renderer, prompter, inv))]
pub fn dispatch<P: Persistence>(
    session: &mut Session<P>,
    cfg: &Config,
    renderer: &mut Renderer,
    prompter: Prompter,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let command = inv.command.as_str();
    let mut args = inv.command_args;
    let prompter = if take_flag(&mut args, &["-y", "--yes"]) {
        Prompter::new(true)
    } else {
        prompter
    };

    debug!(command, args = ?args, "dispatching command");

    match command {
        "add" => task_ops::cmd_add(session, prompter, &args, now),
        "board" | "list" => io_and_views::cmd_board(session, renderer, &mut args, now),
        "info" => io_and_views::cmd_info(session, renderer, &mut args, now),
        "start" => task_ops::cmd_start(session, &args, now),
        "pause" => task_ops::cmd_pause(session, &args, now),
        "resume" => task_ops::cmd_resume(session, &args, now),
        "done" => task_ops::cmd_done(session, prompter, &args, now),
        "move" => task_ops::cmd_move(session, &args, now),
        "delete" => task_ops::cmd_delete(session, prompter, &args, now),
        "log" => task_ops::cmd_log(session, prompter, &args, now),
        "tick" => io_and_views::cmd_tick(session, &args),
        "watch" => io_and_views::cmd_watch(session, cfg, renderer, &args),
        "export" => io_and_views::cmd_export(session, &args),
        "import" => io_and_views::cmd_import(session, &args, now),
        "stats" => io_and_views::cmd_stats(session, renderer, &args),
        "_commands" => cmd_commands(),
        "_show" => cmd_show(cfg),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow::anyhow!("unknown command: {other}")),
    }
}

/// Removes every occurrence of the given flags, returning whether any was present.
fn take_flag(args: &mut Vec<String>, names: &[&str]) -> bool {
    let before = args.len();
    args.retain(|arg| !names.contains(&arg.as_str()));
    args.len() != before
}

fn report_answer(answer: &Answer) {
    match answer {
        Answer::Created { task_id } => println!("Created task {}.", short(task_id)),
        Answer::Completed {
            task_id,
            folded,
            repeated,
        } => {
            println!("Completed task {} (+{folded}m).", short(task_id));
            if *repeated {
                println!("Task repeats; deadline moved forward.");
            }
        }
        Answer::Deleted { task_id, title } => {
            println!("Deleted task {} '{title}'.", short(task_id))
        }
        Answer::MinutesAdded {
            task_id,
            minutes,
            spent,
        } => println!(
            "Logged {minutes}m on task {} ({spent}m spent).",
            short(task_id)
        ),
        Answer::Declined => println!("Nothing changed."),
    }
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn cmd_commands() -> anyhow::Result<()> {
    for name in known_command_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut pairs: Vec<_> = cfg.iter().collect();
    pairs.sort();
    for (key, value) in pairs {
        println!("{key}={value}");
    }
    for file in &cfg.loaded_files {
        println!("# loaded {}", file.display());
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Commands: add, board/list, info, start, pause, resume, done, move, delete, \
         log, tick, watch, export, import, stats, help, version\n\n\
         add <title> project:<name> minutes:<n> due:<date> [repeat:<daily|weekly|monthly>]\n\
         move <id> <todo|in-progress|done>\n\
         log <id> [minutes]\n\
         tick [seconds]        watch [seconds]\n\
         export [file|-]       import <file|->\n\
         stats [day|project]   board [--json]"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::datastore::MemoryStore;
    use crate::session::SessionOptions;
    use crate::task::Status;

    fn invocation(command: &str, args: &[&str]) -> Invocation {
        Invocation {
            command: command.to_string(),
            command_args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn abbreviations_must_be_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("wa", &known), Some("watch"));
        assert_eq!(expand_command_abbrev("d", &known), None);
        assert_eq!(expand_command_abbrev("don", &known), Some("done"));
    }

    #[test]
    fn add_start_and_done_through_dispatch() {
        let cfg = Config::default();
        let mut renderer = Renderer::new(&cfg).expect("renderer");
        let mut session = Session::open(
            MemoryStore::new(),
            Utc::now(),
            SessionOptions { seed_empty: false },
        );

        dispatch(
            &mut session,
            &cfg,
            &mut renderer,
            Prompter::new(false),
            invocation(
                "add",
                &["Write", "docs", "project:Work", "minutes:30", "due:tomorrow"],
            ),
        )
        .expect("add");
        let id = session.board().all()[0].id.clone();
        assert_eq!(session.board().all()[0].title, "Write docs");

        dispatch(
            &mut session,
            &cfg,
            &mut renderer,
            Prompter::new(false),
            invocation("start", &[&id[..6]]),
        )
        .expect("start");
        assert!(session.timers().is_running(&id));

        dispatch(
            &mut session,
            &cfg,
            &mut renderer,
            Prompter::new(false),
            invocation("done", &[&id[..6], "--yes"]),
        )
        .expect("done");
        assert_eq!(session.board().all()[0].status, Status::Done);
        assert!(!session.timers().is_running(&id));
    }

    #[test]
    fn take_flag_strips_every_occurrence() {
        let mut args = vec!["-y".to_string(), "abc".to_string(), "--yes".to_string()];
        assert!(take_flag(&mut args, &["-y", "--yes"]));
        assert_eq!(args, vec!["abc".to_string()]);
        assert!(!take_flag(&mut args, &["-y"]));
    }
}
