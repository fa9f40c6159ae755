use std::fs;
use std::io::{
  self,
  Read,
  Write
};
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Utc
};
use tracing::{
  debug,
  info,
  instrument
};

use super::modifiers::parse_count;
use super::take_flag;
use crate::analytics::{
  minutes_by_day,
  minutes_by_project
};
use crate::config::Config;
use crate::datastore::Persistence;
use crate::render::Renderer;
use crate::session::Session;
use crate::transfer::EXPORT_FILE_NAME;

#[instrument(skip(
  session, renderer, args, now
))]
pub(super) fn cmd_board<
  P: Persistence
>(
  session: &mut Session<P>,
  renderer: &mut Renderer,
  args: &mut Vec<String>,
  now: DateTime<Utc>
) -> anyhow::Result<()> {
  info!("command board");

  let view = session.view(now);
  if take_flag(args, &["--json"]) {
    let out =
      serde_json::to_string_pretty(
        &view
      )?;
    println!("{out}");
    return Ok(());
  }

  renderer.print_board(&view)
}

#[instrument(skip(
  session, renderer, args, now
))]
pub(super) fn cmd_info<
  P: Persistence
>(
  session: &mut Session<P>,
  renderer: &mut Renderer,
  args: &mut Vec<String>,
  now: DateTime<Utc>
) -> anyhow::Result<()> {
  info!("command info");

  let json =
    take_flag(args, &["--json"]);
  let token =
    args.first().ok_or_else(|| {
      anyhow!(
        "info requires a task id"
      )
    })?;
  let id = session.resolve(token)?;
  let view = session.view(now);
  let card =
    view.card(&id).ok_or_else(|| {
      anyhow!("no task matches {id}")
    })?;

  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(
        card
      )?
    );
    return Ok(());
  }
  renderer.print_card_info(card)
}

/// Advances every running timer by the
/// given number of seconds (default 1).
#[instrument(skip(session, args))]
pub(super) fn cmd_tick<
  P: Persistence
>(
  session: &mut Session<P>,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command tick");

  let seconds =
    parse_count(args.first(), "seconds")?
      .unwrap_or(1);
  let running =
    session.timers().running_count();
  let folded = session.run_for(seconds);
  println!(
    "Ticked {seconds}s on \
     {running} timer(s); +{folded}m \
     spent."
  );
  Ok(())
}

/// Keeps the board on screen and the
/// timers ticking once per interval.
/// Runs until interrupted, or for the
/// given number of ticks.
#[instrument(skip(
  session, cfg, renderer, args
))]
pub(super) fn cmd_watch<
  P: Persistence
>(
  session: &mut Session<P>,
  cfg: &Config,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command watch");

  let limit =
    parse_count(args.first(), "ticks")?;
  let interval = Duration::from_millis(
    cfg
      .get_u64("watch.interval_ms")?
      .unwrap_or(1000)
      .max(1)
  );

  let mut ticks = 0_u64;
  loop {
    print!("\x1b[2J\x1b[H");
    io::stdout().flush()?;
    renderer
      .print_board(&session.view(Utc::now()))?;

    if limit.is_some_and(|max| ticks >= max)
    {
      break;
    }

    thread::sleep(interval);
    let report = session.tick();
    ticks += 1;
    if !report.folded.is_empty() {
      debug!(folded = ?report.folded, "minutes folded");
    }
  }

  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_export<
  P: Persistence
>(
  session: &mut Session<P>,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command export");

  let bytes = session
    .export()
    .context("failed to serialize board")?;
  let target = args
    .first()
    .map(String::as_str)
    .unwrap_or(EXPORT_FILE_NAME);

  if target == "-" {
    io::stdout().lock().write_all(&bytes)?;
    return Ok(());
  }

  let path = Path::new(target);
  fs::write(path, &bytes)
    .with_context(|| {
      format!(
        "failed to write {}",
        path.display()
      )
    })?;
  println!(
    "Exported {} task(s) to {}.",
    session.board().len(),
    path.display()
  );
  Ok(())
}

#[instrument(skip(session, args, now))]
pub(super) fn cmd_import<
  P: Persistence
>(
  session: &mut Session<P>,
  args: &[String],
  now: DateTime<Utc>
) -> anyhow::Result<()> {
  info!("command import");

  let source =
    args.first().ok_or_else(|| {
      anyhow!(
        "import requires a file \
         (or - for stdin)"
      )
    })?;

  let bytes = if source == "-" {
    let mut buf = Vec::new();
    io::stdin()
      .read_to_end(&mut buf)
      .context("failed to read stdin")?;
    buf
  } else {
    fs::read(source).with_context(
      || format!("failed to read {source}")
    )?
  };

  let count = session
    .import(&bytes, now)
    .with_context(|| {
      format!(
        "import of {source} failed; \
         board left unchanged"
      )
    })?;
  println!(
    "Imported {count} task(s)."
  );
  Ok(())
}

#[instrument(skip(
  session, renderer, args
))]
pub(super) fn cmd_stats<
  P: Persistence
>(
  session: &mut Session<P>,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command stats");

  let which = args
    .first()
    .map(|a| a.to_ascii_lowercase());
  let (by_day, by_project) =
    match which.as_deref() {
      | None => (true, true),
      | Some("day" | "days") => {
        (true, false)
      }
      | Some(
        "project" | "projects"
      ) => (false, true),
      | Some(other) => {
        return Err(anyhow!(
          "stats: expected day or \
           project, got {other}"
        ));
      }
    };

  if by_day {
    renderer.print_series(
      "Minutes by deadline",
      &minutes_by_day(session.board())
    )?;
  }
  if by_day && by_project {
    println!();
  }
  if by_project {
    renderer.print_series(
      "Minutes by project",
      &minutes_by_project(
        session.board()
      )
    )?;
  }
  Ok(())
}
