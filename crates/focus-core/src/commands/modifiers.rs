use anyhow::{
  Context,
  anyhow
};
use chrono::Utc;
use tracing::{
  debug,
  instrument
};

use crate::datetime::{
  format_deadline,
  parse_deadline_expr
};
use crate::task::NewTask;

#[derive(Debug, Clone, PartialEq)]
enum Mod {
  Project(String),
  Minutes(i64),
  Due(String),
  Repeat(String)
}

/// Builds the new-task form from
/// `add` arguments. Words are the
/// title; `project:`, `minutes:`
/// (or `plan:`), `due:` and `repeat:`
/// fill the other fields. Everything
/// after `--` is title text.
///
/// Field rules are left to
/// [`NewTask::validate`] so all
/// problems are reported together.
#[instrument(skip(args, now))]
pub fn parse_new_task(
  args: &[String],
  now: chrono::DateTime<Utc>
) -> anyhow::Result<NewTask> {
  let mut title_parts = Vec::new();
  let mut draft = NewTask::default();

  let mut literal = false;
  for arg in args {
    if arg == "--" {
      literal = true;
      continue;
    }

    if !literal
      && let Some(one_mod) =
        parse_one_mod(arg, now)?
    {
      apply_mod(&mut draft, one_mod);
      continue;
    }

    title_parts.push(arg.clone());
  }

  draft.title = title_parts.join(" ");
  debug!(title = %draft.title, "parsed add arguments");
  Ok(draft)
}

fn parse_one_mod(
  tok: &str,
  now: chrono::DateTime<Utc>
) -> anyhow::Result<Option<Mod>> {
  let Some((key, value)) =
    tok.split_once(':')
  else {
    return Ok(None);
  };

  let one_mod = match key
    .to_ascii_lowercase()
    .as_str()
  {
    | "project" | "pro" => {
      Mod::Project(value.to_string())
    }
    | "minutes" | "min" | "plan" => {
      let minutes = value
        .trim()
        .parse::<i64>()
        .with_context(|| {
          format!(
            "{key}: expects a whole \
             number of minutes, got \
             {value:?}"
          )
        })?;
      Mod::Minutes(minutes)
    }
    | "due" | "deadline" => {
      match parse_deadline_expr(
        value, now
      ) {
        | Ok(date) => Mod::Due(
          format_deadline(date)
        ),
        | Err(err) => {
          debug!(error = %err, "deadline left for validation");
          Mod::Due(value.to_string())
        }
      }
    }
    | "repeat" | "every" => {
      Mod::Repeat(value.to_string())
    }
    | _ => return Ok(None)
  };

  Ok(Some(one_mod))
}

fn apply_mod(
  draft: &mut NewTask,
  one_mod: Mod
) {
  match one_mod {
    | Mod::Project(project) => {
      draft.project = project
    }
    | Mod::Minutes(minutes) => {
      draft.planned_minutes = minutes
    }
    | Mod::Due(deadline) => {
      draft.deadline = deadline
    }
    | Mod::Repeat(interval) => {
      draft.repeat = Some(interval)
    }
  }
}

/// Reads the optional minutes argument
/// of `log` and `tick`.
pub(super) fn parse_count(
  arg: Option<&String>,
  what: &str
) -> anyhow::Result<Option<u64>> {
  arg
    .map(|raw| {
      raw.trim().parse::<u64>().map_err(
        |_| {
          anyhow!(
            "{what} must be a whole \
             number, got {raw:?}"
          )
        }
      )
    })
    .transpose()
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::*;

  fn args(
    raw: &[&str]
  ) -> Vec<String> {
    raw
      .iter()
      .map(|a| a.to_string())
      .collect()
  }

  fn now()
  -> chrono::DateTime<Utc> {
    Utc
      .with_ymd_and_hms(
        2024, 1, 10, 9, 0, 0
      )
      .single()
      .expect("valid now")
  }

  #[test]
  fn collects_title_and_fields() {
    let draft = parse_new_task(
      &args(&[
        "Write",
        "kanban",
        "project:FocusBoard",
        "minutes:90",
        "due:+2d",
        "repeat:weekly"
      ]),
      now()
    )
    .expect("parse");

    assert_eq!(
      draft.title,
      "Write kanban"
    );
    assert_eq!(
      draft.project,
      "FocusBoard"
    );
    assert_eq!(
      draft.planned_minutes,
      90
    );
    assert_eq!(
      draft.deadline,
      "2024-01-12"
    );
    assert_eq!(
      draft.repeat.as_deref(),
      Some("weekly")
    );
  }

  #[test]
  fn literal_marker_keeps_colons_in_title()
  {
    let draft = parse_new_task(
      &args(&[
        "project:Home",
        "--",
        "Read",
        "ch:3"
      ]),
      now()
    )
    .expect("parse");
    assert_eq!(
      draft.title,
      "Read ch:3"
    );
    assert_eq!(draft.project, "Home");
  }

  #[test]
  fn bad_deadline_is_left_for_validation()
  {
    let draft = parse_new_task(
      &args(&["x", "due:someday"]),
      now()
    )
    .expect("parse");
    assert_eq!(
      draft.deadline,
      "someday"
    );

    let far = parse_new_task(
      &args(&[
        "x",
        "project:a",
        "minutes:5",
        "due:+200000000000d"
      ]),
      now()
    )
    .expect("parse");
    assert_eq!(
      far.deadline,
      "+200000000000d"
    );
    assert!(far.validate(now()).is_err());
    assert!(
      parse_new_task(
        &args(&["x", "minutes:lots"]),
        now()
      )
      .is_err()
    );
  }
}
