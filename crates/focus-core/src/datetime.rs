use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Duration,
  NaiveDate,
  Utc
};

pub const DEADLINE_FORMAT: &str =
  "%Y-%m-%d";

/// Parses a stored deadline. Anything
/// other than a plain calendar date is
/// treated as absent.
#[must_use]
pub fn parse_deadline(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  NaiveDate::parse_from_str(
    trimmed,
    DEADLINE_FORMAT
  )
  .ok()
}

/// Deadlines are calendar dates read as
/// midnight UTC.
#[must_use]
pub fn deadline_instant(
  date: NaiveDate
) -> DateTime<Utc> {
  date
    .and_hms_opt(0, 0, 0)
    .map(|ndt| ndt.and_utc())
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[must_use]
pub fn today(
  now: DateTime<Utc>
) -> NaiveDate {
  now.date_naive()
}

#[must_use]
pub fn format_deadline(
  date: NaiveDate
) -> String {
  date
    .format(DEADLINE_FORMAT)
    .to_string()
}

/// Resolves a user-entered deadline:
/// `today`, `tomorrow`, `+Nd`, `+Nw` or
/// `YYYY-MM-DD`.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_deadline_expr(
  input: &str,
  now: DateTime<Utc>
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();
  let base = today(now);

  match lower.as_str() {
    | "today" => return Ok(base),
    | "tomorrow" => {
      return base
        .checked_add_signed(
          Duration::days(1)
        )
        .ok_or_else(|| {
          anyhow!(
            "failed to advance to \
             tomorrow"
          )
        });
    }
    | _ => {}
  }

  if let Some(rest) =
    lower.strip_prefix('+')
    && let Some(unit) =
      rest.chars().last()
  {
    let num: i64 = rest
      [..rest.len() - unit.len_utf8()]
      .parse()
      .context(
        "invalid relative number"
      )?;
    let duration = match unit {
      | 'd' => Duration::try_days(num),
      | 'w' => Duration::try_weeks(num),
      | other => {
        return Err(anyhow!(
          "unknown relative unit: \
           {other}"
        ));
      }
    };
    return duration
      .and_then(|d| {
        base.checked_add_signed(d)
      })
      .ok_or_else(|| {
        anyhow!(
          "relative deadline out of \
           range: {token}"
        )
      });
  }

  parse_deadline(token).ok_or_else(
    || {
      anyhow!(
        "unrecognized deadline: \
         {token}"
      )
    }
  )
}

/// Timestamps are stored as Unix epoch
/// milliseconds so backups stay
/// interchangeable with the browser
/// board's files.
pub mod epoch_millis_serde {
  pub mod option {
    use chrono::{
      DateTime,
      Utc
    };
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    pub fn serialize<S>(
      dt: &Option<DateTime<Utc>>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match dt {
        | Some(value) => serializer
          .serialize_i64(
            value.timestamp_millis()
          ),
        | None => {
          serializer.serialize_none()
        }
      }
    }

    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<
      Option<DateTime<Utc>>,
      D::Error
    >
    where
      D: Deserializer<'de>
    {
      let opt = Option::<f64>::deserialize(
        deserializer
      )?;
      match opt {
        | Some(raw) => {
          DateTime::<Utc>::from_timestamp_millis(raw as i64)
            .map(Some)
            .ok_or_else(|| {
              serde::de::Error::custom(
                format!(
                  "timestamp out of range: {raw}"
                )
              )
            })
        }
        | None => Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::{
    deadline_instant,
    format_deadline,
    parse_deadline,
    parse_deadline_expr
  };

  #[test]
  fn rejects_non_date_deadlines() {
    assert!(parse_deadline("").is_none());
    assert!(
      parse_deadline("next week")
        .is_none()
    );
    assert!(
      parse_deadline("2024-02-30")
        .is_none()
    );
    assert!(
      parse_deadline(" 2024-02-29 ")
        .is_some()
    );
  }

  #[test]
  fn huge_relative_deadline_is_an_error()
  {
    let now = Utc
      .with_ymd_and_hms(
        2024, 1, 10, 9, 0, 0
      )
      .single()
      .expect("valid now");
    for input in [
      "+200000000000d",
      "+9223372036854775807w",
      "+100000000d"
    ] {
      assert!(
        parse_deadline_expr(input, now)
          .is_err(),
        "{input} should be rejected"
      );
    }
    assert!(
      parse_deadline_expr("+2w", now)
        .is_ok()
    );
  }

  #[test]
  fn deadline_is_midnight_utc() {
    let date = parse_deadline(
      "2024-01-11"
    )
    .expect("valid date");
    assert_eq!(
      deadline_instant(date),
      Utc
        .with_ymd_and_hms(
          2024, 1, 11, 0, 0, 0
        )
        .single()
        .expect("valid instant")
    );
  }

  #[test]
  fn parses_relative_deadlines() {
    let now = Utc
      .with_ymd_and_hms(
        2024, 1, 10, 15, 30, 0
      )
      .single()
      .expect("valid now");
    let cases = [
      ("today", "2024-01-10"),
      ("tomorrow", "2024-01-11"),
      ("+3d", "2024-01-13"),
      ("+2w", "2024-01-24"),
      ("2024-03-01", "2024-03-01")
    ];
    for (input, expected) in cases {
      let parsed =
        parse_deadline_expr(input, now)
          .expect("parse deadline");
      assert_eq!(
        format_deadline(parsed),
        expected,
        "input {input}"
      );
    }
  }

  #[test]
  fn rejects_unknown_relative_unit() {
    let now = Utc
      .with_ymd_and_hms(
        2024, 1, 10, 0, 0, 0
      )
      .single()
      .expect("valid now");
    assert!(
      parse_deadline_expr("+3y", now)
        .is_err()
    );
    assert!(
      parse_deadline_expr("soon", now)
        .is_err()
    );
  }
}
