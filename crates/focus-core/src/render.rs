use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::analytics::Series;
use crate::config::Config;
use crate::priority::Priority;
use crate::view::{BoardView, Card};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, view))]
    pub fn print_board(&mut self, view: &BoardView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        for (idx, column) in view.columns.iter().enumerate() {
            if idx > 0 {
                writeln!(out)?;
            }
            let heading = format!("{} ({})", column.title, column.cards.len());
            writeln!(out, "{}", self.paint(&heading, "1"))?;

            if column.cards.is_empty() {
                writeln!(out, "  (empty)")?;
                continue;
            }

            let headers = vec![
                "ID".to_string(),
                "Title".to_string(),
                "Project".to_string(),
                "Spent".to_string(),
                "Deadline".to_string(),
                "Priority".to_string(),
                "Timer".to_string(),
            ];
            let rows = column
                .cards
                .iter()
                .map(|card| self.card_row(card))
                .collect();
            write_table(&mut out, headers, rows)?;
        }

        Ok(())
    }

    fn card_row(&self, card: &Card) -> Vec<String> {
        let id: String = card.id.chars().take(8).collect();
        let priority = card
            .priority
            .map(|p| self.paint(p.as_str(), priority_color(p)))
            .unwrap_or_default();
        let spent = format!("{}/{}m", card.spent_minutes, card.planned_minutes);
        let spent = if card.spent_minutes > card.planned_minutes {
            self.paint(&spent, "31")
        } else {
            spent
        };
        let timer = match (card.elapsed_seconds, card.paused) {
            (Some(seconds), false) => self.paint(&format_clock(seconds), "32"),
            (Some(seconds), true) => format!("{} paused", format_clock(seconds)),
            (None, _) => String::new(),
        };
        let deadline = match card.repeat_interval {
            Some(interval) => format!("{} ({interval})", card.deadline),
            None => card.deadline.clone(),
        };

        vec![
            self.paint(&id, "33"),
            card.title.clone(),
            card.project.clone(),
            spent,
            deadline,
            priority,
            timer,
        ]
    }

    #[tracing::instrument(skip(self, card))]
    pub fn print_card_info(&mut self, card: &Card) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", card.id)?;
        writeln!(out, "title     {}", card.title)?;
        writeln!(out, "project   {}", card.project)?;
        writeln!(out, "status    {}", card.status)?;
        writeln!(out, "planned   {}m", card.planned_minutes)?;
        writeln!(out, "spent     {}m", card.spent_minutes)?;
        writeln!(out, "deadline  {}", card.deadline)?;
        if let Some(priority) = card.priority {
            writeln!(out, "priority  {priority}")?;
        }
        if let Some(progress) = card.deadline_progress {
            writeln!(out, "progress  {:.0}%", progress * 100.0)?;
        }
        if let Some(interval) = card.repeat_interval {
            writeln!(out, "repeat    {interval}")?;
        }
        if let Some(seconds) = card.elapsed_seconds {
            let state = if card.paused { "paused" } else { "running" };
            writeln!(out, "timer     {} ({state})", format_clock(seconds))?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, series))]
    pub fn print_series(&mut self, title: &str, series: &Series) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.paint(title, "1"))?;

        let peak = series.minutes.iter().copied().max().unwrap_or(0).max(1);
        let rows = series
            .iter()
            .map(|(label, minutes)| {
                let bar_len = (minutes * 30).div_ceil(peak) as usize;
                vec![
                    label.to_string(),
                    minutes.to_string(),
                    self.paint(&"#".repeat(bar_len), "36"),
                ]
            })
            .collect();
        write_table(
            &mut out,
            vec!["Key".to_string(), "Minutes".to_string(), String::new()],
            rows,
        )?;
        writeln!(out, "total {}m", series.total())?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Urgent => "31",
        Priority::Secondary => "33",
        Priority::Postpone => "90",
    }
}

/// `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_clock(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
