//! Questions the board asks its front end.
//!
//! Operations that need a human decision hand back an [`InputRequest`];
//! the front end answers whenever it can by passing the request back
//! together with an [`InputResponse`] to
//! [`Session::answer`](crate::session::Session::answer).

use serde::Serialize;

use crate::task::NewTask;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InputRequest {
    ConfirmComplete {
        task_id: String,
        title: String,
    },
    ConfirmDelete {
        task_id: String,
        title: String,
    },
    ExtraMinutes {
        task_id: String,
        title: String,
    },
    RepeatInterval {
        #[serde(skip)]
        draft: NewTask,
        title: String,
    },
}

impl InputRequest {
    pub fn message(&self) -> String {
        match self {
            Self::ConfirmComplete { title, .. } => format!("Mark \"{title}\" as done?"),
            Self::ConfirmDelete { title, .. } => format!("Delete \"{title}\"?"),
            Self::ExtraMinutes { title, .. } => {
                format!("How many minutes to add to \"{title}\"?")
            }
            Self::RepeatInterval { title, .. } => {
                format!("How often should \"{title}\" repeat? (daily, weekly, monthly)")
            }
        }
    }

    /// Whether a yes/no answer fits this request.
    pub fn is_confirmation(&self) -> bool {
        matches!(
            self,
            Self::ConfirmComplete { .. } | Self::ConfirmDelete { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResponse {
    Confirmed(bool),
    Text(String),
    Cancelled,
}

impl InputResponse {
    /// Reads a typed line as a yes/no answer.
    pub fn from_confirmation_line(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "ok" | "1" | "true" => Self::Confirmed(true),
            "" => Self::Cancelled,
            _ => Self::Confirmed(false),
        }
    }
}

/// What answering a request did.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Created { task_id: String },
    Completed { task_id: String, folded: u32, repeated: bool },
    Deleted { task_id: String, title: String },
    MinutesAdded { task_id: String, minutes: u32, spent: u32 },
    Declined,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_lines() {
        assert_eq!(
            InputResponse::from_confirmation_line(" Yes "),
            InputResponse::Confirmed(true)
        );
        assert_eq!(
            InputResponse::from_confirmation_line("n"),
            InputResponse::Confirmed(false)
        );
        assert_eq!(
            InputResponse::from_confirmation_line(""),
            InputResponse::Cancelled
        );
    }

    #[test]
    fn messages_name_the_task() {
        let request = InputRequest::ConfirmDelete {
            task_id: "1".to_string(),
            title: "Write kanban".to_string(),
        };
        assert!(request.message().contains("Write kanban"));
        assert!(request.is_confirmation());
    }
}
