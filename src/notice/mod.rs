//! Notice presenter
//!
//! Message boxes shown to the user. Error boxes block until dismissed and
//! carry no decision; message boxes resolve to the chosen button or a
//! dismissal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Icon/severity of a message box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    #[default]
    None,
    Info,
    Warning,
    Error,
}

/// A message box with a button row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    pub buttons: Vec<String>,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::None,
            title: title.into(),
            message: message.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: NoticeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_buttons<I, S>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buttons = buttons.into_iter().map(Into::into).collect();
        self
    }
}

/// How the user answered a message box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResponse {
    /// Index into `Notice::buttons`
    Button(usize),
    /// Closed without choosing a button
    Dismissed,
}

/// Presents notices to the user
#[async_trait]
pub trait NoticePresenter: Send + Sync {
    /// Show a blocking error box
    fn show_error(&self, title: &str, body: &str);

    /// Show a message box and wait for the answer
    async fn show_message(&self, notice: Notice) -> DialogResponse;
}
