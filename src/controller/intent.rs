use serde::{Deserialize, Serialize};

use crate::display::SessionSnapshot;
use crate::ledger::RecordFields;
use crate::session::CropPreference;

/// Everything the operator can do to a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Intent {
    SetMatchUrl(String),
    SetPlayer(String),
    SetMode(String),
    #[serde(rename_all = "camelCase")]
    SetVideoUrl {
        url: String,
        submitted: bool,
    },
    SetCrop(CropPreference),
    ToggleZoom,
    /// Event variant: one chip press at the current playback position.
    #[serde(rename_all = "camelCase")]
    TagEvent {
        event: String,
        playback_seconds: Option<f64>,
    },
    AppendLife(LifeFields),
    BeginEdit(usize),
    CancelEdit,
    UpdateRecord {
        index: usize,
        fields: RecordFields,
    },
    DeleteRecord(usize),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeFields {
    pub score: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeTarget {
    MatchUrl,
    VideoUrl,
}

/// Inline message next to an input; an empty message clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub target: NoticeTarget,
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(target: NoticeTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(target: NoticeTarget, message: impl Into<String>) -> Self {
        Self {
            target,
            message: message.into(),
            is_error: true,
        }
    }

    pub fn cleared(target: NoticeTarget) -> Self {
        Self::info(target, String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatched {
    /// False when the intent was declined or left the session unchanged.
    pub applied: bool,
    /// Inline messages to show or clear, at most one per input.
    pub notices: Vec<Notice>,
    pub snapshot: SessionSnapshot,
}

/// Synchronous questions and alerts put to the operator.
pub trait UserPrompt {
    fn confirm(&mut self, message: &str) -> bool;
    fn alert(&mut self, message: &str);
}
