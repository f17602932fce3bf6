use serde::{Deserialize, Serialize};

use crate::ledger::{Ledger, RecordVariant};
use crate::links::watch_url;

/// Display-only framing of the embedded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropPreference {
    #[default]
    None,
    Full,
    Center,
    Tl,
    Tr,
    Bl,
    Br,
}

impl CropPreference {
    /// Unknown values read as `None`.
    pub fn from_stored(value: &str) -> Self {
        match value.trim() {
            "full" => CropPreference::Full,
            "center" => CropPreference::Center,
            "tl" => CropPreference::Tl,
            "tr" => CropPreference::Tr,
            "bl" => CropPreference::Bl,
            "br" => CropPreference::Br,
            _ => CropPreference::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CropPreference::None => "none",
            CropPreference::Full => "full",
            CropPreference::Center => "center",
            CropPreference::Tl => "tl",
            CropPreference::Tr => "tr",
            CropPreference::Bl => "bl",
            CropPreference::Br => "br",
        }
    }

    /// The zoom button flips between the bottom-left quadrant and no crop.
    pub fn toggled_zoom(self) -> Self {
        if self == CropPreference::Bl {
            CropPreference::None
        } else {
            CropPreference::Bl
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub match_url: String,
    pub match_id: Option<String>,
    pub player: String,
    pub mode: String,
    pub video_id: Option<String>,
    pub video_start_offset_seconds: u64,
    pub crop: CropPreference,
    pub ledger: Ledger,
}

impl Session {
    pub fn new(variant: RecordVariant) -> Self {
        Self {
            match_url: String::new(),
            match_id: None,
            player: String::new(),
            mode: String::new(),
            video_id: None,
            video_start_offset_seconds: 0,
            crop: CropPreference::None,
            ledger: Ledger::new(variant),
        }
    }

    pub fn variant(&self) -> RecordVariant {
        self.ledger.variant()
    }

    pub fn watch_url(&self) -> Option<String> {
        self.video_id.as_deref().map(watch_url)
    }

    pub fn clear_video(&mut self) {
        self.video_id = None;
        self.video_start_offset_seconds = 0;
    }
}
