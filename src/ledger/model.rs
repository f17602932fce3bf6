use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const FULL_GOOD_TAGS: &[&str] = &[
    "good_route",
    "got_spawns",
    "good_trade",
    "played_life",
    "flank",
    "free_kill",
];
pub(crate) const FULL_BAD_TAGS: &[&str] = &[
    "bad_route",
    "lost_spawns",
    "bad_trade",
    "gave_up_life",
    "free_death",
];
/// Chips offered in the event variant, good plays first.
pub const EVENT_NAMES: &[&str] = &[
    "good_route",
    "got_spawns",
    "good_trade",
    "played_life",
    "flank",
    "free_kill",
    "bad_route",
    "lost_spawns",
    "bad_trade",
    "gave_up_life",
    "free_death",
];
pub(crate) const COMPACT_GOOD_TAGS: &[&str] = &["good_route", "good_trade", "free_kill"];
pub(crate) const COMPACT_BAD_TAGS: &[&str] = &["bad_route", "bad_trade", "free_death"];

/// Which kind of record a session collects. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordVariant {
    #[default]
    Events,
    Lives,
    LivesCompact,
}

impl RecordVariant {
    pub fn records_key(self) -> &'static str {
        match self {
            RecordVariant::Events => "events",
            RecordVariant::Lives | RecordVariant::LivesCompact => "lives",
        }
    }

    pub fn sequence_key(self) -> &'static str {
        match self {
            RecordVariant::Events => "seq",
            RecordVariant::Lives | RecordVariant::LivesCompact => "life_num",
        }
    }

    pub fn good_tags(self) -> &'static [&'static str] {
        match self {
            RecordVariant::Events => &[],
            RecordVariant::Lives => FULL_GOOD_TAGS,
            RecordVariant::LivesCompact => COMPACT_GOOD_TAGS,
        }
    }

    pub fn bad_tags(self) -> &'static [&'static str] {
        match self {
            RecordVariant::Events => &[],
            RecordVariant::Lives => FULL_BAD_TAGS,
            RecordVariant::LivesCompact => COMPACT_BAD_TAGS,
        }
    }

    pub fn event_names(self) -> &'static [&'static str] {
        match self {
            RecordVariant::Events => EVENT_NAMES,
            RecordVariant::Lives | RecordVariant::LivesCompact => &[],
        }
    }

    pub fn tag_names(self) -> impl Iterator<Item = &'static str> {
        self.good_tags()
            .iter()
            .chain(self.bad_tags().iter())
            .copied()
    }

    pub fn is_life(self) -> bool {
        !matches!(self, RecordVariant::Events)
    }

    pub fn accepts(self, body: &RecordBody) -> bool {
        match body {
            RecordBody::Event { .. } => !self.is_life(),
            RecordBody::Life { .. } => self.is_life(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordBody {
    #[serde(rename_all = "camelCase")]
    Event {
        event: String,
        value: u8,
        video_time: u64,
    },
    #[serde(rename_all = "camelCase")]
    Life {
        score: i64,
        tags: BTreeMap<String, bool>,
    },
}

impl RecordBody {
    pub fn event(event: impl Into<String>, video_time: u64) -> Self {
        RecordBody::Event {
            event: event.into(),
            value: 1,
            video_time,
        }
    }

    /// Builds a life body with every tag of the variant present, set only for `set_tags`.
    pub fn life<'a>(
        variant: RecordVariant,
        score: i64,
        set_tags: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut tags: BTreeMap<String, bool> = variant
            .tag_names()
            .map(|tag| (tag.to_string(), false))
            .collect();
        for tag in set_tags {
            tags.insert(tag.to_string(), true);
        }

        RecordBody::Life { score, tags }
    }

    pub fn is_tagged(&self, tag: &str) -> bool {
        match self {
            RecordBody::Event { .. } => false,
            RecordBody::Life { tags, .. } => tags.get(tag).copied().unwrap_or(false),
        }
    }

    /// Event values read as 0 or 1; life tags become exactly the variant's tag set.
    pub(crate) fn normalize(&mut self, variant: RecordVariant) {
        match self {
            RecordBody::Event { value, .. } => *value = (*value).min(1),
            RecordBody::Life { tags, .. } => {
                tags.retain(|tag, _| {
                    let known = variant.tag_names().any(|name| name == tag.as_str());
                    if !known {
                        tracing::warn!(tag = %tag, variant = ?variant, "Dropping tag outside the variant");
                    }
                    known
                });
                for tag in variant.tag_names() {
                    tags.entry(tag.to_string()).or_insert(false);
                }
            }
        }
    }
}

/// The mutable part of a record, as submitted by the tagging form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub player: String,
    pub mode: String,
    pub body: RecordBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub match_id: String,
    pub player: String,
    pub mode: String,
    pub sequence_number: u32,
    pub body: RecordBody,
    /// Keys found on a stored record that this build does not interpret.
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn video_time(&self) -> Option<u64> {
        match &self.body {
            RecordBody::Event { video_time, .. } => Some(*video_time),
            RecordBody::Life { .. } => None,
        }
    }

    pub fn score(&self) -> Option<i64> {
        match &self.body {
            RecordBody::Event { .. } => None,
            RecordBody::Life { score, .. } => Some(*score),
        }
    }
}
