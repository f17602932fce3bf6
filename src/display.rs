use serde::Serialize;

use crate::ledger::{Record, RecordBody, RecordVariant};
use crate::session::{CropPreference, Session};

/// `m:ss` below an hour, `h:mm:ss` from there on.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn record_title(record: &Record) -> String {
    match &record.body {
        RecordBody::Event {
            event, video_time, ..
        } => format!("{} - {}", format_clock(*video_time), event.to_uppercase()),
        RecordBody::Life { score, .. } => {
            format!("Life #{} - score {score}", record.sequence_number)
        }
    }
}

pub fn record_meta(record: &Record) -> String {
    let mut meta = format!("{} | {}", record.player, record.mode);
    if !record.match_id.is_empty() {
        meta.push_str(&format!(" | ID: {}", record.match_id));
    }
    meta
}

/// Text of the confirmation shown before a record is deleted.
pub fn delete_prompt(record: &Record) -> String {
    match &record.body {
        RecordBody::Event {
            event, video_time, ..
        } => format!("Delete {event} at {}?", format_clock(*video_time)),
        RecordBody::Life { .. } => format!("Delete life #{}?", record.sequence_number),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    /// Position in the ledger; what delete and edit intents refer to.
    pub index: usize,
    pub sequence_number: u32,
    pub title: String,
    pub meta: String,
    pub is_editing: bool,
    pub record: Record,
}

/// Everything a view needs to draw the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub variant: RecordVariant,
    pub match_url: String,
    pub match_id: Option<String>,
    pub player: String,
    pub mode: String,
    pub video_id: Option<String>,
    pub video_start_offset_seconds: u64,
    pub watch_url: Option<String>,
    pub crop: CropPreference,
    pub event_names: Vec<&'static str>,
    pub good_tags: Vec<&'static str>,
    pub bad_tags: Vec<&'static str>,
    pub records: Vec<RecordView>,
    pub editing: Option<usize>,
    pub next_sequence_number: u32,
}

impl SessionSnapshot {
    pub fn capture(session: &Session, editing: Option<usize>) -> Self {
        let variant = session.variant();
        let records = session
            .ledger
            .sorted_by_recency()
            .into_iter()
            .map(|(index, record)| RecordView {
                index,
                sequence_number: record.sequence_number,
                title: record_title(record),
                meta: record_meta(record),
                is_editing: editing == Some(index),
                record: record.clone(),
            })
            .collect();

        Self {
            variant,
            match_url: session.match_url.clone(),
            match_id: session.match_id.clone(),
            player: session.player.clone(),
            mode: session.mode.clone(),
            video_id: session.video_id.clone(),
            video_start_offset_seconds: session.video_start_offset_seconds,
            watch_url: session.watch_url(),
            crop: session.crop,
            event_names: variant.event_names().to_vec(),
            good_tags: variant.good_tags().to_vec(),
            bad_tags: variant.bad_tags().to_vec(),
            records,
            editing,
            next_sequence_number: session.ledger.next_sequence_number(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{delete_prompt, format_clock, record_meta, record_title, SessionSnapshot};
    use crate::ledger::{RecordBody, RecordFields, RecordVariant};
    use crate::session::Session;

    #[test]
    fn formats_clock_times() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(75), "1:15");
        assert_eq!(format_clock(3723), "1:02:03");
    }

    #[test]
    fn titles_and_prompts_follow_the_record_kind() {
        let mut session = Session::new(RecordVariant::Events);
        let event = session
            .ledger
            .append(
                "88",
                RecordFields {
                    player: "Hydra".to_string(),
                    mode: "Hardpoint".to_string(),
                    body: RecordBody::event("free_kill", 125),
                },
            )
            .expect("Expected append to succeed")
            .clone();

        assert_eq!(record_title(&event), "2:05 - FREE_KILL");
        assert_eq!(record_meta(&event), "Hydra | Hardpoint | ID: 88");
        assert_eq!(delete_prompt(&event), "Delete free_kill at 2:05?");

        let mut lives = Session::new(RecordVariant::Lives);
        let life = lives
            .ledger
            .append(
                "",
                RecordFields {
                    player: "Pred".to_string(),
                    mode: "Control".to_string(),
                    body: RecordBody::life(RecordVariant::Lives, 3, []),
                },
            )
            .expect("Expected append to succeed")
            .clone();

        assert_eq!(record_title(&life), "Life #1 - score 3");
        assert_eq!(record_meta(&life), "Pred | Control");
        assert_eq!(delete_prompt(&life), "Delete life #1?");
    }

    #[test]
    fn snapshot_lists_newest_first_and_marks_the_edited_record() {
        let mut session = Session::new(RecordVariant::Events);
        for time in [5, 10] {
            session
                .ledger
                .append(
                    "",
                    RecordFields {
                        player: "A".to_string(),
                        mode: "B".to_string(),
                        body: RecordBody::event("flank", time),
                    },
                )
                .expect("Expected append to succeed");
        }

        let snapshot = SessionSnapshot::capture(&session, Some(0));

        assert_eq!(snapshot.records[0].index, 1);
        assert_eq!(snapshot.records[1].index, 0);
        assert!(snapshot.records[1].is_editing);
        assert!(!snapshot.records[0].is_editing);
        assert_eq!(snapshot.next_sequence_number, 3);
        assert!(snapshot.good_tags.is_empty());
        assert_eq!(snapshot.event_names.len(), 11);
        assert!(snapshot.event_names.contains(&"gave_up_life"));

        let lives = SessionSnapshot::capture(&Session::new(RecordVariant::Lives), None);
        assert!(lives.event_names.is_empty());
        assert_eq!(lives.good_tags.len(), 6);
    }
}
