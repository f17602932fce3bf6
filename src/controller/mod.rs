mod intent;

use thiserror::Error;

use crate::display::{delete_prompt, SessionSnapshot};
use crate::export::{self, CsvExport};
use crate::ledger::{LedgerError, RecordBody, RecordFields};
use crate::links::{invalid_match_url_message, parse_match_id, parse_video_ref, INVALID_VIDEO_URL_MESSAGE};
use crate::persistence::{KeyValueStore, SessionPersistence};
use crate::session::{CropPreference, Session};
use crate::settings::TaggerSettings;

pub use intent::{Dispatched, Intent, LifeFields, Notice, NoticeTarget, UserPrompt};

pub const MISSING_LABELS_MESSAGE: &str = "Select a player and game mode first.";
pub const MISSING_MATCH_ID_CONFIRMATION: &str = "No match ID set. Save anyway?";
pub const RESET_CONFIRMATION: &str = "This will clear all lives and session settings. Continue?";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Precondition(String),
}

struct Outcome {
    applied: bool,
    notices: Vec<Notice>,
}

impl Outcome {
    fn applied() -> Self {
        Self {
            applied: true,
            notices: Vec::new(),
        }
    }

    fn declined() -> Self {
        Self {
            applied: false,
            notices: Vec::new(),
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

/// Sole owner and writer of the session.
///
/// Every mutating intent changes the in-memory session, then saves it, then
/// hands back a snapshot to draw. Storage failures are logged and otherwise
/// ignored: the in-memory session stays authoritative while the app runs.
pub struct SessionController<S> {
    session: Session,
    persistence: SessionPersistence<S>,
    settings: TaggerSettings,
    editing: Option<usize>,
}

impl<S: KeyValueStore> SessionController<S> {
    pub fn restore(store: S, settings: TaggerSettings) -> Self {
        let persistence =
            SessionPersistence::new(store, settings.storage_key.clone(), settings.variant);
        let session = persistence.load_or_default();
        if session.variant() != settings.variant {
            tracing::warn!(
                stored_variant = ?session.variant(),
                configured_variant = ?settings.variant,
                "Saved session uses another record variant, keeping its records"
            );
        }

        Self {
            session,
            persistence,
            settings,
            editing: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &TaggerSettings {
        &self.settings
    }

    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    pub fn persistence(&self) -> &SessionPersistence<S> {
        &self.persistence
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session, self.editing)
    }

    pub fn dispatch(
        &mut self,
        intent: Intent,
        prompt: &mut dyn UserPrompt,
    ) -> Result<Dispatched, IntentError> {
        tracing::debug!(intent = ?intent, "Dispatching intent");

        let outcome = match intent {
            Intent::SetMatchUrl(url) => self.set_match_url(&url),
            Intent::SetPlayer(player) => {
                self.session.player = player;
                self.persist();
                Outcome::applied()
            }
            Intent::SetMode(mode) => {
                self.session.mode = mode;
                self.persist();
                Outcome::applied()
            }
            Intent::SetVideoUrl { url, submitted } => self.set_video_url(&url, submitted),
            Intent::SetCrop(crop) => self.set_crop(crop),
            Intent::ToggleZoom => self.set_crop(self.session.crop.toggled_zoom()),
            Intent::TagEvent {
                event,
                playback_seconds,
            } => {
                let video_time =
                    resolve_video_time(playback_seconds, self.session.video_start_offset_seconds);
                let fields = RecordFields {
                    player: self.session.player.clone(),
                    mode: self.session.mode.clone(),
                    body: RecordBody::event(event, video_time),
                };
                self.append_record(fields, prompt)?
            }
            Intent::AppendLife(life) => {
                let fields = RecordFields {
                    player: self.session.player.clone(),
                    mode: self.session.mode.clone(),
                    body: self.life_body(life),
                };
                self.append_record(fields, prompt)?
            }
            Intent::BeginEdit(index) => {
                self.require_index(index)?;
                self.editing = Some(index);
                Outcome::applied()
            }
            Intent::CancelEdit => {
                self.editing = None;
                Outcome::applied()
            }
            Intent::UpdateRecord { index, fields } => self.update_record(index, fields, prompt)?,
            Intent::DeleteRecord(index) => self.delete_record(index, prompt)?,
            Intent::Reset => self.reset(prompt),
        };

        Ok(Dispatched {
            applied: outcome.applied,
            notices: outcome.notices,
            snapshot: self.snapshot(),
        })
    }

    /// CSV of the current ledger, or an alert when there is nothing to export.
    pub fn export_csv(&self, prompt: &mut dyn UserPrompt) -> Option<CsvExport> {
        match export::export_csv(&self.session) {
            Ok(csv_export) => {
                tracing::info!(
                    file_name = %csv_export.file_name,
                    row_count = csv_export.row_count,
                    "Exported session CSV"
                );
                Some(csv_export)
            }
            Err(error) => {
                prompt.alert(&error.to_string());
                None
            }
        }
    }

    fn set_match_url(&mut self, url: &str) -> Outcome {
        let url = url.trim();
        self.session.match_url = url.to_string();

        let notice = if url.is_empty() {
            self.session.match_id = None;
            Notice::cleared(NoticeTarget::MatchUrl)
        } else if let Some(match_id) = parse_match_id(url, &self.settings.match_host) {
            let notice = Notice::info(NoticeTarget::MatchUrl, format!("Match ID: {match_id}"));
            self.session.match_id = Some(match_id);
            notice
        } else {
            self.session.match_id = None;
            Notice::error(
                NoticeTarget::MatchUrl,
                invalid_match_url_message(&self.settings.match_host),
            )
        };

        self.persist();
        Outcome::applied().with_notice(notice)
    }

    fn set_video_url(&mut self, url: &str, submitted: bool) -> Outcome {
        let url = url.trim();
        if url.is_empty() {
            self.session.clear_video();
            self.persist();
            return Outcome::applied().with_notice(Notice::cleared(NoticeTarget::VideoUrl));
        }

        match parse_video_ref(url) {
            Some(video) => {
                tracing::info!(
                    video_id = %video.video_id,
                    start_seconds = video.start_seconds,
                    "Loaded video reference"
                );
                self.session.video_id = Some(video.video_id);
                self.session.video_start_offset_seconds = video.start_seconds;
                self.persist();
                Outcome::applied().with_notice(Notice::cleared(NoticeTarget::VideoUrl))
            }
            None if submitted => Outcome::declined().with_notice(Notice::error(
                NoticeTarget::VideoUrl,
                INVALID_VIDEO_URL_MESSAGE,
            )),
            None => Outcome::declined(),
        }
    }

    fn set_crop(&mut self, crop: CropPreference) -> Outcome {
        self.session.crop = crop;
        self.persist();
        Outcome::applied()
    }

    /// Tags outside the session's variant are dropped by the ledger.
    fn life_body(&self, life: LifeFields) -> RecordBody {
        RecordBody::life(
            self.session.variant(),
            life.score,
            life.tags.iter().map(String::as_str),
        )
    }

    fn append_record(
        &mut self,
        fields: RecordFields,
        prompt: &mut dyn UserPrompt,
    ) -> Result<Outcome, IntentError> {
        let variant = self.session.variant();
        if !variant.accepts(&fields.body) {
            return Err(LedgerError::VariantMismatch { expected: variant }.into());
        }
        require_labels(&fields, prompt)?;

        let match_id = self.session.match_id.clone();
        if match_id.is_none() && !prompt.confirm(MISSING_MATCH_ID_CONFIRMATION) {
            return Ok(Outcome::declined());
        }

        let record = self
            .session
            .ledger
            .append(match_id.unwrap_or_default(), fields)?;
        tracing::info!(
            sequence_number = record.sequence_number,
            player = %record.player,
            mode = %record.mode,
            "Recorded {}",
            if variant.is_life() { "life" } else { "event" }
        );

        self.persist();
        Ok(Outcome::applied())
    }

    fn update_record(
        &mut self,
        index: usize,
        fields: RecordFields,
        prompt: &mut dyn UserPrompt,
    ) -> Result<Outcome, IntentError> {
        self.require_index(index)?;
        require_labels(&fields, prompt)?;

        let record = self.session.ledger.update(index, fields)?;
        tracing::info!(
            sequence_number = record.sequence_number,
            "Updated record"
        );

        self.editing = None;
        self.persist();
        Ok(Outcome::applied())
    }

    fn delete_record(
        &mut self,
        index: usize,
        prompt: &mut dyn UserPrompt,
    ) -> Result<Outcome, IntentError> {
        let message = delete_prompt(self.require_index(index)?);
        if !prompt.confirm(&message) {
            return Ok(Outcome::declined());
        }

        let removed = self.session.ledger.remove(index)?;
        self.editing = match self.editing {
            Some(editing) if editing == index => None,
            Some(editing) if editing > index => Some(editing - 1),
            other => other,
        };
        tracing::info!(
            removed_sequence_number = removed.sequence_number,
            remaining = self.session.ledger.len(),
            "Deleted record and renumbered ledger"
        );

        self.persist();
        Ok(Outcome::applied())
    }

    fn reset(&mut self, prompt: &mut dyn UserPrompt) -> Outcome {
        if !prompt.confirm(RESET_CONFIRMATION) {
            return Outcome::declined();
        }

        if let Err(error) = self.persistence.clear() {
            tracing::warn!(
                persistence_error = %error,
                "Failed to clear saved session during reset"
            );
        }
        self.session = Session::new(self.settings.variant);
        self.editing = None;
        tracing::info!("Session reset");

        Outcome::applied()
            .with_notice(Notice::cleared(NoticeTarget::MatchUrl))
            .with_notice(Notice::cleared(NoticeTarget::VideoUrl))
    }

    fn require_index(&self, index: usize) -> Result<&crate::ledger::Record, IntentError> {
        self.session.ledger.get(index).ok_or_else(|| {
            LedgerError::IndexOutOfRange {
                index,
                len: self.session.ledger.len(),
            }
            .into()
        })
    }

    fn persist(&mut self) {
        if let Err(error) = self.persistence.save(&self.session) {
            tracing::warn!(
                persistence_error = %error,
                "Failed to persist session, keeping in-memory state"
            );
        }
    }
}

fn require_labels(fields: &RecordFields, prompt: &mut dyn UserPrompt) -> Result<(), IntentError> {
    if fields.player.trim().is_empty() || fields.mode.trim().is_empty() {
        prompt.alert(MISSING_LABELS_MESSAGE);
        return Err(IntentError::Precondition(MISSING_LABELS_MESSAGE.to_string()));
    }
    Ok(())
}

/// Whole seconds of the playback position, or the video start offset when the
/// player has not reported a usable position.
pub fn resolve_video_time(playback_seconds: Option<f64>, start_offset_seconds: u64) -> u64 {
    match playback_seconds {
        Some(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds.floor() as u64,
        _ => start_offset_seconds,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::{json, Value};

    use super::{
        resolve_video_time, Intent, IntentError, LifeFields, NoticeTarget, SessionController,
        UserPrompt, MISSING_LABELS_MESSAGE, MISSING_MATCH_ID_CONFIRMATION, RESET_CONFIRMATION,
    };
    use crate::ledger::{LedgerError, RecordBody, RecordFields, RecordVariant};
    use crate::persistence::{KeyValueStore, MemoryStore, StorageError};
    use crate::session::CropPreference;
    use crate::settings::TaggerSettings;

    const MATCH_URL: &str = "https://www.breakingpoint.gg/match/4521/optic-vs-faze";

    /// Answers confirmations from a script, accepting once the script runs out.
    #[derive(Default)]
    struct ScriptedPrompt {
        answers: VecDeque<bool>,
        confirmations: Vec<String>,
        alerts: Vec<String>,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl UserPrompt for ScriptedPrompt {
        fn confirm(&mut self, message: &str) -> bool {
            self.confirmations.push(message.to_string());
            self.answers.pop_front().unwrap_or(true)
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: Value) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn delete(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn settings_for(variant: RecordVariant) -> TaggerSettings {
        TaggerSettings {
            variant,
            ..TaggerSettings::default()
        }
    }

    fn labelled_controller(variant: RecordVariant) -> SessionController<MemoryStore> {
        let mut controller = SessionController::restore(MemoryStore::new(), settings_for(variant));
        let mut prompt = ScriptedPrompt::default();
        for intent in [
            Intent::SetMatchUrl(MATCH_URL.to_string()),
            Intent::SetPlayer("Shotzzy".to_string()),
            Intent::SetMode("Hardpoint".to_string()),
        ] {
            controller
                .dispatch(intent, &mut prompt)
                .expect("Expected label intent to succeed");
        }
        controller
    }

    fn tag(controller: &mut SessionController<MemoryStore>, event: &str, seconds: f64) {
        controller
            .dispatch(
                Intent::TagEvent {
                    event: event.to_string(),
                    playback_seconds: Some(seconds),
                },
                &mut ScriptedPrompt::default(),
            )
            .expect("Expected tag to succeed");
    }

    fn stored_blob(controller: &SessionController<MemoryStore>) -> Value {
        let key = controller.settings().storage_key.clone();
        controller
            .persistence()
            .store()
            .get(&key)
            .expect("Expected memory store read to succeed")
            .expect("Expected a saved session")
    }

    #[test]
    fn restores_an_empty_session_from_an_empty_store() {
        let controller =
            SessionController::restore(MemoryStore::new(), settings_for(RecordVariant::Lives));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.variant, RecordVariant::Lives);
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.next_sequence_number, 1);
        assert_eq!(snapshot.crop, CropPreference::None);
    }

    #[test]
    fn match_url_notices_follow_the_parse_result() {
        let mut controller =
            SessionController::restore(MemoryStore::new(), TaggerSettings::default());
        let mut prompt = ScriptedPrompt::default();

        let valid = controller
            .dispatch(Intent::SetMatchUrl(format!("  {MATCH_URL} ")), &mut prompt)
            .expect("Expected match url intent to succeed");
        let notice = valid.notices.first().expect("Expected a match notice");
        assert_eq!(notice.message, "Match ID: 4521");
        assert!(!notice.is_error);
        assert_eq!(valid.snapshot.match_id.as_deref(), Some("4521"));
        assert_eq!(stored_blob(&controller)["matchId"], json!("4521"));

        let invalid = controller
            .dispatch(
                Intent::SetMatchUrl("https://example.com/match/1/x".to_string()),
                &mut prompt,
            )
            .expect("Expected match url intent to succeed");
        let notice = invalid.notices.first().expect("Expected a match notice");
        assert!(notice.is_error);
        assert_eq!(notice.target, NoticeTarget::MatchUrl);
        assert_eq!(invalid.snapshot.match_id, None);

        let cleared = controller
            .dispatch(Intent::SetMatchUrl(String::new()), &mut prompt)
            .expect("Expected match url intent to succeed");
        assert_eq!(cleared.notices.len(), 1);
        assert_eq!(cleared.notices[0].message, "");
    }

    #[test]
    fn only_submitted_video_urls_report_errors() {
        let mut controller =
            SessionController::restore(MemoryStore::new(), TaggerSettings::default());
        let mut prompt = ScriptedPrompt::default();

        let loaded = controller
            .dispatch(
                Intent::SetVideoUrl {
                    url: "https://youtu.be/dQw4w9WgXcQ?t=1m30s".to_string(),
                    submitted: false,
                },
                &mut prompt,
            )
            .expect("Expected video intent to succeed");
        assert!(loaded.applied);
        assert_eq!(loaded.snapshot.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(loaded.snapshot.video_start_offset_seconds, 90);

        let passive = controller
            .dispatch(
                Intent::SetVideoUrl {
                    url: "not a video".to_string(),
                    submitted: false,
                },
                &mut prompt,
            )
            .expect("Expected video intent to succeed");
        assert!(!passive.applied);
        assert!(passive.notices.is_empty());
        assert_eq!(passive.snapshot.video_id.as_deref(), Some("dQw4w9WgXcQ"));

        let submitted = controller
            .dispatch(
                Intent::SetVideoUrl {
                    url: "not a video".to_string(),
                    submitted: true,
                },
                &mut prompt,
            )
            .expect("Expected video intent to succeed");
        let notice = submitted.notices.first().expect("Expected a video notice");
        assert_eq!(notice.message, "Invalid YouTube URL");
        assert_eq!(notice.target, NoticeTarget::VideoUrl);

        let cleared = controller
            .dispatch(
                Intent::SetVideoUrl {
                    url: "   ".to_string(),
                    submitted: true,
                },
                &mut prompt,
            )
            .expect("Expected video intent to succeed");
        assert_eq!(cleared.snapshot.video_id, None);
        assert_eq!(cleared.snapshot.video_start_offset_seconds, 0);
    }

    #[test]
    fn tagging_floors_the_playback_position() {
        let mut controller = labelled_controller(RecordVariant::Events);
        tag(&mut controller, "flank", 125.9);

        let record = &controller.session().ledger.records()[0];
        assert_eq!(record.video_time(), Some(125));
        assert_eq!(record.match_id, "4521");
        assert_eq!(record.player, "Shotzzy");
        assert_eq!(record.sequence_number, 1);
        assert_eq!(stored_blob(&controller)["events"][0]["video_time"], json!(125));
    }

    #[test]
    fn unusable_playback_falls_back_to_the_start_offset() {
        assert_eq!(resolve_video_time(None, 42), 42);
        assert_eq!(resolve_video_time(Some(f64::NAN), 42), 42);
        assert_eq!(resolve_video_time(Some(-3.0), 42), 42);
        assert_eq!(resolve_video_time(Some(0.4), 42), 0);
    }

    #[test]
    fn tagging_without_labels_alerts_and_records_nothing() {
        let mut controller =
            SessionController::restore(MemoryStore::new(), TaggerSettings::default());
        let mut prompt = ScriptedPrompt::default();

        let result = controller.dispatch(
            Intent::TagEvent {
                event: "flank".to_string(),
                playback_seconds: Some(3.0),
            },
            &mut prompt,
        );

        assert_eq!(
            result.unwrap_err(),
            IntentError::Precondition(MISSING_LABELS_MESSAGE.to_string())
        );
        assert_eq!(prompt.alerts, vec![MISSING_LABELS_MESSAGE.to_string()]);
        assert!(controller.session().ledger.is_empty());
        assert!(!controller
            .persistence()
            .store()
            .contains(&controller.settings().storage_key));
    }

    #[test]
    fn missing_match_id_asks_before_recording() {
        let mut controller =
            SessionController::restore(MemoryStore::new(), TaggerSettings::default());
        let mut prompt = ScriptedPrompt::answering(&[false, true]);
        controller
            .dispatch(Intent::SetPlayer("Dashy".to_string()), &mut prompt)
            .expect("Expected player intent to succeed");
        controller
            .dispatch(Intent::SetMode("Control".to_string()), &mut prompt)
            .expect("Expected mode intent to succeed");

        let tag_intent = Intent::TagEvent {
            event: "free_kill".to_string(),
            playback_seconds: Some(10.0),
        };
        let declined = controller
            .dispatch(tag_intent.clone(), &mut prompt)
            .expect("Expected declined tag to succeed");
        assert!(!declined.applied);
        assert!(controller.session().ledger.is_empty());

        let accepted = controller
            .dispatch(tag_intent, &mut prompt)
            .expect("Expected accepted tag to succeed");
        assert!(accepted.applied);
        assert_eq!(controller.session().ledger.records()[0].match_id, "");
        assert_eq!(
            prompt.confirmations,
            vec![MISSING_MATCH_ID_CONFIRMATION.to_string(); 2]
        );
    }

    #[test]
    fn lives_keep_known_tags_and_reject_wrong_kinds() {
        let mut controller = labelled_controller(RecordVariant::LivesCompact);
        let mut prompt = ScriptedPrompt::default();

        controller
            .dispatch(
                Intent::AppendLife(LifeFields {
                    score: 2,
                    tags: vec!["good_trade".to_string(), "flank".to_string()],
                }),
                &mut prompt,
            )
            .expect("Expected life to be recorded");

        let record = &controller.session().ledger.records()[0];
        assert!(record.body.is_tagged("good_trade"));
        assert!(!record.body.is_tagged("flank"));
        assert_eq!(record.score(), Some(2));
        assert_eq!(stored_blob(&controller)["lives"][0]["life_num"], json!(1));

        let wrong_kind = controller.dispatch(
            Intent::TagEvent {
                event: "flank".to_string(),
                playback_seconds: None,
            },
            &mut prompt,
        );
        assert_eq!(
            wrong_kind.unwrap_err(),
            IntentError::Ledger(LedgerError::VariantMismatch {
                expected: RecordVariant::LivesCompact
            })
        );
        assert_eq!(controller.session().ledger.len(), 1);
    }

    #[test]
    fn deleting_confirms_and_renumbers() {
        let mut controller = labelled_controller(RecordVariant::Events);
        for seconds in [5.0, 65.0, 125.0] {
            tag(&mut controller, "flank", seconds);
        }

        let mut prompt = ScriptedPrompt::answering(&[false, true]);
        let declined = controller
            .dispatch(Intent::DeleteRecord(1), &mut prompt)
            .expect("Expected declined delete to succeed");
        assert!(!declined.applied);
        assert_eq!(controller.session().ledger.len(), 3);

        let deleted = controller
            .dispatch(Intent::DeleteRecord(1), &mut prompt)
            .expect("Expected delete to succeed");
        assert!(deleted.applied);
        assert_eq!(prompt.confirmations[0], "Delete flank at 1:05?");

        let sequence_numbers: Vec<u32> = controller
            .session()
            .ledger
            .records()
            .iter()
            .map(|record| record.sequence_number)
            .collect();
        assert_eq!(sequence_numbers, vec![1, 2]);
        assert_eq!(deleted.snapshot.next_sequence_number, 3);
        assert_eq!(stored_blob(&controller)["nextSequenceNumber"], json!(3));
    }

    #[test]
    fn deleting_out_of_range_is_an_error() {
        let mut controller = labelled_controller(RecordVariant::Events);
        let result = controller.dispatch(Intent::DeleteRecord(0), &mut ScriptedPrompt::default());
        assert_eq!(
            result.unwrap_err(),
            IntentError::Ledger(LedgerError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn edit_cursor_follows_deletions() {
        let mut controller = labelled_controller(RecordVariant::Events);
        for seconds in [1.0, 2.0, 3.0] {
            tag(&mut controller, "flank", seconds);
        }
        let mut prompt = ScriptedPrompt::default();

        controller
            .dispatch(Intent::BeginEdit(2), &mut prompt)
            .expect("Expected edit to begin");
        controller
            .dispatch(Intent::DeleteRecord(0), &mut prompt)
            .expect("Expected delete to succeed");
        assert_eq!(controller.editing(), Some(1));

        controller
            .dispatch(Intent::DeleteRecord(1), &mut prompt)
            .expect("Expected delete to succeed");
        assert_eq!(controller.editing(), None);

        let beyond = controller.dispatch(Intent::BeginEdit(5), &mut prompt);
        assert!(beyond.is_err());
        assert_eq!(controller.editing(), None);
    }

    #[test]
    fn updating_keeps_match_id_and_sequence_number() {
        let mut controller = labelled_controller(RecordVariant::Events);
        tag(&mut controller, "flank", 30.0);
        let mut prompt = ScriptedPrompt::default();

        controller
            .dispatch(Intent::BeginEdit(0), &mut prompt)
            .expect("Expected edit to begin");
        controller
            .dispatch(
                Intent::SetMatchUrl("https://www.breakingpoint.gg/match/999/other".to_string()),
                &mut prompt,
            )
            .expect("Expected match url intent to succeed");
        let updated = controller
            .dispatch(
                Intent::UpdateRecord {
                    index: 0,
                    fields: RecordFields {
                        player: "Kenny".to_string(),
                        mode: "Search".to_string(),
                        body: RecordBody::event("free_kill", 31),
                    },
                },
                &mut prompt,
            )
            .expect("Expected update to succeed");

        let record = &controller.session().ledger.records()[0];
        assert_eq!(record.match_id, "4521");
        assert_eq!(record.sequence_number, 1);
        assert_eq!(record.player, "Kenny");
        assert_eq!(record.video_time(), Some(31));
        assert_eq!(updated.snapshot.editing, None);
    }

    #[test]
    fn reset_confirms_then_clears_storage_and_defaults() {
        let mut controller = labelled_controller(RecordVariant::Events);
        tag(&mut controller, "flank", 30.0);
        let mut prompt = ScriptedPrompt::answering(&[false, true]);
        for intent in [
            Intent::SetVideoUrl {
                url: "https://www.youtube.com/watch?v=vod77&t=45".to_string(),
                submitted: true,
            },
            Intent::SetCrop(CropPreference::Center),
            Intent::SetVideoUrl {
                url: "nonsense".to_string(),
                submitted: true,
            },
        ] {
            controller
                .dispatch(intent, &mut prompt)
                .expect("Expected setup intent to succeed");
        }

        let declined = controller
            .dispatch(Intent::Reset, &mut prompt)
            .expect("Expected declined reset to succeed");
        assert!(!declined.applied);
        assert_eq!(controller.session().ledger.len(), 1);

        let reset = controller
            .dispatch(Intent::Reset, &mut prompt)
            .expect("Expected reset to succeed");
        assert!(reset.applied);
        assert_eq!(prompt.confirmations, vec![RESET_CONFIRMATION.to_string(); 2]);
        assert!(reset.snapshot.records.is_empty());
        assert_eq!(reset.snapshot.player, "");
        assert_eq!(reset.snapshot.match_id, None);
        assert_eq!(reset.snapshot.match_url, "");
        assert_eq!(reset.snapshot.mode, "");
        assert_eq!(reset.snapshot.video_id, None);
        assert_eq!(reset.snapshot.video_start_offset_seconds, 0);
        assert_eq!(reset.snapshot.crop, CropPreference::None);
        assert_eq!(reset.snapshot.next_sequence_number, 1);

        let cleared_targets: Vec<NoticeTarget> =
            reset.notices.iter().map(|notice| notice.target).collect();
        assert_eq!(
            cleared_targets,
            vec![NoticeTarget::MatchUrl, NoticeTarget::VideoUrl]
        );
        assert!(reset
            .notices
            .iter()
            .all(|notice| notice.message.is_empty() && !notice.is_error));
        assert!(!controller
            .persistence()
            .store()
            .contains(&controller.settings().storage_key));
    }

    #[test]
    fn storage_failures_leave_the_session_usable() {
        let mut controller = SessionController::restore(FailingStore, TaggerSettings::default());
        let mut prompt = ScriptedPrompt::default();

        for intent in [
            Intent::SetMatchUrl(MATCH_URL.to_string()),
            Intent::SetPlayer("Simp".to_string()),
            Intent::SetMode("Hardpoint".to_string()),
            Intent::TagEvent {
                event: "flank".to_string(),
                playback_seconds: Some(8.0),
            },
            Intent::ToggleZoom,
        ] {
            controller
                .dispatch(intent, &mut prompt)
                .expect("Expected intent to succeed despite storage failure");
        }

        assert_eq!(controller.session().ledger.len(), 1);
        assert_eq!(controller.session().crop, CropPreference::Bl);
        controller
            .dispatch(Intent::Reset, &mut prompt)
            .expect("Expected reset to succeed despite storage failure");
        assert!(controller.session().ledger.is_empty());
    }

    #[test]
    fn restores_what_an_earlier_controller_saved() {
        let mut controller = labelled_controller(RecordVariant::Events);
        tag(&mut controller, "flank", 12.0);
        controller
            .dispatch(
                Intent::SetCrop(CropPreference::Tr),
                &mut ScriptedPrompt::default(),
            )
            .expect("Expected crop intent to succeed");

        let key = controller.settings().storage_key.clone();
        let store = MemoryStore::with_entry(&key, stored_blob(&controller));
        let restored = SessionController::restore(store, TaggerSettings::default());

        assert_eq!(restored.snapshot().records, controller.snapshot().records);
        assert_eq!(restored.session().crop, CropPreference::Tr);
        assert_eq!(restored.session().match_id.as_deref(), Some("4521"));
    }

    #[test]
    fn export_alerts_when_empty() {
        let mut controller = labelled_controller(RecordVariant::Events);
        let mut prompt = ScriptedPrompt::default();

        assert!(controller.export_csv(&mut prompt).is_none());
        assert_eq!(prompt.alerts, vec!["No events to export.".to_string()]);

        tag(&mut controller, "flank", 12.0);
        let csv_export = controller
            .export_csv(&mut prompt)
            .expect("Expected export to succeed");
        assert_eq!(csv_export.file_name, "events_4521_Shotzzy_Hardpoint.csv");
        assert_eq!(csv_export.row_count, 1);
    }

    #[test]
    fn intents_deserialize_from_tagged_json() {
        let intent: Intent = serde_json::from_value(json!({
            "type": "tagEvent",
            "payload": { "event": "flank", "playbackSeconds": 12.5 }
        }))
        .expect("Expected tag intent to deserialize");
        assert_eq!(
            intent,
            Intent::TagEvent {
                event: "flank".to_string(),
                playback_seconds: Some(12.5),
            }
        );

        let reset: Intent = serde_json::from_value(json!({ "type": "reset" }))
            .expect("Expected reset intent to deserialize");
        assert_eq!(reset, Intent::Reset);

        let crop: Intent = serde_json::from_value(json!({ "type": "setCrop", "payload": "bl" }))
            .expect("Expected crop intent to deserialize");
        assert_eq!(crop, Intent::SetCrop(CropPreference::Bl));
    }
}
