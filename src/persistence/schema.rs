use chrono::Utc;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::ledger::{Ledger, Record, RecordBody, RecordVariant};
use crate::session::{CropPreference, Session};

pub const CURRENT_SCHEMA_VERSION: u64 = 2;

const SCHEMA_VERSION_KEY: &str = "schemaVersion";
const RECORD_MATCH_KEY: &str = "match_id";
const LEGACY_RECORD_MATCH_KEY: &str = "match";
const RECORD_ARRAY_KEYS: [(&str, &str); 2] = [("events", "seq"), ("lives", "life_num")];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Stored session is not a JSON object")]
    NotAnObject,
    #[error("Stored session has schema version {found}, newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },
}

/// Steps receive the variant the app is configured for, used only when the
/// document itself cannot tell.
type Migration = fn(&mut Map<String, Value>, RecordVariant);

/// Each step lifts a document from the paired version to the next one.
const MIGRATIONS: [(u64, Migration); 2] = [
    (0, migrate_v0_legacy_field_names),
    (1, migrate_v1_sequence_numbers),
];

pub fn encode_session(session: &Session) -> Value {
    let variant = session.variant();
    let records: Vec<Value> = session
        .ledger
        .records()
        .iter()
        .map(|record| encode_record(record, variant))
        .collect();

    let mut document = json!({
        "schemaVersion": CURRENT_SCHEMA_VERSION,
        "savedAt": Utc::now().to_rfc3339(),
        "variant": variant,
        "match": session.match_url,
        "matchId": session.match_id,
        "player": session.player,
        "mode": session.mode,
        "nextSequenceNumber": session.ledger.next_sequence_number(),
        "videoId": session.video_id,
        "videoStartOffsetSeconds": session.video_start_offset_seconds,
        "crop": session.crop.as_str(),
    });
    if let Some(fields) = document.as_object_mut() {
        fields.insert(variant.records_key().to_string(), Value::Array(records));
    }
    document
}

fn encode_record(record: &Record, variant: RecordVariant) -> Value {
    let mut fields = record.extra.clone();
    fields.insert(RECORD_MATCH_KEY.to_string(), json!(record.match_id));
    fields.insert("player".to_string(), json!(record.player));
    fields.insert("mode".to_string(), json!(record.mode));
    fields.insert(
        variant.sequence_key().to_string(),
        json!(record.sequence_number),
    );

    match &record.body {
        RecordBody::Event {
            event,
            value,
            video_time,
        } => {
            fields.insert("event".to_string(), json!(event));
            fields.insert("value".to_string(), json!(value));
            fields.insert("video_time".to_string(), json!(video_time));
        }
        RecordBody::Life { score, tags } => {
            fields.insert("score".to_string(), json!(score));
            for (tag, is_set) in tags {
                fields.insert(tag.clone(), json!(is_set));
            }
        }
    }

    Value::Object(fields)
}

/// Brings any supported stored document up to the current schema version.
pub fn migrate(
    blob: Value,
    fallback_variant: RecordVariant,
) -> Result<Map<String, Value>, SchemaError> {
    let Value::Object(mut document) = blob else {
        return Err(SchemaError::NotAnObject);
    };

    let mut version = coerce_u64(document.get(SCHEMA_VERSION_KEY), 0);
    if version > CURRENT_SCHEMA_VERSION {
        return Err(SchemaError::UnsupportedVersion {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    for (from_version, step) in MIGRATIONS {
        if version == from_version {
            step(&mut document, fallback_variant);
            version += 1;
            tracing::debug!(
                from_version,
                to_version = version,
                "Migrated stored session document"
            );
        }
    }

    document.insert(SCHEMA_VERSION_KEY.to_string(), json!(CURRENT_SCHEMA_VERSION));
    Ok(document)
}

fn migrate_v0_legacy_field_names(document: &mut Map<String, Value>, _: RecordVariant) {
    rename_key(document, "youtubeId", "videoId");
    rename_key(document, "youtubeStartSeconds", "videoStartOffsetSeconds");

    for (records_key, _) in RECORD_ARRAY_KEYS {
        for record in record_objects_mut(document, records_key) {
            rename_key(record, LEGACY_RECORD_MATCH_KEY, RECORD_MATCH_KEY);
        }
    }
}

fn migrate_v1_sequence_numbers(document: &mut Map<String, Value>, fallback_variant: RecordVariant) {
    if !document.contains_key("variant") {
        let inferred = infer_legacy_variant(document, fallback_variant);
        document.insert("variant".to_string(), json!(inferred));
    }

    for (records_key, sequence_key) in RECORD_ARRAY_KEYS {
        for (position, record) in record_objects_mut(document, records_key)
            .into_iter()
            .enumerate()
        {
            if !record.contains_key(sequence_key) {
                record.insert(sequence_key.to_string(), json!(position + 1));
            }
        }
    }

    if !document.contains_key("nextSequenceNumber") {
        let variant = stored_variant(document).unwrap_or_default();
        let count = document
            .get(variant.records_key())
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        document.insert("nextSequenceNumber".to_string(), json!(count + 1));
    }
}

/// Unversioned documents carry no variant. Life records are full-tag when any
/// of them stores a tag only the full set has, compact when they store only
/// compact tags, and otherwise follow the configured life variant.
fn infer_legacy_variant(
    document: &Map<String, Value>,
    fallback_variant: RecordVariant,
) -> RecordVariant {
    let Some(Value::Array(lives)) = document.get("lives") else {
        return RecordVariant::Events;
    };

    let stored_tags: Vec<&str> = lives
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|record| record.keys().map(String::as_str))
        .filter(|key| RecordVariant::Lives.tag_names().any(|tag| tag == *key))
        .collect();
    let is_compact_tag = |tag: &str| RecordVariant::LivesCompact.tag_names().any(|name| name == tag);

    if stored_tags.iter().any(|tag| !is_compact_tag(tag)) {
        RecordVariant::Lives
    } else if !stored_tags.is_empty() {
        RecordVariant::LivesCompact
    } else if fallback_variant.is_life() {
        fallback_variant
    } else {
        RecordVariant::Lives
    }
}

/// Decodes a stored document of any supported version into a session.
pub fn decode_session(blob: Value, fallback_variant: RecordVariant) -> Result<Session, SchemaError> {
    let mut document = migrate(blob, fallback_variant)?;
    let variant = stored_variant(&document).unwrap_or(fallback_variant);

    let records: Vec<Record> = match document.remove(variant.records_key()) {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter_map(|(position, item)| decode_record(item, variant, position))
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            tracing::warn!(
                records_key = variant.records_key(),
                "Stored records are not a list, starting with an empty ledger"
            );
            Vec::new()
        }
    };

    let stored_next = coerce_u64(document.get("nextSequenceNumber"), 0);
    let (ledger, repaired) = Ledger::restore(variant, records);
    if repaired || stored_next != u64::from(ledger.next_sequence_number()) {
        tracing::warn!(
            record_count = ledger.len(),
            stored_next_sequence_number = stored_next,
            "Stored sequence numbers were not dense, renumbered on load"
        );
    }

    Ok(Session {
        match_url: coerce_string(document.get("match")),
        match_id: coerce_optional_string(document.get("matchId")),
        player: coerce_string(document.get("player")),
        mode: coerce_string(document.get("mode")),
        video_id: coerce_optional_string(document.get("videoId")),
        video_start_offset_seconds: coerce_u64(document.get("videoStartOffsetSeconds"), 0),
        crop: document
            .get("crop")
            .and_then(Value::as_str)
            .map(CropPreference::from_stored)
            .unwrap_or_default(),
        ledger,
    })
}

fn decode_record(value: Value, variant: RecordVariant, position: usize) -> Option<Record> {
    let Value::Object(mut fields) = value else {
        tracing::warn!(position, "Skipping stored record that is not an object");
        return None;
    };

    let match_id = coerce_string(fields.remove(RECORD_MATCH_KEY).as_ref());
    let player = coerce_string(fields.remove("player").as_ref());
    let mode = coerce_string(fields.remove("mode").as_ref());
    let fallback_sequence = u64::try_from(position + 1).unwrap_or(u64::MAX);
    let sequence_number = coerce_u64(
        fields.remove(variant.sequence_key()).as_ref(),
        fallback_sequence,
    );

    let body = if variant.is_life() {
        RecordBody::Life {
            score: coerce_i64(fields.remove("score").as_ref(), 0),
            tags: variant
                .tag_names()
                .map(|tag| (tag.to_string(), coerce_bool(fields.remove(tag).as_ref())))
                .collect(),
        }
    } else {
        let value = coerce_number(fields.remove("value").as_ref());
        RecordBody::Event {
            event: coerce_string(fields.remove("event").as_ref()),
            value: u8::from(value == Some(1.0)),
            video_time: coerce_u64(fields.remove("video_time").as_ref(), 0),
        }
    };

    Some(Record {
        match_id,
        player,
        mode,
        sequence_number: u32::try_from(sequence_number).unwrap_or(u32::MAX),
        body,
        extra: fields,
    })
}

fn stored_variant(document: &Map<String, Value>) -> Option<RecordVariant> {
    document
        .get("variant")
        .and_then(|value| serde_json::from_value::<RecordVariant>(value.clone()).ok())
}

fn record_objects_mut<'a>(
    document: &'a mut Map<String, Value>,
    records_key: &str,
) -> Vec<&'a mut Map<String, Value>> {
    match document.get_mut(records_key) {
        Some(Value::Array(items)) => items.iter_mut().filter_map(Value::as_object_mut).collect(),
        _ => Vec::new(),
    }
}

fn rename_key(fields: &mut Map<String, Value>, legacy_key: &str, current_key: &str) {
    if fields.contains_key(current_key) {
        return;
    }
    if let Some(value) = fields.remove(legacy_key) {
        fields.insert(current_key.to_string(), value);
    }
}

/// Loose numeric reading: numbers, numeric strings and booleans count; zero,
/// NaN and anything else read as absent.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|number| number.is_finite() && *number != 0.0)
}

fn coerce_u64(value: Option<&Value>, fallback: u64) -> u64 {
    coerce_number(value)
        .filter(|number| *number > 0.0)
        .map(|number| number.floor() as u64)
        .unwrap_or(fallback)
}

fn coerce_i64(value: Option<&Value>, fallback: i64) -> i64 {
    coerce_number(value)
        .map(|number| number.trunc() as i64)
        .unwrap_or(fallback)
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => matches!(text.trim(), "1" | "true"),
        Some(other) => coerce_number(Some(other)).is_some(),
        None => false,
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn coerce_optional_string(value: Option<&Value>) -> Option<String> {
    Some(coerce_string(value)).filter(|text| !text.is_empty())
}
