use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

use crate::ledger::{Record, RecordBody, RecordVariant};
use crate::session::Session;

pub const EVENT_COLUMNS: [&str; 7] = [
    "match_id",
    "game_mode",
    "player",
    "event",
    "value",
    "video_time",
    "youtube_url",
];
const LIFE_LEADING_COLUMNS: [&str; 5] = ["match_id", "game_mode", "player", "life_num", "score"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("No {0} to export.")]
    NothingToExport(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
    pub row_count: usize,
}

pub fn export_csv(session: &Session) -> Result<CsvExport, ExportError> {
    let contents = to_csv(session)?;
    Ok(CsvExport {
        file_name: suggested_file_name(session),
        contents,
        row_count: session.ledger.len(),
    })
}

pub fn header_columns(variant: RecordVariant) -> Vec<&'static str> {
    if variant.is_life() {
        LIFE_LEADING_COLUMNS
            .iter()
            .copied()
            .chain(variant.tag_names())
            .collect()
    } else {
        EVENT_COLUMNS.to_vec()
    }
}

/// Header plus one row per record in ascending sequence order, rows joined by
/// `\n` without a trailing newline.
pub fn to_csv(session: &Session) -> Result<String, ExportError> {
    let variant = session.variant();
    if session.ledger.is_empty() {
        return Err(ExportError::NothingToExport(variant.records_key()));
    }

    let watch_url = session.watch_url().unwrap_or_default();
    let mut rows: Vec<String> = Vec::with_capacity(session.ledger.len() + 1);
    rows.push(join_row(header_columns(variant).into_iter().map(Cow::Borrowed)));

    for record in session.ledger.sorted_for_export() {
        rows.push(join_row(record_cells(record, variant, &watch_url)));
    }

    tracing::debug!(
        row_count = rows.len() - 1,
        variant = ?variant,
        "Serialized ledger to CSV"
    );
    Ok(rows.join("\n"))
}

fn record_cells<'a>(
    record: &'a Record,
    variant: RecordVariant,
    watch_url: &'a str,
) -> Vec<Cow<'a, str>> {
    let mut cells: Vec<Cow<'a, str>> = vec![
        Cow::Borrowed(record.match_id.as_str()),
        Cow::Borrowed(record.mode.as_str()),
        Cow::Borrowed(record.player.as_str()),
    ];

    match &record.body {
        RecordBody::Event {
            event,
            value,
            video_time,
        } => {
            cells.push(Cow::Borrowed(event.as_str()));
            cells.push(Cow::Owned(value.to_string()));
            cells.push(Cow::Owned(video_time.to_string()));
            cells.push(Cow::Borrowed(watch_url));
        }
        RecordBody::Life { score, .. } => {
            cells.push(Cow::Owned(record.sequence_number.to_string()));
            cells.push(Cow::Owned(score.to_string()));
            for tag in variant.tag_names() {
                let flag = if record.body.is_tagged(tag) { "1" } else { "0" };
                cells.push(Cow::Borrowed(flag));
            }
        }
    }

    cells
}

fn join_row<'a>(cells: impl IntoIterator<Item = Cow<'a, str>>) -> String {
    cells
        .into_iter()
        .map(|cell| escape_csv_field(&cell).into_owned())
        .collect::<Vec<String>>()
        .join(",")
}

pub fn escape_csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// `{events|lives}_{match id}_{player}_{mode}.csv` with placeholders for blanks.
pub fn suggested_file_name(session: &Session) -> String {
    let id_slug = session.match_id.as_deref().unwrap_or("noid");
    let player_slug = slug_or(&session.player, "player");
    let mode_slug = slug_or(&session.mode, "mode");

    format!(
        "{}_{id_slug}_{player_slug}_{mode_slug}.csv",
        session.variant().records_key()
    )
}

fn slug_or(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        return placeholder.to_string();
    }

    let mut slug = String::with_capacity(value.len());
    let mut in_whitespace = false;
    for character in value.chars() {
        if character.is_whitespace() {
            if !in_whitespace {
                slug.push('_');
            }
            in_whitespace = true;
        } else {
            slug.push(character);
            in_whitespace = false;
        }
    }
    slug
}
