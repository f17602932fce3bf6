mod model;

use serde_json::Map;
use thiserror::Error;

pub use model::{Record, RecordBody, RecordFields, RecordVariant, EVENT_NAMES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("No record at position {index} (ledger holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("This session records {expected:?}; the submitted record does not match")]
    VariantMismatch { expected: RecordVariant },
}

/// Ordered records of one session.
///
/// Records are kept in creation order and their sequence numbers always read
/// `1..=len` in that order. Deleting a record renumbers the survivors, so a
/// sequence number is a position for display and export, not a stable identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    variant: RecordVariant,
    records: Vec<Record>,
    next_sequence_number: u32,
}

impl Ledger {
    pub fn new(variant: RecordVariant) -> Self {
        Self {
            variant,
            records: Vec::new(),
            next_sequence_number: 1,
        }
    }

    /// Rebuilds a ledger from stored records, repairing sequence numbers that
    /// are not dense. Returns the ledger and whether a repair was needed.
    pub(crate) fn restore(variant: RecordVariant, records: Vec<Record>) -> (Self, bool) {
        let mut ledger = Self {
            variant,
            records,
            next_sequence_number: 1,
        };
        for record in &mut ledger.records {
            record.body.normalize(variant);
        }
        let repaired = ledger.renumber();
        (ledger, repaired)
    }

    pub fn variant(&self) -> RecordVariant {
        self.variant
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_sequence_number(&self) -> u32 {
        self.next_sequence_number
    }

    pub fn append(
        &mut self,
        match_id: impl Into<String>,
        fields: RecordFields,
    ) -> Result<&Record, LedgerError> {
        let mut body = self.conform(fields.body)?;
        body.normalize(self.variant);

        let sequence_number = self.next_sequence_number;
        self.next_sequence_number = self.next_sequence_number.saturating_add(1);
        self.records.push(Record {
            match_id: match_id.into(),
            player: fields.player,
            mode: fields.mode,
            sequence_number,
            body,
            extra: Map::new(),
        });

        let index = self.records.len() - 1;
        Ok(&self.records[index])
    }

    pub fn update(&mut self, index: usize, fields: RecordFields) -> Result<&Record, LedgerError> {
        let len = self.records.len();
        if index >= len {
            return Err(LedgerError::IndexOutOfRange { index, len });
        }
        let mut body = self.conform(fields.body)?;
        body.normalize(self.variant);

        let record = &mut self.records[index];
        record.player = fields.player;
        record.mode = fields.mode;
        record.body = body;
        Ok(&*record)
    }

    pub fn remove(&mut self, index: usize) -> Result<Record, LedgerError> {
        let len = self.records.len();
        if index >= len {
            return Err(LedgerError::IndexOutOfRange { index, len });
        }

        let removed = self.records.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Newest first, paired with the position each record holds in the ledger.
    pub fn sorted_by_recency(&self) -> Vec<(usize, &Record)> {
        let mut ordered: Vec<(usize, &Record)> = self.records.iter().enumerate().collect();
        ordered.sort_by(|(_, left), (_, right)| right.sequence_number.cmp(&left.sequence_number));
        ordered
    }

    pub fn sorted_for_export(&self) -> Vec<&Record> {
        let mut ordered: Vec<&Record> = self.records.iter().collect();
        ordered.sort_by_key(|record| record.sequence_number);
        ordered
    }

    fn conform(&self, body: RecordBody) -> Result<RecordBody, LedgerError> {
        if self.variant.accepts(&body) {
            Ok(body)
        } else {
            Err(LedgerError::VariantMismatch {
                expected: self.variant,
            })
        }
    }

    fn renumber(&mut self) -> bool {
        let mut changed = false;
        for (position, record) in self.records.iter_mut().enumerate() {
            let expected = u32::try_from(position + 1).unwrap_or(u32::MAX);
            if record.sequence_number != expected {
                record.sequence_number = expected;
                changed = true;
            }
        }

        self.next_sequence_number = u32::try_from(self.records.len() + 1).unwrap_or(u32::MAX);
        changed
    }
}
