use std::collections::HashSet;

use cheque_core::ChequeRecord;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::store::{ChequeStore, StoreError};

/// Composite identity of a cheque row. Two rows with equal keys are the
/// same cheque, whatever their bank name says.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// Trimmed, lowercased.
    pub filename: String,
    /// Trimmed, uppercased.
    pub ifsc_code: String,
    /// Rounded to two places; `None` when absent or not a number. A key
    /// without an amount never equals any other key, itself included.
    pub amount: Option<Decimal>,
    /// Trimmed.
    pub date: String,
}

impl From<&ChequeRecord> for DedupKey {
    fn from(r: &ChequeRecord) -> Self {
        Self {
            filename: r.filename.trim().to_lowercase(),
            ifsc_code: r.ifsc_code.trim().to_uppercase(),
            amount: r.amount_value().map(|d| d.normalize()),
            date: r.date.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Appended,
    Duplicate,
}

/// Append-only view over a store that refuses rows it has already seen.
///
/// Keys are loaded once when the ledger opens and kept current as rows are
/// appended, so repeats inside one batch are caught as well. Rows without a
/// usable amount are never considered duplicates. Callers that
/// share a ledger across tasks must hold it behind a single lock.
pub struct ChequeLedger<S: ChequeStore> {
    store: S,
    seen: HashSet<DedupKey>,
}

impl<S: ChequeStore> ChequeLedger<S> {
    pub fn open(store: S) -> Result<Self, StoreError> {
        let seen = store
            .load()?
            .iter()
            .map(DedupKey::from)
            .filter(|k| k.amount.is_some())
            .collect();
        Ok(Self { store, seen })
    }

    /// Append `record` unless an equal key is already stored.
    pub fn submit(&mut self, record: &ChequeRecord) -> Result<SubmitOutcome, StoreError> {
        let key = DedupKey::from(record);
        if key.amount.is_some() && self.seen.contains(&key) {
            warn!(filename = %record.filename, "Duplicate cheque skipped");
            return Ok(SubmitOutcome::Duplicate);
        }
        self.store.append(record)?;
        if key.amount.is_some() {
            self.seen.insert(key);
        }
        info!(filename = %record.filename, "Cheque appended");
        Ok(SubmitOutcome::Appended)
    }

    /// Every stored row, in table order.
    pub fn records(&self) -> Result<Vec<ChequeRecord>, StoreError> {
        self.store.load()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
