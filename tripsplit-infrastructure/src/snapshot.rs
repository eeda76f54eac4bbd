use crate::store::InMemoryLedgerStore;
use serde::{Deserialize, Serialize};
use std::{io::Read, path::Path};
use tripsplit_application::StoreError;
use tripsplit_domain::{Expense, Refund, SettlementRecord, Trip, TripId};

/// JSON ledger file: flat arrays of every record kind.
///
/// Refunds may be listed at the top level or nested under their expense.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub refunds: Vec<Refund>,
    #[serde(default)]
    pub settlements: Vec<SettlementRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read ledger document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed ledger document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("inconsistent ledger document: {0}")]
    Store(#[from] StoreError),
}

impl LedgerDocument {
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, DocumentError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Trip ids in document order.
    pub fn trip_ids(&self) -> Vec<TripId> {
        self.trips.iter().map(|trip| trip.id.clone()).collect()
    }

    /// Loads every record into a fresh store. Fails on the first record that
    /// points at a trip or expense the document does not contain.
    pub fn into_store(self) -> Result<InMemoryLedgerStore, DocumentError> {
        let mut store = InMemoryLedgerStore::new();
        for trip in self.trips {
            store.insert_trip(trip);
        }
        for expense in self.expenses {
            store.record_expense(expense)?;
        }
        for refund in self.refunds {
            store.record_refund(refund)?;
        }
        for settlement in self.settlements {
            store.record_settlement(settlement)?;
        }
        Ok(store)
    }
}
