use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::store::{Store, StoreResult};

pub const DOCUMENT_NUMBER_PREFIX: &str = "LGU";

/// How the trailing sequence of a document number is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberingStrategy {
    /// Cached document count + 1. Not atomic: concurrent creates can collide,
    /// in which case the unique constraint rejects the second insert.
    #[default]
    CachedCount,
    /// Per-period counter advanced atomically by the store.
    StoreSequence,
}

impl FromStr for NumberingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cached-count" => Ok(NumberingStrategy::CachedCount),
            "store-sequence" => Ok(NumberingStrategy::StoreSequence),
            other => Err(format!(
                "unknown numbering strategy '{other}' (expected cached-count or store-sequence)"
            )),
        }
    }
}

/// Two-digit year followed by two-digit month, e.g. `2405`.
pub fn period(date: NaiveDate) -> String {
    format!("{:02}{:02}", date.year().rem_euclid(100), date.month())
}

/// `LGU-{YY}{MM}-{sequence}`
pub fn format_document_number(date: NaiveDate, sequence: i64) -> String {
    format!("{DOCUMENT_NUMBER_PREFIX}-{}-{sequence}", period(date))
}

impl NumberingStrategy {
    /// Assign the number for a document created on `date`.
    /// `cached_count` is the number of documents the caller currently knows of.
    pub async fn assign(
        &self,
        store: &dyn Store,
        date: NaiveDate,
        cached_count: usize,
    ) -> StoreResult<String> {
        let sequence = match self {
            NumberingStrategy::CachedCount => cached_count as i64 + 1,
            NumberingStrategy::StoreSequence => store.next_document_sequence(&period(date)).await?,
        };
        Ok(format_document_number(date, sequence))
    }
}
