//! Persistence of cohort allele frequency rows.

pub mod rocks;

use crate::anyvar::VariantId;

/// Maximal number of rows returned by [`FrequencyStore::get_by_variant_ids`].
pub const MAX_ROWS: usize = 100;

/// Errors raised by frequency store backends.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("could not (de)serialize allele frequency row: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("missing column family {0:?}")]
    MissingColumnFamily(String),
    #[error("problem committing transaction: {last_error} (after {retries} retries)")]
    CommitRetries { retries: usize, last_error: String },
}

/// Flat, persisted form of one cohort allele frequency record.
///
/// There is at most one row per `(variant_id, cohort)`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AlleleFrequencyRow {
    /// Variant id as assigned by AnyVar.
    pub variant_id: VariantId,
    /// Name of the cohort.
    pub cohort: String,
    /// Number of called alleles at the locus (`AN`).
    pub an: i64,
    /// Number of observed alternate alleles (`AC`).
    pub ac: i64,
    pub ac_het: Option<i64>,
    pub ac_hom: Option<i64>,
    pub ac_hemi: Option<i64>,
    /// VCF `FILTER` values, if any.
    pub filters: Option<Vec<String>>,
}

impl AlleleFrequencyRow {
    /// Storage key `{variant_id}\t{cohort}`.
    pub fn key(&self) -> String {
        row_key(&self.variant_id, &self.cohort)
    }
}

pub(crate) fn row_key(variant_id: &VariantId, cohort: &str) -> String {
    format!("{}\t{}", variant_id, cohort)
}

/// Operations of the frequency store.
///
/// Implementations must support concurrent reads while a bulk insert is running.
pub trait FrequencyStore: Send + Sync {
    /// Insert rows, skipping those whose key already exists; returns the number written.
    fn bulk_insert_skip_conflicts(&self, rows: &[AlleleFrequencyRow]) -> Result<usize, Error>;

    /// Return all rows for the given variant.
    fn get_by_variant_id(&self, variant_id: &VariantId) -> Result<Vec<AlleleFrequencyRow>, Error>;

    /// Return rows for any of the given variants, at most [`MAX_ROWS`].
    fn get_by_variant_ids(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<AlleleFrequencyRow>, Error>;

    /// Remove all rows.
    fn wipe_all(&self) -> Result<(), Error>;
}

#[cfg(test)]
pub mod fake {
    //! In-memory store for tests.

    use std::{
        collections::BTreeMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use super::{AlleleFrequencyRow, Error, FrequencyStore, MAX_ROWS};
    use crate::anyvar::VariantId;

    #[derive(Debug, Default)]
    pub struct MemoryStore {
        rows: Mutex<BTreeMap<String, AlleleFrequencyRow>>,
        pub insert_calls: AtomicUsize,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    impl FrequencyStore for MemoryStore {
        fn bulk_insert_skip_conflicts(&self, rows: &[AlleleFrequencyRow]) -> Result<usize, Error> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            let mut stored = self.rows.lock().unwrap();
            let mut written = 0;
            for row in rows {
                stored.entry(row.key()).or_insert_with(|| {
                    written += 1;
                    row.clone()
                });
            }
            Ok(written)
        }

        fn get_by_variant_id(
            &self,
            variant_id: &VariantId,
        ) -> Result<Vec<AlleleFrequencyRow>, Error> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|row| &row.variant_id == variant_id)
                .cloned()
                .collect())
        }

        fn get_by_variant_ids(
            &self,
            variant_ids: &[VariantId],
        ) -> Result<Vec<AlleleFrequencyRow>, Error> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|row| variant_ids.contains(&row.variant_id))
                .take(MAX_ROWS)
                .cloned()
                .collect())
        }

        fn wipe_all(&self) -> Result<(), Error> {
            self.rows.lock().unwrap().clear();
            Ok(())
        }
    }
}
