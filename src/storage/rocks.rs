//! RocksDB backed frequency store.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use rocksdb::{ErrorKind, MultiThreaded, TransactionDB};

use super::{row_key, AlleleFrequencyRow, Error, FrequencyStore, MAX_ROWS};
use crate::{anyvar::VariantId, common};

/// Name of the column family with meta information.
pub const CF_META: &str = "meta";
/// Name of the column family with the allele frequency rows.
pub const CF_ALLELE_FREQUENCIES: &str = "allele_frequencies";

/// Maximal number of attempts for committing one batch.
const MAX_RETRIES: usize = 10;

/// Frequency store on top of a RocksDB transaction database.
///
/// Values are the JSON serialization of [`AlleleFrequencyRow`], keys are
/// `{variant_id}\t{cohort}` so all rows of a variant are adjacent.
pub struct RocksDbStore {
    db: Arc<TransactionDB<MultiThreaded>>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbStore")
            .field("path", &self.path)
            .finish()
    }
}

impl RocksDbStore {
    /// Open the database at `path`, creating it if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        tracing::info!("Opening RocksDB at {:?}...", path.as_ref());
        let mut options = rocksdb::Options::default();
        options.create_if_missing(true);
        options.create_missing_column_families(true);
        let tx_options = rocksdb::TransactionDBOptions::default();
        let cf_descriptors = [CF_META, CF_ALLELE_FREQUENCIES]
            .iter()
            .map(|name| rocksdb::ColumnFamilyDescriptor::new(*name, options.clone()))
            .collect::<Vec<_>>();

        let db: Arc<TransactionDB<MultiThreaded>> = Arc::new(TransactionDB::open_cf_descriptors(
            &options,
            &tx_options,
            path.as_ref(),
            cf_descriptors,
        )?);

        let store = Self {
            db,
            path: path.as_ref().to_path_buf(),
        };
        {
            tracing::info!("  writing meta information");
            let cf_meta = store.cf(CF_META)?;
            store
                .db
                .put_cf(&cf_meta, "anyvlm-worker-version", common::worker_version())?;
            store
                .db
                .put_cf(&cf_meta, "db-name", "anyvlm-allele-frequencies")?;
        }
        tracing::info!("... done opening RocksDB");

        Ok(store)
    }

    fn cf(&self, name: &str) -> Result<Arc<rocksdb::BoundColumnFamily<'_>>, Error> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::MissingColumnFamily(name.to_string()))
    }

    /// Read a meta value as string.
    pub fn meta(&self, key: &str) -> Result<Option<String>, Error> {
        let cf_meta = self.cf(CF_META)?;
        Ok(self
            .db
            .get_cf(&cf_meta, key)?
            .map(|value| String::from_utf8_lossy(&value).to_string()))
    }

    /// Run one attempt of inserting `rows` within a single transaction.
    fn try_insert(&self, rows: &[AlleleFrequencyRow]) -> Result<usize, InsertError> {
        let cf_data = self.cf(CF_ALLELE_FREQUENCIES).map_err(InsertError::Fatal)?;
        let transaction = self.db.transaction();
        let mut written = 0;
        for row in rows {
            let key = row.key();
            if transaction
                .get_for_update_cf(&cf_data, &key, true)
                .map_err(InsertError::from_rocksdb)?
                .is_some()
            {
                tracing::trace!("skipping existing row {:?}", &key);
                continue;
            }
            let value = serde_json::to_vec(row).map_err(|e| InsertError::Fatal(e.into()))?;
            transaction
                .put_cf(&cf_data, &key, value)
                .map_err(InsertError::from_rocksdb)?;
            written += 1;
        }
        transaction.commit().map_err(InsertError::from_rocksdb)?;
        Ok(written)
    }

    /// Iterate all rows whose key starts with `prefix`.
    fn scan_prefix(
        &self,
        prefix: &str,
        limit: usize,
        out: &mut Vec<AlleleFrequencyRow>,
    ) -> Result<(), Error> {
        let cf_data = self.cf(CF_ALLELE_FREQUENCIES)?;
        let iter = self.db.iterator_cf(
            &cf_data,
            rocksdb::IteratorMode::From(prefix.as_bytes(), rocksdb::Direction::Forward),
        );
        for item in iter {
            if out.len() >= limit {
                break;
            }
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(())
    }
}

/// Failure of one insertion attempt.
enum InsertError {
    /// Lock conflict; the attempt may be repeated.
    Retry(rocksdb::Error),
    Fatal(Error),
}

impl InsertError {
    fn from_rocksdb(e: rocksdb::Error) -> Self {
        match e.kind() {
            ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => InsertError::Retry(e),
            _ => InsertError::Fatal(e.into()),
        }
    }
}

impl FrequencyStore for RocksDbStore {
    fn bulk_insert_skip_conflicts(&self, rows: &[AlleleFrequencyRow]) -> Result<usize, Error> {
        let mut retries = 0;
        loop {
            match self.try_insert(rows) {
                Ok(written) => return Ok(written),
                Err(InsertError::Fatal(e)) => return Err(e),
                Err(InsertError::Retry(e)) => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(Error::CommitRetries {
                            retries,
                            last_error: e.to_string(),
                        });
                    }
                    if retries > 5 {
                        tracing::warn!(
                            "problem committing transaction for {} rows: {} (retry #{})",
                            rows.len(),
                            e,
                            retries
                        );
                    }
                }
            }
        }
    }

    fn get_by_variant_id(&self, variant_id: &VariantId) -> Result<Vec<AlleleFrequencyRow>, Error> {
        let mut result = Vec::new();
        self.scan_prefix(&row_key(variant_id, ""), usize::MAX, &mut result)?;
        Ok(result)
    }

    fn get_by_variant_ids(
        &self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<AlleleFrequencyRow>, Error> {
        let mut result = Vec::new();
        for variant_id in variant_ids {
            if result.len() >= MAX_ROWS {
                break;
            }
            self.scan_prefix(&row_key(variant_id, ""), MAX_ROWS, &mut result)?;
        }
        Ok(result)
    }

    fn wipe_all(&self) -> Result<(), Error> {
        let cf_data = self.cf(CF_ALLELE_FREQUENCIES)?;
        let mut batch = rocksdb::WriteBatchWithTransaction::<true>::default();
        for item in self.db.iterator_cf(&cf_data, rocksdb::IteratorMode::Start) {
            let (key, _) = item?;
            batch.delete_cf(&cf_data, key);
        }
        tracing::info!("deleting {} rows", batch.len());
        self.db.write(batch)?;
        Ok(())
    }
}
