use futures::future::BoxFuture;
use thiserror::Error;

use crate::datasets::records::{Experiment, GeneMappingEntry, GoTermRecord};
use crate::datasets::resolver::DatasetKey;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset '{key}' is unavailable: {reason}")]
    Unavailable { key: String, reason: String },
    #[error("dataset '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

/// Supplier of experiment metadata and per-experiment datasets. Retrieval is
/// asynchronous, non-cancelable once issued, and may fail; no partial data
/// is ever substituted for a failed fetch.
pub trait DatasetSource {
    fn experiments(&self) -> BoxFuture<'_, Result<Vec<Experiment>, DatasetError>>;

    fn term_dataset<'a>(
        &'a self,
        key: &'a DatasetKey,
    ) -> BoxFuture<'a, Result<Vec<GoTermRecord>, DatasetError>>;

    fn gene_mapping<'a>(
        &'a self,
        key: &'a DatasetKey,
    ) -> BoxFuture<'a, Result<Vec<GeneMappingEntry>, DatasetError>>;
}
