use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::datasets::records::{Experiment, GeneMappingEntry, GoTermRecord};
use crate::datasets::resolver::DatasetKey;
use crate::datasets::source::{DatasetError, DatasetSource};

/// Key of the experiment list document.
pub const EXPERIMENTS_DATASET: &str = "experiments";

#[derive(Debug, Deserialize)]
struct ExperimentsFile {
    experiments: Vec<Experiment>,
}

/// File-backed dataset source reading `<key>.json` documents from a data
/// directory, matching the original GoFlow `data/` layout
/// (`experiments.json`, `synthetic_go_terms.json`,
/// `experiment_<id>_go_terms.json`, `go_term_genes.json`,
/// `experiment_<id>_genes.json`).
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    data_dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn dataset_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, DatasetError> {
        let path = self.dataset_path(key);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DatasetError::Unavailable {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|e| DatasetError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

impl DatasetSource for JsonFileSource {
    fn experiments(&self) -> BoxFuture<'_, Result<Vec<Experiment>, DatasetError>> {
        async move {
            let file: ExperimentsFile = self.read_json(EXPERIMENTS_DATASET).await?;
            Ok(file.experiments)
        }
        .boxed()
    }

    fn term_dataset<'a>(
        &'a self,
        key: &'a DatasetKey,
    ) -> BoxFuture<'a, Result<Vec<GoTermRecord>, DatasetError>> {
        async move { self.read_json(key.as_str()).await }.boxed()
    }

    fn gene_mapping<'a>(
        &'a self,
        key: &'a DatasetKey,
    ) -> BoxFuture<'a, Result<Vec<GeneMappingEntry>, DatasetError>> {
        async move { self.read_json(key.as_str()).await }.boxed()
    }
}
