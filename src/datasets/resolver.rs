use std::fmt;

use crate::datasets::records::Experiment;

/// Name of an addressable dataset, without transport details. The dataset
/// source decides how a key maps onto a file, URL or table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey(pub String);

impl DatasetKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shared default term dataset for experiments without their own data.
pub const DEFAULT_TERM_DATASET: &str = "synthetic_go_terms";
/// Shared default gene-mapping dataset.
pub const DEFAULT_GENE_DATASET: &str = "go_term_genes";

/// An explicit `dataset_key` on the experiment wins. Otherwise the legacy
/// naming convention applies: experiments 4 through 7 ship their own
/// datasets, every other id silently shares the synthetic default.
fn dataset_stem(experiment: &Experiment) -> Option<String> {
    if let Some(key) = &experiment.dataset_key {
        return Some(key.clone());
    }
    if (4..=7).contains(&experiment.experiment_id) {
        Some(format!("experiment_{}", experiment.experiment_id))
    } else {
        None
    }
}

pub fn resolve_term_dataset(experiment: &Experiment) -> DatasetKey {
    match dataset_stem(experiment) {
        Some(stem) => DatasetKey(format!("{stem}_go_terms")),
        None => DatasetKey(DEFAULT_TERM_DATASET.to_string()),
    }
}

pub fn resolve_gene_dataset(experiment: &Experiment) -> DatasetKey {
    match dataset_stem(experiment) {
        Some(stem) => DatasetKey(format!("{stem}_genes")),
        None => DatasetKey(DEFAULT_GENE_DATASET.to_string()),
    }
}
