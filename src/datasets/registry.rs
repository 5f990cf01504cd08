use serde::Deserialize;
use time::OffsetDateTime;

use crate::datasets::records::Experiment;

/// Fields supplied by the upload form when registering an experiment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExperiment {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub organism_name: String,
}

/// In-memory, append-only experiment list. Lives for the process lifetime;
/// nothing here is written to durable storage.
#[derive(Debug, Default)]
pub struct ExperimentRegistry {
    experiments: Vec<Experiment>,
}

impl ExperimentRegistry {
    pub fn new(seed: Vec<Experiment>) -> Self {
        Self { experiments: seed }
    }

    pub fn all(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn get(&self, experiment_id: u32) -> Option<&Experiment> {
        self.experiments
            .iter()
            .find(|experiment| experiment.experiment_id == experiment_id)
    }

    /// Appends a new experiment dated today, with the next free id. The new
    /// entry carries no `dataset_key`, so the resolver falls back to the
    /// shared default dataset for it.
    pub fn append(&mut self, new: NewExperiment) -> Experiment {
        let next_id = self
            .experiments
            .iter()
            .map(|experiment| experiment.experiment_id)
            .max()
            .unwrap_or(0)
            + 1;
        let experiment = Experiment {
            experiment_id: next_id,
            name: new.name,
            description: new.description,
            organism_name: new.organism_name,
            experiment_date: OffsetDateTime::now_utc().date(),
            dataset_key: None,
        };
        self.experiments.push(experiment.clone());
        experiment
    }
}
