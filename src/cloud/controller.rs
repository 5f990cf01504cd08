use log::warn;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::cloud::enrich::{enrich_term, EnrichedTerm};
use crate::cloud::filter::{self, CategoryFilter, FilterState};
use crate::cloud::layout::{CloudLayout, PlacedTerm};
use crate::datasets::records::{index_gene_mapping, Experiment, GeneMap};
use crate::datasets::resolver;
use crate::datasets::source::{DatasetError, DatasetSource};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no experiment is selected")]
    NoExperimentSelected,
    #[error("term '{0}' is not part of the current cloud")]
    StaleSelection(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    NoExperimentSelected,
    ExperimentSelected,
    TermSelected,
}

/// Orchestrates resolver, filter, layout and enrichment across user-driven
/// selection and filter events.
///
/// The controller is the single writer for all visualization state. Each
/// transition method corresponds to one discrete user action; read accessors
/// expose immutable snapshots. The gene-mapping cache is loaded at most once
/// per experiment selection and cleared, never merged, on every experiment
/// change. Refetches carry a monotonic token so that a response overtaken by
/// a newer request is discarded (last-issued-wins).
pub struct CloudController<S, R: Rng = StdRng> {
    source: S,
    layout: CloudLayout<R>,
    filters: FilterState,
    selected_experiment: Option<Experiment>,
    selected_term: Option<EnrichedTerm>,
    visible: Vec<PlacedTerm>,
    gene_map: Option<GeneMap>,
    fetch_token: u64,
}

impl<S: DatasetSource> CloudController<S> {
    pub fn new(source: S) -> Self {
        Self::with_layout(source, CloudLayout::new())
    }
}

impl<S: DatasetSource, R: Rng> CloudController<S, R> {
    pub fn with_layout(source: S, layout: CloudLayout<R>) -> Self {
        Self {
            source,
            layout,
            filters: FilterState::default(),
            selected_experiment: None,
            selected_term: None,
            visible: Vec::new(),
            gene_map: None,
            fetch_token: 0,
        }
    }

    pub fn view_state(&self) -> ViewState {
        match (&self.selected_experiment, &self.selected_term) {
            (None, _) => ViewState::NoExperimentSelected,
            (Some(_), None) => ViewState::ExperimentSelected,
            (Some(_), Some(_)) => ViewState::TermSelected,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn selected_experiment(&self) -> Option<&Experiment> {
        self.selected_experiment.as_ref()
    }

    pub fn selected_term(&self) -> Option<&EnrichedTerm> {
        self.selected_term.as_ref()
    }

    /// Render parameters bound to the currently visible terms, in spiral
    /// placement order (descending weight).
    pub fn visible_terms(&self) -> &[PlacedTerm] {
        &self.visible
    }

    fn next_token(&mut self) -> u64 {
        self.fetch_token += 1;
        self.fetch_token
    }

    /// Selects an experiment: clears the term selection and the gene cache
    /// unconditionally, then refetches, refilters and relays out the cloud.
    /// On retrieval failure the previously visible cloud stays untouched and
    /// the error is surfaced to the caller.
    pub async fn select_experiment(&mut self, experiment: Experiment) -> Result<(), ControllerError> {
        self.selected_term = None;
        self.gene_map = None;
        let key = resolver::resolve_term_dataset(&experiment);
        self.selected_experiment = Some(experiment);
        self.rebuild_cloud(&key).await
    }

    /// Updates the filters and recomputes the cloud. The selected experiment
    /// and term are untouched: filters only affect the cloud view.
    pub async fn change_filter(
        &mut self,
        category: Option<CategoryFilter>,
        min_enrichment: Option<f64>,
    ) -> Result<(), ControllerError> {
        if let Some(category) = category {
            self.filters.category = category;
        }
        if let Some(min_enrichment) = min_enrichment {
            self.filters.min_enrichment = min_enrichment;
        }
        let Some(experiment) = &self.selected_experiment else {
            return Ok(());
        };
        let key = resolver::resolve_term_dataset(experiment);
        self.rebuild_cloud(&key).await
    }

    async fn rebuild_cloud(
        &mut self,
        key: &resolver::DatasetKey,
    ) -> Result<(), ControllerError> {
        let token = self.next_token();
        let terms = self.source.term_dataset(key).await?;
        if token != self.fetch_token {
            // Overtaken by a newer fetch; drop this response.
            return Ok(());
        }
        let filtered = filter::apply(&terms, &self.filters);
        self.visible = self.layout.layout(&filtered);
        Ok(())
    }

    /// Enriches the clicked term with its genes and derived counts. The term
    /// must still be part of the current cloud. The gene mapping is fetched
    /// on the first selection within an experiment and reused afterwards; a
    /// failure on that first fetch is surfaced to the user and the view
    /// stays on the cloud.
    pub async fn select_term(&mut self, go_id: &str) -> Result<EnrichedTerm, ControllerError> {
        let experiment = self
            .selected_experiment
            .clone()
            .ok_or(ControllerError::NoExperimentSelected)?;
        let term = self
            .visible
            .iter()
            .find(|placed| placed.term.go_id == go_id)
            .map(|placed| placed.term.clone())
            .ok_or_else(|| ControllerError::StaleSelection(go_id.to_string()))?;

        let genes_by_go = match self.gene_map.take() {
            Some(map) => map,
            None => {
                let key = resolver::resolve_gene_dataset(&experiment);
                let entries = self.source.gene_mapping(&key).await?;
                index_gene_mapping(entries)
            }
        };
        let enriched = enrich_term(&term, &genes_by_go);
        self.gene_map = Some(genes_by_go);
        self.selected_term = Some(enriched.clone());
        Ok(enriched)
    }

    /// Returns from the detail view to the cloud.
    pub fn back(&mut self) {
        self.selected_term = None;
    }

    /// Background warm of the per-experiment gene cache. Failures are logged
    /// and leave the cache cold; the next interactive selection retries.
    pub async fn prefetch_gene_mapping(&mut self) {
        let Some(experiment) = &self.selected_experiment else {
            return;
        };
        if self.gene_map.is_some() {
            return;
        }
        let key = resolver::resolve_gene_dataset(experiment);
        match self.source.gene_mapping(&key).await {
            Ok(entries) => self.gene_map = Some(index_gene_mapping(entries)),
            Err(e) => warn!(
                "gene mapping prefetch for experiment {} failed: {}",
                experiment.experiment_id, e
            ),
        }
    }

    /// Term count for the admin summary table. A background fetch, so a
    /// retrieval failure degrades to zero rather than surfacing an error.
    pub async fn term_count(&self, experiment: &Experiment) -> usize {
        let key = resolver::resolve_term_dataset(experiment);
        match self.source.term_dataset(&key).await {
            Ok(terms) => terms.len(),
            Err(e) => {
                warn!(
                    "term count for experiment {} unavailable: {}",
                    experiment.experiment_id, e
                );
                0
            }
        }
    }
}
