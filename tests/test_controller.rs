use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use rustc_hash::FxHashMap;
use time::{Date, Month};

use goflow::cloud::controller::{CloudController, ControllerError, ViewState};
use goflow::cloud::filter::CategoryFilter;
use goflow::cloud::layout::CloudLayout;
use goflow::datasets::records::{
    Category, Experiment, GeneMappingEntry, GeneRecord, GoTermRecord,
};
use goflow::datasets::resolver::DatasetKey;
use goflow::datasets::source::{DatasetError, DatasetSource};

#[derive(Default, Clone)]
struct MockSource {
    term_datasets: FxHashMap<String, Vec<GoTermRecord>>,
    gene_datasets: FxHashMap<String, Vec<GeneMappingEntry>>,
    term_fetches: Arc<AtomicUsize>,
    gene_fetches: Arc<AtomicUsize>,
    fail_terms: Arc<AtomicBool>,
    fail_genes: Arc<AtomicBool>,
}

fn unavailable(key: &DatasetKey) -> DatasetError {
    DatasetError::Unavailable {
        key: key.as_str().to_string(),
        reason: "offline".to_string(),
    }
}

impl DatasetSource for MockSource {
    fn experiments(&self) -> BoxFuture<'_, Result<Vec<Experiment>, DatasetError>> {
        async { Ok(Vec::new()) }.boxed()
    }

    fn term_dataset<'a>(
        &'a self,
        key: &'a DatasetKey,
    ) -> BoxFuture<'a, Result<Vec<GoTermRecord>, DatasetError>> {
        self.term_fetches.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_terms.load(Ordering::SeqCst) {
            Err(unavailable(key))
        } else {
            Ok(self
                .term_datasets
                .get(key.as_str())
                .cloned()
                .unwrap_or_default())
        };
        async move { result }.boxed()
    }

    fn gene_mapping<'a>(
        &'a self,
        key: &'a DatasetKey,
    ) -> BoxFuture<'a, Result<Vec<GeneMappingEntry>, DatasetError>> {
        self.gene_fetches.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_genes.load(Ordering::SeqCst) {
            Err(unavailable(key))
        } else {
            Ok(self
                .gene_datasets
                .get(key.as_str())
                .cloned()
                .unwrap_or_default())
        };
        async move { result }.boxed()
    }
}

fn experiment(experiment_id: u32) -> Experiment {
    Experiment {
        experiment_id,
        name: format!("Experiment {experiment_id}"),
        description: String::new(),
        organism_name: "Saccharomyces cerevisiae".to_string(),
        experiment_date: Date::from_calendar_date(2025, Month::March, 15).unwrap(),
        dataset_key: None,
    }
}

fn term(go_id: &str, category: Category, weight: f64) -> GoTermRecord {
    GoTermRecord {
        go_id: go_id.to_string(),
        text: format!("{go_id} label"),
        category,
        weight,
    }
}

fn gene(symbol: &str) -> GeneRecord {
    GeneRecord {
        gene_id: symbol.to_lowercase(),
        symbol: symbol.to_string(),
        description: format!("{symbol} description"),
        expression_value: 2.0,
        p_value: 0.005,
        ensembl_id: None,
        uniprot_id: None,
    }
}

fn mapping(go_id: &str, symbols: &[&str]) -> GeneMappingEntry {
    GeneMappingEntry {
        go_id: go_id.to_string(),
        genes: symbols.iter().map(|s| gene(s)).collect(),
    }
}

/// Default-dataset terms plus an experiment-4 dataset whose genes differ for
/// the same GO id.
fn seeded_source() -> MockSource {
    let mut source = MockSource::default();
    source.term_datasets.insert(
        "synthetic_go_terms".to_string(),
        vec![
            term("GO:0006950", Category::BiologicalProcess, 10.0),
            term("GO:0003824", Category::MolecularFunction, 22.5),
            term("GO:0005737", Category::CellularComponent, 4.0),
        ],
    );
    source.term_datasets.insert(
        "experiment_4_go_terms".to_string(),
        vec![term("GO:0006950", Category::BiologicalProcess, 16.0)],
    );
    source.gene_datasets.insert(
        "go_term_genes".to_string(),
        vec![
            mapping("GO:0006950", &["HSP104", "SSA1", "HSP82", "HSP26", "HSP78"]),
            mapping("GO:0003824", &["ADH1"]),
        ],
    );
    source.gene_datasets.insert(
        "experiment_4_genes".to_string(),
        vec![mapping("GO:0006950", &["CTT1", "SOD1"])],
    );
    source
}

fn controller(source: MockSource) -> CloudController<MockSource> {
    CloudController::with_layout(source, CloudLayout::seeded(11))
}

#[tokio::test]
async fn starts_without_an_experiment() {
    let mut controller = controller(seeded_source());
    assert_eq!(controller.view_state(), ViewState::NoExperimentSelected);
    assert!(controller.visible_terms().is_empty());
    let result = controller.select_term("GO:0006950").await;
    assert!(matches!(result, Err(ControllerError::NoExperimentSelected)));
}

#[tokio::test]
async fn selecting_an_experiment_builds_the_cloud() {
    let mut controller = controller(seeded_source());
    controller.select_experiment(experiment(1)).await.unwrap();
    assert_eq!(controller.view_state(), ViewState::ExperimentSelected);
    assert_eq!(controller.visible_terms().len(), 3);
}

#[tokio::test]
async fn selecting_a_term_enriches_it_and_back_returns_to_the_cloud() {
    let mut controller = controller(seeded_source());
    controller.select_experiment(experiment(1)).await.unwrap();
    let enriched = controller.select_term("GO:0006950").await.unwrap();
    assert_eq!(enriched.experimental_term_count, 5);
    assert_eq!(enriched.genome_wide_term_count, 50);
    assert_eq!(controller.view_state(), ViewState::TermSelected);

    controller.back();
    assert_eq!(controller.view_state(), ViewState::ExperimentSelected);
    assert!(controller.selected_term().is_none());
    assert_eq!(controller.visible_terms().len(), 3);
}

#[tokio::test]
async fn gene_mapping_is_fetched_once_per_experiment() {
    let source = seeded_source();
    let gene_fetches = source.gene_fetches.clone();
    let mut controller = controller(source);
    controller.select_experiment(experiment(1)).await.unwrap();
    controller.select_term("GO:0006950").await.unwrap();
    controller.back();
    controller.select_term("GO:0003824").await.unwrap();
    assert_eq!(gene_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn switching_experiments_clears_the_gene_cache() {
    let source = seeded_source();
    let gene_fetches = source.gene_fetches.clone();
    let mut controller = controller(source);

    controller.select_experiment(experiment(1)).await.unwrap();
    let first = controller.select_term("GO:0006950").await.unwrap();
    assert_eq!(first.genes[0].symbol, "HSP104");

    controller.select_experiment(experiment(4)).await.unwrap();
    let second = controller.select_term("GO:0006950").await.unwrap();
    assert_eq!(second.genes[0].symbol, "CTT1");
    assert_eq!(second.experimental_term_count, 2);

    controller.select_experiment(experiment(1)).await.unwrap();
    controller.select_term("GO:0006950").await.unwrap();
    assert_eq!(gene_fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn filter_changes_leave_the_selected_term_alone() {
    let mut controller = controller(seeded_source());
    controller.select_experiment(experiment(1)).await.unwrap();
    controller.select_term("GO:0005737").await.unwrap();

    controller
        .change_filter(None, Some(50.0))
        .await
        .unwrap();
    assert!(controller.visible_terms().is_empty());
    assert_eq!(controller.view_state(), ViewState::TermSelected);
    assert_eq!(
        controller.selected_term().map(|t| t.term.go_id.as_str()),
        Some("GO:0005737")
    );
}

#[tokio::test]
async fn selecting_a_filtered_out_term_is_a_stale_selection() {
    let mut controller = controller(seeded_source());
    controller.select_experiment(experiment(1)).await.unwrap();
    controller
        .change_filter(Some(CategoryFilter::MolecularFunction), None)
        .await
        .unwrap();
    let result = controller.select_term("GO:0006950").await;
    assert!(matches!(result, Err(ControllerError::StaleSelection(_))));
    assert_eq!(controller.view_state(), ViewState::ExperimentSelected);
}

#[tokio::test]
async fn filters_survive_experiment_changes() {
    let mut controller = controller(seeded_source());
    controller
        .change_filter(Some(CategoryFilter::BiologicalProcess), Some(2.0))
        .await
        .unwrap();
    controller.select_experiment(experiment(1)).await.unwrap();
    assert_eq!(controller.filters().category, CategoryFilter::BiologicalProcess);
    assert_eq!(controller.filters().min_enrichment, 2.0);
    assert_eq!(controller.visible_terms().len(), 1);
}

#[tokio::test]
async fn term_fetch_failure_keeps_the_previous_cloud() {
    let source = seeded_source();
    let fail_terms = source.fail_terms.clone();
    let mut controller = controller(source);
    controller.select_experiment(experiment(1)).await.unwrap();

    fail_terms.store(true, Ordering::SeqCst);
    let result = controller.select_experiment(experiment(4)).await;
    assert!(matches!(result, Err(ControllerError::Dataset(_))));
    assert_eq!(controller.visible_terms().len(), 3);
}

#[tokio::test]
async fn first_interactive_gene_fetch_failure_is_surfaced() {
    let source = seeded_source();
    let fail_genes = source.fail_genes.clone();
    let mut controller = controller(source);
    controller.select_experiment(experiment(1)).await.unwrap();

    fail_genes.store(true, Ordering::SeqCst);
    let result = controller.select_term("GO:0006950").await;
    assert!(matches!(result, Err(ControllerError::Dataset(_))));
    assert_eq!(controller.view_state(), ViewState::ExperimentSelected);
    assert!(controller.selected_term().is_none());

    // Recoverable by the next user action once the source is back.
    fail_genes.store(false, Ordering::SeqCst);
    let enriched = controller.select_term("GO:0006950").await.unwrap();
    assert_eq!(enriched.experimental_term_count, 5);
}

#[tokio::test]
async fn prefetch_failure_is_silent_and_retried_on_click() {
    let source = seeded_source();
    let fail_genes = source.fail_genes.clone();
    let gene_fetches = source.gene_fetches.clone();
    let mut controller = controller(source);
    controller.select_experiment(experiment(1)).await.unwrap();

    fail_genes.store(true, Ordering::SeqCst);
    controller.prefetch_gene_mapping().await;
    fail_genes.store(false, Ordering::SeqCst);
    controller.select_term("GO:0006950").await.unwrap();
    assert_eq!(gene_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn successful_prefetch_spares_the_interactive_fetch() {
    let source = seeded_source();
    let gene_fetches = source.gene_fetches.clone();
    let mut controller = controller(source);
    controller.select_experiment(experiment(1)).await.unwrap();
    controller.prefetch_gene_mapping().await;
    controller.select_term("GO:0006950").await.unwrap();
    assert_eq!(gene_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn term_count_soft_fails_to_zero() {
    let source = seeded_source();
    let fail_terms = source.fail_terms.clone();
    let mut controller = controller(source);
    controller.select_experiment(experiment(1)).await.unwrap();

    assert_eq!(controller.term_count(&experiment(1)).await, 3);
    fail_terms.store(true, Ordering::SeqCst);
    assert_eq!(controller.term_count(&experiment(1)).await, 0);
}

#[tokio::test]
async fn missing_term_dataset_yields_an_empty_cloud() {
    let mut controller = controller(seeded_source());
    // Experiment 5 resolves to its own dataset, which the mock leaves empty.
    controller.select_experiment(experiment(5)).await.unwrap();
    assert!(controller.visible_terms().is_empty());
    assert_eq!(controller.view_state(), ViewState::ExperimentSelected);
}
