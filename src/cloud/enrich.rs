use serde::Serialize;

use crate::datasets::records::{GeneMap, GeneRecord, GoTermRecord};

/// A GO term with its associated genes and derived counts, built on demand
/// when a term is selected. Never persisted; recomputed on each selection.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedTerm {
    #[serde(flatten)]
    pub term: GoTermRecord,
    pub genes: Vec<GeneRecord>,
    pub experimental_term_count: usize,
    pub genome_wide_term_count: u64,
}

/// Extrapolates the genome-wide term count from the experimental count and
/// the enrichment weight (a percentage). The zero-weight policy lives here
/// and only here: a non-positive weight yields zero instead of dividing by
/// zero.
pub fn genome_wide_count(experimental_count: usize, weight: f64) -> u64 {
    if weight <= 0.0 {
        return 0;
    }
    (experimental_count as f64 / (weight / 100.0)).round() as u64
}

/// Looks up the term's genes in the indexed mapping and derives both counts.
/// A term with no mapping entry gets an empty gene list, not an error.
pub fn enrich_term(term: &GoTermRecord, genes_by_go: &GeneMap) -> EnrichedTerm {
    let genes = genes_by_go.get(&term.go_id).cloned().unwrap_or_default();
    let experimental_term_count = genes.len();
    EnrichedTerm {
        term: term.clone(),
        genome_wide_term_count: genome_wide_count(experimental_term_count, term.weight),
        experimental_term_count,
        genes,
    }
}
