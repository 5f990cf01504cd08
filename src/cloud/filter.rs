use serde::{Deserialize, Serialize};

use crate::datasets::records::{Category, GoTermRecord};

/// Category predicate for the cloud view. `All` passes every term through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    BiologicalProcess,
    MolecularFunction,
    CellularComponent,
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::BiologicalProcess => category == Category::BiologicalProcess,
            CategoryFilter::MolecularFunction => category == Category::MolecularFunction,
            CategoryFilter::CellularComponent => category == Category::CellularComponent,
        }
    }
}

/// Current cloud filters. Owned by the controller; survives experiment
/// changes (only term selection and the gene cache reset on those).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub category: CategoryFilter,
    pub min_enrichment: f64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            min_enrichment: 0.0,
        }
    }
}

/// Applies both filters as a logical AND, preserving input order. The
/// enrichment threshold is inclusive (`weight >= min_enrichment`), and a
/// threshold at or below zero is an explicit pass-through. An empty result
/// is a valid state, not an error.
pub fn apply(terms: &[GoTermRecord], filters: &FilterState) -> Vec<GoTermRecord> {
    terms
        .iter()
        .filter(|term| filters.category.matches(term.category))
        .filter(|term| filters.min_enrichment <= 0.0 || term.weight >= filters.min_enrichment)
        .cloned()
        .collect()
}
