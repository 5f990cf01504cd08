use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumString};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub type GeneMap = FxHashMap<String, Vec<GeneRecord>>;

/// Gene Ontology namespace of a term. Datasets occasionally carry category
/// strings outside the three canonical namespaces; those deserialize to
/// `Unknown` and still render with a neutral color instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    BiologicalProcess,
    MolecularFunction,
    CellularComponent,
    Unknown,
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(Category::Unknown))
    }
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::BiologicalProcess => "biological process",
            Category::MolecularFunction => "molecular function",
            Category::CellularComponent => "cellular component",
            Category::Unknown => "unknown",
        }
    }
}

/// Experiment metadata as held by the registry. Immutable once created.
///
/// `dataset_key` names the dataset pair an experiment's records live in.
/// Experiments created before the field existed leave it unset and fall back
/// to the numeric id convention in [`crate::datasets::resolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: u32,
    pub name: String,
    pub description: String,
    pub organism_name: String,
    #[serde(with = "iso_date")]
    pub experiment_date: Date,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_key: Option<String>,
}

/// One enriched GO term as stored in a term dataset. `weight` is the
/// enrichment percentage driving font size in the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoTermRecord {
    pub go_id: String,
    pub text: String,
    pub category: Category,
    pub weight: f64,
}

/// A gene annotated to a GO term in the current experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    pub gene_id: String,
    pub symbol: String,
    pub description: String,
    pub expression_value: f64,
    pub p_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensembl_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniprot_id: Option<String>,
}

/// One row of a gene-mapping dataset: the genes annotated to a GO term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneMappingEntry {
    pub go_id: String,
    pub genes: Vec<GeneRecord>,
}

/// Indexes a gene-mapping dataset by `go_id` for term-detail lookups.
pub fn index_gene_mapping(entries: Vec<GeneMappingEntry>) -> GeneMap {
    entries
        .into_iter()
        .map(|entry| (entry.go_id, entry.genes))
        .collect()
}
