//! GoFlow: Gene Ontology term enrichment visualization core.
//!
//! The `datasets` module tree covers raw data concerns: experiment metadata,
//! GO term and gene records, dataset resolution and retrieval. The `cloud`
//! module tree derives everything the tag cloud view needs from those
//! records: filtering, gene enrichment, layout and the controller that ties
//! them together.

pub mod cloud;
pub mod datasets;
