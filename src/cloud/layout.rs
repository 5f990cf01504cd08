use itertools::{Itertools, MinMaxResult};
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::datasets::records::{Category, GoTermRecord};

pub const MIN_FONT_PERCENT: f64 = 80.0;
pub const MAX_FONT_PERCENT: f64 = 250.0;
const SINGLE_TERM_FONT_PERCENT: f64 = 150.0;

const POSITION_MIN_PERCENT: f64 = 5.0;
const POSITION_MAX_PERCENT: f64 = 95.0;
const MAX_ROTATION_DEGREES: f64 = 10.0;

pub const DEFAULT_COLOR: &str = "#000";

lazy_static! {
    static ref CATEGORY_COLORS: FxHashMap<Category, &'static str> = {
        let mut colors = FxHashMap::default();
        colors.insert(Category::BiologicalProcess, "#4285F4");
        colors.insert(Category::MolecularFunction, "#EA4335");
        colors.insert(Category::CellularComponent, "#34A853");

        colors
    };
}

/// Color for a term in the cloud; categories outside the three GO
/// namespaces fall back to a neutral default.
pub fn category_color(category: Category) -> &'static str {
    CATEGORY_COLORS.get(&category).copied().unwrap_or(DEFAULT_COLOR)
}

/// Visual encoding of one term in the cloud, recomputed on every filter or
/// dataset change and never cached across renders. All dimensions are
/// percentages of the container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderParameters {
    pub font_size_percent: f64,
    pub x_percent: f64,
    pub y_percent: f64,
    pub rotation_degrees: f64,
    pub color: &'static str,
    pub z_index: i64,
}

/// Render parameters bound to the term they were computed for.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedTerm {
    pub term: GoTermRecord,
    pub params: RenderParameters,
}

/// Deterministic tag cloud layout, save for the per-term rotation jitter
/// which comes from the injected RNG. Seed it for reproducible output.
pub struct CloudLayout<R: Rng = StdRng> {
    rng: R,
}

impl CloudLayout<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for CloudLayout<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> CloudLayout<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Computes render parameters for every input term. Terms are reordered
    /// by descending weight before spiral slots are assigned, so heavier
    /// terms land nearer the visual center. Output length equals input
    /// length; term collisions are a known cosmetic limitation.
    pub fn layout(&mut self, terms: &[GoTermRecord]) -> Vec<PlacedTerm> {
        let mut ordered: Vec<&GoTermRecord> = terms.iter().collect();
        ordered.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        let (min_weight, max_weight) = match ordered.iter().map(|term| term.weight).minmax() {
            MinMaxResult::NoElements => return Vec::new(),
            MinMaxResult::OneElement(weight) => (weight, weight),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };

        ordered
            .into_iter()
            .enumerate()
            .map(|(index, term)| {
                let (x_percent, y_percent) = spiral_position(index);
                let params = RenderParameters {
                    font_size_percent: font_size(term.weight, min_weight, max_weight, terms.len()),
                    x_percent,
                    y_percent,
                    rotation_degrees: self
                        .rng
                        .random_range(-MAX_ROTATION_DEGREES..=MAX_ROTATION_DEGREES),
                    color: category_color(term.category),
                    z_index: term.weight.floor() as i64,
                };
                PlacedTerm {
                    term: term.clone(),
                    params,
                }
            })
            .collect()
    }
}

/// Linear map of weight onto `[MIN_FONT_PERCENT, MAX_FONT_PERCENT]`,
/// anchored to the observed weight range of the visible set. A lone term
/// gets a fixed mid size; a degenerate range gets the midpoint of the
/// bounds.
fn font_size(weight: f64, min_weight: f64, max_weight: f64, term_count: usize) -> f64 {
    if term_count <= 1 {
        return SINGLE_TERM_FONT_PERCENT;
    }
    let weight_range = max_weight - min_weight;
    if weight_range == 0.0 {
        return (MIN_FONT_PERCENT + MAX_FONT_PERCENT) / 2.0;
    }
    MIN_FONT_PERCENT + (weight - min_weight) / weight_range * (MAX_FONT_PERCENT - MIN_FONT_PERCENT)
}

/// Spiral slot for the i-th term after the descending-weight reorder.
/// Always terminates; coordinates are clamped to the container.
fn spiral_position(index: usize) -> (f64, f64) {
    let angle = index as f64 * 0.5;
    let radius = 30.0 + index as f64 * 2.0;
    let x = 50.0 + radius * angle.cos() * 0.5;
    let y = 50.0 + radius * angle.sin() * 0.5;
    (
        x.clamp(POSITION_MIN_PERCENT, POSITION_MAX_PERCENT),
        y.clamp(POSITION_MIN_PERCENT, POSITION_MAX_PERCENT),
    )
}
