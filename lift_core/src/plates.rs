//! Barbell plate loadout calculation.
//!
//! Plates are picked greedily, heaviest first, and always in pairs so both
//! sides of the bar carry the same load. With standard plate sets the greedy
//! choice hits the target exactly; with odd inventories the result may fall
//! short, which the caller sees through `achieved_weight`.

use crate::PlateEntry;
use once_cell::sync::Lazy;

/// Standard pound plate set, four of each
static DEFAULT_INVENTORY: Lazy<Vec<PlateEntry>> = Lazy::new(|| {
    [45.0, 35.0, 25.0, 10.0, 5.0, 2.5]
        .into_iter()
        .map(|weight| PlateEntry { weight, count: 4 })
        .collect()
});

/// Get a reference to the cached default plate inventory
pub fn default_plate_inventory() -> &'static [PlateEntry] {
    &DEFAULT_INVENTORY
}

/// Plates to load on each side and the resulting total
#[derive(Clone, Debug, PartialEq)]
pub struct PlateSolution {
    /// Heaviest first
    pub plates_per_side: Vec<f64>,
    pub achieved_weight: f64,
}

impl PlateSolution {
    /// How far the loadout falls short of `target` (0 when exact)
    pub fn shortfall(&self, target: f64) -> f64 {
        (target - self.achieved_weight).max(0.0)
    }
}

/// Compute the per-side plates for a target weight
///
/// Never fails: an empty inventory or a target at or below the bar yields
/// the bar alone.
pub fn solve_plates(target_weight: f64, barbell_weight: f64, inventory: &[PlateEntry]) -> PlateSolution {
    let mut remaining = ((target_weight - barbell_weight) / 2.0).max(0.0);

    let mut working: Vec<PlateEntry> = inventory
        .iter()
        .filter(|p| p.weight > 0.0)
        .copied()
        .collect();
    working.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let mut plates_per_side = Vec::new();
    for plate in &mut working {
        while remaining >= plate.weight && plate.count >= 2 {
            plates_per_side.push(plate.weight);
            remaining -= plate.weight;
            plate.count -= 2;
        }
    }

    let achieved_weight = barbell_weight + 2.0 * plates_per_side.iter().sum::<f64>();

    tracing::debug!(
        "Plates for {} on {} bar: {:?} per side ({} achieved)",
        target_weight,
        barbell_weight,
        plates_per_side,
        achieved_weight
    );

    PlateSolution {
        plates_per_side,
        achieved_weight,
    }
}
