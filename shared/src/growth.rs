//! Growth rules and stage derivation
//!
//! Each seed type has day thresholds for reaching Young, Mature and Ready.
//! Derivation is a pure function of the seed type and the number of whole
//! days since the sowing date, so plant-time stage computation and any later
//! re-evaluation agree.

use chrono::NaiveDate;

use crate::models::{GrowthStage, SeedType};

/// Day thresholds at which a crop enters each stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedGrowthRule {
    pub young: u32,
    pub mature: u32,
    pub ready: u32,
}

static WHEAT: SeedGrowthRule = SeedGrowthRule { young: 30, mature: 70, ready: 110 };
static CORN: SeedGrowthRule = SeedGrowthRule { young: 25, mature: 60, ready: 100 };
static BARLEY: SeedGrowthRule = SeedGrowthRule { young: 28, mature: 65, ready: 95 };
static PUMPKIN: SeedGrowthRule = SeedGrowthRule { young: 20, mature: 55, ready: 90 };
static BLACK_GRAPES: SeedGrowthRule = SeedGrowthRule { young: 40, mature: 100, ready: 150 };
static WHITE_GRAPES: SeedGrowthRule = SeedGrowthRule { young: 40, mature: 95, ready: 145 };

/// Look up the growth rule for a seed type
pub fn growth_rule(seed: SeedType) -> Option<&'static SeedGrowthRule> {
    Some(match seed {
        SeedType::Wheat => &WHEAT,
        SeedType::Corn => &CORN,
        SeedType::Barley => &BARLEY,
        SeedType::Pumpkin => &PUMPKIN,
        SeedType::BlackGrapes => &BLACK_GRAPES,
        SeedType::WhiteGrapes => &WHITE_GRAPES,
    })
}

/// Derive the stage for a number of whole days since sowing
pub fn derive_stage(rule: &SeedGrowthRule, days_elapsed: i64) -> GrowthStage {
    if days_elapsed >= rule.ready as i64 {
        GrowthStage::Ready
    } else if days_elapsed >= rule.mature as i64 {
        GrowthStage::Mature
    } else if days_elapsed >= rule.young as i64 {
        GrowthStage::Young
    } else {
        GrowthStage::Seedling
    }
}

/// Derive the stage for a seed type; seeds without a rule stay Seedling
pub fn derive_stage_for(seed: SeedType, days_elapsed: i64) -> GrowthStage {
    match growth_rule(seed) {
        Some(rule) => derive_stage(rule, days_elapsed),
        None => GrowthStage::Seedling,
    }
}

/// Whole days between the sowing date and today
pub fn days_since_planting(planted: NaiveDate, today: NaiveDate) -> i64 {
    (today - planted).num_days()
}
