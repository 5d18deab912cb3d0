//! WebAssembly module for the Smart Farm client
//!
//! Provides browser-side computation for:
//! - Growth stage derivation
//! - Sowing and harvest date validation
//! - Seed display formatting

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

fn parse_iso_date(raw: &str) -> Result<chrono::NaiveDate, JsValue> {
    shared::parse_date(raw).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_seed(code: &str) -> Result<SeedType, JsValue> {
    code.parse::<SeedType>()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&"smart-farm wasm module loaded".into());
}

/// Derive the growth stage for a seed planted a number of days ago
#[wasm_bindgen]
pub fn derive_growth_stage(seed_code: &str, days_elapsed: u32) -> Result<String, JsValue> {
    let seed = parse_seed(seed_code)?;
    let stage = shared::derive_stage_for(seed, days_elapsed as i64);
    Ok(format!("{:?}", stage).to_lowercase())
}

/// Whole days between a sowing date and today, both ISO dates
#[wasm_bindgen]
pub fn elapsed_days(planted: &str, today: &str) -> Result<i32, JsValue> {
    let planted = parse_iso_date(planted)?;
    let today = parse_iso_date(today)?;
    Ok(shared::days_since_planting(planted, today) as i32)
}

/// Check a sowing date; returns the failure message or null when valid
#[wasm_bindgen]
pub fn check_sowing_date(raw: &str, today: &str) -> Result<Option<String>, JsValue> {
    let today = parse_iso_date(today)?;
    Ok(shared::validate_sowing_date(raw, today)
        .err()
        .map(|e| e.to_string()))
}

/// Check a harvest date against the sowing date; returns the failure
/// message or null when valid
#[wasm_bindgen]
pub fn check_harvest_date(
    raw: &str,
    planted: &str,
    today: &str,
) -> Result<Option<String>, JsValue> {
    let planted = parse_iso_date(planted)?;
    let today = parse_iso_date(today)?;
    Ok(shared::validate_harvest_date(raw, planted, today)
        .err()
        .map(|e| e.to_string()))
}

/// Parse a field's wire JSON and return its status label; the empty/occupied
/// invariant is enforced while parsing
#[wasm_bindgen]
pub fn field_status_label(field_json: &str) -> Result<String, JsValue> {
    let field: Field = serde_json::from_str(field_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid field JSON: {}", e)))?;
    Ok(match field.status() {
        FieldStatus::Empty => "empty".to_string(),
        FieldStatus::Planted => "planted".to_string(),
        FieldStatus::Growing => "growing".to_string(),
        FieldStatus::Ready => "ready".to_string(),
    })
}

/// Human readable name for a seed code, e.g. BLACK_GRAPES -> "Black Grapes"
#[wasm_bindgen]
pub fn seed_display_name(seed_code: &str) -> Result<String, JsValue> {
    Ok(parse_seed(seed_code)?.display_name().to_string())
}
