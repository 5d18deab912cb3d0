//! Validation utilities for the Smart Farm client
//!
//! Date validation works on the raw strings a host UI hands over, so parsing
//! failures surface with the same titled shape as range violations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{FarmCreate, SeedType};

/// Oldest sowing date accepted, counted back from today
pub const SOWING_DATE_MAX_AGE_DAYS: i64 = 365;

/// A titled validation failure, suitable for direct display
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: {message}")]
pub struct ValidationFailure {
    pub title: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Date Validations
// ============================================================================

/// Parse a date in ISO `YYYY-MM-DD` form
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationFailure> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationFailure::new(
            "Invalid Date",
            format!("'{}' is not a valid date (expected YYYY-MM-DD)", raw.trim()),
        )
    })
}

/// Validate a sowing date: not empty, not in the future, at most one year old
pub fn validate_sowing_date(
    raw: &str,
    today: NaiveDate,
) -> Result<NaiveDate, ValidationFailure> {
    if raw.trim().is_empty() {
        return Err(ValidationFailure::new(
            "Missing Date",
            "A sowing date is required",
        ));
    }
    let date = parse_date(raw)?;
    if date > today {
        return Err(ValidationFailure::new(
            "Future Date",
            "The sowing date cannot be in the future",
        ));
    }
    if (today - date).num_days() > SOWING_DATE_MAX_AGE_DAYS {
        return Err(ValidationFailure::new(
            "Date Too Old",
            "The sowing date cannot be more than one year in the past",
        ));
    }
    Ok(date)
}

/// Validate a harvest date against the crop's sowing date
pub fn validate_harvest_date(
    raw: &str,
    planted: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, ValidationFailure> {
    if raw.trim().is_empty() {
        return Err(ValidationFailure::new(
            "Missing Date",
            "A harvest date is required",
        ));
    }
    let date = parse_date(raw)?;
    if date < planted {
        return Err(ValidationFailure::new(
            "Before Planting",
            "The harvest date cannot be before the sowing date",
        ));
    }
    if date == planted {
        return Err(ValidationFailure::new(
            "Too Soon",
            "A crop cannot be harvested on its sowing day",
        ));
    }
    if date > today {
        return Err(ValidationFailure::new(
            "Future Date",
            "The harvest date cannot be in the future",
        ));
    }
    Ok(date)
}

// ============================================================================
// Planting and Farm Validations
// ============================================================================

/// Validate that a seed was actually chosen
pub fn validate_seed_choice(
    seed: Option<SeedType>,
) -> Result<SeedType, ValidationFailure> {
    seed.ok_or_else(|| ValidationFailure::new("Missing Seed", "Please select a seed type"))
}

/// Validate a farm creation payload: name present, location plausible
pub fn validate_farm_create(farm: &FarmCreate) -> Result<(), ValidationFailure> {
    if farm.name.trim().is_empty() {
        return Err(ValidationFailure::new(
            "Missing Name",
            "The farm needs a name",
        ));
    }
    if farm.latitude == 0.0 && farm.longitude == 0.0 {
        return Err(ValidationFailure::new(
            "Missing Location",
            "Pick the farm location on the map",
        ));
    }
    if !(-90.0..=90.0).contains(&farm.latitude)
        || !(-180.0..=180.0).contains(&farm.longitude)
    {
        return Err(ValidationFailure::new(
            "Location Out Of Bounds",
            "The farm location is outside valid coordinates",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::types::SoilType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn iso(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    // ========================================================================
    // Sowing Date Tests
    // ========================================================================

    #[test]
    fn test_validate_sowing_date_valid() {
        assert_eq!(validate_sowing_date("2025-06-15", today()).unwrap(), today());
        let oldest = today() - Duration::days(365);
        assert_eq!(validate_sowing_date(&iso(oldest), today()).unwrap(), oldest);
    }

    #[test]
    fn test_validate_sowing_date_too_old() {
        let too_old = today() - Duration::days(366);
        let err = validate_sowing_date(&iso(too_old), today()).unwrap_err();
        assert_eq!(err.title, "Date Too Old");
    }

    #[test]
    fn test_validate_sowing_date_future() {
        let tomorrow = today() + Duration::days(1);
        let err = validate_sowing_date(&iso(tomorrow), today()).unwrap_err();
        assert_eq!(err.title, "Future Date");
    }

    #[test]
    fn test_validate_sowing_date_missing_or_garbage() {
        assert_eq!(
            validate_sowing_date("", today()).unwrap_err().title,
            "Missing Date"
        );
        assert_eq!(
            validate_sowing_date("   ", today()).unwrap_err().title,
            "Missing Date"
        );
        assert_eq!(
            validate_sowing_date("15/06/2025", today()).unwrap_err().title,
            "Invalid Date"
        );
    }

    // ========================================================================
    // Harvest Date Tests
    // ========================================================================

    #[test]
    fn test_validate_harvest_date_valid() {
        let planted = today() - Duration::days(10);
        let date = validate_harvest_date(&iso(today()), planted, today()).unwrap();
        assert_eq!(date, today());
        // the day after sowing is the earliest acceptable harvest
        let next_day = planted + Duration::days(1);
        assert!(validate_harvest_date(&iso(next_day), planted, today()).is_ok());
    }

    #[test]
    fn test_validate_harvest_date_same_day_rejected() {
        let planted = today() - Duration::days(10);
        let err = validate_harvest_date(&iso(planted), planted, today()).unwrap_err();
        assert_eq!(err.title, "Too Soon");
    }

    #[test]
    fn test_validate_harvest_date_before_planting() {
        let planted = today() - Duration::days(10);
        let before = planted - Duration::days(1);
        let err = validate_harvest_date(&iso(before), planted, today()).unwrap_err();
        assert_eq!(err.title, "Before Planting");
    }

    #[test]
    fn test_validate_harvest_date_future() {
        let planted = today() - Duration::days(10);
        let tomorrow = today() + Duration::days(1);
        let err = validate_harvest_date(&iso(tomorrow), planted, today()).unwrap_err();
        assert_eq!(err.title, "Future Date");
    }

    // ========================================================================
    // Seed and Farm Tests
    // ========================================================================

    #[test]
    fn test_validate_seed_choice() {
        assert_eq!(
            validate_seed_choice(Some(SeedType::Corn)).unwrap(),
            SeedType::Corn
        );
        assert_eq!(
            validate_seed_choice(None).unwrap_err().title,
            "Missing Seed"
        );
    }

    fn farm_create() -> FarmCreate {
        FarmCreate {
            name: "South Field".into(),
            latitude: 46.9,
            longitude: 7.4,
            soil_type: SoilType::Clay,
            email: "farmer@example.com".into(),
        }
    }

    #[test]
    fn test_validate_farm_create_valid() {
        assert!(validate_farm_create(&farm_create()).is_ok());
    }

    #[test]
    fn test_validate_farm_create_invalid() {
        let mut unnamed = farm_create();
        unnamed.name = "  ".into();
        assert_eq!(
            validate_farm_create(&unnamed).unwrap_err().title,
            "Missing Name"
        );

        let mut unplaced = farm_create();
        unplaced.latitude = 0.0;
        unplaced.longitude = 0.0;
        assert_eq!(
            validate_farm_create(&unplaced).unwrap_err().title,
            "Missing Location"
        );

        let mut off_map = farm_create();
        off_map.latitude = 95.0;
        assert_eq!(
            validate_farm_create(&off_map).unwrap_err().title,
            "Location Out Of Bounds"
        );
    }
}
