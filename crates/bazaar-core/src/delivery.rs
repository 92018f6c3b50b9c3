//! # Delivery
//!
//! The courier allow-list and the delivery ETA calculator.
//!
//! ## Courier Table
//! ```text
//! ┌──────────────────────────────────────┬──────────────┐
//! │ Courier (exact, case-sensitive)      │ Transit days │
//! ├──────────────────────────────────────┼──────────────┤
//! │ Uthao                                │      2       │
//! │ Fatao Courier Services               │      3       │
//! │ Royal Bengal Ilish Mach Logistics    │      5       │
//! │ Abul and Co                          │      4       │
//! │ (anything else)                      │      3       │
//! └──────────────────────────────────────┴──────────────┘
//! ```
//!
//! Shipping only accepts allow-listed couriers; the calculator itself never
//! fails and falls back to [`DEFAULT_TRANSIT_DAYS`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::DEFAULT_TRANSIT_DAYS;

/// A courier on the fixed allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Courier {
    #[serde(rename = "Uthao")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Uthao"))]
    Uthao,

    #[serde(rename = "Fatao Courier Services")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Fatao Courier Services"))]
    FataoCourierServices,

    #[serde(rename = "Royal Bengal Ilish Mach Logistics")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Royal Bengal Ilish Mach Logistics"))]
    RoyalBengalIlishMachLogistics,

    #[serde(rename = "Abul and Co")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Abul and Co"))]
    AbulAndCo,
}

impl Courier {
    /// Every allow-listed courier, in display order.
    pub const ALL: [Courier; 4] = [
        Courier::Uthao,
        Courier::FataoCourierServices,
        Courier::RoyalBengalIlishMachLogistics,
        Courier::AbulAndCo,
    ];

    /// The exact identifier used on the wire and in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Courier::Uthao => "Uthao",
            Courier::FataoCourierServices => "Fatao Courier Services",
            Courier::RoyalBengalIlishMachLogistics => "Royal Bengal Ilish Mach Logistics",
            Courier::AbulAndCo => "Abul and Co",
        }
    }

    /// Days between hand-over and expected delivery.
    pub const fn transit_days(self) -> i64 {
        match self {
            Courier::Uthao => 2,
            Courier::FataoCourierServices => 3,
            Courier::RoyalBengalIlishMachLogistics => 5,
            Courier::AbulAndCo => 4,
        }
    }

    /// The allow-list as owned strings, for error messages.
    pub fn allowed_names() -> Vec<String> {
        Courier::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl fmt::Display for Courier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Courier {
    type Err = ValidationError;

    /// Exact, case-sensitive match against the allow-list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Courier::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "courier_service".to_string(),
                allowed: Courier::allowed_names(),
            })
    }
}

/// Transit days for any courier identifier, falling back to the default.
pub fn transit_days(courier: &str) -> i64 {
    courier
        .parse::<Courier>()
        .map(Courier::transit_days)
        .unwrap_or(DEFAULT_TRANSIT_DAYS)
}

/// Projects the delivery date of a shipment.
///
/// Pure and total: unknown couriers get [`DEFAULT_TRANSIT_DAYS`].
pub fn expected_delivery(courier: &str, shipped_at: DateTime<Utc>) -> DateTime<Utc> {
    shipped_at + Duration::days(transit_days(courier))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_royal_bengal_takes_five_days() {
        assert_eq!(
            expected_delivery("Royal Bengal Ilish Mach Logistics", jan(10)),
            jan(15)
        );
    }

    #[test]
    fn test_unknown_courier_uses_default() {
        assert_eq!(expected_delivery("Pathao", jan(10)), jan(13));
        assert_eq!(transit_days(""), DEFAULT_TRANSIT_DAYS);
    }

    #[test]
    fn test_offsets_table() {
        assert_eq!(transit_days("Uthao"), 2);
        assert_eq!(transit_days("Fatao Courier Services"), 3);
        assert_eq!(transit_days("Royal Bengal Ilish Mach Logistics"), 5);
        assert_eq!(transit_days("Abul and Co"), 4);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!("Uthao".parse::<Courier>().unwrap(), Courier::Uthao);
        assert!("uthao".parse::<Courier>().is_err());
        assert!("Abul and Co ".parse::<Courier>().is_err());
        assert_eq!(transit_days("abul and co"), DEFAULT_TRANSIT_DAYS);
    }

    #[test]
    fn test_round_trip_through_name() {
        for courier in Courier::ALL {
            assert_eq!(courier.as_str().parse::<Courier>().unwrap(), courier);
        }
    }

    #[test]
    fn test_serde_uses_exact_names() {
        let json = serde_json::to_string(&Courier::AbulAndCo).unwrap();
        assert_eq!(json, "\"Abul and Co\"");
        let courier: Courier = serde_json::from_str("\"Fatao Courier Services\"").unwrap();
        assert_eq!(courier, Courier::FataoCourierServices);
    }
}
