//! # Tracking
//!
//! Builds the buyer-facing tracking report from an order and its shipment.
//!
//! ## Timeline
//! ```text
//! OrderPlaced ─► PaymentConfirmed ─► Processing ─► Shipped ─► Delivered
//!  created_at      created_at         shipped_at    shipped_at  delivered_at
//! ```
//! Placed and payment are complete the moment the order exists, because
//! both are written in the purchase unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::delivery::expected_delivery;
use crate::order::OrderStatus;
use crate::types::ShipmentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStage {
    OrderPlaced,
    PaymentConfirmed,
    Processing,
    Shipped,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Milestone {
    pub stage: MilestoneStage,
    pub completed: bool,
    #[ts(as = "Option<String>")]
    pub at: Option<DateTime<Utc>>,
}

impl Milestone {
    fn new(stage: MilestoneStage, at: Option<DateTime<Utc>>) -> Self {
        Milestone {
            stage,
            completed: at.is_some(),
            at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrackingReport {
    pub order_id: i64,
    pub status: OrderStatus,
    pub courier_service: Option<String>,
    pub tracking_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub expected_delivery: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub timeline: Vec<Milestone>,
}

impl TrackingReport {
    /// Assembles the report. Pure; the ETA comes from the courier table.
    pub fn build(
        order_id: i64,
        status: OrderStatus,
        ordered_at: DateTime<Utc>,
        delivered_at: Option<DateTime<Utc>>,
        shipment: Option<&ShipmentRecord>,
    ) -> Self {
        let shipped_at = shipment.map(|s| s.shipped_at);
        let delivered_at = if status == OrderStatus::Delivered {
            delivered_at
        } else {
            None
        };

        let timeline = vec![
            Milestone::new(MilestoneStage::OrderPlaced, Some(ordered_at)),
            Milestone::new(MilestoneStage::PaymentConfirmed, Some(ordered_at)),
            Milestone::new(MilestoneStage::Processing, shipped_at),
            Milestone::new(MilestoneStage::Shipped, shipped_at),
            Milestone {
                stage: MilestoneStage::Delivered,
                completed: status == OrderStatus::Delivered,
                at: delivered_at,
            },
        ];

        TrackingReport {
            order_id,
            status,
            courier_service: shipment.map(|s| s.courier.as_str().to_string()),
            tracking_number: shipment.and_then(|s| s.tracking_number.clone()),
            shipped_at,
            expected_delivery: shipment
                .map(|s| expected_delivery(s.courier.as_str(), s.shipped_at)),
            delivered_at,
            timeline,
        }
    }

    /// The last completed milestone.
    pub fn current_stage(&self) -> Option<MilestoneStage> {
        self.timeline
            .iter()
            .rev()
            .find(|m| m.completed)
            .map(|m| m.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::Courier;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_pending_order_has_no_shipment_fields() {
        let report = TrackingReport::build(1, OrderStatus::PendingShipment, at(8), None, None);
        assert_eq!(report.expected_delivery, None);
        assert_eq!(report.courier_service, None);
        assert_eq!(report.current_stage(), Some(MilestoneStage::PaymentConfirmed));
        assert_eq!(report.timeline.len(), 5);
    }

    #[test]
    fn test_shipped_order_projects_eta() {
        let shipment = ShipmentRecord {
            order_id: 1,
            courier: Courier::RoyalBengalIlishMachLogistics,
            shipped_at: at(10),
            tracking_number: Some("RB-77".to_string()),
        };
        let report = TrackingReport::build(1, OrderStatus::Shipped, at(8), None, Some(&shipment));

        assert_eq!(report.shipped_at, Some(at(10)));
        assert_eq!(report.expected_delivery, Some(at(15)));
        assert_eq!(report.tracking_number.as_deref(), Some("RB-77"));
        assert_eq!(report.current_stage(), Some(MilestoneStage::Shipped));
        assert!(!report.timeline[4].completed);
    }

    #[test]
    fn test_delivered_order_completes_timeline() {
        let shipment = ShipmentRecord {
            order_id: 1,
            courier: Courier::Uthao,
            shipped_at: at(10),
            tracking_number: None,
        };
        let report = TrackingReport::build(
            1,
            OrderStatus::Delivered,
            at(8),
            Some(at(11)),
            Some(&shipment),
        );

        assert!(report.timeline.iter().all(|m| m.completed));
        assert_eq!(report.delivered_at, Some(at(11)));
        assert_eq!(report.expected_delivery, Some(at(12)));
    }
}
