//! Order tracking view.
//!
//! Orders carry a single status string that never changes after checkout, so
//! the timeline is synthesised: the first three steps always show as done and
//! only "delivered" versus anything else moves the last two.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::sync::OrderRecord;
use crate::models::OrderItem;

pub const DELIVERY_ESTIMATE_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStage {
    Confirmed,
    Packed,
    Shipped,
    InTransit,
    Delivered,
}

impl TrackingStage {
    pub const ALL: [TrackingStage; 5] = [
        TrackingStage::Confirmed,
        TrackingStage::Packed,
        TrackingStage::Shipped,
        TrackingStage::InTransit,
        TrackingStage::Delivered,
    ];

    pub fn title(self) -> &'static str {
        match self {
            TrackingStage::Confirmed => "Order Confirmed",
            TrackingStage::Packed => "Order Packed",
            TrackingStage::Shipped => "Shipped",
            TrackingStage::InTransit => "In Transit",
            TrackingStage::Delivered => "Delivered",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TrackingStage::Confirmed => "We received your order",
            TrackingStage::Packed => "Items are packed securely",
            TrackingStage::Shipped => "Handed to the carrier",
            TrackingStage::InTransit => "On the way to your city",
            TrackingStage::Delivered => "Package delivered successfully",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingStep {
    pub stage: TrackingStage,
    pub title: &'static str,
    pub description: &'static str,
    pub completed: bool,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingView {
    pub order_id: String,
    pub status: String,
    pub estimated_delivery: NaiveDate,
    pub steps: Vec<TrackingStep>,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
}

pub fn is_delivered(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("delivered")
}

pub fn timeline(status: &str) -> Vec<TrackingStep> {
    let delivered = is_delivered(status);
    TrackingStage::ALL
        .into_iter()
        .map(|stage| {
            let (completed, current) = match stage {
                TrackingStage::Confirmed | TrackingStage::Packed | TrackingStage::Shipped => {
                    (true, false)
                }
                TrackingStage::InTransit => (!delivered, !delivered),
                TrackingStage::Delivered => (delivered, false),
            };
            TrackingStep {
                stage,
                title: stage.title(),
                description: stage.description(),
                completed,
                current,
            }
        })
        .collect()
}

pub fn estimated_delivery(created_at: DateTime<Utc>) -> NaiveDate {
    (created_at + Duration::days(DELIVERY_ESTIMATE_DAYS)).date_naive()
}

impl From<&OrderRecord> for TrackingView {
    fn from(order: &OrderRecord) -> Self {
        TrackingView {
            order_id: order.id.clone(),
            status: order.status.clone(),
            estimated_delivery: estimated_delivery(order.created_at),
            steps: timeline(&order.status),
            items: order.items.clone(),
            total_amount: order.total_amount,
        }
    }
}
