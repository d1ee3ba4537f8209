//! Lineage descriptors.
//!
//! Both delivery families run the same accept/pickup/complete protocol.
//! What differs (status sequence, where records live, whether a pickup
//! location is snapshotted) is captured here so the state machine has one
//! implementation for both.

use crate::interfaces::DocumentKey;

use super::model::{DeliveryStatus, Lineage, Origin};

/// Collection holding quick-delivery jobs.
pub const QUICK_DELIVERIES_COLLECTION: &str = "quickDeliveries";

/// Static description of one lineage's lifecycle.
#[derive(Debug)]
pub struct LineageDescriptor {
    pub lineage: Lineage,
    /// Statuses from which a delivery may be claimed.
    pub pre_claim: &'static [DeliveryStatus],
    /// Status a successful `accept` moves to.
    pub claimed: DeliveryStatus,
    /// Statuses from which `pickup` is permitted.
    pub awaiting_pickup: &'static [DeliveryStatus],
    /// Status a successful `pickup` moves to.
    pub in_transit: DeliveryStatus,
    /// Statuses from which `complete` is permitted.
    pub completable: &'static [DeliveryStatus],
    /// Whether `accept` records a pickup location snapshot.
    pub snapshots_pickup: bool,
    /// Noun used in caller-visible messages.
    pub noun: &'static str,
}

pub static MERCHANT: LineageDescriptor = LineageDescriptor {
    lineage: Lineage::Merchant,
    pre_claim: &[
        DeliveryStatus::Pending,
        DeliveryStatus::Confirmed,
        DeliveryStatus::Preparing,
        DeliveryStatus::Ready,
    ],
    claimed: DeliveryStatus::DriverEnRoutePickup,
    awaiting_pickup: &[DeliveryStatus::DriverEnRoutePickup],
    in_transit: DeliveryStatus::OutForDelivery,
    completable: &[DeliveryStatus::OutForDelivery],
    snapshots_pickup: true,
    noun: "Order",
};

// Quick jobs are "in transit" from the moment they are claimed; pickup only
// records verification and may be repeated.
pub static QUICK: LineageDescriptor = LineageDescriptor {
    lineage: Lineage::Quick,
    pre_claim: &[DeliveryStatus::Pending, DeliveryStatus::Ready],
    claimed: DeliveryStatus::InTransit,
    awaiting_pickup: &[DeliveryStatus::InTransit],
    in_transit: DeliveryStatus::InTransit,
    completable: &[DeliveryStatus::InTransit],
    snapshots_pickup: false,
    noun: "Delivery",
};

impl LineageDescriptor {
    pub fn of(lineage: Lineage) -> &'static LineageDescriptor {
        match lineage {
            Lineage::Merchant => &MERCHANT,
            Lineage::Quick => &QUICK,
        }
    }

    pub fn is_pre_claim(&self, status: DeliveryStatus) -> bool {
        self.pre_claim.contains(&status)
    }

    pub fn is_awaiting_pickup(&self, status: DeliveryStatus) -> bool {
        self.awaiting_pickup.contains(&status)
    }

    pub fn is_completable(&self, status: DeliveryStatus) -> bool {
        self.completable.contains(&status)
    }

    /// Store address of a delivery record.
    pub fn document_key(origin: &Origin, order_id: &str) -> DocumentKey {
        match origin {
            Origin::Merchant { business_id } => {
                DocumentKey::new(format!("businesses/{}/orders", business_id), order_id)
            }
            Origin::Quick => DocumentKey::new(QUICK_DELIVERIES_COLLECTION, order_id),
        }
    }
}
