//! Typed delivery records.
//!
//! The store is schemaless. Documents are decoded once, at the transaction
//! boundary, into a [`DeliveryRecord`]; every field the state machine reads
//! has an explicit default here so the transition logic never has to guess.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::interfaces::Document;

/// Which delivery family a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lineage {
    /// Orders placed against a business, fulfilled by its drivers or servers.
    Merchant,
    /// Peer-to-peer parcel jobs with no owning business.
    Quick,
}

impl Lineage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lineage::Merchant => "merchant",
            Lineage::Quick => "quick",
        }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status across both lineages.
///
/// Each lineage only uses a subset; see [`crate::dispatch::lineage`].
/// Statuses written by other subsystems that dispatch does not know about
/// decode as `Unrecognized` and never satisfy a precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    DriverEnRoutePickup,
    OutForDelivery,
    InTransit,
    Delivered,
    #[serde(other)]
    Unrecognized,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Confirmed => "confirmed",
            DeliveryStatus::Preparing => "preparing",
            DeliveryStatus::Ready => "ready",
            DeliveryStatus::DriverEnRoutePickup => "driver_en_route_pickup",
            DeliveryStatus::OutForDelivery => "out_for_delivery",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the assigned transporter relates to the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransporterKind {
    Inhouse,
    Courier,
}

/// One-time codes and the moments they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub pickup_code: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub dropoff_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff_verified_at: Option<DateTime<Utc>>,
}

/// Audit trail of the delivery's progress.
///
/// `phase` is free-form: operators may correct `status` without touching it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where the transporter collects a merchant order, captured at claim time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupSnapshot {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Where a delivery record lives, tagged by lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Merchant { business_id: String },
    Quick,
}

impl Origin {
    pub fn lineage(&self) -> Lineage {
        match self {
            Origin::Merchant { .. } => Lineage::Merchant,
            Origin::Quick => Lineage::Quick,
        }
    }

    pub fn business_id(&self) -> Option<&str> {
        match self {
            Origin::Merchant { business_id } => Some(business_id),
            Origin::Quick => None,
        }
    }
}

/// The fields of a delivery document that dispatch reads or owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFields {
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub assigned_transporter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transporter_kind: Option<TransporterKind>,
    #[serde(default, rename = "deliveryVerification")]
    pub verification: Verification,
    #[serde(default, rename = "deliveryWorkflow")]
    pub workflow: Workflow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<PickupSnapshot>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A merchant order or quick-delivery job, as the state machine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    pub id: String,
    pub origin: Origin,
    pub fields: DeliveryFields,
}

impl DeliveryRecord {
    /// Decode a stored document.
    pub fn decode(
        id: impl Into<String>,
        origin: Origin,
        document: &Document,
    ) -> Result<Self, serde_json::Error> {
        let fields = DeliveryFields::deserialize(serde_json::Value::Object(document.clone()))?;
        Ok(Self {
            id: id.into(),
            origin,
            fields,
        })
    }

    pub fn lineage(&self) -> Lineage {
        self.origin.lineage()
    }

    pub fn status(&self) -> DeliveryStatus {
        self.fields.status
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.fields.assigned_transporter_id.as_deref()
    }
}

/// Schemaless writers sometimes store `""` where they mean "unset".
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
