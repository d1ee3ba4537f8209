//! Caller-visible messages.
//!
//! The driver app shows these verbatim, so each rejected precondition has
//! its own message. Infrastructure details never appear here.

pub const MISSING_ORDER_ID: &str = "orderId is required.";
pub const MISSING_BUSINESS_ID: &str = "businessId is required for restaurant deliveries.";
pub const INVALID_ACTION: &str = "Invalid action.";
pub const INVALID_SOURCE: &str = "Invalid delivery source.";
pub const INVALID_BODY: &str = "Invalid request body.";
pub const UNAUTHENTICATED: &str = "Authentication required.";

pub const NOT_A_TRANSPORTER: &str = "Only drivers can perform delivery actions.";
pub const STAFF_QUICK_DELIVERY: &str = "Staff drivers cannot handle quick deliveries.";
pub const STAFF_BUSINESS_REQUIRED: &str = "Staff drivers must act on a specific business.";
pub const STAFF_NOT_SERVER: &str = "Only servers can act as in-house drivers.";
pub const DRIVER_NOT_APPROVED: &str = "You are not an approved driver for this business.";

pub const ALREADY_CLAIMED: &str = "This delivery has already been accepted by another driver.";
pub const NOT_ASSIGNED: &str = "You are not assigned to this delivery.";
pub const NOT_READY: &str = "is not available to accept.";
pub const NOT_AWAITING_PICKUP: &str = "is not awaiting pickup.";
pub const NOT_IN_TRANSIT: &str = "is not out for delivery.";
pub const NOT_FOUND: &str = "not found.";
pub const PICKUP_CODE_REQUIRED: &str = "Pickup verification code is required.";
pub const INVALID_PICKUP_CODE: &str = "Invalid pickup verification code.";
pub const DROPOFF_CODE_REQUIRED: &str = "Drop-off verification code is required.";
pub const INVALID_DROPOFF_CODE: &str = "Invalid drop-off verification code.";

/// Sanitized message for storage faults and unreadable records.
pub const INTERNAL_ERROR: &str = "Internal service error";
