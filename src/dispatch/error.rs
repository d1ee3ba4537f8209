//! Dispatch failure taxonomy.
//!
//! - [`Denial`]: the caller may not act as a transporter here (403).
//! - [`Rejection`]: the delivery's state forbids the action (400). Raised
//!   inside the store transaction, which aborts with no write.
//! - [`DispatchError`]: everything the handler can see, including request
//!   validation and storage faults.

use http::StatusCode;

use crate::interfaces::{StorageError, TransactionError};

use super::errmsg;
use super::model::DeliveryStatus;

/// Which verification checkpoint a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Pickup,
    Dropoff,
}

impl Checkpoint {
    fn missing_code_message(&self) -> &'static str {
        match self {
            Checkpoint::Pickup => errmsg::PICKUP_CODE_REQUIRED,
            Checkpoint::Dropoff => errmsg::DROPOFF_CODE_REQUIRED,
        }
    }

    fn invalid_code_message(&self) -> &'static str {
        match self {
            Checkpoint::Pickup => errmsg::INVALID_PICKUP_CODE,
            Checkpoint::Dropoff => errmsg::INVALID_DROPOFF_CODE,
        }
    }
}

/// Role-level authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("{}", errmsg::NOT_A_TRANSPORTER)]
    NotTransporter { role: Option<String> },

    #[error("{}", errmsg::STAFF_QUICK_DELIVERY)]
    StaffQuickDelivery,

    #[error("{}", errmsg::STAFF_BUSINESS_REQUIRED)]
    StaffBusinessRequired,

    #[error("{}", errmsg::STAFF_NOT_SERVER)]
    StaffNotServer { staff_role: Option<String> },

    #[error("{}", errmsg::DRIVER_NOT_APPROVED)]
    DriverNotApproved { business_id: String },
}

/// State-level failures detected inside the transaction body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("{noun} {tail}", tail = errmsg::NOT_FOUND)]
    NotFound { noun: &'static str },

    #[error("{noun} {tail}", tail = errmsg::NOT_READY)]
    NotClaimable {
        noun: &'static str,
        status: DeliveryStatus,
    },

    #[error("{}", errmsg::ALREADY_CLAIMED)]
    AlreadyClaimed,

    #[error("{}", errmsg::NOT_ASSIGNED)]
    NotAssigned,

    #[error("{noun} {tail}", tail = errmsg::NOT_AWAITING_PICKUP)]
    NotAwaitingPickup {
        noun: &'static str,
        status: DeliveryStatus,
    },

    #[error("{noun} {tail}", tail = errmsg::NOT_IN_TRANSIT)]
    NotInTransit {
        noun: &'static str,
        status: DeliveryStatus,
    },

    #[error("{}", .0.missing_code_message())]
    CodeRequired(Checkpoint),

    #[error("{}", .0.invalid_code_message())]
    InvalidCode(Checkpoint),

    /// The stored document could not be decoded.
    #[error("unreadable delivery record: {0}")]
    Unreadable(String),
}

/// Errors surfaced by the dispatch service.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{}", errmsg::UNAUTHENTICATED)]
    Unauthenticated,

    #[error(transparent)]
    Forbidden(#[from] Denial),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DispatchError {
    /// HTTP status for this error.
    ///
    /// - BadRequest, Rejected: 400
    /// - Unauthenticated: 401
    /// - Forbidden: 403
    /// - Storage, unreadable records: 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Rejected(Rejection::Unreadable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Rejected(Rejection::Unreadable(_)) | Self::Storage(_) => {
                errmsg::INTERNAL_ERROR.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<TransactionError> for DispatchError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Aborted(rejection) => Self::Rejected(rejection),
            TransactionError::Storage(storage) => Self::Storage(storage),
        }
    }
}
