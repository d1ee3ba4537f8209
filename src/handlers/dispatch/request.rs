//! Request body parsing and validation.

use serde::Deserialize;

use crate::dispatch::errmsg;
use crate::dispatch::{Action, DispatchError, Origin, StaffPolicy, TransitionRequest};

const SOURCE_RESTAURANT: &str = "restaurant";
const SOURCE_QUICK: &str = "quick";

/// Body of `POST /api/delivery/action`.
///
/// Every field is optional at the serde level so that a missing field maps
/// to its own message instead of a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    #[serde(default)]
    pub action: Option<String>,
    /// `restaurant` (default) or `quick`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub business_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl DispatchRequest {
    /// Validate and classify the request. No store access happens here.
    pub fn into_transition(self, policy: &StaffPolicy) -> Result<TransitionRequest, DispatchError> {
        let action = self
            .action
            .as_deref()
            .map(str::trim)
            .and_then(Action::parse)
            .ok_or(DispatchError::BadRequest(errmsg::INVALID_ACTION))?;

        let order_id = self
            .order_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(DispatchError::BadRequest(errmsg::MISSING_ORDER_ID))?;

        let source = self
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(SOURCE_RESTAURANT);

        let origin = match source {
            SOURCE_QUICK => Origin::Quick,
            SOURCE_RESTAURANT => {
                let business_id = self.business_id.as_deref().map(str::trim);
                if !policy.is_business_id(business_id) {
                    return Err(DispatchError::BadRequest(errmsg::MISSING_BUSINESS_ID));
                }
                Origin::Merchant {
                    business_id: business_id.unwrap_or_default().to_string(),
                }
            }
            _ => return Err(DispatchError::BadRequest(errmsg::INVALID_SOURCE)),
        };

        Ok(TransitionRequest {
            action,
            origin,
            order_id,
            verification_code: self.verification_code,
        })
    }
}
