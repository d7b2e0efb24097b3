//! Caller identity forwarded by the upstream authentication gateway.
//!
//! Handlers receive a [`Caller`] built from the `x-resident-id` and `x-resident-role` headers.
//! Credential checks happen before requests reach this service.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::residents::{ResidentId, ResidentRole};

pub const RESIDENT_ID_HEADER: &str = "x-resident-id";
pub const RESIDENT_ROLE_HEADER: &str = "x-resident-role";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub resident_id: ResidentId,
    pub role: ResidentRole,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, IdentityRejection> {
        let resident_id = headers
            .get(RESIDENT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(IdentityRejection::MissingIdentity)?;

        let role = match headers
            .get(RESIDENT_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            None => ResidentRole::Resident,
            Some(raw) => ResidentRole::parse(raw).ok_or(IdentityRejection::UnknownRole)?,
        };

        Ok(Self {
            resident_id: ResidentId(resident_id.to_string()),
            role,
        })
    }

    pub fn is_officer(&self) -> bool {
        self.role == ResidentRole::Officer
    }

    pub fn require_officer(&self) -> Result<(), IdentityRejection> {
        if self.is_officer() {
            Ok(())
        } else {
            Err(IdentityRejection::OfficerOnly)
        }
    }

    /// Residents may only touch their own records; officers may touch any.
    pub fn require_access_to(&self, resident_id: &ResidentId) -> Result<(), IdentityRejection> {
        if self.is_officer() || &self.resident_id == resident_id {
            Ok(())
        } else {
            Err(IdentityRejection::NotOwner)
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityRejection {
    #[error("missing x-resident-id header")]
    MissingIdentity,
    #[error("x-resident-role must be 'resident' or 'officer'")]
    UnknownRole,
    #[error("this action is restricted to officers")]
    OfficerOnly,
    #[error("residents may only access their own records")]
    NotOwner,
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        let status = match self {
            IdentityRejection::MissingIdentity | IdentityRejection::UnknownRole => {
                StatusCode::UNAUTHORIZED
            }
            IdentityRejection::OfficerOnly | IdentityRejection::NotOwner => StatusCode::FORBIDDEN,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
