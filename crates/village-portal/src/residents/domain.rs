use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered residents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidentId(pub String);

impl fmt::Display for ResidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidentRole {
    #[default]
    Resident,
    Officer,
}

impl ResidentRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "resident" => Some(Self::Resident),
            "officer" | "admin" => Some(Self::Officer),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Officer => "officer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    pub relationship: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub occupation: Option<String>,
}

/// Officer assessment printed on character certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConductRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ConductRating {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductAssessment {
    pub rating: ConductRating,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentProfile {
    pub full_name: String,
    pub nic: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub family_members: Vec<FamilyMember>,
    #[serde(default)]
    pub conduct: Option<ConductAssessment>,
}

/// Payload accepted when an officer registers a resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentRegistration {
    pub profile: ResidentProfile,
    #[serde(default)]
    pub role: ResidentRole,
}

/// Partial profile update; absent fields are left untouched. The NIC cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub family_members: Option<Vec<FamilyMember>>,
    #[serde(default)]
    pub conduct: Option<ConductAssessment>,
}

impl ProfileUpdate {
    pub fn apply_to(self, profile: &mut ResidentProfile) {
        if let Some(full_name) = self.full_name {
            profile.full_name = full_name;
        }
        if let Some(address) = self.address {
            profile.address = address;
        }
        if let Some(phone) = self.phone {
            profile.phone = Some(phone);
        }
        if let Some(email) = self.email {
            profile.email = Some(email);
        }
        if let Some(occupation) = self.occupation {
            profile.occupation = Some(occupation);
        }
        if let Some(contact) = self.emergency_contact {
            profile.emergency_contact = Some(contact);
        }
        if let Some(members) = self.family_members {
            profile.family_members = members;
        }
        if let Some(conduct) = self.conduct {
            profile.conduct = Some(conduct);
        }
    }
}

/// Certificate workflow fields persisted on the resident record.
///
/// `request_date` drives the reapply cooldown and is cleared on cancel. `requested_at` marks the
/// latest resident-initiated event (request or cancel) and drives the display freshness window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFields {
    pub requested: bool,
    pub approved: Option<bool>,
    pub request_date: Option<DateTime<Utc>>,
    pub requested_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Stored resident document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentRecord {
    pub id: ResidentId,
    pub profile: ResidentProfile,
    pub role: ResidentRole,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub certificate: CertificateFields,
}

impl ResidentRecord {
    pub fn summary(&self) -> ResidentSummary {
        ResidentSummary {
            id: self.id.clone(),
            full_name: self.profile.full_name.clone(),
            nic: self.profile.nic.clone(),
            role: self.role,
            registered_at: self.registered_at,
        }
    }
}

/// Listing row for officer dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidentSummary {
    pub id: ResidentId,
    pub full_name: String,
    pub nic: String,
    pub role: ResidentRole,
    pub registered_at: DateTime<Utc>,
}
