use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::residents::ResidentId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assistance schemes administered through the division office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WelfareProgram {
    Samurdhi,
    Microfinance,
}

impl WelfareProgram {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Samurdhi => "samurdhi",
            Self::Microfinance => "microfinance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WelfareStatus {
    Submitted,
    Approved,
    Rejected,
    Withdrawn,
}

impl WelfareStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub fn is_open(self) -> bool {
        self == Self::Submitted
    }
}

/// Body of a new application as entered by the resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelfareSubmission {
    pub program: WelfareProgram,
    pub household_monthly_income: u32,
    pub household_size: u8,
    #[serde(default)]
    pub requested_amount: Option<u32>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub repayment_months: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelfareDecision {
    pub approved: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelfareApplication {
    pub id: ApplicationId,
    pub resident_id: ResidentId,
    pub program: WelfareProgram,
    pub household_monthly_income: u32,
    pub household_size: u8,
    pub requested_amount: Option<u32>,
    pub purpose: Option<String>,
    pub repayment_months: Option<u8>,
    pub status: WelfareStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_note: Option<String>,
}
