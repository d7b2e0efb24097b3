use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::residents::CertificateFields;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Canonical workflow state encoded by the `(requested, approved)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateState {
    NotRequested,
    Pending,
    Approved,
    Rejected,
}

impl CertificateState {
    pub fn of(fields: &CertificateFields) -> Self {
        match (fields.requested, fields.approved) {
            (_, Some(true)) => Self::Approved,
            (_, Some(false)) => Self::Rejected,
            (true, None) => Self::Pending,
            (false, None) => Self::NotRequested,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotRequested => "not_requested",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Display state for dashboards, layered on top of [`CertificateState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateBadge {
    NotRequested,
    Pending { fresh: bool },
    Approved,
    Rejected,
    Reapplied,
    Cancelled,
}

impl CertificateBadge {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotRequested => "not_requested",
            Self::Pending { fresh: true } => "new",
            Self::Pending { fresh: false } => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Reapplied => "reapplied",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Derive the badge shown for a record at `now`.
///
/// The "new", "reapplied" and "cancelled" badges only last for `window` after `requested_at`.
///
/// "reapplied" is read straight from the stored fields: a rejected record whose `requested_at`
/// is still fresh. A new request always clears the previous decision, so in practice this badge
/// marks a rejection that landed within `window` of the request, not a second application.
pub fn render_status_badge(
    fields: &CertificateFields,
    now: DateTime<Utc>,
    window: Duration,
) -> CertificateBadge {
    let fresh = fields
        .requested_at
        .map(|at| now.signed_duration_since(at) < window)
        .unwrap_or(false);

    match (fields.requested, fields.approved) {
        (_, Some(true)) => CertificateBadge::Approved,
        (true, Some(false)) if fresh => CertificateBadge::Reapplied,
        (_, Some(false)) => CertificateBadge::Rejected,
        (true, None) => CertificateBadge::Pending { fresh },
        (false, None) if fresh => CertificateBadge::Cancelled,
        (false, None) => CertificateBadge::NotRequested,
    }
}

/// Whole days (rounded up) left before a rejected resident may request again, or `None` once
/// the cooldown has elapsed.
pub fn cooldown_days_left(
    last_request: DateTime<Utc>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<u32> {
    let elapsed = now.signed_duration_since(last_request);
    if elapsed >= cooldown {
        return None;
    }

    let remaining = (cooldown - elapsed).min(cooldown).num_milliseconds();
    let days = (remaining + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    Some(u32::try_from(days).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::base_time;

    fn fields(requested: bool, approved: Option<bool>) -> CertificateFields {
        CertificateFields {
            requested,
            approved,
            ..CertificateFields::default()
        }
    }

    #[test]
    fn state_follows_the_encoding_table() {
        assert_eq!(
            CertificateState::of(&fields(false, None)),
            CertificateState::NotRequested
        );
        assert_eq!(
            CertificateState::of(&fields(true, None)),
            CertificateState::Pending
        );
        assert_eq!(
            CertificateState::of(&fields(true, Some(true))),
            CertificateState::Approved
        );
        assert_eq!(
            CertificateState::of(&fields(true, Some(false))),
            CertificateState::Rejected
        );
    }

    #[test]
    fn cooldown_rounds_partial_days_up() {
        let now = base_time();
        let week = Duration::days(7);

        assert_eq!(cooldown_days_left(now - Duration::days(3), now, week), Some(4));
        assert_eq!(
            cooldown_days_left(now - Duration::days(3) - Duration::hours(5), now, week),
            Some(4)
        );
        assert_eq!(
            cooldown_days_left(now - Duration::days(6) - Duration::hours(23), now, week),
            Some(1)
        );
        assert_eq!(cooldown_days_left(now - Duration::days(7), now, week), None);
        assert_eq!(cooldown_days_left(now - Duration::days(8), now, week), None);
    }

    #[test]
    fn cooldown_never_exceeds_the_configured_length() {
        let now = base_time();
        let future_request = now + Duration::hours(2);
        assert_eq!(
            cooldown_days_left(future_request, now, Duration::days(7)),
            Some(7)
        );
    }
}
