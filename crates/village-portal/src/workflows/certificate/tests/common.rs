use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::{CertificateSettings, OfficeDetails};
use crate::residents::{CertificateFields, ResidentId};
use crate::test_support::{base_time, seed_resident, ManualClock, MemoryResidents, RecordingNotifier};
use crate::workflows::certificate::CertificateWorkflowService;

pub(super) type TestService = CertificateWorkflowService<MemoryResidents, RecordingNotifier>;

pub(super) struct Harness {
    pub service: Arc<TestService>,
    pub repository: Arc<MemoryResidents>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

pub(super) fn harness() -> Harness {
    let repository = Arc::new(MemoryResidents::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = ManualClock::at(base_time());
    let service = Arc::new(CertificateWorkflowService::new(
        repository.clone(),
        notifier.clone(),
        clock.clone(),
        CertificateSettings::default(),
        OfficeDetails::default(),
    ));
    Harness {
        service,
        repository,
        notifier,
        clock,
    }
}

impl Harness {
    pub fn resident(&self, id: &str, certificate: CertificateFields) -> ResidentId {
        seed_resident(&self.repository, id, certificate)
    }

    pub fn not_requested(&self, id: &str) -> ResidentId {
        self.resident(id, CertificateFields::default())
    }

    pub fn pending(&self, id: &str, requested: DateTime<Utc>) -> ResidentId {
        self.resident(
            id,
            CertificateFields {
                requested: true,
                approved: None,
                request_date: Some(requested),
                requested_at: Some(requested),
                rejection_reason: None,
            },
        )
    }

    pub fn rejected(&self, id: &str, days_ago: i64) -> ResidentId {
        let requested = base_time() - Duration::days(days_ago);
        self.resident(
            id,
            CertificateFields {
                requested: true,
                approved: Some(false),
                request_date: Some(requested),
                requested_at: Some(requested),
                rejection_reason: Some("Address could not be verified".to_string()),
            },
        )
    }

    pub fn approved(&self, id: &str) -> ResidentId {
        let requested = base_time() - Duration::days(2);
        self.resident(
            id,
            CertificateFields {
                requested: true,
                approved: Some(true),
                request_date: Some(requested),
                requested_at: Some(requested),
                rejection_reason: None,
            },
        )
    }
}
