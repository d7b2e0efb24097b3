use chrono::{DateTime, Duration, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use village_portal::chat::{ChatRelay, InMemoryPresence, KeywordBot};
use village_portal::clock::Clock;
use village_portal::config::AppConfig;
use village_portal::health_records::{
    HealthRecord, HealthRecordId, HealthRecordRepository, HealthRecordService,
};
use village_portal::notifications::NotificationDispatcher;
use village_portal::repository::RepositoryError;
use village_portal::residents::{
    ResidentDirectoryService, ResidentId, ResidentRecord, ResidentRepository,
};
use village_portal::workflows::certificate::CertificateWorkflowService;
use village_portal::workflows::welfare::{
    ApplicationId, WelfareApplication, WelfareRepository, WelfareService,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryResidentRepository {
    records: Arc<Mutex<HashMap<ResidentId, ResidentRecord>>>,
}

impl ResidentRepository for InMemoryResidentRepository {
    fn insert(&self, record: ResidentRecord) -> Result<ResidentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ResidentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ResidentId) -> Result<Option<ResidentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_nic(&self, nic: &str) -> Result<Option<ResidentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.profile.nic == nic)
            .cloned())
    }

    fn list(&self) -> Result<Vec<ResidentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn remove(&self, id: &ResidentId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryWelfareRepository {
    records: Arc<Mutex<HashMap<ApplicationId, WelfareApplication>>>,
}

impl WelfareRepository for InMemoryWelfareRepository {
    fn insert(
        &self,
        application: WelfareApplication,
    ) -> Result<WelfareApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: WelfareApplication) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            guard.insert(application.id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<WelfareApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_resident(
        &self,
        resident_id: &ResidentId,
    ) -> Result<Vec<WelfareApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| &application.resident_id == resident_id)
            .cloned()
            .collect())
    }

    fn list(&self) -> Result<Vec<WelfareApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryHealthRecordRepository {
    records: Arc<Mutex<HashMap<HealthRecordId, HealthRecord>>>,
}

impl HealthRecordRepository for InMemoryHealthRecordRepository {
    fn insert(&self, record: HealthRecord) -> Result<HealthRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: HealthRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &HealthRecordId) -> Result<Option<HealthRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_resident(
        &self,
        resident_id: &ResidentId,
    ) -> Result<Vec<HealthRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.resident_id == resident_id)
            .cloned()
            .collect())
    }

    fn list(&self) -> Result<Vec<HealthRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(crate) type Directory<N> = ResidentDirectoryService<InMemoryResidentRepository, N>;
pub(crate) type Certificates<N> = CertificateWorkflowService<InMemoryResidentRepository, N>;
pub(crate) type Welfare<N> =
    WelfareService<InMemoryWelfareRepository, InMemoryResidentRepository, N>;
pub(crate) type Health =
    HealthRecordService<InMemoryHealthRecordRepository, InMemoryResidentRepository>;
pub(crate) type Chat = ChatRelay<InMemoryPresence, KeywordBot>;

/// Every service the portal exposes, wired to one shared resident store.
pub(crate) struct PortalServices<N> {
    pub(crate) directory: Arc<Directory<N>>,
    pub(crate) certificates: Arc<Certificates<N>>,
    pub(crate) welfare: Arc<Welfare<N>>,
    pub(crate) health: Arc<Health>,
    pub(crate) chat: Arc<Chat>,
}

impl<N> PortalServices<N>
where
    N: NotificationDispatcher + 'static,
{
    pub(crate) fn in_memory(config: &AppConfig, clock: Arc<dyn Clock>, notifier: Arc<N>) -> Self {
        let residents = Arc::new(InMemoryResidentRepository::default());

        Self {
            directory: Arc::new(ResidentDirectoryService::new(
                residents.clone(),
                notifier.clone(),
                clock.clone(),
            )),
            certificates: Arc::new(CertificateWorkflowService::new(
                residents.clone(),
                notifier.clone(),
                clock.clone(),
                config.certificate,
                config.office.clone(),
            )),
            welfare: Arc::new(WelfareService::new(
                Arc::new(InMemoryWelfareRepository::default()),
                residents.clone(),
                notifier,
                clock.clone(),
            )),
            health: Arc::new(HealthRecordService::new(
                Arc::new(InMemoryHealthRecordRepository::default()),
                residents,
                clock.clone(),
            )),
            chat: Arc::new(ChatRelay::new(
                Arc::new(InMemoryPresence::default()),
                Arc::new(KeywordBot),
                clock,
                config.chat.history_limit,
            )),
        }
    }
}

/// Clock the demo moves forward by hand so cooldowns can be shown without waiting.
#[derive(Debug)]
pub(crate) struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub(crate) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = *now + by;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
