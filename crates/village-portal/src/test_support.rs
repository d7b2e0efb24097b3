use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::clock::Clock;
use crate::identity::{RESIDENT_ID_HEADER, RESIDENT_ROLE_HEADER};
use crate::notifications::{Notification, NotificationDispatcher, NotificationError};
use crate::repository::RepositoryError;
use crate::residents::{
    CertificateFields, ResidentId, ResidentProfile, ResidentRecord, ResidentRegistration,
    ResidentRepository, ResidentRole,
};

pub(crate) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock tests can move forward between workflow steps.
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(crate) fn profile(full_name: &str, nic: &str) -> ResidentProfile {
    ResidentProfile {
        full_name: full_name.to_string(),
        nic: nic.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 4, 12).expect("valid"),
        address: "12 Temple Road, Kandegedara".to_string(),
        phone: Some("0771234567".to_string()),
        email: Some(format!(
            "{}@example.lk",
            full_name.to_ascii_lowercase().replace(' ', ".")
        )),
        occupation: Some("Paddy farmer".to_string()),
        emergency_contact: None,
        family_members: Vec::new(),
        conduct: None,
    }
}

pub(crate) fn registration(full_name: &str, nic: &str) -> ResidentRegistration {
    ResidentRegistration {
        profile: profile(full_name, nic),
        role: ResidentRole::Resident,
    }
}

/// Insert a resident directly with the given certificate fields.
pub(crate) fn seed_resident(
    repository: &MemoryResidents,
    id: &str,
    certificate: CertificateFields,
) -> ResidentId {
    let record = ResidentRecord {
        id: ResidentId(id.to_string()),
        profile: profile("Nimal Perera", "851234567V"),
        role: ResidentRole::Resident,
        registered_at: base_time() - Duration::days(365),
        certificate,
    };
    repository.insert(record).expect("seed resident");
    ResidentId(id.to_string())
}

#[derive(Default, Clone)]
pub(crate) struct MemoryResidents {
    pub(crate) records: Arc<Mutex<HashMap<ResidentId, ResidentRecord>>>,
}

impl MemoryResidents {
    pub(crate) fn certificate(&self, id: &ResidentId) -> CertificateFields {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .map(|record| record.certificate.clone())
            .expect("resident present")
    }
}

impl ResidentRepository for MemoryResidents {
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
        guard.insert(record.id.clone(), record);
        Ok(())
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

pub(crate) struct UnavailableResidents;

impl ResidentRepository for UnavailableResidents {
    fn insert(&self, _record: ResidentRecord) -> Result<ResidentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ResidentRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ResidentId) -> Result<Option<ResidentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_nic(&self, _nic: &str) -> Result<Option<ResidentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<ResidentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &ResidentId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(crate) struct RecordingNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(crate) fn request_as(
    method: &str,
    uri: &str,
    resident_id: &str,
    role: ResidentRole,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(RESIDENT_ID_HEADER, resident_id)
        .header(RESIDENT_ROLE_HEADER, role.label());

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(crate) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
