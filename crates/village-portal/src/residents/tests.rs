use std::io::Cursor;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::*;
use crate::notifications::NotificationTemplate;
use crate::test_support::*;

fn build_service() -> (
    ResidentDirectoryService<MemoryResidents, RecordingNotifier>,
    Arc<MemoryResidents>,
    Arc<RecordingNotifier>,
) {
    let repository = Arc::new(MemoryResidents::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = ResidentDirectoryService::new(
        repository.clone(),
        notifier.clone(),
        ManualClock::at(base_time()),
    );
    (service, repository, notifier)
}

#[test]
fn register_creates_default_certificate_state_and_notifies() {
    let (service, repository, notifier) = build_service();

    let record = service
        .register(registration("Nimal Perera", "851234567v"))
        .expect("registration succeeds");

    assert!(record.id.0.starts_with("res-"));
    assert_eq!(record.profile.nic, "851234567V");
    assert_eq!(record.certificate, CertificateFields::default());
    assert_eq!(record.registered_at, base_time());
    assert!(repository.fetch(&record.id).expect("fetch").is_some());

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, NotificationTemplate::ResidentRegistered);
    assert_eq!(events[0].recipient.as_deref(), Some("nimal.perera@example.lk"));
}

#[test]
fn register_without_email_skips_notification() {
    let (service, _, notifier) = build_service();
    let mut registration = registration("Kamala Silva", "198512345678");
    registration.profile.email = None;

    service.register(registration).expect("registration succeeds");
    assert!(notifier.events().is_empty());
}

#[test]
fn duplicate_nic_is_a_conflict() {
    let (service, _, _) = build_service();
    service
        .register(registration("Nimal Perera", "851234567V"))
        .expect("first registration");

    match service.register(registration("Nimal P.", "851234567v")) {
        Err(DirectoryError::DuplicateNic(nic)) => assert_eq!(nic, "851234567V"),
        other => panic!("expected duplicate NIC, got {other:?}"),
    }
}

#[test]
fn invalid_profiles_fail_validation() {
    let (service, repository, _) = build_service();
    let mut registration = registration("Nimal Perera", "12345");
    registration.profile.nic = "12345".to_string();

    match service.register(registration) {
        Err(DirectoryError::Validation(ValidationError::InvalidNic)) => {}
        other => panic!("expected NIC validation failure, got {other:?}"),
    }
    assert!(repository.list().expect("list").is_empty());
}

#[test]
fn update_profile_applies_partial_changes_and_keeps_nic() {
    let (service, _, _) = build_service();
    let record = service
        .register(registration("Nimal Perera", "851234567V"))
        .expect("registration succeeds");

    let updated = service
        .update_profile(
            &record.id,
            ProfileUpdate {
                address: Some("3 Station Road, Kandegedara".to_string()),
                family_members: Some(vec![FamilyMember {
                    name: "Sanduni Perera".to_string(),
                    relationship: "Daughter".to_string(),
                    date_of_birth: None,
                    occupation: Some("Student".to_string()),
                }]),
                ..ProfileUpdate::default()
            },
        )
        .expect("update succeeds");

    assert_eq!(updated.profile.address, "3 Station Road, Kandegedara");
    assert_eq!(updated.profile.family_members.len(), 1);
    assert_eq!(updated.profile.nic, "851234567V");
    assert_eq!(updated.profile.full_name, "Nimal Perera");
}

#[test]
fn update_rejects_invalid_email() {
    let (service, repository, _) = build_service();
    let record = service
        .register(registration("Nimal Perera", "851234567V"))
        .expect("registration succeeds");

    let result = service.update_profile(
        &record.id,
        ProfileUpdate {
            email: Some("not-an-email".to_string()),
            ..ProfileUpdate::default()
        },
    );
    assert!(matches!(
        result,
        Err(DirectoryError::Validation(ValidationError::InvalidEmail))
    ));

    let stored = repository
        .fetch(&record.id)
        .expect("fetch")
        .expect("record present");
    assert_eq!(
        stored.profile.email.as_deref(),
        Some("nimal.perera@example.lk")
    );
}

#[test]
fn remove_and_missing_lookups() {
    let (service, _, _) = build_service();
    let record = service
        .register(registration("Nimal Perera", "851234567V"))
        .expect("registration succeeds");

    service.remove(&record.id).expect("remove succeeds");
    match service.get(&record.id) {
        Err(DirectoryError::NotFound(id)) => assert_eq!(id, record.id),
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(matches!(
        service.remove(&record.id),
        Err(DirectoryError::NotFound(_))
    ));
}

#[test]
fn import_registers_valid_rows_and_reports_the_rest() {
    let (service, repository, _) = build_service();
    let csv = "full_name,nic,date_of_birth,address,phone,email,occupation\n\
               Nimal Perera,851234567V,1985-04-12,12 Temple Road,,,Farmer\n\
               Kamala Silva,198512345678,1985/04/12,4 Lake View,,,\n\
               Nimal Again,851234567V,1985-04-12,12 Temple Road,,,\n\
               Sunil Fernando,901234567V,1990-01-01,7 Hill Street,0712345678,,Carpenter\n";

    let summary = service.import(Cursor::new(csv)).expect("import runs");

    assert_eq!(summary.registered, 2);
    assert_eq!(summary.skipped.len(), 2);
    assert_eq!(summary.skipped[0].line, 3);
    assert_eq!(summary.skipped[1].line, 4);
    assert!(summary.skipped[1].reason.contains("already registered"));
    assert_eq!(repository.list().expect("list").len(), 2);
}

#[test]
fn import_aborts_when_storage_is_down() {
    let service = ResidentDirectoryService::new(
        Arc::new(UnavailableResidents),
        Arc::new(RecordingNotifier::default()),
        ManualClock::at(base_time()),
    );
    let csv = "full_name,nic,date_of_birth,address,phone,email,occupation\n\
               Nimal Perera,851234567V,1985-04-12,12 Temple Road,,,\n";

    assert!(matches!(
        service.import(Cursor::new(csv)),
        Err(ResidentImportError::Storage(_))
    ));
}

#[tokio::test]
async fn register_route_requires_an_officer() {
    let (service, _, _) = build_service();
    let router = resident_router(Arc::new(service));
    let body = serde_json::to_value(registration("Nimal Perera", "851234567V")).expect("json");

    let response = router
        .clone()
        .oneshot(request_as(
            "POST",
            "/api/v1/residents",
            "res-000999",
            ResidentRole::Resident,
            Some(body.clone()),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(request_as(
            "POST",
            "/api/v1/residents",
            "off-1",
            ResidentRole::Officer,
            Some(body),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["profile"]["nic"], json!("851234567V"));
    assert_eq!(payload["certificate"]["requested"], json!(false));
}

#[tokio::test]
async fn residents_only_read_their_own_profile() {
    let (service, _, _) = build_service();
    let record = service
        .register(registration("Nimal Perera", "851234567V"))
        .expect("registration succeeds");
    let router = resident_router(Arc::new(service));
    let uri = format!("/api/v1/residents/{}", record.id);

    let own = router
        .clone()
        .oneshot(request_as("GET", &uri, &record.id.0, ResidentRole::Resident, None))
        .await
        .expect("route executes");
    assert_eq!(own.status(), StatusCode::OK);

    let other = router
        .oneshot(request_as("GET", &uri, "res-999999", ResidentRole::Resident, None))
        .await
        .expect("route executes");
    assert_eq!(other.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn conduct_updates_are_reserved_for_officers() {
    let (service, _, _) = build_service();
    let record = service
        .register(registration("Nimal Perera", "851234567V"))
        .expect("registration succeeds");
    let router = resident_router(Arc::new(service));
    let uri = format!("/api/v1/residents/{}", record.id);
    let body = json!({ "conduct": { "rating": "excellent" } });

    let response = router
        .clone()
        .oneshot(request_as(
            "PATCH",
            &uri,
            &record.id.0,
            ResidentRole::Resident,
            Some(body.clone()),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(request_as("PATCH", &uri, "off-1", ResidentRole::Officer, Some(body)))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["profile"]["conduct"]["rating"], json!("excellent"));
}

#[tokio::test]
async fn missing_resident_maps_to_not_found() {
    let (service, _, _) = build_service();
    let router = resident_router(Arc::new(service));

    let response = router
        .oneshot(request_as(
            "GET",
            "/api/v1/residents/res-424242",
            "off-1",
            ResidentRole::Officer,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
