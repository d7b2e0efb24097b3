use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::config::OfficeDetails;
use crate::residents::ResidentRecord;

/// Rendered character certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateDocument {
    pub reference: String,
    pub file_name: String,
    pub issued_on: NaiveDate,
    pub body: String,
}

/// Formats approved residents into a printable plain-text certificate.
#[derive(Debug, Clone, Default)]
pub struct CertificateRenderer {
    office: OfficeDetails,
}

impl CertificateRenderer {
    pub fn new(office: OfficeDetails) -> Self {
        Self { office }
    }

    /// Pure function of the record and the issue date; eligibility is checked by the caller.
    pub fn render(&self, record: &ResidentRecord, issued_on: NaiveDate) -> CertificateDocument {
        let profile = &record.profile;
        let reference = format!("CERT-{}-{}", record.id, issued_on.format("%Y%m%d"));
        let age = age_on(profile.date_of_birth, issued_on);
        let occupation = profile.occupation.as_deref().unwrap_or("Not stated");
        let conduct = match &profile.conduct {
            Some(assessment) => match assessment.remarks.as_deref() {
                Some(remarks) if !remarks.trim().is_empty() => {
                    format!("{} ({})", assessment.rating.label(), remarks.trim())
                }
                _ => assessment.rating.label().to_string(),
            },
            None => "Not assessed".to_string(),
        };

        let lines = [
            "CHARACTER CERTIFICATE".to_string(),
            format!("{}, {}", self.office.village_name, self.office.division),
            String::new(),
            format!("Reference: {reference}"),
            format!("Date of issue: {issued_on}"),
            String::new(),
            format!(
                "This is to certify that {} (NIC {}), aged {}, residing at {},",
                profile.full_name, profile.nic, age, profile.address
            ),
            format!(
                "has been a registered resident of this division since {}.",
                record.registered_at.date_naive()
            ),
            String::new(),
            format!("Occupation: {occupation}"),
            format!("Household members on record: {}", profile.family_members.len()),
            format!("Conduct: {conduct}"),
            String::new(),
            "To the best of my knowledge the above named person bears a good character".to_string(),
            "and I have no objection to this certificate being used for official purposes.".to_string(),
            String::new(),
            String::new(),
            "..............................".to_string(),
            self.office.officer_title.clone(),
            self.office.village_name.clone(),
            String::new(),
        ];

        CertificateDocument {
            file_name: format!("{reference}.txt"),
            reference,
            issued_on,
            body: lines.join("\n"),
        }
    }
}

fn age_on(date_of_birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - date_of_birth.year();
    if (on.month(), on.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residents::{
        CertificateFields, ConductAssessment, ConductRating, ResidentId, ResidentRole,
    };
    use crate::test_support::{base_time, profile};

    fn record() -> ResidentRecord {
        ResidentRecord {
            id: ResidentId("res-000042".to_string()),
            profile: profile("Nimal Perera", "851234567V"),
            role: ResidentRole::Resident,
            registered_at: base_time(),
            certificate: CertificateFields {
                requested: true,
                approved: Some(true),
                ..CertificateFields::default()
            },
        }
    }

    #[test]
    fn document_carries_reference_and_resident_details() {
        let renderer = CertificateRenderer::new(OfficeDetails {
            village_name: "Kandegedara".to_string(),
            division: "Ududumbara".to_string(),
            officer_title: "Grama Niladhari".to_string(),
        });
        let issued_on = NaiveDate::from_ymd_opt(2025, 6, 3).expect("valid");

        let document = renderer.render(&record(), issued_on);

        assert_eq!(document.reference, "CERT-res-000042-20250603");
        assert_eq!(document.file_name, "CERT-res-000042-20250603.txt");
        assert!(document.body.starts_with("CHARACTER CERTIFICATE\nKandegedara, Ududumbara"));
        assert!(document.body.contains("Nimal Perera (NIC 851234567V), aged 40"));
        assert!(document.body.contains("Occupation: Paddy farmer"));
        assert!(document.body.contains("Conduct: Not assessed"));
    }

    #[test]
    fn conduct_remarks_are_included() {
        let mut record = record();
        record.profile.conduct = Some(ConductAssessment {
            rating: ConductRating::Excellent,
            remarks: Some("Active in the temple society".to_string()),
        });

        let document = CertificateRenderer::default().render(
            &record,
            NaiveDate::from_ymd_opt(2025, 6, 3).expect("valid"),
        );

        assert!(document
            .body
            .contains("Conduct: Excellent (Active in the temple society)"));
    }

    #[test]
    fn age_accounts_for_birthday_not_yet_reached() {
        let dob = NaiveDate::from_ymd_opt(1985, 4, 12).expect("valid");
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2025, 4, 11).expect("valid")), 39);
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2025, 4, 12).expect("valid")), 40);
    }
}
