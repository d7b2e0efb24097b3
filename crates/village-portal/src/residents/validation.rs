use chrono::NaiveDate;

use super::domain::ResidentProfile;

/// Boundary validation failures for resident profiles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("NIC must be 9 digits followed by V or X, or 12 digits")]
    InvalidNic,
    #[error("email address is malformed")]
    InvalidEmail,
    #[error("{0} must contain 9 to 15 digits")]
    InvalidPhone(&'static str),
    #[error("date of birth cannot be in the future")]
    BirthDateInFuture,
    #[error("family member #{0} is missing a name or relationship")]
    IncompleteFamilyMember(usize),
}

pub fn validate_profile(profile: &ResidentProfile, today: NaiveDate) -> Result<(), ValidationError> {
    require("full_name", &profile.full_name)?;
    require("address", &profile.address)?;

    if !is_valid_nic(&profile.nic) {
        return Err(ValidationError::InvalidNic);
    }
    if profile.date_of_birth > today {
        return Err(ValidationError::BirthDateInFuture);
    }
    if let Some(email) = profile.email.as_deref() {
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
    }
    if let Some(phone) = profile.phone.as_deref() {
        if !is_valid_phone(phone) {
            return Err(ValidationError::InvalidPhone("phone"));
        }
    }
    if let Some(contact) = &profile.emergency_contact {
        require("emergency_contact.name", &contact.name)?;
        if !is_valid_phone(&contact.phone) {
            return Err(ValidationError::InvalidPhone("emergency_contact.phone"));
        }
    }
    for (index, member) in profile.family_members.iter().enumerate() {
        if member.name.trim().is_empty() || member.relationship.trim().is_empty() {
            return Err(ValidationError::IncompleteFamilyMember(index + 1));
        }
    }

    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

pub fn is_valid_nic(raw: &str) -> bool {
    let nic = raw.trim();
    match nic.len() {
        10 => {
            let (digits, suffix) = nic.split_at(9);
            digits.chars().all(|c| c.is_ascii_digit())
                && matches!(suffix, "V" | "v" | "X" | "x")
        }
        12 => nic.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn is_valid_email(raw: &str) -> bool {
    let email = raw.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn is_valid_phone(raw: &str) -> bool {
    let phone = raw.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (9..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residents::domain::FamilyMember;

    fn profile() -> ResidentProfile {
        ResidentProfile {
            full_name: "Nimal Perera".to_string(),
            nic: "851234567V".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 4, 12).expect("valid"),
            address: "12 Temple Road, Kandegedara".to_string(),
            phone: Some("+94771234567".to_string()),
            email: Some("nimal@example.lk".to_string()),
            occupation: None,
            emergency_contact: None,
            family_members: Vec::new(),
            conduct: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid")
    }

    #[test]
    fn accepts_both_nic_formats() {
        assert!(is_valid_nic("851234567V"));
        assert!(is_valid_nic("851234567x"));
        assert!(is_valid_nic("198512345678"));
        assert!(!is_valid_nic("85123456V"));
        assert!(!is_valid_nic("85123456789A"));
    }

    #[test]
    fn well_formed_profile_passes() {
        assert_eq!(validate_profile(&profile(), today()), Ok(()));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut profile = profile();
        profile.full_name = "   ".to_string();
        assert_eq!(
            validate_profile(&profile, today()),
            Err(ValidationError::EmptyField("full_name"))
        );
    }

    #[test]
    fn malformed_contact_details_are_rejected() {
        let mut bad_email = profile();
        bad_email.email = Some("nimal@".to_string());
        assert_eq!(
            validate_profile(&bad_email, today()),
            Err(ValidationError::InvalidEmail)
        );

        let mut bad_phone = profile();
        bad_phone.phone = Some("0771-23".to_string());
        assert_eq!(
            validate_profile(&bad_phone, today()),
            Err(ValidationError::InvalidPhone("phone"))
        );
    }

    #[test]
    fn future_birth_and_nameless_family_are_rejected() {
        let mut future = profile();
        future.date_of_birth = NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid");
        assert_eq!(
            validate_profile(&future, today()),
            Err(ValidationError::BirthDateInFuture)
        );

        let mut family = profile();
        family.family_members.push(FamilyMember {
            name: String::new(),
            relationship: "Daughter".to_string(),
            date_of_birth: None,
            occupation: None,
        });
        assert_eq!(
            validate_profile(&family, today()),
            Err(ValidationError::IncompleteFamilyMember(1))
        );
    }
}
