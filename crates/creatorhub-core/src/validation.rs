//! Input checks that run before any store call.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::models::InfluencerProfile;
use crate::CoreError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

// UPI virtual payment address: handle@provider
static UPI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{2,256}@[A-Za-z]{2,64}$").expect("valid upi regex"));

/// Trim `value` and fail if nothing is left.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] naming `field` when the value is blank.
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// # Errors
///
/// Returns [`CoreError::Validation`] for anything that is not `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("'{email}' is not a valid email")))
    }
}

/// # Errors
///
/// Returns [`CoreError::Validation`] for a malformed UPI id.
pub fn validate_upi_id(upi_id: &str) -> Result<(), CoreError> {
    if UPI_RE.is_match(upi_id.trim()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "'{upi_id}' is not a valid UPI id (expected name@provider)"
        )))
    }
}

/// # Errors
///
/// Returns [`CoreError::Validation`] for the first invalid field.
pub fn validate_profile(profile: &InfluencerProfile) -> Result<(), CoreError> {
    require_text("full_name", &profile.full_name)?;
    require_text("phone_number", &profile.phone_number)?;
    require_text("district", &profile.district)?;
    require_text("state", &profile.state)?;
    validate_email(&profile.email)?;
    validate_upi_id(&profile.upi_id)?;
    if profile.follower_count < 0 {
        return Err(CoreError::Validation(format!(
            "follower_count must not be negative, got {}",
            profile.follower_count
        )));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`CoreError::Validation`] for a negative amount.
pub fn validate_amount(amount: Decimal) -> Result<(), CoreError> {
    if amount < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    Ok(())
}

/// An active project must state at least one objective.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] when `is_active` and every objective is blank.
pub fn validate_project_objectives(objectives: &[String], is_active: bool) -> Result<(), CoreError> {
    if is_active && objectives.iter().all(|o| o.trim().is_empty()) {
        return Err(CoreError::Validation(
            "an active project needs at least one objective".to_string(),
        ));
    }
    Ok(())
}

/// Drop blank entries and surrounding whitespace from a list field.
#[must_use]
pub fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SocialHandles;
    use crate::status::IdProofType;

    fn profile() -> InfluencerProfile {
        InfluencerProfile {
            full_name: "Demo Influencer".to_string(),
            phone_number: "+91-9876543210".to_string(),
            email: "demo@example.com".to_string(),
            district: "Bangalore Urban".to_string(),
            state: "Karnataka".to_string(),
            social_media_handles: SocialHandles::default(),
            follower_count: 35_000,
            id_proof_url: String::new(),
            id_proof_type: IdProofType::Aadhaar,
            upi_id: "demo@upi".to_string(),
        }
    }

    #[test]
    fn valid_profile_passes() {
        assert!(validate_profile(&profile()).is_ok());
    }

    #[test]
    fn negative_followers_fail() {
        let mut p = profile();
        p.follower_count = -1;
        assert!(validate_profile(&p).is_err());
    }

    #[test]
    fn blank_district_fails() {
        let mut p = profile();
        p.district = "   ".to_string();
        let err = validate_profile(&p).unwrap_err();
        assert_eq!(err, CoreError::Validation("district is required".to_string()));
    }

    #[test]
    fn upi_id_needs_provider() {
        assert!(validate_upi_id("demo@upi").is_ok());
        assert!(validate_upi_id("demo").is_err());
        assert!(validate_upi_id("demo@").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn active_project_needs_objectives() {
        assert!(validate_project_objectives(&[], true).is_err());
        assert!(validate_project_objectives(&[" ".to_string()], true).is_err());
        assert!(validate_project_objectives(&[], false).is_ok());
        assert!(validate_project_objectives(&["reach".to_string()], true).is_ok());
    }

    #[test]
    fn clean_list_trims_and_drops_blanks() {
        let items = vec![" a ".to_string(), String::new(), "b".to_string()];
        assert_eq!(clean_list(&items), vec!["a".to_string(), "b".to_string()]);
    }
}
