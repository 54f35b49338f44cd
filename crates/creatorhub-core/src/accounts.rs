//! Demo account definitions loaded from `config/accounts.yaml`.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::models::InfluencerProfile;
use crate::status::UserRole;
use crate::validation::validate_profile;
use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub email: String,
    pub role: UserRole,
    /// Influencer accounts are provisioned with this profile, pre-approved.
    pub profile: Option<InfluencerProfile>,
}

#[derive(Debug, Deserialize)]
pub struct AccountsFile {
    pub accounts: Vec<AccountConfig>,
}

/// Load and validate the demo accounts file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_accounts(path: &Path) -> Result<AccountsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AccountsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let accounts_file: AccountsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::AccountsFileParse)?;

    validate_accounts(&accounts_file)?;

    Ok(accounts_file)
}

fn validate_accounts(accounts_file: &AccountsFile) -> Result<(), ConfigError> {
    let mut seen_emails = HashSet::new();

    for account in &accounts_file.accounts {
        let email = account.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ConfigError::Validation(
                "account email must be non-empty".to_string(),
            ));
        }
        if !seen_emails.insert(email) {
            return Err(ConfigError::Validation(format!(
                "duplicate account email: '{}'",
                account.email
            )));
        }

        match (account.role, &account.profile) {
            (UserRole::Influencer, None) => {
                return Err(ConfigError::Validation(format!(
                    "influencer account '{}' needs a profile",
                    account.email
                )));
            }
            (UserRole::Influencer, Some(profile)) => {
                validate_profile(profile).map_err(|e| {
                    ConfigError::Validation(format!("account '{}': {e}", account.email))
                })?;
                if !profile.email.eq_ignore_ascii_case(&account.email) {
                    return Err(ConfigError::Validation(format!(
                        "account '{}' has a profile for '{}'",
                        account.email, profile.email
                    )));
                }
            }
            (_, _) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r"
accounts:
  - email: cehpoint.admin@gmail.com
    role: admin
  - email: cehpoint.demo@gmail.com
    role: influencer
    profile:
      full_name: Demo Influencer
      phone_number: '+91-9876543210'
      email: cehpoint.demo@gmail.com
      district: Bangalore Urban
      state: Karnataka
      social_media_handles:
        instagram: demo_influencer
        youtube: DemoChannel
      follower_count: 35000
      id_proof_url: https://example.com/demo-id.pdf
      id_proof_type: aadhaar
      upi_id: demo@upi
";

    #[test]
    fn parses_demo_accounts() {
        let file: AccountsFile = serde_yaml::from_str(DEMO).unwrap();
        validate_accounts(&file).unwrap();
        assert_eq!(file.accounts.len(), 2);
        assert_eq!(file.accounts[0].role, UserRole::Admin);
        let profile = file.accounts[1].profile.as_ref().unwrap();
        assert_eq!(profile.follower_count, 35_000);
        assert_eq!(
            profile.social_media_handles.instagram.as_deref(),
            Some("demo_influencer")
        );
    }

    #[test]
    fn influencer_without_profile_is_rejected() {
        let file = AccountsFile {
            accounts: vec![AccountConfig {
                email: "x@example.com".to_string(),
                role: UserRole::Influencer,
                profile: None,
            }],
        };
        let err = validate_accounts(&file).unwrap_err();
        assert!(err.to_string().contains("needs a profile"));
    }

    #[test]
    fn duplicate_emails_are_rejected() {
        let account = AccountConfig {
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
            profile: None,
        };
        let file = AccountsFile {
            accounts: vec![account.clone(), account],
        };
        let err = validate_accounts(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate account email"));
    }
}
