use tracing::{info, warn};

use crate::configuration::{ConfigurationError, PlatformError};

/// What a finished join request amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Rejected(ConfigurationError),
    /// Configuration-domain code this build does not know about.
    Unrecognized(i64),
    /// Error from some other domain.
    Failed,
}

pub fn classify(error: Option<&PlatformError>) -> JoinOutcome {
    match error {
        None => JoinOutcome::Joined,
        Some(error) if error.is_configuration_error() => {
            match ConfigurationError::from_code(error.code) {
                Some(case) => JoinOutcome::Rejected(case),
                None => JoinOutcome::Unrecognized(error.code),
            }
        }
        Some(_) => JoinOutcome::Failed,
    }
}

impl JoinOutcome {
    /// Leading words of the diagnostic line for this outcome.
    pub fn summary(&self) -> &'static str {
        match self {
            JoinOutcome::Joined => "perhaps connected",
            JoinOutcome::Rejected(ConfigurationError::InvalidWpaPassphrase) => "password error",
            JoinOutcome::Rejected(_) => "other error",
            JoinOutcome::Unrecognized(_) => "later added error",
            JoinOutcome::Failed => "some other error",
        }
    }

    /// Writes the diagnostic line for this outcome. This is the only thing
    /// a failed join does.
    pub fn log(&self, error: Option<&PlatformError>) {
        let summary = self.summary();
        let description = error.map(|e| e.to_string()).unwrap_or_default();
        match self {
            JoinOutcome::Joined => info!("{}", summary),
            JoinOutcome::Rejected(case) => {
                warn!(code = case.code(), "{}: {}", summary, description)
            }
            JoinOutcome::Unrecognized(code) => {
                warn!(code, "{}: {}", summary, description)
            }
            JoinOutcome::Failed => {
                let domain = error.map(|e| e.domain.as_str()).unwrap_or_default();
                warn!(domain, "{}: {}", summary, description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::HOTSPOT_CONFIGURATION_ERROR_DOMAIN;

    #[test]
    fn no_error_is_a_join() {
        assert_eq!(classify(None), JoinOutcome::Joined);
    }

    #[test]
    fn every_configuration_case_is_rejected_with_its_case() {
        for case in ConfigurationError::ALL {
            let error = PlatformError::configuration(case);
            let outcome = classify(Some(&error));
            assert_eq!(outcome, JoinOutcome::Rejected(case));
            outcome.log(Some(&error));
        }
    }

    #[test]
    fn unknown_code_in_the_domain_is_unrecognized() {
        let error = PlatformError::new(HOTSPOT_CONFIGURATION_ERROR_DOMAIN, 42, "new in next release");
        let outcome = classify(Some(&error));
        assert_eq!(outcome, JoinOutcome::Unrecognized(42));
        outcome.log(Some(&error));
    }

    #[test]
    fn other_domains_fail_generically() {
        // Same numeric code as InvalidWpaPassphrase, different domain.
        let error = PlatformError::new("org.freedesktop.DBus.Error.NoReply", 2, "timed out");
        let outcome = classify(Some(&error));
        assert_eq!(outcome, JoinOutcome::Failed);
        outcome.log(Some(&error));
    }

    #[test]
    fn only_the_wpa_passphrase_is_a_password_error() {
        assert_eq!(JoinOutcome::Joined.summary(), "perhaps connected");
        assert_eq!(
            JoinOutcome::Rejected(ConfigurationError::InvalidWpaPassphrase).summary(),
            "password error"
        );
        for case in ConfigurationError::ALL {
            if case != ConfigurationError::InvalidWpaPassphrase {
                assert_eq!(JoinOutcome::Rejected(case).summary(), "other error", "{:?}", case);
            }
        }
        assert_eq!(JoinOutcome::Unrecognized(42).summary(), "later added error");
        assert_eq!(JoinOutcome::Failed.summary(), "some other error");
    }

    #[test]
    fn routing_picks_the_matching_line() {
        let wpa = PlatformError::configuration(ConfigurationError::InvalidWpaPassphrase);
        assert_eq!(classify(Some(&wpa)).summary(), "password error");

        let wep = PlatformError::configuration(ConfigurationError::InvalidWepPassphrase);
        assert_eq!(classify(Some(&wep)).summary(), "other error");

        let later = PlatformError::new(HOTSPOT_CONFIGURATION_ERROR_DOMAIN, 16, "new case");
        assert_eq!(classify(Some(&later)).summary(), "later added error");

        let bus = PlatformError::new("org.freedesktop.DBus.Error.NoReply", 2, "timed out");
        assert_eq!(classify(Some(&bus)).summary(), "some other error");
    }
}
