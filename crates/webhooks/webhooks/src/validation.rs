//! Registration field validation.

use crate::endpoint::EndpointData;

/// Maximum length of an endpoint name.
pub const MAX_NAME_LEN: usize = 80;

/// Result of validating registration data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Field errors in the order they were found.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Builds a report from collected errors.
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Rule set applied to endpoint registration data.
pub trait EndpointValidator: Send + Sync {
    /// Validates registration data.
    fn validate(&self, data: &EndpointData) -> ValidationReport;
}

/// Default rules: an absolute http(s) URL and an optional, bounded name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl DefaultValidator {
    fn check_url(url: Option<&str>, errors: &mut Vec<String>) {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            errors.push("URL is required".to_string());
            return;
        };

        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                if parsed.host_str().is_none() {
                    errors.push("URL must include a host".to_string());
                }
            }
            Ok(parsed) => errors.push(format!("URL scheme '{}' is not supported", parsed.scheme())),
            Err(e) => errors.push(format!("URL is invalid: {}", e)),
        }
    }

    fn check_name(name: Option<&str>, errors: &mut Vec<String>) {
        if let Some(name) = name {
            if name.trim().is_empty() {
                errors.push("Name cannot be blank".to_string());
            } else if name.chars().count() > MAX_NAME_LEN {
                errors.push(format!("Name must be at most {} characters", MAX_NAME_LEN));
            }
        }
    }
}

impl EndpointValidator for DefaultValidator {
    fn validate(&self, data: &EndpointData) -> ValidationReport {
        let mut errors = Vec::new();
        Self::check_url(data.url.as_deref(), &mut errors);
        Self::check_name(data.name.as_deref(), &mut errors);
        ValidationReport::from_errors(errors)
    }
}
