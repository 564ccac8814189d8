//! Pre-flight input validation
//!
//! Cheap, pure gates run before any protected call is attempted. Failures
//! here never touch a limiter.

use crate::error::{ClassifiedError, Result};

/// Prefix the hosted-zone API puts in front of zone ids
pub const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// Prefix the hosted-zone API puts in front of change ids
pub const CHANGE_PREFIX: &str = "/change/";

/// Longest domain name accepted (RFC 1035)
pub const MAX_DOMAIN_LEN: usize = 253;

const ZONE_ID_MIN_LEN: usize = 8;
const ZONE_ID_MAX_LEN: usize = 32;

/// Strip the `/hostedzone/` prefix and check the id shape
///
/// The remainder must be 8 to 32 ASCII alphanumeric characters.
pub fn normalize_zone_id(raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(ClassifiedError::validation("Hosted zone ID cannot be empty"));
    }

    let id = raw.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(raw);

    let well_formed = id.chars().all(|c| c.is_ascii_alphanumeric())
        && (ZONE_ID_MIN_LEN..=ZONE_ID_MAX_LEN).contains(&id.len());
    if !well_formed {
        return Err(ClassifiedError::validation(format!(
            "Invalid hosted zone ID format: {}",
            id
        )));
    }

    Ok(id.to_string())
}

/// Check length and make the name fully qualified
///
/// Idempotent: a name that already ends in `.` is returned unchanged.
pub fn normalize_domain(raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(ClassifiedError::validation("Domain name cannot be empty"));
    }
    // The trailing dot does not count towards the limit.
    let bare = raw.strip_suffix('.').unwrap_or(raw);
    if bare.len() > MAX_DOMAIN_LEN {
        return Err(ClassifiedError::validation(format!(
            "Domain name too long: {} chars (max {})",
            bare.len(),
            MAX_DOMAIN_LEN
        )));
    }

    if raw.ends_with('.') {
        Ok(raw.to_string())
    } else {
        Ok(format!("{}.", raw))
    }
}

/// Strip the `/change/` prefix; the id must not be empty
pub fn normalize_change_id(raw: &str) -> Result<String> {
    let id = raw.trim();
    let id = id.strip_prefix(CHANGE_PREFIX).unwrap_or(id);
    if id.is_empty() {
        return Err(ClassifiedError::validation("Change ID cannot be empty"));
    }
    Ok(id.to_string())
}

/// Require at least one service, each a single non-empty DNS label
pub fn validate_services<S: AsRef<str>>(services: &[S]) -> Result<()> {
    if services.is_empty() {
        return Err(ClassifiedError::validation(
            "At least one service must be specified",
        ));
    }

    for service in services {
        let service = service.as_ref();
        if service.is_empty() || service.len() > 63 {
            return Err(ClassifiedError::validation(format!(
                "Invalid service name '{}': must be 1-63 characters",
                service
            )));
        }
        if !service.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ClassifiedError::validation(format!(
                "Invalid service name '{}': alphanumeric, '-' and '_' only",
                service
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_zone_id_prefix_stripped() {
        assert_eq!(
            normalize_zone_id("/hostedzone/Z1234567890123").unwrap(),
            "Z1234567890123"
        );
        assert_eq!(normalize_zone_id("Z1234567890123").unwrap(), "Z1234567890123");
    }

    #[test]
    fn test_zone_id_rejections() {
        let too_long = "Z".repeat(33);
        for raw in ["", "bad!id", "Z123", "/hostedzone/", too_long.as_str()] {
            let err = normalize_zone_id(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "input {:?}", raw);
        }
    }

    #[test]
    fn test_zone_id_length_bounds() {
        assert!(normalize_zone_id("ABCDEFGH").is_ok());
        assert!(normalize_zone_id(&"A".repeat(32)).is_ok());
        assert!(normalize_zone_id("ABCDEFG").is_err());
    }

    #[test]
    fn test_domain_gets_trailing_dot() {
        assert_eq!(normalize_domain("example.com").unwrap(), "example.com.");
        assert_eq!(normalize_domain("example.com.").unwrap(), "example.com.");
    }

    #[test]
    fn test_domain_rejections() {
        assert_eq!(normalize_domain("").unwrap_err().kind(), ErrorKind::Validation);
        let long = "a".repeat(254);
        assert_eq!(normalize_domain(&long).unwrap_err().kind(), ErrorKind::Validation);
        let longest = normalize_domain(&"a".repeat(253)).unwrap();
        assert_eq!(normalize_domain(&longest).unwrap(), longest);
    }

    #[test]
    fn test_change_id() {
        assert_eq!(normalize_change_id("/change/C123456789").unwrap(), "C123456789");
        assert_eq!(normalize_change_id("C123456789").unwrap(), "C123456789");
        assert!(normalize_change_id("").is_err());
        assert!(normalize_change_id("/change/").is_err());
    }

    #[test]
    fn test_services() {
        assert!(validate_services(&["api", "web"]).is_ok());
        assert!(validate_services::<&str>(&[]).is_err());
        assert!(validate_services(&["api.v2"]).is_err());
        assert!(validate_services(&[""]).is_err());
    }
}
