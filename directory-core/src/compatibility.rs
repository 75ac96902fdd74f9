#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompatibilityError {
    #[error("client version {version} (hash {hash}) is not supported")]
    Rejected { version: String, hash: u32 },
}

/// Decides whether a client build may sign in.
///
/// The directory ships without a real compatibility policy; deployments plug
/// one in here without touching the sign-in flow.
pub trait VersionValidator: Send + Sync {
    fn validate(&self, version: &str, hash: u32) -> Result<(), CompatibilityError>;
}

/// Accepts every client build.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyVersion;

impl VersionValidator for AcceptAnyVersion {
    fn validate(&self, _version: &str, _hash: u32) -> Result<(), CompatibilityError> {
        Ok(())
    }
}

impl<F> VersionValidator for F
where
    F: Fn(&str, u32) -> Result<(), CompatibilityError> + Send + Sync,
{
    fn validate(&self, version: &str, hash: u32) -> Result<(), CompatibilityError> {
        self(version, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_any_version() {
        assert!(AcceptAnyVersion.validate("0.0.1", 0).is_ok());
        assert!(AcceptAnyVersion.validate("", u32::MAX).is_ok());
    }

    #[test]
    fn test_closure_validator() {
        let validator = |version: &str, hash: u32| {
            if hash == 7 {
                Ok(())
            } else {
                Err(CompatibilityError::Rejected {
                    version: version.to_string(),
                    hash,
                })
            }
        };

        assert!(validator.validate("1.0", 7).is_ok());
        assert_eq!(
            validator.validate("1.0", 8),
            Err(CompatibilityError::Rejected {
                version: "1.0".to_string(),
                hash: 8
            })
        );
    }
}
