//! Account directory lookup for the id-recovery flow.

use crate::error::CertificationError;

/// Resolves a verified mobile number to the account identifiers registered
/// under it. Backed by the platform's account store in production; tests
/// use the recording double in `agegate-nullables`.
pub trait AccountDirectory: Send + Sync {
    fn find_by_mobile(&self, mobile_number: &str) -> Result<Vec<String>, CertificationError>;
}

/// Directory that knows no accounts. Used by flows that never chain a
/// lookup (signup, password reset).
pub struct NoDirectory;

impl AccountDirectory for NoDirectory {
    fn find_by_mobile(&self, _mobile_number: &str) -> Result<Vec<String>, CertificationError> {
        Ok(Vec::new())
    }
}
