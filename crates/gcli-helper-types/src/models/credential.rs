//! Credential snapshot models.

use serde::{Deserialize, Serialize};

/// Read-through snapshot of an upstream-owned credential.
///
/// The upstream is the source of truth; this struct only mirrors what the
/// last `/creds/status` listing reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// Upstream-assigned identifier (credential file name).
    pub filename: String,
    /// Account email associated with the credential, if known.
    #[serde(default)]
    pub user_email: String,
    /// Whether the upstream has disabled this credential.
    #[serde(default)]
    pub disabled: bool,
    /// HTTP error codes the upstream recorded against this credential.
    #[serde(default)]
    pub error_codes: Vec<u16>,
}

impl Credential {
    /// Check whether any recorded error code is in the given target set.
    pub fn has_error_in(&self, targets: &[u16]) -> bool {
        self.error_codes.iter().any(|code| targets.contains(code))
    }

    /// A credential is a verification candidate when it is disabled or
    /// carries one of the configured trigger error codes.
    pub fn needs_verification(&self, targets: &[u16]) -> bool {
        self.disabled || self.has_error_in(targets)
    }
}
