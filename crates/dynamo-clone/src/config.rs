//! Clone parameters, validation, and job identity derivation.

use crate::error::{CloneError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Connection parameters for one table endpoint.
///
/// Field order is load-bearing: [`CloneParams::job_id`] hashes the
/// serialized form, and serde emits struct fields in declaration order.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Region the table lives in.
    pub region: String,

    /// Table name.
    pub table: String,

    /// Access key id.
    pub access_key_id: String,

    /// Secret access key.
    pub secret_access_key: String,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("region", &self.region)
            .field("table", &self.table)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Parameters for one table-to-table clone.
///
/// Immutable once constructed; used both to connect to the stores and
/// to derive the job identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneParams {
    /// Source table endpoint.
    pub source: EndpointConfig,

    /// Destination table endpoint.
    pub destination: EndpointConfig,
}

/// Stable identifier for a clone job, derived from its parameters.
///
/// Two invocations with identical parameters map to the same identifier;
/// this is the mechanism that enables resume detection across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Borrow the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl CloneParams {
    /// Validate the parameters.
    ///
    /// Surfaces missing required values before any store connection is
    /// attempted; these errors are fatal and non-retryable.
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.source, "source")?;
        validate_endpoint(&self.destination, "destination")?;
        Ok(())
    }

    /// Derive the job identity: SHA-256 over the canonical serialized
    /// parameters, hex-encoded.
    ///
    /// The serialization uses fixed field order, so logically identical
    /// parameter sets always map to the same identifier across runs.
    pub fn job_id(&self) -> JobId {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        JobId(hex::encode(hasher.finalize()))
    }
}

fn validate_endpoint(endpoint: &EndpointConfig, role: &str) -> Result<()> {
    if endpoint.region.is_empty() {
        return Err(CloneError::Config(format!("{}.region is required", role)));
    }
    if endpoint.table.is_empty() {
        return Err(CloneError::Config(format!("{}.table is required", role)));
    }
    if endpoint.access_key_id.is_empty() {
        return Err(CloneError::Config(format!(
            "{}.access_key_id is required",
            role
        )));
    }
    if endpoint.secret_access_key.is_empty() {
        return Err(CloneError::Config(format!(
            "{}.secret_access_key is required",
            role
        )));
    }
    Ok(())
}
