//! Signature algorithms registered by name.

use acsign_core::hash::{base64_hmac_sha1, base64_hmac_sha256};
use acsign_core::{Error, Result};
use std::fmt::Debug;
use std::sync::Arc;

/// SignatureAlgorithm turns a string to sign into a base64 signature.
pub trait SignatureAlgorithm: Debug + Send + Sync + 'static {
    /// Name sent as `SignatureMethod` / `x-acs-signature-method`.
    fn name(&self) -> &'static str;
    /// Version sent as `SignatureVersion` / `x-acs-signature-version`.
    fn version(&self) -> &'static str;
    /// Value sent as `SignatureType`.
    fn signature_type(&self) -> &'static str;
    /// Sign the string with given secret.
    fn sign(&self, string_to_sign: &str, secret: &str) -> String;
}

/// HMAC-SHA1, the default algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha1;

impl SignatureAlgorithm for HmacSha1 {
    fn name(&self) -> &'static str {
        "HMAC-SHA1"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn signature_type(&self) -> &'static str {
        ""
    }

    fn sign(&self, string_to_sign: &str, secret: &str) -> String {
        base64_hmac_sha1(secret.as_bytes(), string_to_sign.as_bytes())
    }
}

/// HMAC-SHA256.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256;

impl SignatureAlgorithm for HmacSha256 {
    fn name(&self) -> &'static str {
        "HMAC-SHA256"
    }

    fn version(&self) -> &'static str {
        "1.0"
    }

    fn signature_type(&self) -> &'static str {
        ""
    }

    fn sign(&self, string_to_sign: &str, secret: &str) -> String {
        base64_hmac_sha256(secret.as_bytes(), string_to_sign.as_bytes())
    }
}

/// Look up a registered algorithm by name, ignoring case.
pub fn from_name(name: &str) -> Result<Arc<dyn SignatureAlgorithm>> {
    if name.eq_ignore_ascii_case(HmacSha1.name()) {
        Ok(Arc::new(HmacSha1))
    } else if name.eq_ignore_ascii_case(HmacSha256.name()) {
        Ok(Arc::new(HmacSha256))
    } else {
        Err(Error::config_invalid(format!(
            "unsupported signature method: {name}"
        )))
    }
}

/// The algorithm used when nothing is configured.
pub fn default_algorithm() -> Arc<dyn SignatureAlgorithm> {
    Arc::new(HmacSha1)
}
