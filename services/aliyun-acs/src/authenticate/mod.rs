//! Request authenticators for the RPC and ROA conventions.

use crate::algorithm::SignatureAlgorithm;
use crate::request::{AcsRequest, ProtocolStyle};
use crate::Credential;
use acsign_core::Result;
use http::HeaderMap;
use std::fmt::Debug;
use std::sync::Arc;

mod roa;
pub use roa::RoaAuthenticator;

mod rpc;
pub use rpc::RpcAuthenticator;

/// SigningResult is what a caller merges into the outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum SigningResult {
    /// Headers to send, produced by ROA signing.
    Headers(HeaderMap),
    /// Path and query to send, produced by RPC signing. Always starts with `?`.
    Query(String),
}

/// RequestAuthenticator signs one request under one convention.
pub trait RequestAuthenticator: Debug + Send + Sync {
    /// The convention this authenticator implements.
    fn style(&self) -> ProtocolStyle;

    /// Headers to send with the request.
    fn headers(&self) -> Result<HeaderMap>;

    /// Path and query string to send with the request.
    fn params(&self) -> Result<String>;

    /// The canonical string fed into the signature algorithm.
    fn string_to_sign(&self) -> Result<String>;

    /// The signature-carrying part of the request.
    fn signing_result(&self) -> Result<SigningResult> {
        match self.style() {
            ProtocolStyle::Rpc => Ok(SigningResult::Query(self.params()?)),
            ProtocolStyle::Roa => Ok(SigningResult::Headers(self.headers()?)),
        }
    }
}

/// Build the authenticator matching the request's protocol style.
pub fn build_authenticator(
    req: &AcsRequest,
    credential: Option<Credential>,
    region_id: &str,
    algorithm: Arc<dyn SignatureAlgorithm>,
) -> Result<Box<dyn RequestAuthenticator>> {
    match req.style {
        ProtocolStyle::Rpc => Ok(Box::new(RpcAuthenticator::new(
            req, credential, region_id, algorithm,
        ))),
        ProtocolStyle::Roa => Ok(Box::new(RoaAuthenticator::new(
            req, credential, region_id, algorithm,
        )?)),
    }
}
