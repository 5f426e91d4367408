//! Alibaba Cloud OpenAPI (ACS) signing and endpoint resolution for acsign.
//!
//! This crate signs requests to Alibaba Cloud OpenAPI products under both request
//! conventions, and resolves the endpoint of a product in a region through the
//! location service.
//!
//! ## Overview
//!
//! - **RPC** requests carry all parameters and the `Signature` in the query string.
//! - **ROA** requests are signed over a canonical request and carry the signature in
//!   the `Authorization: acs <access_key_id>:<signature>` header.
//!
//! Both conventions are implemented by [`RequestAuthenticator`], picked from the
//! request's [`ProtocolStyle`]. Signatures use HMAC-SHA1 by default; HMAC-SHA256
//! can be selected by name.
//!
//! ## Quick Start
//!
//! ```no_run
//! use acsign_aliyun_acs::{AcsRequest, Config, Signer};
//! use acsign_core::{Context, OsEnv, Result};
//! use acsign_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new()
//!         .with_env(OsEnv)
//!         .with_http_send(ReqwestHttpSend::default());
//!
//!     let config = Config {
//!         region_id: Some("cn-hangzhou".to_string()),
//!         ..Default::default()
//!     };
//!     let signer = Signer::from_config(ctx.clone(), config)?;
//!
//!     let req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions");
//!     let req = signer.sign("ecs.aliyuncs.com", &req).await?;
//!     let resp = ctx.http_send_as_string(req).await?;
//!     println!("{}", resp.body());
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoint Resolution
//!
//! ```no_run
//! use acsign_aliyun_acs::endpoint::{EndpointResolver, LocationServiceClient, ResolveEndpointRequest};
//! # async fn example(signer: acsign_aliyun_acs::Signer) -> acsign_core::Result<()> {
//! let resolver = EndpointResolver::new(LocationServiceClient::new(signer));
//!
//! let req = ResolveEndpointRequest::new("Ecs", "cn-hangzhou").with_location_service_code("ecs");
//! if let Some(endpoint) = resolver.resolve(&req).await?.endpoint() {
//!     println!("send to {endpoint}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Hits and misses are both remembered for the lifetime of the resolver, and regions or
//! products rejected by the location service are never looked up again.
//!
//! ## Credential Sources
//!
//! ```bash
//! export ALIBABA_CLOUD_ACCESS_KEY_ID=your-access-key-id
//! export ALIBABA_CLOUD_ACCESS_KEY_SECRET=your-access-key-secret
//! export ALIBABA_CLOUD_SECURITY_TOKEN=your-sts-token  # Optional, for STS
//! export ALIBABA_CLOUD_REGION_ID=cn-hangzhou
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod request;
pub use request::{AcsRequest, FormatType, ProtocolStyle};

pub mod algorithm;
pub use algorithm::{HmacSha1, HmacSha256, SignatureAlgorithm};

pub mod canonical;

mod authenticate;
pub use authenticate::{
    build_authenticator, RequestAuthenticator, RoaAuthenticator, RpcAuthenticator, SigningResult,
};

mod signer;
pub use signer::Signer;

pub mod endpoint;

mod provide_credential;
pub use provide_credential::*;
