use crate::algorithm::{self, SignatureAlgorithm};
use crate::authenticate::{build_authenticator, RequestAuthenticator, SigningResult};
use crate::canonical::form_encode;
use crate::provide_credential::DefaultCredentialProvider;
use crate::request::AcsRequest;
use crate::{Config, Credential};
use acsign_core::{Context, Error, ProvideCredential, Result, SigningCredential};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use log::debug;
use std::sync::{Arc, Mutex};

/// Signer is the main struct used to sign OpenAPI requests.
///
/// It caches the last valid credential and only asks its provider again once
/// the cached one is missing or about to expire.
#[derive(Clone, Debug)]
pub struct Signer {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = Credential>>,
    credential: Arc<Mutex<Option<Credential>>>,

    region_id: String,
    algorithm: Arc<dyn SignatureAlgorithm>,
    scheme: String,
}

impl Signer {
    /// Create a new signer using HMAC-SHA1 over https.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = Credential>,
        region_id: &str,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            credential: Arc::new(Mutex::new(None)),
            region_id: region_id.to_string(),
            algorithm: algorithm::default_algorithm(),
            scheme: "https".to_string(),
        }
    }

    /// Create a signer from config, filling unset fields from env.
    pub fn from_config(ctx: Context, config: Config) -> Result<Self> {
        let config = config.from_env(&ctx);

        let region_id = config
            .region_id
            .clone()
            .ok_or_else(|| Error::config_invalid("region_id is required"))?;
        let algorithm = match &config.signature_method {
            Some(name) => algorithm::from_name(name)?,
            None => algorithm::default_algorithm(),
        };
        let scheme = config.protocol.clone();
        let provider = DefaultCredentialProvider::new(Arc::new(config));

        Ok(Self::new(ctx, provider, &region_id)
            .with_algorithm(algorithm)
            .with_scheme(&scheme))
    }

    /// Use given signature algorithm.
    pub fn with_algorithm(mut self, algorithm: Arc<dyn SignatureAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Use given url scheme, `https` by default.
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// The context used by this signer.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The region requests are signed for.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// The signature algorithm in use.
    pub fn algorithm(&self) -> &Arc<dyn SignatureAlgorithm> {
        &self.algorithm
    }

    /// Load the credential, reusing the cached one while it's valid.
    pub async fn credential(&self) -> Result<Option<Credential>> {
        let cred = self.credential.lock().expect("lock poisoned").clone();
        if cred.is_valid() {
            return Ok(cred);
        }

        debug!("cached credential is missing or invalid, loading from provider");
        let cred = self.provider.provide_credential(&self.ctx).await?;
        *self.credential.lock().expect("lock poisoned") = cred.clone();
        Ok(cred)
    }

    /// Build the authenticator for this request.
    pub async fn authenticator(&self, req: &AcsRequest) -> Result<Box<dyn RequestAuthenticator>> {
        let cred = self.credential().await?;
        build_authenticator(req, cred, &self.region_id, self.algorithm.clone())
    }

    /// Sign the request and build the http request to send to `host`.
    pub async fn sign(&self, host: &str, req: &AcsRequest) -> Result<http::Request<Bytes>> {
        let auth = self.authenticator(req).await?;

        let (path_and_query, mut headers) = match auth.signing_result()? {
            SigningResult::Query(query) => (format!("/{query}"), auth.headers()?),
            SigningResult::Headers(headers) => (auth.params()?, headers),
        };

        let body = if req.body_params.is_empty() {
            req.body.clone().unwrap_or_default()
        } else {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
            Bytes::from(form_encode(
                req.body_params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            ))
        };

        let mut out = http::Request::new(body);
        *out.method_mut() = req.method.clone();
        *out.uri_mut() = format!("{}://{}{}", self.scheme, host, path_and_query).parse()?;
        *out.headers_mut() = headers;
        Ok(out)
    }
}
