use super::RequestAuthenticator;
use crate::algorithm::SignatureAlgorithm;
use crate::canonical::{form_encode, rpc_string_to_sign};
use crate::constants::RPC_FORMAT;
use crate::request::{AcsRequest, ProtocolStyle};
use crate::Credential;
use acsign_core::time::{format_iso8601, now, DateTime};
use acsign_core::{Error, Result};
use http::{HeaderMap, Method};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// RpcAuthenticator signs requests by adding a `Signature` query parameter.
#[derive(Debug)]
pub struct RpcAuthenticator {
    credential: Option<Credential>,
    algorithm: Arc<dyn SignatureAlgorithm>,

    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, Option<String>)>,
    body_params: BTreeMap<String, String>,
    action: String,
    version: String,

    time: DateTime,
    nonce: String,
}

impl RpcAuthenticator {
    /// Create a new RPC authenticator.
    ///
    /// Signing time and nonce are fixed here. A missing credential is reported when
    /// the request is canonicalized.
    pub fn new(
        req: &AcsRequest,
        credential: Option<Credential>,
        _region_id: &str,
        algorithm: Arc<dyn SignatureAlgorithm>,
    ) -> Self {
        Self {
            credential,
            algorithm,
            method: req.method.clone(),
            headers: req.headers.clone(),
            query_params: req.query_params.clone(),
            body_params: req.body_params.clone(),
            action: req.action.clone(),
            version: req.version.clone(),
            time: now(),
            nonce: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = time;
        self
    }

    /// Specify the signature nonce. Only use this function for testing.
    #[cfg(test)]
    pub fn with_nonce(mut self, nonce: &str) -> Self {
        self.nonce = nonce.to_string();
        self
    }

    fn credential(&self) -> Result<&Credential> {
        self.credential
            .as_ref()
            .ok_or_else(|| Error::credential_missing("no credential to sign rpc request"))
    }

    /// All parameters covered by the signature.
    fn parameters(&self) -> Result<BTreeMap<String, String>> {
        let cred = self.credential()?;

        let mut params: BTreeMap<String, String> = self
            .query_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
            .collect();

        params.insert("Version".to_string(), self.version.clone());
        params.insert("Action".to_string(), self.action.clone());
        params.insert("Format".to_string(), RPC_FORMAT.to_string());
        params.insert("Timestamp".to_string(), format_iso8601(self.time));
        params.insert(
            "SignatureMethod".to_string(),
            self.algorithm.name().to_string(),
        );
        params.insert(
            "SignatureType".to_string(),
            self.algorithm.signature_type().to_string(),
        );
        params.insert(
            "SignatureVersion".to_string(),
            self.algorithm.version().to_string(),
        );
        params.insert("SignatureNonce".to_string(), self.nonce.clone());
        params.insert("AccessKeyId".to_string(), cred.access_key_id.clone());

        params.extend(self.body_params.clone());
        if let Some(token) = &cred.security_token {
            params.insert("SecurityToken".to_string(), token.clone());
        }
        if let Some(token) = &cred.bearer_token {
            params.insert("BearerToken".to_string(), token.clone());
        }

        Ok(params)
    }

    fn signature(&self, params: &BTreeMap<String, String>) -> Result<String> {
        let cred = self.credential()?;
        let string_to_sign = rpc_string_to_sign(&self.method, params);
        debug!("calculated rpc string to sign: {string_to_sign}");

        Ok(self
            .algorithm
            .sign(&string_to_sign, &format!("{}&", cred.access_key_secret)))
    }
}

impl RequestAuthenticator for RpcAuthenticator {
    fn style(&self) -> ProtocolStyle {
        ProtocolStyle::Rpc
    }

    fn headers(&self) -> Result<HeaderMap> {
        Ok(self.headers.clone())
    }

    fn params(&self) -> Result<String> {
        let mut params = self.parameters()?;
        let signature = self.signature(&params)?;
        params.insert("Signature".to_string(), signature);

        Ok(format!(
            "?{}",
            form_encode(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        ))
    }

    fn string_to_sign(&self) -> Result<String> {
        Ok(rpc_string_to_sign(&self.method, &self.parameters()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{HmacSha1, HmacSha256};
    use acsign_core::time::parse_rfc2822;
    use pretty_assertions::assert_eq;

    const NONCE: &str = "3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf";

    fn authenticator(
        req: &AcsRequest,
        cred: Credential,
        algorithm: Arc<dyn SignatureAlgorithm>,
    ) -> RpcAuthenticator {
        RpcAuthenticator::new(req, Some(cred), "cn-hangzhou", algorithm)
            .with_time(parse_rfc2822("Mon, 15 Aug 2022 16:50:12 GMT").unwrap())
            .with_nonce(NONCE)
    }

    #[test]
    fn test_rpc_params() {
        let _ = env_logger::builder().is_test(true).try_init();

        let req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions");
        let auth = authenticator(
            &req,
            Credential::new("testid", "testsecret"),
            Arc::new(HmacSha1),
        );

        assert_eq!(
            auth.params().unwrap(),
            "?AccessKeyId=testid&Action=DescribeRegions&Format=JSON&Signature=B%2Bc5PxF03NdqwQshW2kH%2BVRLN84%3D&SignatureMethod=HMAC-SHA1&SignatureNonce=3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf&SignatureType=&SignatureVersion=1.0&Timestamp=2022-08-15T16%3A50%3A12Z&Version=2014-05-26"
        );
        assert!(auth.headers().unwrap().is_empty());
    }

    #[test]
    fn test_rpc_params_with_body_and_token() {
        let _ = env_logger::builder().is_test(true).try_init();

        let req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions")
            .with_method(Method::POST)
            .with_query_param("RegionId", Some("cn-hangzhou"))
            .with_body_param("Filter", "a b*c~d/e+f");
        let auth = authenticator(
            &req,
            Credential::new("testid", "testsecret").with_security_token("sts-token"),
            Arc::new(HmacSha1),
        );

        assert_eq!(
            auth.string_to_sign().unwrap(),
            "POST&%2F&AccessKeyId%3Dtestid%26Action%3DDescribeRegions%26Filter%3Da%2520b%252Ac~d%252Fe%252Bf%26Format%3DJSON%26RegionId%3Dcn-hangzhou%26SecurityToken%3Dsts-token%26SignatureMethod%3DHMAC-SHA1%26SignatureNonce%3D3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf%26SignatureType%3D%26SignatureVersion%3D1.0%26Timestamp%3D2022-08-15T16%253A50%253A12Z%26Version%3D2014-05-26"
        );
        let params = auth.params().unwrap();
        assert!(params.contains("Signature=JrQLKODYihadmEXUXzEkWEw7NJE%3D"));
        assert!(params.contains("Filter=a%20b%2Ac~d%2Fe%2Bf"));
        assert!(params.contains("SecurityToken=sts-token"));
    }

    #[test]
    fn test_rpc_system_params_override_caller() {
        let req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions")
            .with_query_param("Action", Some("Other"))
            .with_query_param("Format", Some("XML"))
            .with_query_param("Flag", None);
        let auth = authenticator(
            &req,
            Credential::new("testid", "testsecret"),
            Arc::new(HmacSha1),
        );

        let params = auth.params().unwrap();
        assert!(params.contains("Action=DescribeRegions"));
        assert!(params.contains("Format=JSON"));
        assert!(params.contains("&Flag=&"));
        assert!(!params.contains("Other"));
    }

    #[test]
    fn test_rpc_params_with_sha256() {
        let req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions");
        let auth = authenticator(
            &req,
            Credential::new("testid", "testsecret"),
            Arc::new(HmacSha256),
        );

        let params = auth.params().unwrap();
        assert!(params.contains("SignatureMethod=HMAC-SHA256"));
        assert!(params.contains("Signature=FCvu9lnjgKC1e0JsygDZ%2F4EpySsrXNGirtwa9BIT1m8%3D"));
    }

    #[test]
    fn test_rpc_nonce_is_fresh() {
        let req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions");
        let cred = Credential::new("testid", "testsecret");

        let a = RpcAuthenticator::new(&req, Some(cred.clone()), "", Arc::new(HmacSha1));
        let b = RpcAuthenticator::new(&req, Some(cred), "", Arc::new(HmacSha1));
        assert_ne!(a.nonce, b.nonce);
        // Stable for one authenticator.
        assert_eq!(a.params().unwrap(), a.params().unwrap());
    }
}
