use super::RequestAuthenticator;
use crate::algorithm::SignatureAlgorithm;
use crate::canonical::{encode_query, resolve_uri_pattern, roa_string_to_sign};
use crate::constants::*;
use crate::request::{AcsRequest, FormatType, ProtocolStyle};
use crate::Credential;
use acsign_core::hash::base64_md5;
use acsign_core::time::{format_http_date, now, DateTime};
use acsign_core::{Error, Result};
use http::header::{HeaderName, ACCEPT, AUTHORIZATION, DATE};
use http::{HeaderMap, HeaderValue, Method};
use log::debug;
use std::sync::Arc;

/// RoaAuthenticator signs requests with an `Authorization` header.
#[derive(Debug)]
pub struct RoaAuthenticator {
    credential: Credential,
    algorithm: Arc<dyn SignatureAlgorithm>,

    method: Method,
    headers: HeaderMap,
    uri: String,
    query_params: Vec<(String, Option<String>)>,
    format: FormatType,

    time: DateTime,
}

impl RoaAuthenticator {
    /// Create a new ROA authenticator.
    ///
    /// Returns an error if no credential is given.
    pub fn new(
        req: &AcsRequest,
        credential: Option<Credential>,
        region_id: &str,
        algorithm: Arc<dyn SignatureAlgorithm>,
    ) -> Result<Self> {
        let credential = credential
            .ok_or_else(|| Error::credential_missing("no credential to sign roa request"))?;

        let mut headers = req.headers.clone();
        headers.insert(X_ACS_VERSION, HeaderValue::from_str(&req.version)?);
        headers.insert(X_ACS_REGION_ID, HeaderValue::from_str(region_id)?);
        if let Some(body) = &req.body {
            headers.insert(
                HeaderName::from_static(CONTENT_MD5),
                HeaderValue::from_str(&base64_md5(body))?,
            );
        }
        if let Some(token) = &credential.security_token {
            let mut value = HeaderValue::from_str(token)?;
            value.set_sensitive(true);
            headers.insert(X_ACS_SECURITY_TOKEN, value);
        }
        if let Some(token) = &credential.bearer_token {
            let mut value = HeaderValue::from_str(token)?;
            value.set_sensitive(true);
            headers.insert(X_ACS_BEARER_TOKEN, value);
        }

        Ok(Self {
            credential,
            algorithm,
            method: req.method.clone(),
            headers,
            uri: resolve_uri_pattern(&req.uri_pattern, &req.path_params),
            query_params: req.query_params.clone(),
            format: req.format,
            time: now(),
        })
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

    /// Headers covered by the signature.
    fn signing_headers(&self) -> Result<HeaderMap> {
        let mut headers = self.headers.clone();
        headers.insert(DATE, HeaderValue::from_str(&format_http_date(self.time))?);
        headers.insert(ACCEPT, HeaderValue::from_static(self.format.accept()));
        headers.insert(
            X_ACS_SIGNATURE_METHOD,
            HeaderValue::from_static(self.algorithm.name()),
        );
        headers.insert(
            X_ACS_SIGNATURE_VERSION,
            HeaderValue::from_static(self.algorithm.version()),
        );
        Ok(headers)
    }
}

impl RequestAuthenticator for RoaAuthenticator {
    fn style(&self) -> ProtocolStyle {
        ProtocolStyle::Roa
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = self.signing_headers()?;
        let string_to_sign =
            roa_string_to_sign(&self.method, &headers, &self.uri, &self.query_params)?;
        debug!("calculated roa string to sign: {string_to_sign}");

        let signature = self
            .algorithm
            .sign(&string_to_sign, &self.credential.access_key_secret);

        let mut value = HeaderValue::from_str(&format!(
            "acs {}:{}",
            self.credential.access_key_id, signature
        ))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        Ok(headers)
    }

    fn params(&self) -> Result<String> {
        let mut params = self.uri.clone();
        let query = encode_query(&self.query_params);
        if !query.is_empty() {
            if !params.contains('?') {
                params.push('?');
            } else if !params.ends_with('?') && !params.ends_with('&') {
                params.push('&');
            }
            params.push_str(&query);
        }
        if params.ends_with('?') {
            params.pop();
        }
        Ok(params)
    }

    fn string_to_sign(&self) -> Result<String> {
        roa_string_to_sign(
            &self.method,
            &self.signing_headers()?,
            &self.uri,
            &self.query_params,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::HmacSha1;
    use acsign_core::time::parse_rfc2822;
    use http::header::CONTENT_TYPE;
    use pretty_assertions::assert_eq;

    fn authenticator(req: &AcsRequest, cred: Credential) -> RoaAuthenticator {
        RoaAuthenticator::new(req, Some(cred), "cn-hangzhou", Arc::new(HmacSha1))
            .unwrap()
            .with_time(parse_rfc2822("Mon, 15 Aug 2022 16:50:12 GMT").unwrap())
    }

    #[test]
    fn test_roa_get() {
        let _ = env_logger::builder().is_test(true).try_init();

        let req = AcsRequest::new_roa(
            "CS",
            "2016-04-28",
            "DescribeClusterNodes",
            "/clusters/[ClusterId]/nodes",
        )
        .with_path_param("ClusterId", "c-123");
        let auth = authenticator(&req, Credential::new("testid", "testsecret"));

        let string_to_sign = auth.string_to_sign().unwrap();
        assert_eq!(string_to_sign.lines().next(), Some("GET"));

        let headers = auth.headers().unwrap();
        assert_eq!(
            headers[AUTHORIZATION],
            "acs testid:xFs/wMvDn0o/LyNCSJ4SVBQuiw8="
        );
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers[DATE], "Mon, 15 Aug 2022 16:50:12 GMT");
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[X_ACS_VERSION], "2016-04-28");
        assert_eq!(headers[X_ACS_REGION_ID], "cn-hangzhou");
        assert!(!headers.contains_key(CONTENT_MD5));

        assert_eq!(auth.params().unwrap(), "/clusters/c-123/nodes");
    }

    #[test]
    fn test_roa_post_with_body() {
        let _ = env_logger::builder().is_test(true).try_init();

        let req = AcsRequest::new_roa("CS", "2016-04-28", "CreateCluster", "/clusters?acl")
            .with_method(Method::POST)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_query_param("pageSize", Some("10"))
            .with_query_param("name", None)
            .with_body(r#"{"name":"demo"}"#);
        let auth = authenticator(
            &req,
            Credential::new("testid", "testsecret").with_security_token("sts-token"),
        );

        let headers = auth.headers().unwrap();
        assert_eq!(headers[CONTENT_MD5], "SV1e2w+tCr11OqI6DfkCPw==");
        assert_eq!(headers[X_ACS_SECURITY_TOKEN], "sts-token");
        assert_eq!(
            headers[AUTHORIZATION],
            "acs testid:Hmh8sDsP5iCoQDsQ3bwPd9mOfTM="
        );

        // Original order, joined to the existing query.
        assert_eq!(auth.params().unwrap(), "/clusters?acl&pageSize=10&name");
    }

    #[test]
    fn test_roa_params() {
        let req = AcsRequest::new_roa("CS", "2016-04-28", "DescribeClusters", "/clusters")
            .with_query_param("b", Some("x y"))
            .with_query_param("a", Some("1"));
        let auth = authenticator(&req, Credential::new("testid", "testsecret"));
        assert_eq!(auth.params().unwrap(), "/clusters?b=x%20y&a=1");

        let req = AcsRequest::new_roa("CS", "2016-04-28", "DescribeClusters", "/clusters?");
        let auth = authenticator(&req, Credential::new("testid", "testsecret"));
        assert_eq!(auth.params().unwrap(), "/clusters");
    }

    #[test]
    fn test_roa_bearer_token_and_format() {
        let req = AcsRequest::new_roa("CS", "2016-04-28", "DescribeClusters", "/clusters")
            .with_format(FormatType::Xml);
        let auth = authenticator(
            &req,
            Credential::new("testid", "testsecret").with_bearer_token("bearer"),
        );

        let headers = auth.headers().unwrap();
        assert_eq!(headers[X_ACS_BEARER_TOKEN], "bearer");
        assert_eq!(headers[ACCEPT], "application/xml");
        assert!(auth
            .string_to_sign()
            .unwrap()
            .contains("x-acs-bearer-token:bearer\n"));
    }
}
