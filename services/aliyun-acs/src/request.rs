use crate::constants::DEFAULT_ENDPOINT_TYPE;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// ProtocolStyle decides which convention signs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolStyle {
    /// Signature and auxiliary parameters travel in the query string.
    #[default]
    Rpc,
    /// Signature travels in the `Authorization` header.
    Roa,
}

impl FromStr for ProtocolStyle {
    type Err = acsign_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RPC" => Ok(ProtocolStyle::Rpc),
            "ROA" => Ok(ProtocolStyle::Roa),
            v => Err(acsign_core::Error::config_invalid(format!(
                "unknown protocol style: {v}"
            ))),
        }
    }
}

impl Display for ProtocolStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolStyle::Rpc => f.write_str("RPC"),
            ProtocolStyle::Roa => f.write_str("ROA"),
        }
    }
}

/// FormatType is the response format a request declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatType {
    /// `application/json`
    #[default]
    Json,
    /// `application/xml`
    Xml,
    /// `application/octet-stream`
    Raw,
}

impl FormatType {
    /// The `Accept` header value matching this format.
    pub fn accept(&self) -> &'static str {
        match self {
            FormatType::Json => "application/json",
            FormatType::Xml => "application/xml",
            FormatType::Raw => "application/octet-stream",
        }
    }
}

/// AcsRequest is a single outgoing OpenAPI call before it's signed.
#[derive(Debug, Clone)]
pub struct AcsRequest {
    /// HTTP method.
    pub method: Method,
    /// URI pattern with `[name]` placeholder segments, used by ROA requests.
    pub uri_pattern: String,
    /// Values for the placeholders in `uri_pattern`.
    pub path_params: BTreeMap<String, String>,
    /// Query parameters in insertion order; keys are unique.
    pub query_params: Vec<(String, Option<String>)>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Option<Bytes>,
    /// Form parameters sent in the body of RPC requests.
    pub body_params: BTreeMap<String, String>,
    /// Action name, for example `DescribeRegions`.
    pub action: String,
    /// Product code, for example `Ecs`.
    pub product: String,
    /// API version, for example `2014-05-26`.
    pub version: String,
    /// Code used to look the product up in the location service.
    pub location_service_code: Option<String>,
    /// Endpoint type to resolve, `openAPI` by default.
    pub endpoint_type: String,
    /// Declared response format.
    pub format: FormatType,
    /// Signing convention.
    pub style: ProtocolStyle,
}

impl AcsRequest {
    /// Create a new RPC style request.
    pub fn new(product: &str, version: &str, action: &str) -> Self {
        Self {
            method: Method::GET,
            uri_pattern: "/".to_string(),
            path_params: BTreeMap::new(),
            query_params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            body_params: BTreeMap::new(),
            action: action.to_string(),
            product: product.to_string(),
            version: version.to_string(),
            location_service_code: None,
            endpoint_type: DEFAULT_ENDPOINT_TYPE.to_string(),
            format: FormatType::Json,
            style: ProtocolStyle::Rpc,
        }
    }

    /// Create a new ROA style request against the given uri pattern.
    pub fn new_roa(product: &str, version: &str, action: &str, uri_pattern: &str) -> Self {
        Self {
            uri_pattern: uri_pattern.to_string(),
            style: ProtocolStyle::Roa,
            ..Self::new(product, version, action)
        }
    }

    /// Set the http method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the location service code.
    pub fn with_location_service_code(mut self, code: &str) -> Self {
        self.location_service_code = Some(code.to_string());
        self
    }

    /// Set the endpoint type.
    pub fn with_endpoint_type(mut self, endpoint_type: &str) -> Self {
        self.endpoint_type = endpoint_type.to_string();
        self
    }

    /// Set the declared response format.
    pub fn with_format(mut self, format: FormatType) -> Self {
        self.format = format;
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Bind a value to a `[key]` placeholder.
    pub fn with_path_param(mut self, key: &str, value: &str) -> Self {
        self.path_params.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a query parameter, replacing an existing value in place.
    pub fn with_query_param(mut self, key: &str, value: Option<&str>) -> Self {
        self.set_query_param(key, value);
        self
    }

    /// Set a body parameter.
    pub fn with_body_param(mut self, key: &str, value: &str) -> Self {
        self.body_params.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a query parameter, keeping the position of an existing key.
    pub fn set_query_param(&mut self, key: &str, value: Option<&str>) {
        let value = value.map(|v| v.to_string());
        match self.query_params.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.query_params.push((key.to_string(), value)),
        }
    }

    /// Get a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_query_param_keeps_order() {
        let mut req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions")
            .with_query_param("b", Some("1"))
            .with_query_param("a", None);
        req.set_query_param("b", Some("2"));

        assert_eq!(
            req.query_params,
            vec![
                ("b".to_string(), Some("2".to_string())),
                ("a".to_string(), None)
            ]
        );
        assert_eq!(req.query_param("b"), Some("2"));
        assert_eq!(req.query_param("a"), None);
    }

    #[test]
    fn test_new_roa() {
        let req = AcsRequest::new_roa("CS", "2015-12-15", "DescribeClusters", "/clusters");

        assert_eq!(req.style, ProtocolStyle::Roa);
        assert_eq!(req.uri_pattern, "/clusters");
        assert_eq!(req.endpoint_type, "openAPI");
        assert_eq!(req.method, Method::GET);
    }

    #[test]
    fn test_protocol_style_from_str() {
        assert_eq!("rpc".parse::<ProtocolStyle>().unwrap(), ProtocolStyle::Rpc);
        assert_eq!("ROA".parse::<ProtocolStyle>().unwrap(), ProtocolStyle::Roa);
        assert!("soap".parse::<ProtocolStyle>().is_err());
    }
}
