use super::{DescribeEndpoint, DescribeEndpointRequest};
use crate::constants::*;
use crate::request::AcsRequest;
use crate::Signer;
use acsign_core::{Error, Result};
use async_trait::async_trait;
use http::StatusCode;
use log::debug;
use serde::Deserialize;

/// ServiceError is a rejection returned by an OpenAPI service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("service error (status {status}, request id {request_id:?}): {code}: {message}")]
pub struct ServiceError {
    /// Http status code.
    pub status: u16,
    /// Error code, for example `InvalidRegionId`.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Request id assigned by the service.
    pub request_id: Option<String>,
}

impl ServiceError {
    /// Create a new service error.
    pub fn new(status: u16, code: &str, message: &str) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        }
    }

    /// The region does not exist.
    pub fn is_invalid_region(&self) -> bool {
        self.code == INVALID_REGION_ID_CODE && self.message == INVALID_REGION_ID_MESSAGE
    }

    /// The product is unknown to the location service.
    pub fn is_illegal_parameter(&self) -> bool {
        self.code == ILLEGAL_PARAMETER_CODE && self.message == ILLEGAL_PARAMETER_MESSAGE
    }

    /// Decode the error document of a non-2xx response.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        #[derive(Deserialize, Default)]
        #[serde(default, rename_all = "PascalCase")]
        struct ErrorBody {
            code: Option<String>,
            message: Option<String>,
            request_id: Option<String>,
        }

        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        Self {
            status: status.as_u16(),
            code: parsed.code.unwrap_or_default(),
            message: parsed.message.unwrap_or_else(|| body.to_string()),
            request_id: parsed.request_id,
        }
    }
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Error::unexpected(format!("service responded with {}", err.code)).with_source(err)
    }
}

/// Payload of a `DescribeEndpoints` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DescribeEndpointsResponse {
    /// Request id assigned by the service.
    pub request_id: Option<String>,
    /// Whether the call succeeded.
    pub success: Option<bool>,
    /// Described endpoints.
    pub endpoints: Endpoints,
}

/// Wrapper around the endpoint list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Endpoints {
    /// Described endpoints.
    pub endpoint: Vec<EndpointItem>,
}

/// One described endpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct EndpointItem {
    /// Host name.
    pub endpoint: Option<String>,
    /// Endpoint type, for example `openAPI`.
    #[serde(rename = "Type")]
    pub endpoint_type: Option<String>,
    /// Region id.
    pub id: Option<String>,
    /// Product code in the location service.
    pub service_code: Option<String>,
    /// Product code as the service actually spells it today.
    #[serde(rename = "SerivceCode")]
    pub serivce_code: Option<String>,
}

impl EndpointItem {
    /// The service code, accepting both spellings.
    pub fn service_code(&self) -> Option<&str> {
        self.service_code
            .as_deref()
            .filter(|v| !v.is_empty())
            .or_else(|| self.serivce_code.as_deref().filter(|v| !v.is_empty()))
    }
}

/// LocationServiceClient calls `DescribeEndpoints` on the location service.
#[derive(Debug, Clone)]
pub struct LocationServiceClient {
    signer: Signer,
}

impl LocationServiceClient {
    /// Create a new client that signs its calls with given signer.
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl DescribeEndpoint for LocationServiceClient {
    async fn describe_endpoint(
        &self,
        req: &DescribeEndpointRequest,
    ) -> Result<DescribeEndpointsResponse> {
        let acs_req = AcsRequest::new(
            LOCATION_SERVICE_PRODUCT,
            LOCATION_SERVICE_VERSION,
            LOCATION_SERVICE_DESCRIBE_ENDPOINTS,
        )
        .with_query_param("Id", Some(req.region_id.as_str()))
        .with_query_param("ServiceCode", Some(req.location_service_code.as_str()))
        .with_query_param("Type", Some(req.endpoint_type.as_str()));

        let http_req = self.signer.sign(&req.location_endpoint, &acs_req).await?;
        debug!(
            "describing endpoints of {} in {} via {}",
            req.location_service_code, req.region_id, req.location_endpoint
        );

        let resp = self.signer.context().http_send_as_string(http_req).await?;
        let (parts, body) = resp.into_parts();
        if !parts.status.is_success() {
            return Err(ServiceError::from_response(parts.status, &body).into());
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::unexpected("failed to parse DescribeEndpoints response").with_source(e)
        })
    }
}
