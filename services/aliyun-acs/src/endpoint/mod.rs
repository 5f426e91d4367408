//! Endpoint resolution through the location service.
//!
//! [`EndpointResolver`] answers "which host serves this product in this region" and
//! remembers both hits and misses, so a failing lookup is paid for only once.

use crate::constants::DEFAULT_ENDPOINT_TYPE;
use crate::request::AcsRequest;
use acsign_core::Result;
use async_trait::async_trait;
use std::fmt::Debug;

mod cache;
pub use cache::{EndpointCache, EndpointEntry, EndpointKey};

mod location;
pub use location::{
    DescribeEndpointsResponse, EndpointItem, Endpoints, LocationServiceClient, ServiceError,
};

mod resolver;
pub use resolver::{EndpointResolver, Resolution};

/// ResolveEndpointRequest is what the resolver needs to know about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveEndpointRequest {
    /// Product code, for example `Ecs`.
    pub product_code: String,
    /// Region id, for example `cn-hangzhou`.
    pub region_id: String,
    /// Code of the product in the location service. Requests without it are skipped.
    pub location_service_code: Option<String>,
    /// Endpoint type, `openAPI` by default.
    pub endpoint_type: String,
}

impl ResolveEndpointRequest {
    /// Create a new request.
    pub fn new(product_code: &str, region_id: &str) -> Self {
        Self {
            product_code: product_code.to_string(),
            region_id: region_id.to_string(),
            location_service_code: None,
            endpoint_type: DEFAULT_ENDPOINT_TYPE.to_string(),
        }
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

    /// Build from an api request sent to given region.
    pub fn from_acs_request(req: &AcsRequest, region_id: &str) -> Self {
        Self {
            product_code: req.product.clone(),
            region_id: region_id.to_string(),
            location_service_code: req.location_service_code.clone(),
            endpoint_type: req.endpoint_type.clone(),
        }
    }
}

/// DescribeEndpointRequest is the input of one location service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeEndpointRequest {
    /// Region to describe.
    pub region_id: String,
    /// Endpoint type to describe.
    pub endpoint_type: String,
    /// Product code in the location service.
    pub location_service_code: String,
    /// Host of the location service.
    pub location_endpoint: String,
}

/// DescribeEndpoint calls the location service.
///
/// Rejections from the service must carry a [`ServiceError`] as the error source,
/// the resolver inspects it to decide what to remember.
#[async_trait]
pub trait DescribeEndpoint: Debug + Send + Sync + 'static {
    /// Describe the endpoints of a product in a region.
    async fn describe_endpoint(
        &self,
        req: &DescribeEndpointRequest,
    ) -> Result<DescribeEndpointsResponse>;
}
