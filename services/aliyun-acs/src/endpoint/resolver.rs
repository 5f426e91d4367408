use super::{
    DescribeEndpoint, DescribeEndpointRequest, EndpointCache, EndpointEntry, EndpointKey,
    ResolveEndpointRequest, ServiceError,
};
use crate::constants::DEFAULT_LOCATION_SERVICE_ENDPOINT;
use acsign_core::{Error, ErrorKind, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Resolution is the outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The request has no location service code, the resolver has no opinion.
    Skipped,
    /// The location service knows no endpoint for this request.
    NotFound,
    /// The endpoint to send the request to.
    Found(String),
}

impl Resolution {
    /// The endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Resolution::Found(v) => Some(v),
            _ => None,
        }
    }
}

impl From<EndpointEntry> for Resolution {
    fn from(entry: EndpointEntry) -> Self {
        match entry {
            EndpointEntry::Found(v) => Resolution::Found(v),
            EndpointEntry::NotFound => Resolution::NotFound,
        }
    }
}

/// Outcome of a location service lookup, shared with callers waiting on the same key.
#[derive(Debug, Clone)]
enum FlightOutcome {
    Resolved(Resolution),
    Failed {
        kind: ErrorKind,
        message: String,
        service: Option<ServiceError>,
    },
}

impl FlightOutcome {
    fn new(result: &Result<Resolution>) -> Self {
        match result {
            Ok(resolution) => FlightOutcome::Resolved(resolution.clone()),
            Err(err) => FlightOutcome::Failed {
                kind: err.kind(),
                message: err.message().to_string(),
                service: err.source_as::<ServiceError>().cloned(),
            },
        }
    }

    fn into_result(self) -> Result<Resolution> {
        match self {
            FlightOutcome::Resolved(resolution) => Ok(resolution),
            FlightOutcome::Failed {
                kind,
                message,
                service,
            } => {
                let err = Error::new(kind, message);
                Err(match service {
                    Some(service) => err.with_source(service),
                    None => err,
                })
            }
        }
    }
}

/// Lookup in flight for one key.
#[derive(Debug)]
struct Flight {
    done: watch::Receiver<Option<FlightOutcome>>,
}

/// Held by the caller performing the lookup.
///
/// Dropping it unregisters the flight, so a cancelled lookup lets waiters retry.
struct FlightLeader<'a> {
    inflight: &'a Mutex<HashMap<EndpointKey, Arc<Flight>>>,
    key: EndpointKey,
    flight: Arc<Flight>,
    tx: watch::Sender<Option<FlightOutcome>>,
}

impl FlightLeader<'_> {
    fn finish(self, result: &Result<Resolution>) {
        self.unregister();
        let _ = self.tx.send(Some(FlightOutcome::new(result)));
    }

    fn unregister(&self) {
        let mut inflight = self.inflight.lock().expect("lock poisoned");
        if inflight
            .get(&self.key)
            .is_some_and(|flight| Arc::ptr_eq(flight, &self.flight))
        {
            inflight.remove(&self.key);
        }
    }
}

impl Drop for FlightLeader<'_> {
    fn drop(&mut self) {
        self.unregister();
    }
}

enum Role<'a> {
    Lead(FlightLeader<'a>),
    Wait(watch::Receiver<Option<FlightOutcome>>),
}

/// EndpointResolver resolves endpoints through the location service.
///
/// Share one resolver per client: all results and rejected codes are remembered
/// for the lifetime of the resolver. At most one location service call per key
/// is in flight, concurrent callers for the same key wait for it and observe its
/// outcome, errors included.
#[derive(Debug)]
pub struct EndpointResolver {
    describer: Arc<dyn DescribeEndpoint>,
    location_endpoint: String,

    cache: EndpointCache,
    inflight: Mutex<HashMap<EndpointKey, Arc<Flight>>>,
}

impl EndpointResolver {
    /// Create a new resolver calling given describer.
    pub fn new(describer: impl DescribeEndpoint) -> Self {
        Self {
            describer: Arc::new(describer),
            location_endpoint: DEFAULT_LOCATION_SERVICE_ENDPOINT.to_string(),
            cache: EndpointCache::new(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Use given location service host.
    pub fn with_location_endpoint(mut self, endpoint: &str) -> Self {
        self.location_endpoint = endpoint.to_string();
        self
    }

    /// The location service host.
    pub fn location_endpoint(&self) -> &str {
        &self.location_endpoint
    }

    /// The cache owned by this resolver.
    pub fn cache(&self) -> &EndpointCache {
        &self.cache
    }

    /// Resolve the endpoint for this request.
    ///
    /// Rejections of the region or product are remembered and reported as
    /// [`Resolution::NotFound`]. Every other error is returned as is and not
    /// remembered.
    pub async fn resolve(&self, req: &ResolveEndpointRequest) -> Result<Resolution> {
        let Some(code) = location_service_code(req) else {
            return Ok(Resolution::Skipped);
        };
        if self.is_rejected(req) {
            return Ok(Resolution::NotFound);
        }

        let key = EndpointKey::new(&req.product_code, code, &req.region_id, &req.endpoint_type);
        loop {
            if let Some(entry) = self.cache.lookup(&key) {
                debug!("endpoint cache hit for {key}: {entry:?}");
                return Ok(entry.into());
            }

            match self.join_flight(&key) {
                Role::Lead(leader) => {
                    // A previous flight may have finished between the lookup and joining.
                    if let Some(entry) = self.cache.lookup(&key) {
                        return Ok(entry.into());
                    }
                    if self.is_rejected(req) {
                        return Ok(Resolution::NotFound);
                    }

                    debug!("endpoint cache miss for {key}, calling location service");
                    let result = self.describe(key.clone(), req, code).await;
                    leader.finish(&result);
                    return result;
                }
                Role::Wait(mut done) => {
                    debug!("endpoint lookup for {key} in flight, waiting");
                    let outcome = match done.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome.clone(),
                        Err(_) => None,
                    };
                    if let Some(outcome) = outcome {
                        return outcome.into_result();
                    }
                    // The leader was cancelled before finishing.
                    if self.is_rejected(req) {
                        return Ok(Resolution::NotFound);
                    }
                }
            }
        }
    }

    /// Check that the product of this request has not been rejected.
    ///
    /// Returns `false` for requests without a location service code.
    pub fn is_product_code_valid(&self, req: &ResolveEndpointRequest) -> bool {
        location_service_code(req).is_some() && self.cache.is_product_valid(&req.product_code)
    }

    /// Check that the region of this request has not been rejected.
    ///
    /// Returns `false` for requests without a location service code.
    pub fn is_region_id_valid(&self, req: &ResolveEndpointRequest) -> bool {
        location_service_code(req).is_some() && self.cache.is_region_valid(&req.region_id)
    }

    fn is_rejected(&self, req: &ResolveEndpointRequest) -> bool {
        if !self.cache.is_product_valid(&req.product_code) {
            debug!("product {} has been rejected before", req.product_code);
            return true;
        }
        if !self.cache.is_region_valid(&req.region_id) {
            debug!("region {} has been rejected before", req.region_id);
            return true;
        }
        false
    }

    fn join_flight(&self, key: &EndpointKey) -> Role<'_> {
        let mut inflight = self.inflight.lock().expect("lock poisoned");
        if let Some(flight) = inflight.get(key) {
            return Role::Wait(flight.done.clone());
        }

        let (tx, done) = watch::channel(None);
        let flight = Arc::new(Flight { done });
        inflight.insert(key.clone(), flight.clone());
        Role::Lead(FlightLeader {
            inflight: &self.inflight,
            key: key.clone(),
            flight,
            tx,
        })
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.lock().expect("lock poisoned").len()
    }

    async fn describe(
        &self,
        key: EndpointKey,
        req: &ResolveEndpointRequest,
        code: &str,
    ) -> Result<Resolution> {
        let describe_req = DescribeEndpointRequest {
            region_id: req.region_id.clone(),
            endpoint_type: req.endpoint_type.clone(),
            location_service_code: code.to_string(),
            location_endpoint: self.location_endpoint.clone(),
        };

        let resp = match self.describer.describe_endpoint(&describe_req).await {
            Ok(resp) => resp,
            Err(err) => {
                if let Some(service_err) = err.source_as::<ServiceError>() {
                    if service_err.is_invalid_region() {
                        warn!("region {} does not exist, remembering it", req.region_id);
                        self.cache.mark_region_invalid(&req.region_id);
                        self.cache.store(key, None);
                        return Ok(Resolution::NotFound);
                    }
                    if service_err.is_illegal_parameter() {
                        warn!(
                            "product {} is unknown to location service, remembering it",
                            req.product_code
                        );
                        self.cache.mark_product_invalid(&req.product_code);
                        self.cache.store(key, None);
                        return Ok(Resolution::NotFound);
                    }
                }
                return Err(err);
            }
        };

        self.cache.mark_product_valid(&req.product_code);
        self.cache.mark_region_valid(&req.region_id);

        let endpoint = resp
            .endpoints
            .endpoint
            .into_iter()
            .find(|item| {
                item.service_code().is_some()
                    && item.endpoint_type.as_deref() == Some(req.endpoint_type.as_str())
            })
            .and_then(|item| item.endpoint);
        debug!("location service resolved {key} to {endpoint:?}");

        self.cache.store(key, endpoint.clone());
        Ok(endpoint.map_or(Resolution::NotFound, Resolution::Found))
    }
}

fn location_service_code(req: &ResolveEndpointRequest) -> Option<&str> {
    req.location_service_code
        .as_deref()
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{DescribeEndpointsResponse, EndpointItem, Endpoints};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    enum Outcome {
        Endpoints(Vec<EndpointItem>),
        Reject(&'static str, &'static str),
        Fail,
    }

    #[derive(Debug)]
    struct MockDescriber {
        outcome: Outcome,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl MockDescriber {
        fn new(outcome: Outcome) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    outcome,
                    delay: None,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl DescribeEndpoint for MockDescriber {
        async fn describe_endpoint(
            &self,
            _: &DescribeEndpointRequest,
        ) -> Result<DescribeEndpointsResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match &self.outcome {
                Outcome::Endpoints(items) => Ok(DescribeEndpointsResponse {
                    endpoints: Endpoints {
                        endpoint: items.clone(),
                    },
                    ..Default::default()
                }),
                Outcome::Reject(code, message) => Err(ServiceError::new(400, code, message).into()),
                Outcome::Fail => Err(Error::unexpected("connection reset")),
            }
        }
    }

    fn item(endpoint: &str, endpoint_type: &str) -> EndpointItem {
        EndpointItem {
            endpoint: Some(endpoint.to_string()),
            endpoint_type: Some(endpoint_type.to_string()),
            service_code: Some("ecs".to_string()),
            ..Default::default()
        }
    }

    fn request(product: &str, region: &str) -> ResolveEndpointRequest {
        ResolveEndpointRequest::new(product, region).with_location_service_code("ecs")
    }

    #[tokio::test]
    async fn test_resolve_skipped_without_location_service_code() {
        let (describer, calls) = MockDescriber::new(Outcome::Fail);
        let resolver = EndpointResolver::new(describer);

        let req = ResolveEndpointRequest::new("Ecs", "cn-hangzhou");
        assert_eq!(resolver.resolve(&req).await.unwrap(), Resolution::Skipped);
        let req = req.with_location_service_code("");
        assert_eq!(resolver.resolve(&req).await.unwrap(), Resolution::Skipped);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!resolver.is_product_code_valid(&req));
        assert!(!resolver.is_region_id_valid(&req));
    }

    #[tokio::test]
    async fn test_resolve_found_and_normalized() {
        let _ = env_logger::builder().is_test(true).try_init();

        let (describer, calls) = MockDescriber::new(Outcome::Endpoints(vec![
            item("ecs-inner.aliyuncs.com", "innerAPI"),
            item("ecs.cn-hangzhou.aliyuncs.com", "openAPI"),
        ]));
        let resolver = EndpointResolver::new(describer);

        let first = resolver.resolve(&request("ECS", "CN-Hangzhou")).await.unwrap();
        let second = resolver.resolve(&request("ecs", "cn-hangzhou")).await.unwrap();

        assert_eq!(
            first,
            Resolution::Found("ecs.cn-hangzhou.aliyuncs.com".to_string())
        );
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resolver.cache().is_product_confirmed("ecs"));
        assert!(resolver.cache().is_region_confirmed("cn-hangzhou"));
    }

    #[tokio::test]
    async fn test_resolve_not_found_is_remembered() {
        let (describer, calls) =
            MockDescriber::new(Outcome::Endpoints(vec![item("ecs-inner.aliyuncs.com", "innerAPI")]));
        let resolver = EndpointResolver::new(describer);
        let req = request("Ecs", "cn-hangzhou");

        assert_eq!(resolver.resolve(&req).await.unwrap(), Resolution::NotFound);
        assert_eq!(resolver.resolve(&req).await.unwrap(), Resolution::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A missing endpoint type doesn't make the codes invalid.
        assert!(resolver.is_product_code_valid(&req));
        assert!(resolver.is_region_id_valid(&req));
    }

    #[tokio::test]
    async fn test_resolve_serivce_code_spelling() {
        let (describer, _) = MockDescriber::new(Outcome::Endpoints(vec![
            EndpointItem {
                endpoint: Some("no-code.aliyuncs.com".to_string()),
                endpoint_type: Some("openAPI".to_string()),
                ..Default::default()
            },
            EndpointItem {
                endpoint: Some("ecs.cn-hangzhou.aliyuncs.com".to_string()),
                endpoint_type: Some("openAPI".to_string()),
                serivce_code: Some("ecs".to_string()),
                ..Default::default()
            },
        ]));
        let resolver = EndpointResolver::new(describer);

        let resolution = resolver.resolve(&request("Ecs", "cn-hangzhou")).await.unwrap();
        assert_eq!(resolution.endpoint(), Some("ecs.cn-hangzhou.aliyuncs.com"));
    }

    #[tokio::test]
    async fn test_resolve_invalid_region() {
        let _ = env_logger::builder().is_test(true).try_init();

        let (describer, calls) = MockDescriber::new(Outcome::Reject(
            "InvalidRegionId",
            "The specified region does not exist.",
        ));
        let resolver = EndpointResolver::new(describer);

        let req = request("Ecs", "cn-nowhere");
        assert_eq!(resolver.resolve(&req).await.unwrap(), Resolution::NotFound);
        assert!(!resolver.is_region_id_valid(&req));
        assert!(resolver.is_product_code_valid(&req));

        // Other products in the same region never reach the location service.
        let other = request("Rds", "CN-Nowhere");
        assert_eq!(resolver.resolve(&other).await.unwrap(), Resolution::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_illegal_product() {
        let (describer, calls) = MockDescriber::new(Outcome::Reject(
            "Illegal Parameter",
            "Please check the parameters",
        ));
        let resolver = EndpointResolver::new(describer);

        let req = request("NoSuchProduct", "cn-hangzhou");
        assert_eq!(resolver.resolve(&req).await.unwrap(), Resolution::NotFound);
        assert!(!resolver.is_product_code_valid(&req));
        assert!(resolver.is_region_id_valid(&req));

        let other = request("NoSuchProduct", "cn-beijing");
        assert_eq!(resolver.resolve(&other).await.unwrap(), Resolution::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_other_errors_are_not_remembered() {
        let (describer, calls) = MockDescriber::new(Outcome::Fail);
        let resolver = EndpointResolver::new(describer);
        let req = request("Ecs", "cn-hangzhou");

        let err = resolver.resolve(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(err.message(), "connection reset");
        assert!(resolver.resolve(&req).await.is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(resolver.cache().is_empty());
        assert!(resolver.is_region_id_valid(&req));
    }

    #[tokio::test]
    async fn test_resolve_unrecognized_rejection_propagates() {
        let (describer, calls) = MockDescriber::new(Outcome::Reject(
            "InvalidRegionId",
            "Some other message.",
        ));
        let resolver = EndpointResolver::new(describer);
        let req = request("Ecs", "cn-hangzhou");

        let err = resolver.resolve(&req).await.unwrap_err();
        assert_eq!(
            err.source_as::<ServiceError>().map(|e| e.code.as_str()),
            Some("InvalidRegionId")
        );
        assert!(resolver.resolve(&req).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(resolver.is_region_id_valid(&req));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolve_concurrent_single_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Arc::new(EndpointResolver::new(MockDescriber {
            outcome: Outcome::Endpoints(vec![item("ecs.cn-hangzhou.aliyuncs.com", "openAPI")]),
            delay: Some(Duration::from_millis(50)),
            calls: calls.clone(),
        }));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let resolver = resolver.clone();
            tasks.push(tokio::spawn(async move {
                resolver.resolve(&request("Ecs", "cn-hangzhou")).await
            }));
        }

        for task in tasks {
            assert_eq!(
                task.await.unwrap().unwrap(),
                Resolution::Found("ecs.cn-hangzhou.aliyuncs.com".to_string())
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.inflight_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolve_concurrent_failure_is_shared() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Arc::new(EndpointResolver::new(MockDescriber {
            outcome: Outcome::Fail,
            delay: Some(Duration::from_millis(50)),
            calls: calls.clone(),
        }));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let resolver = resolver.clone();
            tasks.push(tokio::spawn(async move {
                resolver.resolve(&request("Ecs", "cn-hangzhou")).await
            }));
        }

        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unexpected);
            assert_eq!(err.message(), "connection reset");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.inflight_len(), 0);
        assert!(resolver.cache().is_empty());

        // The failure is not remembered, the next caller asks again.
        assert!(resolver.resolve(&request("Ecs", "cn-hangzhou")).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.inflight_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolve_concurrent_rejection_keeps_service_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Arc::new(EndpointResolver::new(MockDescriber {
            outcome: Outcome::Reject("Throttling", "Request was denied due to flow control."),
            delay: Some(Duration::from_millis(50)),
            calls: calls.clone(),
        }));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let resolver = resolver.clone();
            tasks.push(tokio::spawn(async move {
                resolver.resolve(&request("Ecs", "cn-hangzhou")).await
            }));
        }

        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert_eq!(
                err.source_as::<ServiceError>().map(|e| e.code.as_str()),
                Some("Throttling")
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_cancelled_lookup_is_unregistered() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = EndpointResolver::new(MockDescriber {
            outcome: Outcome::Endpoints(vec![item("ecs.cn-hangzhou.aliyuncs.com", "openAPI")]),
            delay: Some(Duration::from_millis(200)),
            calls: calls.clone(),
        });
        let req = request("Ecs", "cn-hangzhou");

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), resolver.resolve(&req)).await;
        assert!(cancelled.is_err());
        assert_eq!(resolver.inflight_len(), 0);

        let resolution = resolver.resolve(&req).await.unwrap();
        assert_eq!(resolution.endpoint(), Some("ecs.cn-hangzhou.aliyuncs.com"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.inflight_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolve_concurrent_keys_are_independent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Arc::new(EndpointResolver::new(MockDescriber {
            outcome: Outcome::Endpoints(vec![item("ecs.aliyuncs.com", "openAPI")]),
            delay: Some(Duration::from_millis(20)),
            calls: calls.clone(),
        }));

        let regions = ["cn-hangzhou", "cn-beijing", "cn-shanghai"];
        let mut tasks = Vec::new();
        for region in regions {
            for _ in 0..4 {
                let resolver = resolver.clone();
                tasks.push(tokio::spawn(async move {
                    resolver.resolve(&request("Ecs", region)).await
                }));
            }
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap().endpoint().is_some());
        }

        assert_eq!(calls.load(Ordering::SeqCst), regions.len());
        assert_eq!(resolver.cache().len(), regions.len());
    }
}
