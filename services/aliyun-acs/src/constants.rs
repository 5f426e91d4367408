// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Env values used in aliyun services.
pub const ALIBABA_CLOUD_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ALIBABA_CLOUD_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const ALIBABA_CLOUD_SECURITY_TOKEN: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
pub const ALIBABA_CLOUD_BEARER_TOKEN: &str = "ALIBABA_CLOUD_BEARER_TOKEN";
pub const ALIBABA_CLOUD_REGION_ID: &str = "ALIBABA_CLOUD_REGION_ID";
pub const ALIBABA_CLOUD_SIGNATURE_METHOD: &str = "ALIBABA_CLOUD_SIGNATURE_METHOD";
pub const ALIBABA_CLOUD_LOCATION_ENDPOINT: &str = "ALIBABA_CLOUD_LOCATION_ENDPOINT";

// Headers used in ROA signing.
pub const X_ACS_PREFIX: &str = "x-acs-";
pub const X_ACS_VERSION: &str = "x-acs-version";
pub const X_ACS_REGION_ID: &str = "x-acs-region-id";
pub const X_ACS_SECURITY_TOKEN: &str = "x-acs-security-token";
pub const X_ACS_BEARER_TOKEN: &str = "x-acs-bearer-token";
pub const X_ACS_SIGNATURE_METHOD: &str = "x-acs-signature-method";
pub const X_ACS_SIGNATURE_VERSION: &str = "x-acs-signature-version";
pub const CONTENT_MD5: &str = "content-md5";

// Query parameters used in RPC signing.
pub const RPC_FORMAT: &str = "JSON";

// Location service.
pub const DEFAULT_LOCATION_SERVICE_ENDPOINT: &str = "location-readonly.aliyuncs.com";
pub const LOCATION_SERVICE_PRODUCT: &str = "Location";
pub const LOCATION_SERVICE_VERSION: &str = "2015-06-12";
pub const LOCATION_SERVICE_DESCRIBE_ENDPOINTS: &str = "DescribeEndpoints";
pub const DEFAULT_ENDPOINT_TYPE: &str = "openAPI";

// Rejections from the location service that are remembered for the process lifetime.
pub const INVALID_REGION_ID_CODE: &str = "InvalidRegionId";
pub const INVALID_REGION_ID_MESSAGE: &str = "The specified region does not exist.";
pub const ILLEGAL_PARAMETER_CODE: &str = "Illegal Parameter";
pub const ILLEGAL_PARAMETER_MESSAGE: &str = "Please check the parameters";

/// Characters percent-encoded when a canonical query is encoded as a path segment.
///
/// Everything except RFC 3986 unreserved characters and `/`.
pub static PATH_SEGMENT_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');
