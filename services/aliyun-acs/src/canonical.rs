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

//! Canonical strings for the RPC and ROA conventions.
//!
//! Everything in this module is a pure function of its inputs.

use crate::constants::{CONTENT_MD5, PATH_SEGMENT_ENCODE_SET, X_ACS_PREFIX};
use acsign_core::Result;
use http::header::{ACCEPT, CONTENT_TYPE, DATE};
use http::{HeaderMap, Method};
use percent_encoding::utf8_percent_encode;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Turn form encoding into RFC 3986 style encoding.
fn fixup(s: &str) -> String {
    s.replace('+', "%20").replace('*', "%2A").replace("%7E", "~")
}

/// Encode a single query component.
pub fn encode_component(s: &str) -> String {
    fixup(&form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>())
}

/// Form-encode `k=v` pairs joined by `&`, in iteration order.
pub fn form_encode<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut s = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        s.append_pair(k, v);
    }
    fixup(&s.finish())
}

/// Encode query pairs, emitting a bare key for absent values.
pub fn encode_query(pairs: &[(String, Option<String>)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| match v {
            Some(v) => format!("{}={}", encode_component(k), encode_component(v)),
            None => encode_component(k),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the RPC canonical query: sorted, form encoded, then encoded again as a path segment.
pub fn rpc_canonical_query(params: &BTreeMap<String, String>) -> String {
    let query = form_encode(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    fixup(&utf8_percent_encode(&query, &PATH_SEGMENT_ENCODE_SET).to_string())
}

/// Build the RPC string to sign.
///
/// ```text
/// METHOD&%2F&<canonical query>
/// ```
pub fn rpc_string_to_sign(method: &Method, params: &BTreeMap<String, String>) -> String {
    format!("{}&%2F&{}", method.as_str(), rpc_canonical_query(params))
}

/// Replace each `[key]` placeholder with its value.
///
/// Placeholders without a value are left untouched.
pub fn resolve_uri_pattern(pattern: &str, path_params: &BTreeMap<String, String>) -> String {
    let mut uri = pattern.to_string();
    for (k, v) in path_params {
        uri = uri.replace(&format!("[{k}]"), v);
    }
    uri
}

/// Build the ROA canonical headers.
///
/// Headers whose name contains `x-acs-`, lowercased, sorted, and each followed by `\n`.
/// Repeated headers are joined with `,` in insertion order.
pub fn roa_canonical_headers(headers: &HeaderMap) -> Result<String> {
    let mut selected = BTreeMap::new();
    for name in headers.keys() {
        // HeaderName is always lowercase.
        if name.as_str().contains(X_ACS_PREFIX) {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| v.to_str())
                .collect::<std::result::Result<Vec<_>, _>>()?;
            selected.insert(name.as_str(), values.join(","));
        }
    }

    let mut s = String::new();
    for (k, v) in selected {
        writeln!(&mut s, "{k}:{v}")?;
    }
    Ok(s)
}

/// Build the ROA canonical resource.
///
/// The part after the first `?` in `uri` is kept as a key without value, then merged
/// with `queries` and sorted.
pub fn roa_canonical_resource(uri: &str, queries: &[(String, Option<String>)]) -> String {
    let mut params: BTreeMap<&str, Option<&str>> = queries
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_deref()))
        .collect();

    let path = match uri.split_once('?') {
        Some((path, fragment)) => {
            params.insert(fragment, None);
            path
        }
        None => uri,
    };

    if params.is_empty() {
        return path.to_string();
    }

    let query = params
        .into_iter()
        .map(|(k, v)| match v {
            Some(v) => format!("{k}={v}"),
            None => k.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}

/// Build the ROA string to sign.
///
/// ```text
/// METHOD
/// Accept
/// Content-MD5
/// Content-Type
/// Date
/// <canonical headers><canonical resource>
/// ```
pub fn roa_string_to_sign(
    method: &Method,
    headers: &HeaderMap,
    uri: &str,
    queries: &[(String, Option<String>)],
) -> Result<String> {
    let mut s = String::new();
    writeln!(&mut s, "{}", method.as_str().to_uppercase())?;
    for name in [ACCEPT.as_str(), CONTENT_MD5, CONTENT_TYPE.as_str(), DATE.as_str()] {
        if let Some(v) = headers.get(name) {
            s.push_str(v.to_str()?);
        }
        s.push('\n');
    }
    s.push_str(&roa_canonical_headers(headers)?);
    s.push_str(&roa_canonical_resource(uri, queries));
    Ok(s)
}
