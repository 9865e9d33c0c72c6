//! Proxy utility functions.
//!
//! This module contains helper functions for request processing:
//! - Query parameter parsing
//! - Client IP detection (X-Forwarded-For aware)

use std::collections::HashMap;

use pingora_http::RequestHeader;
use pingora_proxy::Session;

/// Extract query parameters from URI.
///
/// See [`parse_query`] for the decoding rules.
pub fn extract_query_params(req: &RequestHeader) -> HashMap<String, String> {
    req.uri.query().map(parse_query).unwrap_or_default()
}

/// Parse a raw query string into key-value pairs.
///
/// Pairs are split on `&` and then on the first `=`. Keys and values are
/// URL-decoded with `+` read as a space. A key without `=` gets an empty
/// value, and for repeated keys the first occurrence wins. Undecodable
/// values become empty.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }

    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).unwrap_or_default().into_owned()
}

/// Extract client IP address from session (X-Forwarded-For aware).
///
/// Checks X-Forwarded-For header first (for proxies/load balancers),
/// then falls back to direct connection IP from session.
///
/// # X-Forwarded-For handling
///
/// The header can contain multiple IPs: `"client, proxy1, proxy2"`.
/// The first IP is the original client, which is what we return.
pub fn get_client_ip(session: &Session) -> String {
    if let Some(forwarded_for) = session
        .req_header()
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(client_ip) = forwarded_for.split(',').next() {
            return client_ip.trim().to_string();
        }
    }

    session
        .client_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
