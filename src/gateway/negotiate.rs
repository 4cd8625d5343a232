//! Method and content negotiation, evaluated before the body is touched.

use crate::gateway::reply::Outcome;

/// The only request body type accepted on POST.
pub const REQUEST_MIME: &str = "application/x-www-form-urlencoded";
/// The only response body type produced.
pub const RESPONSE_MIME: &str = "text/plain";

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Terminal: answer without reading the body.
    Respond(Outcome),
    /// POST passed every check; parse the body.
    ReadBody,
}

/// Ordered checks: method, then `Content-Type`, then `Accept`.
/// Absent headers are not checked.
pub fn negotiate(method: &str, content_type: Option<&str>, accept: Option<&str>) -> Decision {
    match method {
        "OPTIONS" => return Decision::Respond(Outcome::Preflight),
        "GET" => return Decision::Respond(Outcome::Usage),
        "POST" => {}
        _ => return Decision::Respond(Outcome::MethodNotAllowed),
    }

    if content_type.is_some_and(|ct| ct != REQUEST_MIME) {
        return Decision::Respond(Outcome::UnsupportedMediaType);
    }

    if accept.is_some_and(|header| !is_acceptable(header, RESPONSE_MIME)) {
        return Decision::Respond(Outcome::NotAcceptable);
    }

    Decision::ReadBody
}

/// MIME-range match of an `Accept` header value against `expect` (`type/subtype`).
/// Any comma-separated candidate equal to `*/*`, `type/*` or `expect` accepts.
pub fn is_acceptable(header: &str, expect: &str) -> bool {
    let major = expect.split('/').next().unwrap_or(expect);
    let range = format!("{}/*", major);

    header
        .split(',')
        .map(str::trim)
        .any(|mime| mime == "*/*" || mime == range || mime == expect)
}
