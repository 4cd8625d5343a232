//! Outcome of a request and its one wire representation.

use axum::body::{boxed, Full};
use axum::http::header::{HeaderName, ACCESS_CONTROL_ALLOW_HEADERS, ALLOW, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const ALLOWED_METHODS: &str = "POST, GET";
pub const PREFLIGHT_HEADERS: &str =
    "Content-Type, Accept, Accept-Encoding, Content-Length, Host, Origin, User-Agent, Referer";
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

pub const USAGE: &str = "Provide this URL with application/x-www-form-urlencoded POST data containing: \n \
 - bytes: The number of bytes of the NuBits transaction.\n \
 - amount: The total output amount of the transaction. Formatted as a coin decimal (4 decimal places).\n\
\n\
The server will respond with the coin amount of the required NuBits fee.";

/// Every way a request can end.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// CORS preflight answer
    Preflight,
    /// Usage text for GET
    Usage,
    MethodNotAllowed,
    UnsupportedMediaType,
    NotAcceptable,
    /// Body missing fields or not parseable
    BadRequest,
    /// Resolved fee
    Fee(f64),
    /// The daemon reported an error; its message is passed through.
    UpstreamFailure(String),
    /// Anything the handler did not anticipate (transport failure, malformed reply).
    InternalError,
}

impl Outcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Preflight | Outcome::Usage | Outcome::Fee(_) => StatusCode::OK,
            Outcome::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Outcome::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Outcome::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Outcome::BadRequest => StatusCode::BAD_REQUEST,
            Outcome::UpstreamFailure(_) | Outcome::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn headers(&self) -> Vec<(HeaderName, &'static str)> {
        match self {
            Outcome::Preflight => vec![(ALLOW, ALLOWED_METHODS), (ACCESS_CONTROL_ALLOW_HEADERS, PREFLIGHT_HEADERS)],
            Outcome::MethodNotAllowed => vec![(ALLOW, ALLOWED_METHODS)],
            Outcome::Usage | Outcome::Fee(_) => vec![(CONTENT_TYPE, "text/plain")],
            _ => Vec::new(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Outcome::Usage => USAGE.to_string(),
            Outcome::Fee(fee) => fee.to_string(),
            Outcome::UpstreamFailure(message) => message.clone(),
            Outcome::InternalError => INTERNAL_ERROR_BODY.to_string(),
            _ => String::new(),
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let mut response = Response::new(boxed(Full::from(self.body())));
        *response.status_mut() = self.status();
        let headers = response.headers_mut();
        for (name, value) in self.headers() {
            headers.insert(name, HeaderValue::from_static(value));
        }
        response
    }
}
