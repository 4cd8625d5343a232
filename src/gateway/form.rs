//! Strict `application/x-www-form-urlencoded` parsing into a `FeeRequest`.

use thiserror::Error;
use url::form_urlencoded;

/// Validated fee query. Built only from a complete, well-formed body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeRequest {
    /// Transaction size in bytes
    pub byte_size: u64,
    /// Total output amount
    pub amount: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("malformed form field: {0:?}")]
    MalformedField(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

impl FeeRequest {
    /// Parse a POST body. Needs non-empty `bytes` and `amount`; the first value of each wins.
    pub fn from_form(body: &[u8]) -> Result<Self, FormError> {
        let pairs = parse_strict(body)?;
        let first = |key: &'static str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim())
                .ok_or(FormError::MissingField(key))
        };

        let bytes = first("bytes")?;
        let amount = first("amount")?;

        let byte_size = bytes.parse::<u64>().map_err(|_| FormError::InvalidValue {
            field: "bytes",
            value: bytes.to_string(),
        })?;
        let amount = amount
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or_else(|| FormError::InvalidValue { field: "amount", value: amount.to_string() })?;

        Ok(Self { byte_size, amount })
    }
}

/// Every `&`-separated segment must be `name=value`; an empty segment or one without `=`
/// fails the whole body. Pairs with empty values are dropped.
fn parse_strict(body: &[u8]) -> Result<Vec<(String, String)>, FormError> {
    let mut pairs = Vec::new();
    for segment in body.split(|b| *b == b'&') {
        if !segment.contains(&b'=') {
            return Err(FormError::MalformedField(String::from_utf8_lossy(segment).into_owned()));
        }
        if let Some((key, value)) = form_urlencoded::parse(segment).next() {
            if !value.is_empty() {
                pairs.push((key.into_owned(), value.into_owned()));
            }
        }
    }
    Ok(pairs)
}
