//! Request and response body classification.
//!
//! Pure functions that turn a payload into the pair of span attribute values
//! (serialized body + type tag) recorded on a request span. Classification
//! never fails outward: malformed or unreadable payloads degrade to fallback
//! classifications so tracing can never alter the outcome of the call being
//! traced.

use std::borrow::Cow;

use bytes::Bytes;
use http::{header::CONTENT_TYPE, Response, Uri};

/// Maximum number of characters of a textual body recorded on a span.
const MAX_RECORDED_CHARS: usize = 2048;

/// Suffix appended to a recorded body that was cut at [`MAX_RECORDED_CHARS`].
const TRUNCATION_SUFFIX: &str = "...[truncated]";

const UNHANDLED_BODY: &str = "[unhandled body type]";
const UNREADABLE_RESPONSE: &str = "[unreadable response body]";

/// Payload shapes the instrumented client knows how to describe.
///
/// Classification matches on the variant rather than sniffing bytes, so the
/// set of cases is closed and checked by the compiler.
#[derive(Clone, Debug, Default)]
pub enum RequestPayload {
    /// No request body.
    #[default]
    Empty,
    /// A textual body; recorded verbatim (truncated past 2048 characters)
    /// and typed `json` or `string` depending on whether it parses.
    Text(String),
    /// Multipart form fields; recorded as a placeholder, never the fields.
    Form(Vec<(String, String)>),
    /// An `application/x-www-form-urlencoded` body; recorded as a
    /// placeholder.
    UrlEncoded(String),
    /// Raw bytes; recorded as a placeholder.
    Binary(Bytes),
    /// Typed binary data; the placeholder embeds the declared MIME type.
    Blob {
        /// Declared MIME type of the data.
        media_type: String,
        /// The data itself. Never recorded.
        data: Bytes,
    },
    /// A payload the caller could not express with the variants above. The
    /// recorded type is the payload's runtime type name.
    Unknown {
        /// Runtime type name of the original payload.
        type_name: Cow<'static, str>,
    },
}

impl RequestPayload {
    /// An [`Unknown`](RequestPayload::Unknown) payload tagged with the
    /// runtime type name of `T`.
    pub fn unknown_of<T: ?Sized>() -> Self {
        RequestPayload::Unknown {
            type_name: Cow::Borrowed(std::any::type_name::<T>()),
        }
    }
}

impl From<String> for RequestPayload {
    fn from(text: String) -> Self {
        RequestPayload::Text(text)
    }
}

impl From<&str> for RequestPayload {
    fn from(text: &str) -> Self {
        RequestPayload::Text(text.to_owned())
    }
}

/// A classified body: the serialized form recorded on the span and its type
/// tag. `None` fields produce no span attribute at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifiedBody {
    /// Serialized (possibly truncated or placeholder) body text.
    pub body: Option<String>,
    /// Type tag for the body (`json`, `string`, `formdata`, …).
    pub body_type: Option<Cow<'static, str>>,
}

impl ClassifiedBody {
    fn new(body: String, body_type: impl Into<Cow<'static, str>>) -> Self {
        ClassifiedBody {
            body: Some(body),
            body_type: Some(body_type.into()),
        }
    }
}

/// Describes a request payload for span attributes.
///
/// Textual bodies are recorded (truncated at 2048 characters); every other
/// shape is recorded as a fixed placeholder rather than its raw bytes. An
/// empty payload yields no attributes.
pub fn classify_request_body(payload: &RequestPayload) -> ClassifiedBody {
    match payload {
        RequestPayload::Empty => ClassifiedBody::default(),
        RequestPayload::Text(text) => {
            let body_type = if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                "json"
            } else {
                "string"
            };
            ClassifiedBody::new(truncate(text), body_type)
        }
        RequestPayload::Form(_) => ClassifiedBody::new("[form data]".to_owned(), "formdata"),
        RequestPayload::UrlEncoded(_) => {
            ClassifiedBody::new("[url-encoded form data]".to_owned(), "urlencoded")
        }
        RequestPayload::Binary(_) => ClassifiedBody::new("[binary data]".to_owned(), "arraybuffer"),
        RequestPayload::Blob { media_type, .. } => {
            ClassifiedBody::new(format!("[blob data, type: {media_type}]"), "blob")
        }
        RequestPayload::Unknown { type_name } => {
            ClassifiedBody::new(UNHANDLED_BODY.to_owned(), type_name.clone())
        }
    }
}

/// Describes a response body for span attributes.
///
/// Works on a clone of the collected body bytes, so the response handed back
/// to the caller remains fully readable. JSON responses are re-serialized,
/// `text/*` responses recorded as text, anything else is skipped. A declared
/// content type that fails to parse falls back to plain text, and a body
/// that is not valid text at all is recorded as a sentinel; no failure here
/// escapes to the caller.
pub fn classify_response_body(response: &Response<Bytes>) -> ClassifiedBody {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let bytes = response.body().clone();

    if content_type.starts_with("application/json") {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            if let Ok(body) = serde_json::to_string(&value) {
                return ClassifiedBody::new(body, "json");
            }
        }
        read_as_text(&bytes)
    } else if content_type.starts_with("text/") {
        read_as_text(&bytes)
    } else {
        ClassifiedBody::default()
    }
}

fn read_as_text(bytes: &Bytes) -> ClassifiedBody {
    match std::str::from_utf8(bytes) {
        Ok(text) => ClassifiedBody::new(text.to_owned(), "text"),
        Err(_) => ClassifiedBody::new(UNREADABLE_RESPONSE.to_owned(), "unknown"),
    }
}

/// The query component of a URI, including the leading `?`.
///
/// Relative URIs keep their query; there is no ambient origin to resolve
/// them against. Only consulted for GET requests.
pub fn query_string(uri: &Uri) -> Option<String> {
    uri.query().map(|query| format!("?{query}"))
}

fn truncate(text: &str) -> String {
    // char-indexed rather than byte-indexed so multi-byte text is never
    // split mid-character
    match text.char_indices().nth(MAX_RECORDED_CHARS) {
        Some((cut, _)) => {
            let mut body = String::with_capacity(cut + TRUNCATION_SUFFIX.len());
            body.push_str(&text[..cut]);
            body.push_str(TRUNCATION_SUFFIX);
            body
        }
        None => text.to_owned(),
    }
}
