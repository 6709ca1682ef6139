//! # Span Attribute Keys
//!
//! The attribute keys emitted on outbound request spans. These are a stable
//! contract for downstream consumers; collector schemas key off the literal
//! strings, so renaming one is a breaking change.

/// The HTTP request method (`"GET"`, `"POST"`, …).
pub const HTTP_METHOD: &str = "httpMethod";

/// The full request URL as passed to the client.
pub const HTTP_URL: &str = "httpUrl";

/// Host component of the request URL. Omitted when the URL carries no
/// authority.
pub const HTTP_HOST: &str = "httpHost";

/// Path component of the request URL.
pub const HTTP_PATH: &str = "httpPath";

/// Serialized request body. Text bodies longer than 2048 characters are
/// truncated; non-textual bodies are recorded as placeholders. Omitted when
/// the request has no body.
pub const HTTP_REQUEST_BODY: &str = "httpRequestBody";

/// Classification of the request body (`"json"`, `"string"`, `"formdata"`,
/// `"urlencoded"`, `"arraybuffer"`, `"blob"`, …). Omitted when the request
/// has no body.
pub const HTTP_REQUEST_BODY_TYPE: &str = "httpRequestBodyType";

/// Query string of a GET request, including the leading `?`. Omitted for
/// other methods and for URLs without a query.
pub const HTTP_QUERY_PARAMS: &str = "httpQueryParams";

/// Numeric response status code. On transport failure this is the status
/// carried by the error, or 500 when it carries none.
pub const HTTP_STATUS_CODE: &str = "httpStatusCode";

/// Serialized response body for JSON and textual responses. Omitted for
/// binary or unclassified content types.
pub const HTTP_RESPONSE: &str = "httpResponse";

/// Classification of the response body (`"json"`, `"text"`, `"unknown"`).
/// Omitted whenever [`HTTP_RESPONSE`] is.
pub const HTTP_RESPONSE_TYPE: &str = "httpResponseType";

/// Message of the error returned by the underlying client when a request
/// fails. Only present on failed calls.
pub const HTTP_ERROR: &str = "httpError";
