//! Common HTTP types used throughout the pipeline.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type flowing through the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type flowing through the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building plain and JSON responses.
pub trait ResponseExt {
    /// Creates a plain-text response with the given status and message.
    fn error(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON response with the given status.
    fn json(status: http::StatusCode, value: &serde_json::Value) -> Response;
}

impl ResponseExt for Response {
    fn error(status: http::StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build error response")
    }

    fn json(status: http::StatusCode, value: &serde_json::Value) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Full::new(Bytes::from(value.to_string())))
            .expect("failed to build json response")
    }
}
