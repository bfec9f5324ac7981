//! Transport-neutral HTTP endpoint.
//!
//! [`handle`] takes a method and a raw body and returns an [`HttpReply`]:
//! status, headers and body bytes. Framework integrations only translate
//! their request into these two inputs and the reply back out, so every
//! host (a serverless runtime adapter, the bundled Axum server, tests)
//! answers identically.
//!
//! # Responses
//!
//! | Request | Status | Body |
//! |---------|--------|------|
//! | `OPTIONS` | 200 | empty |
//! | not `POST` | 405 | `{"message":"Method not allowed"}` |
//! | bad body / URL | 400 | `{"message":...}` |
//! | failure | 500 | `{"message":"PDF generation failed","error":...}` |
//! | success | 200 | depends on [`DeliveryStrategy`] |
//!
//! Every reply carries the CORS headers in [`CORS_HEADERS`].

use base64::Engine;
use serde::Serialize;

use crate::config::DeliveryStrategy;
use crate::service::pdf::{InvocationContext, PdfConverter};
use crate::service::types::{
    ConversionOutcome, ConversionRequest, ConvertResponse, ErrorResponse, PdfServiceError,
};

/// CORS headers attached to every reply.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE"),
];

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_PDF: &str = "application/pdf";

/// A finished HTTP reply.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl HttpReply {
    fn new(status: u16) -> Self {
        Self {
            status,
            headers: CORS_HEADERS
                .iter()
                .map(|&(name, value)| (name, value.to_string()))
                .collect(),
            body: Vec::new(),
        }
    }

    /// Empty reply with CORS headers.
    pub fn empty(status: u16) -> Self {
        Self::new(status)
    }

    /// JSON reply with CORS headers.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header("Content-Type", CONTENT_TYPE_JSON)
                .with_body(body),
            Err(e) => {
                log::error!("❌ Failed to serialise response body: {}", e);
                Self::new(500)
                    .with_header("Content-Type", CONTENT_TYPE_JSON)
                    .with_body(br#"{"message":"PDF generation failed"}"#.to_vec())
            }
        }
    }

    /// PDF download reply.
    pub fn pdf(bytes: Vec<u8>, filename: &str) -> Self {
        Self::new(200)
            .with_header("Content-Type", CONTENT_TYPE_PDF)
            .with_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename.replace('"', "")),
            )
            .with_body(bytes)
    }

    pub fn with_header<V: Into<String>>(mut self, name: &'static str, value: V) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// First header named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Answer one request.
///
/// Blocking: on `POST` this runs the whole conversion.
pub fn handle(
    converter: &PdfConverter,
    method: &str,
    body: &[u8],
    ctx: &InvocationContext,
) -> HttpReply {
    match method.to_ascii_uppercase().as_str() {
        "OPTIONS" => {
            log::trace!("Answering CORS preflight");
            HttpReply::empty(200)
        }
        "POST" => {
            let result = parse_request(body)
                .and_then(|request| converter.convert(&request, ctx));

            match result {
                Ok(outcome) => success_reply(outcome, converter.config().delivery),
                Err(e) => error_reply(&e),
            }
        }
        other => error_reply(&PdfServiceError::MethodNotSupported(other.to_string())),
    }
}

/// Decode the POST body; an empty body means no URL was given.
fn parse_request(body: &[u8]) -> Result<ConversionRequest, PdfServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PdfServiceError::MissingTargets);
    }

    serde_json::from_slice(body).map_err(|e| PdfServiceError::MalformedBody(e.to_string()))
}

/// Shape a finished document for `delivery`.
pub fn success_reply(outcome: ConversionOutcome, delivery: DeliveryStrategy) -> HttpReply {
    match delivery {
        DeliveryStrategy::DirectBytes => {
            let mut reply = HttpReply::pdf(outcome.bytes, &outcome.filename);
            if let (Some(processed), Some(total)) = (outcome.processed_pages, outcome.total_pages) {
                reply = reply
                    .with_header("X-Processed-Pages", processed.to_string())
                    .with_header("X-Total-Pages", total.to_string());
            }
            reply
        }
        DeliveryStrategy::InlineBase64 => {
            let mut response = ConvertResponse::for_outcome(&outcome);
            response.pdf = Some(base64::engine::general_purpose::STANDARD.encode(&outcome.bytes));
            HttpReply::json(200, &response)
        }
        DeliveryStrategy::StorageUrl => {
            let mut response = ConvertResponse::for_outcome(&outcome);
            response.pdf_url = outcome.pdf_url;
            HttpReply::json(200, &response)
        }
    }
}

/// JSON error reply with the error's status.
pub fn error_reply(err: &PdfServiceError) -> HttpReply {
    HttpReply::json(err.status_code(), &ErrorResponse::from(err))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConverterConfig, ConverterConfigBuilder};
    use crate::factory::mock::{MockBrowserFactory, MockProbe};
    use crate::pool::BrowserPool;
    use crate::storage::MemoryBlobStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn converter_with(factory: MockBrowserFactory, config: ConverterConfig) -> (PdfConverter, MockProbe) {
        let probe = factory.probe();
        let pool = BrowserPool::builder()
            .factory(Box::new(factory))
            .build()
            .unwrap()
            .into_shared();
        (
            PdfConverter::new(pool, Arc::new(MemoryBlobStore::new()), config),
            probe,
        )
    }

    fn delivering(delivery: DeliveryStrategy) -> (PdfConverter, MockProbe) {
        let config = ConverterConfigBuilder::new().delivery(delivery).build().unwrap();
        converter_with(MockBrowserFactory::new(), config)
    }

    fn ctx() -> InvocationContext {
        InvocationContext::with_remaining(Duration::from_secs(10))
    }

    fn json(reply: &HttpReply) -> serde_json::Value {
        serde_json::from_slice(&reply.body).unwrap()
    }

    fn assert_cors(reply: &HttpReply) {
        assert_eq!(reply.header("access-control-allow-origin"), Some("*"));
        assert_eq!(reply.header("Access-Control-Allow-Headers"), Some("Content-Type"));
        assert_eq!(
            reply.header("Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE")
        );
    }

    #[test]
    fn test_options_never_renders() {
        let (converter, probe) = delivering(DeliveryStrategy::StorageUrl);

        let reply = handle(&converter, "OPTIONS", b"", &ctx());

        assert_eq!(reply.status, 200);
        assert!(reply.body.is_empty());
        assert_cors(&reply);
        assert_eq!(probe.creation_count(), 0);
    }

    #[test]
    fn test_other_methods_rejected() {
        let (converter, probe) = delivering(DeliveryStrategy::StorageUrl);

        for method in ["GET", "PUT", "DELETE"] {
            let reply = handle(&converter, method, br#"{"pageToPdf":"https://x.example"}"#, &ctx());
            assert_eq!(reply.status, 405);
            assert_eq!(json(&reply)["message"], "Method not allowed");
            assert_cors(&reply);
        }
        assert_eq!(probe.creation_count(), 0);
    }

    #[test]
    fn test_missing_url_is_bad_request() {
        let (converter, probe) = delivering(DeliveryStrategy::StorageUrl);

        for body in [&b""[..], b"{}", br#"{"productId": 1}"#] {
            let reply = handle(&converter, "POST", body, &ctx());
            assert_eq!(reply.status, 400);
            assert_eq!(json(&reply)["message"], "Page URL not defined");
            assert_cors(&reply);
        }
        assert_eq!(probe.creation_count(), 0);
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        let (converter, _) = delivering(DeliveryStrategy::StorageUrl);

        let reply = handle(&converter, "POST", b"{not json", &ctx());

        assert_eq!(reply.status, 400);
        assert_eq!(json(&reply)["code"], "MALFORMED_BODY");
    }

    #[test]
    fn test_storage_url_reply() {
        let (converter, _) = delivering(DeliveryStrategy::StorageUrl);

        let reply = handle(
            &converter,
            "POST",
            br#"{"pageToPdf":["https://a.example","https://b.example","https://c.example"]}"#,
            &ctx(),
        );

        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("Content-Type"), Some("application/json"));
        assert_cors(&reply);

        let body = json(&reply);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "PDF generated successfully");
        assert_eq!(body["processedPages"], 3);
        assert_eq!(body["totalPages"], 3);
        let url = body["pdfUrl"].as_str().unwrap();
        let filename = body["filename"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:8080/blobs/pdfs/"));
        assert!(url.ends_with(filename));
        assert!(body.get("pdf").is_none());
    }

    #[test]
    fn test_inline_base64_reply() {
        let (converter, _) = delivering(DeliveryStrategy::InlineBase64);

        let reply = handle(&converter, "POST", br#"{"pageToPdf":"https://x.example"}"#, &ctx());

        assert_eq!(reply.status, 200);
        let body = json(&reply);
        let pdf = base64::engine::general_purpose::STANDARD
            .decode(body["pdf"].as_str().unwrap())
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(body.get("pdfUrl").is_none());
        assert!(body.get("processedPages").is_none());
    }

    #[test]
    fn test_direct_bytes_reply() {
        let (converter, _) = delivering(DeliveryStrategy::DirectBytes);

        let reply = handle(
            &converter,
            "post",
            br#"{"pageToPdf":["https://a.example","https://b.example"]}"#,
            &ctx(),
        );

        assert_eq!(reply.status, 200);
        assert!(reply.body.starts_with(b"%PDF"));
        assert_eq!(reply.header("Content-Type"), Some("application/pdf"));
        let disposition = reply.header("Content-Disposition").unwrap();
        assert!(disposition.starts_with("attachment; filename=\""));
        assert!(disposition.ends_with(".pdf\""));
        assert_eq!(reply.header("X-Processed-Pages"), Some("2"));
        assert_eq!(reply.header("X-Total-Pages"), Some("2"));
        assert_cors(&reply);
    }

    #[test]
    fn test_failure_reply() {
        let (converter, _) = converter_with(
            MockBrowserFactory::always_fails("chrome not found"),
            ConverterConfig::default(),
        );

        let reply = handle(&converter, "POST", br#"{"pageToPdf":"https://x.example"}"#, &ctx());

        assert_eq!(reply.status, 500);
        let body = json(&reply);
        assert_eq!(body["message"], "PDF generation failed");
        assert!(body["error"].as_str().unwrap().contains("chrome not found"));
        assert_cors(&reply);
    }

    #[test]
    fn test_filename_quotes_stripped() {
        let reply = HttpReply::pdf(b"%PDF".to_vec(), "a\"b.pdf");
        assert_eq!(
            reply.header("content-disposition"),
            Some("attachment; filename=\"ab.pdf\"")
        );
    }
}
