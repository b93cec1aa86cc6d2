//! JSON-over-HTTPS request engine.
//!
//! [`WireClient`] signs each request, sends it, fully buffers the response and
//! runs it through [`decode_response`]:
//!
//! 1. gunzip when `Content-Encoding: gzip`
//! 2. compare the decoded length with `Content-Length` (not for HEAD)
//! 3. compare the decoded MD5 with `Content-MD5` (not for HEAD or 206)
//! 4. parse non-blank bodies as JSON
//! 5. map status >= 400 to a server or HTTP error carrying the raw body
//!
//! A connection that ends before the declared `Content-Length` also reports
//! `IncompleteContent`, with the byte count received so far.

use std::io::Read;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Bytes, BytesMut};
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, DATE,
    HeaderMap,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use triton_auth::{AuthHeaders, RequestSigner};
use url::Url;

use crate::config::{ClientConfig, Profile};
use crate::error::{Error, Result};
use crate::query::QueryParams;

/// Header carrying the acceptable API version range.
pub const ACCEPT_VERSION: &str = "accept-version";
/// Header carrying the body MD5 (base64).
pub const CONTENT_MD5: &str = "content-md5";

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters.
    pub query: QueryParams,
    /// JSON body.
    pub body: Option<Value>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Options with only a query.
    #[must_use]
    pub fn query(query: QueryParams) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Options with only a JSON body.
    #[must_use]
    pub fn body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }
}

/// A decoded, successful response.
#[derive(Debug, Clone)]
pub struct WireResponse {
    /// HTTP status.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed JSON body; `None` for empty or blank bodies.
    pub body: Option<Value>,
    /// Decoded (post-gunzip) body bytes.
    pub raw: Bytes,
}

impl WireResponse {
    /// Header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Deserializes the body into `T`. An absent body deserializes from
    /// `null`, so `Option<T>` and unit targets accept empty responses.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| Error::InvalidContent {
            message: format!("unexpected response shape: {e}"),
            original_body: Some(String::from_utf8_lossy(&self.raw).into_owned()),
        })
    }
}

/// Signed JSON HTTP client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct WireClient {
    http: reqwest::Client,
    base_url: Url,
    signer: RequestSigner,
    accept_version: String,
    user_agent: String,
    roles: Vec<String>,
    insecure: bool,
}

impl WireClient {
    /// Creates a client for `profile`'s endpoint.
    ///
    /// # Errors
    ///
    /// Returns a `Usage` error for an invalid configuration, or an
    /// `Internal` error if the HTTP client cannot be built.
    pub fn new(profile: &Profile, config: &ClientConfig, signer: RequestSigner) -> Result<Self> {
        profile.validate()?;
        config.validate()?;
        let base_url = profile.endpoint()?;

        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(profile.insecure);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if !config.connection_pooling {
            builder = builder.pool_max_idle_per_host(0);
        }
        let http = builder
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            signer,
            accept_version: profile
                .accept_version
                .clone()
                .unwrap_or_else(|| config.accept_version.clone()),
            user_agent: config.user_agent.clone(),
            roles: profile.roles.clone(),
            insecure: profile.insecure,
        })
    }

    /// Endpoint base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Request signer.
    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Accept-Version sent with each request.
    #[must_use]
    pub fn accept_version(&self) -> &str {
        &self.accept_version
    }

    /// User-Agent sent with each request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// True if TLS verification is disabled.
    #[must_use]
    pub const fn insecure(&self) -> bool {
        self.insecure
    }

    /// Produces fresh `Date`/`Authorization` headers.
    pub async fn auth_headers(&self) -> Result<AuthHeaders> {
        Ok(self.signer.sign().await?)
    }

    /// Absolute URL for `path` plus `query` (and `as-role` when roles are
    /// configured).
    pub fn url_for(&self, path: &str, query: &QueryParams) -> Result<Url> {
        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{path}"));

        let mut query = query.clone();
        if !self.roles.is_empty() && query.get("as-role").is_none() {
            query.insert("as-role", self.roles.join(","));
        }
        if query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&query.to_query_string()));
        }
        Ok(url)
    }

    /// Issues one signed request and decodes the response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<WireResponse> {
        let url = self.url_for(path, &options.query)?;
        let auth = self.auth_headers().await?;

        let mut req = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json")
            .header(ACCEPT_ENCODING, "gzip")
            .header(ACCEPT_VERSION, self.accept_version.as_str())
            .header(DATE, auth.date)
            .header(AUTHORIZATION, auth.authorization);
        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| Error::internal(format!("cannot serialize request body: {e}")))?;
            trace!(body = %body, "request body");
            req = req.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let started = Instant::now();
        let mut resp = req.send().await.map_err(|e| self.transport_error(&e))?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let declared = (method != Method::HEAD)
            .then(|| declared_length(&headers))
            .flatten();

        let mut buf = BytesMut::new();
        loop {
            match resp.chunk().await {
                Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    let received = buf.len() as u64;
                    return Err(match declared {
                        Some(expected) if e.is_body() || e.is_decode() => {
                            debug!(expected, received, error = %e, "response body cut short");
                            Error::IncompleteContent { expected, received }
                        }
                        _ => self.transport_error(&e),
                    });
                }
            }
        }
        let raw = buf.freeze();
        debug!(
            method = %method,
            path = %url.path(),
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cloudapi response"
        );

        decode_response(&method, status, &headers, raw)
    }

    fn transport_error(&self, err: &reqwest::Error) -> Error {
        let message = error_chain(err);
        let lower = message.to_ascii_lowercase();
        if lower.contains("self signed") || lower.contains("self-signed") {
            return Error::SelfSignedCert {
                url: self.base_url.to_string(),
                message,
            };
        }
        Error::transport(message, err.is_timeout())
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, CONTENT_LENGTH.as_str()).and_then(|v| v.trim().parse::<u64>().ok())
}

fn gunzip(raw: &[u8]) -> Result<Bytes> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(raw)
        .read_to_end(&mut out)
        .map_err(|e| Error::InvalidContent {
            message: format!("gzip decode error: {e}"),
            original_body: None,
        })?;
    Ok(Bytes::from(out))
}

/// Base64 MD5 of `data`, as carried in `Content-MD5`.
#[must_use]
pub fn content_md5(data: &[u8]) -> String {
    STANDARD.encode(md5::compute(data).0)
}

/// Decodes a buffered response.
///
/// Pure function of the response parts so framing rules can be exercised
/// without a server.
pub fn decode_response(
    method: &Method,
    status: u16,
    headers: &HeaderMap,
    raw: Bytes,
) -> Result<WireResponse> {
    let gzip = header_str(headers, CONTENT_ENCODING.as_str())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));
    let decoded = if gzip && !raw.is_empty() {
        gunzip(&raw)?
    } else {
        raw
    };

    if *method != Method::HEAD {
        if let Some(expected) = declared_length(headers) {
            let received = decoded.len() as u64;
            if expected != received {
                return Err(Error::IncompleteContent { expected, received });
            }
        }
        if status != 206 {
            if let Some(expected) = header_str(headers, CONTENT_MD5) {
                let actual = content_md5(&decoded);
                if expected.trim() != actual {
                    return Err(Error::BadDigest {
                        expected: expected.trim().to_string(),
                        actual,
                    });
                }
            }
        }
    }

    let text = String::from_utf8_lossy(&decoded).into_owned();
    let body = if text.trim().is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&decoded) {
            Ok(v) => Some(v),
            Err(_) if status >= 400 => return Err(status_error(status, None, text)),
            Err(e) => {
                return Err(Error::InvalidContent {
                    message: format!("invalid JSON in response body: {e}"),
                    original_body: Some(text),
                });
            }
        }
    };

    if status >= 400 {
        return Err(status_error(status, body, text));
    }

    Ok(WireResponse {
        status,
        headers: headers.clone(),
        body,
        raw: decoded,
    })
}

/// Maps an error status plus body to a taxonomy error.
fn status_error(status: u16, body: Option<Value>, raw: String) -> Error {
    let original_body = (!raw.is_empty()).then_some(raw);
    let envelope = body
        .as_ref()
        .map(|v| v.get("error").filter(|e| e.is_object()).unwrap_or(v));
    let code = envelope
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = envelope
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(code) = code {
        return Error::Server {
            message: message.unwrap_or_else(|| code.clone()),
            code,
            status,
            body,
            original_body,
        };
    }

    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("error");
    let message = message.unwrap_or_else(|| format!("{status} {reason}"));
    Error::Http {
        status,
        message,
        body,
        original_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::io::Write;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).expect("header value"));
        }
        map
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).expect("write");
        enc.finish().expect("finish")
    }

    #[test]
    fn test_plain_json_body() {
        let body = br#"{"id":"abc"}"#;
        let resp = decode_response(
            &Method::GET,
            200,
            &headers(&[("content-length", "12")]),
            Bytes::from_static(body),
        )
        .expect("decode");
        assert_eq!(resp.body, Some(serde_json::json!({"id": "abc"})));
    }

    #[test]
    fn test_empty_and_blank_bodies_are_absent() {
        let resp = decode_response(&Method::DELETE, 204, &HeaderMap::new(), Bytes::new())
            .expect("decode");
        assert!(resp.body.is_none());
        let resp = decode_response(&Method::POST, 202, &HeaderMap::new(), Bytes::from_static(b" \n"))
            .expect("decode");
        assert!(resp.body.is_none());
    }

    #[test]
    fn test_gzip_length_counts_decoded_bytes() {
        let plain = br#"[{"name":"a"},{"name":"b"}]"#;
        let len = plain.len().to_string();
        let resp = decode_response(
            &Method::GET,
            200,
            &headers(&[("content-encoding", "gzip"), ("content-length", &len)]),
            Bytes::from(gzip(plain)),
        )
        .expect("decode");
        assert_eq!(resp.raw.as_ref(), plain);
        assert_eq!(resp.body.expect("body").as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_length_mismatch_is_incomplete() {
        let err = decode_response(
            &Method::GET,
            200,
            &headers(&[("content-length", "100")]),
            Bytes::from_static(b"{}"),
        )
        .expect_err("should fail");
        assert!(matches!(
            err,
            Error::IncompleteContent {
                expected: 100,
                received: 2
            }
        ));
    }

    #[test]
    fn test_head_skips_length_check() {
        let resp = decode_response(
            &Method::HEAD,
            200,
            &headers(&[("content-length", "100"), ("x-resource-count", "7")]),
            Bytes::new(),
        )
        .expect("decode");
        assert_eq!(resp.header("x-resource-count"), Some("7"));
    }

    #[test]
    fn test_content_md5() {
        let body = b"{\"ok\":true}";
        let good = content_md5(body);
        assert!(
            decode_response(
                &Method::GET,
                200,
                &headers(&[("content-md5", &good)]),
                Bytes::from_static(body)
            )
            .is_ok()
        );

        let err = decode_response(
            &Method::GET,
            200,
            &headers(&[("content-md5", "AAAAAAAAAAAAAAAAAAAAAA==")]),
            Bytes::from_static(body),
        )
        .expect_err("digest mismatch");
        assert_eq!(err.name(), "BadDigestError");

        assert!(
            decode_response(
                &Method::GET,
                206,
                &headers(&[("content-md5", "AAAAAAAAAAAAAAAAAAAAAA==")]),
                Bytes::from_static(body)
            )
            .is_ok()
        );
    }

    #[test]
    fn test_invalid_json_success_status() {
        let err = decode_response(&Method::GET, 200, &HeaderMap::new(), Bytes::from_static(b"<html>"))
            .expect_err("invalid");
        assert_eq!(err.name(), "InvalidContentError");
        assert_eq!(err.original_body(), Some("<html>"));
    }

    #[test]
    fn test_error_envelope() {
        let body = br#"{"code":"ResourceNotFound","message":"VM not found"}"#;
        let err = decode_response(&Method::GET, 404, &HeaderMap::new(), Bytes::from_static(body))
            .expect_err("404");
        assert_eq!(err.name(), "ResourceNotFoundError");
        assert_eq!(err.to_string(), "VM not found");
        assert_eq!(err.status_code(), Some(404));
        assert!(err.original_body().is_some());
    }

    #[test]
    fn test_nested_error_envelope() {
        let body = br#"{"error":{"code":"ValidationFailedError","message":"bad name"}}"#;
        let err = decode_response(&Method::POST, 409, &HeaderMap::new(), Bytes::from_static(body))
            .expect_err("409");
        assert_eq!(err.name(), "ValidationFailedError");
        assert_eq!(err.code(), Some("ValidationFailedError"));
    }

    #[test]
    fn test_non_json_error_body() {
        let err = decode_response(
            &Method::GET,
            502,
            &HeaderMap::new(),
            Bytes::from_static(b"Bad Gateway from proxy"),
        )
        .expect_err("502");
        assert_eq!(err.name(), "HttpError");
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.original_body(), Some("Bad Gateway from proxy"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_json_error_without_code() {
        let err = decode_response(
            &Method::GET,
            500,
            &HeaderMap::new(),
            Bytes::from_static(br#"{"message":"oops"}"#),
        )
        .expect_err("500");
        assert_eq!(err.name(), "HttpError");
        assert_eq!(err.to_string(), "oops");
    }
}
