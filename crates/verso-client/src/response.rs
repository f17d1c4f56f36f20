//! Response values and format-declared parsing.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use verso_core::{Error, Result};

/// Requested response format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON body; the content type must declare it.
    Json,
    /// UTF-8 text body.
    Text,
    /// Raw bytes.
    Blob,
}

impl Format {
    fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Blob => "blob",
        }
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers with lowercased names.
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes.
    pub body: Bytes,
}

impl ApiResponse {
    /// Creates a response, lowercasing all header names.
    pub fn new<K, V>(
        status: u16,
        headers: impl IntoIterator<Item = (K, V)>,
        body: impl Into<Bytes>,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Converts an error status into the matching error kind.
    ///
    /// 404 maps to `NotFound` so callers can distinguish absent resources
    /// from other failures.
    pub fn error_for_status(self) -> Result<Self> {
        match self.status {
            status if (200..300).contains(&status) => Ok(self),
            401 => Err(Error::authentication().with_message("provider rejected the credentials")),
            403 => Err(Error::authorization().with_message("insufficient permission")),
            404 => Err(Error::not_found().with_message("resource not found")),
            status => Err(Error::external()
                .with_message(format!("provider returned an error status: {status}"))),
        }
    }

    /// Parses the body according to the declared format.
    ///
    /// For [`Format::Json`] the content type must start with
    /// `application/json` or `text/json`; anything else is a parse error.
    /// Decode failures never yield partially decoded data.
    pub fn parse_json(&self) -> Result<Value> {
        let content_type = self.header("content-type").unwrap_or_default();
        if !content_type.starts_with("application/json") && !content_type.starts_with("text/json") {
            return Err(Error::parse().with_message(format!(
                "{content_type:?} is not a valid JSON content type"
            )));
        }
        serde_json::from_slice(&self.body).map_err(|err| {
            Error::parse()
                .with_message(format!(
                    "response cannot be parsed into the expected format (json): {err}"
                ))
                .with_source(err)
        })
    }

    /// Parses the body as JSON and deserializes it into `T`.
    pub fn parse_json_as<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.parse_json()?;
        serde_json::from_value(value).map_err(|err| {
            Error::parse()
                .with_message(format!(
                    "response cannot be parsed into the expected format (json): {err}"
                ))
                .with_source(err)
        })
    }

    /// Parses the body as UTF-8 text.
    pub fn parse_text(&self) -> Result<String> {
        std::str::from_utf8(&self.body)
            .map(str::to_owned)
            .map_err(|err| {
                Error::parse()
                    .with_message(
                        "response cannot be parsed into the expected format (text): invalid utf-8",
                    )
                    .with_source(err)
            })
    }

    /// Returns the raw body bytes.
    pub fn parse_blob(&self) -> Bytes {
        self.body.clone()
    }

    /// Dispatches to the parser for the given format.
    pub fn parse(&self, format: Format) -> Result<Value> {
        match format {
            Format::Json => self.parse_json(),
            Format::Text => self.parse_text().map(Value::String),
            Format::Blob => Err(Error::parse().with_message(format!(
                "format {} has no JSON representation, use parse_blob",
                format.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_response(body: &str) -> ApiResponse {
        ApiResponse::new(200, [("Content-Type", "application/json")], body.as_bytes().to_vec())
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = ApiResponse::new(200, [("X-Total-Pages", "7")], Vec::new());
        assert_eq!(resp.header("x-total-pages"), Some("7"));
        assert_eq!(resp.header("X-TOTAL-PAGES"), Some("7"));
    }

    #[test]
    fn test_json_parse_round_trip() {
        let value = json_response(r#"{"name":"hello"}"#).parse_json().unwrap();
        assert_eq!(value["name"], "hello");
    }

    #[test]
    fn test_json_rejects_mismatched_content_type() {
        let resp = ApiResponse::new(
            200,
            [("Content-Type", "text/html")],
            br#"{"name":"hello"}"#.to_vec(),
        );
        let err = resp.parse_json().unwrap_err();
        assert_eq!(err.kind(), verso_core::ErrorKind::Parse);
    }

    #[test]
    fn test_json_accepts_text_json() {
        let resp = ApiResponse::new(200, [("Content-Type", "text/json")], b"[1,2]".to_vec());
        assert!(resp.parse_json().is_ok());
    }

    #[test]
    fn test_json_decode_failure_is_parse_error() {
        let err = json_response("{not json").parse_json().unwrap_err();
        assert_eq!(err.kind(), verso_core::ErrorKind::Parse);
        assert!(err.to_string().contains("json"));
    }

    #[test]
    fn test_error_for_status_distinguishes_not_found() {
        let resp = ApiResponse::new(404, [] as [(&str, String); 0], Vec::new());
        assert!(resp.error_for_status().unwrap_err().is_not_found());

        let resp = ApiResponse::new(500, [] as [(&str, String); 0], Vec::new());
        assert_eq!(
            resp.error_for_status().unwrap_err().kind(),
            verso_core::ErrorKind::ExternalError
        );
    }

    #[test]
    fn test_error_for_status_auth_mapping() {
        let resp = ApiResponse::new(401, [] as [(&str, String); 0], Vec::new());
        assert_eq!(
            resp.error_for_status().unwrap_err().kind(),
            verso_core::ErrorKind::Authentication
        );
        let resp = ApiResponse::new(403, [] as [(&str, String); 0], Vec::new());
        assert_eq!(
            resp.error_for_status().unwrap_err().kind(),
            verso_core::ErrorKind::Authorization
        );
    }

    #[test]
    fn test_text_parse_rejects_invalid_utf8() {
        let resp = ApiResponse::new(200, [("Content-Type", "text/plain")], vec![0xff, 0xfe]);
        assert!(resp.parse_text().is_err());
    }
}
