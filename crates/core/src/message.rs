//! Request and response values that flow through the engine.
//!
//! These are deliberately small: the engine only needs the method, URL and
//! declared destination of a request, and the status, headers and body of a
//! response.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// The resource type a request declares (`Request.destination` in a browser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Style,
    Script,
    Image,
    Document,
    #[default]
    Other,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Document => "document",
            Destination::Other => "other",
        }
    }

    /// Best guess from a URL path, for callers that cannot declare one.
    ///
    /// Directory-style paths and `.html` are documents; known asset
    /// extensions map to their type; everything else is `Other`.
    pub fn infer_from_path(path: &str) -> Self {
        if path.ends_with('/') {
            return Destination::Document;
        }
        let file = path.rsplit('/').next().unwrap_or(path);
        let Some((_, ext)) = file.rsplit_once('.') else {
            return Destination::Document;
        };
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Destination::Document,
            "css" => Destination::Style,
            "js" | "mjs" => Destination::Script,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" | "bmp" => Destination::Image,
            _ => Destination::Other,
        }
    }

    /// Styles, scripts and images are always served cache-first.
    pub fn is_static(&self) -> bool {
        matches!(self, Destination::Style | Destination::Script | Destination::Image)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "style" => Ok(Destination::Style),
            "script" => Ok(Destination::Script),
            "image" => Ok(Destination::Image),
            "document" => Ok(Destination::Document),
            "" | "other" => Ok(Destination::Other),
            other => Err(Error::InvalidInput(format!("unknown destination: {other}"))),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
}

impl Request {
    /// A `GET` request for the given URL.
    pub fn get(url: Url, destination: Destination) -> Self {
        Self { method: "GET".to_string(), url, destination }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// A response, either live from the network, read from a partition, or
/// synthesized as a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 2xx statuses are the only ones written through to a partition.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_parse() {
        assert_eq!("image".parse::<Destination>().unwrap(), Destination::Image);
        assert_eq!("Document".parse::<Destination>().unwrap(), Destination::Document);
        assert_eq!("".parse::<Destination>().unwrap(), Destination::Other);
        assert!(matches!("font".parse::<Destination>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_destination_infer_from_path() {
        assert_eq!(Destination::infer_from_path("/"), Destination::Document);
        assert_eq!(Destination::infer_from_path("/2024/01/01/hello/"), Destination::Document);
        assert_eq!(Destination::infer_from_path("/about"), Destination::Document);
        assert_eq!(Destination::infer_from_path("/offline.html"), Destination::Document);
        assert_eq!(Destination::infer_from_path("/css/matery.css"), Destination::Style);
        assert_eq!(Destination::infer_from_path("/libs/jquery/jquery-3.6.0.min.js"), Destination::Script);
        assert_eq!(Destination::infer_from_path("/medias/logo.PNG"), Destination::Image);
        assert_eq!(Destination::infer_from_path("/atom.xml"), Destination::Other);
    }

    #[test]
    fn test_destination_is_static() {
        assert!(Destination::Style.is_static());
        assert!(Destination::Script.is_static());
        assert!(Destination::Image.is_static());
        assert!(!Destination::Document.is_static());
        assert!(!Destination::Other.is_static());
    }

    #[test]
    fn test_request_method_normalized() {
        let url = Url::parse("https://blog.test/api").unwrap();
        let req = Request::get(url, Destination::Other).with_method("post");
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_response_header_lookup() {
        let resp = Response::new(200, "ok").with_header("Content-Type", "text/plain");
        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.header("x-missing"), None);
    }

    #[test]
    fn test_response_is_success() {
        assert!(Response::new(200, "").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(304, "").is_success());
        assert!(!Response::new(404, "").is_success());
    }
}
