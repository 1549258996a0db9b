//! axum adapters for the request and response accessors.

use crate::request::{InboundRequest, OutboundResponse, query_param_of};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Inbound request seen through axum.
///
/// Origin-form request targets (`/path?query`) are made absolute from the
/// `Host` header, with the scheme taken from `X-Forwarded-Proto` when a
/// proxy sets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    uri: String,
}

impl HttpRequest {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            uri: absolute_uri(&parts.uri, &parts.headers),
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            uri: absolute_uri(request.uri(), request.headers()),
        }
    }
}

fn absolute_uri(uri: &Uri, headers: &HeaderMap) -> String {
    if uri.scheme().is_some() {
        return uri.to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()));

    let Some(host) = host else {
        return uri.to_string();
    };

    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("http");

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, host, path_and_query)
}

impl InboundRequest for HttpRequest {
    fn uri(&self) -> String {
        self.uri.clone()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_param_of(&self.uri, name)
    }
}

impl<S> FromRequestParts<S> for HttpRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Outbound response that records a redirect and renders it as `302 Found`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectResponse {
    location: Option<String>,
}

impl RedirectResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_redirect(&self) -> bool {
        self.location.is_some()
    }
}

impl OutboundResponse for RedirectResponse {
    fn redirect(&mut self, location: &str) {
        self.location = Some(location.to_string());
    }
}

impl IntoResponse for RedirectResponse {
    fn into_response(self) -> Response {
        match self.location {
            Some(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_origin_form_uses_host_header() {
        let req = request(
            "/auth/facebook?code=abc",
            &[("host", "app.example.com:8080")],
        );
        let http_request = HttpRequest::from_request(&req);
        assert_eq!(
            http_request.uri(),
            "http://app.example.com:8080/auth/facebook?code=abc"
        );
        assert_eq!(http_request.query_param("code").as_deref(), Some("abc"));
    }

    #[test]
    fn test_forwarded_proto_respected() {
        let req = request(
            "/login",
            &[
                ("host", "app.example.com"),
                ("x-forwarded-proto", "https, http"),
            ],
        );
        assert_eq!(
            HttpRequest::from_request(&req).uri(),
            "https://app.example.com/login"
        );
    }

    #[test]
    fn test_absolute_target_kept() {
        let req = request("https://app.example.com/login?x=1", &[("host", "ignored")]);
        assert_eq!(
            HttpRequest::from_request(&req).uri(),
            "https://app.example.com/login?x=1"
        );
    }

    #[test]
    fn test_missing_host_leaves_origin_form() {
        let req = request("/login", &[]);
        assert_eq!(HttpRequest::from_request(&req).uri(), "/login");
    }

    #[test]
    fn test_redirect_renders_found() {
        let mut response = RedirectResponse::new();
        assert!(!response.is_redirect());

        response.redirect("https://www.facebook.com/dialog/oauth?client_id=1");
        assert_eq!(
            response.location(),
            Some("https://www.facebook.com/dialog/oauth?client_id=1")
        );

        let rendered = response.into_response();
        assert_eq!(rendered.status(), StatusCode::FOUND);
        assert_eq!(
            rendered.headers().get(header::LOCATION).unwrap(),
            "https://www.facebook.com/dialog/oauth?client_id=1"
        );
    }

    #[test]
    fn test_no_redirect_renders_no_content() {
        let rendered = RedirectResponse::new().into_response();
        assert_eq!(rendered.status(), StatusCode::NO_CONTENT);
    }
}
