//! Shared-secret gate in front of every non-public route
//!
//! A request passes when the configured key is presented through any one of the
//! supported credential sources. The check is a pure function of the request and
//! the injected [`ApiKey`].

use std::{borrow::Cow, fmt, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};

use crate::{errors::AppError, AppState};

pub const PUBLIC_PATHS: [&str; 2] = ["/", "/health"];
pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY_PARAM: &str = "api_key";

#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into()))
    }

    /// Exact comparison; an empty key on either side never matches.
    pub fn matches(&self, presented: &str) -> bool {
        !self.0.is_empty() && !presented.is_empty() && presented == self.0.as_ref()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    BearerAuthorization,
    ApiKeyHeader,
    QueryParameter,
}

pub const CREDENTIAL_SOURCES: [CredentialSource; 3] = [
    CredentialSource::BearerAuthorization,
    CredentialSource::ApiKeyHeader,
    CredentialSource::QueryParameter,
];

impl CredentialSource {
    pub fn extract<'a>(self, headers: &'a HeaderMap, uri: &'a Uri) -> Option<Cow<'a, str>> {
        match self {
            Self::BearerAuthorization => {
                let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
                // Scheme and credential are the first two space-separated
                // segments; anything after the credential is ignored.
                let mut segments = value.split(' ');
                let scheme = segments.next()?;
                let credential = segments.next()?;
                (scheme == "Bearer").then_some(Cow::Borrowed(credential))
            }
            Self::ApiKeyHeader => headers
                .get(API_KEY_HEADER)?
                .to_str()
                .ok()
                .map(Cow::Borrowed),
            Self::QueryParameter => query_param(uri, API_KEY_QUERY_PARAM),
        }
    }
}

pub fn query_param<'a>(uri: &'a Uri, name: &str) -> Option<Cow<'a, str>> {
    url::form_urlencoded::parse(uri.query()?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

pub fn verify_api_key(headers: &HeaderMap, uri: &Uri, api_key: &ApiKey) -> bool {
    CREDENTIAL_SOURCES.iter().any(|source| {
        source
            .extract(headers, uri)
            .is_some_and(|presented| api_key.matches(&presented))
    })
}

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    if !verify_api_key(request.headers(), request.uri(), &state.api_key) {
        return Err(AppError::unauthorized());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri};

    use super::*;

    const SECRET: &str = "s3cret-key";

    fn key() -> ApiKey {
        ApiKey::new(SECRET)
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).expect("valid header value"));
        }
        map
    }

    fn uri(value: &str) -> Uri {
        value.parse().expect("valid uri")
    }

    #[test]
    fn accepts_bearer_authorization() {
        let headers = headers(&[("authorization", "Bearer s3cret-key")]);
        assert!(verify_api_key(&headers, &uri("/mcp"), &key()));
    }

    #[test]
    fn accepts_api_key_header() {
        let headers = headers(&[("x-api-key", SECRET)]);
        assert!(verify_api_key(&headers, &uri("/mcp"), &key()));
    }

    #[test]
    fn api_key_header_lookup_is_case_insensitive() {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_bytes(b"X-API-Key").expect("valid header name"),
            HeaderValue::from_static(SECRET),
        );
        assert!(verify_api_key(&map, &uri("/mcp"), &key()));
    }

    #[test]
    fn accepts_query_parameter() {
        assert!(verify_api_key(
            &HeaderMap::new(),
            &uri("/mcp?foo=1&api_key=s3cret-key"),
            &key()
        ));
    }

    #[test]
    fn query_parameter_is_percent_decoded() {
        let key = ApiKey::new("a b&c");
        assert!(verify_api_key(
            &HeaderMap::new(),
            &uri("/mcp?api_key=a%20b%26c"),
            &key
        ));
    }

    #[test]
    fn accepts_when_presented_through_every_source() {
        let headers = headers(&[
            ("authorization", "Bearer s3cret-key"),
            ("x-api-key", SECRET),
        ]);
        assert!(verify_api_key(
            &headers,
            &uri("/mcp?api_key=s3cret-key"),
            &key()
        ));
    }

    #[test]
    fn any_single_correct_source_is_enough() {
        let headers = headers(&[("authorization", "Bearer wrong"), ("x-api-key", SECRET)]);
        assert!(verify_api_key(&headers, &uri("/mcp?api_key=wrong"), &key()));
    }

    #[test]
    fn rejects_wrong_value_everywhere() {
        let headers = headers(&[("authorization", "Bearer wrong"), ("x-api-key", "wrong")]);
        assert!(!verify_api_key(&headers, &uri("/mcp?api_key=wrong"), &key()));
    }

    #[test]
    fn rejects_missing_credentials() {
        assert!(!verify_api_key(&HeaderMap::new(), &uri("/mcp"), &key()));
    }

    #[test]
    fn rejects_other_authorization_schemes() {
        let headers = headers(&[("authorization", "Basic s3cret-key")]);
        assert!(!verify_api_key(&headers, &uri("/mcp"), &key()));
    }

    #[test]
    fn bearer_scheme_is_case_sensitive() {
        let headers = headers(&[("authorization", "bearer s3cret-key")]);
        assert!(!verify_api_key(&headers, &uri("/mcp"), &key()));
    }

    #[test]
    fn rejects_malformed_authorization() {
        for value in ["Bearer", "Bearer ", "s3cret-key", "Bearer  s3cret-key"] {
            let headers = headers(&[("authorization", value)]);
            assert!(
                !verify_api_key(&headers, &uri("/mcp"), &key()),
                "authorization {value:?} must not pass"
            );
        }
    }

    #[test]
    fn comparison_is_exact() {
        let headers = headers(&[("x-api-key", "S3CRET-KEY")]);
        assert!(!verify_api_key(&headers, &uri("/mcp"), &key()));

        let headers = self::headers(&[("x-api-key", "s3cret-key ")]);
        assert!(!verify_api_key(&headers, &uri("/mcp"), &key()));
    }

    #[test]
    fn empty_configured_key_never_matches() {
        let empty = ApiKey::new("");
        let headers = headers(&[("authorization", "Bearer "), ("x-api-key", "")]);
        assert!(!verify_api_key(&headers, &uri("/mcp?api_key="), &empty));
    }

    #[test]
    fn bearer_credential_is_the_second_segment() {
        let headers = headers(&[("authorization", "Bearer a b")]);
        let target = uri("/mcp");
        let credential = CredentialSource::BearerAuthorization
            .extract(&headers, &target)
            .expect("bearer credential");
        assert_eq!(credential, "a");
    }

    #[test]
    fn trailing_segments_after_bearer_credential_are_ignored() {
        let headers = headers(&[("authorization", "Bearer s3cret-key extra")]);
        assert!(verify_api_key(&headers, &uri("/mcp"), &key()));
    }

    #[test]
    fn key_containing_space_is_not_accepted_as_bearer() {
        let key = ApiKey::new("a b");
        let headers = headers(&[("authorization", "Bearer a b")]);
        assert!(!verify_api_key(&headers, &uri("/mcp"), &key));
    }

    #[test]
    fn public_paths_are_exact() {
        assert!(is_public_path("/"));
        assert!(is_public_path("/health"));
        assert!(!is_public_path("/health/"));
        assert!(!is_public_path("/mcp"));
    }

    #[test]
    fn debug_output_hides_the_key() {
        assert_eq!(format!("{:?}", key()), "ApiKey([REDACTED])");
    }
}
