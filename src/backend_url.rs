//! Backend base resolution and outbound URL construction.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::error::{ConfigError, GatewayError};

/// Path prefix every backend resource lives under.
const API_PREFIX: &str = "api";

/// Normalized backend base: scheme + authority + exactly one `/api`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendBase(Url);

impl BackendBase {
    /// Resolve the configured base URL.
    ///
    /// Accepts `http://host:port`, `http://host:port/`, and
    /// `http://host:port/api` alike; all resolve to `http://host:port/api`.
    pub fn resolve(raw: Option<&str>) -> Result<Self, ConfigError> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingBackendUrl)?;

        let mut url =
            Url::parse(raw).map_err(|e| ConfigError::MalformedBackendUrl(format!("{raw}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::MalformedBackendUrl(raw.to_string()));
        }

        url.set_query(None);
        url.set_fragment(None);

        let segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ConfigError::MalformedBackendUrl(raw.to_string()))?;
            path.clear();
            path.extend(&segments);
            if segments.last().map(String::as_str) != Some(API_PREFIX) {
                path.push(API_PREFIX);
            }
        }

        Ok(Self(url))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for BackendBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build an outbound URL from a path template like `/orders/{id}/cancel`.
///
/// Placeholder values must already be percent-decoded (axum's `Path` and
/// [`EndpointSpec::match_path`](crate::endpoint::EndpointSpec::match_path)
/// both hand them over that way); each is encoded here as exactly one segment.
/// Empty, `.` and `..` values are rejected since they would not survive as a
/// segment. Query parameters with no value (or an empty one) are left out
/// entirely.
pub fn build_url(
    base: &BackendBase,
    path_template: &str,
    path_params: &HashMap<String, String>,
    query: &[(String, Option<String>)],
) -> Result<Url, GatewayError> {
    let mut url = base.0.clone();

    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| GatewayError::validation("Invalid backend path"))?;
        path.pop_if_empty();

        for segment in path_template.split('/').filter(|s| !s.is_empty()) {
            match placeholder_name(segment) {
                Some(name) => {
                    let value = path_params
                        .get(name)
                        .filter(|v| !v.is_empty())
                        .ok_or_else(|| GatewayError::validation(format!("Missing {name}")))?;
                    if matches!(value.as_str(), "." | "..") {
                        return Err(GatewayError::validation(format!("Invalid {name}")));
                    }
                    path.push(value);
                }
                None => {
                    path.push(segment);
                }
            }
        }
    }

    let present: Vec<(&str, &str)> = query
        .iter()
        .filter_map(|(k, v)| {
            v.as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (k.as_str(), v))
        })
        .collect();

    if !present.is_empty() {
        url.query_pairs_mut().extend_pairs(present);
    }

    Ok(url)
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BackendBase {
        BackendBase::resolve(Some("http://backend.local:4000")).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_appends_prefix_once() {
        for raw in [
            "http://backend.local:4000",
            "http://backend.local:4000/",
            "http://backend.local:4000/api",
            "http://backend.local:4000/api/",
            "  http://backend.local:4000/api?x=1  ",
        ] {
            let base = BackendBase::resolve(Some(raw)).unwrap();
            assert_eq!(base.to_string(), "http://backend.local:4000/api", "input {raw}");
        }
    }

    #[test]
    fn test_resolve_keeps_mount_path() {
        let base = BackendBase::resolve(Some("https://example.com/store/")).unwrap();
        assert_eq!(base.to_string(), "https://example.com/store/api");
    }

    #[test]
    fn test_resolve_rejects_missing_and_malformed() {
        assert_eq!(
            BackendBase::resolve(None),
            Err(ConfigError::MissingBackendUrl)
        );
        assert_eq!(
            BackendBase::resolve(Some("   ")),
            Err(ConfigError::MissingBackendUrl)
        );
        assert!(matches!(
            BackendBase::resolve(Some("not a url")),
            Err(ConfigError::MalformedBackendUrl(_))
        ));
        assert!(matches!(
            BackendBase::resolve(Some("ftp://files.example.com")),
            Err(ConfigError::MalformedBackendUrl(_))
        ));
    }

    #[test]
    fn test_build_plain_path() {
        let url = build_url(&base(), "/products/featured", &HashMap::new(), &[]).unwrap();
        assert_eq!(url.as_str(), "http://backend.local:4000/api/products/featured");
    }

    #[test]
    fn test_path_param_is_encoded_as_one_segment() {
        let url = build_url(
            &base(),
            "/products/{sku}",
            &params(&[("sku", "RUN SHOE/42")]),
            &[],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://backend.local:4000/api/products/RUN%20SHOE%2F42"
        );
    }

    #[test]
    fn test_percent_in_path_param_is_not_decoded_again() {
        let url = build_url(&base(), "/products/{sku}", &params(&[("sku", "A%41")]), &[]).unwrap();
        assert_eq!(url.as_str(), "http://backend.local:4000/api/products/A%2541");
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        for value in [".", ".."] {
            let err = build_url(
                &base(),
                "/orders/{id}/cancel",
                &params(&[("id", value)]),
                &[],
            )
            .unwrap_err();
            assert_eq!(err.public_message(), "Invalid id");
        }

        let err = build_url(&base(), "/orders/{id}", &params(&[("id", "")]), &[]).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn test_missing_path_param_is_validation_error() {
        let err = build_url(&base(), "/orders/{id}", &HashMap::new(), &[]).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn test_absent_query_params_are_omitted() {
        let query = vec![
            ("page".to_string(), Some("1".to_string())),
            ("limit".to_string(), Some("10".to_string())),
            ("search".to_string(), None),
            ("category".to_string(), Some(String::new())),
        ];
        let url = build_url(&base(), "/products", &HashMap::new(), &query).unwrap();
        assert_eq!(
            url.as_str(),
            "http://backend.local:4000/api/products?page=1&limit=10"
        );
        assert!(!url.as_str().contains("search"));
    }

    #[test]
    fn test_no_query_means_no_question_mark() {
        let query = vec![("search".to_string(), None)];
        let url = build_url(&base(), "/products", &HashMap::new(), &query).unwrap();
        assert!(url.query().is_none());
    }
}
