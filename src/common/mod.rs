//! Common utilities shared by the CLI and the standalone scenario binaries

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, FailureKind, Result};

/// Resolve a navigation target against the configured base URL.
///
/// Absolute URLs pass through untouched; anything else is joined onto the
/// base, so `/products` against `http://localhost:5173` becomes
/// `http://localhost:5173/products`.
pub fn resolve_url(base_url: &str, target: &str) -> Result<String> {
    if let Ok(url) = reqwest::Url::parse(target) {
        return Ok(url.to_string());
    }

    let base = reqwest::Url::parse(base_url)
        .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
    base.join(target)
        .map(|url| url.to_string())
        .map_err(|e| Error::navigation(target, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve_url("http://localhost:5173", "/products").unwrap();
        assert_eq!(url, "http://localhost:5173/products");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve_url("http://localhost:5173", "/").unwrap();
        assert_eq!(url, "http://localhost:5173/");
    }

    #[test]
    fn test_absolute_url_passes_through() {
        let url = resolve_url("http://localhost:5173", "https://example.com/a").unwrap();
        assert_eq!(url, "https://example.com/a");
    }

    #[test]
    fn test_invalid_base_is_config_error() {
        let err = resolve_url("nope", "/x").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
