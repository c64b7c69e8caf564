//! Carrier endpoint URL handling

use shipgate_domain::{Result, ShipgateError};
use url::Url;

/// Parse the configured base URL, ensuring it ends with `/` so that
/// endpoint paths are appended rather than replacing the last segment.
pub fn base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let normalized =
        if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{trimmed}/") };

    let url = Url::parse(&normalized)
        .map_err(|e| ShipgateError::Config(format!("invalid carrier base URL '{trimmed}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ShipgateError::Config(format!(
            "carrier base URL must be http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Resolve an endpoint path against the base URL.
pub fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ShipgateError::InvalidInput(format!("invalid carrier path '{path}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_paths_to_base_without_trailing_slash() {
        let base = base_url("https://carrier.example/v1/external").unwrap();
        let url = join(&base, "orders/create/adhoc").unwrap();
        assert_eq!(url.as_str(), "https://carrier.example/v1/external/orders/create/adhoc");
    }

    #[test]
    fn leading_slash_does_not_escape_base_path() {
        let base = base_url("https://carrier.example/v1/external/").unwrap();
        let url = join(&base, "/courier/track").unwrap();
        assert_eq!(url.as_str(), "https://carrier.example/v1/external/courier/track");
    }

    #[test]
    fn rejects_unsupported_scheme() {
        assert!(matches!(base_url("ftp://carrier.example/"), Err(ShipgateError::Config(_))));
        assert!(base_url("not a url").is_err());
    }
}
