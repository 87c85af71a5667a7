//! Activation flags and page location, read once at start-up.

use url::Url;

const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Where the host page lives: its raw query string and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLocation {
    pub query: String,
    pub origin: Url,
}

impl PageLocation {
    pub fn new(query: impl Into<String>, origin: &str) -> Self {
        Self {
            query: query.into(),
            origin: parse_origin(origin),
        }
    }

    /// Browser builds read `window.location`; native builds read
    /// `DEBUG_OVERLAY_QUERY` / `DEBUG_OVERLAY_ORIGIN`, falling back to the
    /// values baked from `.env` at build time.
    pub fn current() -> Self {
        #[cfg(all(feature = "web", target_arch = "wasm32"))]
        {
            crate::browser::page_location()
        }
        #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
        {
            let query = std::env::var("DEBUG_OVERLAY_QUERY")
                .ok()
                .or_else(|| option_env!("DEBUG_OVERLAY_QUERY").map(String::from))
                .unwrap_or_default();
            let origin = std::env::var("DEBUG_OVERLAY_ORIGIN")
                .ok()
                .or_else(|| option_env!("DEBUG_OVERLAY_ORIGIN").map(String::from))
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
            Self::new(query, &origin)
        }
    }
}

fn parse_origin(origin: &str) -> Url {
    Url::parse(origin.trim()).unwrap_or_else(|err| {
        tracing::warn!(%origin, %err, "unusable page origin, using {DEFAULT_ORIGIN}");
        Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL")
    })
}

/// Immutable switches computed from the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationConfig {
    /// `debug=true`: install interception and mount the panel.
    pub active: bool,
    /// `link=true`: frame links navigate natively instead of fetching.
    pub open_links_natively: bool,
    /// `errorsOnly=true`: the panel renders error records only.
    pub errors_only: bool,
}

impl ActivationConfig {
    /// Only the literal value `true` enables a flag.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            active: flag(query, "debug"),
            open_links_natively: flag(query, "link"),
            errors_only: flag(query, "errorsOnly"),
        }
    }

    pub fn from_location(location: &PageLocation) -> Self {
        Self::from_query(&location.query)
    }
}

fn flag(query: &str, name: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .is_some_and(|(_, value)| value == "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_literal_true_enables() {
        assert!(ActivationConfig::from_query("?debug=true").active);
        for query in ["", "?debug", "?debug=", "?debug=1", "?debug=yes", "?debug=TRUE", "?debug=true2"] {
            assert!(!ActivationConfig::from_query(query).active, "{query} should not activate");
        }
    }

    #[test]
    fn flags_are_independent() {
        let config = ActivationConfig::from_query("debug=true&link=true");
        assert!(config.active && config.open_links_natively && !config.errors_only);

        let config = ActivationConfig::from_query("?link=true");
        assert!(!config.active && config.open_links_natively);

        let config = ActivationConfig::from_query("?debug=true&link=false&errorsOnly=true");
        assert!(config.active && !config.open_links_natively && config.errors_only);
    }

    #[test]
    fn values_are_percent_decoded_and_first_key_wins() {
        assert!(ActivationConfig::from_query("?debug=%74rue").active);
        assert!(!ActivationConfig::from_query("?debug=false&debug=true").active);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let location = PageLocation::new("?debug=true&link=true", "https://app.test");
        assert_eq!(
            ActivationConfig::from_location(&location),
            ActivationConfig::from_location(&location)
        );
    }

    #[test]
    fn bad_origin_falls_back() {
        let location = PageLocation::new("", "not a url");
        assert_eq!(location.origin.as_str(), "http://localhost:8080/");
    }
}
