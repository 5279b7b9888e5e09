use std::env;

static DEFAULT_API_URL: &str = "/api/v1";
static ENV_API_URL: &str = "TASKLANE_API_URL";

/// Remote API endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_url: String,
}

impl ApiConfig {
    /// Resolve the API url from the provided override, the environment, or
    /// the platform default, in that order.
    pub fn discover(api_url_override: Option<String>) -> Self {
        let api_url = api_url_override
            .or_else(|| env::var(ENV_API_URL).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::from_api_url(api_url)
    }

    /// Construct directly from an endpoint url. A trailing slash is always
    /// stripped so route templates can be joined with a plain `/`.
    pub fn from_api_url(api_url: impl Into<String>) -> Self {
        let mut api_url = api_url.into();
        while api_url.len() > 1 && api_url.ends_with('/') {
            api_url.pop();
        }
        Self { api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_api_url(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_trailing_slashes() {
        let config = ApiConfig::from_api_url("https://try.example.com/api/v1/");
        assert_eq!(config.api_url(), "https://try.example.com/api/v1");

        let doubled = ApiConfig::from_api_url("https://try.example.com/api/v1//");
        assert_eq!(doubled.api_url(), "https://try.example.com/api/v1");
    }

    #[test]
    fn override_beats_the_default() {
        let config = ApiConfig::discover(Some("https://tasks.internal/api/v1".into()));
        assert_eq!(config.api_url(), "https://tasks.internal/api/v1");
    }

    #[test]
    fn default_is_the_relative_endpoint() {
        assert_eq!(ApiConfig::default().api_url(), "/api/v1");
    }
}
