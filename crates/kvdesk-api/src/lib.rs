mod client;
mod wire;

pub use client::HttpStore;

/// Where the store API is expected when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";

/// Environment variable overriding the configured store URL
pub const URL_ENV: &str = "KVDESK_URL";

/// Store URL from `KVDESK_URL`, if set and non-empty
pub fn base_url_from_env() -> Option<String> {
    std::env::var(URL_ENV)
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}
