pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod export;
pub mod forecast;
pub mod http;
pub mod time;
pub mod upload;
pub mod workflow;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base_url: String,
        pub http_timeout_secs: u64,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let api_base_url = std::env::var("SALESCAST_API_BASE_URL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

            let http_timeout_secs = match std::env::var("SALESCAST_HTTP_TIMEOUT_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("SALESCAST_HTTP_TIMEOUT_SECS must be an integer (got {s:?})"))?,
                Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
            };
            anyhow::ensure!(
                http_timeout_secs > 0,
                "SALESCAST_HTTP_TIMEOUT_SECS must be positive"
            );

            Ok(Self {
                api_base_url,
                http_timeout_secs,
                sentry_dsn: std::env::var("SENTRY_DSN").ok().filter(|s| !s.trim().is_empty()),
            })
        }
    }
}
