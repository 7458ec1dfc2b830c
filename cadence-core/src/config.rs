//! Centralized configuration for Cadence.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded timeouts and sizes scattered through the resolver and relay.

use std::path::PathBuf;
use std::time::Duration;

use crate::mode::RuntimeMode;
use crate::resolver::{CodecFamily, RetryPolicy};

/// Central configuration for all Cadence components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct CadenceConfig {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub relay: RelayConfig,
    pub search: SearchConfig,
}

/// HTTP listener and front-end settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host or address to bind to
    pub host: String,
    /// TCP port to bind to
    pub port: u16,
    /// Directory holding the front-end assets
    pub static_dir: PathBuf,
    /// Production or offline development providers
    pub mode: RuntimeMode,
    /// Media URL served by the demo extraction provider in development mode
    pub dev_media_url: Option<String>,
}

impl ServerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: PathBuf::from("static"),
            mode: RuntimeMode::Production,
            dev_media_url: None,
        }
    }
}

/// Locator resolution settings.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Name of the built-in client profile to present upstream
    pub profile: String,
    /// Path or name of the yt-dlp executable
    pub provider_binary: PathBuf,
    /// Upper bound on a single extraction call
    pub timeout: Duration,
    /// Codec family preferred among audio-only streams
    pub preferred_codec: CodecFamily,
    /// Retry policy for transient resolution failures
    pub retry: RetryPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            profile: "desktop-browser".to_string(),
            provider_binary: PathBuf::from("yt-dlp"),
            timeout: Duration::from_secs(30),
            preferred_codec: CodecFamily::Aac,
            retry: RetryPolicy::default(),
        }
    }
}

/// Upstream relay settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bytes per segment written to the client
    pub segment_size: usize,
    /// TCP connect timeout for the upstream host
    pub connect_timeout: Duration,
    /// Time allowed between sending the request and receiving headers
    pub headers_timeout: Duration,
    /// Maximum silence between two upstream reads
    pub idle_timeout: Duration,
    /// Content type declared when the container is unknown
    pub default_content_type: &'static str,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            segment_size: 64 * 1024, // 64 KiB
            connect_timeout: Duration::from_secs(15),
            headers_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(15),
            default_content_type: "audio/mp4",
        }
    }
}

/// Catalog search settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum entries returned by a search
    pub result_cap: usize,
    /// Maximum entries returned for related tracks
    pub similar_cap: usize,
    /// Upper bound on a single search provider call
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_cap: 30,
            similar_cap: 20,
            timeout: Duration::from_secs(20),
        }
    }
}

impl CadenceConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparsable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration with overrides read through `lookup`, which
    /// maps a `CADENCE_*` variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("CADENCE_HOST") {
            config.server.host = host;
        }

        if let Some(port) = parse_var::<u16>(&lookup, "CADENCE_PORT") {
            config.server.port = port;
        }

        if let Some(dir) = lookup("CADENCE_STATIC_DIR") {
            config.server.static_dir = PathBuf::from(dir);
        }

        if let Some(mode) = parse_var::<RuntimeMode>(&lookup, "CADENCE_MODE") {
            config.server.mode = mode;
        }

        if let Some(url) = lookup("CADENCE_DEV_MEDIA_URL") {
            config.server.dev_media_url = Some(url);
        }

        if let Some(profile) = lookup("CADENCE_PROFILE") {
            config.resolver.profile = profile;
        }

        if let Some(binary) = lookup("CADENCE_YTDLP") {
            config.resolver.provider_binary = PathBuf::from(binary);
        }

        if let Some(seconds) = parse_var::<u64>(&lookup, "CADENCE_RESOLVE_TIMEOUT") {
            config.resolver.timeout = Duration::from_secs(seconds);
        }

        if let Some(retries) = parse_var::<u32>(&lookup, "CADENCE_RESOLVE_RETRIES") {
            config.resolver.retry.max_retries = retries;
        }

        if let Some(size) = parse_var::<usize>(&lookup, "CADENCE_SEGMENT_SIZE")
            && size > 0
        {
            config.relay.segment_size = size;
        }

        if let Some(seconds) = parse_var::<u64>(&lookup, "CADENCE_UPSTREAM_TIMEOUT") {
            let timeout = Duration::from_secs(seconds);
            config.relay.connect_timeout = timeout;
            config.relay.headers_timeout = timeout;
            config.relay.idle_timeout = timeout;
        }

        if let Some(cap) = parse_var::<usize>(&lookup, "CADENCE_SEARCH_CAP") {
            config.search.result_cap = cap;
        }

        config
    }

    /// Creates a configuration with short timeouts and no retry backoff.
    pub fn for_testing() -> Self {
        Self {
            resolver: ResolverConfig {
                timeout: Duration::from_secs(5),
                retry: RetryPolicy {
                    max_retries: 2,
                    base_backoff: Duration::ZERO,
                },
                ..Default::default()
            },
            relay: RelayConfig {
                connect_timeout: Duration::from_secs(2),
                headers_timeout: Duration::from_secs(2),
                idle_timeout: Duration::from_secs(2),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = CadenceConfig::default();

        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.relay.segment_size, 65536);
        assert_eq!(config.relay.idle_timeout, Duration::from_secs(15));
        assert_eq!(config.relay.default_content_type, "audio/mp4");
        assert_eq!(config.resolver.retry.max_retries, 2);
        assert_eq!(config.resolver.preferred_codec, CodecFamily::Aac);
        assert_eq!(config.search.result_cap, 30);
        assert_eq!(config.search.similar_cap, 20);
    }

    #[test]
    fn test_testing_preset_has_short_timeouts() {
        let config = CadenceConfig::for_testing();
        assert!(config.relay.headers_timeout <= Duration::from_secs(2));
        assert_eq!(config.resolver.retry.base_backoff, Duration::ZERO);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CADENCE_PORT", "8088"),
            ("CADENCE_MODE", "dev"),
            ("CADENCE_PROFILE", "mobile-safari"),
            ("CADENCE_SEGMENT_SIZE", "16384"),
            ("CADENCE_RESOLVE_RETRIES", "not-a-number"),
            ("CADENCE_UPSTREAM_TIMEOUT", "7"),
        ]);

        let config = CadenceConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8088);
        assert!(config.server.mode.is_development());
        assert_eq!(config.resolver.profile, "mobile-safari");
        assert_eq!(config.relay.segment_size, 16384);
        assert_eq!(config.resolver.retry.max_retries, 2);
        assert_eq!(config.relay.idle_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_zero_segment_size_is_ignored() {
        let config = CadenceConfig::from_lookup(|key| {
            (key == "CADENCE_SEGMENT_SIZE").then(|| "0".to_string())
        });
        assert_eq!(config.relay.segment_size, 64 * 1024);
    }
}
