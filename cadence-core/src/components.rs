//! Runtime component assembly.
//!
//! Builds the resolver and relay pipeline once at startup, choosing real
//! or demo providers by runtime mode. The web layer receives the finished
//! components and stays mode-agnostic.

use std::sync::Arc;

use tracing::info;

use crate::config::CadenceConfig;
use crate::profile::ClientProfile;
use crate::relay::{HttpUpstream, RelayPipe};
use crate::resolver::{DemoExtractionProvider, ExtractionProvider, LocatorResolver, YtDlpProvider};
use crate::ytdlp::YtDlp;
use crate::{CadenceError, Result};

/// Pre-configured core services shared by every request.
#[derive(Debug, Clone)]
pub struct CoreComponents {
    pub profile: Arc<ClientProfile>,
    pub resolver: Arc<LocatorResolver>,
    pub relay: RelayPipe,
}

impl CoreComponents {
    /// Builds the production or development component set.
    ///
    /// # Errors
    /// - `CadenceError::Profile` - the configured profile is unknown
    /// - `CadenceError::Configuration` - the upstream HTTP client could not be built
    pub fn build(config: &CadenceConfig) -> Result<Self> {
        let profile = Arc::new(ClientProfile::builtin(&config.resolver.profile)?);

        let provider: Arc<dyn ExtractionProvider> = if config.server.mode.is_development() {
            Arc::new(DemoExtractionProvider::new(
                config.server.dev_media_url.clone(),
            ))
        } else {
            Arc::new(YtDlpProvider::new(YtDlp::new(
                config.resolver.provider_binary.clone(),
                config.resolver.timeout,
            )))
        };

        info!(
            "Using {} extraction with client profile {}",
            provider.name(),
            profile.label()
        );

        let resolver = Arc::new(LocatorResolver::new(
            provider,
            Arc::clone(&profile),
            &config.resolver,
        ));

        let upstream = HttpUpstream::new(&config.relay).map_err(|e| CadenceError::Configuration {
            reason: e.to_string(),
        })?;

        let relay = RelayPipe::new(
            Arc::clone(&resolver),
            Arc::new(upstream),
            config.relay.clone(),
        );

        Ok(Self {
            profile,
            resolver,
            relay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::RuntimeMode;

    #[test]
    fn test_development_mode_uses_demo_provider() {
        let mut config = CadenceConfig::for_testing();
        config.server.mode = RuntimeMode::Development;

        let components = CoreComponents::build(&config).unwrap();
        assert_eq!(components.resolver.provider_name(), "demo");
        assert_eq!(components.profile.name(), "desktop-browser");
    }

    #[test]
    fn test_production_mode_uses_ytdlp() {
        let components = CoreComponents::build(&CadenceConfig::for_testing()).unwrap();
        assert_eq!(components.resolver.provider_name(), "yt-dlp");
    }

    #[test]
    fn test_unknown_profile_fails_startup() {
        let mut config = CadenceConfig::for_testing();
        config.resolver.profile = "gameboy".to_string();

        let err = CoreComponents::build(&config).unwrap_err();
        assert!(matches!(err, CadenceError::Profile(_)));
    }
}
