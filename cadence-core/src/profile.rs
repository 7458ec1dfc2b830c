//! Client profiles presented to the extraction provider and the media host.
//!
//! A profile bundles the simulated device identity, the header set and the
//! extraction-backend preference order. The same profile is used for both
//! resolution and the upstream fetch: the media host may reject a locator
//! fetched with headers that differ from the identity that minted it.
//!
//! Profiles are versioned values chosen once at startup. Retuning against
//! new upstream heuristics means adding or bumping a profile here, never
//! touching the relay code.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

/// Names of the built-in profiles, in order of preference.
pub const BUILTIN_PROFILES: &[&str] = &["desktop-browser", "mobile-safari", "smart-tv"];

const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const IOS_SAFARI_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
const SMART_TV_UA: &str = "Mozilla/5.0 (SMART-TV; Linux; Tizen 7.0) AppleWebKit/537.36 \
     (KHTML, like Gecko) 94.0.4606.31/7.0 TV Safari/537.36";

/// Errors raised while building a client profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Unknown client profile '{name}'. Known profiles: {}", BUILTIN_PROFILES.join(", "))]
    UnknownProfile { name: String },

    #[error("Invalid header in profile '{profile}': {header}")]
    InvalidHeader { profile: String, header: String },
}

/// Immutable identity bundle shared by every request.
#[derive(Debug, Clone)]
pub struct ClientProfile {
    name: String,
    version: u32,
    user_agent: String,
    headers: Vec<(String, String)>,
    player_clients: Vec<String>,
    header_map: HeaderMap,
}

impl ClientProfile {
    /// Builds and validates a profile.
    ///
    /// # Errors
    /// - `ProfileError::InvalidHeader` - a header name or value is not valid HTTP
    pub fn new(
        name: impl Into<String>,
        version: u32,
        user_agent: impl Into<String>,
        headers: Vec<(String, String)>,
        player_clients: Vec<String>,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        let user_agent = user_agent.into();

        let mut header_map = HeaderMap::new();
        let invalid = |header: &str| ProfileError::InvalidHeader {
            profile: name.clone(),
            header: header.to_string(),
        };

        header_map.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent).map_err(|_| invalid("User-Agent"))?,
        );
        for (key, value) in &headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| invalid(key))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid(key))?;
            header_map.insert(header_name, header_value);
        }

        Ok(Self {
            name,
            version,
            user_agent,
            headers,
            player_clients,
            header_map,
        })
    }

    /// Looks up a built-in profile by name.
    ///
    /// # Errors
    /// - `ProfileError::UnknownProfile` - no built-in profile has this name
    pub fn builtin(name: &str) -> Result<Self, ProfileError> {
        match name {
            "desktop-browser" => Self::new(
                name,
                3,
                DESKTOP_CHROME_UA,
                browser_headers("https://music.youtube.com"),
                vec!["web_music".to_string(), "web".to_string()],
            ),
            "mobile-safari" => Self::new(
                name,
                2,
                IOS_SAFARI_UA,
                browser_headers("https://m.youtube.com"),
                vec!["ios".to_string(), "mweb".to_string()],
            ),
            "smart-tv" => Self::new(
                name,
                1,
                SMART_TV_UA,
                vec![("Accept".to_string(), "*/*".to_string())],
                vec!["tv".to_string(), "web_safari".to_string()],
            ),
            _ => Err(ProfileError::UnknownProfile {
                name: name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Extra headers, excluding `User-Agent`.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Extraction backends to try, most preferred first.
    pub fn player_clients(&self) -> &[String] {
        &self.player_clients
    }

    /// Every header to send upstream, `User-Agent` included.
    pub fn header_map(&self) -> &HeaderMap {
        &self.header_map
    }

    /// Short `name@version` label for logs and health output.
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

fn browser_headers(origin: &str) -> Vec<(String, String)> {
    vec![
        ("Accept".to_string(), "*/*".to_string()),
        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ("Origin".to_string(), origin.to_string()),
        ("Referer".to_string(), format!("{origin}/")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_profile_builds() {
        for name in BUILTIN_PROFILES {
            let profile = ClientProfile::builtin(name).unwrap();
            assert_eq!(profile.name(), *name);
            assert!(!profile.player_clients().is_empty());
            assert_eq!(
                profile.header_map().get(USER_AGENT).unwrap(),
                profile.user_agent()
            );
        }
    }

    #[test]
    fn test_unknown_profile_lists_known_names() {
        let err = ClientProfile::builtin("netscape").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("netscape"));
        assert!(message.contains("desktop-browser"));
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let result = ClientProfile::new(
            "broken",
            1,
            "agent",
            vec![("Bad Header".to_string(), "x".to_string())],
            Vec::new(),
        );
        assert!(matches!(result, Err(ProfileError::InvalidHeader { .. })));
    }
}
