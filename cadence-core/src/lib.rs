//! Cadence Core - locator resolution and audio relay
//!
//! Resolves catalog items to short-lived, origin-bound media locators and
//! relays their audio to clients through this process, presenting one
//! consistent client profile to the upstream for both steps.

pub mod components;
pub mod config;
pub mod item;
pub mod mode;
pub mod profile;
pub mod relay;
pub mod resolver;
pub mod tracing_setup;
pub mod ytdlp;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export main types for convenient access
pub use components::CoreComponents;
pub use config::CadenceConfig;
pub use item::{InvalidItemIdentifier, ItemIdentifier};
pub use mode::RuntimeMode;
pub use profile::{ClientProfile, ProfileError};
pub use relay::{RelayError, RelayOutcome, RelayPipe};
pub use resolver::{LocatorResolver, ResolutionError};

/// Core errors that can bubble up from any Cadence subsystem.
#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Invalid item: {0}")]
    InvalidItem(#[from] InvalidItemIdentifier),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CadenceError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            CadenceError::Resolution(e) => format!("Could not resolve audio for {}", e.item),
            CadenceError::Relay(RelayError::Resolution(e)) => {
                format!("Could not resolve audio for {}", e.item)
            }
            CadenceError::Relay(RelayError::Upstream { item, .. }) => {
                format!("Could not open the audio stream for {item}")
            }
            CadenceError::Profile(e) => e.to_string(),
            CadenceError::InvalidItem(e) => format!("Invalid item id: {e}"),
            CadenceError::Configuration { reason } => format!("Configuration error: {reason}"),
            CadenceError::Io(_) => "Output error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CadenceError::InvalidItem(_)
                | CadenceError::Profile(_)
                | CadenceError::Configuration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CadenceError>;
