//! Session wide defaults.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::highlight::HighlightRenderSettings;

const DEFAULT_MAX_MATCHES: usize = 40;
const DEFAULT_ANIMATION_DURATION: Duration = Duration::from_millis(500);

/// Configuration of a [`SessionCoordinator`](crate::SessionCoordinator).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    default_max_matches: usize,
    animation_duration: Duration,
    highlight_settings: HighlightRenderSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_max_matches: DEFAULT_MAX_MATCHES,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            highlight_settings: HighlightRenderSettings::default(),
        }
    }
}

impl SessionConfig {
    /// Maximum number of search results when the request does not specify one.
    pub fn default_max_matches(&self) -> usize {
        self.default_max_matches
    }

    /// Sets maximum number of search results when the request does not specify one.
    pub fn with_default_max_matches(mut self, max_matches: usize) -> Self {
        self.default_max_matches = max_matches;
        self
    }

    /// Sets maximum number of search results when the request does not specify one.
    pub fn set_default_max_matches(&mut self, max_matches: usize) {
        self.default_max_matches = max_matches;
    }

    /// Duration of camera animations the session starts on its own, e.g. presenting calculated
    /// routes.
    pub fn animation_duration(&self) -> Duration {
        self.animation_duration
    }

    /// Sets duration of camera animations the session starts on its own.
    pub fn with_animation_duration(mut self, duration: Duration) -> Self {
        self.animation_duration = duration;
        self
    }

    /// Sets duration of camera animations the session starts on its own.
    pub fn set_animation_duration(&mut self, duration: Duration) {
        self.animation_duration = duration;
    }

    /// Appearance of highlight sets produced by searches and route calculations.
    pub fn highlight_settings(&self) -> &HighlightRenderSettings {
        &self.highlight_settings
    }

    /// Sets appearance of highlight sets produced by searches and route calculations.
    pub fn with_highlight_settings(mut self, settings: HighlightRenderSettings) -> Self {
        self.highlight_settings = settings;
        self
    }

    /// Sets appearance of highlight sets produced by searches and route calculations.
    pub fn set_highlight_settings(&mut self, settings: HighlightRenderSettings) {
        self.highlight_settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.default_max_matches(), 40);
        assert_eq!(config.animation_duration(), Duration::from_millis(500));
    }

    #[test]
    fn builder_methods() {
        let mut config = SessionConfig::default()
            .with_default_max_matches(20)
            .with_animation_duration(Duration::from_secs(1));
        config.set_highlight_settings(HighlightRenderSettings::default().with_text_size(16.0));

        assert_eq!(config.default_max_matches(), 20);
        assert_eq!(config.animation_duration(), Duration::from_secs(1));
        assert_relative_eq!(config.highlight_settings().text_size, 16.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_uses_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"default_max_matches": 25}"#).expect("valid config");
        assert_eq!(config.default_max_matches(), 25);
        assert_eq!(config.animation_duration(), Duration::from_millis(500));
    }
}
