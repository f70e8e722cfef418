//! Observation configuration.
//!
//! Configuration is plain data with serde support, so a test suite can keep
//! it next to its type catalog as JSON. Builders validate as they go;
//! deserialized configuration is validated by [`ObservationConfig::from_json`].

use crate::classifier::conventions::{
    ObserverConvention, PropertyChangeConvention, RegistrationConvention,
    TypicalListenerConvention,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The built-in registration conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConventionKind {
    /// `add/removePropertyChangeListener([String,] PropertyChangeListener)`
    PropertyChange,
    /// `add<X>Listener(s)` / `remove<X>Listener(s)`
    TypicalListener,
    /// `addObserver(Observer)` / `deleteObserver(Observer)`
    Observer,
}

impl ConventionKind {
    /// Instantiates the convention.
    pub fn convention(self) -> Arc<dyn RegistrationConvention> {
        match self {
            Self::PropertyChange => Arc::new(PropertyChangeConvention),
            Self::TypicalListener => Arc::new(TypicalListenerConvention),
            Self::Observer => Arc::new(ObserverConvention),
        }
    }

    /// The default conventions in the order they are applied.
    ///
    /// Property-change registrations look like typical listener registrations,
    /// so the property-change convention has to see them first.
    pub fn defaults() -> Vec<Self> {
        vec![Self::PropertyChange, Self::TypicalListener, Self::Observer]
    }
}

/// Settings for an [`Observatory`](crate::Observatory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationConfig {
    /// Fail dispatch when an event resolves to zero registered listeners.
    ///
    /// Off by default: firing an event nobody listens to returns zero.
    pub strict_listener_check: bool,
    /// Registration conventions in the order they are applied.
    pub conventions: Vec<ConventionKind>,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            strict_listener_check: false,
            conventions: ConventionKind::defaults(),
        }
    }
}

impl ObservationConfig {
    /// Default configuration with strict listener checking.
    pub fn strict() -> Self {
        Self::default().with_strict_listener_check(true)
    }

    /// Enables or disables strict listener checking.
    #[must_use]
    pub const fn with_strict_listener_check(mut self, strict: bool) -> Self {
        self.strict_listener_check = strict;
        self
    }

    /// Replaces the convention list.
    pub fn with_conventions(
        mut self,
        conventions: impl IntoIterator<Item = ConventionKind>,
    ) -> Result<Self, ConfigError> {
        self.conventions = conventions.into_iter().collect();
        self.validate()?;
        Ok(self)
    }

    /// Parses and validates configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conventions.is_empty() {
            return Err(ConfigError::NoConventions);
        }
        Ok(())
    }

    /// Instantiates the configured conventions in order, without duplicates.
    pub fn build_conventions(&self) -> Vec<Arc<dyn RegistrationConvention>> {
        let mut seen = Vec::with_capacity(self.conventions.len());
        for kind in &self.conventions {
            if !seen.contains(kind) {
                seen.push(*kind);
            }
        }
        seen.into_iter().map(ConventionKind::convention).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lenient_with_all_conventions() {
        let config = ObservationConfig::default();
        assert!(!config.strict_listener_check);
        assert_eq!(
            config.conventions,
            vec![
                ConventionKind::PropertyChange,
                ConventionKind::TypicalListener,
                ConventionKind::Observer
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_yields_defaults() {
        assert_eq!(
            ObservationConfig::from_json("{}").unwrap(),
            ObservationConfig::default()
        );
    }

    #[test]
    fn json_overrides_fields() {
        let config = ObservationConfig::from_json(
            r#"{ "strict_listener_check": true, "conventions": ["observer"] }"#,
        )
        .unwrap();
        assert!(config.strict_listener_check);
        assert_eq!(config.conventions, vec![ConventionKind::Observer]);
    }

    #[test]
    fn empty_convention_list_is_rejected() {
        assert_eq!(
            ObservationConfig::from_json(r#"{ "conventions": [] }"#),
            Err(ConfigError::NoConventions)
        );
        assert_eq!(
            ObservationConfig::default().with_conventions([]),
            Err(ConfigError::NoConventions)
        );
    }

    #[test]
    fn unknown_convention_is_a_parse_error() {
        assert!(matches!(
            ObservationConfig::from_json(r#"{ "conventions": ["callbacks"] }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn duplicate_conventions_are_built_once() {
        let config = ObservationConfig::default()
            .with_conventions([
                ConventionKind::Observer,
                ConventionKind::Observer,
                ConventionKind::TypicalListener,
            ])
            .unwrap();
        let names: Vec<_> = config
            .build_conventions()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["observer", "typical_listener"]);
    }

    #[test]
    fn strict_builder() {
        assert!(ObservationConfig::strict().strict_listener_check);
    }
}
