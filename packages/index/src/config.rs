//! Search configuration: distance unit, default radius, and result cap.

use parking_store::ConfigError;
use parking_store::config::parse_env_var;

use crate::distance::DistanceUnit;

/// Number of spots returned when no cap is configured.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Parameters of the ranking algorithm that are not part of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexConfig {
    /// Unit of the radius and of every reported distance.
    pub unit: DistanceUnit,
    /// Radius applied when a query omits one, in `unit`.
    pub default_radius: f64,
    /// Maximum number of spots per response.
    pub max_results: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DistanceUnit::default())
    }
}

impl IndexConfig {
    /// Configuration for `unit` with that unit's default radius.
    #[must_use]
    pub const fn new(unit: DistanceUnit) -> Self {
        Self {
            unit,
            default_radius: unit.default_radius(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Overrides the default radius.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] unless `radius` is positive and
    /// finite.
    pub fn with_default_radius(mut self, radius: f64) -> Result<Self, ConfigError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "PARKING_DEFAULT_RADIUS",
                value: radius.to_string(),
            });
        }
        self.default_radius = radius;
        Ok(self)
    }

    /// Overrides the result cap.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_results` is zero.
    pub fn with_max_results(mut self, max_results: usize) -> Result<Self, ConfigError> {
        if max_results == 0 {
            return Err(ConfigError::Invalid {
                name: "PARKING_MAX_RESULTS",
                value: max_results.to_string(),
            });
        }
        self.max_results = max_results;
        Ok(self)
    }

    /// Reads `PARKING_DISTANCE_UNIT`, `PARKING_DEFAULT_RADIUS`, and
    /// `PARKING_MAX_RESULTS`.
    ///
    /// When only the unit is set, the radius defaults to that unit's
    /// default so a kilometer radius is never read as miles.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let unit = parse_env_var::<DistanceUnit>("PARKING_DISTANCE_UNIT")?.unwrap_or_default();
        let mut config = Self::new(unit);

        if let Some(radius) = parse_env_var::<f64>("PARKING_DEFAULT_RADIUS")? {
            config = config.with_default_radius(radius)?;
        }
        if let Some(max_results) = parse_env_var::<usize>("PARKING_MAX_RESULTS")? {
            config = config.with_max_results(max_results)?;
        }

        Ok(config)
    }
}
