//! Annealing parameters.

use crate::error::Error;
use crate::routing::Router;
use serde::{Deserialize, Serialize};

/// Configuration for [`AnnealRunner`](super::AnnealRunner).
///
/// Deserializable with every field optional, so a partial TOML table
/// overrides only what it names.
///
/// # Examples
///
/// ```
/// use vnf_anneal::anneal::AnnealConfig;
///
/// let config = AnnealConfig::default()
///     .with_initial_temperature(500.0)
///     .with_alpha(0.9)
///     .with_max_iterations(200)
///     .with_taboo_capacity(3)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// Starting temperature. Also the base of the reset boost.
    pub initial_temperature: f64,

    /// Geometric cooling factor in (0, 1), applied once per outer iteration.
    pub alpha: f64,

    /// The run stops once the temperature falls below this floor.
    pub min_temperature: f64,

    /// Maximum number of outer iterations.
    pub max_iterations: usize,

    /// How many recently moved components are barred from moving again.
    pub taboo_capacity: usize,

    /// Random seed; `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Route and score each neighborhood with rayon. Needs the `parallel`
    /// feature; ignored otherwise.
    pub parallel: bool,

    /// Wall-clock budget in milliseconds, checked between outer iterations.
    pub time_limit_ms: Option<u64>,

    /// Path searches allowed per component pair while routing.
    pub max_route_attempts: Option<usize>,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            alpha: 0.95,
            min_temperature: 1e-3,
            max_iterations: 1000,
            taboo_capacity: 5,
            seed: None,
            parallel: false,
            time_limit_ms: None,
            max_route_attempts: None,
        }
    }
}

impl AnnealConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_taboo_capacity(mut self, n: usize) -> Self {
        self.taboo_capacity = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_max_route_attempts(mut self, n: usize) -> Self {
        self.max_route_attempts = Some(n);
        self
    }

    /// The router used for every neighbor.
    pub fn router(&self) -> Router {
        match self.max_route_attempts {
            Some(n) => Router::new().with_max_attempts(n),
            None => Router::new(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if self.initial_temperature.is_nan() || self.initial_temperature <= 0.0 {
            return invalid("initial_temperature must be positive".into());
        }
        if self.min_temperature.is_nan() || self.min_temperature <= 0.0 {
            return invalid("min_temperature must be positive".into());
        }
        if self.min_temperature >= self.initial_temperature {
            return invalid("min_temperature must be less than initial_temperature".into());
        }
        if self.alpha.is_nan() || self.alpha <= 0.0 || self.alpha >= 1.0 {
            return invalid(format!("alpha must be in (0, 1), got {}", self.alpha));
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".into());
        }
        if self.max_route_attempts == Some(0) {
            return invalid("max_route_attempts must be at least 1".into());
        }
        Ok(())
    }
}
