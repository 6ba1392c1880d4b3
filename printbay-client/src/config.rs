//! Client configuration

use std::time::Duration;

/// Artificial latency added to simulated responses
///
/// Keeps the simulated flow paced like the real service. Operations not
/// listed here answer immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationDelays {
    pub upload: Duration,
    pub analysis: Duration,
    pub pricing: Duration,
    pub order: Duration,
    pub payment: Duration,
}

impl SimulationDelays {
    /// No delays at all (tests)
    pub const fn none() -> Self {
        Self {
            upload: Duration::ZERO,
            analysis: Duration::ZERO,
            pricing: Duration::ZERO,
            order: Duration::ZERO,
            payment: Duration::ZERO,
        }
    }
}

impl Default for SimulationDelays {
    fn default() -> Self {
        Self {
            upload: Duration::from_millis(1500),
            analysis: Duration::from_millis(3000),
            pricing: Duration::from_millis(800),
            order: Duration::from_millis(1200),
            payment: Duration::from_millis(2000),
        }
    }
}

/// Client configuration for connecting to the storefront API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:7071")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Answer from the simulator when the network call fails
    pub fallback_enabled: bool,

    pub delays: SimulationDelays,

    /// Sent as `x-customer-id` on uploads
    pub customer_id: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
            fallback_enabled: true,
            delays: SimulationDelays::default(),
            customer_id: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn with_delays(mut self, delays: SimulationDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Absolute URL for an API path such as `/api/health`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:7071")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_single_slash() {
        let config = ClientConfig::new("http://localhost:7071/");
        assert_eq!(config.url("/api/health"), "http://localhost:7071/api/health");
        assert_eq!(config.url("api/health"), "http://localhost:7071/api/health");
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::default()
            .with_timeout(5)
            .with_fallback(false)
            .with_delays(SimulationDelays::none())
            .with_customer_id("cust-1");
        assert_eq!(config.timeout_secs, 5);
        assert!(!config.fallback_enabled);
        assert_eq!(config.delays.analysis, Duration::ZERO);
        assert_eq!(config.customer_id.as_deref(), Some("cust-1"));
    }

    #[test]
    fn test_default_delays() {
        let delays = SimulationDelays::default();
        assert_eq!(delays.upload, Duration::from_millis(1500));
        assert_eq!(delays.payment, Duration::from_millis(2000));
    }
}
