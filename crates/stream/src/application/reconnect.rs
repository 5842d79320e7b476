use std::time::Duration;

/// Delay schedule between reconnect attempts
///
/// `delay = initial_delay * backoff_factor^attempt`, capped at `max_delay`,
/// plus a random jitter of up to `jitter * delay`. Attempts never run out:
/// the client retries until it reconnects or is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt after a failure
    pub initial_delay: Duration,
    /// Ceiling applied before jitter
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Fraction of the base delay added at random, `0.0` disables jitter
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            jitter: 0.5,
        }
    }
}

impl ReconnectPolicy {
    /// Same delay before every attempt, no jitter
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            backoff_factor: 1.0,
            jitter: 0.0,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before attempt `attempt` (0-based), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0);
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * factor.powi(exponent);
        let max = self.max_delay.max(self.initial_delay);

        if !secs.is_finite() || secs >= max.as_secs_f64() {
            max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Delay before attempt `attempt` (0-based), jitter included
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return base;
        }

        let extra = base.as_secs_f64() * jitter * rand::random::<f64>();
        base + Duration::from_secs_f64(extra)
    }
}
