#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Timing knobs for the live core. All durations in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveConfig {
    /// Minimum gap between two status pop-ups.
    pub notify_interval_ms: u64,
    /// Trailing window after a batch during which filter clicks are still dropped.
    pub grace_ms: u64,
    /// Delay before a restored filter is applied on load.
    pub restore_delay_ms: u64,
    pub pulse_ms: u64,
    pub toast_ms: u64,
    pub highlight_ms: u64,
    /// Runtime ticker period for firing due timers.
    pub tick_ms: u64,
    pub channel_cap: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            notify_interval_ms: 5000,
            grace_ms: 100,
            restore_delay_ms: 100,
            pulse_ms: 500,
            toast_ms: 3000,
            highlight_ms: 500,
            tick_ms: 8,
            channel_cap: 1024,
        }
    }
}

impl LiveConfig {
    /// Defaults overridden by `NETPULSE_*` environment variables; unparsable values are ignored.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            notify_interval_ms: env_or("NETPULSE_NOTIFY_INTERVAL_MS", d.notify_interval_ms),
            grace_ms: env_or("NETPULSE_GRACE_MS", d.grace_ms),
            restore_delay_ms: env_or("NETPULSE_RESTORE_DELAY_MS", d.restore_delay_ms),
            pulse_ms: env_or("NETPULSE_PULSE_MS", d.pulse_ms),
            toast_ms: env_or("NETPULSE_TOAST_MS", d.toast_ms),
            highlight_ms: env_or("NETPULSE_HIGHLIGHT_MS", d.highlight_ms),
            tick_ms: env_or("NETPULSE_TICK_MS", d.tick_ms).max(1),
            channel_cap: env_or("NETPULSE_QUEUE_CAP", d.channel_cap).max(1),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_timings() {
        let c = LiveConfig::default();
        assert_eq!(c.notify_interval_ms, 5000);
        assert_eq!(c.grace_ms, 100);
        assert_eq!(c.restore_delay_ms, 100);
    }

    #[test]
    fn env_overrides_and_bad_values_fall_back() {
        std::env::set_var("NETPULSE_GRACE_MS", "250");
        std::env::set_var("NETPULSE_TOAST_MS", "soon");
        let c = LiveConfig::from_env();
        std::env::remove_var("NETPULSE_GRACE_MS");
        std::env::remove_var("NETPULSE_TOAST_MS");
        assert_eq!(c.grace_ms, 250);
        assert_eq!(c.toast_ms, 3000);
    }
}
