use rand::Rng;
use std::time::Duration;

use crate::config::CrashRestartSettings;

/// What to do after the gateway died unexpectedly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Start it again after `delay`
    RetryAfter { attempt: u32, delay: Duration },
    /// Budget exhausted; stay stopped until the user intervenes
    GiveUp { attempts: u32 },
    /// Automatic restarts are switched off
    Disabled,
}

/// Bounded restart budget with exponential backoff
///
/// The budget refills once the gateway has stayed up for `reset_after_ms`,
/// so an occasional crash days apart never exhausts it.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    settings: CrashRestartSettings,
    attempts: u32,
}

impl RestartPolicy {
    pub fn new(settings: CrashRestartSettings) -> Self {
        Self {
            settings,
            attempts: 0,
        }
    }

    /// Restart attempts made since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Decide how to react to a crash
    ///
    /// `uptime` is how long the crashed process ran; `None` when the restart
    /// attempt itself failed before the gateway came up.
    pub fn on_crash(&mut self, uptime: Option<Duration>) -> RestartDecision {
        if !self.settings.enabled {
            return RestartDecision::Disabled;
        }

        if let Some(uptime) = uptime {
            if uptime >= Duration::from_millis(self.settings.reset_after_ms) {
                self.attempts = 0;
            }
        }

        if self.attempts >= self.settings.max_attempts {
            return RestartDecision::GiveUp {
                attempts: self.attempts,
            };
        }

        self.attempts += 1;

        RestartDecision::RetryAfter {
            attempt: self.attempts,
            delay: self.backoff(self.attempts) + self.random_jitter(),
        }
    }

    /// Exponential delay for the given attempt, capped at `max_delay_ms`
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        let delay = self.settings.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.settings.max_delay_ms))
    }

    /// Random jitter in range [0, jitter_ms]
    fn random_jitter(&self) -> Duration {
        if self.settings.jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=self.settings.jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(max_attempts: u32, jitter_ms: u64) -> CrashRestartSettings {
        CrashRestartSettings {
            enabled: true,
            max_attempts,
            base_delay_ms: 1_000,
            max_delay_ms: 5_000,
            jitter_ms,
            reset_after_ms: 60_000,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut policy = RestartPolicy::new(settings(10, 0));

        let delays: Vec<Duration> = (0..5)
            .map(|_| match policy.on_crash(Some(Duration::from_secs(1))) {
                RestartDecision::RetryAfter { delay, .. } => delay,
                other => panic!("unexpected decision {:?}", other),
            })
            .collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(5),
                Duration::from_secs(5),
            ]
        );
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut policy = RestartPolicy::new(settings(2, 0));

        assert!(matches!(policy.on_crash(None), RestartDecision::RetryAfter { attempt: 1, .. }));
        assert!(matches!(policy.on_crash(None), RestartDecision::RetryAfter { attempt: 2, .. }));
        assert_eq!(policy.on_crash(None), RestartDecision::GiveUp { attempts: 2 });
        assert_eq!(policy.on_crash(None), RestartDecision::GiveUp { attempts: 2 });
    }

    #[test]
    fn long_uptime_refills_budget() {
        let mut policy = RestartPolicy::new(settings(1, 0));

        assert!(matches!(policy.on_crash(None), RestartDecision::RetryAfter { .. }));
        assert_eq!(policy.attempts(), 1);

        let decision = policy.on_crash(Some(Duration::from_secs(120)));

        assert!(matches!(decision, RestartDecision::RetryAfter { attempt: 1, .. }));
    }

    #[test]
    fn reset_clears_attempts() {
        let mut policy = RestartPolicy::new(settings(3, 0));
        policy.on_crash(None);
        policy.on_crash(None);

        policy.reset();

        assert_eq!(policy.attempts(), 0);
    }

    #[test]
    fn disabled_policy_never_restarts() {
        let mut policy = RestartPolicy::new(CrashRestartSettings {
            enabled: false,
            ..settings(3, 0)
        });

        assert_eq!(policy.on_crash(None), RestartDecision::Disabled);
        assert_eq!(policy.attempts(), 0);
    }

    #[test]
    fn jitter_stays_within_range() {
        let mut policy = RestartPolicy::new(settings(1, 200));

        for _ in 0..50 {
            policy.reset();
            match policy.on_crash(None) {
                RestartDecision::RetryAfter { delay, .. } => {
                    assert!(delay >= Duration::from_millis(1_000));
                    assert!(delay <= Duration::from_millis(1_200));
                }
                other => panic!("unexpected decision {:?}", other),
            }
        }
    }
}
