//! Readiness probe: poll a dependent service until it accepts connections.

use crate::compose::ContainerDriver;
use crate::config::{Config, ProbeConfig};
use crate::error::{DevkitError, Result};
use std::time::Duration;

/// How long to keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    /// `None` retries until the process is interrupted.
    pub max_attempts: Option<u32>,
}

impl From<&ProbeConfig> for WaitPolicy {
    fn from(cfg: &ProbeConfig) -> Self {
        Self {
            interval: cfg.interval(),
            max_attempts: cfg.max_attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Probe invocations including the successful one.
    pub attempts: u32,
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Invoke `probe` until it reports ready.
///
/// `Ok(false)` and `Err(_)` both mean "not yet ready". Between failed attempts
/// the sleeper waits `policy.interval` and `on_retry` receives the number of
/// the attempt that just failed. With a bounded policy, the last failed
/// attempt returns `ProbeExhausted` without sleeping again.
pub fn wait_ready<P, S, F>(
    mut probe: P,
    policy: &WaitPolicy,
    sleeper: &S,
    mut on_retry: F,
) -> Result<ProbeOutcome>
where
    P: FnMut() -> Result<bool>,
    S: Sleeper + ?Sized,
    F: FnMut(u32),
{
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match probe() {
            Ok(true) => {
                tracing::debug!(attempt, "probe ready");
                return Ok(ProbeOutcome { attempts: attempt });
            }
            Ok(false) => tracing::debug!(attempt, "probe not ready"),
            Err(e) => tracing::debug!(attempt, error = %e, "probe errored; treating as not ready"),
        }

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return Err(DevkitError::ProbeExhausted { attempts: attempt });
        }
        on_retry(attempt);
        sleeper.sleep(policy.interval);
    }
}

/// `pg_isready` against the configured database service, using credentials
/// from the environment (falling back to the config defaults).
pub fn database_ready(config: &Config, driver: &dyn ContainerDriver) -> Result<bool> {
    let db = &config.database;
    let args = vec![
        "pg_isready".to_string(),
        "-U".to_string(),
        db.username(),
        "-d".to_string(),
        db.database(),
    ];
    driver.exec_succeeds(&db.service, None, &args)
}
