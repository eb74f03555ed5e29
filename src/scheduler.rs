//! Daily scheduling of download runs.

use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use std::fmt::Display;
use std::future::Future;

use crate::config::{ConfigError, SchedulerConfig};

/// Parse an `HH:MM` wall-clock time
pub fn parse_run_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| {
        ConfigError::Invalid(format!("scheduler.daily_run_time {:?}: {}", value, e))
    })
}

/// The first occurrence of `at` strictly after `now`
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Days::new(1)
    }
}

/// Runs a job once a day at a fixed local time
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    run_at: NaiveTime,
    run_immediately: bool,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            run_at: parse_run_time(&config.daily_run_time)?,
            run_immediately: config.run_immediately,
        })
    }

    pub fn run_at(&self) -> NaiveTime {
        self.run_at
    }

    /// Run `job` daily until `shutdown` resolves.
    ///
    /// A failed run is logged and the schedule continues.
    pub async fn run<F, Fut, E, S>(&self, mut job: F, shutdown: S)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.run_immediately {
            tracing::info!("Running immediately at startup");
            tokio::select! {
                _ = &mut shutdown => return,
                _ = run_job(&mut job) => {}
            }
        }

        loop {
            let now = Local::now().naive_local();
            let next = next_run_after(now, self.run_at);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!("Next run scheduled at {}", next.format("%Y-%m-%d %H:%M"));

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            run_job(&mut job).await;
        }
    }
}

async fn run_job<F, Fut, E>(job: &mut F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    if let Err(e) = job().await {
        tracing::error!("Scheduled run failed: {}", e);
    }
}
