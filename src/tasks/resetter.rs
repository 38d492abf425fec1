use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::utils::clock::Clock;

use super::service::TaskService;

/// Keeps routine tasks fresh while a terminal stays open: periodically asks
/// the service to flip elapsed recurring completions back to active.
pub struct AutoResetter<S> {
    service: S,
    shutdown: CancellationToken,
    check_interval: Duration,
    clock: Box<dyn Clock>,
}

impl<S: TaskService> AutoResetter<S> {
    pub fn new(
        service: S,
        shutdown: CancellationToken,
        check_interval: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            service,
            shutdown,
            check_interval,
            clock,
        }
    }

    /// Executes the reset event loop.
    pub async fn run(self) -> Result<()> {
        let mut check_point = self.clock.instant();
        loop {
            check_point += self.check_interval;

            match self.service.reset_completed_recurring().await {
                Ok(0) => debug!("No routines due for a reset"),
                Ok(count) => info!("Reset {count} routine task(s) back to active"),
                Err(e) => {
                    error!("Encountered an error during reset {e:?}")
                }
            }

            select! {
                // Cancellation stops the loop; the last reset has already been
                // written at this point.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(check_point) => ()
            }
        }
    }
}

/// Cancels the token when the process receives Ctrl-C.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::tempdir;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::storage::journal::TaskJournalImpl;
    use crate::tasks::entities::{NewTask, Recurrence};
    use crate::tasks::service::{LocalTaskService, TaskService};
    use crate::utils::clock::Clock;
    use crate::utils::logging::TEST_LOGGING;

    use super::AutoResetter;

    struct TestClock {
        now: Mutex<DateTime<Utc>>,
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    fn service_at(
        dir: &std::path::Path,
        now: DateTime<Utc>,
    ) -> LocalTaskService<TaskJournalImpl> {
        let journal = TaskJournalImpl::new(dir.to_owned()).unwrap();
        LocalTaskService::new(
            journal,
            Box::new(TestClock {
                now: Mutex::new(now),
            }),
        )
    }

    /// Smoke test for the loop: a daily task completed yesterday comes back
    /// while the resetter is running, and cancellation stops the loop.
    #[tokio::test]
    async fn smoke_test_auto_resetter() -> Result<()> {
        *TEST_LOGGING;

        let completed_at = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let dir = tempdir()?;

        let yesterday_service = service_at(dir.path(), completed_at);
        let id = yesterday_service
            .create_task(NewTask {
                title: "stretch".into(),
                recurrence: Some(Recurrence::Daily),
                ..NewTask::default()
            })
            .await?;
        yesterday_service.complete_task(id).await?;

        let today = completed_at + chrono::Duration::days(1);
        let shutdown_token = CancellationToken::new();
        let resetter = AutoResetter::new(
            service_at(dir.path(), today),
            shutdown_token.clone(),
            Duration::from_millis(50),
            Box::new(TestClock {
                now: Mutex::new(today),
            }),
        );

        let (_, run_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(120)).await;
                shutdown_token.cancel()
            },
            resetter.run(),
        );
        run_result?;

        let service = service_at(dir.path(), today);
        assert!(service.task(id).await?.unwrap().is_active());
        Ok(())
    }
}
