//! Named timer jobs over the tokio runtime.
//!
//! Jobs are grouped by exact name; one name may hold several handles (the
//! dzikir pair shares one, as do a user's same-day prayer one-shots).
//! Nothing is persisted; the boot reconciliation pass rebuilds jobs from
//! stored preference flags.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct JobHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Registry of named scheduled jobs, all evaluated in one fixed timezone.
///
/// Dropping the registry cancels everything it still holds.
pub struct TimerRegistry {
    zone: Tz,
    jobs: Mutex<HashMap<String, Vec<JobHandle>>>,
}

/// Map a local wall-clock datetime into the zone. An hour skipped by an
/// offset change resolves to the following hour.
fn resolve_local(zone: Tz, naive: NaiveDateTime) -> chrono::DateTime<Tz> {
    use chrono::TimeZone;
    match zone.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => resolve_local(zone, naive + chrono::Duration::hours(1)),
    }
}

fn drop_finished(jobs: &mut HashMap<String, Vec<JobHandle>>) {
    jobs.retain(|_, handles| {
        handles.retain(|h| !h.task.is_finished());
        !handles.is_empty()
    });
}

impl TimerRegistry {
    pub fn new(zone: Tz) -> Self {
        Self {
            zone,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Spawn a job that fires at `at` local time every day.
    pub async fn schedule_daily<F, Fut>(&self, name: &str, at: NaiveTime, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let token = CancellationToken::new();
        let signal = token.clone();
        let zone = self.zone;
        let task = tokio::spawn(async move {
            loop {
                let now = chrono::Utc::now().with_timezone(&zone);
                let mut next = resolve_local(zone, now.date_naive().and_time(at));
                if next <= now {
                    next = resolve_local(
                        zone,
                        (now.date_naive() + chrono::Duration::days(1)).and_time(at),
                    );
                }
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                tokio::select! {
                    _ = signal.cancelled() => break,
                    _ = tokio::time::sleep(wait) => job().await,
                }
            }
        });
        self.insert(name, token, task).await;
    }

    /// Spawn a one-shot at today's occurrence of `at` local time.
    ///
    /// Returns false without installing anything when that moment has
    /// already passed.
    pub async fn schedule_once_today<F>(&self, name: &str, at: NaiveTime, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let now = chrono::Utc::now().with_timezone(&self.zone);
        let target = resolve_local(self.zone, now.date_naive().and_time(at));
        if target <= now {
            return false;
        }
        let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
        self.schedule_once_after(name, wait, job).await;
        true
    }

    /// Spawn a one-shot after a fixed delay.
    pub async fn schedule_once_after<F>(&self, name: &str, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let signal = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = signal.cancelled() => {}
                _ = tokio::time::sleep(delay) => job.await,
            }
        });
        self.insert(name, token, task).await;
    }

    /// Cancel and remove every job under `name`. Returns how many there
    /// were; zero when the name is unknown.
    pub async fn cancel(&self, name: &str) -> usize {
        let mut jobs = self.jobs.lock().await;
        match jobs.remove(name) {
            Some(handles) => {
                for handle in &handles {
                    handle.token.cancel();
                    handle.task.abort();
                }
                debug!(name, jobs = handles.len(), "timer jobs cancelled");
                handles.len()
            }
            None => 0,
        }
    }

    /// Live jobs currently registered under `name`.
    pub async fn count(&self, name: &str) -> usize {
        let mut jobs = self.jobs.lock().await;
        drop_finished(&mut jobs);
        jobs.get(name).map_or(0, Vec::len)
    }

    /// Sorted names that still hold at least one live job.
    pub async fn active_names(&self) -> Vec<String> {
        let mut jobs = self.jobs.lock().await;
        drop_finished(&mut jobs);
        let mut names: Vec<String> = jobs.keys().cloned().collect();
        names.sort();
        names
    }

    async fn insert(&self, name: &str, token: CancellationToken, task: JoinHandle<()>) {
        let mut jobs = self.jobs.lock().await;
        drop_finished(&mut jobs);
        jobs.entry(name.to_string())
            .or_default()
            .push(JobHandle { token, task });
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        for handles in self.jobs.get_mut().values() {
            for handle in handles {
                handle.token.cancel();
                handle.task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::ZONE;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let c = Arc::new(AtomicUsize::new(0));
        (c.clone(), c)
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_after_fires_then_prunes() {
        let reg = TimerRegistry::new(ZONE);
        let (fired, probe) = counter();
        reg.schedule_once_after("job", Duration::from_secs(2), async move {
            fired.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert_eq!(reg.count("job").await, 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(probe.load(Ordering::SeqCst), 1);
        assert_eq!(reg.count("job").await, 0);
        assert!(reg.active_names().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let reg = TimerRegistry::new(ZONE);
        let (fired, probe) = counter();
        reg.schedule_once_after("job", Duration::from_secs(5), async move {
            fired.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert_eq!(reg.cancel("job").await, 1);
        assert_eq!(reg.cancel("job").await, 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(probe.load(Ordering::SeqCst), 0);
        assert_eq!(reg.count("job").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_name_groups_jobs() {
        let reg = TimerRegistry::new(ZONE);
        for _ in 0..2 {
            reg.schedule_once_after("pair", Duration::from_secs(60), async {})
                .await;
        }
        reg.schedule_once_after("other", Duration::from_secs(60), async {})
            .await;

        assert_eq!(reg.count("pair").await, 2);
        assert_eq!(reg.active_names().await, vec!["other", "pair"]);
        assert_eq!(reg.cancel("pair").await, 2);
        assert_eq!(reg.active_names().await, vec!["other"]);
    }

    #[tokio::test]
    async fn test_daily_job_registers_and_cancels() {
        let reg = TimerRegistry::new(ZONE);
        let at = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        reg.schedule_daily("refresh", at, || async {}).await;
        assert_eq!(reg.count("refresh").await, 1);
        assert_eq!(reg.cancel("refresh").await, 1);
        assert_eq!(reg.count("refresh").await, 0);
    }

    #[tokio::test]
    async fn test_once_today_rejects_past_times() {
        let reg = TimerRegistry::new(ZONE);
        let now = chrono::Utc::now().with_timezone(&ZONE);

        let past = now - chrono::Duration::minutes(5);
        if past.date_naive() == now.date_naive() {
            assert!(!reg.schedule_once_today("past", past.time(), async {}).await);
            assert_eq!(reg.count("past").await, 0);
        }

        let future = now + chrono::Duration::minutes(5);
        if future.date_naive() == now.date_naive() {
            assert!(reg.schedule_once_today("future", future.time(), async {}).await);
            assert_eq!(reg.count("future").await, 1);
        }
    }
}
