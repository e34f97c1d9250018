//! Notification orchestrator and delivery handlers.
//!
//! Per (user, kind) the orchestrator is a two-state machine driven by
//! toggle callbacks: enabling flips the stored flag atomically, clears any
//! stray jobs, and installs the kind's timers; disabling flips the flag
//! and cancels every job under the kind's names, same-day prayer one-shots
//! included. Boot reconciliation replays the stored flags of every active
//! user into the registry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveTime, Weekday};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use ibadah_db::IbadahDb;
use ibadah_report::{ReportPeriod, generate_report};
use ibadah_types::{DzikirTime, NotifKind, Prayer, PrayerSchedule, escape_markdown_v2};

use crate::registry::TimerRegistry;
use crate::{Motivator, ScheduleSource, Transport, ZONE};

const KICKOFF_DELAY: Duration = Duration::from_secs(2);
const REMINDER_LEAD_MINUTES: i64 = 15;

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("clock literal")
}

/// One entry of a same-day prayer installation plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedJob {
    pub prayer: Prayer,
    pub arrival: NaiveTime,
    /// Early-reminder slot, present only when still strictly in the future.
    pub reminder: Option<NaiveTime>,
}

/// Derive the one-shots to install from today's schedule at local time
/// `now`. Prayers whose time has passed are skipped entirely; a reminder
/// is planned only when arrival−15min is still ahead.
pub fn plan_prayer_jobs(schedule: &PrayerSchedule, now: NaiveTime) -> Vec<PlannedJob> {
    let mut plan = Vec::new();
    for prayer in Prayer::ORDER {
        let Some(arrival) = schedule.time_of(prayer) else {
            warn!(prayer = prayer.name(), "unparseable prayer time, skipped");
            continue;
        };
        if arrival <= now {
            continue;
        }
        let early = arrival - chrono::Duration::minutes(REMINDER_LEAD_MINUTES);
        // NaiveTime subtraction wraps at midnight; a wrapped value is not
        // a valid same-day reminder.
        let reminder = (early < arrival && early > now).then_some(early);
        plan.push(PlannedJob {
            prayer,
            arrival,
            reminder,
        });
    }
    plan
}

struct Inner {
    db: IbadahDb,
    registry: TimerRegistry,
    transport: Arc<dyn Transport>,
    schedules: Arc<dyn ScheduleSource>,
    motivator: Arc<dyn Motivator>,
    zone: Tz,
}

/// Handle on the notification engine. Cheap to clone; clones share the
/// registry and capability objects.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    pub fn new(
        db: IbadahDb,
        transport: Arc<dyn Transport>,
        schedules: Arc<dyn ScheduleSource>,
        motivator: Arc<dyn Motivator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                registry: TimerRegistry::new(ZONE),
                transport,
                schedules,
                motivator,
                zone: ZONE,
            }),
        }
    }

    /// Registry names a kind's jobs live under.
    fn kind_names(kind: NotifKind, user_id: i64) -> Vec<String> {
        let base = format!("notif_{}_{}", kind.key(), user_id);
        match kind {
            NotifKind::Sholat => vec![format!("immediate_{base}"), base],
            _ => vec![base],
        }
    }

    /// Flip one notification flag and bring the registry in line with the
    /// new value. Returns the new state.
    pub async fn toggle(&self, user_id: i64, kind: NotifKind) -> anyhow::Result<bool> {
        let enabled = self.inner.db.toggle_notification(user_id, kind).await?;
        if enabled {
            self.install(user_id, kind).await;
        } else {
            self.retract(user_id, kind).await;
        }
        info!(user_id, kind = kind.key(), enabled, "notification toggled");
        Ok(enabled)
    }

    /// Install the kinds wired at onboarding completion. The stored flags
    /// all default to on; only these three get timers until the user
    /// visits the settings menu or the next boot reconciles.
    pub async fn enable_defaults(&self, user_id: i64) {
        for kind in NotifKind::DEFAULTS {
            self.install(user_id, kind).await;
        }
        info!(user_id, "default notifications installed");
    }

    /// Rebuild timers for every active user from their stored flags.
    /// Called once at boot; timers have no other persistence.
    pub async fn reconcile(&self) -> anyhow::Result<()> {
        let users = self.inner.db.active_users().await?;
        let mut installed = 0usize;
        for user in &users {
            for kind in NotifKind::ALL {
                if user.notif.get(kind) {
                    self.install(user.user_id, kind).await;
                    installed += 1;
                }
            }
        }
        info!(users = users.len(), kinds = installed, "notification timers reconciled");
        Ok(())
    }

    async fn retract(&self, user_id: i64, kind: NotifKind) {
        for name in Self::kind_names(kind, user_id) {
            self.inner.registry.cancel(&name).await;
        }
    }

    async fn install(&self, user_id: i64, kind: NotifKind) {
        // Clear strays first so a re-enable never doubles up.
        self.retract(user_id, kind).await;

        let base = format!("notif_{}_{}", kind.key(), user_id);
        let registry = &self.inner.registry;
        match kind {
            NotifKind::Sholat => {
                let this = self.clone();
                registry
                    .schedule_daily(&base, at(2, 0), move || {
                        let this = this.clone();
                        async move { this.refresh_prayer_jobs(user_id).await }
                    })
                    .await;
                let this = self.clone();
                registry
                    .schedule_once_after(&format!("immediate_{base}"), KICKOFF_DELAY, async move {
                        this.refresh_prayer_jobs(user_id).await
                    })
                    .await;
            }
            NotifKind::Rangkuman => {
                let this = self.clone();
                registry
                    .schedule_daily(&base, at(21, 30), move || {
                        let this = this.clone();
                        async move { this.send_daily_summary(user_id).await }
                    })
                    .await;
            }
            NotifKind::Dzikir => {
                for (time, slot) in [(at(6, 30), DzikirTime::Pagi), (at(16, 30), DzikirTime::Petang)]
                {
                    let this = self.clone();
                    registry
                        .schedule_daily(&base, time, move || {
                            let this = this.clone();
                            async move { this.send_dzikir(user_id, slot).await }
                        })
                        .await;
                }
            }
            NotifKind::Dhuha => {
                let this = self.clone();
                registry
                    .schedule_daily(&base, at(9, 0), move || {
                        let this = this.clone();
                        async move { this.send_dhuha(user_id).await }
                    })
                    .await;
            }
            NotifKind::Jumat => {
                let this = self.clone();
                registry
                    .schedule_daily(&base, at(7, 0), move || {
                        let this = this.clone();
                        async move { this.send_jumat(user_id).await }
                    })
                    .await;
            }
            NotifKind::Motivasi => {
                let this = self.clone();
                registry
                    .schedule_daily(&base, at(7, 0), move || {
                        let this = this.clone();
                        async move { this.send_daily_motivation(user_id).await }
                    })
                    .await;
            }
        }
        debug!(user_id, kind = kind.key(), "notification jobs installed");
    }

    fn now_local(&self) -> chrono::DateTime<Tz> {
        chrono::Utc::now().with_timezone(&self.inner.zone)
    }

    fn today(&self) -> String {
        self.now_local().format("%Y-%m-%d").to_string()
    }

    async fn send(&self, user_id: i64, text: &str) {
        if let Err(e) = self.inner.transport.send_markdown(user_id, text).await {
            warn!(user_id, "notification send failed: {e:#}");
        }
    }

    /// Fetch today's schedule for the user and install the remaining
    /// arrival and early-reminder one-shots under the kind's base name.
    async fn refresh_prayer_jobs(&self, user_id: i64) {
        let user = match self.inner.db.find_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(user_id, "prayer refresh for unknown user");
                return;
            }
            Err(e) => {
                warn!(user_id, "user lookup failed: {e}");
                return;
            }
        };
        let Some(location) = user.location else {
            self.send(
                user_id,
                "⚠️ Lokasi Anda belum diatur\\. Silakan buka menu *Waktu Sholat* untuk mengatur lokasi agar pengingat sholat dapat berjalan\\.",
            )
            .await;
            return;
        };

        let today = self.now_local().date_naive();
        let schedule = match self.inner.schedules.schedule_for(&location, today).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => {
                self.send_schedule_failure(user_id, &location).await;
                return;
            }
            Err(e) => {
                warn!(user_id, %location, "schedule fetch failed: {e:#}");
                self.send_schedule_failure(user_id, &location).await;
                return;
            }
        };

        let base = format!("notif_sholat_{user_id}");
        let now = self.now_local().time();
        let mut installed = 0usize;
        for job in plan_prayer_jobs(&schedule, now) {
            let prayer = job.prayer;
            let this = self.clone();
            if self
                .inner
                .registry
                .schedule_once_today(&base, job.arrival, async move {
                    this.send_prayer_arrival(user_id, prayer).await
                })
                .await
            {
                installed += 1;
            }
            if let Some(early) = job.reminder {
                let this = self.clone();
                self.inner
                    .registry
                    .schedule_once_today(&base, early, async move {
                        this.send_prayer_reminder(user_id, prayer).await
                    })
                    .await;
            }
        }
        debug!(user_id, jobs = installed, "prayer one-shots refreshed");
    }

    async fn send_schedule_failure(&self, user_id: i64, location: &str) {
        let text = format!(
            "⚠️ Gagal mengambil jadwal sholat untuk *{}*\\. Pengingat sholat hari ini tidak dapat dipasang\\.",
            escape_markdown_v2(location)
        );
        self.send(user_id, &text).await;
    }

    async fn send_prayer_arrival(&self, user_id: i64, prayer: Prayer) {
        let text = format!(
            "🕌 Waktu sholat *{}* telah tiba\\. Selamat menunaikan ibadah sholat\\.",
            prayer.name()
        );
        self.send(user_id, &text).await;
        self.nudge_predecessor(user_id, prayer).await;
    }

    /// Fires 15 minutes ahead of a prayer, and only speaks when the
    /// previous prayer in the daily order is still logged "Belum". Subuh
    /// has no predecessor, so its reminder slot stays silent.
    async fn send_prayer_reminder(&self, user_id: i64, prayer: Prayer) {
        let Some(pred) = prayer.predecessor() else {
            return;
        };
        let log = match self.inner.db.get_or_create_daily_log(user_id, &self.today()).await {
            Ok(log) => log,
            Err(e) => {
                warn!(user_id, "daily log lookup failed: {e}");
                return;
            }
        };
        if log.is_done(pred.name()) {
            return;
        }
        let text = format!(
            "❗️ Pengingat: 15 menit lagi masuk waktu *{}*\\. Sepertinya sholat *{}* Anda belum ditandai selesai\\.",
            prayer.name(),
            pred.name()
        );
        self.send(user_id, &text).await;
    }

    /// When the previous prayer in the daily order is still logged
    /// "Belum", add a supplementary nudge. Subuh has no predecessor and
    /// never nudges.
    async fn nudge_predecessor(&self, user_id: i64, prayer: Prayer) {
        let Some(pred) = prayer.predecessor() else {
            return;
        };
        let log = match self.inner.db.get_or_create_daily_log(user_id, &self.today()).await {
            Ok(log) => log,
            Err(e) => {
                warn!(user_id, "daily log lookup failed: {e}");
                return;
            }
        };
        if log.is_done(pred.name()) {
            return;
        }
        let text = format!(
            "🔔 Sholat *{}* Anda hari ini masih tercatat *Belum*\\. Jika sudah menunaikannya, perbarui checklist Anda ya\\.",
            pred.name()
        );
        self.send(user_id, &text).await;
    }

    /// Relays today's report as-is; the AI motivation belongs to the
    /// 07:00 motivasi kind.
    async fn send_daily_summary(&self, user_id: i64) {
        let today = self.today();
        let logs = match self.inner.db.logs_for_period(user_id, &today, &today).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!(user_id, "summary log fetch failed: {e}");
                return;
            }
        };
        self.send(user_id, &generate_report(&logs, ReportPeriod::Harian)).await;
    }

    async fn send_daily_motivation(&self, user_id: i64) {
        let yesterday = (self.now_local().date_naive() - chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let logs = match self
            .inner
            .db
            .logs_for_period(user_id, &yesterday, &yesterday)
            .await
        {
            Ok(logs) => logs,
            Err(e) => {
                warn!(user_id, "motivation log fetch failed: {e}");
                return;
            }
        };
        let motivation = self.inner.motivator.daily_motivation(&logs).await;
        let text = format!("🌅 *Motivasi Pagi*{motivation}");
        self.send(user_id, &text).await;
    }

    async fn send_dzikir(&self, user_id: i64, when: DzikirTime) {
        let raw = self.inner.motivator.dzikir_motivation(when).await;
        let text = format!(
            "🤲 *Waktu Dzikir {} telah tiba*\n\n{}",
            when.label(),
            escape_markdown_v2(&raw)
        );
        self.send(user_id, &text).await;
    }

    async fn send_dhuha(&self, user_id: i64) {
        let raw = self.inner.motivator.dhuha_motivation().await;
        let text = format!("☀️ *Waktunya Sholat Dhuha*\n\n{}", escape_markdown_v2(&raw));
        self.send(user_id, &text).await;
    }

    /// Fires daily at 07:00 but only speaks on Thursday (malam Jumat
    /// preparation) and Friday.
    async fn send_jumat(&self, user_id: i64) {
        let weekday = self.now_local().weekday();
        if weekday != Weekday::Thu && weekday != Weekday::Fri {
            return;
        }
        let raw = self.inner.motivator.jumat_motivation().await;
        let text = format!("🕌 *Amalan Hari Jumat*\n\n{}", escape_markdown_v2(&raw));
        self.send(user_id, &text).await;
    }
}
