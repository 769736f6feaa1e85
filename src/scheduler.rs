// =============================================================================
// Refresh Scheduler — fixed daily wall-clock quote refreshes
// =============================================================================
//
// Fires a quote refresh at each configured local time of day (09:00 and 15:00
// by default), then re-arms for the next one. Runs as its own Tokio task,
// waking every `poll_interval` (<= 60 s) to compare the injected clock against
// the armed fire time, so it never sits on the request path.
//
// A failed scheduled refresh is logged and the cached snapshot stays as it
// was. The loop exits when the shutdown watch flips to `true`.
//
//   tokio::spawn(scheduler.run(quotes, shutdown_rx));
//
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::quote::QuoteService;

/// Upper bound on how long the scheduler sleeps between clock checks.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for the scheduler.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock in the service's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

// =============================================================================
// DailySchedule
// =============================================================================

/// Sorted, de-duplicated times of day at which a refresh should fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    times: Vec<NaiveTime>,
}

impl DailySchedule {
    pub fn new(mut times: Vec<NaiveTime>) -> Self {
        times.sort();
        times.dedup();
        Self { times }
    }

    /// Parse `HH:MM` entries.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let times = specs
            .iter()
            .map(|s| {
                let s = s.as_ref().trim();
                NaiveTime::parse_from_str(s, "%H:%M")
                    .with_context(|| format!("invalid refresh time '{s}', expected HH:MM"))
            })
            .collect::<Result<Vec<_>>>()?;
        if times.is_empty() {
            bail!("refresh schedule needs at least one time of day");
        }
        Ok(Self::new(times))
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// First scheduled instant strictly after `now`, in `now`'s time zone.
    ///
    /// Local times that do not exist on a given day (DST gaps) are skipped.
    pub fn next_fire_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let today = now.date_naive();

        (0..=2)
            .filter_map(|offset| today.checked_add_signed(chrono::Duration::days(offset)))
            .flat_map(|day| self.times.iter().map(move |t| day.and_time(*t)))
            .filter_map(|naive| tz.from_local_datetime(&naive).earliest())
            .find(|candidate| candidate > now)
    }
}

// =============================================================================
// Alarm
// =============================================================================

/// The armed next fire time of a [`DailySchedule`]: Idle until due, then
/// fires once and re-arms.
#[derive(Debug, Clone)]
pub struct Alarm<Tz: TimeZone> {
    schedule: DailySchedule,
    next: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> Alarm<Tz> {
    pub fn arm(schedule: DailySchedule, now: &DateTime<Tz>) -> Self {
        let next = schedule.next_fire_after(now);
        Self { schedule, next }
    }

    pub fn next_fire(&self) -> Option<&DateTime<Tz>> {
        self.next.as_ref()
    }

    /// `true` if the alarm was due at `now`; the alarm is then re-armed for
    /// the next slot after `now`. Missed slots collapse into a single fire.
    pub fn poll(&mut self, now: &DateTime<Tz>) -> bool {
        let due = self.next.as_ref().is_some_and(|due| now >= due);
        if due {
            self.next = self.schedule.next_fire_after(now);
        }
        due
    }
}

// =============================================================================
// RefreshScheduler
// =============================================================================

pub struct RefreshScheduler {
    schedule: DailySchedule,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl RefreshScheduler {
    pub fn new(schedule: DailySchedule, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            schedule,
            clock,
            poll_interval: poll_interval.min(MAX_POLL_INTERVAL),
        }
    }

    /// Run until `shutdown` becomes `true` (or its sender is dropped).
    pub async fn run(self, quotes: Arc<QuoteService>, mut shutdown: watch::Receiver<bool>) {
        let mut alarm = Alarm::arm(self.schedule.clone(), &self.clock.now());
        info!(
            times = ?self.schedule.times(),
            poll_ms = self.poll_interval.as_millis() as u64,
            next = ?alarm.next_fire(),
            "Refresh scheduler started"
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        break;
                    }
                    continue;
                }
            }

            let now = self.clock.now();
            if !alarm.poll(&now) {
                continue;
            }

            info!(at = %now, "Scheduled quote refresh firing");
            if let Err(e) = quotes.refresh().await {
                error!(kind = e.kind(), error = %e, "Scheduled quote refresh failed; serving stale data");
            }
            info!(next = ?alarm.next_fire(), "Next scheduled refresh armed");
        }

        info!("Refresh scheduler stopped");
    }
}
