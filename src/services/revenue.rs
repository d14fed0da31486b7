use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::models::{Naira, RevenueTotals, RolloverReport};
use crate::services::access::{AccessControl, Actor};
use crate::storage::MemoryStore;

impl RevenueTotals {
    /// Zeroes every counter whose calendar period has ended since `last_update`.
    ///
    /// Periods are evaluated in the business time zone. A clock that moved
    /// backwards never resets anything.
    pub fn roll_over(&mut self, now: DateTime<Utc>, offset: FixedOffset) -> RolloverReport {
        let Some(last) = self.last_update else {
            return RolloverReport::default();
        };

        let then = last.with_timezone(&offset);
        let today = now.with_timezone(&offset);

        let (then_week, now_week) = (then.iso_week(), today.iso_week());
        let report = RolloverReport {
            daily: today.date_naive() > then.date_naive(),
            weekly: (now_week.year(), now_week.week()) > (then_week.year(), then_week.week()),
            monthly: (today.year(), today.month()) > (then.year(), then.month()),
            yearly: today.year() > then.year(),
        };

        if report.daily {
            self.daily = 0;
        }
        if report.weekly {
            self.weekly = 0;
        }
        if report.monthly {
            self.monthly = 0;
        }
        if report.yearly {
            self.yearly = 0;
        }
        if report.any() {
            self.last_update = Some(now);
        }
        report
    }

    /// Rolls over first so the sale lands in the period it happened in.
    ///
    /// A sum that would overflow leaves every counter untouched.
    pub fn record(&mut self, amount: Naira, now: DateTime<Utc>, offset: FixedOffset) -> Result<RolloverReport> {
        let mut next = self.clone();
        let report = next.roll_over(now, offset);
        let add = |total: Naira| {
            total
                .checked_add(amount)
                .ok_or_else(|| Error::Validation("revenue total is out of range".into()))
        };
        next.daily = add(next.daily)?;
        next.weekly = add(next.weekly)?;
        next.monthly = add(next.monthly)?;
        next.yearly = add(next.yearly)?;
        next.last_update = Some(now);
        *self = next;
        Ok(report)
    }
}

#[derive(Clone)]
pub struct RevenueService {
    store: Arc<MemoryStore>,
    access: AccessControl,
    offset: FixedOffset,
}

impl RevenueService {
    pub fn new(store: Arc<MemoryStore>, access: AccessControl, offset: FixedOffset) -> Self {
        Self { store, access, offset }
    }

    /// Totals as they read at `now`, without writing the rollover back.
    pub async fn snapshot(&self, actor: Option<&Actor>, now: DateTime<Utc>) -> Result<RevenueTotals> {
        self.access.require_staff(actor).await?;
        let mut totals = self.store.read(|db| db.revenue.clone()).await;
        totals.roll_over(now, self.offset);
        Ok(totals)
    }

    pub async fn roll_over(&self, now: DateTime<Utc>) -> Result<RolloverReport> {
        let offset = self.offset;
        self.store
            .transaction(|db| Ok(db.revenue.roll_over(now, offset)))
            .await
    }

    pub async fn reset(&self, actor: Option<&Actor>, now: DateTime<Utc>) -> Result<RevenueTotals> {
        self.access.require_owner(actor).await?;
        let totals = self
            .store
            .transaction(|db| {
                db.revenue = RevenueTotals {
                    last_update: Some(now),
                    ..RevenueTotals::default()
                };
                Ok(db.revenue.clone())
            })
            .await?;
        info!("Revenue totals reset by owner");
        Ok(totals)
    }

    /// Applies period rollover on wall-clock time, independent of anyone reading the totals.
    pub fn spawn_rollover_job(&self, every: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match service.roll_over(Utc::now()).await {
                    Ok(report) if report.any() => info!(
                        daily = report.daily,
                        weekly = report.weekly,
                        monthly = report.monthly,
                        yearly = report.yearly,
                        "Revenue periods rolled over"
                    ),
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Revenue rollover failed"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wat() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn totals(last: DateTime<Utc>) -> RevenueTotals {
        RevenueTotals {
            daily: 10,
            weekly: 20,
            monthly: 30,
            yearly: 40,
            last_update: Some(last),
        }
    }

    #[test]
    fn same_day_keeps_everything() {
        let mut t = totals(at(2025, 3, 12, 8));
        let report = t.roll_over(at(2025, 3, 12, 20), wat());
        assert!(!report.any());
        assert_eq!(t.daily, 10);
    }

    #[test]
    fn local_midnight_resets_daily_only() {
        // 23:30 UTC on Wednesday is already Thursday in WAT.
        let mut t = totals(at(2025, 3, 12, 10));
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 23, 30, 0).unwrap();
        let report = t.roll_over(now, wat());
        assert_eq!(report, RolloverReport { daily: true, ..RolloverReport::default() });
        assert_eq!((t.daily, t.weekly, t.monthly, t.yearly), (0, 20, 30, 40));
        assert_eq!(t.last_update, Some(now));
    }

    #[test]
    fn monday_starts_a_new_iso_week() {
        let mut t = totals(at(2025, 3, 16, 12)); // Sunday
        let report = t.roll_over(at(2025, 3, 17, 12), wat());
        assert!(report.daily && report.weekly);
        assert!(!report.monthly);
    }

    #[test]
    fn iso_week_spanning_new_year_is_not_a_new_week() {
        // 2024-12-30 (Mon) and 2025-01-02 (Thu) are both ISO week 1 of 2025.
        let mut t = totals(at(2024, 12, 30, 12));
        let report = t.roll_over(at(2025, 1, 2, 12), wat());
        assert!(report.daily && report.monthly && report.yearly);
        assert!(!report.weekly);
        assert_eq!(t.weekly, 20);
    }

    #[test]
    fn missed_visits_still_reset_on_next_check() {
        let mut t = totals(at(2025, 1, 15, 12));
        let report = t.roll_over(at(2025, 4, 2, 12), wat());
        assert!(report.daily && report.weekly && report.monthly);
        assert!(!report.yearly);
        assert_eq!(t.yearly, 40);
    }

    #[test]
    fn clock_moving_backwards_resets_nothing() {
        let mut t = totals(at(2025, 5, 2, 12));
        assert!(!t.roll_over(at(2025, 5, 1, 12), wat()).any());
    }

    #[test]
    fn record_lands_in_fresh_period() {
        let mut t = totals(at(2025, 3, 12, 10));
        t.record(500, at(2025, 3, 13, 10), wat()).unwrap();
        assert_eq!((t.daily, t.weekly, t.monthly, t.yearly), (500, 520, 530, 540));
    }

    #[test]
    fn overflowing_record_changes_nothing() {
        let mut t = totals(at(2025, 3, 12, 10));
        t.yearly = i64::MAX;
        let before = t.clone();
        assert!(matches!(t.record(1, at(2025, 3, 12, 11), wat()), Err(Error::Validation(_))));
        assert_eq!(t, before);
    }

    #[test]
    fn first_record_initialises_totals() {
        let mut t = RevenueTotals::default();
        let report = t.record(1_000, at(2025, 1, 1, 9), wat()).unwrap();
        assert!(!report.any());
        assert_eq!(t.daily, 1_000);
        assert!(t.last_update.is_some());
    }

    #[tokio::test]
    async fn reset_is_owner_only() {
        let store = Arc::new(MemoryStore::new());
        let access = AccessControl::new(store.clone(), "ceo");
        let service = RevenueService::new(store.clone(), access, wat());
        store
            .transaction(|db| {
                db.revenue.record(9_000, Utc::now(), wat())?;
                Ok(())
            })
            .await
            .unwrap();

        let customer = Actor::new("someone", Some("x@y.z"), "google.com");
        assert!(service.reset(Some(&customer), Utc::now()).await.is_err());

        let owner = Actor::new("ceo", Some("ceo@farm.ng"), "password");
        let totals = service.reset(Some(&owner), Utc::now()).await.unwrap();
        assert_eq!(totals.yearly, 0);
        assert_eq!(store.read(|db| db.revenue.daily).await, 0);
    }

    #[tokio::test]
    async fn rollover_job_applies_without_readers() {
        let store = Arc::new(MemoryStore::new());
        let access = AccessControl::new(store.clone(), "ceo");
        let service = RevenueService::new(store.clone(), access, wat());
        store
            .transaction(|db| {
                db.revenue = totals(at(2020, 1, 1, 12));
                Ok(())
            })
            .await
            .unwrap();

        let handle = service.spawn_rollover_job(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let revenue = store.read(|db| db.revenue.clone()).await;
        assert_eq!((revenue.daily, revenue.yearly), (0, 0));
    }
}
