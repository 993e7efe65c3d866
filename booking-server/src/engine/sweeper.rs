//! Time-driven lifecycle sweeper.
//!
//! A periodic pass that scans for candidates and then moves each one with
//! the same conditional updates the API uses, so a concurrent check-in or
//! cancellation always wins the race cleanly:
//!
//! - CONFIRMED, never checked in, grace window fully elapsed -> NO_SHOW
//! - CHECKED_IN past its actual service end (opt-in)         -> COMPLETED
//! - PENDING past start plus grace (payment never settled)   -> EXPIRED
//! - ACTIVE offers past expiry                               -> EXPIRED

use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::db;
use crate::engine::lifecycle;
use crate::engine::slots::MILLIS_PER_MINUTE;
use crate::error::ServiceResult;
use crate::state::AppState;

/// Eligibility: the customer gets the grace period on top of the full
/// service window before being written off.
pub fn no_show_eligible(now: i64, start_time: i64, grace_minutes: i32, duration_minutes: i32) -> bool {
    now > start_time + (grace_minutes + duration_minutes) as i64 * MILLIS_PER_MINUTE
}

pub fn pending_expired(now: i64, start_time: i64, grace_minutes: i32) -> bool {
    now > start_time + grace_minutes as i64 * MILLIS_PER_MINUTE
}

/// A checked-in booking completes once its pinned service end has passed.
pub fn auto_complete_due(now: i64, service_end_time: Option<i64>) -> bool {
    service_end_time.is_some_and(|end| now > end)
}

/// Outcome of one sweep pass.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SweepSummary {
    pub no_shows_marked: u64,
    pub auto_completed: u64,
    pub pending_expired: u64,
    pub offers_expired: u64,
}

/// Last-pass snapshot exposed on the health surface.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweeperStatus {
    pub last_run_at: Option<i64>,
    pub runs: u64,
    pub last_pass: SweepSummary,
    pub totals: SweepSummary,
    pub last_error: Option<String>,
}

/// One full sweep pass.
pub async fn sweep_once(state: &AppState) -> ServiceResult<SweepSummary> {
    let now = state.now();
    let mut summary = SweepSummary::default();

    summary.offers_expired = db::offers::expire_stale(&state.pool, now).await?;

    // Candidate queries run without a lock, so every row is re-checked
    // against the eligibility predicate with this pass's clock before
    // the conditional update fires.
    for candidate in db::bookings::no_show_candidates(&state.pool, now).await? {
        let b = &candidate.booking;
        if !no_show_eligible(
            now,
            b.start_time,
            candidate.grace_period_minutes,
            candidate.duration_minutes,
        ) {
            continue;
        }
        let minutes_overdue = (now - b.start_time) / MILLIS_PER_MINUTE
            - (candidate.grace_period_minutes + candidate.duration_minutes) as i64;
        let details = json!({
            "grace_period_minutes": candidate.grace_period_minutes,
            "duration_minutes": candidate.duration_minutes,
            "minutes_overdue": minutes_overdue,
            "auto_processed": true,
        });
        let moved =
            db::bookings::mark_no_show(&state.pool, b.id, now, "customer never checked in", &details)
                .await?;
        if moved > 0 {
            summary.no_shows_marked += 1;
            tracing::info!(booking_id = b.id, minutes_overdue, "Sweeper marked no-show");
            lifecycle::notify(state, b, "booking.no_show", details);
        }
    }

    for candidate in db::bookings::auto_complete_candidates(&state.pool, now).await? {
        let b = &candidate.booking;
        if !auto_complete_due(now, b.service_end_time) {
            continue;
        }
        let actual_minutes = b
            .service_started_at
            .map(|started| (now - started) / MILLIS_PER_MINUTE);
        let details = json!({
            "actual_duration_minutes": actual_minutes,
            "auto_processed": true,
        });
        if db::bookings::mark_completed(&state.pool, b.id, now, true, &details).await? > 0 {
            summary.auto_completed += 1;
            tracing::info!(booking_id = b.id, "Sweeper auto-completed booking");
        }
    }

    for candidate in db::bookings::expired_pending_candidates(&state.pool, now).await? {
        let b = &candidate.booking;
        if !pending_expired(now, b.start_time, candidate.grace_period_minutes) {
            continue;
        }
        let minutes_overdue =
            (now - b.start_time) / MILLIS_PER_MINUTE - candidate.grace_period_minutes as i64;
        let details = json!({
            "grace_period_minutes": candidate.grace_period_minutes,
            "minutes_overdue": minutes_overdue,
            "auto_processed": true,
        });
        let moved = db::bookings::mark_expired(
            &state.pool,
            b.id,
            now,
            "payment never confirmed",
            &details,
        )
        .await?;
        if moved > 0 {
            summary.pending_expired += 1;
            tracing::info!(booking_id = b.id, "Sweeper expired unconfirmed booking");
        }
    }

    Ok(summary)
}

fn accumulate(totals: &mut SweepSummary, pass: SweepSummary) {
    totals.no_shows_marked += pass.no_shows_marked;
    totals.auto_completed += pass.auto_completed;
    totals.pending_expired += pass.pending_expired;
    totals.offers_expired += pass.offers_expired;
}

/// The periodic sweeper task. Runs until the shutdown token fires.
pub async fn run(state: AppState, shutdown: CancellationToken) {
    let period = std::time::Duration::from_secs(state.config.sweep_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tracing::info!(interval_secs = period.as_secs(), "Lifecycle sweeper started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Lifecycle sweeper stopping");
                return;
            }
            _ = ticker.tick() => {}
        }

        match sweep_once(&state).await {
            Ok(pass) => {
                let mut status = state.sweeper_status.write().await;
                status.last_run_at = Some(state.now());
                status.runs += 1;
                status.last_pass = pass;
                status.last_error = None;
                accumulate(&mut status.totals, pass);
            }
            Err(e) => {
                tracing::error!(error = %e, "Sweep pass failed");
                let mut status = state.sweeper_status.write().await;
                status.last_run_at = Some(state.now());
                status.runs += 1;
                status.last_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = MILLIS_PER_MINUTE;

    #[test]
    fn no_show_requires_full_window_plus_grace() {
        // 60-minute service, 10-minute grace: eligible strictly after start + 70
        let start = 1_750_000_000_000;
        assert!(!no_show_eligible(start + 69 * MIN, start, 10, 60));
        assert!(!no_show_eligible(start + 70 * MIN, start, 10, 60));
        assert!(no_show_eligible(start + 71 * MIN, start, 10, 60));
    }

    #[test]
    fn pending_expiry_uses_grace_only() {
        let start = 1_750_000_000_000;
        assert!(!pending_expired(start + 10 * MIN, start, 10));
        assert!(pending_expired(start + 11 * MIN, start, 10));
        assert!(!pending_expired(start - MIN, start, 10));
    }

    #[test]
    fn auto_complete_waits_for_the_pinned_end() {
        let end = 1_750_000_000_000;
        assert!(!auto_complete_due(end, Some(end)));
        assert!(auto_complete_due(end + 1, Some(end)));
        // Never checked in, no pinned end: not the sweeper's to complete
        assert!(!auto_complete_due(end + MIN, None));
    }

    #[test]
    fn summary_accumulates() {
        let mut totals = SweepSummary::default();
        accumulate(
            &mut totals,
            SweepSummary {
                no_shows_marked: 2,
                auto_completed: 1,
                pending_expired: 3,
                offers_expired: 1,
            },
        );
        accumulate(
            &mut totals,
            SweepSummary {
                no_shows_marked: 1,
                ..Default::default()
            },
        );
        assert_eq!(totals.no_shows_marked, 3);
        assert_eq!(totals.auto_completed, 1);
        assert_eq!(totals.pending_expired, 3);
        assert_eq!(totals.offers_expired, 1);
    }
}
