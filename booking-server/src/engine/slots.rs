//! Slot availability math.
//!
//! All functions here are pure: they take an explicit `now` (UTC epoch
//! milliseconds) and pre-fetched booking counts, and never touch the
//! database. Store hours are expressed in minutes from local midnight;
//! converting a local wall time to an instant subtracts the store's fixed
//! UTC offset.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use shared::models::{Branch, Service, Store};

pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// A store's effective schedule for slot enumeration.
///
/// Branch hour fields override the store's when present; the UTC offset is
/// always the store's.
#[derive(Debug, Clone)]
pub struct DaySchedule {
    pub open_minutes: i32,
    pub close_minutes: i32,
    /// ISO weekday numbers, 1 = Monday .. 7 = Sunday
    pub working_days: Vec<i32>,
    pub utc_offset_minutes: i32,
}

impl DaySchedule {
    pub fn resolve(store: &Store, branch: Option<&Branch>) -> Self {
        let (open, close, days) = match branch {
            Some(b) => (
                b.open_minutes.unwrap_or(store.open_minutes),
                b.close_minutes.unwrap_or(store.close_minutes),
                b.working_days.clone().unwrap_or_else(|| store.working_days.clone()),
            ),
            None => (
                store.open_minutes,
                store.close_minutes,
                store.working_days.clone(),
            ),
        };
        Self {
            open_minutes: open,
            close_minutes: close,
            working_days: days,
            utc_offset_minutes: store.utc_offset_minutes,
        }
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        let iso_day = date.weekday().number_from_monday() as i32;
        self.working_days.contains(&iso_day)
    }
}

/// One bookable slot on the availability grid.
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    /// Slot start, UTC epoch milliseconds
    pub start_time: i64,
    /// Store-local start time, "HH:MM"
    pub local_time: String,
    pub available: bool,
    pub remaining_slots: i32,
    pub total_slots: i32,
}

/// Why a requested slot cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRejection {
    NonWorkingDay,
    OutsideHours,
    OutsideWindow,
    Full,
}

/// Result of checking one concrete start time.
#[derive(Debug, Clone, Copy)]
pub struct SlotCheck {
    pub remaining_slots: i32,
    pub total_slots: i32,
    pub rejection: Option<SlotRejection>,
}

impl SlotCheck {
    pub fn is_available(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Parse a store-local "YYYY-MM-DD HH:MM" wall time into UTC epoch millis.
pub fn parse_local_start(s: &str, utc_offset_minutes: i32) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").ok()?;
    Some(naive.and_utc().timestamp_millis() - utc_offset_minutes as i64 * MILLIS_PER_MINUTE)
}

/// UTC instant of local midnight on `date`.
pub fn local_midnight_millis(date: NaiveDate, utc_offset_minutes: i32) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis() - utc_offset_minutes as i64 * MILLIS_PER_MINUTE)
        .unwrap_or(0)
}

/// The store-local calendar date and minute-of-day of a UTC instant.
pub fn local_parts(start_millis: i64, utc_offset_minutes: i32) -> (NaiveDate, i32) {
    let local = chrono::DateTime::from_timestamp_millis(
        start_millis + utc_offset_minutes as i64 * MILLIS_PER_MINUTE,
    )
    .unwrap_or_default();
    let naive = local.naive_utc();
    (naive.date(), (naive.time().num_seconds_from_midnight() / 60) as i32)
}

/// Booking-window predicate shared by availability, create and reschedule:
/// a slot must start at least `min_advance_minutes` and at most
/// `max_advance_minutes` from now.
pub fn within_advance_window(now: i64, start_time: i64, service: &Service) -> bool {
    let lead = start_time - now;
    lead >= service.min_advance_minutes as i64 * MILLIS_PER_MINUTE
        && lead <= service.max_advance_minutes as i64 * MILLIS_PER_MINUTE
}

/// Enumerate the slot grid for one local calendar date.
///
/// Slots step by `duration + buffer` from opening time; a slot fits only if
/// the service itself (excluding trailing buffer) ends by closing time.
/// Already-past starts are excluded entirely; slots outside the advance
/// window or fully booked are listed but unavailable. Returns `None` when
/// `date` is not a working day.
pub fn enumerate_slots(
    schedule: &DaySchedule,
    service: &Service,
    date: NaiveDate,
    now: i64,
    counts: &HashMap<i64, i64>,
    staff_scoped: bool,
) -> Option<Vec<Slot>> {
    if !schedule.is_working_day(date) {
        return None;
    }

    let interval = service.slot_interval_minutes().max(1);
    let total = service.capacity_for(staff_scoped);
    let midnight = local_midnight_millis(date, schedule.utc_offset_minutes);

    let mut slots = Vec::new();
    let mut minute = schedule.open_minutes;
    while minute + service.duration_minutes <= schedule.close_minutes {
        let start_time = midnight + minute as i64 * MILLIS_PER_MINUTE;
        if start_time > now {
            let taken = counts.get(&start_time).copied().unwrap_or(0);
            let remaining = (total as i64 - taken).max(0) as i32;
            slots.push(Slot {
                start_time,
                local_time: format!("{:02}:{:02}", minute / 60, minute % 60),
                available: remaining > 0 && within_advance_window(now, start_time, service),
                remaining_slots: remaining,
                total_slots: total,
            });
        }
        minute += interval;
    }
    Some(slots)
}

/// Check one concrete requested start time against the grid, the advance
/// window and current capacity.
pub fn evaluate_slot(
    schedule: &DaySchedule,
    service: &Service,
    start_time: i64,
    now: i64,
    current_count: i64,
    staff_scoped: bool,
) -> SlotCheck {
    let total = service.capacity_for(staff_scoped);
    let remaining = (total as i64 - current_count).max(0) as i32;
    let check = |rejection| SlotCheck {
        remaining_slots: remaining,
        total_slots: total,
        rejection: Some(rejection),
    };

    let (date, minute) = local_parts(start_time, schedule.utc_offset_minutes);
    if !schedule.is_working_day(date) {
        return check(SlotRejection::NonWorkingDay);
    }

    let interval = service.slot_interval_minutes().max(1);
    let on_grid = minute >= schedule.open_minutes
        && minute + service.duration_minutes <= schedule.close_minutes
        && (minute - schedule.open_minutes) % interval == 0;
    if !on_grid {
        return check(SlotRejection::OutsideHours);
    }

    if !within_advance_window(now, start_time, service) {
        return check(SlotRejection::OutsideWindow);
    }

    if remaining == 0 {
        return check(SlotRejection::Full);
    }

    SlotCheck {
        remaining_slots: remaining,
        total_slots: total,
        rejection: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn test_service() -> Service {
        Service {
            id: 1,
            store_id: 1,
            branch_id: None,
            name: "Haircut".into(),
            price: Decimal::new(5000, 2),
            currency: "EUR".into(),
            duration_minutes: 25,
            buffer_minutes: 5,
            grace_period_minutes: 10,
            min_advance_minutes: 60,
            max_advance_minutes: 43_200,
            max_concurrent_bookings: 3,
            requires_exclusive_staff: true,
            auto_complete_on_duration: false,
            allow_early_checkin: false,
            early_checkin_minutes: 15,
            min_cancellation_hours: 24,
            online_booking_enabled: true,
            active: true,
        }
    }

    fn test_schedule() -> DaySchedule {
        DaySchedule {
            open_minutes: 9 * 60,
            close_minutes: 17 * 60,
            working_days: vec![1, 2, 3, 4, 5],
            utc_offset_minutes: 0,
        }
    }

    // A Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn monday_grid_has_sixteen_slots() {
        // 09:00-17:00, 30-minute step, last start 16:30 (service ends 16:55)
        let now = local_midnight_millis(monday(), 0) - 7 * 24 * 60 * MILLIS_PER_MINUTE;
        let slots = enumerate_slots(
            &test_schedule(),
            &test_service(),
            monday(),
            now,
            &HashMap::new(),
            false,
        )
        .unwrap();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].local_time, "09:00");
        assert_eq!(slots[15].local_time, "16:30");
        assert!(slots.iter().all(|s| s.available && s.remaining_slots == 3));
    }

    #[test]
    fn sunday_is_not_a_working_day() {
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let slots = enumerate_slots(
            &test_schedule(),
            &test_service(),
            sunday,
            0,
            &HashMap::new(),
            false,
        );
        assert!(slots.is_none());
    }

    #[test]
    fn outside_window_slots_are_listed_but_unavailable() {
        // now = Monday 08:30, min advance 60: the 09:00 slot (30-minute
        // lead) stays on the grid, just not bookable
        let midnight = local_midnight_millis(monday(), 0);
        let now = midnight + (8 * 60 + 30) as i64 * MILLIS_PER_MINUTE;
        let slots = enumerate_slots(
            &test_schedule(),
            &test_service(),
            monday(),
            now,
            &HashMap::new(),
            false,
        )
        .unwrap();
        assert_eq!(slots.len(), 16);
        assert!(!slots[0].available);
        assert_eq!(slots[0].remaining_slots, 3);
        assert!(slots[1].available);
    }

    #[test]
    fn past_starts_are_excluded_entirely() {
        // now = Monday 12:00: 09:00 through 12:00 are gone, 12:30 onward
        // remain (12:30 is inside the 60-minute advance floor, so listed
        // unavailable)
        let midnight = local_midnight_millis(monday(), 0);
        let now = midnight + 12 * 60 * MILLIS_PER_MINUTE;
        let slots = enumerate_slots(
            &test_schedule(),
            &test_service(),
            monday(),
            now,
            &HashMap::new(),
            false,
        )
        .unwrap();
        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0].local_time, "12:30");
        assert!(!slots[0].available);
        assert!(slots[1].available);
    }

    #[test]
    fn counts_reduce_remaining_capacity() {
        let schedule = test_schedule();
        let service = test_service();
        let now = local_midnight_millis(monday(), 0) - 24 * 60 * MILLIS_PER_MINUTE;
        let nine_am = local_midnight_millis(monday(), 0) + 9 * 60 * MILLIS_PER_MINUTE;

        let mut counts = HashMap::new();
        counts.insert(nine_am, 3);
        let slots =
            enumerate_slots(&schedule, &service, monday(), now, &counts, false).unwrap();
        assert!(!slots[0].available);
        assert_eq!(slots[0].remaining_slots, 0);
        assert!(slots[1].available);
    }

    #[test]
    fn staff_scope_forces_exclusive_capacity() {
        let service = test_service(); // requires_exclusive_staff
        assert_eq!(service.capacity_for(true), 1);
        assert_eq!(service.capacity_for(false), 3);
    }

    #[test]
    fn advance_window_bounds() {
        let service = test_service(); // min 60 min, max 30 days
        let now = 1_750_000_000_000;
        assert!(!within_advance_window(now, now + 59 * MILLIS_PER_MINUTE, &service));
        assert!(within_advance_window(now, now + 60 * MILLIS_PER_MINUTE, &service));
        assert!(within_advance_window(
            now,
            now + 43_200 * MILLIS_PER_MINUTE,
            &service
        ));
        assert!(!within_advance_window(
            now,
            now + 43_201 * MILLIS_PER_MINUTE,
            &service
        ));
        assert!(!within_advance_window(now, now - 1, &service));
    }

    #[test]
    fn evaluate_rejects_off_grid_start() {
        let schedule = test_schedule();
        let service = test_service();
        let midnight = local_midnight_millis(monday(), 0);
        let now = midnight - 24 * 60 * MILLIS_PER_MINUTE;

        // 09:10 is not on the 30-minute grid
        let off_grid = midnight + (9 * 60 + 10) as i64 * MILLIS_PER_MINUTE;
        let check = evaluate_slot(&schedule, &service, off_grid, now, 0, false);
        assert_eq!(check.rejection, Some(SlotRejection::OutsideHours));

        // 16:30 is the last valid start
        let last = midnight + (16 * 60 + 30) as i64 * MILLIS_PER_MINUTE;
        let check = evaluate_slot(&schedule, &service, last, now, 0, false);
        assert!(check.is_available());

        // 17:00 would end after close
        let late = midnight + 17 * 60 * MILLIS_PER_MINUTE;
        let check = evaluate_slot(&schedule, &service, late, now, 0, false);
        assert_eq!(check.rejection, Some(SlotRejection::OutsideHours));
    }

    #[test]
    fn evaluate_rejects_full_slot() {
        let schedule = test_schedule();
        let service = test_service();
        let midnight = local_midnight_millis(monday(), 0);
        let now = midnight - 24 * 60 * MILLIS_PER_MINUTE;
        let nine_am = midnight + 9 * 60 * MILLIS_PER_MINUTE;

        let check = evaluate_slot(&schedule, &service, nine_am, now, 3, false);
        assert_eq!(check.rejection, Some(SlotRejection::Full));
        assert_eq!(check.remaining_slots, 0);

        let check = evaluate_slot(&schedule, &service, nine_am, now, 2, false);
        assert!(check.is_available());
        assert_eq!(check.remaining_slots, 1);
    }

    #[test]
    fn utc_offset_shifts_slot_instants() {
        // Store at UTC+120: local 09:00 is 07:00 UTC
        let date = monday();
        let midnight_utc2 = local_midnight_millis(date, 120);
        let midnight_utc = local_midnight_millis(date, 0);
        assert_eq!(midnight_utc - midnight_utc2, 120 * MILLIS_PER_MINUTE);

        let parsed = parse_local_start("2025-06-02 09:00", 120).unwrap();
        assert_eq!(parsed, midnight_utc2 + 9 * 60 * MILLIS_PER_MINUTE);

        let (local_date, minute) = local_parts(parsed, 120);
        assert_eq!(local_date, date);
        assert_eq!(minute, 9 * 60);
    }

    #[test]
    fn branch_hours_override_store() {
        use shared::models::{Branch, Store};
        let store = Store {
            id: 1,
            merchant_id: 1,
            name: "Store".into(),
            open_minutes: 9 * 60,
            close_minutes: 17 * 60,
            working_days: vec![1, 2, 3, 4, 5],
            utc_offset_minutes: 60,
            active: true,
        };
        let branch = Branch {
            id: 2,
            store_id: 1,
            name: "Annex".into(),
            open_minutes: Some(10 * 60),
            close_minutes: None,
            working_days: Some(vec![6, 7]),
            active: true,
        };

        let schedule = DaySchedule::resolve(&store, Some(&branch));
        assert_eq!(schedule.open_minutes, 10 * 60);
        assert_eq!(schedule.close_minutes, 17 * 60);
        assert_eq!(schedule.working_days, vec![6, 7]);
        assert_eq!(schedule.utc_offset_minutes, 60);

        let schedule = DaySchedule::resolve(&store, None);
        assert_eq!(schedule.open_minutes, 9 * 60);
    }
}
