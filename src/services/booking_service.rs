use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    dto::{
        activity::{BookRequest, BookingOutcome},
        destinations::{BusinessBooking, UserBooking},
    },
    entity::{
        BusinessProfiles, Users,
        bookings::{self, ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings},
        business_profiles::Column as ProfileCol,
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Booking, format_hhmm},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Parses a 24-hour `HH:MM` time. A trailing `:SS` is tolerated.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, AppError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::Validation("The booking time must be in HH:MM format.".into()))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("The booking date must be in YYYY-MM-DD format.".into()))
}

/// Hourly slot starts in `[opening, closing)`. Empty when either bound is missing
/// or the window does not move forward within the day.
pub fn hourly_slots(opening: Option<NaiveTime>, closing: Option<NaiveTime>) -> Vec<NaiveTime> {
    let (Some(mut slot), Some(closing)) = (opening, closing) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    while slot < closing {
        slots.push(slot);
        let (next, wrapped) = slot.overflowing_add_signed(Duration::hours(1));
        if wrapped != 0 {
            break;
        }
        slot = next;
    }
    slots
}

/// Half-open check: `opening <= time < closing`.
pub fn ensure_within_hours(
    time: NaiveTime,
    opening: Option<NaiveTime>,
    closing: Option<NaiveTime>,
) -> Result<(), AppError> {
    let (Some(opening), Some(closing)) = (opening, closing) else {
        return Err(AppError::Validation(
            "This business has not published its opening hours.".into(),
        ));
    };
    if time < opening || time >= closing {
        return Err(AppError::Validation(
            "Booking time is outside of business hours.".into(),
        ));
    }
    Ok(())
}

/// Slots left after one more booking is taken from a slot already holding `existing`.
pub fn remaining_slots(capacity: i32, existing: u64) -> i64 {
    i64::from(capacity) - existing as i64 - 1
}

pub async fn attempt_booking(
    state: &AppState,
    user: &AuthUser,
    payload: BookRequest,
) -> AppResult<ApiResponse<BookingOutcome>> {
    let booking_date = parse_date(&payload.booking_date)?;
    let booking_time = parse_hhmm(&payload.booking_time)?;

    let txn = state.orm.begin().await?;

    // serialises concurrent bookings against the same business
    let profile = BusinessProfiles::find_by_id(payload.business_user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Business profile not found.".into()))?;

    ensure_within_hours(booking_time, profile.opening_hour, profile.closing_hour)?;

    let existing = Bookings::find()
        .filter(BookingCol::BusinessUserId.eq(profile.user_id))
        .filter(BookingCol::BookingDate.eq(booking_date))
        .filter(BookingCol::BookingTime.eq(booking_time))
        .count(&txn)
        .await?;

    if existing >= profile.counter_booking.max(0) as u64 {
        return Err(AppError::Conflict(
            "No available slots for the selected time.".into(),
        ));
    }

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        business_user_id: Set(profile.user_id),
        booking_date: Set(booking_date),
        booking_time: Set(booking_time),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    let remaining = remaining_slots(profile.counter_booking, existing);
    tracing::info!(
        booking_id = %booking.id,
        business_user_id = %profile.user_id,
        date = %booking_date,
        time = %format_hhmm(booking_time),
        remaining,
        "slot booked"
    );

    let outcome = BookingOutcome {
        booking: Booking::from(booking),
        remaining_slots: remaining,
        is_last_slot: remaining <= 0,
    };
    Ok(ApiResponse::success(
        "Slot booked successfully",
        outcome,
        Some(Meta::empty()),
    ))
}

/// Bookings received by a business, newest date first.
pub async fn business_bookings(
    state: &AppState,
    business_user_id: Uuid,
) -> AppResult<ApiResponse<Vec<BusinessBooking>>> {
    let rows = Bookings::find()
        .filter(BookingCol::BusinessUserId.eq(business_user_id))
        .order_by_desc(BookingCol::BookingDate)
        .order_by_asc(BookingCol::BookingTime)
        .all(&state.orm)
        .await?;

    let customer_ids: Vec<Uuid> = rows.iter().map(|b| b.user_id).collect();
    let names: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(customer_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    let items = rows
        .into_iter()
        .map(|b: bookings::Model| BusinessBooking {
            id: b.id,
            user_id: b.user_id,
            user_name: names.get(&b.user_id).cloned(),
            booking_date: b.booking_date,
            booking_time: format_hhmm(b.booking_time),
        })
        .collect();

    Ok(ApiResponse::success(
        "Bookings retrieved successfully",
        items,
        Some(Meta::empty()),
    ))
}

/// Bookings made by a customer, with the business name or `Unknown` when the profile is gone.
pub async fn user_bookings(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<Vec<UserBooking>>> {
    let rows = Bookings::find()
        .filter(BookingCol::UserId.eq(user_id))
        .order_by_desc(BookingCol::BookingDate)
        .order_by_asc(BookingCol::BookingTime)
        .all(&state.orm)
        .await?;

    let business_ids: Vec<Uuid> = rows.iter().map(|b| b.business_user_id).collect();
    let names: HashMap<Uuid, String> = BusinessProfiles::find()
        .filter(ProfileCol::UserId.is_in(business_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p.business_name))
        .collect();

    let items = rows
        .into_iter()
        .map(|b| UserBooking {
            id: b.id,
            business_user_id: b.business_user_id,
            business_name: names
                .get(&b.business_user_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            booking_date: b.booking_date,
            booking_time: format_hhmm(b.booking_time),
        })
        .collect();

    Ok(ApiResponse::success(
        "Bookings retrieved successfully",
        items,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_hhmm("09:30").unwrap(), t(9, 30));
        assert_eq!(parse_hhmm("17:00:00").unwrap(), t(17, 0));
        assert!(parse_hhmm("25:00").is_err());
        assert!(parse_hhmm("nine").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn slots_run_hourly_up_to_but_excluding_closing() {
        let slots: Vec<String> = hourly_slots(Some(t(9, 0)), Some(t(12, 0)))
            .into_iter()
            .map(format_hhmm)
            .collect();
        assert_eq!(slots, ["09:00", "10:00", "11:00"]);

        let slots = hourly_slots(Some(t(9, 30)), Some(t(11, 0)));
        assert_eq!(slots, vec![t(9, 30), t(10, 30)]);
    }

    #[test]
    fn slots_are_empty_without_a_forward_window() {
        assert!(hourly_slots(None, Some(t(17, 0))).is_empty());
        assert!(hourly_slots(Some(t(17, 0)), Some(t(9, 0))).is_empty());
        assert!(hourly_slots(Some(t(9, 0)), Some(t(9, 0))).is_empty());
    }

    #[test]
    fn late_window_stops_at_midnight() {
        let slots = hourly_slots(Some(t(22, 0)), Some(t(23, 59)));
        assert_eq!(slots, vec![t(22, 0), t(23, 0)]);
    }

    #[test]
    fn hours_are_half_open() {
        let (open, close) = (Some(t(9, 0)), Some(t(17, 0)));
        assert!(ensure_within_hours(t(9, 0), open, close).is_ok());
        assert!(ensure_within_hours(t(16, 59), open, close).is_ok());
        assert!(matches!(
            ensure_within_hours(t(17, 0), open, close),
            Err(AppError::Validation(_))
        ));
        assert!(ensure_within_hours(t(8, 59), open, close).is_err());
        assert!(ensure_within_hours(t(10, 0), None, close).is_err());
    }

    #[test]
    fn remaining_slot_arithmetic() {
        assert_eq!(remaining_slots(2, 0), 1);
        assert_eq!(remaining_slots(2, 1), 0);
        assert_eq!(remaining_slots(1, 0), 0);
    }
}
