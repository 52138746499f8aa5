use chrono::Utc;
use rust_decimal::Decimal;

use crate::db::store::Store;
use crate::error::{ApiError, FieldErrors};
use crate::models::account::Account;
use crate::models::bookings::{Booking, BookingFilter, BookingRequest, BookingStatus, PriceStatus};
use crate::models::package::check_price;
use crate::models::profile::AgencyProfile;
use crate::models::target::Target;
use crate::services::pricing_service::{Bookable, Quote, StayPeriod};
use crate::services::rating_service::require_customer;
use crate::services::{account_service, catalog_service};

async fn quote_target<S: Store>(
    store: &S,
    target: &Target,
    period: &StayPeriod,
    party_size: u32,
) -> Result<Quote, ApiError> {
    match target {
        Target::Package(id) => catalog_service::visible_package(store, id)
            .await?
            .quote(period, party_size),
        Target::Guide(id) => catalog_service::visible_guide(store, id)
            .await?
            .quote(period, party_size),
        Target::Agency(id) => catalog_service::visible_agency(store, id)
            .await?
            .quote(period, party_size),
    }
}

/// Validates the request, prices it and stores a pending booking. No overlap
/// or capacity check is made.
pub async fn create_booking<S: Store>(
    store: &S,
    account: &Account,
    request: BookingRequest,
) -> Result<Booking, ApiError> {
    require_customer(account)?;
    let target = request.target.resolve(request.booking_type)?;
    request.validate_dates_and_party().into_result()?;
    let period = StayPeriod::new(request.start_date, request.end_date)?;

    let quote = quote_target(store, &target, &period, request.number_of_people).await?;
    let tourist = account_service::ensure_tourist_profile(store, &account.id).await?;

    let now = Utc::now();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        tourist_id: tourist.id,
        target,
        status: BookingStatus::Pending,
        start_date: period.start(),
        end_date: period.end(),
        number_of_people: request.number_of_people,
        total_price: quote.total,
        price_status: quote.status,
        special_requests: request
            .special_requests
            .filter(|text| !text.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };
    store.insert_booking(&booking).await?;
    log::info!(
        "Booking {} created by {} for {} ({} people, total {})",
        booking.id,
        account.username,
        booking.target,
        booking.number_of_people,
        booking.total_price
    );
    Ok(booking)
}

pub async fn tourist_bookings<S: Store>(
    store: &S,
    account: &Account,
) -> Result<Vec<Booking>, ApiError> {
    require_customer(account)?;
    let tourist = account_service::ensure_tourist_profile(store, &account.id).await?;
    let filter = BookingFilter {
        tourist_id: Some(tourist.id),
        ..Default::default()
    };
    Ok(store.list_bookings(&filter).await?)
}

/// Another tourist's booking reads as missing.
pub async fn tourist_booking<S: Store>(
    store: &S,
    account: &Account,
    booking_id: &str,
) -> Result<Booking, ApiError> {
    require_customer(account)?;
    let tourist = account_service::ensure_tourist_profile(store, &account.id).await?;
    store
        .get_booking(booking_id)
        .await?
        .filter(|booking| booking.tourist_id == tourist.id)
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))
}

pub async fn cancel_booking<S: Store>(
    store: &S,
    account: &Account,
    booking_id: &str,
) -> Result<Booking, ApiError> {
    let mut booking = tourist_booking(store, account, booking_id).await?;
    if !booking.status.is_cancellable() {
        return Err(ApiError::validation(
            "status",
            format!("a {} booking cannot be cancelled", booking.status.as_str()),
        ));
    }
    booking.status = BookingStatus::Cancelled;
    booking.updated_at = Utc::now();
    store.save_booking(&booking).await?;
    log::info!("Booking {} cancelled by {}", booking.id, account.username);
    Ok(booking)
}

fn check_transition(booking: &Booking, next: BookingStatus) -> Result<(), ApiError> {
    if !booking.status.can_transition_to(next) {
        return Err(ApiError::validation(
            "status",
            format!(
                "cannot move a booking from {} to {}",
                booking.status.as_str(),
                next.as_str()
            ),
        ));
    }
    if next == BookingStatus::Confirmed && booking.price_status == PriceStatus::AwaitingQuote {
        return Err(ApiError::validation(
            "status",
            "agency bookings must be quoted before confirmation",
        ));
    }
    Ok(())
}

/// Moves a booking along its status machine on behalf of `agency`. Reaching
/// `completed` updates the counters of everyone involved, once. The status is
/// written last; when any write fails the counters already applied are
/// reverted and the stored booking keeps its previous status.
pub async fn transition<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    mut booking: Booking,
    next: BookingStatus,
) -> Result<Booking, ApiError> {
    check_transition(&booking, next)?;
    booking.status = next;
    booking.updated_at = Utc::now();

    if next == BookingStatus::Completed {
        let applied = record_completion(store, &agency.id, &booking).await?;
        if let Err(err) = store.save_booking(&booking).await {
            log::error!("Saving completed booking {} failed: {}", booking.id, err);
            revert_completion(store, &agency.id, &booking, &applied).await;
            return Err(err.into());
        }
    } else {
        store.save_booking(&booking).await?;
    }
    log::info!("Booking {} is now {}", booking.id, next.as_str());
    Ok(booking)
}

/// Counter updates made when a booking completes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionStep {
    Target,
    Agency,
    Tourist,
}

const COMPLETION_STEPS: [CompletionStep; 3] = [
    CompletionStep::Target,
    CompletionStep::Agency,
    CompletionStep::Tourist,
];

async fn record_completion<S: Store>(
    store: &S,
    agency_id: &str,
    booking: &Booking,
) -> Result<Vec<CompletionStep>, ApiError> {
    let mut applied = Vec::with_capacity(COMPLETION_STEPS.len());
    for step in COMPLETION_STEPS {
        if let Err(err) = adjust_counters(store, agency_id, booking, step, false).await {
            log::error!("Completing booking {} failed at {:?}: {}", booking.id, step, err);
            revert_completion(store, agency_id, booking, &applied).await;
            return Err(err);
        }
        applied.push(step);
    }
    Ok(applied)
}

async fn revert_completion<S: Store>(
    store: &S,
    agency_id: &str,
    booking: &Booking,
    applied: &[CompletionStep],
) {
    for step in applied.iter().rev() {
        if let Err(err) = adjust_counters(store, agency_id, booking, *step, true).await {
            log::error!("Reverting {:?} for booking {} failed: {}", step, booking.id, err);
        }
    }
}

fn step_count(count: u32, revert: bool) -> u32 {
    if revert {
        count.saturating_sub(1)
    } else {
        count.saturating_add(1)
    }
}

fn step_amount(total: Decimal, amount: Decimal, revert: bool) -> Decimal {
    if revert {
        total.saturating_sub(amount)
    } else {
        total.saturating_add(amount)
    }
}

// Each step re-reads its record so concurrent completions are not
// overwritten with a stale copy.
async fn adjust_counters<S: Store>(
    store: &S,
    agency_id: &str,
    booking: &Booking,
    step: CompletionStep,
    revert: bool,
) -> Result<(), ApiError> {
    match step {
        CompletionStep::Target => match &booking.target {
            Target::Package(id) => {
                if let Some(mut package) = store.get_package(id).await? {
                    package.total_bookings = step_count(package.total_bookings, revert);
                    store.save_package(&package).await?;
                }
            }
            Target::Guide(id) => {
                if let Some(mut guide) = store.get_guide(id).await? {
                    guide.total_trips = step_count(guide.total_trips, revert);
                    store.save_guide(&guide).await?;
                }
            }
            Target::Agency(_) => {}
        },
        CompletionStep::Agency => {
            if let Some(mut owner) = store.get_agency(agency_id).await? {
                owner.total_bookings = step_count(owner.total_bookings, revert);
                owner.total_revenue = step_amount(owner.total_revenue, booking.total_price, revert);
                store.save_agency(&owner).await?;
            }
        }
        CompletionStep::Tourist => {
            if let Some(mut tourist) = store.get_tourist(&booking.tourist_id).await? {
                tourist.total_bookings = step_count(tourist.total_bookings, revert);
                tourist.total_spent = step_amount(tourist.total_spent, booking.total_price, revert);
                store.save_tourist(&tourist).await?;
            }
        }
    }
    Ok(())
}

/// Prices an agency booking. Allowed once, while pending.
pub fn apply_quote(booking: &mut Booking, total: Decimal) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    if booking.price_status != PriceStatus::AwaitingQuote {
        errors.add("total_price", "this booking is not awaiting a quote");
    } else if booking.status != BookingStatus::Pending {
        errors.add("total_price", "only pending bookings can be quoted");
    }
    check_price("total_price", total, &mut errors);
    errors.into_result()?;

    booking.total_price = total;
    booking.price_status = PriceStatus::Quoted;
    booking.updated_at = Utc::now();
    Ok(())
}

pub async fn quote<S: Store>(
    store: &S,
    mut booking: Booking,
    total: Decimal,
) -> Result<Booking, ApiError> {
    apply_quote(&mut booking, total)?;
    store.save_booking(&booking).await?;
    log::info!("Booking {} quoted at {}", booking.id, total);
    Ok(booking)
}
