//! Bookings service: booking, return requests and approvals

use chrono::{Duration, Utc};

use crate::{
    config::LibraryConfig,
    error::{AppError, AppResult},
    models::{
        booking::{
            BookAction, Booking, BookingDetails, BookingQuery, BookingState, BookUserStatus, CreateBooking,
            PendingReturns, UpdateBooking,
        },
        event::{CatalogEvent, EventKind},
        user::UserClaims,
    },
    repository::{
        bookings::{BookingChange, BookingTransition},
        Repository,
    },
    services::events::EventsService,
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    config: LibraryConfig,
    events: EventsService,
}

/// Event describing a committed transition
pub fn transition_event(from: BookingState, to: BookingState) -> EventKind {
    match (from, to) {
        (BookingState::Booked, BookingState::PendingReturn) => EventKind::ReturnRequested,
        (BookingState::PendingReturn, BookingState::Booked) => EventKind::ReturnRequestCancelled,
        (_, BookingState::Returned) => EventKind::ReturnApproved,
        _ => EventKind::BookingUpdated,
    }
}

/// Owners may only move their booking between booked and pending return;
/// everything else needs an administrator.
fn authorize(claims: &UserClaims, booking: &Booking, from: BookingState, to: BookingState) -> AppResult<()> {
    if claims.is_admin {
        return Ok(());
    }
    claims.require_owner_or_admin(&booking.user_id)?;
    if from == to || from.owner_may_transition(to) {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "Only an administrator can complete a return".to_string(),
        ))
    }
}

impl BookingsService {
    pub fn new(repository: Repository, config: LibraryConfig, events: EventsService) -> Self {
        Self {
            repository,
            config,
            events,
        }
    }

    /// Book a copy for the current user (or, for admins, on behalf of another user)
    pub async fn create(&self, claims: &UserClaims, request: CreateBooking) -> AppResult<BookingDetails> {
        let user_id = match request.user_id {
            Some(user_id) if user_id != claims.user_id => {
                claims.require_admin()?;
                user_id
            }
            _ => claims.user_id.clone(),
        };

        let now = Utc::now();
        let due_date = request
            .due_date
            .unwrap_or_else(|| now + Duration::days(self.config.loan_duration_days));
        if due_date <= now {
            return Err(AppError::Validation("Due date must be in the future".to_string()));
        }

        let created = self
            .repository
            .bookings
            .create(&user_id, request.book_id, due_date, self.config.max_active_bookings)
            .await?;

        let booking = &created.booking;
        tracing::info!(
            "Booking {} created: user {} book {} ({} copies left)",
            booking.booking_id,
            booking.user_id,
            booking.book_id,
            created.copies_available
        );

        self.events.publish(CatalogEvent::booking(
            EventKind::BookingCreated,
            booking.booking_id,
            booking.book_id,
            &booking.user_id,
        ));
        if let Some(reservation_id) = created.removed_reservation {
            self.events.publish(CatalogEvent::reservation(
                EventKind::WishlistRemoved,
                Some(reservation_id),
                booking.book_id,
                &booking.user_id,
            ));
        }

        self.repository.bookings.get_details(booking.booking_id).await
    }

    /// Flag a booking as awaiting return approval
    pub async fn request_return(&self, claims: &UserClaims, id: i32) -> AppResult<BookingDetails> {
        self.move_to(claims, id, BookingState::PendingReturn).await
    }

    /// Withdraw (or, for admins, reject) a return request
    pub async fn cancel_return_request(&self, claims: &UserClaims, id: i32) -> AppResult<BookingDetails> {
        self.move_to(claims, id, BookingState::Booked).await
    }

    /// Complete a return: the copy goes back on the shelf
    pub async fn approve_return(&self, claims: &UserClaims, id: i32) -> AppResult<BookingDetails> {
        claims.require_admin()?;
        self.move_to(claims, id, BookingState::Returned).await
    }

    /// Administrative update; flag changes go through the same transitions
    pub async fn update(&self, claims: &UserClaims, id: i32, update: UpdateBooking) -> AppResult<BookingDetails> {
        claims.require_admin()?;
        if update.is_empty() {
            return Err(AppError::BadRequest("No valid fields to update".to_string()));
        }

        let transition = self
            .repository
            .bookings
            .transition(id, |_, from| {
                let target = from.apply_flags(update.currently_booked, update.pending_return)?;
                Ok(BookingChange {
                    target,
                    due_date: update.due_date,
                })
            })
            .await?;

        self.finish(transition).await
    }

    async fn move_to(&self, claims: &UserClaims, id: i32, target: BookingState) -> AppResult<BookingDetails> {
        let transition = self
            .repository
            .bookings
            .transition(id, |booking, from| {
                authorize(claims, booking, from, target)?;
                Ok(BookingChange { target, due_date: None })
            })
            .await
            .map_err(|e| {
                if let AppError::BusinessRule(ref msg) = e {
                    tracing::warn!("Rejected booking {} transition to {}: {}", id, target.label(), msg);
                }
                e
            })?;

        self.finish(transition).await
    }

    async fn finish(&self, transition: BookingTransition) -> AppResult<BookingDetails> {
        let booking = &transition.booking;
        tracing::info!(
            "Booking {} moved from {} to {}",
            booking.booking_id,
            transition.from.label(),
            transition.to.label()
        );
        if let Some(copies) = transition.copies_available {
            tracing::info!("Book {} back on shelf ({} copies available)", booking.book_id, copies);
        }

        self.events.publish(CatalogEvent::booking(
            transition_event(transition.from, transition.to),
            booking.booking_id,
            booking.book_id,
            &booking.user_id,
        ));

        self.repository.bookings.get_details(booking.booking_id).await
    }

    /// List bookings; non-admins only see their own
    pub async fn list(
        &self,
        claims: &UserClaims,
        mut query: BookingQuery,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<BookingDetails>, i64)> {
        query.user_id = claims.scope_user_id(query.user_id);
        self.repository.bookings.search(&query, limit, offset).await
    }

    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<BookingDetails> {
        let booking = self.repository.bookings.get_details(id).await?;
        claims.require_owner_or_admin(&booking.user_id)?;
        Ok(booking)
    }

    /// Return requests awaiting approval, oldest first
    pub async fn pending_returns(&self, claims: &UserClaims) -> AppResult<PendingReturns> {
        claims.require_admin()?;
        let bookings = self.repository.bookings.pending_returns().await?;
        Ok(PendingReturns::new(bookings))
    }

    /// Where the current user stands with a book, and what they can do next
    pub async fn book_status(&self, claims: &UserClaims, book_id: i32) -> AppResult<BookUserStatus> {
        let book = self.repository.books.get_by_id(book_id).await?;
        let active = self
            .repository
            .bookings
            .active_for(&claims.user_id, book_id)
            .await?;
        let reservation_id = self
            .repository
            .reservations
            .find(&claims.user_id, book_id)
            .await?;
        let personal_rating = self
            .repository
            .reviews
            .rating_of(book_id, &claims.user_id)
            .await?;

        let booking_state = active.as_ref().map(Booking::state).transpose()?;

        Ok(BookUserStatus {
            book_id,
            copies_available: book.copies_available,
            booking_id: active.as_ref().map(|b| b.booking_id),
            booking_state,
            due_date: active.as_ref().map(|b| b.due_date),
            reservation_id,
            wishlisted: reservation_id.is_some(),
            personal_rating,
            action: BookAction::resolve(booking_state, book.copies_available),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio_test::{assert_err, assert_ok};

    fn claims(user_id: &str, is_admin: bool) -> UserClaims {
        UserClaims {
            sub: user_id.into(),
            user_id: user_id.into(),
            username: "reader".into(),
            is_admin,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        }
    }

    fn booking(user_id: &str) -> Booking {
        Booking {
            booking_id: 1,
            user_id: user_id.into(),
            book_id: 2,
            booking_date: Utc::now(),
            due_date: Utc::now() + Duration::days(14),
            currently_booked: true,
            pending_return: false,
            returned_date: None,
        }
    }

    #[test]
    fn test_transition_event() {
        use BookingState::*;
        assert_eq!(transition_event(Booked, PendingReturn), EventKind::ReturnRequested);
        assert_eq!(transition_event(PendingReturn, Booked), EventKind::ReturnRequestCancelled);
        assert_eq!(transition_event(PendingReturn, Returned), EventKind::ReturnApproved);
        assert_eq!(transition_event(Booked, Returned), EventKind::ReturnApproved);
        assert_eq!(transition_event(Booked, Booked), EventKind::BookingUpdated);
    }

    #[test]
    fn test_owner_can_request_but_not_approve() {
        use BookingState::*;
        let owner = claims("UOWNER0001", false);
        let b = booking("UOWNER0001");
        assert_ok!(authorize(&owner, &b, Booked, PendingReturn));
        assert_ok!(authorize(&owner, &b, PendingReturn, Booked));
        assert!(matches!(
            authorize(&owner, &b, PendingReturn, Returned),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_other_user_rejected() {
        let other = claims("UOTHER0001", false);
        let b = booking("UOWNER0001");
        assert_err!(authorize(&other, &b, BookingState::Booked, BookingState::PendingReturn));
        let admin = claims("UADMIN0001", true);
        assert_ok!(authorize(&admin, &b, BookingState::Booked, BookingState::Returned));
    }
}
