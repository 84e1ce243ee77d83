//! Booking model and the booking state machine.
//!
//! A booking is persisted as two flags, `currently_booked` and
//! `pending_return`. Every state change goes through [`BookingState::transition`]
//! so the flags can never reach the `(false, true)` combination and side
//! effects (copies, transaction log) are derived from the transition itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;

/// Lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    /// The user holds the book
    Booked,
    /// The user asked to return the book, waiting for a librarian
    PendingReturn,
    /// Return approved, copy is back on the shelf
    Returned,
}

/// What a state transition must do besides rewriting the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    None,
    /// Put the copy back (`copies_available + 1`) and log a return transaction
    CompleteReturn,
}

impl BookingState {
    /// Decode persisted flags
    pub fn from_flags(currently_booked: bool, pending_return: bool) -> Result<Self, AppError> {
        match (currently_booked, pending_return) {
            (true, false) => Ok(BookingState::Booked),
            (true, true) => Ok(BookingState::PendingReturn),
            (false, false) => Ok(BookingState::Returned),
            (false, true) => Err(AppError::BusinessRule(
                "A returned booking cannot be pending return".to_string(),
            )),
        }
    }

    /// Encode as `(currently_booked, pending_return)`
    pub fn flags(self) -> (bool, bool) {
        match self {
            BookingState::Booked => (true, false),
            BookingState::PendingReturn => (true, true),
            BookingState::Returned => (false, false),
        }
    }

    pub fn is_active(self) -> bool {
        self != BookingState::Returned
    }

    /// Validate a transition and return its side effect
    pub fn transition(self, to: BookingState) -> Result<TransitionEffect, AppError> {
        use BookingState::*;
        match (self, to) {
            (Booked, PendingReturn) | (PendingReturn, Booked) => Ok(TransitionEffect::None),
            (Booked, Returned) | (PendingReturn, Returned) => Ok(TransitionEffect::CompleteReturn),
            (Returned, _) => Err(AppError::BusinessRule(
                "Booking has already been returned".to_string(),
            )),
            (from, to) if from == to => Err(AppError::BusinessRule(format!(
                "Booking is already {}",
                from.label()
            ))),
            (from, to) => Err(AppError::BusinessRule(format!(
                "Cannot move booking from {} to {}",
                from.label(),
                to.label()
            ))),
        }
    }

    /// Whether a non-admin owner may perform this transition
    pub fn owner_may_transition(self, to: BookingState) -> bool {
        matches!(
            (self, to),
            (BookingState::Booked, BookingState::PendingReturn)
                | (BookingState::PendingReturn, BookingState::Booked)
        )
    }

    /// Resolve a partial flag update against the current state
    pub fn apply_flags(
        self,
        currently_booked: Option<bool>,
        pending_return: Option<bool>,
    ) -> Result<Self, AppError> {
        let (booked, pending) = self.flags();
        let booked = currently_booked.unwrap_or(booked);
        // Clearing `currently_booked` implies the pending flag is cleared as well
        let pending = match (currently_booked, pending_return) {
            (Some(false), None) => false,
            _ => pending_return.unwrap_or(pending),
        };
        // Approving a pending return is expressed by clearing the pending flag alone
        if self == BookingState::PendingReturn && currently_booked.is_none() && pending_return == Some(false) {
            return Ok(BookingState::Returned);
        }
        BookingState::from_flags(booked, pending)
    }

    pub fn label(self) -> &'static str {
        match self {
            BookingState::Booked => "booked",
            BookingState::PendingReturn => "pending return",
            BookingState::Returned => "returned",
        }
    }
}

/// Booking row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub booking_id: i32,
    pub user_id: String,
    pub book_id: i32,
    pub booking_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub currently_booked: bool,
    pub pending_return: bool,
    pub returned_date: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn state(&self) -> Result<BookingState, AppError> {
        BookingState::from_flags(self.currently_booked, self.pending_return)
    }
}

/// Booking joined with user and book names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingDetailsRow {
    pub booking_id: i32,
    pub user_id: String,
    pub username: String,
    pub book_id: i32,
    pub book_name: String,
    pub booking_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub currently_booked: bool,
    pub pending_return: bool,
    pub returned_date: Option<DateTime<Utc>>,
}

/// Booking with full details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingDetails {
    pub booking_id: i32,
    pub user_id: String,
    pub username: String,
    pub book_id: i32,
    pub book_name: String,
    pub booking_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub currently_booked: bool,
    pub pending_return: bool,
    pub returned_date: Option<DateTime<Utc>>,
    pub state: BookingState,
    pub is_overdue: bool,
}

impl TryFrom<BookingDetailsRow> for BookingDetails {
    type Error = AppError;

    fn try_from(row: BookingDetailsRow) -> Result<Self, Self::Error> {
        let state = BookingState::from_flags(row.currently_booked, row.pending_return)?;
        Ok(BookingDetails {
            is_overdue: state.is_active() && row.due_date < Utc::now(),
            state,
            booking_id: row.booking_id,
            user_id: row.user_id,
            username: row.username,
            book_id: row.book_id,
            book_name: row.book_name,
            booking_date: row.booking_date,
            due_date: row.due_date,
            currently_booked: row.currently_booked,
            pending_return: row.pending_return,
            returned_date: row.returned_date,
        })
    }
}

/// Booking list filters
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    pub user_id: Option<String>,
    pub book_id: Option<i32>,
    /// Only bookings awaiting return approval
    pub pending: Option<bool>,
    /// Only bookings not yet returned
    pub active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create booking request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBooking {
    pub book_id: i32,
    /// Book on behalf of another user (admin only)
    pub user_id: Option<String>,
    /// Defaults to now plus the configured loan duration
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial booking update (admin)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBooking {
    pub due_date: Option<DateTime<Utc>>,
    pub currently_booked: Option<bool>,
    pub pending_return: Option<bool>,
}

impl UpdateBooking {
    pub fn is_empty(&self) -> bool {
        self.due_date.is_none() && self.currently_booked.is_none() && self.pending_return.is_none()
    }
}

/// Pending return requests, with a fingerprint pollers can compare
#[derive(Debug, Serialize, ToSchema)]
pub struct PendingReturns {
    /// Changes whenever the set of pending requests changes
    pub version: String,
    pub count: usize,
    pub bookings: Vec<BookingDetails>,
}

impl PendingReturns {
    pub fn new(bookings: Vec<BookingDetails>) -> Self {
        let version = bookings
            .iter()
            .map(|b| format!("{}-{}", b.booking_id, b.pending_return))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            version,
            count: bookings.len(),
            bookings,
        }
    }
}

/// What the booking button should offer a user for a given book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookAction {
    /// No active booking and copies are available
    Book,
    /// Active booking, return can be requested
    Return,
    /// Return requested, waiting for approval
    PendingReturn,
    /// No active booking and no copies left
    Unavailable,
}

impl BookAction {
    pub fn resolve(active_booking: Option<BookingState>, copies_available: i32) -> Self {
        match active_booking {
            Some(BookingState::Booked) => BookAction::Return,
            Some(BookingState::PendingReturn) => BookAction::PendingReturn,
            Some(BookingState::Returned) | None if copies_available > 0 => BookAction::Book,
            Some(BookingState::Returned) | None => BookAction::Unavailable,
        }
    }
}

/// Server-side view of one user's relation to one book
#[derive(Debug, Serialize, ToSchema)]
pub struct BookUserStatus {
    pub book_id: i32,
    pub copies_available: i32,
    pub booking_id: Option<i32>,
    pub booking_state: Option<BookingState>,
    pub due_date: Option<DateTime<Utc>>,
    pub reservation_id: Option<i32>,
    pub wishlisted: bool,
    pub personal_rating: Option<i32>,
    pub action: BookAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use BookingState::*;

    #[test]
    fn test_flags_roundtrip() {
        for state in [Booked, PendingReturn, Returned] {
            let (booked, pending) = state.flags();
            assert_eq!(BookingState::from_flags(booked, pending).unwrap(), state);
        }
        assert!(BookingState::from_flags(false, true).is_err());
    }

    #[test]
    fn test_transitions() {
        assert_eq!(Booked.transition(PendingReturn).unwrap(), TransitionEffect::None);
        assert_eq!(PendingReturn.transition(Booked).unwrap(), TransitionEffect::None);
        assert_eq!(
            PendingReturn.transition(Returned).unwrap(),
            TransitionEffect::CompleteReturn
        );
        assert_eq!(Booked.transition(Returned).unwrap(), TransitionEffect::CompleteReturn);
        assert!(Returned.transition(Booked).is_err());
        assert!(Returned.transition(Returned).is_err());
        assert!(PendingReturn.transition(PendingReturn).is_err());
    }

    #[test]
    fn test_owner_permissions() {
        assert!(Booked.owner_may_transition(PendingReturn));
        assert!(PendingReturn.owner_may_transition(Booked));
        assert!(!PendingReturn.owner_may_transition(Returned));
        assert!(!Booked.owner_may_transition(Returned));
    }

    #[test]
    fn test_apply_flags() {
        // settings panel approval: { pending_return: false }
        assert_eq!(PendingReturn.apply_flags(None, Some(false)).unwrap(), Returned);
        assert_eq!(Booked.apply_flags(None, Some(true)).unwrap(), PendingReturn);
        assert_eq!(Booked.apply_flags(Some(false), None).unwrap(), Returned);
        assert_eq!(PendingReturn.apply_flags(Some(true), Some(false)).unwrap(), Booked);
        assert_eq!(Booked.apply_flags(None, None).unwrap(), Booked);
        assert!(Booked.apply_flags(Some(false), Some(true)).is_err());
    }

    #[test]
    fn test_book_action() {
        assert_eq!(BookAction::resolve(None, 3), BookAction::Book);
        assert_eq!(BookAction::resolve(None, 0), BookAction::Unavailable);
        assert_eq!(BookAction::resolve(Some(Booked), 0), BookAction::Return);
        assert_eq!(BookAction::resolve(Some(PendingReturn), 5), BookAction::PendingReturn);
        assert_eq!(BookAction::resolve(Some(Returned), 2), BookAction::Book);
        assert_eq!(BookAction::resolve(Some(Returned), 0), BookAction::Unavailable);
    }

    fn pending(booking_id: i32, days_ago: i64) -> BookingDetails {
        let booking_date = Utc::now() - Duration::days(days_ago);
        BookingDetails::try_from(BookingDetailsRow {
            booking_id,
            user_id: "UREADER001".into(),
            username: "reader".into(),
            book_id: 10 + booking_id,
            book_name: "Degeneration".into(),
            booking_date,
            due_date: booking_date + Duration::days(14),
            currently_booked: true,
            pending_return: true,
            returned_date: None,
        })
        .unwrap()
    }

    #[test]
    fn test_pending_version_changes_with_set() {
        let empty = PendingReturns::new(vec![]);
        assert_eq!(empty.version, "");
        assert_eq!(empty.count, 0);

        // Rows arrive oldest first and keep that order
        let two = PendingReturns::new(vec![pending(7, 20), pending(3, 2)]);
        assert_eq!(two.version, "7-true|3-true");
        assert_eq!(two.count, 2);
        assert_eq!(two.bookings[0].booking_id, 7);
        assert!(two.bookings.iter().all(|b| b.state == PendingReturn));
        assert!(two.bookings[0].is_overdue);
        assert!(!two.bookings[1].is_overdue);

        let one = PendingReturns::new(vec![pending(3, 2)]);
        assert_eq!(one.version, "3-true");
        assert_ne!(one.version, two.version);
    }
}
