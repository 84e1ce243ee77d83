//! Change notifications pushed to connected clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BookingCreated,
    BookingUpdated,
    ReturnRequested,
    ReturnRequestCancelled,
    ReturnApproved,
    WishlistAdded,
    WishlistRemoved,
    BookCreated,
    BookUpdated,
    BookDeleted,
    ReviewSaved,
}

impl EventKind {
    /// SSE event name
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::BookingCreated => "booking_created",
            EventKind::BookingUpdated => "booking_updated",
            EventKind::ReturnRequested => "return_requested",
            EventKind::ReturnRequestCancelled => "return_request_cancelled",
            EventKind::ReturnApproved => "return_approved",
            EventKind::WishlistAdded => "wishlist_added",
            EventKind::WishlistRemoved => "wishlist_removed",
            EventKind::BookCreated => "book_created",
            EventKind::BookUpdated => "book_updated",
            EventKind::BookDeleted => "book_deleted",
            EventKind::ReviewSaved => "review_saved",
        }
    }

    /// Events that change the pending return queue
    pub fn affects_pending_returns(self) -> bool {
        matches!(
            self,
            EventKind::ReturnRequested
                | EventKind::ReturnRequestCancelled
                | EventKind::ReturnApproved
                | EventKind::BookingUpdated
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogEvent {
    pub kind: EventKind,
    pub book_id: i32,
    pub user_id: Option<String>,
    pub booking_id: Option<i32>,
    pub reservation_id: Option<i32>,
    pub at: DateTime<Utc>,
}

impl CatalogEvent {
    pub fn new(kind: EventKind, book_id: i32) -> Self {
        Self {
            kind,
            book_id,
            user_id: None,
            booking_id: None,
            reservation_id: None,
            at: Utc::now(),
        }
    }

    pub fn booking(kind: EventKind, booking_id: i32, book_id: i32, user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            booking_id: Some(booking_id),
            ..Self::new(kind, book_id)
        }
    }

    pub fn reservation(kind: EventKind, reservation_id: Option<i32>, book_id: i32, user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            reservation_id,
            ..Self::new(kind, book_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_matches_serde() {
        for kind in [
            EventKind::ReturnApproved,
            EventKind::ReturnRequestCancelled,
            EventKind::WishlistRemoved,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!(EventKind::ReturnApproved.affects_pending_returns());
        assert!(!EventKind::BookCreated.affects_pending_returns());
    }

    #[test]
    fn test_booking_event() {
        let event = CatalogEvent::booking(EventKind::BookingCreated, 7, 3, "UABCDEFGH1");
        assert_eq!(event.book_id, 3);
        assert_eq!(event.booking_id, Some(7));
        assert_eq!(event.reservation_id, None);
        assert_eq!(event.user_id.as_deref(), Some("UABCDEFGH1"));
    }
}
