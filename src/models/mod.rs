//! Data models for the catalog server

pub mod author;
pub mod book;
pub mod booking;
pub mod event;
pub mod reservation;
pub mod review;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use author::{Author, Publisher};
pub use book::{Book, BookDetails, BookShort};
pub use booking::{BookAction, Booking, BookingDetails, BookingState};
pub use event::{CatalogEvent, EventKind};
pub use reservation::Reservation;
pub use review::Review;
pub use transaction::{Transaction, TransactionKind};
pub use user::{User, UserClaims, UserShort};
