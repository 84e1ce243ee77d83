//! Business logic services

pub mod bookings;
pub mod catalog;
pub mod events;
pub mod reservations;
pub mod reviews;
pub mod transactions;
pub mod users;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub bookings: bookings::BookingsService,
    pub reservations: reservations::ReservationsService,
    pub reviews: reviews::ReviewsService,
    pub transactions: transactions::TransactionsService,
    pub events: events::EventsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let events = events::EventsService::new();

        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), events.clone()),
            bookings: bookings::BookingsService::new(
                repository.clone(),
                config.library.clone(),
                events.clone(),
            ),
            reservations: reservations::ReservationsService::new(repository.clone(), events.clone()),
            reviews: reviews::ReviewsService::new(repository.clone(), events.clone()),
            transactions: transactions::TransactionsService::new(repository.clone()),
            events,
            repository,
        }
    }
}
