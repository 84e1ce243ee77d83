//! Wishlist service

use crate::{
    error::AppResult,
    models::{
        event::{CatalogEvent, EventKind},
        reservation::{Reservation, ReservationQuery},
        user::UserClaims,
    },
    repository::Repository,
    services::events::EventsService,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    events: EventsService,
}

impl ReservationsService {
    pub fn new(repository: Repository, events: EventsService) -> Self {
        Self { repository, events }
    }

    pub async fn add(&self, claims: &UserClaims, book_id: i32) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.create(&claims.user_id, book_id).await?;
        self.events.publish(CatalogEvent::reservation(
            EventKind::WishlistAdded,
            Some(reservation.reservation_id),
            book_id,
            &claims.user_id,
        ));
        Ok(reservation)
    }

    pub async fn remove(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        claims.require_owner_or_admin(&reservation.user_id)?;

        self.repository.reservations.delete(id).await?;
        self.events.publish(CatalogEvent::reservation(
            EventKind::WishlistRemoved,
            Some(id),
            reservation.book_id,
            &reservation.user_id,
        ));
        Ok(())
    }

    pub async fn remove_for_book(&self, claims: &UserClaims, book_id: i32) -> AppResult<()> {
        let id = self
            .repository
            .reservations
            .delete_for_book(&claims.user_id, book_id)
            .await?;
        self.events.publish(CatalogEvent::reservation(
            EventKind::WishlistRemoved,
            Some(id),
            book_id,
            &claims.user_id,
        ));
        Ok(())
    }

    pub async fn list(&self, claims: &UserClaims, query: ReservationQuery) -> AppResult<Vec<Reservation>> {
        let user_id = claims.scope_user_id(query.user_id);
        self.repository
            .reservations
            .list(user_id.as_deref(), query.book_id)
            .await
    }

    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get_by_id(id).await?;
        claims.require_owner_or_admin(&reservation.user_id)?;
        Ok(reservation)
    }
}
