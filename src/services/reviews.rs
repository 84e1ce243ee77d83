//! Reviews service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        event::{CatalogEvent, EventKind},
        review::{Review, ReviewQuery, UpdateReview, UpsertReview},
        user::UserClaims,
    },
    repository::Repository,
    services::events::EventsService,
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
    events: EventsService,
}

impl ReviewsService {
    pub fn new(repository: Repository, events: EventsService) -> Self {
        Self { repository, events }
    }

    pub async fn list(&self, query: &ReviewQuery) -> AppResult<Vec<Review>> {
        self.repository
            .reviews
            .list(query.book_id, query.user_id.as_deref())
            .await
    }

    pub async fn get(&self, book_id: i32, user_id: &str) -> AppResult<Review> {
        self.repository.reviews.get(book_id, user_id).await
    }

    /// Create or replace the current user's review
    pub async fn upsert(&self, claims: &UserClaims, review: UpsertReview) -> AppResult<Review> {
        review.validate()?;
        let saved = self.repository.reviews.upsert(&claims.user_id, &review).await?;
        self.publish(claims, saved.book_id);
        Ok(saved)
    }

    pub async fn update(&self, claims: &UserClaims, review: UpdateReview) -> AppResult<Review> {
        review.validate()?;
        if review.is_empty() {
            return Err(AppError::BadRequest("No valid fields to update".to_string()));
        }
        let saved = self.repository.reviews.update(&claims.user_id, &review).await?;
        self.publish(claims, saved.book_id);
        Ok(saved)
    }

    fn publish(&self, claims: &UserClaims, book_id: i32) {
        let mut event = CatalogEvent::new(EventKind::ReviewSaved, book_id);
        event.user_id = Some(claims.user_id.clone());
        self.events.publish(event);
    }
}
