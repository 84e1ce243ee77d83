//! Catalog management service: books, authors and publishers

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, Publisher, PublisherRequest, UpdateAuthor},
        book::{Book, BookDetails, BookQuery, BookShort, CreateBook, UpdateBook},
        event::{CatalogEvent, EventKind},
    },
    repository::Repository,
    services::events::EventsService,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    events: EventsService,
}

impl CatalogService {
    pub fn new(repository: Repository, events: EventsService) -> Self {
        Self { repository, events }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery, limit: i64, offset: i64) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository.books.search(query, limit, offset).await
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.repository.books.categories().await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        self.repository.books.get_details(id).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Created book {} ({})", created.name, created.book_id);
        self.events
            .publish(CatalogEvent::new(EventKind::BookCreated, created.book_id));
        Ok(created)
    }

    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        if book.is_empty() {
            return Err(AppError::BadRequest("No valid fields to update".to_string()));
        }

        let updated = self.repository.books.update(id, &book).await?;
        self.events.publish(CatalogEvent::new(EventKind::BookUpdated, id));
        Ok(updated)
    }

    pub async fn delete_book(&self, id: i32, force: bool) -> AppResult<()> {
        self.repository.books.delete(id, force).await?;
        tracing::info!("Deleted book {} (force={})", id, force);
        self.events.publish(CatalogEvent::new(EventKind::BookDeleted, id));
        Ok(())
    }

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        self.repository.authors.create(&author).await
    }

    pub async fn update_author(&self, id: i32, author: UpdateAuthor) -> AppResult<Author> {
        author.validate()?;
        if author.name.is_none() && author.bio.is_none() {
            return Err(AppError::BadRequest("No valid fields to update".to_string()));
        }
        self.repository.authors.update(id, &author).await
    }

    pub async fn list_publishers(&self) -> AppResult<Vec<Publisher>> {
        self.repository.publishers.list().await
    }

    pub async fn get_publisher(&self, id: i32) -> AppResult<Publisher> {
        self.repository.publishers.get_by_id(id).await
    }

    pub async fn create_publisher(&self, publisher: PublisherRequest) -> AppResult<Publisher> {
        publisher.validate()?;
        if self.repository.publishers.name_exists(&publisher.name, None).await? {
            return Err(AppError::Conflict("Publisher already exists".to_string()));
        }
        self.repository.publishers.create(&publisher.name).await
    }

    pub async fn update_publisher(&self, id: i32, publisher: PublisherRequest) -> AppResult<Publisher> {
        publisher.validate()?;
        if self.repository.publishers.name_exists(&publisher.name, Some(id)).await? {
            return Err(AppError::Conflict("Publisher already exists".to_string()));
        }
        self.repository.publishers.rename(id, &publisher.name).await
    }
}
