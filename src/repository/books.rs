//! Books repository: catalog search, details and admin writes

use sqlx::{FromRow, PgConnection, Pool, Postgres, QueryBuilder, Row};

use crate::{
    error::{AppError, AppResult},
    models::book::{round_rating, search_term, Book, BookDetails, BookQuery, BookShort, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

#[derive(FromRow)]
struct BookShortRow {
    book_id: i32,
    name: String,
    author_name: String,
    category: String,
    genre: String,
    img_link: Option<String>,
    copies_available: i32,
    avg_rating: Option<f64>,
}

impl From<BookShortRow> for BookShort {
    fn from(row: BookShortRow) -> Self {
        BookShort {
            book_id: row.book_id,
            name: row.name,
            author_name: row.author_name,
            category: row.category,
            genre: row.genre,
            img_link: row.img_link,
            copies_available: row.copies_available,
            rating: round_rating(row.avg_rating),
        }
    }
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book row by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE book_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book with author, publisher and aggregated rating
    pub async fn get_details(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.get_by_id(id).await?;

        let row = sqlx::query(
            r#"
            SELECT a.name AS author_name, a.bio AS author_bio, p.name AS publisher_name,
                   (SELECT AVG(r.rating)::FLOAT8 FROM reviews r WHERE r.book_id = b.book_id) AS avg_rating,
                   (SELECT COUNT(*) FROM reviews r WHERE r.book_id = b.book_id) AS users_rated
            FROM books b
            JOIN authors a ON a.author_id = b.author_id
            LEFT JOIN publishers p ON p.publisher_id = b.publisher_id
            WHERE b.book_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(BookDetails {
            book,
            author_name: row.get("author_name"),
            author_bio: row.get("author_bio"),
            publisher_name: row.get("publisher_name"),
            rating: round_rating(row.get("avg_rating")),
            users_rated: row.get("users_rated"),
        })
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery, limit: i64, offset: i64) -> AppResult<(Vec<BookShort>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM books b JOIN authors a ON a.author_id = b.author_id WHERE TRUE",
        );
        push_book_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            r#"
            SELECT b.book_id, b.name, a.name AS author_name, b.category, b.genre,
                   b.img_link, b.copies_available,
                   (SELECT AVG(r.rating)::FLOAT8 FROM reviews r WHERE r.book_id = b.book_id) AS avg_rating
            FROM books b
            JOIN authors a ON a.author_id = b.author_id
            WHERE TRUE
            "#,
        );
        push_book_filters(&mut select, query);
        select
            .push(" ORDER BY b.name, b.book_id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let books = select
            .build_query_as::<BookShortRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(BookShort::from)
            .collect();

        Ok((books, total))
    }

    /// Distinct categories, sorted
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM books ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Create a book, resolving author and publisher by name
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let author_id = get_or_create_author(&mut tx, &book.author_name).await?;
        let publisher_id = match book.publisher_name {
            Some(ref name) => Some(get_or_create_publisher(&mut tx, name).await?),
            None => None,
        };

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (name, author_id, category, genre, publisher_id, publish_date,
                               language, page_count, copies_available, img_link, rated_type, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&book.name)
        .bind(author_id)
        .bind(&book.category)
        .bind(&book.genre)
        .bind(publisher_id)
        .bind(book.publish_date)
        .bind(&book.language)
        .bind(book.page_count)
        .bind(book.copies_available)
        .bind(&book.img_link)
        .bind(&book.rated_type)
        .bind(&book.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Update the given fields of a book
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let author_id = match update.author_name {
            Some(ref name) => Some(get_or_create_author(&mut tx, name).await?),
            None => None,
        };
        let publisher_id = match update.publisher_name {
            Some(ref name) => Some(get_or_create_publisher(&mut tx, name).await?),
            None => None,
        };

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE books SET ");
        let mut fields = builder.separated(", ");
        let mut has_fields = false;

        macro_rules! set_field {
            ($column:literal, $value:expr) => {
                if let Some(value) = $value {
                    fields.push(concat!($column, " = ")).push_bind_unseparated(value);
                    has_fields = true;
                }
            };
        }

        set_field!("name", update.name.clone());
        set_field!("author_id", author_id);
        set_field!("publisher_id", publisher_id);
        set_field!("category", update.category.clone());
        set_field!("genre", update.genre.clone());
        set_field!("publish_date", update.publish_date);
        set_field!("language", update.language.clone());
        set_field!("page_count", update.page_count);
        set_field!("copies_available", update.copies_available);
        set_field!("img_link", update.img_link.clone());
        set_field!("rated_type", update.rated_type.clone());
        set_field!("description", update.description.clone());

        if !has_fields {
            return Err(AppError::BadRequest("No valid fields to update".to_string()));
        }

        builder
            .push(" WHERE book_id = ")
            .push_bind(id)
            .push(" RETURNING *");

        let updated = builder
            .build_query_as::<Book>()
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book and its dependent rows.
    /// Refused while copies are out unless `force` is set.
    pub async fn delete(&self, id: i32, force: bool) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT book_id FROM books WHERE book_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE book_id = $1 AND currently_booked",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 && !force {
            return Err(AppError::Conflict(format!(
                "Book has {} active booking(s), use force=true to delete anyway",
                active
            )));
        }

        for statement in [
            "DELETE FROM reservations WHERE book_id = $1",
            "DELETE FROM reviews WHERE book_id = $1",
            "DELETE FROM transactions WHERE book_id = $1",
            "DELETE FROM bookings WHERE book_id = $1",
            "DELETE FROM books WHERE book_id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Advisory lock namespaces for get-or-create by name
const AUTHOR_NAME_LOCK: i32 = 1;
const PUBLISHER_NAME_LOCK: i32 = 2;

/// Serialise get-or-create on a name until the surrounding transaction ends
async fn lock_name(conn: &mut PgConnection, namespace: i32, name: &str) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext(LOWER($2)))")
        .bind(namespace)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Case-insensitive lookup by name, inserting the author when missing
async fn get_or_create_author(conn: &mut PgConnection, name: &str) -> AppResult<i32> {
    let name = name.trim();
    lock_name(conn, AUTHOR_NAME_LOCK, name).await?;
    let existing = sqlx::query_scalar::<_, i32>(
        "SELECT author_id FROM authors WHERE LOWER(name) = LOWER($1) ORDER BY author_id LIMIT 1",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(id) => Ok(id),
        None => {
            let id = sqlx::query_scalar::<_, i32>("INSERT INTO authors (name) VALUES ($1) RETURNING author_id")
                .bind(name)
                .fetch_one(&mut *conn)
                .await?;
            tracing::info!("Created author {} ({})", name, id);
            Ok(id)
        }
    }
}

/// Case-insensitive lookup by name, inserting the publisher when missing
async fn get_or_create_publisher(conn: &mut PgConnection, name: &str) -> AppResult<i32> {
    let name = name.trim();
    lock_name(conn, PUBLISHER_NAME_LOCK, name).await?;
    let existing = sqlx::query_scalar::<_, i32>(
        "SELECT publisher_id FROM publishers WHERE LOWER(name) = LOWER($1)",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(id) => Ok(id),
        None => {
            let id = sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO publishers (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING publisher_id
                "#,
            )
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
            tracing::info!("Created publisher {} ({})", name, id);
            Ok(id)
        }
    }
}

fn push_book_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
    if let Some(pattern) = search_term(&query.q) {
        builder
            .push(" AND (LOWER(b.name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(a.name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(b.category) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(b.genre) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    for (column, value) in [
        ("b.name", &query.title),
        ("a.name", &query.author),
        ("b.category", &query.category),
        ("b.genre", &query.genre),
        ("b.language", &query.language),
    ] {
        if let Some(pattern) = search_term(value) {
            builder
                .push(format!(" AND LOWER({}) LIKE ", column))
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }
    }

    if query.available_only.unwrap_or(false) {
        builder.push(" AND b.copies_available > 0");
    }
}
