//! Repository pattern for relational store operations
//!
//! Provides a clean interface for author/book data access with proper
//! error handling. All list queries go through the shared pagination
//! helper; search queries union their match paths and de-duplicate by id.

use crate::db::filters::{AuthorFilter, AuthorSortField, BookFilter, BookSortField, SortOrder};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::pagination::PageRequest;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use std::collections::HashSet;

/// Partial update for an author row; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct AuthorChanges {
    pub name: Option<String>,
    pub biography: Option<String>,
    pub born_date: Option<DateTime<Utc>>,
}

/// Partial update for a book row; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub author_id: Option<i32>,
}

/// Repository for relational data access
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Author Operations
    // ========================================================================

    /// Create a new author
    pub async fn create_author(
        &self,
        name: String,
        biography: Option<String>,
        born_date: Option<DateTime<Utc>>,
    ) -> Result<Author> {
        let now = chrono::Utc::now();

        let author = AuthorActiveModel {
            name: Set(name),
            biography: Set(biography),
            born_date: Set(born_date.map(Into::into)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        author.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find author by ID
    pub async fn find_author_by_id(&self, id: i32) -> Result<Option<Author>> {
        AuthorEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find several authors in one query
    pub async fn find_authors_by_ids(&self, ids: &[i32]) -> Result<Vec<Author>> {
        AuthorEntity::find()
            .filter(AuthorColumn::Id.is_in(ids.to_vec()))
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List authors with filtering, sorting, and pagination
    pub async fn list_authors(
        &self,
        filter: &AuthorFilter,
        sort: AuthorSortField,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<(Vec<Author>, u64)> {
        let paginator = AuthorEntity::find()
            .filter(filter.condition())
            .order_by(sort.column(), order.into())
            .paginate(self.conn(), page.limit);

        let total = paginator.num_items().await?;
        let authors = paginator.fetch_page(page.page_index()).await?;

        Ok((authors, total))
    }

    /// Apply a partial update to an author
    pub async fn update_author(&self, id: i32, changes: AuthorChanges) -> Result<Author> {
        let mut author: AuthorActiveModel = AuthorEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or(AppError::AuthorNotFound { id })?
            .into();

        if let Some(name) = changes.name {
            author.name = Set(name);
        }
        if let Some(biography) = changes.biography {
            author.biography = Set(Some(biography));
        }
        if let Some(born_date) = changes.born_date {
            author.born_date = Set(Some(born_date.into()));
        }
        author.updated_at = Set(chrono::Utc::now().into());

        author.update(self.conn()).await.map_err(Into::into)
    }

    /// Delete author by ID
    pub async fn delete_author(&self, id: i32) -> Result<bool> {
        let result = AuthorEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// Case-insensitive substring search over name and biography
    pub async fn search_authors(&self, query: &str, limit: u64) -> Result<Vec<Author>> {
        let pattern = format!("%{}%", query);

        AuthorEntity::find()
            .filter(
                Condition::any()
                    .add(Expr::col((AuthorEntity, AuthorColumn::Name)).ilike(pattern.as_str()))
                    .add(
                        Expr::col((AuthorEntity, AuthorColumn::Biography))
                            .ilike(pattern.as_str()),
                    ),
            )
            .limit(limit)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Book Operations
    // ========================================================================

    /// Create a new book
    pub async fn create_book(
        &self,
        title: String,
        description: Option<String>,
        published_date: Option<DateTime<Utc>>,
        author_id: i32,
    ) -> Result<Book> {
        let now = chrono::Utc::now();

        let book = BookActiveModel {
            title: Set(title),
            description: Set(description),
            published_date: Set(published_date.map(Into::into)),
            author_id: Set(author_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        book.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find book by ID
    pub async fn find_book_by_id(&self, id: i32) -> Result<Option<Book>> {
        BookEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List books with filtering, sorting, and pagination.
    ///
    /// An author-name filter joins the authors table; every other filter
    /// runs against the books table alone.
    pub async fn list_books(
        &self,
        filter: &BookFilter,
        sort: BookSortField,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<(Vec<Book>, u64)> {
        let mut query = BookEntity::find();

        if filter.needs_author_join() {
            query = query.join(JoinType::InnerJoin, book::Relation::Author.def());
        }

        let paginator = query
            .filter(filter.condition())
            .order_by(sort.column(), order.into())
            .paginate(self.conn(), page.limit);

        let total = paginator.num_items().await?;
        let books = paginator.fetch_page(page.page_index()).await?;

        Ok((books, total))
    }

    /// Apply a partial update to a book
    pub async fn update_book(&self, id: i32, changes: BookChanges) -> Result<Book> {
        let mut book: BookActiveModel = BookEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or(AppError::BookNotFound { id })?
            .into();

        if let Some(title) = changes.title {
            book.title = Set(title);
        }
        if let Some(description) = changes.description {
            book.description = Set(Some(description));
        }
        if let Some(published_date) = changes.published_date {
            book.published_date = Set(Some(published_date.into()));
        }
        if let Some(author_id) = changes.author_id {
            book.author_id = Set(author_id);
        }
        book.updated_at = Set(chrono::Utc::now().into());

        book.update(self.conn()).await.map_err(Into::into)
    }

    /// Delete book by ID
    pub async fn delete_book(&self, id: i32) -> Result<bool> {
        let result = BookEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// Count the books owned by one author
    pub async fn count_books_by_author(&self, author_id: i32) -> Result<u64> {
        BookEntity::find()
            .filter(BookColumn::AuthorId.eq(author_id))
            .count(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Books for a set of authors, newest publication first (batch lookup)
    pub async fn find_books_by_author_ids(&self, author_ids: &[i32]) -> Result<Vec<Book>> {
        BookEntity::find()
            .filter(BookColumn::AuthorId.is_in(author_ids.to_vec()))
            .order_by_desc(BookColumn::PublishedDate)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Case-insensitive substring search over title and description,
    /// unioned with books whose author's name matches; de-duplicated by
    /// id and capped at `limit`.
    pub async fn search_books(&self, query: &str, limit: u64) -> Result<Vec<Book>> {
        let pattern = format!("%{}%", query);

        let direct = BookEntity::find()
            .filter(
                Condition::any()
                    .add(Expr::col((BookEntity, BookColumn::Title)).ilike(pattern.as_str()))
                    .add(
                        Expr::col((BookEntity, BookColumn::Description)).ilike(pattern.as_str()),
                    ),
            )
            .limit(limit)
            .all(self.conn())
            .await?;

        let via_author = BookEntity::find()
            .join(JoinType::InnerJoin, book::Relation::Author.def())
            .filter(Expr::col((AuthorEntity, AuthorColumn::Name)).ilike(pattern.as_str()))
            .limit(limit)
            .all(self.conn())
            .await?;

        let mut seen = HashSet::new();
        let mut books = Vec::new();
        for book in direct.into_iter().chain(via_author) {
            if seen.insert(book.id) {
                books.push(book);
            }
            if books.len() as u64 == limit {
                break;
            }
        }

        Ok(books)
    }

    // ========================================================================
    // Reconciliation Support
    // ========================================================================

    /// Book counts grouped by author id, for the reconciliation pass
    pub async fn book_counts_by_author(&self) -> Result<Vec<(i32, i64)>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT author_id, COUNT(*) AS book_count FROM books GROUP BY author_id",
            vec![],
        );

        let rows = self.conn().query_all(stmt).await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let author_id: i32 = row.try_get("", "author_id")?;
            let book_count: i64 = row.try_get("", "book_count")?;
            counts.push((author_id, book_count));
        }

        Ok(counts)
    }
}
