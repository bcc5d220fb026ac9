//! Query resolvers

use async_graphql::{Context, Object, Result, ResultExt, ID};
use libris_common::db::Repository;
use libris_common::docstore::DocRepository;
use libris_common::errors::AppError;
use libris_common::pagination::{PageInfo, PageRequest};
use libris_common::SEARCH_RESULT_CAP;

use super::inputs::{
    AuthorFilterInput, AuthorSortField, BookFilterInput, BookSortField, SearchType, SortOrder,
};
use super::parse_entity_id;
use super::types::{
    Author, AuthorConnection, Book, BookConnection, PaginationInfo, Review, ReviewConnection,
    SearchResults,
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Paginated, filterable, sortable book listing
    async fn books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 1)] page: i32,
        #[graphql(default = 10)] limit: i32,
        filter: Option<BookFilterInput>,
        sort_by: Option<BookSortField>,
        sort_order: Option<SortOrder>,
    ) -> Result<BookConnection> {
        let repo = ctx.data_unchecked::<Repository>();

        let request = PageRequest::new(i64::from(page), i64::from(limit));
        let filter = filter.map(Into::into).unwrap_or_default();
        let sort = sort_by.unwrap_or_default().into();
        let order = sort_order.unwrap_or_default().into();

        let (books, total) = repo.list_books(&filter, sort, order, request).await.extend()?;

        Ok(BookConnection {
            books: books.into_iter().map(Book).collect(),
            pagination: PaginationInfo::from(PageInfo::compute(request, total)),
        })
    }

    /// A single book; absent ids are an error, not a null
    async fn book(&self, ctx: &Context<'_>, id: ID) -> Result<Book> {
        let repo = ctx.data_unchecked::<Repository>();
        let id = parse_entity_id(&id)?;

        let book = repo
            .find_book_by_id(id)
            .await
            .extend()?
            .ok_or(AppError::BookNotFound { id })
            .extend()?;

        Ok(Book(book))
    }

    /// Paginated, filterable, sortable author listing
    async fn authors(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 1)] page: i32,
        #[graphql(default = 10)] limit: i32,
        filter: Option<AuthorFilterInput>,
        sort_by: Option<AuthorSortField>,
        sort_order: Option<SortOrder>,
    ) -> Result<AuthorConnection> {
        let repo = ctx.data_unchecked::<Repository>();

        let request = PageRequest::new(i64::from(page), i64::from(limit));
        let filter = filter.map(Into::into).unwrap_or_default();
        let sort = sort_by.unwrap_or_default().into();
        let order = sort_order.unwrap_or_default().into();

        let (authors, total) = repo
            .list_authors(&filter, sort, order, request)
            .await
            .extend()?;

        Ok(AuthorConnection {
            authors: authors.into_iter().map(Author).collect(),
            pagination: PaginationInfo::from(PageInfo::compute(request, total)),
        })
    }

    /// A single author; absent ids are an error, not a null
    async fn author(&self, ctx: &Context<'_>, id: ID) -> Result<Author> {
        let repo = ctx.data_unchecked::<Repository>();
        let id = parse_entity_id(&id)?;

        let author = repo
            .find_author_by_id(id)
            .await
            .extend()?
            .ok_or(AppError::AuthorNotFound { id })
            .extend()?;

        Ok(Author(author))
    }

    /// Paginated reviews for one book, newest first
    async fn reviews(
        &self,
        ctx: &Context<'_>,
        book_id: i32,
        #[graphql(default = 1)] page: i32,
        #[graphql(default = 10)] limit: i32,
    ) -> Result<ReviewConnection> {
        let docs = ctx.data_unchecked::<DocRepository>();

        let request = PageRequest::new(i64::from(page), i64::from(limit));
        let (reviews, total) = docs.list_reviews(book_id, request).await.extend()?;

        Ok(ReviewConnection {
            reviews: reviews.into_iter().map(Review).collect(),
            pagination: PaginationInfo::from(PageInfo::compute(request, total)),
        })
    }

    /// Free-text book search over title, description, and author name
    async fn search_books(&self, ctx: &Context<'_>, query: String) -> Result<Vec<Book>> {
        let repo = ctx.data_unchecked::<Repository>();

        let books = repo
            .search_books(&query, SEARCH_RESULT_CAP)
            .await
            .extend()?;

        Ok(books.into_iter().map(Book).collect())
    }

    /// Free-text author search over name and biography
    async fn search_authors(&self, ctx: &Context<'_>, query: String) -> Result<Vec<Author>> {
        let repo = ctx.data_unchecked::<Repository>();

        let authors = repo
            .search_authors(&query, SEARCH_RESULT_CAP)
            .await
            .extend()?;

        Ok(authors.into_iter().map(Author).collect())
    }

    /// Combined search; the list a `type` excludes comes back empty, not
    /// omitted
    async fn search(
        &self,
        ctx: &Context<'_>,
        query: String,
        #[graphql(name = "type")] search_type: Option<SearchType>,
    ) -> Result<SearchResults> {
        let repo = ctx.data_unchecked::<Repository>();
        let search_type = search_type.unwrap_or_default();

        let books = match search_type {
            SearchType::All | SearchType::Books => repo
                .search_books(&query, SEARCH_RESULT_CAP)
                .await
                .extend()?
                .into_iter()
                .map(Book)
                .collect(),
            SearchType::Authors => Vec::new(),
        };

        let authors = match search_type {
            SearchType::All | SearchType::Authors => repo
                .search_authors(&query, SEARCH_RESULT_CAP)
                .await
                .extend()?
                .into_iter()
                .map(Author)
                .collect(),
            SearchType::Books => Vec::new(),
        };

        Ok(SearchResults { books, authors })
    }
}
