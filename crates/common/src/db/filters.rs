//! Filter and sort inputs for list queries
//!
//! Flat filter objects are translated into SeaORM conditions; sort fields
//! are a fixed allow-list of columns rather than caller-supplied strings.

use super::models::{author, book};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, Order};
use serde::{Deserialize, Serialize};

/// Substring pattern for case-insensitive matching
fn like_pattern(value: &str) -> String {
    format!("%{}%", value)
}

/// Filter input for book list queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookFilter {
    /// Substring match on the title
    pub title: Option<String>,

    /// Substring match on the author's name (joins the authors table)
    pub author: Option<String>,

    /// Exact author id
    pub author_id: Option<i32>,

    /// Inclusive lower bound on the publication date
    pub published_date_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on the publication date
    pub published_date_to: Option<DateTime<Utc>>,
}

impl BookFilter {
    /// Whether applying this filter requires joining the authors table
    pub fn needs_author_join(&self) -> bool {
        self.author.is_some()
    }

    /// Translate into a SeaORM condition
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(title) = &self.title {
            cond = cond
                .add(Expr::col((book::Entity, book::Column::Title)).ilike(like_pattern(title)));
        }

        if let Some(author) = &self.author {
            cond = cond
                .add(Expr::col((author::Entity, author::Column::Name)).ilike(like_pattern(author)));
        }

        if let Some(author_id) = self.author_id {
            cond = cond.add(Expr::col((book::Entity, book::Column::AuthorId)).eq(author_id));
        }

        if let Some(from) = self.published_date_from {
            cond = cond.add(Expr::col((book::Entity, book::Column::PublishedDate)).gte(from));
        }

        if let Some(to) = self.published_date_to {
            cond = cond.add(Expr::col((book::Entity, book::Column::PublishedDate)).lte(to));
        }

        cond
    }
}

/// Filter input for author list queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorFilter {
    /// Substring match on the name
    pub name: Option<String>,

    /// Inclusive lower bound on the birth year
    pub born_year_from: Option<i32>,

    /// Inclusive upper bound on the birth year
    pub born_year_to: Option<i32>,
}

impl AuthorFilter {
    /// Translate into a SeaORM condition
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(name) = &self.name {
            cond = cond
                .add(Expr::col((author::Entity, author::Column::Name)).ilike(like_pattern(name)));
        }

        if let Some(from_year) = self.born_year_from {
            if let Some(from) = Utc.with_ymd_and_hms(from_year, 1, 1, 0, 0, 0).single() {
                cond = cond.add(Expr::col((author::Entity, author::Column::BornDate)).gte(from));
            }
        }

        if let Some(to_year) = self.born_year_to {
            if let Some(to) = Utc.with_ymd_and_hms(to_year, 12, 31, 0, 0, 0).single() {
                cond = cond.add(Expr::col((author::Entity, author::Column::BornDate)).lte(to));
            }
        }

        cond
    }
}

/// Sortable columns for book list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    PublishedDate,
}

impl BookSortField {
    pub fn column(&self) -> book::Column {
        match self {
            BookSortField::CreatedAt => book::Column::CreatedAt,
            BookSortField::UpdatedAt => book::Column::UpdatedAt,
            BookSortField::Title => book::Column::Title,
            BookSortField::PublishedDate => book::Column::PublishedDate,
        }
    }
}

/// Sortable columns for author list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    BornDate,
}

impl AuthorSortField {
    pub fn column(&self) -> author::Column {
        match self {
            AuthorSortField::CreatedAt => author::Column::CreatedAt,
            AuthorSortField::UpdatedAt => author::Column::UpdatedAt,
            AuthorSortField::Name => author::Column::Name,
            AuthorSortField::BornDate => author::Column::BornDate,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn book_sql(filter: &BookFilter) -> String {
        book::Entity::find()
            .filter(filter.condition())
            .build(DbBackend::Postgres)
            .to_string()
    }

    fn author_sql(filter: &AuthorFilter) -> String {
        author::Entity::find()
            .filter(filter.condition())
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_empty_filter_adds_no_predicates() {
        assert!(!book_sql(&BookFilter::default()).contains("WHERE"));
        assert!(!author_sql(&AuthorFilter::default()).contains("WHERE"));
    }

    #[test]
    fn test_title_filter_is_case_insensitive_substring() {
        let filter = BookFilter {
            title: Some("hobbit".into()),
            ..Default::default()
        };
        let sql = book_sql(&filter);
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("%hobbit%"));
    }

    #[test]
    fn test_author_join_only_when_author_filter_set() {
        assert!(!BookFilter::default().needs_author_join());
        let filter = BookFilter {
            author: Some("tolkien".into()),
            ..Default::default()
        };
        assert!(filter.needs_author_join());
    }

    #[test]
    fn test_date_range_filter_adds_both_bounds() {
        let filter = BookFilter {
            published_date_from: Some(Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap()),
            published_date_to: Some(Utc.with_ymd_and_hms(1999, 12, 31, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let sql = book_sql(&filter);
        assert!(sql.contains(">="));
        assert!(sql.contains("<="));
    }

    #[test]
    fn test_born_year_range_maps_to_calendar_bounds() {
        let filter = AuthorFilter {
            born_year_from: Some(1920),
            born_year_to: Some(1980),
            ..Default::default()
        };
        let sql = author_sql(&filter);
        assert!(sql.contains("1920-01-01"));
        assert!(sql.contains("1980-12-31"));
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("rust"), "%rust%");
    }
}
