//! GraphQL input objects and enums

use async_graphql::{Enum, InputObject};
use libris_common::db::filters;
use validator::Validate;

use super::scalars::Date;

#[derive(Debug, InputObject, Validate)]
pub struct BookInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub description: Option<String>,

    #[graphql(name = "published_date")]
    pub published_date: Option<Date>,

    #[graphql(name = "author_id")]
    pub author_id: i32,

    pub cover_image_url: Option<String>,

    /// Asset id from `uploadImage`; derived from the URL when absent
    pub cover_image_public_id: Option<String>,
}

#[derive(Debug, InputObject, Validate)]
pub struct BookUpdateInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[graphql(name = "published_date")]
    pub published_date: Option<Date>,

    #[graphql(name = "author_id")]
    pub author_id: Option<i32>,

    pub cover_image_url: Option<String>,

    /// Asset id from `uploadImage`; derived from the URL when absent
    pub cover_image_public_id: Option<String>,
}

#[derive(Debug, InputObject, Validate)]
pub struct AuthorInput {
    #[validate(length(min = 2, max = 255))]
    pub name: String,

    pub biography: Option<String>,

    #[graphql(name = "born_date")]
    pub born_date: Option<Date>,

    pub profile_image_url: Option<String>,

    /// Asset id from `uploadImage`; derived from the URL when absent
    pub profile_image_public_id: Option<String>,
}

#[derive(Debug, InputObject, Validate)]
pub struct AuthorUpdateInput {
    #[validate(length(min = 2, max = 255))]
    pub name: Option<String>,

    pub biography: Option<String>,

    #[graphql(name = "born_date")]
    pub born_date: Option<Date>,

    pub profile_image_url: Option<String>,

    /// Asset id from `uploadImage`; derived from the URL when absent
    pub profile_image_public_id: Option<String>,
}

#[derive(Debug, InputObject, Validate)]
pub struct BookMetadataInput {
    pub genres: Option<Vec<String>>,

    pub tags: Option<Vec<String>>,

    pub isbn: Option<String>,

    #[validate(range(min = 1))]
    pub page_count: Option<i32>,

    pub language: Option<String>,

    pub cover_image_url: Option<String>,

    /// Asset id from `uploadImage`; derived from the URL when absent
    pub cover_image_public_id: Option<String>,
}

#[derive(Debug, InputObject, Validate)]
pub struct ReviewInput {
    pub book_id: i32,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(max = 1000))]
    pub comment: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub reviewer_name: String,
}

#[derive(Debug, Default, InputObject)]
pub struct BookFilterInput {
    /// Substring match on the title
    pub title: Option<String>,

    /// Substring match on the author's name
    pub author: Option<String>,

    #[graphql(name = "author_id")]
    pub author_id: Option<i32>,

    #[graphql(name = "published_date_from")]
    pub published_date_from: Option<Date>,

    #[graphql(name = "published_date_to")]
    pub published_date_to: Option<Date>,
}

impl From<BookFilterInput> for filters::BookFilter {
    fn from(input: BookFilterInput) -> Self {
        Self {
            title: input.title,
            author: input.author,
            author_id: input.author_id,
            published_date_from: input.published_date_from.map(|date| date.0),
            published_date_to: input.published_date_to.map(|date| date.0),
        }
    }
}

#[derive(Debug, Default, InputObject)]
pub struct AuthorFilterInput {
    /// Substring match on the name
    pub name: Option<String>,

    #[graphql(name = "born_year_from")]
    pub born_year_from: Option<i32>,

    #[graphql(name = "born_year_to")]
    pub born_year_to: Option<i32>,
}

impl From<AuthorFilterInput> for filters::AuthorFilter {
    fn from(input: AuthorFilterInput) -> Self {
        Self {
            name: input.name,
            born_year_from: input.born_year_from,
            born_year_to: input.born_year_to,
        }
    }
}

/// Allow-listed sortable columns for book list queries
#[derive(Enum, Copy, Clone, Eq, PartialEq, Default)]
#[graphql(remote = "filters::BookSortField")]
pub enum BookSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    PublishedDate,
}

/// Allow-listed sortable columns for author list queries
#[derive(Enum, Copy, Clone, Eq, PartialEq, Default)]
#[graphql(remote = "filters::AuthorSortField")]
pub enum AuthorSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    BornDate,
}

/// Sort direction
#[derive(Enum, Copy, Clone, Eq, PartialEq, Default)]
#[graphql(remote = "filters::SortOrder")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Which entity types a combined search covers
#[derive(Enum, Copy, Clone, Eq, PartialEq, Default)]
pub enum SearchType {
    #[default]
    All,
    Books,
    Authors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_enums_map_onto_query_layer_fields() {
        let field: filters::BookSortField = BookSortField::PublishedDate.into();
        assert_eq!(field, filters::BookSortField::PublishedDate);

        let field: filters::AuthorSortField = AuthorSortField::Name.into();
        assert_eq!(field, filters::AuthorSortField::Name);

        let order: filters::SortOrder = SortOrder::Asc.into();
        assert_eq!(order, filters::SortOrder::Asc);
    }

    #[test]
    fn test_sort_defaults_are_created_at_desc() {
        assert_eq!(BookSortField::default(), BookSortField::CreatedAt);
        assert_eq!(AuthorSortField::default(), AuthorSortField::CreatedAt);
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }

    #[test]
    fn test_filter_input_conversion() {
        let input = BookFilterInput {
            title: Some("dune".to_string()),
            author: None,
            author_id: Some(7),
            published_date_from: None,
            published_date_to: None,
        };
        let filter: filters::BookFilter = input.into();
        assert_eq!(filter.title.as_deref(), Some("dune"));
        assert_eq!(filter.author_id, Some(7));
        assert!(!filter.needs_author_join());
    }

    #[test]
    fn test_review_input_validation_bounds() {
        let valid = ReviewInput {
            book_id: 1,
            rating: 5,
            comment: None,
            reviewer_name: "reader".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_rating = ReviewInput { rating: 6, ..valid };
        assert!(bad_rating.validate().is_err());
    }
}
