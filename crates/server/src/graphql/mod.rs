//! The GraphQL surface
//!
//! One schema exposing the full Query/Mutation API, served from a single
//! axum route. Store repositories, the image host client, and the
//! request-scoped dataloaders ride along as schema data.

pub mod inputs;
pub mod loaders;
pub mod mutation;
pub mod query;
pub mod scalars;
pub mod types;

use async_graphql::dataloader::DataLoader;
use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use libris_common::config::AppConfig;
use libris_common::db::Repository;
use libris_common::docstore::DocRepository;
use libris_common::images::ImageHost;
use libris_common::metrics;
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;
use loaders::{AuthorBooksLoader, AuthorLoader, AuthorMetadataLoader, BookMetadataLoader};
use mutation::MutationRoot;
use query::QueryRoot;

/// Parse a relational entity id out of a GraphQL `ID`
pub(crate) fn parse_entity_id(id: &async_graphql::ID) -> async_graphql::Result<i32> {
    use async_graphql::ErrorExtensions;
    id.parse::<i32>().map_err(|_| {
        libris_common::errors::AppError::InvalidId {
            value: id.to_string(),
        }
        .extend()
    })
}

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with its data context
pub fn build_schema(
    repo: Repository,
    docs: DocRepository,
    images: ImageHost,
    config: Arc<AppConfig>,
) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(DataLoader::new(AuthorLoader::new(repo.clone()), tokio::spawn))
        .data(DataLoader::new(
            AuthorBooksLoader::new(repo.clone()),
            tokio::spawn,
        ))
        .data(DataLoader::new(
            AuthorMetadataLoader::new(docs.clone()),
            tokio::spawn,
        ))
        .data(DataLoader::new(
            BookMetadataLoader::new(docs.clone()),
            tokio::spawn,
        ))
        .data(repo)
        .data(docs)
        .data(images)
        .data(config)
        .finish()
}

/// The POST /graphql handler
pub async fn graphql_handler(
    State(state): State<AppState>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let start = Instant::now();
    let response = state.schema.execute(request.into_inner()).await;
    metrics::record_graphql_request(start.elapsed().as_secs_f64(), response.is_ok());
    response.into()
}

/// The GET /graphql handler: the GraphiQL IDE
pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
