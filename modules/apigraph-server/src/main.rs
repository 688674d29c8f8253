use std::sync::Arc;

use anyhow::{Context, Result};
use apigraph_client::HttpBackend;
use apigraph_core::{compile, load_descriptions, AssembledSchema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, response::Html, routing::get, Router};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

async fn graphql_handler(
    State(schema): State<Arc<AssembledSchema>>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(async_graphql::http::GraphiQLSource::build().endpoint("/graphql").finish())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("apigraph=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let descriptions = load_descriptions(&config.descriptions_dir)
        .with_context(|| format!("Failed to load descriptions from {}", config.descriptions_dir.display()))?;
    let backend = Arc::new(HttpBackend::new(config.backend_config())?);
    let schema = compile(&config.compile_config(), descriptions, backend)
        .context("Failed to compile service APIs")?;

    let app = Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/", get(|| async { "ok" }))
        .with_state(Arc::new(schema))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("apigraph listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
