use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Request, Response},
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::{net::SocketAddr, sync::Arc, time::Duration};

use storefront_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    payment::{PaymentGateway, braintree::BraintreeGateway},
    routes::create_app,
    security::token::TokenService,
    state::AppState,
    store::{MemoryStore, PgStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            let orm = orm_from_pool(&pool);
            Arc::new(PgStore::new(pool, orm))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL is not set, using the in-memory store; data is lost on exit"
            );
            Arc::new(MemoryStore::new())
        }
    };
    let gateway: Arc<dyn PaymentGateway> = Arc::new(BraintreeGateway::new(&config.braintree)?);
    tracing::info!(braintree = ?config.braintree, "payment gateway configured");

    let state = AppState::new(
        store,
        TokenService::new(config.jwt_secret.as_bytes()),
        gateway,
    );

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|_request: &Request<_>, _span: &tracing::Span| {
            tracing::info!("request started");
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let cors = match &config.cors_allow_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let app = create_app(state)
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(cors)
        .layer(ConcurrencyLimitLayer::new(config.concurrency_limit));

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
