// src/main.rs
mod auth;
mod config;
mod database;
mod dtos;
mod error;
mod gateway;
mod handlers;
mod middleware;
mod models;
mod routes;
mod state;
mod store;


use axum::{routing::get, Router};
use dotenvy::dotenv;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::fmt::init as tracing_init;

use crate::config::Settings;
use crate::gateway::StripeGateway;
use crate::state::AppState;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_init();

    // Load environment variables
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{e}");
            return;
        }
    };

    // Create database pool and apply migrations
    let db_pool = database::create_pool(&settings.database_url)
        .await
        .expect("Failed to create database pool");
    database::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    // Create application state
    let store = Arc::new(PgStore::new(db_pool));
    let gateway = Arc::new(StripeGateway::new(settings.stripe_secret_key.clone()));
    let state = AppState::new(store, gateway, settings.clone());

    let app = Router::new()
        .route("/", get(|| async { "Parcel delivery server is running" }))
        .route("/health", get(health_check))
        .merge(routes::create_router(state.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server with HOST/PORT env and graceful port selection
    let host: IpAddr = settings
        .host
        .parse()
        .unwrap_or_else(|_| "127.0.0.1".parse().expect("loopback address"));
    let base_port = settings.port;

    // Try base_port..base_port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => {
                    bound = Some((l, addr));
                    break;
                }
                Err(e) => {
                    if offset == 0 {
                        tracing::warn!(%addr, error=%e, "Port in use, trying next");
                    }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
