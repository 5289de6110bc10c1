use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use aperture_api::auth::{self, AppState, AppStateInner};
use aperture_api::middleware::require_auth;
use aperture_api::{comments, feed, likes, notifications, photos, search, users};

/// Multipart envelope cap: the 5 MiB photo limit plus form overhead.
const MAX_UPLOAD_BYTES: usize = 6 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aperture=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("APERTURE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("APERTURE_DB_PATH").unwrap_or_else(|_| "aperture.db".into());
    let host = std::env::var("APERTURE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("APERTURE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let media_dir = std::env::var("APERTURE_MEDIA_DIR").unwrap_or_else(|_| "./media".into());
    let public_url = std::env::var("APERTURE_PUBLIC_URL")
        .unwrap_or_else(|_| format!("http://localhost:{port}/media"));

    // Init database and blob storage
    let db = aperture_db::Database::open(&PathBuf::from(&db_path))?;
    let blobs = aperture_storage::BlobStore::new(PathBuf::from(&media_dir), public_url).await?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        blobs,
        jwt_secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users/profile", put(users::update_profile))
        .route("/users/{username}", get(users::get_profile))
        .route("/users/follow/{username}", post(users::follow_user))
        .route("/users/unfollow/{username}", delete(users::unfollow_user))
        .route("/photos", post(photos::upload_photo).get(photos::list_photos))
        .route("/photos/{id}", delete(photos::delete_photo))
        .route("/feed", get(feed::get_feed))
        .route("/likes", post(likes::create_like))
        .route("/likes/{photo_id}", delete(likes::delete_like))
        .route("/likes/photo/{photo_id}", get(likes::list_likes))
        .route("/likes/photo/{photo_id}/count", get(likes::count_likes))
        .route(
            "/comments/photo/{photo_id}",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route(
            "/comments/photo/{photo_id}/count",
            get(comments::count_comments),
        )
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/search", get(search::search))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/media", ServeDir::new(&media_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Aperture server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
