use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use squword::dictionary::{CachedOracle, DictionaryOracle, WordListOracle};
use squword::event::EventBus;
use squword::game::repository::InMemoryGameRepository;
use squword::game::GameService;
use squword::shared::AppState;
use squword::websockets::{websocket_handler, ConnectionManager, InMemoryConnectionManager};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squword=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting squword game server");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let repository = Arc::new(InMemoryGameRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let repository = Arc::new(squword::game::repository::PostgresGameRepository::new(pool));

    let wordlist_path =
        std::env::var("SQUWORD_WORDLIST").unwrap_or_else(|_| "words.txt".to_string());
    let oracle: Arc<dyn DictionaryOracle> = match WordListOracle::from_file(&wordlist_path) {
        Ok(oracle) => Arc::new(oracle),
        Err(e) => {
            warn!(
                path = %wordlist_path,
                error = %e,
                "Word list unavailable; every submitted word will be rejected"
            );
            Arc::new(WordListOracle::from_words(Vec::<String>::new()))
        }
    };
    let dictionary = Arc::new(CachedOracle::new(oracle));

    let game_service = Arc::new(GameService::new(repository, dictionary));
    let event_bus = EventBus::new();
    let connections: Arc<dyn ConnectionManager> = Arc::new(InMemoryConnectionManager::new());
    let app_state = AppState::new(game_service, event_bus, connections);

    // One WebSocket route per room; everything else is client-side.
    let app = Router::new()
        .route("/", get(|| async { "squword server" }))
        .route("/ws/:room_id", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}
