use std::sync::Arc;

use chat_recall::api::api_routes;
use chat_recall::config::{EngineConfig, ServiceConfig};
use chat_recall::pipeline::BatchProcessor;
use chat_recall::recognition::create_backend;
use chat_recall::store::{ConversationStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let Some(vision) = config.vision else {
        eprintln!("Error: CHAT_RECALL_VISION_API_KEY not set");
        eprintln!("  export CHAT_RECALL_VISION_API_KEY=hf_...");
        std::process::exit(1);
    };

    eprintln!("📸 Chat Recall v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", vision.model);
    eprintln!("   Upload API: http://0.0.0.0:{}/api/upload", config.port);
    eprintln!(
        "   Conversations: http://0.0.0.0:{}/api/conversations",
        config.port
    );
    eprintln!("   Upload concurrency: {}\n", config.upload_concurrency);

    let backend = create_backend(&vision)?;
    let store: Arc<dyn ConversationStore> = Arc::new(MemoryStore::new());
    let processor = Arc::new(BatchProcessor::new(
        backend,
        EngineConfig::default(),
        config.upload_concurrency,
    ));

    let app = api_routes(store, processor);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "HTTP API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
