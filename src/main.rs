use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod error;
mod store;
mod tts;

use api::routes::{create_router, AppState};
use store::AudioStore;
use tts::{load_first_available, ModelSpec, TtsService};

const DEFAULT_MODEL_CANDIDATES: &str =
    "piper:en_US-amy-medium,piper:en_US-lessac-low,piper:en_GB-alba-medium";

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configuration from environment
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .expect("PORT must be a number");
    let static_dir: PathBuf = std::env::var("STATIC_DIR")
        .unwrap_or_else(|_| "static".to_string())
        .into();
    let voices_dir: PathBuf = std::env::var("VOICES_DIR")
        .unwrap_or_else(|_| "./voices".to_string())
        .into();
    let candidates = std::env::var("MODEL_CANDIDATES")
        .unwrap_or_else(|_| DEFAULT_MODEL_CANDIDATES.to_string());
    let sample_dir: PathBuf = std::env::var("SPEAKER_SAMPLE_DIR")
        .unwrap_or_else(|_| "./samples".to_string())
        .into();
    let sample_url = std::env::var("SPEAKER_SAMPLE_URL")
        .unwrap_or_else(|_| tts::speaker::DEFAULT_SAMPLE_URL.to_string());

    let candidates = ModelSpec::parse_list(&candidates).expect("Invalid MODEL_CANDIDATES");

    tracing::info!("Offline TTS Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Loading TTS model... This may take a few minutes on first run.");

    let model = load_first_available(&candidates, &voices_dir).await;

    // Only voice-cloning engines have any use for the reference sample.
    let speaker_sample = match &model {
        Some(m) if m.engine.capabilities().voice_cloning => {
            tts::speaker::ensure_reference_sample(&sample_dir, &sample_url).await
        }
        _ => None,
    };

    let store =
        AudioStore::new(static_dir.join("audio")).expect("Failed to create audio directory");

    let state = Arc::new(AppState {
        tts: TtsService::new(model, speaker_sample),
        store,
    });

    let app = create_router(state, static_dir);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid address");
    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
