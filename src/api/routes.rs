use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use crate::store::AudioStore;
use crate::tts::TtsService;

pub struct AppState {
    pub tts: TtsService,
    pub store: AudioStore,
}

pub fn create_router(state: Arc<AppState>, static_dir: PathBuf) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/tts", post(handlers::synthesize))
        .route("/health", get(handlers::health))
        .route("/audio/:filename", delete(handlers::delete_audio));

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(static_dir.clone()))
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::tts::{EngineCapabilities, LoadedModel, SpeechEngine};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hound::{SampleFormat, WavSpec, WavWriter};
    use http_body_util::BodyExt;
    use std::path::Path;
    use tower::ServiceExt;

    struct FakeEngine;

    #[async_trait]
    impl SpeechEngine for FakeEngine {
        fn capabilities(&self) -> EngineCapabilities {
            EngineCapabilities {
                multilingual: false,
                voice_cloning: false,
            }
        }

        async fn synthesize_to_file(
            &self,
            _text: &str,
            _language: &str,
            _speaker_sample: Option<&Path>,
            out_path: &Path,
        ) -> Result<(), AppError> {
            let spec = WavSpec {
                channels: 1,
                sample_rate: 22050,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            let mut writer = WavWriter::create(out_path, spec)
                .map_err(|e| AppError::Synthesis(e.to_string()))?;
            for sample in [0i16, 1000, -1000, 500] {
                writer
                    .write_sample(sample)
                    .map_err(|e| AppError::Synthesis(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| AppError::Synthesis(e.to_string()))?;
            Ok(())
        }
    }

    fn test_app(loaded: bool) -> (tempfile::TempDir, Router) {
        let tmp = tempfile::tempdir().unwrap();
        let store = AudioStore::new(tmp.path().join("audio")).unwrap();
        let model = loaded.then(|| LoadedModel {
            id: "fake:test".to_string(),
            engine: Box::new(FakeEngine) as Box<dyn SpeechEngine>,
        });
        let state = Arc::new(AppState {
            tts: TtsService::new(model, None),
            store,
        });
        let app = create_router(state, tmp.path().join("static"));
        (tmp, app)
    }

    fn tts_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/tts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn synthesize_returns_url_to_written_file() {
        let (tmp, app) = test_app(true);

        let response = app
            .oneshot(tts_request(r#"{"text": "Hello world", "language": "en"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        let url = body["audio_url"].as_str().unwrap();
        assert!(url.starts_with("/static/audio/"));
        assert!(url.ends_with(".wav"));

        let filename = url.rsplit('/').next().unwrap();
        let bytes = std::fs::read(tmp.path().join("audio").join(filename)).unwrap();
        assert!(bytes.starts_with(b"RIFF"));
        assert!(bytes.len() > 44);
    }

    #[tokio::test]
    async fn synthesize_rejects_empty_text_without_writing() {
        let (tmp, app) = test_app(true);

        let response = app.oneshot(tts_request(r#"{"text": "   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            std::fs::read_dir(tmp.path().join("audio")).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn synthesize_rejects_over_length_text() {
        let (tmp, app) = test_app(true);
        let long = "a".repeat(1001);

        let response = app
            .oneshot(tts_request(&format!(r#"{{"text": "{}"}}"#, long)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            std::fs::read_dir(tmp.path().join("audio")).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn synthesize_accepts_exactly_max_length() {
        let (_tmp, app) = test_app(true);
        let text = "a".repeat(1000);

        let response = app
            .oneshot(tts_request(&format!(r#"{{"text": "{}"}}"#, text)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn synthesize_fails_fast_when_no_model_loaded() {
        let (_tmp, app) = test_app(false);

        let response = app
            .oneshot(tts_request(r#"{"text": "Hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["code"], "MODEL_NOT_LOADED");
    }

    #[tokio::test]
    async fn consecutive_calls_get_distinct_filenames() {
        let (_tmp, app) = test_app(true);

        let mut urls = Vec::new();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(tts_request(r#"{"text": "again"}"#))
                .await
                .unwrap();
            let body = json_body(response).await;
            urls.push(body["audio_url"].as_str().unwrap().to_string());
        }
        assert_ne!(urls[0], urls[1]);
    }

    #[tokio::test]
    async fn health_reflects_loaded_model() {
        let (_tmp, app) = test_app(true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["model_type"], "single_speaker");
    }

    #[tokio::test]
    async fn health_reports_degraded_state() {
        let (_tmp, app) = test_app(false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["model_loaded"], false);
        assert_eq!(body["model_type"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn delete_existing_audio_succeeds() {
        let (tmp, app) = test_app(true);
        std::fs::write(tmp.path().join("audio").join("abc-123.wav"), b"RIFF").unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/audio/abc-123.wav")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert!(!tmp.path().join("audio").join("abc-123.wav").exists());
    }

    #[tokio::test]
    async fn delete_missing_audio_is_404() {
        let (_tmp, app) = test_app(true);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/audio/nonexistent.wav")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_invalid_filename_is_400() {
        let (_tmp, app) = test_app(true);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/audio/bad;name.wav")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
