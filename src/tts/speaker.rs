use std::path::{Path, PathBuf};

/// Default reference sample used for voice cloning when a deployment does not
/// provide its own.
pub const DEFAULT_SAMPLE_URL: &str =
    "https://raw.githubusercontent.com/coqui-ai/TTS/dev/tests/data/ljspeech/wavs/LJ001-0001.wav";

const SAMPLE_FILENAME: &str = "speaker_reference.wav";

/// Make sure a voice-cloning reference sample exists locally, downloading it
/// on first use.
///
/// Never fails the caller: any download or write error degrades to `None`
/// and the engine falls back to its default voice.
pub async fn ensure_reference_sample(dir: &Path, url: &str) -> Option<PathBuf> {
    let path = dir.join(SAMPLE_FILENAME);
    if path.exists() {
        tracing::info!("Using cached speaker reference: {}", path.display());
        return Some(path);
    }

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!("Could not create sample directory {}: {}", dir.display(), e);
        return None;
    }

    tracing::info!("Downloading speaker reference sample from {}", url);
    match download(url, &path).await {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!(
                "Speaker reference download failed ({}); falling back to default voice",
                e
            );
            None
        }
    }
}

async fn download(url: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = reqwest::get(url)
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    tokio::fs::write(path, &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cached_sample_is_returned_without_network() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SAMPLE_FILENAME);
        std::fs::write(&path, b"RIFF").unwrap();

        let got = ensure_reference_sample(tmp.path(), "http://invalid.invalid/sample.wav").await;
        assert_eq!(got, Some(path));
    }

    #[tokio::test]
    async fn unreachable_url_degrades_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        let got = ensure_reference_sample(tmp.path(), "http://127.0.0.1:1/sample.wav").await;
        assert!(got.is_none());
    }
}
