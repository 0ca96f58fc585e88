//! Drives a full processing session against a running backend.
//!
//! Usage: `cargo run -p vedit-session --example session_demo -- clip.mp4 12.5`
//!
//! Backend location comes from `VEDIT_BACKEND_URL` (default
//! `http://localhost:5000`); a `.env` file is honored.

use std::sync::Arc;

use anyhow::{Context, Result};

use vedit_client::JobClient;
use vedit_models::{MediaInfo, ProcessingOptions, Resolution};
use vedit_session::{SessionController, SessionPhase};
use vedit_store::JsonFileStore;
use vedit_stream::StreamConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: session_demo <video-file> [duration-seconds]")?;
    let duration: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0.0);

    let bytes = std::fs::read(&path).with_context(|| format!("could not read {path}"))?;
    let file_name = std::path::Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.mp4")
        .to_string();

    let client = JobClient::from_env()?;
    let store = Arc::new(JsonFileStore::open(".vedit-session.json"));
    let mut session = SessionController::new(client, StreamConfig::from_env(), store);

    let video = session
        .upload(
            &file_name,
            bytes,
            format!("file://{path}"),
            MediaInfo::new(duration, Resolution::new(0, 0), "mp4"),
        )
        .await?;
    println!("uploaded {} ({} bytes)", video.display_name, video.byte_size);

    session.start_processing(ProcessingOptions::default()).await?;
    while session.phase() == SessionPhase::Processing {
        session.pump().await?;
        if let Some(progress) = session.snapshot().progress {
            println!(
                "{:>5.1}%  {}/{} frames  {:.1} fps  eta {:.0}s",
                progress.percent(),
                progress.frames_done,
                progress.frames_total,
                progress.frames_per_second,
                progress.eta_seconds
            );
        }
    }

    match session.phase() {
        SessionPhase::Succeeded => {
            let output = session.output().context("no output recorded")?;
            println!("done: {}", output.source_url);
        }
        other => {
            println!(
                "ended in {other}: {}",
                session.snapshot().error.unwrap_or_default()
            );
        }
    }

    Ok(())
}
