//! Waterflow - capture a task with an upward right-drag, anywhere on screen.
//!
//! This is the main library crate for Waterflow. It provides the gesture
//! pipeline, the task store and the console host used by the binary.

pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod gesture;
pub mod storage;
pub mod tasks;

use anyhow::Context;
use app::Waterflow;
use config::Settings;
use error::WaterflowError;
use gesture::GestureEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the application
pub fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waterflow=debug,waterflow_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Waterflow v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("failed to load settings")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    runtime.block_on(serve(settings))
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let monitor = capture::platform_monitor(settings.monitor.clone());
    let mut app = Waterflow::start(settings, monitor)
        .await
        .context("failed to start")?;

    let mut gestures = app
        .take_gesture_events()
        .context("gesture events already taken")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    if !app.transport_available() {
        tracing::info!("Type a task title and press Enter to add it");
    }

    loop {
        tokio::select! {
            _ = &mut interrupted => {
                tracing::info!("Interrupted");
                break;
            }
            Some(event) = gestures.recv() => match event {
                GestureEvent::UpwardDrag { point } => {
                    tracing::info!("Upward drag at ({}, {}); type a task title", point.x, point.y);
                }
                other => tracing::trace!("Gesture: {:?}", other),
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => match app.dispatcher().create_task(&line) {
                    Ok(record) => {
                        println!("+ {} ({} tasks)", record.title(), app.mirror().len());
                    }
                    Err(WaterflowError::InvalidArgument(reason)) => {
                        tracing::debug!("Ignored input: {}", reason);
                    }
                    Err(e) => tracing::error!("Failed to create task: {}", e),
                },
                Ok(None) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            },
        }
    }

    app.shutdown().await.context("shutdown did not complete")?;
    Ok(())
}
