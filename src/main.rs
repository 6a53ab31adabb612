//! LED Sketch server
//!
//! Runs the etch-a-sketch on a Raspberry Pi LED panel and accepts gestures
//! and button presses over HTTP, so any device on the LAN (a phone, a board
//! with an accelerometer, a script) can play.
//!
//! ## Architecture
//! - **Sketch thread** (std::thread): owns the display and the sketch state,
//!   handles events and blinks the cursor
//! - **HTTP server** (tokio/axum): accepts events, sends them via channel
//!
//! Without the `hardware` feature the sketch runs on an in-memory display;
//! `GET /api/v1/status` shows what it would look like.
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/led-sketch --port 8080 --blink-ms 150
//! curl -X POST localhost:8080/api/v1/gesture -H 'content-type: application/json' \
//!      -d '{"gesture":"shake"}'
//! ```

use clap::Parser;
use led_sketch::render::{SketchCommand, SketchStatus, sketch_loop};
use led_sketch::server::{self, AppState};
use led_sketch::{Color, PanelConfig, SketchConfig, setup_signal_handler};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// LED Sketch HTTP server
#[derive(Parser)]
#[command(name = "led-sketch")]
#[command(about = "Etch-a-sketch on a 5x5 LED grid, driven over HTTP")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Number of rows on the LED panel
    #[arg(long, default_value = "64")]
    rows: u32,

    /// Number of columns on the LED panel
    #[arg(long, default_value = "64")]
    cols: u32,

    /// Milliseconds between cursor blinks
    #[arg(long, default_value = "150")]
    blink_ms: u64,

    /// Brightness of lit cells (0-100)
    #[arg(long, default_value = "75", value_parser = clap::value_parser!(u8).range(0..=100))]
    brightness: u8,

    /// Colour of lit cells as r,g,b
    #[arg(long, default_value = "255,255,255")]
    color: Color,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let panel = PanelConfig::new(args.rows, args.cols);
    let config = SketchConfig {
        blink_interval: Duration::from_millis(args.blink_ms.max(1)),
    };
    let color = args.color.apply_brightness(args.brightness);

    tracing::info!("LED Sketch v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Panel: {}x{} ({}px cells)",
        panel.cols,
        panel.rows,
        panel.cell_size()
    );
    tracing::info!("Blink interval: {}ms", config.blink_interval.as_millis());

    if panel.cell_size() == 0 {
        return Err(format!("panel {}x{} is too small for a 5x5 grid", panel.cols, panel.rows).into());
    }

    let running = setup_signal_handler()?;

    // Create the channel for sending commands to the sketch thread.
    let (tx, rx) = mpsc::channel();

    // Shared status: sketch thread writes, HTTP handlers read.
    let status = Arc::new(Mutex::new(SketchStatus::new()));

    let sketch_status = status.clone();
    let sketch_running = running.clone();
    let sketch_handle = std::thread::spawn(move || {
        #[cfg(feature = "hardware")]
        let open = move || led_sketch::display::MatrixDisplay::new(panel, color);
        #[cfg(not(feature = "hardware"))]
        let open = move || -> Result<_, Box<dyn std::error::Error>> {
            tracing::info!("Built without 'hardware': using an in-memory display (lit colour {color:?})");
            Ok(led_sketch::MemoryDisplay::new())
        };
        sketch_loop(rx, sketch_status, config, sketch_running, open);
    });

    let app_state = AppState {
        command_tx: tx.clone(),
        status,
    };

    let app = server::create_router(app_state);
    let addr = format!("0.0.0.0:{}", args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);
    tracing::info!("Try: curl http://localhost:{}/api/v1/status", args.port);

    // Stop serving once Ctrl+C has cleared the running flag.
    let shutdown = async move {
        while led_sketch::is_running(&running) {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tracing::info!("Shutting down.");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // The sketch thread may already be gone; a failed send is fine.
    let _ = tx.send(SketchCommand::Stop);
    if sketch_handle.join().is_err() {
        tracing::error!("Sketch thread panicked");
    }

    Ok(())
}
