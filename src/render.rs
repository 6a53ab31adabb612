//! Sketch thread: owns the sketch and the display, handles events, blinks.
//!
//! Everything that touches the sketch runs here, one thing at a time, so an
//! event handler never runs in the middle of a blink tick. The HTTP server
//! talks to this thread by sending `SketchCommand` values through an `mpsc`
//! channel and reads back a `SketchStatus` snapshot.
//!
//! ## Rust concepts
//! - `std::sync::mpsc` channels for thread communication
//! - `recv_timeout()` to wait for input and a deadline at the same time
//! - `Arc<Mutex<T>>` for shared mutable state
//! - `FnOnce` factories so a non-`Send` display is created on this thread

use crate::display::Display;
use crate::picture::Cell;
use crate::sketch::{Event, Sketch};
use crate::{SketchConfig, is_running};
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Instant;

// ── Commands ─────────────────────────────────────────────────────────

/// Commands sent to the sketch thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SketchCommand {
    /// A gesture or button press to apply
    Input(Event),
    /// Clear the display and end the thread
    Stop,
}

// ── Status ───────────────────────────────────────────────────────────

/// Snapshot of the sketch, published after every event and tick.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct SketchStatus {
    /// Cursor position, or null while the cursor is hidden
    pub cursor: Option<Cell>,
    /// Live picture, top row first, 1 = on
    pub picture: Vec<Vec<u8>>,
    /// Saved picture, same layout as `picture`
    pub saved_picture: Vec<Vec<u8>>,
    /// Blink ticks since start
    pub ticks: u64,
    /// Events handled since start
    pub events: u64,
    /// Server version
    pub version: String,
}

impl SketchStatus {
    pub fn new() -> Self {
        Self::capture(&Sketch::new(), 0, 0)
    }

    fn capture(sketch: &Sketch, ticks: u64, events: u64) -> Self {
        Self {
            cursor: sketch.cursor(),
            picture: sketch.picture().to_rows(),
            saved_picture: sketch.saved_picture().to_rows(),
            ticks,
            events,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for SketchStatus {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sketch loop ──────────────────────────────────────────────────────

/// Main sketch loop. Runs on a dedicated thread and owns the display.
///
/// Returns when a `Stop` command arrives, every sender is dropped, or
/// `running` goes false (checked at least once per blink interval). The
/// display is cleared on the way out.
pub fn sketch_loop<D, F>(
    rx: Receiver<SketchCommand>,
    status: Arc<Mutex<SketchStatus>>,
    config: SketchConfig,
    running: Arc<AtomicBool>,
    open_display: F,
) where
    D: Display,
    F: FnOnce() -> Result<D, Box<dyn std::error::Error>>,
{
    let mut display = match open_display() {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("Failed to initialize LED display: {}", e);
            return;
        }
    };

    let mut sketch = Sketch::new();
    let mut ticks: u64 = 0;
    let mut events: u64 = 0;
    let mut next_tick = Instant::now() + config.blink_interval;

    tracing::info!(
        "Sketch thread started (blink every {}ms). Shake or press B to begin.",
        config.blink_interval.as_millis()
    );

    while is_running(&running) {
        let wait = next_tick.saturating_duration_since(Instant::now());

        match rx.recv_timeout(wait) {
            Ok(SketchCommand::Input(event)) => {
                sketch.handle(event, &mut display);
                events += 1;
            }
            Ok(SketchCommand::Stop) => {
                tracing::info!("Sketch thread: stop requested.");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                sketch.tick(&mut display);
                ticks += 1;
                next_tick = Instant::now() + config.blink_interval;
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Sketch thread: channel closed, shutting down.");
                break;
            }
        }

        match status.lock() {
            Ok(mut s) => *s = SketchStatus::capture(&sketch, ticks, events),
            Err(_) => {
                tracing::error!("Status lock poisoned, shutting down.");
                break;
            }
        }
    }

    display.clear_all();
    tracing::info!("Sketch thread finished after {} ticks, {} events.", ticks, events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemoryDisplay;
    use crate::sketch::{Button, Gesture};
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Spawn a sketch thread on a `MemoryDisplay`.
    fn spawn(
        interval: Duration,
        running: Arc<AtomicBool>,
    ) -> (
        mpsc::Sender<SketchCommand>,
        Arc<Mutex<SketchStatus>>,
        thread::JoinHandle<()>,
    ) {
        let (tx, rx) = mpsc::channel();
        let status = Arc::new(Mutex::new(SketchStatus::new()));
        let config = SketchConfig {
            blink_interval: interval,
        };
        let thread_status = status.clone();
        let handle = thread::spawn(move || {
            sketch_loop(rx, thread_status, config, running, || {
                Ok(MemoryDisplay::new())
            });
        });
        (tx, status, handle)
    }

    fn running() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[test]
    fn new_status_is_blank_and_hidden() {
        let status = SketchStatus::new();
        assert_eq!(status.cursor, None);
        assert_eq!(status.picture, vec![vec![0u8; 5]; 5]);
        assert_eq!(status.saved_picture, vec![vec![0u8; 5]; 5]);
        assert_eq!(status.ticks, 0);
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn events_are_applied_in_order() {
        // Long interval: no tick can fire during the test, so the second
        // tilt is refused while the first is still unrendered.
        let (tx, status, handle) = spawn(Duration::from_secs(3600), running());
        for event in [
            Event::from(Gesture::Shake),
            Gesture::TiltRight.into(),
            Gesture::TiltRight.into(),
            Button::A.into(),
        ] {
            tx.send(SketchCommand::Input(event)).unwrap();
        }
        tx.send(SketchCommand::Stop).unwrap();
        handle.join().unwrap();

        let s = status.lock().unwrap();
        assert_eq!(s.cursor, Cell::new(3, 2));
        assert_eq!(s.picture[2], vec![0, 0, 0, 1, 0]);
        assert_eq!(s.events, 4);
        assert_eq!(s.ticks, 0);
    }

    #[test]
    fn save_shows_up_in_status() {
        let (tx, status, handle) = spawn(Duration::from_secs(3600), running());
        for event in [Event::from(Gesture::Shake), Button::A.into(), Button::AB.into()] {
            tx.send(SketchCommand::Input(event)).unwrap();
        }
        tx.send(SketchCommand::Stop).unwrap();
        handle.join().unwrap();

        let s = status.lock().unwrap();
        assert_eq!(s.cursor, None);
        assert_eq!(s.saved_picture[2], vec![0, 0, 1, 0, 0]);
    }

    #[test]
    fn ticks_run_on_the_blink_interval() {
        let (tx, status, handle) = spawn(Duration::from_millis(5), running());
        tx.send(SketchCommand::Input(Gesture::Shake.into())).unwrap();
        thread::sleep(Duration::from_millis(100));
        tx.send(SketchCommand::Stop).unwrap();
        handle.join().unwrap();

        assert!(status.lock().unwrap().ticks > 0);
    }

    #[test]
    fn dropping_sender_ends_thread() {
        let (tx, _status, handle) = spawn(Duration::from_secs(3600), running());
        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn cleared_running_flag_ends_thread() {
        let flag = running();
        let (_tx, _status, handle) = spawn(Duration::from_millis(5), flag.clone());
        flag.store(false, std::sync::atomic::Ordering::SeqCst);
        handle.join().unwrap();
    }

    #[test]
    fn display_failure_ends_thread() {
        let (_tx, rx) = mpsc::channel();
        let status = Arc::new(Mutex::new(SketchStatus::new()));
        sketch_loop::<MemoryDisplay, _>(rx, status, SketchConfig::default(), running(), || {
            Err("no panel".into())
        });
    }
}
