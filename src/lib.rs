//! Etch-a-sketch for a 5×5 LED grid.
//!
//! Tilt to move a blinking cursor, press A to toggle the LED under it,
//! A+B to save the picture and B to bring it back.
//!
//! This module holds the pieces shared by the library and the binary:
//! - Panel configuration (how the 5×5 grid maps onto an RGB panel)
//! - Sketch timing configuration
//! - The LED colour type
//! - Matrix initialization with our hardware defaults
//! - Signal handling for clean shutdown
//!
//! The sketch itself lives in [`sketch`]; [`render`] runs it on its own
//! thread and [`server`] feeds it events over HTTP.

pub mod display;
pub mod picture;
pub mod render;
pub mod server;
pub mod sketch;

pub use display::{Display, MemoryDisplay};
pub use picture::{Cell, GRID_SIZE, Picture};
pub use sketch::{Button, Event, Gesture, Sketch};

#[cfg(feature = "hardware")]
use rpi_led_matrix::{LedMatrix, LedMatrixOptions, LedRuntimeOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// ── Panel configuration ────────────────────────────────────────────

/// Dimensions of the RGB panel the grid is drawn on.
///
/// Each sketch cell becomes a square block of pixels; the 5×5 block grid is
/// centred on the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub rows: u32,
    pub cols: u32,
}

impl PanelConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Side length of one cell's pixel block.
    pub fn cell_size(&self) -> u32 {
        self.rows.min(self.cols) / GRID_SIZE as u32
    }

    /// Top-left pixel of the block for `cell`, as (x, y).
    pub fn cell_origin(&self, cell: Cell) -> (u32, u32) {
        let size = self.cell_size();
        let grid = size * GRID_SIZE as u32;
        let left = (self.cols - grid) / 2;
        let top = (self.rows - grid) / 2;
        (left + cell.x() as u32 * size, top + cell.y() as u32 * size)
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self { rows: 64, cols: 64 }
    }
}

// ── Sketch configuration ───────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SketchConfig {
    /// Time between blink ticks.
    pub blink_interval: Duration,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            blink_interval: Duration::from_millis(150),
        }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// Colour of a lit cell, decoupled from the hardware crate.
///
/// At the hardware boundary we convert via `Into<LedColor>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Apply brightness scaling (0-100) to this color.
    pub fn apply_brightness(self, brightness: u8) -> Self {
        if brightness >= 100 {
            return self;
        }
        Self {
            r: ((self.r as u16 * brightness as u16) / 100) as u8,
            g: ((self.g as u16 * brightness as u16) / 100) as u8,
            b: ((self.b as u16 * brightness as u16) / 100) as u8,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(255, 255, 255)
    }
}

/// Parse `"r,g,b"`, e.g. `"255,128,0"`. Lets clap take `--color 255,128,0`.
impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(format!("expected r,g,b but got {s:?}"));
        };
        let channel = |v: &str| {
            v.parse::<u8>()
                .map_err(|e| format!("bad colour channel {v:?}: {e}"))
        };
        Ok(Self::new(channel(*r)?, channel(*g)?, channel(*b)?))
    }
}

/// Convert our Color to the hardware crate's LedColor at the boundary.
#[cfg(feature = "hardware")]
impl From<Color> for rpi_led_matrix::LedColor {
    fn from(c: Color) -> Self {
        rpi_led_matrix::LedColor {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

// ── Matrix initialization ──────────────────────────────────────────

/// Create a matrix configured for our hardware:
/// Pi Zero 2 W + Adafruit Bonnet + configurable panel size.
#[cfg(feature = "hardware")]
pub fn create_matrix(panel: PanelConfig) -> Result<LedMatrix, Box<dyn std::error::Error>> {
    let mut options = LedMatrixOptions::new();
    options.set_rows(panel.rows);
    options.set_cols(panel.cols);
    options.set_hardware_mapping("adafruit-hat");

    // Only on/off blocks are drawn, so a shallow colour depth is plenty and
    // keeps the refresh rate high.
    options.set_pwm_bits(4)?;
    options.set_pwm_lsb_nanoseconds(130);

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(2); // Pi Zero 2 W requires slowdown=2

    let matrix = LedMatrix::new(Some(options), Some(rt_options))?;

    Ok(matrix)
}

/// Set up a Ctrl+C handler that sets `running` to false.
///
/// # Rust concept: Arc and AtomicBool
/// The flag is shared between the sketch thread and the signal handler.
/// `AtomicBool` is a thread-safe boolean, no mutex needed for a single bool.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the sketch thread should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
