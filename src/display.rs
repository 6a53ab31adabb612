//! The physical LED grid, as seen by the sketch.
//!
//! The sketch only needs three primitives from the hardware: read an LED,
//! flip an LED, and blank the whole grid. Anything that provides them can
//! host the sketch:
//! - [`MemoryDisplay`] keeps LED state in memory (tests, simulator)
//! - `MatrixDisplay` (feature `hardware`) draws each cell as a block of
//!   pixels on an RGB panel driven by `rpi-led-matrix`
//!
//! ## Rust concepts
//! - Traits as the seam between logic and hardware
//! - `Option::take` to move a value out of a struct field temporarily

use crate::picture::{Cell, Picture};
#[cfg(feature = "hardware")]
use crate::{Color, PanelConfig, create_matrix};
#[cfg(feature = "hardware")]
use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix};

/// Physical LED grid primitives.
pub trait Display {
    /// Whether the LED at `cell` is currently on.
    fn is_lit(&self, cell: Cell) -> bool;

    /// Flip the LED at `cell`.
    fn toggle(&mut self, cell: Cell);

    /// Turn every LED off.
    fn clear_all(&mut self);
}

// ── In-memory display ────────────────────────────────────────────────

/// A display with no hardware behind it: LED state lives in a [`Picture`].
#[derive(Clone, Debug, Default)]
pub struct MemoryDisplay {
    leds: Picture,
    toggles: u64,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what the LEDs show right now.
    pub fn leds(&self) -> Picture {
        self.leds
    }

    /// How many times any LED has been flipped. Handy for checking that an
    /// operation left the hardware alone.
    pub fn toggle_count(&self) -> u64 {
        self.toggles
    }
}

impl Display for MemoryDisplay {
    fn is_lit(&self, cell: Cell) -> bool {
        self.leds.get(cell)
    }

    fn toggle(&mut self, cell: Cell) {
        self.leds.toggle(cell);
        self.toggles += 1;
    }

    fn clear_all(&mut self) {
        self.leds.clear();
    }
}

// ── RGB panel display ────────────────────────────────────────────────

/// Renders the 5×5 grid onto an RGB LED panel.
///
/// The C library behind `rpi-led-matrix` is not thread-safe, so this must be
/// created on the thread that uses it (the sketch thread).
#[cfg(feature = "hardware")]
pub struct MatrixDisplay {
    matrix: LedMatrix,
    canvas: Option<LedCanvas>,
    leds: Picture,
    panel: PanelConfig,
    color: Color,
}

#[cfg(feature = "hardware")]
impl MatrixDisplay {
    pub fn new(panel: PanelConfig, color: Color) -> Result<Self, Box<dyn std::error::Error>> {
        let matrix = create_matrix(panel)?;
        let canvas = Some(matrix.offscreen_canvas());
        let mut display = Self {
            matrix,
            canvas,
            leds: Picture::new(),
            panel,
            color,
        };
        display.redraw();
        Ok(display)
    }

    /// Draw every lit cell as a filled block and swap it onto the panel.
    fn redraw(&mut self) {
        let Some(mut canvas) = self.canvas.take() else {
            return;
        };

        canvas.clear();
        let size = self.panel.cell_size() as i32;
        let on: LedColor = self.color.into();
        for cell in Cell::all().filter(|&c| self.leds.get(c)) {
            let (left, top) = self.panel.cell_origin(cell);
            for dy in 0..size {
                for dx in 0..size {
                    canvas.set(left as i32 + dx, top as i32 + dy, &on);
                }
            }
        }

        self.canvas = Some(self.matrix.swap(canvas));
    }
}

#[cfg(feature = "hardware")]
impl Display for MatrixDisplay {
    fn is_lit(&self, cell: Cell) -> bool {
        self.leds.get(cell)
    }

    fn toggle(&mut self, cell: Cell) {
        self.leds.toggle(cell);
        self.redraw();
    }

    fn clear_all(&mut self) {
        self.leds.clear();
        self.redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn memory_display_starts_dark() {
        let display = MemoryDisplay::new();
        assert!(Cell::all().all(|c| !display.is_lit(c)));
        assert_eq!(display.toggle_count(), 0);
    }

    #[test]
    fn memory_display_toggle_flips_one_led() {
        let mut display = MemoryDisplay::new();
        let cell = Cell::new(1, 3).unwrap();
        display.toggle(cell);
        assert!(display.is_lit(cell));
        assert_eq!(display.leds().lit_count(), 1);
        display.toggle(cell);
        assert!(!display.is_lit(cell));
        assert_eq!(display.toggle_count(), 2);
    }

    #[test]
    fn memory_display_clear_all() {
        let mut display = MemoryDisplay::new();
        for cell in Cell::all() {
            display.toggle(cell);
        }
        assert_eq!(display.leds().lit_count(), 25);
        display.clear_all();
        assert_eq!(display.leds().lit_count(), 0);
    }
}
