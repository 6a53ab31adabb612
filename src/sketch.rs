//! Sketch state and the handlers that drive it.
//!
//! [`Sketch`] owns everything the toy knows: the live picture, the saved
//! picture, where the cursor is and where it was last drawn. Input arrives as
//! [`Event`] values through [`Sketch::handle`]; the blinking cursor and the
//! cleanup of cells the cursor has left happen in [`Sketch::tick`], which the
//! caller runs on a fixed cadence.
//!
//! Handlers never touch the LED under a moving cursor. They leave the old
//! position in `rendered` and the next tick puts that LED back in line with
//! the picture. Until that has happened, tilts are refused, so a fast run of
//! gestures cannot leave a stale LED behind.
//!
//! ## Rust concepts
//! - `Option<Cell>` in place of a "-1 means hidden" sentinel
//! - Generic methods over a trait (`D: Display`) so tests run without hardware
//! - `match` on nested enums for event dispatch

use crate::display::Display;
use crate::picture::{Cell, Picture};
use serde::{Deserialize, Serialize};

// ── Events ───────────────────────────────────────────────────────────

/// Motion gestures reported by the accelerometer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    TiltLeft,
    TiltRight,
    /// Logo end raised: the cursor moves one row down the grid (y + 1).
    TiltUp,
    /// Logo end lowered: the cursor moves one row up the grid (y - 1).
    TiltDown,
    Shake,
}

/// Button presses. `AB` is both buttons pressed together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    A,
    B,
    AB,
}

/// Anything the hardware can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Gesture(Gesture),
    Button(Button),
}

impl From<Gesture> for Event {
    fn from(gesture: Gesture) -> Self {
        Event::Gesture(gesture)
    }
}

impl From<Button> for Event {
    fn from(button: Button) -> Self {
        Event::Button(button)
    }
}

// ── State ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct Sketch {
    picture: Picture,
    saved: Picture,
    /// Where the user is editing, or `None` while the cursor is hidden.
    cursor: Option<Cell>,
    /// Where the cursor was when the blink loop last caught up.
    rendered: Option<Cell>,
}

impl Sketch {
    /// A blank sketch with the cursor hidden. Shake or press B to start.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    pub fn saved_picture(&self) -> &Picture {
        &self.saved
    }

    pub fn cursor(&self) -> Option<Cell> {
        self.cursor
    }

    /// True while a cell the cursor has left still needs its LED fixed.
    pub fn needs_update(&self) -> bool {
        self.rendered != self.cursor
    }

    // ── Picture storage ──────────────────────────────────────────────

    /// Blank the live picture. The LEDs are left as they are.
    pub fn reset_picture(&mut self) {
        self.picture.clear();
    }

    /// Snapshot the live picture.
    pub fn save_picture(&mut self) {
        self.saved = self.picture;
    }

    /// Bring back the snapshot and make every LED match it.
    ///
    /// All 25 cells are treated alike, including the one under the cursor,
    /// so callers hide the cursor first.
    pub fn restore_picture<D: Display>(&mut self, display: &mut D) {
        self.picture = self.saved;
        for cell in Cell::all() {
            reconcile(&self.picture, cell, display);
        }
    }

    // ── Cursor ───────────────────────────────────────────────────────

    /// Put the cursor in the centre, already rendered there.
    pub fn new_cursor(&mut self) {
        self.cursor = Some(Cell::CENTER);
        self.rendered = Some(Cell::CENTER);
    }

    /// Start over: blank picture, dark display, centred cursor. The saved
    /// picture survives.
    pub fn new_game<D: Display>(&mut self, display: &mut D) {
        self.reset_picture();
        display.clear_all();
        self.new_cursor();
        tracing::info!("New game");
    }

    /// Move the cursor without touching the display. The vacated cell is
    /// cleaned up by the next [`tick`](Self::tick).
    pub fn move_cursor(&mut self, cell: Cell) {
        self.rendered = self.cursor;
        self.cursor = Some(cell);
    }

    fn tilt(&mut self, dx: i8, dy: i8) {
        let Some(cursor) = self.cursor else {
            tracing::debug!("Tilt ignored: cursor hidden");
            return;
        };
        if self.needs_update() {
            tracing::debug!("Tilt ignored: previous move not rendered yet");
            return;
        }
        match cursor.offset(dx, dy) {
            Some(target) => self.move_cursor(target),
            None => tracing::debug!("Tilt ignored: {:?} is at the edge", cursor),
        }
    }

    // ── Buttons ──────────────────────────────────────────────────────

    fn toggle_under_cursor(&mut self) {
        if let Some(cursor) = self.cursor {
            let on = self.picture.toggle(cursor);
            tracing::debug!("Cell ({}, {}) set to {}", cursor.x(), cursor.y(), u8::from(on));
        }
    }

    fn save(&mut self) {
        self.cursor = None;
        self.save_picture();
        tracing::info!("Picture saved ({} cells lit)", self.saved.lit_count());
    }

    fn restore_or_resume<D: Display>(&mut self, display: &mut D) {
        match self.cursor.take() {
            Some(cursor) => {
                self.restore_picture(display);
                self.cursor = Some(cursor);
                tracing::info!("Picture restored ({} cells lit)", self.picture.lit_count());
            }
            None => {
                // A save followed quickly by a resume can leave the last
                // cursor cell unreconciled; fix it before forgetting it.
                self.catch_up(display);
                self.new_cursor();
                tracing::info!("Editing resumed");
            }
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Apply one hardware event.
    pub fn handle<D: Display>(&mut self, event: Event, display: &mut D) {
        tracing::debug!("Event: {:?}", event);
        match event {
            Event::Gesture(Gesture::TiltLeft) => self.tilt(-1, 0),
            Event::Gesture(Gesture::TiltRight) => self.tilt(1, 0),
            Event::Gesture(Gesture::TiltUp) => self.tilt(0, 1),
            Event::Gesture(Gesture::TiltDown) => self.tilt(0, -1),
            Event::Gesture(Gesture::Shake) => self.new_game(display),
            Event::Button(Button::A) => self.toggle_under_cursor(),
            Event::Button(Button::AB) => self.save(),
            Event::Button(Button::B) => self.restore_or_resume(display),
        }
    }

    // ── Blink loop ───────────────────────────────────────────────────

    /// One step of the blink loop: fix the LED the cursor just left (if it
    /// moved), then flip the LED under the cursor.
    pub fn tick<D: Display>(&mut self, display: &mut D) {
        self.catch_up(display);
        if let Some(cursor) = self.cursor {
            display.toggle(cursor);
        }
    }

    fn catch_up<D: Display>(&mut self, display: &mut D) {
        if !self.needs_update() {
            return;
        }
        if let Some(stale) = self.rendered {
            reconcile(&self.picture, stale, display);
        }
        self.rendered = self.cursor;
    }
}

/// Flip the LED at `cell` if it disagrees with the picture.
fn reconcile<D: Display>(picture: &Picture, cell: Cell, display: &mut D) {
    if display.is_lit(cell) != picture.get(cell) {
        display.toggle(cell);
    }
}
