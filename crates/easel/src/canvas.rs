//! The drawing surface seam.
//!
//! Rendering is not the engine's business; it only needs somewhere to
//! mirror stroke and clear effects, both for locally-painted cells and
//! for strokes arriving off the wire. [`PixelGrid`] is the reference
//! implementation — a plain color-index grid a UI can read back, and all
//! the tests need.

/// Cells per side of the shared drawing grid.
pub const GRID_SIDE: u8 = 10;

/// Receives draw effects from the match controller.
pub trait Canvas: Send + 'static {
    /// Paints one cell with a palette color.
    fn paint_cell(&mut self, x: u8, y: u8, color_index: u8);

    /// Wipes the whole surface (turn start, or an explicit clear).
    fn clear_all(&mut self);
}

/// A `GRID_SIDE` × `GRID_SIDE` grid of palette indices, 0 meaning blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    cells: [[u8; GRID_SIDE as usize]; GRID_SIDE as usize],
}

impl PixelGrid {
    pub fn new() -> Self {
        Self {
            cells: [[0; GRID_SIDE as usize]; GRID_SIDE as usize],
        }
    }

    /// The palette index at `(x, y)`, or `None` out of range.
    pub fn cell(&self, x: u8, y: u8) -> Option<u8> {
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas for PixelGrid {
    fn paint_cell(&mut self, x: u8, y: u8, color_index: u8) {
        if x >= GRID_SIDE || y >= GRID_SIDE {
            // A peer on a different build could paint off-grid; the
            // stroke is dropped rather than trusted.
            tracing::warn!(x, y, "off-grid stroke dropped");
            return;
        }
        self.cells[y as usize][x as usize] = color_index;
    }

    fn clear_all(&mut self) {
        self.cells = [[0; GRID_SIDE as usize]; GRID_SIDE as usize];
    }
}
