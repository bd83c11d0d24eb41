//! Manual face selection as an explicit state machine.
//!
//! A windowing front-end owns the event loop and forwards mouse and key
//! events to a [`SelectionSession`]; the session holds everything the loop
//! needs (current drag, accumulated regions, the buffer to display).

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as DrawRect;
use tracing::info;

use crate::face_detector::Region;

const OUTLINE: Rgba<u8> = Rgba([0, 255, 0, 255]);
const OUTLINE_WIDTH: i32 = 2;

/// Input forwarded from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Mouse button pressed at a pixel.
    Press(i32, i32),
    /// Mouse button released at a pixel.
    Release(i32, i32),
    /// Discard every box drawn so far.
    Reset,
    /// Finish selection.
    Confirm,
}

impl SelectionEvent {
    /// Key bindings: `r` resets, `q` confirms.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'r' => Some(SelectionEvent::Reset),
            'q' => Some(SelectionEvent::Confirm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Dragging { start: (i32, i32) },
}

/// Whether the event loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Continue,
    Finished,
}

pub struct SelectionSession {
    base: RgbaImage,
    display: RgbaImage,
    state: SelectionState,
    regions: Vec<Region>,
}

impl SelectionSession {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            display: image.clone(),
            base: image,
            state: SelectionState::Idle,
            regions: Vec::new(),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Regions drawn so far, in draw order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Source image with every drawn box outlined.
    pub fn display(&self) -> &RgbaImage {
        &self.display
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    pub fn handle(&mut self, event: SelectionEvent) -> SessionStatus {
        match (self.state, event) {
            (_, SelectionEvent::Press(x, y)) => {
                self.state = SelectionState::Dragging { start: (x, y) };
            }
            (SelectionState::Dragging { start }, SelectionEvent::Release(x, y)) => {
                self.state = SelectionState::Idle;
                let region = Region::from_corners(start, (x, y));
                self.outline(&region);
                info!(index = self.regions.len(), ?region, "manual box added");
                self.regions.push(region);
            }
            (SelectionState::Idle, SelectionEvent::Release(..)) => {}
            (_, SelectionEvent::Reset) => {
                self.state = SelectionState::Idle;
                self.regions.clear();
                self.display = self.base.clone();
                info!("boxes have been reset");
            }
            (_, SelectionEvent::Confirm) => {
                self.state = SelectionState::Idle;
                info!(selected = self.regions.len(), "manual selection finished");
                return SessionStatus::Finished;
            }
        }
        SessionStatus::Continue
    }

    fn outline(&mut self, region: &Region) {
        let Some(square) = region.square_box(0.0) else {
            return;
        };
        let side = square.side() as i32;
        for inset in 0..OUTLINE_WIDTH {
            let size = side - 2 * inset;
            if size <= 0 {
                break;
            }
            let rect = DrawRect::at(square.x1 + inset, square.y1 + inset)
                .of_size(size as u32, size as u32);
            draw_hollow_rect_mut(&mut self.display, rect, OUTLINE);
        }
    }
}
