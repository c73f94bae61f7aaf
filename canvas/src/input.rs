//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! This module defines the types consumed by the input engine. `Tool` and
//! `Modifiers` capture the user's intent at the time of a pointer event.
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up, carrying all context needed to compute deltas and emit final
//! chart mutations on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::HashSet;

use crate::camera::Point;
use crate::doc::{LineId, PersonId, SectorId};
use crate::hit::{HitOptions, LineEnd, Rect};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Select, drag, and pan (default). Connections start from card ports.
    #[default]
    Select,
    /// Pressing anywhere on a card starts a connection.
    Connect,
    /// Drag on empty canvas to draw a decorative line.
    Line,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta in pixels (positive `dy` = down).
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub tool: Tool,
    /// Selected cards.
    pub selection: HashSet<PersonId>,
    /// Selected decorative line. Cards and a line are never selected together.
    pub selected_line: Option<LineId>,
    /// Show every card collapsed to its title.
    pub collapsed: bool,
    /// Only cards in this sector are shown and interactive.
    pub sector_filter: Option<SectorId>,
}

impl UiState {
    #[must_use]
    pub fn hit_options(&self) -> HitOptions {
        HitOptions {
            collapsed: self.collapsed,
            sector_filter: self.sector_filter,
            selected_line: self.selected_line,
        }
    }

    /// Replace the card selection and drop any line selection.
    pub fn select_only(&mut self, id: PersonId) {
        self.selection.clear();
        self.selection.insert(id);
        self.selected_line = None;
    }

    /// Whether anything at all is selected.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty() || self.selected_line.is_some()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.selected_line = None;
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the canvas. Pan is `start_pan + (screen - start_screen)`.
    Panning { start_screen: Point, start_pan: Point },
    /// Moving one or more cards. Each card lands at `origin + (world - start_world)`.
    DraggingCards {
        /// Card under the pointer at press time. A click without travel
        /// narrows a multi-selection to this card on release.
        pressed: PersonId,
        start_screen: Point,
        start_world: Point,
        /// Unlocked cards being moved and their centers at press time.
        origins: Vec<(PersonId, Point)>,
        /// Set once the pointer travels past the click threshold.
        moved: bool,
    },
    /// Rubber-band selection rectangle.
    BoxSelecting {
        start_world: Point,
        current_world: Point,
        /// Ctrl/Cmd held at press: add to the existing selection.
        additive: bool,
    },
    /// Dragging a new connector from a card.
    Connecting {
        from: PersonId,
        cursor_world: Point,
        /// Released over the source card: the next click on another card completes the edge.
        armed: bool,
    },
    /// Drawing a new decorative line.
    DrawingLine { start_world: Point, current_world: Point },
    /// Moving one endpoint of a decorative line.
    DraggingLineEndpoint { id: LineId, end: LineEnd },
    /// Moving a whole decorative line.
    DraggingLine {
        id: LineId,
        start_world: Point,
        orig_start: Point,
        orig_end: Point,
    },
}

impl InputState {
    /// The rubber-band rectangle while box-selecting.
    #[must_use]
    pub fn selection_rect(&self) -> Option<Rect> {
        match self {
            Self::BoxSelecting { start_world, current_world, .. } => Some(Rect::from_corners(*start_world, *current_world)),
            _ => None,
        }
    }

    /// Source card and cursor while a connector is being dragged.
    #[must_use]
    pub fn pending_connection(&self) -> Option<(PersonId, Point)> {
        match self {
            Self::Connecting { from, cursor_world, .. } => Some((*from, *cursor_world)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
