use uuid::Uuid;

use super::*;

// =============================================================
// Tool
// =============================================================

#[test]
fn tool_default_is_select() {
    assert_eq!(Tool::default(), Tool::Select);
}

#[test]
fn tool_debug_format() {
    assert_eq!(format!("{:?}", Tool::Connect), "Connect");
}

// =============================================================
// Modifiers
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift && !m.ctrl && !m.alt && !m.meta);
    assert!(!m.command());
}

#[test]
fn command_is_ctrl_or_meta() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.command());
    assert!(Modifiers { meta: true, ..Default::default() }.command());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.command());
}

// =============================================================
// UiState
// =============================================================

#[test]
fn select_only_replaces_selection_and_clears_line() {
    let mut ui = UiState { selected_line: Some(Uuid::new_v4()), ..Default::default() };
    ui.selection.insert(Uuid::new_v4());
    let id = Uuid::new_v4();
    ui.select_only(id);
    assert_eq!(ui.selection.len(), 1);
    assert!(ui.selection.contains(&id));
    assert!(ui.selected_line.is_none());
}

#[test]
fn hit_options_mirror_view_state() {
    let sector = Uuid::new_v4();
    let line = Uuid::new_v4();
    let ui = UiState { collapsed: true, sector_filter: Some(sector), selected_line: Some(line), ..Default::default() };
    let opts = ui.hit_options();
    assert!(opts.collapsed);
    assert_eq!(opts.sector_filter, Some(sector));
    assert_eq!(opts.selected_line, Some(line));
}

#[test]
fn clear_selection_empties_everything() {
    let mut ui = UiState::default();
    ui.select_only(Uuid::new_v4());
    assert!(ui.has_selection());
    ui.clear_selection();
    assert!(!ui.has_selection());
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    assert!(InputState::default().is_idle());
}

#[test]
fn selection_rect_only_while_box_selecting() {
    let state = InputState::BoxSelecting {
        start_world: Point::new(10.0, 10.0),
        current_world: Point::new(0.0, 20.0),
        additive: false,
    };
    let rect = state.selection_rect().unwrap();
    assert!((rect.min_x - 0.0).abs() < f64::EPSILON);
    assert!((rect.max_y - 20.0).abs() < f64::EPSILON);
    assert!(InputState::Idle.selection_rect().is_none());
}

#[test]
fn pending_connection_only_while_connecting() {
    let from = Uuid::new_v4();
    let state = InputState::Connecting { from, cursor_world: Point::new(1.0, 2.0), armed: false };
    assert_eq!(state.pending_connection(), Some((from, Point::new(1.0, 2.0))));
    assert!(InputState::Idle.pending_connection().is_none());
}
