use crate::camera::{Camera, Point};
use crate::consts::DRAG_THRESHOLD_PX;
use crate::doc::{
    ChartDoc, ChartSnapshot, Connection, ConnectionId, DecorativeLine, LineId, LinePatch, Person, PersonId, Sector,
    SectorId, matches_sector,
};
use crate::hit::{self, Hit, LineEnd, Rect};
use crate::input::{Button, InputState, Key, Modifiers, Tool, UiState, WheelDelta};
use crate::render::{self, Scene};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
///
/// Local state has already been updated when an action is returned; the host
/// forwards the persistence-relevant ones to the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A card moved during a drag. Emitted on every pointer move.
    PersonMoved { id: PersonId, x: f64, y: f64 },
    /// Double click on empty canvas: open the create dialog at this world point.
    CreatePersonRequested { x: f64, y: f64 },
    /// Double click on a card: open its edit dialog.
    EditPersonRequested { id: PersonId },
    /// A card was deleted locally, along with its connections.
    PersonDeleted { id: PersonId },
    /// The user connected two cards and the edge rules allow it.
    ConnectionRequested { from: PersonId, to: PersonId },
    /// A decorative line was drawn.
    LineRequested { start: Point, end: Point },
    /// A decorative line was moved or reshaped.
    LineMoved { id: LineId, patch: LinePatch },
    LineDeleted { id: LineId },
    SelectionChanged,
    SetCursor(&'static str),
    RenderNeeded,
}

/// Core engine state. Holds no browser handles, so it runs anywhere.
pub struct EngineCore {
    pub doc: ChartDoc,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    /// Canvas element top-left in client coordinates.
    pub origin: Point,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            doc: ChartDoc::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            origin: Point::new(0.0, 0.0),
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Hydrate the document from a server snapshot. Drops stale selection.
    pub fn load_snapshot(&mut self, snapshot: ChartSnapshot) {
        self.doc.load_snapshot(snapshot);
        self.prune_selection();
        self.input = InputState::Idle;
    }

    /// Apply a created or updated card from the server.
    pub fn apply_person(&mut self, person: Person) {
        self.doc.insert_person(person);
    }

    pub fn apply_person_removed(&mut self, id: &PersonId) {
        self.doc.remove_person(id);
        self.ui.selection.remove(id);
    }

    /// Apply a created connection from the server. Returns false if it was refused.
    pub fn apply_connection(&mut self, conn: Connection) -> bool {
        self.doc.add_connection(conn).is_ok()
    }

    pub fn apply_connection_removed(&mut self, id: &ConnectionId) {
        self.doc.remove_connection(id);
    }

    pub fn apply_sector(&mut self, sector: Sector) {
        self.doc.insert_sector(sector);
    }

    pub fn apply_sector_removed(&mut self, id: &SectorId) {
        self.doc.remove_sector(id);
        if self.ui.sector_filter == Some(*id) {
            self.ui.sector_filter = None;
        }
    }

    pub fn apply_line(&mut self, line: DecorativeLine) {
        self.doc.insert_line(line);
    }

    pub fn apply_line_removed(&mut self, id: &LineId) {
        self.doc.remove_line(id);
        if self.ui.selected_line == Some(*id) {
            self.ui.selected_line = None;
        }
    }

    // --- View ---

    pub fn set_tool(&mut self, tool: Tool) {
        self.ui.tool = tool;
        self.input = InputState::Idle;
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.ui.collapsed = collapsed;
    }

    /// Show only one sector (or all with `None`). Hidden cards leave the selection.
    pub fn set_sector_filter(&mut self, filter: Option<SectorId>) {
        self.ui.sector_filter = filter;
        self.prune_selection();
    }

    /// Update the canvas element's client-space origin and CSS size.
    pub fn set_viewport(&mut self, origin: Point, width: f64, height: f64) {
        self.origin = origin;
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    /// Convert a client (page) point to world coordinates.
    #[must_use]
    pub fn client_to_world(&self, client: Point) -> Point {
        self.camera.client_to_world(client, self.origin)
    }

    fn client_to_screen(&self, client: Point) -> Point {
        Point::new(client.x - self.origin.x, client.y - self.origin.y)
    }

    fn prune_selection(&mut self) {
        let doc = &self.doc;
        let filter = self.ui.sector_filter;
        self.ui
            .selection
            .retain(|id| doc.person(id).is_some_and(|p| matches_sector(p, filter)));
        if self.ui.selected_line.is_some_and(|id| doc.line(&id).is_none()) {
            self.ui.selected_line = None;
        }
    }

    // --- Input events ---

    /// Pointer pressed at a client point.
    pub fn on_pointer_down(&mut self, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let screen = self.client_to_screen(client);
        let world = self.camera.screen_to_world(screen);

        match button {
            Button::Middle => {
                self.input = InputState::Panning {
                    start_screen: screen,
                    start_pan: Point::new(self.camera.pan_x, self.camera.pan_y),
                };
                return vec![Action::SetCursor("grabbing")];
            }
            Button::Secondary => return Vec::new(),
            Button::Primary => {}
        }

        // Click-click connecting: the previous release armed a connection.
        if let InputState::Connecting { from, armed: true, .. } = self.input {
            self.input = InputState::Idle;
            return match self.person_at(world) {
                Some(to) if to != from => self.finish_connection(from, to),
                _ => vec![Action::SetCursor("default"), Action::RenderNeeded],
            };
        }

        let hit = hit::hit_test(world, &self.doc, &self.camera, self.ui.hit_options());
        match (self.ui.tool, hit) {
            (_, Some(Hit::LineEndpoint { line, end })) => {
                self.input = InputState::DraggingLineEndpoint { id: line, end };
                vec![Action::SetCursor("move")]
            }
            (_, Some(Hit::Port { person, .. })) | (Tool::Connect, Some(Hit::Card(person))) => {
                self.input = InputState::Connecting { from: person, cursor_world: world, armed: false };
                vec![Action::SetCursor("crosshair"), Action::RenderNeeded]
            }
            (_, Some(Hit::Card(id))) => self.press_card(id, screen, world, modifiers),
            (_, Some(Hit::Line(id))) => {
                let Some(line) = self.doc.line(&id) else {
                    return Vec::new();
                };
                self.input = InputState::DraggingLine {
                    id,
                    start_world: world,
                    orig_start: Point::new(line.start_x, line.start_y),
                    orig_end: Point::new(line.end_x, line.end_y),
                };
                self.ui.selection.clear();
                self.ui.selected_line = Some(id);
                vec![Action::SelectionChanged, Action::SetCursor("move"), Action::RenderNeeded]
            }
            (Tool::Line, None) => {
                self.input = InputState::DrawingLine { start_world: world, current_world: world };
                vec![Action::SetCursor("crosshair")]
            }
            (_, None) if modifiers.shift => {
                self.input = InputState::BoxSelecting {
                    start_world: world,
                    current_world: world,
                    additive: modifiers.command(),
                };
                vec![Action::SetCursor("crosshair")]
            }
            (_, None) => {
                self.input = InputState::Panning {
                    start_screen: screen,
                    start_pan: Point::new(self.camera.pan_x, self.camera.pan_y),
                };
                vec![Action::SetCursor("grabbing")]
            }
        }
    }

    fn press_card(&mut self, id: PersonId, screen: Point, world: Point, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = vec![Action::SelectionChanged, Action::RenderNeeded];
        if modifiers.shift {
            self.ui.selected_line = None;
            if !self.ui.selection.insert(id) {
                // Shift-click on a selected card deselects it without dragging.
                self.ui.selection.remove(&id);
                return actions;
            }
        } else if !self.ui.selection.contains(&id) {
            self.ui.select_only(id);
        }

        let mut origins: Vec<(PersonId, Point)> = self
            .ui
            .selection
            .iter()
            .filter_map(|sid| self.doc.person(sid))
            .filter(|p| !p.locked)
            .map(|p| (p.id, Point::new(p.position_x, p.position_y)))
            .collect();
        origins.sort_by_key(|(pid, _)| *pid);

        self.input = InputState::DraggingCards { pressed: id, start_screen: screen, start_world: world, origins, moved: false };
        actions.push(Action::SetCursor("grabbing"));
        actions
    }

    /// Pointer moved to a client point.
    pub fn on_pointer_move(&mut self, client: Point, _modifiers: Modifiers) -> Vec<Action> {
        let screen = self.client_to_screen(client);
        let world = self.camera.screen_to_world(screen);

        match std::mem::take(&mut self.input) {
            InputState::Idle => vec![Action::SetCursor(self.hover_cursor(world))],
            InputState::Panning { start_screen, start_pan } => {
                self.camera.pan_x = start_pan.x + (screen.x - start_screen.x);
                self.camera.pan_y = start_pan.y + (screen.y - start_screen.y);
                self.input = InputState::Panning { start_screen, start_pan };
                vec![Action::RenderNeeded]
            }
            InputState::DraggingCards { pressed, start_screen, start_world, origins, moved } => {
                let moved = moved || screen.distance(start_screen) >= DRAG_THRESHOLD_PX;
                let mut actions = Vec::new();
                if moved {
                    let (dx, dy) = (world.x - start_world.x, world.y - start_world.y);
                    for (id, orig) in &origins {
                        if let Ok(p) = self.doc.move_person(id, orig.x + dx, orig.y + dy) {
                            actions.push(Action::PersonMoved { id: *id, x: p.position_x, y: p.position_y });
                        }
                    }
                    actions.push(Action::RenderNeeded);
                }
                self.input = InputState::DraggingCards { pressed, start_screen, start_world, origins, moved };
                actions
            }
            InputState::BoxSelecting { start_world, additive, .. } => {
                self.input = InputState::BoxSelecting { start_world, current_world: world, additive };
                vec![Action::RenderNeeded]
            }
            InputState::Connecting { from, armed, .. } => {
                self.input = InputState::Connecting { from, cursor_world: world, armed };
                vec![Action::RenderNeeded]
            }
            InputState::DrawingLine { start_world, .. } => {
                self.input = InputState::DrawingLine { start_world, current_world: world };
                vec![Action::RenderNeeded]
            }
            InputState::DraggingLineEndpoint { id, end } => {
                let patch = match end {
                    LineEnd::Start => LinePatch { start_x: Some(world.x), start_y: Some(world.y), ..Default::default() },
                    LineEnd::End => LinePatch { end_x: Some(world.x), end_y: Some(world.y), ..Default::default() },
                };
                self.input = InputState::DraggingLineEndpoint { id, end };
                self.move_line(id, patch)
            }
            InputState::DraggingLine { id, start_world, orig_start, orig_end } => {
                let (dx, dy) = (world.x - start_world.x, world.y - start_world.y);
                let patch = LinePatch::endpoints(orig_start.x + dx, orig_start.y + dy, orig_end.x + dx, orig_end.y + dy);
                self.input = InputState::DraggingLine { id, start_world, orig_start, orig_end };
                self.move_line(id, patch)
            }
        }
    }

    fn move_line(&mut self, id: LineId, patch: LinePatch) -> Vec<Action> {
        if self.doc.apply_line_patch(&id, &patch) {
            vec![Action::LineMoved { id, patch }, Action::RenderNeeded]
        } else {
            self.input = InputState::Idle;
            Vec::new()
        }
    }

    /// Pointer released at a client point.
    pub fn on_pointer_up(&mut self, client: Point, _button: Button, modifiers: Modifiers) -> Vec<Action> {
        let screen = self.client_to_screen(client);
        let world = self.camera.screen_to_world(screen);

        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Panning { start_screen, .. } => {
                let mut actions = vec![Action::SetCursor("default")];
                // A click on empty canvas clears the selection.
                if screen.distance(start_screen) < DRAG_THRESHOLD_PX && self.ui.has_selection() {
                    self.ui.clear_selection();
                    actions.extend([Action::SelectionChanged, Action::RenderNeeded]);
                }
                actions
            }
            InputState::DraggingCards { pressed, moved, .. } => {
                let mut actions = vec![Action::SetCursor("grab")];
                // A plain click inside a multi-selection narrows it to the pressed card.
                if !moved && !modifiers.shift && self.ui.selection.len() > 1 {
                    self.ui.select_only(pressed);
                    actions.extend([Action::SelectionChanged, Action::RenderNeeded]);
                }
                actions
            }
            InputState::BoxSelecting { start_world, current_world, additive } => {
                let rect = Rect::from_corners(start_world, current_world);
                let ids = hit::box_select(&self.doc, &rect, self.ui.hit_options());
                if !additive {
                    self.ui.selection.clear();
                }
                self.ui.selection.extend(ids);
                self.ui.selected_line = None;
                vec![Action::SelectionChanged, Action::SetCursor("default"), Action::RenderNeeded]
            }
            InputState::Connecting { from, armed, .. } => match self.person_at(world) {
                Some(to) if to != from => self.finish_connection(from, to),
                Some(_) if !armed => {
                    // Released on the source card: wait for a click on the target.
                    self.input = InputState::Connecting { from, cursor_world: world, armed: true };
                    vec![Action::RenderNeeded]
                }
                _ => vec![Action::SetCursor("default"), Action::RenderNeeded],
            },
            InputState::DrawingLine { start_world, .. } => {
                let mut actions = vec![Action::SetCursor("default"), Action::RenderNeeded];
                let length_px = start_world.distance(world) * self.camera.zoom;
                if length_px >= DRAG_THRESHOLD_PX {
                    actions.insert(0, Action::LineRequested { start: start_world, end: world });
                }
                actions
            }
            InputState::DraggingLineEndpoint { .. } | InputState::DraggingLine { .. } => {
                vec![Action::SetCursor("default")]
            }
        }
    }

    /// Double click: edit the card under the pointer, or create one on empty canvas.
    pub fn on_double_click(&mut self, client: Point) -> Vec<Action> {
        let world = self.client_to_world(client);
        self.input = InputState::Idle;
        match hit::hit_card(&self.doc, world, self.ui.hit_options()) {
            Some(id) => vec![Action::EditPersonRequested { id }],
            None => vec![Action::CreatePersonRequested { x: world.x, y: world.y }],
        }
    }

    /// Ctrl/Cmd + wheel zooms one step; a plain wheel pans.
    pub fn on_wheel(&mut self, _client: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            self.camera.zoom_by_wheel(delta.dy);
        } else {
            self.camera.pan_by(-delta.dx, -delta.dy);
        }
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "Escape" => {
                self.input = InputState::Idle;
                self.ui.clear_selection();
                vec![Action::SelectionChanged, Action::SetCursor("default"), Action::RenderNeeded]
            }
            "Delete" | "Backspace" if self.input.is_idle() => self.delete_selection(),
            "a" | "A" if modifiers.command() => {
                let ids: Vec<PersonId> = self.doc.people_in_sector(self.ui.sector_filter).iter().map(|p| p.id).collect();
                self.ui.selected_line = None;
                self.ui.selection = ids.into_iter().collect();
                vec![Action::SelectionChanged, Action::RenderNeeded]
            }
            "+" | "=" if modifiers.command() => {
                self.camera.zoom_in();
                vec![Action::RenderNeeded]
            }
            "-" if modifiers.command() => {
                self.camera.zoom_out();
                vec![Action::RenderNeeded]
            }
            "0" if modifiers.command() => {
                self.camera.reset();
                vec![Action::RenderNeeded]
            }
            _ => Vec::new(),
        }
    }

    fn delete_selection(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(line) = self.ui.selected_line.take() {
            if self.doc.remove_line(&line).is_some() {
                actions.push(Action::LineDeleted { id: line });
            }
        }

        let mut targets: Vec<PersonId> = self
            .ui
            .selection
            .iter()
            .copied()
            .filter(|id| self.doc.person(id).is_some_and(|p| !p.locked))
            .collect();
        targets.sort();
        for id in targets {
            if self.doc.remove_person(&id).is_some() {
                self.ui.selection.remove(&id);
                actions.push(Action::PersonDeleted { id });
            }
        }

        if !actions.is_empty() {
            actions.extend([Action::SelectionChanged, Action::RenderNeeded]);
        }
        actions
    }

    fn person_at(&self, world: Point) -> Option<PersonId> {
        let opts = self.ui.hit_options();
        hit::hit_port(&self.doc, world, &self.camera, opts)
            .map(|(id, _)| id)
            .or_else(|| hit::hit_card(&self.doc, world, opts))
    }

    fn finish_connection(&mut self, from: PersonId, to: PersonId) -> Vec<Action> {
        let mut actions = vec![Action::SetCursor("default"), Action::RenderNeeded];
        if self.doc.can_connect(from, to).is_ok() {
            actions.insert(0, Action::ConnectionRequested { from, to });
        }
        actions
    }

    fn hover_cursor(&self, world: Point) -> &'static str {
        match hit::hit_test(world, &self.doc, &self.camera, self.ui.hit_options()) {
            Some(Hit::Port { .. }) => "crosshair",
            Some(Hit::Card(_)) if self.ui.tool == Tool::Connect => "crosshair",
            Some(Hit::Card(_)) => "grab",
            Some(Hit::Line(_) | Hit::LineEndpoint { .. }) => "move",
            None if self.ui.tool == Tool::Line => "crosshair",
            None => "default",
        }
    }

    // --- Queries ---

    /// Selected cards in id order.
    #[must_use]
    pub fn selection(&self) -> Vec<PersonId> {
        let mut ids: Vec<PersonId> = self.ui.selection.iter().copied().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.doc.person(id)
    }

    /// Display list for the current frame.
    #[must_use]
    pub fn scene(&self) -> Scene {
        render::build_scene(&self.doc, &self.camera, &self.ui, &self.input)
    }
}
