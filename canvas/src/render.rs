//! Rendering: builds a display list for the host to draw.
//!
//! The host draws cards, connectors, and lines with SVG/DOM, so this module
//! produces plain data (rectangles, SVG path strings, arrowhead triangles)
//! instead of touching a drawing context. It reads document, camera, and UI
//! state and never mutates them.
//!
//! Connectors are cubic Beziers with horizontal tangents. The source end
//! leaves from the right port when the target lies to the right and from the
//! left port otherwise; the target end mirrors it.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use serde::Serialize;

use crate::camera::{Camera, Point};
use crate::doc::{ChartDoc, Connection, ConnectionId, LineId, Person, PersonId, matches_sector};
use crate::hit::{Anchor, Rect, anchor_point, card_rect};
use crate::input::{InputState, UiState};

/// Arrowhead length in world units.
const ARROW_SIZE: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
const ARROW_ANGLE: f64 = PI / 6.0;

/// Cubic Bezier segment in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicBezier {
    pub from: Point,
    pub c1: Point,
    pub c2: Point,
    pub to: Point,
}

impl CubicBezier {
    /// Curve with both control points on the vertical through the midpoint,
    /// so it leaves and enters horizontally.
    #[must_use]
    pub fn horizontal(from: Point, to: Point) -> Self {
        let mid_x = (from.x + to.x) / 2.0;
        Self {
            from,
            c1: Point::new(mid_x, from.y),
            c2: Point::new(mid_x, to.y),
            to,
        }
    }

    /// SVG path data: `M fx fy C c1x c1y, c2x c2y, tx ty`.
    #[must_use]
    pub fn to_svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.from.x, self.from.y, self.c1.x, self.c1.y, self.c2.x, self.c2.y, self.to.x, self.to.y
        )
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            a * self.from.x + b * self.c1.x + c * self.c2.x + d * self.to.x,
            a * self.from.y + b * self.c1.y + c * self.c2.y + d * self.to.y,
        )
    }

    /// Direction of travel at the end of the curve, in radians.
    ///
    /// Falls back to the chord direction when the end tangent degenerates
    /// (source and target stacked vertically).
    #[must_use]
    pub fn end_angle(&self) -> f64 {
        let (dx, dy) = (self.to.x - self.c2.x, self.to.y - self.c2.y);
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return (self.to.y - self.from.y).atan2(self.to.x - self.from.x);
        }
        dy.atan2(dx)
    }
}

/// Triangle for an arrowhead whose tip sits at `tip`, pointing along `angle`.
#[must_use]
pub fn arrowhead(tip: Point, angle: f64) -> [Point; 3] {
    [
        tip,
        Point::new(tip.x - ARROW_SIZE * (angle - ARROW_ANGLE).cos(), tip.y - ARROW_SIZE * (angle - ARROW_ANGLE).sin()),
        Point::new(tip.x - ARROW_SIZE * (angle + ARROW_ANGLE).cos(), tip.y - ARROW_SIZE * (angle + ARROW_ANGLE).sin()),
    ]
}

/// Port positions for a directed edge: right-to-left when the target is to
/// the right of the source, left-to-right otherwise.
#[must_use]
pub fn connection_endpoints(from: &Person, to: &Person) -> (Point, Point) {
    if to.position_x > from.position_x {
        (anchor_point(from, Anchor::Right), anchor_point(to, Anchor::Left))
    } else {
        (anchor_point(from, Anchor::Left), anchor_point(to, Anchor::Right))
    }
}

/// Curve for an edge between two cards.
#[must_use]
pub fn connection_curve(from: &Person, to: &Person) -> CubicBezier {
    let (a, b) = connection_endpoints(from, to);
    CubicBezier::horizontal(a, b)
}

/// SVG path for a stored connection. `None` when either card is missing.
#[must_use]
pub fn connection_path(doc: &ChartDoc, conn: &Connection) -> Option<String> {
    let from = doc.person(&conn.from_person_id)?;
    let to = doc.person(&conn.to_person_id)?;
    Some(connection_curve(from, to).to_svg_path())
}

/// Temporary connector from the source card's right port to the cursor.
#[must_use]
pub fn pending_connection_curve(from: &Person, cursor: Point) -> CubicBezier {
    CubicBezier::horizontal(anchor_point(from, Anchor::Right), cursor)
}

// =============================================================
// Display list
// =============================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardShape {
    pub id: PersonId,
    pub rect: RectShape,
    pub name: String,
    /// Hidden when collapsed.
    pub subtitle: Option<String>,
    pub color: String,
    pub filled: bool,
    pub locked: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorShape {
    /// `None` for the in-progress connector.
    pub id: Option<ConnectionId>,
    pub path: String,
    pub arrow: [Point; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineShape {
    pub id: LineId,
    pub start: Point,
    pub end: Point,
    pub color: String,
    pub stroke_width: f64,
    pub selected: bool,
}

/// Serializable rectangle as `x, y, width, height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<Rect> for RectShape {
    fn from(r: Rect) -> Self {
        Self { x: r.min_x, y: r.min_y, width: r.width(), height: r.height() }
    }
}

/// Everything the host needs to draw one frame, bottom layer first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub camera: Camera,
    pub lines: Vec<LineShape>,
    pub connectors: Vec<ConnectorShape>,
    pub pending_connector: Option<ConnectorShape>,
    pub cards: Vec<CardShape>,
    pub selection_box: Option<RectShape>,
}

fn connector_shape(id: Option<ConnectionId>, curve: &CubicBezier) -> ConnectorShape {
    ConnectorShape { id, path: curve.to_svg_path(), arrow: arrowhead(curve.to, curve.end_angle()) }
}

/// Build the display list for the current state.
///
/// Cards outside the sector filter are skipped, along with every connector
/// touching them.
#[must_use]
pub fn build_scene(doc: &ChartDoc, camera: &Camera, ui: &UiState, input: &InputState) -> Scene {
    let visible = |id: &PersonId| doc.person(id).filter(|p| matches_sector(p, ui.sector_filter));

    let lines = doc
        .lines_sorted()
        .into_iter()
        .map(|l| LineShape {
            id: l.id,
            start: Point::new(l.start_x, l.start_y),
            end: Point::new(l.end_x, l.end_y),
            color: l.color.clone(),
            stroke_width: l.stroke_width,
            selected: ui.selected_line == Some(l.id),
        })
        .collect();

    let connectors = doc
        .connections_sorted()
        .into_iter()
        .filter_map(|c| {
            let from = visible(&c.from_person_id)?;
            let to = visible(&c.to_person_id)?;
            Some(connector_shape(Some(c.id), &connection_curve(from, to)))
        })
        .collect();

    let pending_connector = input
        .pending_connection()
        .and_then(|(from, cursor)| visible(&from).map(|p| connector_shape(None, &pending_connection_curve(p, cursor))));

    let cards = doc
        .people_in_sector(ui.sector_filter)
        .into_iter()
        .map(|p| CardShape {
            id: p.id,
            rect: card_rect(p, ui.collapsed).into(),
            name: p.name.clone(),
            subtitle: (!ui.collapsed).then(|| p.sector.clone()),
            color: p.color.clone(),
            filled: p.fill_card,
            locked: p.locked,
            selected: ui.selection.contains(&p.id),
        })
        .collect();

    Scene {
        camera: *camera,
        lines,
        connectors,
        pending_connector,
        cards,
        selection_box: input.selection_rect().map(RectShape::from),
    }
}
