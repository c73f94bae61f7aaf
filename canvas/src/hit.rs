//! Hit-testing and box selection against cards, ports, and decorative lines.
//!
//! Card geometry is an axis-aligned rectangle centered on the person's
//! position. Its half-extents depend on the card size and on whether the
//! chart is shown collapsed. Screen-space tolerances (port radius, line slop)
//! are converted to world units through the camera so they feel the same at
//! every zoom level.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::consts::{COLLAPSED_CARD_HEIGHT, LINE_HANDLE_RADIUS_PX, LINE_HIT_SLOP_PX, PORT_RADIUS_PX};
use crate::doc::{CardSize, ChartDoc, DecorativeLine, LineId, Person, PersonId, SectorId};

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Normalized rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    #[must_use]
    pub fn from_center(center: Point, half_w: f64, half_h: f64) -> Self {
        Self {
            min_x: center.x - half_w,
            min_y: center.y - half_h,
            max_x: center.x + half_w,
            max_y: center.y + half_h,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Overlap test on closed intervals: rectangles that share an edge intersect.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x && self.max_x >= other.min_x && self.min_y <= other.max_y && self.max_y >= other.min_y
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Left or right connection port of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Right,
}

/// Which end of a decorative line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Start,
    End,
}

/// Result of a hit test, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// Endpoint handle of the currently selected line.
    LineEndpoint { line: LineId, end: LineEnd },
    /// A card's left or right connection port.
    Port { person: PersonId, anchor: Anchor },
    /// A card body.
    Card(PersonId),
    /// A decorative line body.
    Line(LineId),
}

/// View state that changes what can be hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitOptions {
    /// Cards drawn collapsed (title only).
    pub collapsed: bool,
    /// Cards outside this sector are hidden and never hit.
    pub sector_filter: Option<SectorId>,
    /// Only the selected line exposes endpoint handles.
    pub selected_line: Option<LineId>,
}

/// Half width and half height of a card.
#[must_use]
pub fn card_half_extents(size: CardSize, collapsed: bool) -> (f64, f64) {
    let (w, h) = size.dimensions();
    let h = if collapsed { COLLAPSED_CARD_HEIGHT } else { h };
    (w / 2.0, h / 2.0)
}

/// World-space rectangle of a card.
#[must_use]
pub fn card_rect(person: &Person, collapsed: bool) -> Rect {
    let (hw, hh) = card_half_extents(person.card_size, collapsed);
    Rect::from_center(Point::new(person.position_x, person.position_y), hw, hh)
}

/// World-space position of a card's port.
#[must_use]
pub fn anchor_point(person: &Person, anchor: Anchor) -> Point {
    let (hw, _) = card_half_extents(person.card_size, false);
    match anchor {
        Anchor::Left => Point::new(person.position_x - hw, person.position_y),
        Anchor::Right => Point::new(person.position_x + hw, person.position_y),
    }
}

/// Ids of every visible card whose rectangle intersects `selection`, in draw order.
#[must_use]
pub fn box_select(doc: &ChartDoc, selection: &Rect, opts: HitOptions) -> Vec<PersonId> {
    doc.people_in_sector(opts.sector_filter)
        .into_iter()
        .filter(|p| card_rect(p, opts.collapsed).intersects(selection))
        .map(|p| p.id)
        .collect()
}

/// Topmost visible card under `world_pt`.
#[must_use]
pub fn hit_card(doc: &ChartDoc, world_pt: Point, opts: HitOptions) -> Option<PersonId> {
    doc.people_in_sector(opts.sector_filter)
        .into_iter()
        .rev()
        .find(|p| card_rect(p, opts.collapsed).contains(world_pt))
        .map(|p| p.id)
}

/// Topmost visible card port under `world_pt`.
#[must_use]
pub fn hit_port(doc: &ChartDoc, world_pt: Point, camera: &Camera, opts: HitOptions) -> Option<(PersonId, Anchor)> {
    let radius = camera.screen_dist_to_world(PORT_RADIUS_PX);
    doc.people_in_sector(opts.sector_filter)
        .into_iter()
        .rev()
        .find_map(|p| {
            [Anchor::Right, Anchor::Left]
                .into_iter()
                .find(|a| anchor_point(p, *a).distance(world_pt) <= radius)
                .map(|a| (p.id, a))
        })
}

/// Shortest distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

fn line_start(line: &DecorativeLine) -> Point {
    Point::new(line.start_x, line.start_y)
}

fn line_end(line: &DecorativeLine) -> Point {
    Point::new(line.end_x, line.end_y)
}

/// Endpoint handle of the selected line under `world_pt`.
#[must_use]
pub fn hit_line_endpoint(doc: &ChartDoc, world_pt: Point, camera: &Camera, selected: Option<LineId>) -> Option<LineEnd> {
    let line = doc.line(&selected?)?;
    let radius = camera.screen_dist_to_world(LINE_HANDLE_RADIUS_PX);
    if line_start(line).distance(world_pt) <= radius {
        Some(LineEnd::Start)
    } else if line_end(line).distance(world_pt) <= radius {
        Some(LineEnd::End)
    } else {
        None
    }
}

/// Topmost decorative line whose body passes within the hit slop of `world_pt`.
#[must_use]
pub fn hit_line(doc: &ChartDoc, world_pt: Point, camera: &Camera) -> Option<LineId> {
    let slop = camera.screen_dist_to_world(LINE_HIT_SLOP_PX);
    doc.lines_sorted()
        .into_iter()
        .rev()
        .find(|l| distance_to_segment(world_pt, line_start(l), line_end(l)) <= slop + l.stroke_width / 2.0)
        .map(|l| l.id)
}

/// Test what is under `world_pt`, in priority order: selected line handles,
/// card ports, card bodies, then line bodies.
#[must_use]
pub fn hit_test(world_pt: Point, doc: &ChartDoc, camera: &Camera, opts: HitOptions) -> Option<Hit> {
    if let Some(end) = hit_line_endpoint(doc, world_pt, camera, opts.selected_line) {
        if let Some(line) = opts.selected_line {
            return Some(Hit::LineEndpoint { line, end });
        }
    }
    if let Some((person, anchor)) = hit_port(doc, world_pt, camera, opts) {
        return Some(Hit::Port { person, anchor });
    }
    if let Some(person) = hit_card(doc, world_pt, opts) {
        return Some(Hit::Card(person));
    }
    hit_line(doc, world_pt, camera).map(Hit::Line)
}
