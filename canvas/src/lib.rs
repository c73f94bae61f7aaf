//! Interaction model for the org-chart canvas.
//!
//! The crate owns everything between raw pointer/keyboard events and the
//! chart mutations they imply: the in-memory chart document, the pan/zoom
//! camera, hit-testing of cards, ports and decorative lines, connector
//! geometry, and the gesture state machine. It holds no DOM handles. A host
//! (browser shell or test) feeds events into [`engine::EngineCore`], draws the
//! returned [`render::Scene`], and forwards persistence-relevant
//! [`engine::Action`]s to the service.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Event handlers and the [`engine::Action`] stream |
//! | [`doc`] | People, connections, sectors, decorative lines |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Tools, modifiers, and the gesture state machine |
//! | [`hit`] | Hit-testing and box selection |
//! | [`render`] | Bezier connectors and the display list |
//! | [`consts`] | Card sizes, zoom limits, hit radii |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod render;
