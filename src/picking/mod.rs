//! Ray picking
//!
//! Pointer rays come from an input source's target-ray pose shifted by the
//! locomotion offset, and are cast in scene space against object geometry.
//! Selecting the floor teleports; hovering only updates feedback visuals.
//! In AR, [`Placement`] puts a model on the surface the hit test found.

mod geometry;
mod grab;
mod placement;
mod pointer;
mod ray;
mod world;

pub use geometry::{BoxGeometry, Geometry, MeshShape, PlaneGeometry, SphereGeometry, VisualGeometry};
pub use grab::{begin_grab, GrabState};
pub use placement::{look_at_on_y, Placement};
pub use pointer::{pointer_ray, teleport, update_input_visuals, CURSOR_RADIUS, TELEPORT_RING_RADIUS};
pub use ray::{Ray, RayHit};
pub use world::intersect_transformed;
