//! User locomotion
//!
//! Tracks the virtual displacement of the user inside the room, independent
//! of physical head tracking. The offset is always the user's world-space
//! displacement and is clamped to per-scene [`RoomBounds`].

mod bounds;
mod direction;
mod offset;

pub use bounds::RoomBounds;
pub use direction::Direction;
pub use offset::Locomotion;
