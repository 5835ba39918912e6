use std::f32::consts::FRAC_PI_4;
use std::ops::{BitOr, BitOrAssign};

use winit::keyboard::KeyCode;

/// Held movement directions as a bit set. Several directions may be held at
/// once from the keyboard; the touch joystick only ever yields one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Direction(u8);

impl Direction {
    pub const STOPPED: Self = Self(0);
    pub const LEFT: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const FORWARD: Self = Self(4);
    pub const BACKWARD: Self = Self(8);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_stopped(self) -> bool {
        self.0 == 0
    }

    /// WASD and arrow keys.
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Self::FORWARD),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Self::LEFT),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Self::BACKWARD),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Self::RIGHT),
            _ => None,
        }
    }

    /// Maps a joystick displacement in screen pixels (y grows downwards) to
    /// a single direction using 90 degree sectors centred on the axes.
    pub fn from_joystick(dx: f32, dy: f32) -> Self {
        if dx == 0.0 && dy == 0.0 {
            return Self::STOPPED;
        }
        let angle = dy.atan2(dx);
        if angle > FRAC_PI_4 && angle < 3.0 * FRAC_PI_4 {
            Self::BACKWARD
        } else if angle < -FRAC_PI_4 && angle > -3.0 * FRAC_PI_4 {
            Self::FORWARD
        } else if angle.abs() <= FRAC_PI_4 {
            Self::RIGHT
        } else {
            Self::LEFT
        }
    }
}

impl BitOr for Direction {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Direction {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
