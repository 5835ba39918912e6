//! Long scripted walks that must never leave the room.

use glam::{Mat4, Quat, Vec3};
use xr_webgpu::{Direction, Locomotion, LocomotionConfig, RoomBounds};

/// Deterministic generator in [0, 1).
fn lcg(seed: u64) -> impl FnMut() -> f32 {
    let mut rng = seed;
    move || {
        rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((rng >> 33) as f64 / (1u64 << 31) as f64) as f32
    }
}

const DIRECTIONS: [Direction; 4] = [Direction::LEFT, Direction::RIGHT, Direction::FORWARD, Direction::BACKWARD];

fn rooms() -> Vec<RoomBounds> {
    vec![
        RoomBounds::default(),
        RoomBounds::square(0.5),
        RoomBounds::new((1.0, 3.0), (-8.0, -5.0)),
        RoomBounds::new((-0.25, 0.25), (-20.0, 20.0)),
    ]
}

#[test]
fn random_walks_stay_inside_the_room() {
    for (seed, bounds) in (1u64..).zip(rooms()) {
        let mut next = lcg(seed * 7919);
        let mut locomotion = Locomotion::new(bounds, LocomotionConfig::default());
        assert!(bounds.contains(locomotion.offset()));

        for step in 0..4000 {
            let span = 30.0 * (next() - 0.5);
            let point = Vec3::new(span, next() - 0.5, 30.0 * (next() - 0.5));
            let direction = DIRECTIONS[(next() * 4.0) as usize % 4];
            let heading = Quat::from_rotation_y(std::f32::consts::TAU * next());
            let dt = 0.2 * next();

            let offset = match (next() * 7.0) as u32 {
                0 => locomotion.translate(point * next()),
                1 => locomotion.set_offset(point),
                2 => locomotion.teleport_to(point),
                3 => {
                    locomotion.press(direction);
                    locomotion.step_flat(dt, heading)
                }
                4 => {
                    locomotion.release(direction);
                    locomotion.step_flat(dt, heading)
                }
                5 => {
                    locomotion.press(direction);
                    let view = Mat4::from_rotation_translation(heading, Vec3::Y * 1.6).inverse();
                    locomotion.step_magic_window(view, dt)
                }
                _ => {
                    locomotion.reset();
                    locomotion.offset()
                }
            };

            assert_eq!(offset, locomotion.offset(), "seed {seed}, step {step}");
            assert!(
                bounds.contains(locomotion.offset()),
                "seed {seed}, step {step}: {:?} left {:?}",
                locomotion.offset(),
                bounds
            );
        }
    }
}

#[test]
fn holding_every_direction_on_a_grid_of_headings_stays_inside() {
    let bounds = RoomBounds::default();
    let config = LocomotionConfig::default().with_walk(400.0, 1.0);

    for direction in DIRECTIONS {
        for i in 0..16 {
            let heading = Quat::from_rotation_y(std::f32::consts::TAU * i as f32 / 16.0);
            let mut locomotion = Locomotion::new(bounds, config);
            locomotion.press(direction);
            for _ in 0..200 {
                locomotion.step_flat(0.1, heading);
                assert!(bounds.contains(locomotion.offset()), "{direction:?} at heading {i}");
            }
            // Walking into a wall ends up pinned on it.
            let offset = locomotion.offset();
            let on_wall = [offset.x - bounds.min_x, bounds.max_x - offset.x, offset.z - bounds.min_z, bounds.max_z - offset.z]
                .iter()
                .any(|gap| gap.abs() < 1e-4);
            assert!(on_wall, "{direction:?} at heading {i} stopped at {offset:?}");
        }
    }
}

#[test]
fn shrinking_the_room_pulls_the_offset_in() {
    let mut locomotion = Locomotion::default();
    locomotion.set_offset(Vec3::new(3.5, 0.0, -5.5));

    let small = RoomBounds::square(1.0);
    locomotion.set_bounds(small);
    assert!(small.contains(locomotion.offset()));

    let away = RoomBounds::new((2.0, 4.0), (2.0, 4.0));
    locomotion.set_bounds(away);
    locomotion.reset();
    assert_eq!(locomotion.offset(), Vec3::new(2.0, 0.0, 2.0));
}
