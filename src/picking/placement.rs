use glam::{Quat, Vec3};
use log::{debug, info};

use super::geometry::MeshShape;
use super::ray::Ray;
use crate::math::Transform;
use crate::render::{Scene, TransientKind};

/// Yaw that turns the +z axis of an object at `position` towards `target`,
/// ignoring the height difference.
pub fn look_at_on_y(position: Vec3, target: Vec3) -> Quat {
    let angle = (target.x - position.x).atan2(target.z - position.z);
    Quat::from_rotation_y(angle)
}

/// Distance from a shape's origin down to its lowest point.
fn resting_height(shape: MeshShape) -> f32 {
    match shape {
        MeshShape::Box { half_extents } => half_extents.y,
        MeshShape::Sphere { radius } => radius,
        _ => 0.0,
    }
}

/// Tap-to-place state of an AR session.
///
/// The target object stays hidden until the first placement. Every frame the
/// reticle follows the latest hit-test point, except while the viewer looks
/// straight at the placed object.
#[derive(Debug, Clone)]
pub struct Placement {
    target: String,
    home: Transform,
    home_rest: Quat,
    was_visible: bool,
    hit: Option<Vec3>,
    viewer: Vec3,
    placed: bool,
}

impl Placement {
    /// Takes `target` out of view. `None` when the scene has no such object.
    pub fn begin(scene: &mut Scene, target: &str) -> Option<Self> {
        let object = scene.find_mut(target)?;
        let placement = Self {
            target: target.to_string(),
            home: object.transform,
            home_rest: object.rest_rotation(),
            was_visible: object.visible,
            hit: None,
            viewer: Vec3::ZERO,
            placed: false,
        };
        object.visible = false;
        debug!("AR: waiting for a surface to place '{}' on", target);
        Some(placement)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Latest hit-test point, in scene space.
    pub fn hit(&self) -> Option<Vec3> {
        self.hit
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    /// Feeds this frame's hit-test point and the viewer's center ray, both in
    /// scene space, and shows the reticle where a placement would land.
    pub fn track(&mut self, scene: &mut Scene, hit: Option<Vec3>, viewer: &Ray) {
        self.hit = hit;
        self.viewer = viewer.origin;

        let on_target = self.placed && scene.raycast_named(viewer, &self.target).is_some();
        let Some(point) = hit.filter(|_| !on_target) else {
            return;
        };
        let reticle = scene.transients_mut().acquire(TransientKind::Reticle);
        reticle.transform = Transform::from_position_rotation(point, look_at_on_y(point, viewer.origin));
    }

    /// Puts the target on the latest hit point, turned towards the viewer.
    pub fn place(&mut self, scene: &mut Scene) -> Option<Vec3> {
        let point = self.hit?;
        let rotation = look_at_on_y(point, self.viewer);
        let object = scene.find_mut(&self.target)?;

        object.transform.position = point + Vec3::Y * resting_height(object.shape()) * object.transform.scale.y;
        object.set_rest_rotation(rotation);
        object.visible = true;
        self.placed = true;

        info!("AR: placed '{}' at ({:.2}, {:.2}, {:.2})", self.target, point.x, point.y, point.z);
        Some(object.transform.position)
    }

    /// Returns the target to where it was before the session.
    pub fn end(self, scene: &mut Scene) {
        if let Some(object) = scene.find_mut(&self.target) {
            object.transform = self.home;
            object.set_rest_rotation(self.home_rest);
            object.visible = self.was_visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::{BoxGeometry, PlaneGeometry};
    use crate::render::SceneObject;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.add(SceneObject::new("floor", PlaneGeometry::new(10.0, 10.0)));
        scene.add(
            SceneObject::new("model", BoxGeometry::new(0.4, 0.6, 0.4)).with_position(Vec3::new(0.0, 1.0, -2.0)),
        );
        scene
    }

    fn reticle(scene: &Scene) -> Option<&SceneObject> {
        scene.iter().find(|o| o.name == "reticle" && o.visible)
    }

    #[test]
    fn look_at_on_y_ignores_height() {
        let q = look_at_on_y(Vec3::ZERO, Vec3::new(0.0, 5.0, 3.0));
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
        let q = look_at_on_y(Vec3::ZERO, Vec3::new(2.0, -1.0, 0.0));
        assert!(q.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-6));
        let q = look_at_on_y(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO);
        assert!((q * Vec3::Z).abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(q.abs_diff_eq(Quat::from_rotation_y(PI), 1e-6) || q.abs_diff_eq(-Quat::from_rotation_y(PI), 1e-6));
    }

    #[test]
    fn begin_hides_the_target_until_placed() {
        let mut scene = scene();
        let mut placement = Placement::begin(&mut scene, "model").expect("model exists");
        assert!(!scene.find("model").map(|o| o.visible).unwrap_or(true));
        assert!(placement.place(&mut scene).is_none());
        assert!(Placement::begin(&mut scene, "missing").is_none());
    }

    #[test]
    fn reticle_follows_the_hit_and_faces_the_viewer() {
        let mut scene = scene();
        let mut placement = Placement::begin(&mut scene, "model").expect("model exists");
        let viewer = Ray::new(Vec3::new(0.0, 1.6, 0.0), Vec3::new(0.0, -1.6, -2.0));

        placement.track(&mut scene, Some(Vec3::new(0.0, 0.0, -2.0)), &viewer);
        scene.transients_mut().end_frame();
        let shown = reticle(&scene).expect("reticle shown");
        assert!(shown.transform.position.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));
        // +z of the reticle points back at the viewer.
        assert!((shown.transform.rotation * Vec3::Z).abs_diff_eq(Vec3::Z, 1e-5));

        placement.track(&mut scene, None, &viewer);
        scene.transients_mut().end_frame();
        assert!(reticle(&scene).is_none());
    }

    #[test]
    fn placed_object_rests_on_the_surface() {
        let mut scene = scene();
        let mut placement = Placement::begin(&mut scene, "model").expect("model exists");
        let viewer = Ray::new(Vec3::new(1.0, 1.6, 0.0), Vec3::new(0.0, -1.6, -2.0));
        placement.track(&mut scene, Some(Vec3::new(1.0, 0.0, -2.0)), &viewer);

        let placed = placement.place(&mut scene).expect("placed");
        assert!(placed.abs_diff_eq(Vec3::new(1.0, 0.3, -2.0), 1e-6));
        let model = scene.find("model").expect("model");
        assert!(model.visible);
        assert!((model.transform.rotation * Vec3::Z).abs_diff_eq(Vec3::Z, 1e-5));
        assert!(placement.is_placed());
    }

    #[test]
    fn looking_at_the_placed_object_hides_the_reticle() {
        let mut scene = scene();
        let mut placement = Placement::begin(&mut scene, "model").expect("model exists");
        let down = Ray::new(Vec3::new(0.0, 1.6, 0.0), Vec3::new(0.0, -1.6, -2.0));
        placement.track(&mut scene, Some(Vec3::new(0.0, 0.0, -2.0)), &down);
        scene.transients_mut().end_frame();
        placement.place(&mut scene);

        // Straight at the box resting around y = 0.3.
        let at_model = Ray::new(Vec3::new(0.0, 0.3, 0.0), Vec3::NEG_Z);
        placement.track(&mut scene, Some(Vec3::new(0.0, 0.0, -2.0)), &at_model);
        scene.transients_mut().end_frame();
        assert!(reticle(&scene).is_none());
        // The hit is still remembered for the next select.
        assert_eq!(placement.hit(), Some(Vec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn end_restores_the_target() {
        let mut scene = scene();
        let mut placement = Placement::begin(&mut scene, "model").expect("model exists");
        let viewer = Ray::new(Vec3::new(3.0, 1.6, 0.0), Vec3::NEG_Y);
        placement.track(&mut scene, Some(Vec3::new(2.0, 0.0, -1.0)), &viewer);
        placement.place(&mut scene);
        placement.end(&mut scene);

        let model = scene.find("model").expect("model");
        assert!(model.visible);
        assert_eq!(model.transform.position, Vec3::new(0.0, 1.0, -2.0));
        assert_eq!(model.transform.rotation, Quat::IDENTITY);
    }
}
