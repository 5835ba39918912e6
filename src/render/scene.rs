use glam::{Mat4, Quat, Vec3};

use super::panorama::Panorama;
use crate::math::Transform;
use crate::picking::{intersect_transformed, Geometry, MeshShape, Ray, RayHit, VisualGeometry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
    pub wireframe: bool,
}

impl Material {
    pub fn solid(r: f32, g: f32, b: f32) -> Self {
        Self {
            color: [r, g, b, 1.0],
            wireframe: false,
        }
    }

    pub fn wireframe(r: f32, g: f32, b: f32) -> Self {
        Self {
            color: [r, g, b, 1.0],
            wireframe: true,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.color[3] = opacity;
        self
    }
}

/// Opacity of an object while a pointer ray rests on it.
pub const HIGHLIGHT_OPACITY: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Animation {
    Still,
    /// Constant angular velocity in radians per second around each axis.
    Spin { rate: Vec3 },
    /// Pitch and yaw follow `sin`/`cos` of the scaled time.
    Sway { amplitude: f32, speed: f32 },
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub geometry: Box<dyn Geometry>,
    pub material: Material,
    pub visible: bool,
    pub highlighted: bool,
    pub animation: Animation,
    rest_rotation: Quat,
    world_matrix: Mat4,
    transient: bool,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, geometry: impl Geometry + 'static) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            geometry: Box::new(geometry),
            material: Material::solid(0.8, 0.8, 0.8),
            visible: true,
            highlighted: false,
            animation: Animation::Still,
            rest_rotation: Quat::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            transient: false,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self.rest_rotation = transform.rotation;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self.rest_rotation = rotation;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = animation;
        self
    }

    /// Orientation the animation is applied on top of.
    pub fn rest_rotation(&self) -> Quat {
        self.rest_rotation
    }

    /// Re-orients the object, animation included.
    pub fn set_rest_rotation(&mut self, rotation: Quat) {
        self.rest_rotation = rotation;
        self.transform.rotation = rotation;
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn shape(&self) -> MeshShape {
        self.geometry.render_shape()
    }

    /// Final draw color, including the hover highlight.
    pub fn color(&self) -> [f32; 4] {
        let mut color = self.material.color;
        if self.highlighted {
            color[3] = color[3].min(HIGHLIGHT_OPACITY);
        }
        color
    }

    fn animate(&mut self, time: f32) {
        let motion = match self.animation {
            Animation::Still => return,
            Animation::Spin { rate } => {
                Quat::from_euler(glam::EulerRot::XYZ, rate.x * time, rate.y * time, rate.z * time)
            }
            Animation::Sway { amplitude, speed } => {
                let t = time * speed;
                Quat::from_euler(glam::EulerRot::XYZ, t.sin() * amplitude, t.cos() * amplitude, 0.0)
            }
        };
        self.transform.rotation = self.rest_rotation * motion;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    Controller,
    Laser,
    Cursor,
    /// Marks where an AR placement would land.
    Reticle,
}

const TRANSIENT_KINDS: usize = 4;

impl TransientKind {
    fn index(self) -> usize {
        match self {
            TransientKind::Controller => 0,
            TransientKind::Laser => 1,
            TransientKind::Cursor => 2,
            TransientKind::Reticle => 3,
        }
    }

    fn template(self) -> SceneObject {
        let object = match self {
            TransientKind::Controller => SceneObject::new("controller", VisualGeometry(MeshShape::Controller))
                .with_material(Material::solid(0.25, 0.25, 0.3)),
            TransientKind::Laser => SceneObject::new("laser", VisualGeometry(MeshShape::Line { length: 1.0 }))
                .with_material(Material::wireframe(0.3, 0.8, 1.0)),
            TransientKind::Cursor => SceneObject::new("cursor", VisualGeometry(MeshShape::Disc { radius: 0.05 }))
                .with_material(Material::solid(0.3, 0.8, 1.0).with_opacity(0.5)),
            TransientKind::Reticle => SceneObject::new(
                "reticle",
                VisualGeometry(MeshShape::Ring {
                    radius: 0.1,
                    tube: 0.01,
                }),
            )
            .with_material(Material::solid(1.0, 1.0, 1.0).with_opacity(0.8)),
        };
        SceneObject {
            transient: true,
            visible: false,
            ..object
        }
    }
}

/// Per-frame input visuals, reused from frame to frame.
#[derive(Debug, Clone, Default)]
pub struct TransientPool {
    pools: [Vec<SceneObject>; TRANSIENT_KINDS],
    active: [usize; TRANSIENT_KINDS],
}

impl TransientPool {
    /// Next free object of `kind`, created on demand and made visible.
    pub fn acquire(&mut self, kind: TransientKind) -> &mut SceneObject {
        let i = kind.index();
        let slot = self.active[i];
        if slot == self.pools[i].len() {
            self.pools[i].push(kind.template());
        }
        self.active[i] += 1;
        let object = &mut self.pools[i][slot];
        object.visible = true;
        object
    }

    pub fn active(&self, kind: TransientKind) -> usize {
        self.active[kind.index()]
    }

    /// Hides everything not acquired since the last call and rewinds.
    pub fn end_frame(&mut self) {
        for (pool, active) in self.pools.iter_mut().zip(self.active.iter_mut()) {
            for object in pool.iter_mut().skip(*active) {
                object.visible = false;
            }
            *active = 0;
        }
    }

    pub fn clear(&mut self) {
        for pool in &mut self.pools {
            pool.clear();
        }
        self.active = [0; TRANSIENT_KINDS];
    }

    pub fn len(&self) -> usize {
        self.pools.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.pools.iter().flatten()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.pools.iter_mut().flatten()
    }
}

/// Flat scene graph: a root matrix over a list of objects, optionally
/// surrounded by a panorama.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Root transform used while the scene updates its own matrix.
    pub transform: Transform,
    objects: Vec<SceneObject>,
    transients: TransientPool,
    environment: Option<Panorama>,
    environment_visible: bool,
    matrix: Mat4,
    matrix_auto_update: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            transform: Transform::IDENTITY,
            objects: Vec::new(),
            transients: TransientPool::default(),
            environment: None,
            environment_visible: true,
            matrix: Mat4::IDENTITY,
            matrix_auto_update: true,
        }
    }

    pub fn add(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    /// Every object, transient visuals included.
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().chain(self.transients.iter())
    }

    pub fn transients(&self) -> &TransientPool {
        &self.transients
    }

    pub fn transients_mut(&mut self) -> &mut TransientPool {
        &mut self.transients
    }

    pub fn set_environment(&mut self, panorama: Option<Panorama>) {
        self.environment = panorama;
    }

    pub fn environment(&self) -> Option<&Panorama> {
        self.environment.as_ref()
    }

    /// Hides the panorama without dropping it, e.g. over camera passthrough.
    pub fn set_environment_visible(&mut self, visible: bool) {
        self.environment_visible = visible;
    }

    /// The panorama that should be drawn this frame.
    pub fn visible_environment(&self) -> Option<&Panorama> {
        self.environment.as_ref().filter(|_| self.environment_visible)
    }

    /// Drops every controller, laser, cursor and reticle.
    pub fn release_transients(&mut self) {
        self.transients.clear();
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Sets the root matrix directly. Only sticks while auto-update is off.
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
    }

    pub fn matrix_auto_update(&self) -> bool {
        self.matrix_auto_update
    }

    pub fn set_matrix_auto_update(&mut self, enabled: bool) {
        self.matrix_auto_update = enabled;
    }

    /// Recomputes world matrices. With auto-update on, the root matrix is
    /// first rebuilt from `transform`.
    pub fn update_matrix_world(&mut self) {
        if self.matrix_auto_update {
            self.matrix = self.transform.to_matrix();
        }
        let root = self.matrix;
        for object in self.objects.iter_mut().chain(self.transients.iter_mut()) {
            object.world_matrix = root * object.transform.to_matrix();
        }
    }

    /// Advances animated objects to `time` seconds.
    pub fn animate(&mut self, time: f32) {
        for object in &mut self.objects {
            object.animate(time);
        }
    }

    /// Closest visible object hit by `ray`, in scene space (before the root
    /// matrix), skipping objects for which `skip` returns true.
    pub fn raycast(&self, ray: &Ray, skip: impl Fn(&SceneObject) -> bool) -> Option<(&SceneObject, RayHit)> {
        let mut closest: Option<(&SceneObject, RayHit)> = None;

        for object in self.iter() {
            if !object.visible || skip(object) {
                continue;
            }
            let model = object.transform.to_matrix();
            if let Some(hit) = intersect_transformed(object.geometry.as_ref(), model, ray) {
                match &closest {
                    None => closest = Some((object, hit)),
                    Some((_, prev_hit)) if hit.t < prev_hit.t => {
                        closest = Some((object, hit));
                    }
                    _ => {}
                }
            }
        }

        closest
    }

    /// Raycast against the single object called `name`.
    pub fn raycast_named(&self, ray: &Ray, name: &str) -> Option<(&SceneObject, RayHit)> {
        self.raycast(ray, |o| o.name != name)
    }
}
