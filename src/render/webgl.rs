use std::collections::HashMap;

use log::{debug, error, trace};
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlUniformLocation,
    WebGlVertexArrayObject, XrWebGlLayer,
};

use super::backend::{FramebufferTarget, RenderBackend};
use super::camera::Camera;
use super::draw::{draw_list, DrawPass, DrawSource};
use super::mesh::{MeshData, MeshKey, Vertex};
use super::scene::Scene;
use crate::error::RenderError;
use crate::xr::Viewport;

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec4 a_color;

uniform mat4 u_view_proj;
uniform mat4 u_model;
uniform vec4 u_color;

out vec3 v_normal;
out vec4 v_color;

void main() {
    gl_Position = u_view_proj * u_model * vec4(a_position, 1.0);
    v_normal = (u_model * vec4(a_normal, 0.0)).xyz;
    v_color = a_color * u_color;
}
"#;

const LIT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec3 v_normal;
in vec4 v_color;
out vec4 frag_color;

void main() {
    vec3 light = normalize(vec3(0.4, 1.0, 0.6));
    float diffuse = max(dot(normalize(v_normal), light), 0.0) * 0.7 + 0.3;
    frag_color = vec4(v_color.rgb * diffuse, v_color.a);
}
"#;

const FLAT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec3 v_normal;
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;

fn compile_shader(gl: &Gl, shader_type: u32, source: &str) -> Result<WebGlShader, RenderError> {
    let shader = gl
        .create_shader(shader_type)
        .ok_or_else(|| RenderError::WebGl("unable to create shader object".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(RenderError::WebGl(format!("shader compilation failed: {log}")))
    }
}

struct Program {
    program: WebGlProgram,
    view_proj: Option<WebGlUniformLocation>,
    model: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
}

impl Program {
    fn link(gl: &Gl, fragment_source: &str) -> Result<Self, RenderError> {
        let vertex = compile_shader(gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, fragment_source)?;

        let program = gl
            .create_program()
            .ok_or_else(|| RenderError::WebGl("unable to create program object".into()))?;
        gl.attach_shader(&program, &vertex);
        gl.attach_shader(&program, &fragment);
        gl.link_program(&program);
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        if !gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            let log = gl.get_program_info_log(&program).unwrap_or_default();
            gl.delete_program(Some(&program));
            return Err(RenderError::WebGl(format!("program link failed: {log}")));
        }

        Ok(Self {
            view_proj: gl.get_uniform_location(&program, "u_view_proj"),
            model: gl.get_uniform_location(&program, "u_model"),
            color: gl.get_uniform_location(&program, "u_color"),
            program,
        })
    }
}

struct GlMesh {
    vao: WebGlVertexArrayObject,
    // Kept alive with the VAO that references them.
    _vertex_buffer: WebGlBuffer,
    _index_buffer: WebGlBuffer,
    index_count: i32,
    mode: u32,
}

impl GlMesh {
    fn upload(gl: &Gl, data: &MeshData) -> Result<Self, RenderError> {
        let missing = |what: &str| RenderError::WebGl(format!("unable to create {what}"));
        let vao = gl.create_vertex_array().ok_or_else(|| missing("vertex array"))?;
        let vertex_buffer = gl.create_buffer().ok_or_else(|| missing("vertex buffer"))?;
        let index_buffer = gl.create_buffer().ok_or_else(|| missing("index buffer"))?;

        gl.bind_vertex_array(Some(&vao));

        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vertex_buffer));
        gl.buffer_data_with_u8_array(Gl::ARRAY_BUFFER, bytemuck::cast_slice(&data.vertices), Gl::STATIC_DRAW);

        let stride = std::mem::size_of::<Vertex>() as i32;
        let attributes = [(0, 3, 0), (1, 3, Vertex::NORMAL_OFFSET), (2, 4, Vertex::COLOR_OFFSET)];
        for (location, size, offset) in attributes {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_with_i32(location, size, Gl::FLOAT, false, stride, offset as i32);
        }

        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        gl.buffer_data_with_u8_array(Gl::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(&data.indices), Gl::STATIC_DRAW);

        gl.bind_vertex_array(None);

        Ok(Self {
            vao,
            _vertex_buffer: vertex_buffer,
            _index_buffer: index_buffer,
            index_count: data.indices.len() as i32,
            mode: if data.lines { Gl::LINES } else { Gl::TRIANGLES },
        })
    }
}

/// [`RenderBackend`] drawing with WebGL2 into the framebuffer of an
/// `XRWebGLLayer`.
///
/// Immersive sessions composite whatever the layer framebuffer holds, so
/// session frames go through this backend while the flat view stays on the
/// page canvas. Unlike wgpu, GL clears and draws immediately; viewports are
/// flipped to GL's bottom-left origin on the way in.
pub struct WebGlBackend {
    gl: Gl,
    lit: Program,
    flat: Program,
    meshes: HashMap<MeshKey, GlMesh>,
    environment: Option<(u64, GlMesh)>,
    layer: Option<XrWebGlLayer>,
    framebuffer_size: (u32, u32),
    auto_clear: bool,
    clear_color: [f32; 4],
}

impl WebGlBackend {
    pub fn new(gl: Gl, clear_color: [f64; 4]) -> Result<Self, RenderError> {
        let lit = Program::link(&gl, LIT_FRAGMENT_SHADER)?;
        let flat = Program::link(&gl, FLAT_FRAGMENT_SHADER)?;

        gl.enable(Gl::DEPTH_TEST);
        gl.depth_func(Gl::LEQUAL);
        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);

        let framebuffer_size = (gl.drawing_buffer_width().max(1) as u32, gl.drawing_buffer_height().max(1) as u32);
        Ok(Self {
            gl,
            lit,
            flat,
            meshes: HashMap::new(),
            environment: None,
            layer: None,
            framebuffer_size,
            auto_clear: true,
            clear_color: clear_color.map(|c| c as f32),
        })
    }

    /// Layer whose framebuffer `FramebufferTarget::Layer` binds. `None` once
    /// the session is gone.
    pub fn set_layer(&mut self, layer: Option<XrWebGlLayer>) {
        if layer.is_none() {
            self.gl.bind_framebuffer(Gl::FRAMEBUFFER, None);
        }
        self.layer = layer;
    }

    pub fn set_clear_color(&mut self, color: [f64; 4]) {
        self.clear_color = color.map(|c| c as f32);
    }

    fn clear_bits(&self, mask: u32) {
        let [r, g, b, a] = self.clear_color;
        self.gl.clear_color(r, g, b, a);
        self.gl.depth_mask(true);
        self.gl.clear(mask);
    }

    fn prepare_mesh(&mut self, scene: &Scene, source: DrawSource) -> Result<(), RenderError> {
        match source {
            DrawSource::Shape { shape, wireframe } => {
                let key = MeshKey::new(shape, wireframe);
                if !self.meshes.contains_key(&key) {
                    let mesh = GlMesh::upload(&self.gl, &MeshData::for_shape(shape, wireframe))?;
                    self.meshes.insert(key, mesh);
                }
            }
            DrawSource::Environment(id) => {
                if self.environment.as_ref().map(|(cached, _)| *cached) == Some(id) {
                    return Ok(());
                }
                if let Some(panorama) = scene.environment() {
                    debug!("Baking panorama {} into a GL sphere of radius {}", id, panorama.radius());
                    let mesh = GlMesh::upload(&self.gl, &MeshData::panorama(panorama))?;
                    self.environment = Some((id, mesh));
                }
            }
        }
        Ok(())
    }

    fn draw(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        let view_proj = camera.view_projection().to_cols_array();
        let mut bound = None;

        for item in draw_list(scene) {
            self.prepare_mesh(scene, item.source)?;
            let mesh = match item.source.mesh_key() {
                Some(key) => self.meshes.get(&key),
                None => self.environment.as_ref().map(|(_, mesh)| mesh),
            };
            let Some(mesh) = mesh else {
                continue;
            };

            let program = match item.pass {
                DrawPass::Lit => &self.lit,
                DrawPass::Unlit | DrawPass::Lines => &self.flat,
            };
            if bound != Some(item.pass == DrawPass::Lit) {
                self.gl.use_program(Some(&program.program));
                self.gl
                    .uniform_matrix4fv_with_f32_array(program.view_proj.as_ref(), false, &view_proj);
                bound = Some(item.pass == DrawPass::Lit);
            }
            self.gl
                .uniform_matrix4fv_with_f32_array(program.model.as_ref(), false, &item.model.to_cols_array());
            let [r, g, b, a] = item.color;
            self.gl.uniform4f(program.color.as_ref(), r, g, b, a);
            // The backdrop never occludes the scene.
            self.gl.depth_mask(item.pass != DrawPass::Unlit);

            self.gl.bind_vertex_array(Some(&mesh.vao));
            self.gl
                .draw_elements_with_i32(mesh.mode, mesh.index_count, Gl::UNSIGNED_INT, 0);
        }

        self.gl.bind_vertex_array(None);
        self.gl.depth_mask(true);
        Ok(())
    }
}

impl RenderBackend for WebGlBackend {
    fn surface_size(&self) -> (u32, u32) {
        self.framebuffer_size
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget) {
        match target {
            FramebufferTarget::Default => {
                self.gl.bind_framebuffer(Gl::FRAMEBUFFER, None);
                self.framebuffer_size = (
                    self.gl.drawing_buffer_width().max(1) as u32,
                    self.gl.drawing_buffer_height().max(1) as u32,
                );
            }
            FramebufferTarget::Layer { width, height } => {
                let framebuffer = self.layer.as_ref().and_then(|layer| layer.framebuffer());
                if self.layer.is_none() {
                    debug!("No XR layer attached, drawing to the default framebuffer");
                }
                self.gl.bind_framebuffer(Gl::FRAMEBUFFER, framebuffer.as_ref());
                self.framebuffer_size = (width, height);
            }
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let (x, y, width, height) = viewport.to_bottom_left(self.framebuffer_size.1);
        self.gl.viewport(x, y, width, height);
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn clear(&mut self) {
        self.clear_bits(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn clear_depth(&mut self) {
        self.clear_bits(Gl::DEPTH_BUFFER_BIT);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        if self.auto_clear {
            self.clear();
        }
        if let Err(err) = self.draw(scene, camera) {
            error!("WebGL draw failed: {}", err);
        }
    }

    fn finish_frame(&mut self) {
        // The session composites the layer once the frame callback returns.
        trace!("WebGL frame done, {} meshes cached", self.meshes.len());
    }
}
