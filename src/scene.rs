//! Render loop: per-frame vertex transform, wireframe or filled rasterization
//! with a depth test, and the fragment stage.
//!
//! Triangles are submitted strictly in order. Only the pixel scan inside one
//! triangle runs in parallel, since each pixel is touched once per triangle;
//! scanning several triangles at once would race on the depth test.

pub mod shader;
pub mod util;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::image::{Color, FrameBuffer};
use crate::math::{Mat4, Vec2f, Vec3f};
use crate::mesh::Mesh;
use crate::texture::Texture;
use crate::transform::{look_at, perspective_project, viewport_with_depth};
pub use shader::{MatrixSlot, Shader, ShadingModel, TextureSlot, VectorSlot};
use util::{
    barycentric, interpolate, interpolate_uv, is_backfacing, is_inside, tangent_basis, BoundingBox,
};

/// Wireframe vertices further than this many surface sizes off screen are not drawn.
const GUARD_BAND: f32 = 4.0;

/// How faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveMode {
    /// Triangle edges only, no depth test.
    Wireframe,
    #[default]
    Filled,
}

impl PrimitiveMode {
    pub const ALL: [PrimitiveMode; 2] = [PrimitiveMode::Wireframe, PrimitiveMode::Filled];

    pub fn name(self) -> &'static str {
        return match self {
            PrimitiveMode::Wireframe => "wireframe",
            PrimitiveMode::Filled => "filled",
        };
    }
}

impl fmt::Display for PrimitiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.name());
    }
}

impl FromStr for PrimitiveMode {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        return PrimitiveMode::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| Error::UnknownPrimitiveMode(name.to_string()));
    }
}

/// Camera, light and pipeline selection for a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub eye: Vec3f,
    pub center: Vec3f,
    /// Light position in world space.
    pub light: Vec3f,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Signed near plane position on the view Z axis.
    pub near: f32,
    /// Signed far plane position on the view Z axis.
    pub far: f32,
    /// Number of distinct integer depth levels between the far and near planes.
    pub depth_resolution: f32,
    pub shading: ShadingModel,
    pub primitive: PrimitiveMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        return RenderSettings {
            eye: Vec3f::new(0.0, 0.0, 3.0),
            center: Vec3f::ZERO,
            light: Vec3f::new(1.0, 1.0, 3.0),
            fov: 45.0,
            near: -1.0,
            far: -100.0,
            depth_resolution: 65535.0,
            shading: ShadingModel::default(),
            primitive: PrimitiveMode::default(),
        };
    }
}

impl RenderSettings {
    /// View, projection and viewport for a `width` x `height` surface.
    pub fn transforms(&self, width: u32, height: u32) -> Transforms {
        let aspect_ratio = if height == 0 { 1.0 } else { width as f32 / height as f32 };
        return Transforms {
            view: look_at(self.eye, self.center),
            projection: perspective_project(self.near, self.far, self.fov, aspect_ratio),
            viewport: viewport_with_depth(width as f32, height as f32, self.depth_resolution),
        };
    }
}

/// The three matrices a vertex goes through, in application order reversed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Mat4,
}

impl Transforms {
    /// `viewport * projection * view`.
    pub fn combined(&self) -> Mat4 {
        return self.viewport * self.projection * self.view;
    }
}

/// Counters for the last rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame_time: Duration,
    /// Faces submitted.
    pub faces: usize,
    pub drawn: usize,
    /// Rejected by the backface test.
    pub culled: usize,
    /// Entirely outside the surface, or beyond the wireframe guard band.
    pub clipped: usize,
    /// Degenerate: non-finite vertex, zero screen area, or no tangent frame for normal mapping.
    pub skipped: usize,
    /// Fragments that passed the depth test.
    pub fragments: usize,
}

impl FrameStats {
    pub fn fps(&self) -> f32 {
        let seconds = self.frame_time.as_secs_f32();
        if seconds <= 0.0 {
            return 0.0;
        }
        return 1.0 / seconds;
    }
}

/// Where the render loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    VertexTransform,
    WireframeDraw,
    Rasterize,
    /// The finished frame is handed out for presentation.
    Present,
}

/// Per-triangle attributes for the rasterizer.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Screen-space positions, z is the depth value.
    pub screen: [Vec3f; 3],
    /// Object-space positions.
    pub positions: [Vec3f; 3],
    pub normals: [Vec3f; 3],
    pub uvs: [Vec2f; 3],
}

/// Result of submitting one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rasterized {
    Culled,
    Clipped,
    Skipped,
    Drawn { fragments: usize },
}

/// Rasterizes one filled triangle into `frame` with `shader`.
///
/// Pixels are kept when every barycentric weight reaches
/// [`util::INSIDE_EPSILON`] and the rounded interpolated depth is strictly
/// greater than the stored one. The depth buffer is updated before the
/// fragment stage runs, so discarded fragments still occlude.
pub fn draw_triangle(
    frame: &mut FrameBuffer,
    shader: &Shader<'_>,
    triangle: &Triangle,
) -> Rasterized {
    let bounds = BoundingBox::of_triangle(&triangle.screen);
    let bbox = match bounds.clip(frame.width(), frame.height()) {
        Some(bbox) => bbox,
        None => return Rasterized::Clipped,
    };

    let mut shader = shader.clone();
    match tangent_basis(&triangle.positions, &triangle.uvs) {
        Some((tangent, bitangent)) => {
            shader.set_vec3(VectorSlot::Tangent, tangent);
            shader.set_vec3(VectorSlot::Bitangent, bitangent);
        }
        None if shader.model() == ShadingModel::NormalMapped => return Rasterized::Skipped,
        None => {
            shader.set_vec3(VectorSlot::Tangent, Vec3f::ZERO);
            shader.set_vec3(VectorSlot::Bitangent, Vec3f::ZERO);
        }
    }

    if is_backfacing(&triangle.screen) {
        return Rasterized::Culled;
    }
    let [a, _, _] = triangle.screen;
    if barycentric(&triangle.screen, a.x, a.y).is_none() {
        return Rasterized::Skipped;
    }

    let width = frame.width() as usize;
    let (x_min, x_max) = (bbox.x_min as usize, bbox.x_max as usize);
    let (depth_rows, color_rows) = frame.rows_mut(bbox.y_min as u32, bbox.y_max as u32);
    let depths = triangle.screen.map(|p| p.z);
    let depths = Vec3f::new(depths[0], depths[1], depths[2]);

    let fragments = depth_rows
        .par_chunks_mut(width)
        .zip(color_rows.par_chunks_mut(width).rev())
        .enumerate()
        .map(|(row, (depth_row, color_row))| {
            let y = (bbox.y_min as usize + row) as f32;
            let mut shader = shader.clone();
            let mut shaded: usize = 0;
            for x in x_min..=x_max {
                let weights = match barycentric(&triangle.screen, x as f32, y) {
                    Some(weights) if is_inside(weights) => weights,
                    _ => continue,
                };
                let z = weights.dot(depths).round() as i32;
                if depth_row[x] >= z {
                    continue;
                }
                depth_row[x] = z;
                shaded += 1;

                shader.set_vec3(VectorSlot::Fragment, interpolate(&triangle.positions, weights));
                shader.set_vec3(VectorSlot::Normal, interpolate(&triangle.normals, weights));
                shader.set_uv(interpolate_uv(&triangle.uvs, weights));
                if let Some(color) = shader.fragment() {
                    color_row[x] = color.pack();
                }
            }
            return shaded;
        })
        .sum();

    return Rasterized::Drawn { fragments };
}

/// Owns the mesh, the bound textures and the output surface, and renders frames.
#[derive(Debug)]
pub struct Renderer {
    mesh: Mesh,
    textures: HashMap<TextureSlot, Texture>,
    frame: FrameBuffer,
    settings: RenderSettings,
    stats: FrameStats,
    stage: Stage,
}

impl Renderer {
    pub fn new(mesh: Mesh, settings: RenderSettings) -> Renderer {
        return Renderer {
            mesh,
            textures: HashMap::new(),
            frame: FrameBuffer::default(),
            settings,
            stats: FrameStats::default(),
            stage: Stage::Idle,
        };
    }

    pub fn mesh(&self) -> &Mesh {
        return &self.mesh;
    }

    pub fn settings(&self) -> &RenderSettings {
        return &self.settings;
    }

    /// Takes effect on the next frame.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
    }

    pub fn set_shading_model(&mut self, model: ShadingModel) {
        self.settings.shading = model;
    }

    pub fn set_primitive_mode(&mut self, mode: PrimitiveMode) {
        self.settings.primitive = mode;
    }

    /// Binds `texture` to `slot`, or unbinds it with `None`. Returns the
    /// texture previously bound there.
    pub fn set_texture(&mut self, slot: TextureSlot, texture: Option<Texture>) -> Option<Texture> {
        return match texture {
            Some(texture) => self.textures.insert(slot, texture),
            None => self.textures.remove(&slot),
        };
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&Texture> {
        return self.textures.get(&slot);
    }

    /// Output of the last frame.
    pub fn frame(&self) -> &FrameBuffer {
        return &self.frame;
    }

    pub fn stats(&self) -> &FrameStats {
        return &self.stats;
    }

    pub fn stage(&self) -> Stage {
        return self.stage;
    }

    /// Renders a frame with the camera from the current settings.
    pub fn render(&mut self, width: u32, height: u32) -> Result<&FrameBuffer> {
        let transforms = self.settings.transforms(width, height);
        return self.render_with(width, height, &transforms);
    }

    /// Renders a frame with explicit matrices. The surface is reallocated if
    /// the size changed and cleared either way.
    pub fn render_with(
        &mut self,
        width: u32,
        height: u32,
        transforms: &Transforms,
    ) -> Result<&FrameBuffer> {
        let start = Instant::now();
        enter(&mut self.stage, Stage::Idle);
        self.frame.resize(width, height)?;
        self.frame.clear();

        let Renderer {
            mesh,
            textures,
            frame,
            settings,
            stats,
            stage,
        } = self;
        *stats = FrameStats {
            faces: mesh.face_count(),
            ..FrameStats::default()
        };

        enter(stage, Stage::VertexTransform);
        let mvp = transforms.combined();
        let mut shader = Shader::new(settings.shading);
        shader.set_vec3(VectorSlot::Eye, settings.eye);
        shader.set_vec3(VectorSlot::Light, settings.light);
        shader.set_mat4(MatrixSlot::Mvp, mvp);
        for slot in TextureSlot::ALL {
            shader.set_texture(slot, textures.get(&slot));
        }

        let screen: Vec<Option<[Vec3f; 3]>> = mesh
            .faces()
            .iter()
            .map(|face| {
                let mut corners = [Vec3f::ZERO; 3];
                for (corner, &index) in corners.iter_mut().zip(&face.vertices) {
                    shader.set_vec3(VectorSlot::Vertex, mesh.vertex(index));
                    *corner = shader.vertex()?;
                }
                return Some(corners);
            })
            .collect();

        match settings.primitive {
            PrimitiveMode::Wireframe => {
                enter(stage, Stage::WireframeDraw);
                draw_wireframe(frame, &screen, stats);
            }
            PrimitiveMode::Filled => {
                enter(stage, Stage::Rasterize);
                for (face, screen) in mesh.faces().iter().zip(&screen) {
                    let screen = match screen {
                        Some(screen) => *screen,
                        None => {
                            stats.skipped += 1;
                            continue;
                        }
                    };
                    let triangle = Triangle {
                        screen,
                        positions: face.vertices.map(|i| mesh.vertex(i)),
                        normals: face.normals.map(|i| mesh.normal(i)),
                        uvs: face.textures.map(|i| mesh.texture_coord(i)),
                    };
                    match draw_triangle(frame, &shader, &triangle) {
                        Rasterized::Culled => stats.culled += 1,
                        Rasterized::Clipped => stats.clipped += 1,
                        Rasterized::Skipped => stats.skipped += 1,
                        Rasterized::Drawn { fragments } => {
                            stats.drawn += 1;
                            stats.fragments += fragments;
                        }
                    }
                }
            }
        }

        enter(stage, Stage::Present);
        stats.frame_time = start.elapsed();
        debug!(
            faces = stats.faces,
            drawn = stats.drawn,
            culled = stats.culled,
            clipped = stats.clipped,
            skipped = stats.skipped,
            fragments = stats.fragments,
            frame_ms = stats.frame_time.as_secs_f64() * 1000.0,
            "Frame rendered"
        );
        return Ok(&self.frame);
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    trace!(from = ?*stage, to = ?next, "Render stage");
    *stage = next;
}

/// Draws the edges of every transformed face in white, ignoring depth.
fn draw_wireframe(frame: &mut FrameBuffer, screen: &[Option<[Vec3f; 3]>], stats: &mut FrameStats) {
    let (width, height) = (frame.width() as f32, frame.height() as f32);
    let in_guard_band = |p: &Vec3f| {
        p.x >= -GUARD_BAND * width
            && p.x <= (GUARD_BAND + 1.0) * width
            && p.y >= -GUARD_BAND * height
            && p.y <= (GUARD_BAND + 1.0) * height
    };
    let white = Color::WHITE.pack();

    for corners in screen {
        let corners = match corners {
            Some(corners) => corners,
            None => {
                stats.skipped += 1;
                continue;
            }
        };
        if !corners.iter().all(in_guard_band) {
            stats.clipped += 1;
            continue;
        }
        for i in 0..3 {
            let (from, to) = (corners[i], corners[(i + 1) % 3]);
            frame.draw_line(
                from.x.round() as i32,
                from.y.round() as i32,
                to.x.round() as i32,
                to.y.round() as i32,
                white,
            );
        }
        stats.drawn += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::viewport;

    /// Counter-clockwise quad from two triangles, covering NDC x/y in [-0.5, 0.5].
    const QUAD: &str = "\
v -0.5 -0.5 0.0
v 0.5 -0.5 0.0
v 0.5 0.5 0.0
v -0.5 0.5 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    fn flat(width: u32, height: u32) -> Transforms {
        Transforms {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            viewport: viewport(width as f32, height as f32),
        }
    }

    fn unlit_renderer(source: &str) -> Renderer {
        let settings = RenderSettings {
            shading: ShadingModel::Unlit,
            ..RenderSettings::default()
        };
        Renderer::new(source.parse().unwrap(), settings)
    }

    fn screen_triangle(points: [(f32, f32); 3]) -> Triangle {
        let screen = points.map(|(x, y)| Vec3f::new(x, y, 0.0));
        Triangle {
            screen,
            positions: screen,
            normals: [Vec3f::new(0.0, 0.0, 1.0); 3],
            uvs: [Vec2f::new(0.0, 0.0), Vec2f::new(1.0, 0.0), Vec2f::new(0.0, 1.0)],
        }
    }

    #[test]
    fn parses_primitive_modes() {
        assert_eq!("wireframe".parse::<PrimitiveMode>().unwrap(), PrimitiveMode::Wireframe);
        assert_eq!("filled".parse::<PrimitiveMode>().unwrap(), PrimitiveMode::Filled);
        assert!(matches!(
            "points".parse::<PrimitiveMode>(),
            Err(Error::UnknownPrimitiveMode(_))
        ));
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let json = r#"{ "shading": "normal_mapped", "eye": { "x": 1.0, "y": 2.0, "z": 3.0 } }"#;
        let settings: RenderSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.shading, ShadingModel::NormalMapped);
        assert_eq!(settings.eye, Vec3f::new(1.0, 2.0, 3.0));
        assert_eq!(settings.fov, 45.0);
        assert_eq!(settings.primitive, PrimitiveMode::Filled);
    }

    #[test]
    fn clockwise_triangle_is_culled() {
        let mut frame = FrameBuffer::new(16, 16).unwrap();
        let shader = Shader::new(ShadingModel::Unlit);
        let clockwise = screen_triangle([(0.0, 0.0), (0.0, 10.0), (10.0, 0.0)]);
        assert_eq!(draw_triangle(&mut frame, &shader, &clockwise), Rasterized::Culled);
        assert!(frame.pixels().iter().all(|&p| p == 0));

        let counter_clockwise = screen_triangle([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        assert!(matches!(
            draw_triangle(&mut frame, &shader, &counter_clockwise),
            Rasterized::Drawn { fragments } if fragments > 0
        ));
    }

    #[test]
    fn redrawing_at_equal_depth_changes_nothing() {
        let white = Texture::solid(2, 2, [255, 255, 255, 255]).unwrap();
        let red = Texture::solid(2, 2, [255, 0, 0, 255]).unwrap();
        let mut frame = FrameBuffer::new(16, 16).unwrap();
        let triangle = screen_triangle([(1.0, 1.0), (14.0, 2.0), (5.0, 13.0)]);

        let mut shader = Shader::new(ShadingModel::Unlit);
        shader.set_texture(TextureSlot::Diffuse, Some(&white));
        draw_triangle(&mut frame, &shader, &triangle);
        let first = frame.pixels().to_vec();

        shader.set_texture(TextureSlot::Diffuse, Some(&red));
        assert_eq!(
            draw_triangle(&mut frame, &shader, &triangle),
            Rasterized::Drawn { fragments: 0 }
        );
        assert_eq!(frame.pixels(), &first[..]);
    }

    #[test]
    fn nearer_triangle_wins() {
        let mut frame = FrameBuffer::new(8, 8).unwrap();
        let white = Texture::solid(1, 1, [255, 255, 255, 255]).unwrap();
        let red = Texture::solid(1, 1, [255, 0, 0, 255]).unwrap();
        let mut shader = Shader::new(ShadingModel::Unlit);

        let mut near = screen_triangle([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)]);
        near.screen.iter_mut().for_each(|p| p.z = 10.0);
        let far = screen_triangle([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)]);

        shader.set_texture(TextureSlot::Diffuse, Some(&white));
        draw_triangle(&mut frame, &shader, &near);
        shader.set_texture(TextureSlot::Diffuse, Some(&red));
        draw_triangle(&mut frame, &shader, &far);
        assert_eq!(frame.pixel(2, 2), Some(Color::WHITE.pack()));
        assert_eq!(frame.depth(2, 2), Some(10));
    }

    #[test]
    fn offscreen_triangle_is_clipped() {
        let mut frame = FrameBuffer::new(8, 8).unwrap();
        let shader = Shader::new(ShadingModel::Unlit);
        let triangle = screen_triangle([(20.0, 20.0), (30.0, 20.0), (20.0, 30.0)]);
        assert_eq!(draw_triangle(&mut frame, &shader, &triangle), Rasterized::Clipped);
    }

    #[test]
    fn normal_mapping_skips_degenerate_uvs() {
        let mut frame = FrameBuffer::new(8, 8).unwrap();
        let mut triangle = screen_triangle([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)]);
        triangle.uvs = [Vec2f::new(0.5, 0.5); 3];

        let shader = Shader::new(ShadingModel::NormalMapped);
        assert_eq!(draw_triangle(&mut frame, &shader, &triangle), Rasterized::Skipped);
        let shader = Shader::new(ShadingModel::Unlit);
        assert!(matches!(
            draw_triangle(&mut frame, &shader, &triangle),
            Rasterized::Drawn { .. }
        ));
    }

    #[test]
    fn renders_quad_and_counts_faces() {
        let mut renderer = unlit_renderer(QUAD);
        assert_eq!(renderer.stage(), Stage::Idle);
        renderer.render_with(20, 20, &flat(20, 20)).unwrap();

        let stats = *renderer.stats();
        assert_eq!((stats.faces, stats.drawn, stats.culled, stats.skipped), (2, 2, 0, 0));
        assert!(stats.fragments > 0);
        assert_eq!(renderer.stage(), Stage::Present);

        let frame = renderer.frame();
        // (10, 10) sits on the shared diagonal, which neither triangle fills.
        assert_eq!(frame.pixel(12, 8), Some(Color::WHITE.pack()));
        assert_eq!(frame.pixel(8, 12), Some(Color::WHITE.pack()));
        assert_eq!(frame.pixel(10, 10), Some(0));
        assert_eq!(frame.pixel(2, 2), Some(0));
        assert_eq!(frame.pixel(17, 17), Some(0));
    }

    #[test]
    fn resize_between_frames_reallocates() {
        let mut renderer = unlit_renderer(QUAD);
        renderer.render_with(20, 20, &flat(20, 20)).unwrap();
        renderer.render_with(40, 10, &flat(40, 10)).unwrap();
        let frame = renderer.frame();
        assert_eq!((frame.width(), frame.height()), (40, 10));
        assert_eq!(frame.pixels().len(), 400);
        assert_eq!(frame.pixel(25, 4), Some(Color::WHITE.pack()));
    }

    #[test]
    fn wireframe_draws_edges_only() {
        let mut renderer = unlit_renderer(QUAD);
        renderer.set_primitive_mode(PrimitiveMode::Wireframe);
        renderer.render_with(20, 20, &flat(20, 20)).unwrap();

        let frame = renderer.frame();
        let white = Color::WHITE.pack();
        // Corners of the quad land on (5, 5) and (15, 15).
        assert_eq!(frame.pixel(5, 5), Some(white));
        assert_eq!(frame.pixel(15, 15), Some(white));
        assert_eq!(frame.pixel(10, 5), Some(white));
        assert_eq!(frame.pixel(7, 12), Some(0));
        assert_eq!(renderer.stats().drawn, 2);
    }

    #[test]
    fn wireframe_counts_far_off_screen_triangles_as_clipped() {
        let source = "\
v -0.5 -0.5 0.0
v 0.5 -0.5 0.0
v 0.0 0.5 0.0
v 0.0 1000.0 0.0
vt 0.0 0.0
vn 0.0 0.0 1.0
f 1/1/1 2/1/1 3/1/1
f 1/1/1 2/1/1 4/1/1
";
        let mut renderer = unlit_renderer(source);
        renderer.set_primitive_mode(PrimitiveMode::Wireframe);
        renderer.render_with(10, 10, &flat(10, 10)).unwrap();

        let stats = renderer.stats();
        assert_eq!((stats.drawn, stats.clipped, stats.skipped), (1, 1, 0));
        // Only the first triangle's edges are drawn; its apex stops at row 8.
        assert_eq!(renderer.frame().pixel(5, 9), Some(0));
    }

    #[test]
    fn backfaces_are_culled_by_the_renderer() {
        let clockwise = "v 0 0 0\nv 0 0.5 0\nv 0.5 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
        let mut renderer = unlit_renderer(clockwise);
        renderer.render_with(10, 10, &flat(10, 10)).unwrap();
        assert_eq!(renderer.stats().culled, 1);
        assert!(renderer.frame().pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn degenerate_projection_skips_faces() {
        let mut renderer = unlit_renderer(QUAD);
        let transforms = Transforms {
            projection: Mat4::zeros(),
            ..flat(10, 10)
        };
        renderer.render_with(10, 10, &transforms).unwrap();
        assert_eq!(renderer.stats().skipped, 2);
        assert_eq!(renderer.stats().drawn, 0);
    }

    #[test]
    fn texture_slots_are_replaced_wholesale() {
        let mut renderer = unlit_renderer(QUAD);
        let red = Texture::solid(1, 1, [255, 0, 0, 255]).unwrap();
        let blue = Texture::solid(1, 1, [0, 0, 255, 255]).unwrap();
        assert!(renderer.set_texture(TextureSlot::Diffuse, Some(red)).is_none());
        let previous = renderer.set_texture(TextureSlot::Diffuse, Some(blue)).unwrap();
        assert_eq!(previous.data(), &[255, 0, 0, 255]);

        renderer.render_with(20, 20, &flat(20, 20)).unwrap();
        assert_eq!(renderer.frame().pixel(12, 8), Some(Color::rgb(0, 0, 255).pack()));

        assert!(renderer.set_texture(TextureSlot::Diffuse, None).is_some());
        assert!(renderer.texture(TextureSlot::Diffuse).is_none());
    }

    #[test]
    fn default_camera_sees_the_quad() {
        let mut renderer = unlit_renderer(QUAD);
        renderer.render(32, 32).unwrap();
        assert_eq!(renderer.stats().drawn, 2);
        assert_eq!(renderer.frame().pixel(18, 14), Some(Color::WHITE.pack()));
        assert!(renderer.frame().depth(18, 14).unwrap() > 0);
    }

    #[test]
    fn fps_from_frame_time() {
        let stats = FrameStats {
            frame_time: Duration::from_millis(20),
            ..FrameStats::default()
        };
        assert!((stats.fps() - 50.0).abs() < 1e-3);
        assert_eq!(FrameStats::default().fps(), 0.0);
    }
}
