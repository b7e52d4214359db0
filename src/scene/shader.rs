use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::util::reflect;
use crate::error::Error;
use crate::image::Color;
use crate::math::{Mat3, Mat4, Vec2f, Vec3f};
use crate::texture::Texture;

/// Ambient term of the Phong models.
const AMBIENT: f32 = 0.05;
/// Specular exponent of the Phong models.
const SHININESS: i32 = 32;

/// Lighting model evaluated by the fragment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingModel {
    /// Raw diffuse texture.
    Unlit,
    /// Lambert term from the object-space normal map.
    Diffuse,
    /// Ambient, Lambert and a specular highlight from the specular map.
    #[default]
    Phong,
    /// Phong evaluated in tangent space with a tangent-space normal map.
    NormalMapped,
}

impl ShadingModel {
    pub const ALL: [ShadingModel; 4] = [
        ShadingModel::Unlit,
        ShadingModel::Diffuse,
        ShadingModel::Phong,
        ShadingModel::NormalMapped,
    ];

    pub fn name(self) -> &'static str {
        return match self {
            ShadingModel::Unlit => "unlit",
            ShadingModel::Diffuse => "diffuse",
            ShadingModel::Phong => "phong",
            ShadingModel::NormalMapped => "normal_mapped",
        };
    }
}

impl fmt::Display for ShadingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.name());
    }
}

impl FromStr for ShadingModel {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        return ShadingModel::ALL
            .into_iter()
            .find(|model| model.name() == name)
            .ok_or_else(|| Error::UnknownShadingModel(name.to_string()));
    }
}

/// Vector uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSlot {
    Eye,
    Light,
    /// Object-space position consumed by the vertex stage.
    Vertex,
    /// Interpolated object-space position of the current fragment.
    Fragment,
    Normal,
    Tangent,
    Bitangent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSlot {
    Mvp,
    MvpInverseTranspose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse,
    /// Object-space normal map.
    Normal,
    /// Tangent-space normal map.
    NormalTangent,
    Specular,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 4] = [
        TextureSlot::Diffuse,
        TextureSlot::Normal,
        TextureSlot::NormalTangent,
        TextureSlot::Specular,
    ];

    /// Suffix of the texture file next to a `<stem>.obj` model.
    pub fn file_suffix(self) -> &'static str {
        return match self {
            TextureSlot::Diffuse => "_diffuse",
            TextureSlot::Normal => "_nm",
            TextureSlot::NormalTangent => "_nm_tangent",
            TextureSlot::Specular => "_spec",
        };
    }
}

/// Uniform state plus the vertex and fragment stages.
///
/// The rasterizer writes the per-vertex or per-fragment slots and then calls
/// [`Shader::vertex`] or [`Shader::fragment`]. Textures are borrowed from the
/// renderer for the duration of a frame. Cloning is cheap; every parallel
/// scan row works on its own clone.
#[derive(Debug, Clone)]
pub struct Shader<'t> {
    model: ShadingModel,
    eye: Vec3f,
    light: Vec3f,
    vertex: Vec3f,
    fragment: Vec3f,
    normal: Vec3f,
    tangent: Vec3f,
    bitangent: Vec3f,
    uv: Vec2f,
    mvp: Mat4,
    mvp_inverse_transpose: Mat4,
    diffuse: Option<&'t Texture>,
    normal_map: Option<&'t Texture>,
    normal_tangent_map: Option<&'t Texture>,
    specular: Option<&'t Texture>,
}

impl<'t> Shader<'t> {
    pub fn new(model: ShadingModel) -> Shader<'t> {
        return Shader {
            model,
            eye: Vec3f::ZERO,
            light: Vec3f::ZERO,
            vertex: Vec3f::ZERO,
            fragment: Vec3f::ZERO,
            normal: Vec3f::ZERO,
            tangent: Vec3f::ZERO,
            bitangent: Vec3f::ZERO,
            uv: Vec2f::default(),
            mvp: Mat4::identity(),
            mvp_inverse_transpose: Mat4::identity(),
            diffuse: None,
            normal_map: None,
            normal_tangent_map: None,
            specular: None,
        };
    }

    pub fn model(&self) -> ShadingModel {
        return self.model;
    }

    pub fn set_vec3(&mut self, slot: VectorSlot, value: Vec3f) {
        match slot {
            VectorSlot::Eye => self.eye = value,
            VectorSlot::Light => self.light = value,
            VectorSlot::Vertex => self.vertex = value,
            VectorSlot::Fragment => self.fragment = value,
            VectorSlot::Normal => self.normal = value,
            VectorSlot::Tangent => self.tangent = value,
            VectorSlot::Bitangent => self.bitangent = value,
        }
    }

    pub fn vec3(&self, slot: VectorSlot) -> Vec3f {
        return match slot {
            VectorSlot::Eye => self.eye,
            VectorSlot::Light => self.light,
            VectorSlot::Vertex => self.vertex,
            VectorSlot::Fragment => self.fragment,
            VectorSlot::Normal => self.normal,
            VectorSlot::Tangent => self.tangent,
            VectorSlot::Bitangent => self.bitangent,
        };
    }

    /// Interpolated normalized texture coordinate of the current fragment.
    pub fn set_uv(&mut self, uv: Vec2f) {
        self.uv = uv;
    }

    pub fn uv(&self) -> Vec2f {
        return self.uv;
    }

    pub fn set_mat4(&mut self, slot: MatrixSlot, value: Mat4) {
        match slot {
            MatrixSlot::Mvp => self.mvp = value,
            MatrixSlot::MvpInverseTranspose => self.mvp_inverse_transpose = value,
        }
    }

    pub fn mat4(&self, slot: MatrixSlot) -> Mat4 {
        return match slot {
            MatrixSlot::Mvp => self.mvp,
            MatrixSlot::MvpInverseTranspose => self.mvp_inverse_transpose,
        };
    }

    pub fn set_texture(&mut self, slot: TextureSlot, texture: Option<&'t Texture>) {
        match slot {
            TextureSlot::Diffuse => self.diffuse = texture,
            TextureSlot::Normal => self.normal_map = texture,
            TextureSlot::NormalTangent => self.normal_tangent_map = texture,
            TextureSlot::Specular => self.specular = texture,
        }
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&'t Texture> {
        return match slot {
            TextureSlot::Diffuse => self.diffuse,
            TextureSlot::Normal => self.normal_map,
            TextureSlot::NormalTangent => self.normal_tangent_map,
            TextureSlot::Specular => self.specular,
        };
    }

    /// Vertex stage: screen-space position of the `Vertex` slot after the
    /// perspective divide. `None` if the divide is degenerate.
    pub fn vertex(&self) -> Option<Vec3f> {
        return (self.mvp * self.vertex.to_point()).to_cartesian();
    }

    /// Fragment stage. `None` discards the fragment: unlit by the Lambert term
    /// in the diffuse model, or any non-finite result.
    pub fn fragment(&self) -> Option<Color> {
        let color = match self.model {
            ShadingModel::Unlit => self.diffuse_color(),
            ShadingModel::Diffuse => {
                let n = self.object_normal();
                let l = (self.light - self.fragment).normalize();
                let intensity = n.dot(l).max(0.0);
                if intensity <= 0.0 {
                    return None;
                }
                self.diffuse_color() * intensity
            }
            ShadingModel::Phong => {
                self.phong(self.object_normal(), self.light, self.eye, self.fragment)
            }
            ShadingModel::NormalMapped => {
                let tbn = self.tangent_frame()?;
                let n = match self.normal_tangent_map {
                    Some(map) => decode_normal(map.sample_uv(self.uv)),
                    None => Vec3f::new(0.0, 0.0, 1.0),
                };
                self.phong(n, tbn * self.light, tbn * self.eye, tbn * self.fragment)
            }
        };
        return Color::from_rgb_f32(color);
    }

    fn diffuse_color(&self) -> Vec3f {
        return match self.diffuse {
            Some(texture) => texture.sample_uv(self.uv),
            None => Vec3f::new(255.0, 255.0, 255.0),
        };
    }

    fn specular_color(&self) -> Vec3f {
        return match self.specular {
            Some(texture) => texture.sample_uv(self.uv),
            None => Vec3f::ZERO,
        };
    }

    /// Normal from the object-space normal map, or the interpolated vertex normal.
    fn object_normal(&self) -> Vec3f {
        return match self.normal_map {
            Some(map) => decode_normal(map.sample_uv(self.uv)),
            None => self.normal.normalize(),
        };
    }

    /// Rotation into the fragment's tangent space: rows are T, B, N.
    fn tangent_frame(&self) -> Option<Mat3> {
        let n = self.normal.try_normalize().ok()?;
        // Gram-Schmidt keeps the frame orthonormal after interpolation.
        let t = (self.tangent - n * n.dot(self.tangent)).try_normalize().ok()?;
        let mut b = n.cross(t);
        if b.dot(self.bitangent) < 0.0 {
            b = -b;
        }
        return Some(Mat3::from_rows([
            [t.x, t.y, t.z],
            [b.x, b.y, b.z],
            [n.x, n.y, n.z],
        ]));
    }

    fn phong(&self, n: Vec3f, light: Vec3f, eye: Vec3f, fragment: Vec3f) -> Vec3f {
        let l = (light - fragment).normalize();
        let v = (eye - fragment).normalize();
        let r = reflect(-l, n).normalize();
        let diffuse = n.dot(l).max(0.0);
        let specular = v.dot(r).max(0.0).powi(SHININESS);
        return self.diffuse_color() * (AMBIENT + diffuse) + self.specular_color() * specular;
    }
}

/// Unpacks a normal-map texel from `[0, 255]` to a unit vector.
fn decode_normal(texel: Vec3f) -> Vec3f {
    return (texel * 2.0 - Vec3f::new(255.0, 255.0, 255.0)).normalize();
}
