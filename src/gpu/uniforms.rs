use crate::config::ShadingParams;
use crate::model::Material;
use bytemuck::{Pod, Zeroable};
use glamx::{Mat4, Vec3};

/// Uniforms shared by every part drawn in a frame.
///
/// Layout must match the `FrameUniforms` struct of `viewer.wgsl`:
/// - view: mat4x4<f32> at offset 0
/// - projection: mat4x4<f32> at offset 64
/// - light_direction: vec3<f32> at offset 128
/// - view_world_position: vec3<f32> at offset 144
///
/// Total: 160 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// World to camera space.
    pub view: [[f32; 4]; 4],
    /// Camera to clip space.
    pub projection: [[f32; 4]; 4],
    /// Unit direction towards the directional light.
    pub light_direction: [f32; 3],
    _pad0: f32,
    /// Eye position, also the position of the point light.
    pub view_world_position: [f32; 3],
    _pad1: f32,
}

impl FrameUniforms {
    /// Packs the camera and light of a frame. `light_direction` is normalized here.
    pub fn new(view: Mat4, projection: Mat4, light_direction: Vec3, view_world_position: Vec3) -> Self {
        FrameUniforms {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            light_direction: light_direction.normalize_or_zero().into(),
            _pad0: 0.0,
            view_world_position: view_world_position.into(),
            _pad1: 0.0,
        }
    }
}

/// Uniforms of a single part: its world matrix and its material.
///
/// Layout must match the `PartUniforms` struct of `viewer.wgsl`:
/// - world: mat4x4<f32> at offset 0
/// - normal_matrix: mat4x4<f32> at offset 64
/// - diffuse: vec4<f32> at offset 128 (rgb + opacity)
/// - ambient: vec3<f32> at offset 144, shininess at 156
/// - specular: vec3<f32> at offset 160, ambient_intensity at 172
/// - emissive: vec3<f32> at offset 176, diffuse_intensity at 188
/// - point_light_intensity at 192, toon_threshold at 196
///
/// Total: 208 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PartUniforms {
    /// Model to world space.
    pub world: [[f32; 4]; 4],
    /// Inverse-transpose of `world`, applied to normals.
    pub normal_matrix: [[f32; 4]; 4],
    /// Diffuse color times opacity in alpha.
    pub diffuse: [f32; 4],
    /// Ambient color of the material.
    pub ambient: [f32; 3],
    /// Specular exponent.
    pub shininess: f32,
    /// Specular color of the material.
    pub specular: [f32; 3],
    /// Weight of the ambient term.
    pub ambient_intensity: f32,
    /// Emitted color of the material.
    pub emissive: [f32; 3],
    /// Weight of the directional light.
    pub diffuse_intensity: f32,
    /// Weight of the light at the camera.
    pub point_light_intensity: f32,
    /// Toon quantization step. Disabled when not positive.
    pub toon_threshold: f32,
    _padding: [f32; 2],
}

/// Matrix transforming normals under `world`.
///
/// A singular `world` (a scale of zero on some axis) has no inverse and is used as is.
pub fn normal_matrix(world: Mat4) -> Mat4 {
    if world.determinant().abs() > f32::EPSILON {
        world.inverse().transpose()
    } else {
        world
    }
}

impl PartUniforms {
    /// Packs the world matrix, its normal matrix and the material of a part.
    pub fn new(world: Mat4, material: &Material, shading: &ShadingParams) -> Self {
        let diffuse = material.color();
        PartUniforms {
            world: world.to_cols_array_2d(),
            normal_matrix: normal_matrix(world).to_cols_array_2d(),
            diffuse: [diffuse.r, diffuse.g, diffuse.b, diffuse.a],
            ambient: [material.ambient.r, material.ambient.g, material.ambient.b],
            shininess: material.shininess,
            specular: [material.specular.r, material.specular.g, material.specular.b],
            ambient_intensity: shading.ambient_intensity,
            emissive: [material.emissive.r, material.emissive.g, material.emissive.b],
            diffuse_intensity: shading.diffuse_intensity,
            point_light_intensity: shading.point_light_intensity,
            toon_threshold: shading.toon_threshold,
            _padding: [0.0; 2],
        }
    }

    /// The world matrix as a `Mat4`.
    #[inline]
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world)
    }
}
