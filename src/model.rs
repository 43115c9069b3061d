//! CPU-side description of a loaded model.

use crate::color::{Color, Rgb, WHITE};
use std::collections::HashMap;

/// Where the shader's color input comes from for one geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorSource {
    /// One RGB triple per vertex, laid out with the same stride as positions.
    PerVertex(Vec<f32>),
    /// A single value used for every vertex.
    Constant(Color),
}

impl Default for ColorSource {
    fn default() -> Self {
        ColorSource::Constant(WHITE)
    }
}

/// A drawable chunk of a model sharing a single material.
///
/// Vertex data is not indexed: every consecutive three positions form a triangle.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    /// Flat `x, y, z` positions.
    pub positions: Vec<f32>,
    /// Flat `x, y, z` normals, always as long as `positions`.
    pub normals: Vec<f32>,
    /// Vertex colors.
    pub colors: ColorSource,
    /// Key into [`Model::materials`].
    pub material: String,
}

impl Geometry {
    /// Builds a geometry, filling in whatever the source file left out.
    ///
    /// Normals are computed per triangle when they are missing or do not match the
    /// positions. Vertex colors are kept only when there is one triple per vertex,
    /// otherwise a flat white color is substituted.
    pub fn new(
        positions: Vec<f32>,
        normals: Option<Vec<f32>>,
        colors: Option<Vec<f32>>,
        material: impl Into<String>,
    ) -> Geometry {
        let normals = match normals {
            Some(ns) if ns.len() == positions.len() => ns,
            _ => Self::compute_flat_normals(&positions),
        };

        let colors = match colors {
            Some(cs) if cs.len() == positions.len() => ColorSource::PerVertex(cs),
            _ => ColorSource::Constant(WHITE),
        };

        Geometry {
            positions,
            normals,
            colors,
            material: material.into(),
        }
    }

    /// Number of vertices of this geometry.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Computes one normal per triangle and assigns it to its three vertices.
    pub fn compute_flat_normals(positions: &[f32]) -> Vec<f32> {
        let mut normals = vec![0.0; positions.len()];

        for (tri, out) in positions
            .chunks_exact(9)
            .zip(normals.chunks_exact_mut(9))
        {
            let a = glamx::Vec3::new(tri[0], tri[1], tri[2]);
            let b = glamx::Vec3::new(tri[3], tri[4], tri[5]);
            let c = glamx::Vec3::new(tri[6], tri[7], tri[8]);
            let n = (b - a).cross(c - a).normalize_or_zero();

            for v in out.chunks_exact_mut(3) {
                v.copy_from_slice(&[n.x, n.y, n.z]);
            }
        }

        normals
    }
}

/// Surface properties read from an MTL file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// Name given by `newmtl`.
    pub name: String,
    /// `Ka`
    pub ambient: Rgb<f32>,
    /// `Kd`
    pub diffuse: Rgb<f32>,
    /// `Ks`
    pub specular: Rgb<f32>,
    /// `Ke`
    pub emissive: Rgb<f32>,
    /// `Ns`
    pub shininess: f32,
    /// `d`, or `1 - Tr`.
    pub opacity: f32,
    /// `Ni`
    pub optical_density: f32,
    /// `illum`
    pub illum: u32,
}

impl Material {
    /// A material with the MTL defaults and the given name.
    pub fn named(name: impl Into<String>) -> Material {
        Material {
            name: name.into(),
            ..Material::default()
        }
    }

    /// Diffuse color combined with opacity.
    pub fn color(&self) -> Color {
        Color::new(self.diffuse.r, self.diffuse.g, self.diffuse.b, self.opacity)
    }
}

impl Default for Material {
    fn default() -> Self {
        Material {
            name: String::new(),
            ambient: Rgb::new(0.0, 0.0, 0.0),
            diffuse: Rgb::new(1.0, 1.0, 1.0),
            specular: Rgb::new(1.0, 1.0, 1.0),
            emissive: Rgb::new(0.0, 0.0, 0.0),
            shininess: 400.0,
            opacity: 1.0,
            optical_density: 1.0,
            illum: 2,
        }
    }
}

/// A fully parsed OBJ file together with its materials.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Path the OBJ was fetched from.
    pub source_path: String,
    /// Geometries, in file order.
    pub geometries: Vec<Geometry>,
    /// Materials of every referenced MTL file, by name.
    pub materials: HashMap<String, Material>,
}

impl Model {
    /// Resolves the material of a geometry, falling back to the MTL defaults.
    pub fn material_for(&self, geometry: &Geometry) -> Material {
        self.materials
            .get(&geometry.material)
            .cloned()
            .unwrap_or_else(|| Material::named(geometry.material.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_matching_positions_are_kept_per_vertex() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let colors = vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let g = Geometry::new(positions, None, Some(colors.clone()), "m");
        assert_eq!(g.colors, ColorSource::PerVertex(colors));
    }

    #[test]
    fn mismatched_or_missing_colors_fall_back_to_white() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let g = Geometry::new(positions.clone(), None, Some(vec![1.0, 0.0, 0.0]), "m");
        assert_eq!(g.colors, ColorSource::Constant(WHITE));

        let g = Geometry::new(positions, None, None, "m");
        assert_eq!(g.colors, ColorSource::Constant(WHITE));
    }

    #[test]
    fn missing_normals_are_computed_per_triangle() {
        // Counter-clockwise triangle in the XY plane faces +Z.
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let g = Geometry::new(positions, None, None, "m");
        assert_eq!(g.normals, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(g.normals.len(), g.positions.len());
    }

    #[test]
    fn unknown_material_resolves_to_defaults() {
        let model = Model {
            source_path: "a.obj".to_string(),
            geometries: vec![],
            materials: HashMap::new(),
        };
        let g = Geometry::new(vec![], None, None, "missing");
        let m = model.material_for(&g);
        assert_eq!(m.name, "missing");
        assert_eq!(m.shininess, 400.0);
        assert_eq!(m.color(), WHITE);
    }
}
