//! Axis-aligned bounds of models and the camera framing derived from them.

use crate::error::{Result, ViewerError};
use crate::model::Geometry;
use glamx::Vec3;

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extents {
    /// Smallest coordinate along each axis.
    pub min: Vec3,
    /// Largest coordinate along each axis.
    pub max: Vec3,
}

impl Extents {
    /// The box an empty fold starts from: +∞ minimum, −∞ maximum.
    pub const EMPTY: Extents = Extents {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Bounds of a flat `x, y, z` position array.
    ///
    /// Returns `None` if there is not a single full triple.
    pub fn from_positions(positions: &[f32]) -> Option<Extents> {
        let mut triples = positions.chunks_exact(3);
        let first = triples.next()?;
        let seed = Vec3::new(first[0], first[1], first[2]);

        Some(triples.fold(
            Extents {
                min: seed,
                max: seed,
            },
            |acc, p| {
                let p = Vec3::new(p[0], p[1], p[2]);
                Extents {
                    min: acc.min.min(p),
                    max: acc.max.max(p),
                }
            },
        ))
    }

    /// Bounds of all the geometries of a model.
    ///
    /// An empty slice yields [`Extents::EMPTY`], which callers must reject (see
    /// [`is_degenerate`](Self::is_degenerate)).
    pub fn from_geometries(geometries: &[Geometry]) -> Extents {
        geometries
            .iter()
            .filter_map(|g| Extents::from_positions(&g.positions))
            .fold(Extents::EMPTY, |acc, e| acc.merge(&e))
    }

    /// Smallest box containing both `self` and `other`.
    #[inline]
    pub fn merge(&self, other: &Extents) -> Extents {
        Extents {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// `true` if the box does not enclose any point.
    pub fn is_degenerate(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite()) || self.min.cmpgt(self.max).any()
    }

    /// Size of the box along each axis.
    #[inline]
    pub fn range(&self) -> Vec3 {
        self.max - self.min
    }

    /// Translation that moves the center of the box to the origin.
    #[inline]
    pub fn centering_offset(&self) -> Vec3 {
        -(self.min + self.range() * 0.5)
    }

    /// The box moved by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec3) -> Extents {
        Extents {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Camera placement that keeps a whole model in view.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraFraming {
    /// Eye position.
    pub position: Vec3,
    /// Point looked at.
    pub target: Vec3,
    /// Distance between the eye and the target.
    pub radius: f32,
    /// Near clipping plane.
    pub znear: f32,
    /// Far clipping plane.
    pub zfar: f32,
}

impl CameraFraming {
    /// Margin applied to the bounding diagonal so that it fits in the view.
    pub const MARGIN: f32 = 1.2;

    /// Frames a box already centered at the origin.
    ///
    /// A box that encloses nothing, or collapses to a single point, cannot be framed.
    pub fn from_extents(extents: &Extents, source: &str) -> Result<CameraFraming> {
        let radius = extents.range().length() * Self::MARGIN;
        if extents.is_degenerate() || !(radius > f32::EPSILON) {
            return Err(ViewerError::DegenerateExtents {
                path: source.to_string(),
            });
        }

        let target = Vec3::ZERO;

        Ok(CameraFraming {
            position: target + Vec3::new(0.0, 0.0, radius),
            target,
            radius,
            znear: radius / 100.0,
            zfar: radius * 3.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn random_positions(rng: &mut impl Rng, count: usize) -> Vec<f32> {
        (0..count * 3).map(|_| rng.random_range(-1000.0..1000.0)).collect()
    }

    #[test]
    fn every_component_lies_within_the_bounds() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let count = rng.random_range(1..200);
            let positions = random_positions(&mut rng, count);
            let e = Extents::from_positions(&positions).unwrap();

            for p in positions.chunks_exact(3) {
                for axis in 0..3 {
                    assert!(e.min[axis] <= p[axis]);
                    assert!(p[axis] <= e.max[axis]);
                }
            }
        }
    }

    #[test]
    fn axes_are_updated_independently() {
        let e = Extents::from_positions(&[1.0, -2.0, 3.0, -1.0, 5.0, 0.0]).unwrap();
        assert_eq!(e.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(e.max, Vec3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn single_geometry_model_matches_its_geometry() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let positions = random_positions(&mut rng, 30);
        let geometry = Geometry::new(positions.clone(), None, None, "m");

        assert_eq!(
            Extents::from_geometries(std::slice::from_ref(&geometry)),
            Extents::from_positions(&positions).unwrap()
        );
    }

    #[test]
    fn empty_model_is_degenerate_and_cannot_be_framed() {
        let e = Extents::from_geometries(&[]);
        assert_eq!(e, Extents::EMPTY);
        assert!(e.is_degenerate());
        assert_eq!(
            CameraFraming::from_extents(&e, "empty.obj"),
            Err(ViewerError::DegenerateExtents {
                path: "empty.obj".to_string()
            })
        );
        assert!(Extents::from_positions(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn model_collapsed_to_a_point_cannot_be_framed() {
        let e = Extents::from_positions(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(!e.is_degenerate());
        assert_eq!(
            CameraFraming::from_extents(&e.translated(e.centering_offset()), "point.obj"),
            Err(ViewerError::DegenerateExtents {
                path: "point.obj".to_string()
            })
        );
    }

    #[test]
    fn flat_model_can_still_be_framed() {
        let e = Extents::from_positions(&[-1.0, 0.0, -1.0, 1.0, 0.0, 1.0]).unwrap();
        let framing = CameraFraming::from_extents(&e, "plane.obj").unwrap();
        assert!(framing.znear > 0.0 && framing.zfar > framing.znear);
    }

    #[test]
    fn centering_offset_centers_the_box_on_the_origin() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);

        for _ in 0..20 {
            let positions = random_positions(&mut rng, 16);
            let e = Extents::from_positions(&positions).unwrap();
            let centered = e.translated(e.centering_offset());
            assert!((centered.min + centered.max).abs().max_element() < 1.0e-2);
        }
    }

    #[test]
    fn framing_follows_the_bounding_diagonal() {
        let e = Extents {
            min: Vec3::new(-1.0, -2.0, -2.0),
            max: Vec3::new(1.0, 2.0, 2.0),
        };
        let framing = CameraFraming::from_extents(&e, "box.obj").unwrap();
        // |(2, 4, 4)| = 6
        assert!((framing.radius - 7.2).abs() < 1.0e-5);
        assert_eq!(framing.position, Vec3::new(0.0, 0.0, framing.radius));
        assert!((framing.znear - 0.072).abs() < 1.0e-6);
        assert!((framing.zfar - 21.6).abs() < 1.0e-4);
    }
}
