//! Simplistic Wavefront OBJ parser.
//!
//! Produces non-indexed triangle soup split into geometries whenever the material,
//! the object or the group changes.

use crate::error::{Result, ViewerError};
use std::str::SplitWhitespace;

/// One run of faces sharing a material, object and group set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjGeometry {
    /// Name given by the last `o` statement.
    pub object: String,
    /// Names given by the last `g` statement.
    pub groups: Vec<String>,
    /// Name given by the last `usemtl` statement.
    pub material: String,
    /// Flat positions, three floats per vertex.
    pub positions: Vec<f32>,
    /// Flat texture coordinates, two floats per vertex (when present in the file).
    pub texcoords: Vec<f32>,
    /// Flat normals, three floats per vertex (when present in the file).
    pub normals: Vec<f32>,
    /// Flat vertex colors, three floats per vertex. Empty unless every vertex of the
    /// geometry was declared as `v x y z r g b`.
    pub colors: Vec<f32>,
}

/// The parsed content of an OBJ file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjFile {
    /// Geometries that have at least one vertex, in file order.
    pub geometries: Vec<ObjGeometry>,
    /// File names referenced by `mtllib`, relative to the OBJ file.
    pub material_libs: Vec<String>,
}

#[derive(Default)]
struct VertexPool {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    // One entry per position.
    colors: Vec<Option<[f32; 3]>>,
}

#[derive(Default)]
struct ParserState {
    pool: VertexPool,
    geometries: Vec<ObjGeometry>,
    current: Option<ObjGeometry>,
    material_libs: Vec<String>,
    material: String,
    object: String,
    groups: Vec<String>,
}

impl ParserState {
    /// Closes the current geometry if anything has been emitted into it.
    fn new_geometry(&mut self) {
        if self
            .current
            .as_ref()
            .map_or(false, |g| !g.positions.is_empty())
        {
            if let Some(mut g) = self.current.take() {
                if g.colors.len() != g.positions.len() {
                    g.colors.clear();
                }
                self.geometries.push(g);
            }
        }
    }

    fn geometry(&mut self) -> &mut ObjGeometry {
        let (material, object, groups) = (&self.material, &self.object, &self.groups);
        self.current.get_or_insert_with(|| ObjGeometry {
            object: object.clone(),
            groups: groups.clone(),
            material: material.clone(),
            ..ObjGeometry::default()
        })
    }

    fn push_vertex(&mut self, corner: &str, line: usize) -> Result<()> {
        let mut slots = corner.split('/');
        let mut indices = [None, None, None];

        for (i, slot) in indices.iter_mut().enumerate() {
            match slots.next() {
                Some(s) if !s.is_empty() => {
                    let len = match i {
                        0 => self.pool.positions.len(),
                        1 => self.pool.texcoords.len(),
                        _ => self.pool.normals.len(),
                    };
                    *slot = Some(resolve_index(s, len, line)?);
                }
                _ => {}
            }
        }

        let position_index = indices[0]
            .ok_or_else(|| ViewerError::parse(line, format!("face vertex `{}` has no position", corner)))?;
        let position = self.pool.positions[position_index];
        let color = self.pool.colors.get(position_index).copied().flatten();
        let texcoord = indices[1].map(|i| self.pool.texcoords[i]);
        let normal = indices[2].map(|i| self.pool.normals[i]);

        let geometry = self.geometry();
        geometry.positions.extend_from_slice(&position);
        if let Some(c) = color {
            geometry.colors.extend_from_slice(&c);
        }
        if let Some(t) = texcoord {
            geometry.texcoords.extend_from_slice(&t);
        }
        if let Some(n) = normal {
            geometry.normals.extend_from_slice(&n);
        }

        Ok(())
    }

    fn finish(mut self) -> ObjFile {
        self.new_geometry();
        ObjFile {
            geometries: self.geometries,
            material_libs: self.material_libs,
        }
    }
}

/// Converts a 1-based (or negative, relative) OBJ index into a 0-based one.
fn resolve_index(s: &str, len: usize, line: usize) -> Result<usize> {
    let raw: i64 = s
        .parse()
        .map_err(|_| ViewerError::parse(line, format!("invalid index `{}`", s)))?;

    let index = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        len as i64 + raw
    } else {
        return Err(ViewerError::parse(line, "index 0 is not valid in OBJ files"));
    };

    if index < 0 || index as usize >= len {
        return Err(ViewerError::parse(
            line,
            format!("index {} out of range ({} elements)", raw, len),
        ));
    }

    Ok(index as usize)
}

fn parse_floats<const N: usize>(words: &mut SplitWhitespace, line: usize) -> Result<[f32; N]> {
    let mut res = [0.0; N];
    for v in res.iter_mut() {
        let word = words
            .next()
            .ok_or_else(|| ViewerError::parse(line, format!("expected {} numbers", N)))?;
        *v = word
            .parse()
            .map_err(|_| ViewerError::parse(line, format!("invalid number `{}`", word)))?;
    }
    Ok(res)
}

/// Text after the keyword, used for names that may contain spaces.
fn unparsed_args<'a>(line: &'a str, keyword: &str) -> &'a str {
    line[keyword.len()..].trim()
}

/// Parses the text of an OBJ file.
pub fn parse(text: &str) -> Result<ObjFile> {
    let mut state = ParserState::default();

    for (i, raw) in text.lines().enumerate() {
        let line_number = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut words = line.split_whitespace();
        let keyword = match words.next() {
            Some(k) => k,
            None => continue,
        };

        match keyword {
            "v" => {
                let values: Vec<&str> = words.clone().collect();
                let p = parse_floats::<3>(&mut words, line_number)?;
                state.pool.positions.push(p);
                let c = if values.len() >= 6 {
                    Some(parse_floats::<3>(&mut words, line_number)?)
                } else {
                    None
                };
                state.pool.colors.push(c);
            }
            "vt" => {
                let t = parse_floats::<2>(&mut words, line_number)?;
                state.pool.texcoords.push(t);
            }
            "vn" => {
                let n = parse_floats::<3>(&mut words, line_number)?;
                state.pool.normals.push(n);
            }
            "f" => {
                let corners: Vec<&str> = words.collect();
                if corners.len() < 3 {
                    return Err(ViewerError::parse(line_number, "a face needs three vertices"));
                }
                // Polygons are triangulated as a fan around the first vertex.
                for tri in 0..corners.len() - 2 {
                    state.push_vertex(corners[0], line_number)?;
                    state.push_vertex(corners[tri + 1], line_number)?;
                    state.push_vertex(corners[tri + 2], line_number)?;
                }
            }
            "usemtl" => {
                state.material = unparsed_args(line, keyword).to_string();
                state.new_geometry();
            }
            "mtllib" => {
                state
                    .material_libs
                    .push(unparsed_args(line, keyword).to_string());
            }
            "o" => {
                state.object = unparsed_args(line, keyword).to_string();
                state.new_geometry();
            }
            "g" => {
                state.groups = words.map(str::to_string).collect();
                state.new_geometry();
            }
            "s" => {}
            other => log::debug!("obj: ignoring keyword `{}` at line {}", other, line_number),
        }
    }

    Ok(state.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_triangulated_as_a_fan() {
        let obj = parse(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        )
        .unwrap();
        assert_eq!(obj.geometries.len(), 1);
        assert_eq!(
            obj.geometries[0].positions,
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ]
        );
    }

    #[test]
    fn geometries_split_on_usemtl() {
        let text = "\
mtllib village materials.mtl
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
usemtl wood
f 1//1 2//1 3//1
usemtl stone
f -3//-1 -2//-1 -1//-1
";
        let obj = parse(text).unwrap();
        assert_eq!(obj.material_libs, vec!["village materials.mtl".to_string()]);
        assert_eq!(obj.geometries.len(), 2);
        assert_eq!(obj.geometries[0].material, "wood");
        assert_eq!(obj.geometries[1].material, "stone");
        assert_eq!(obj.geometries[1].normals.len(), 9);
        assert_eq!(obj.geometries[0].positions, obj.geometries[1].positions);
    }

    #[test]
    fn vertex_colors_follow_positions() {
        let obj = parse("v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nf 3 2 1\n").unwrap();
        assert_eq!(
            obj.geometries[0].colors,
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn mixed_colored_and_plain_vertices_keep_their_own_colors() {
        let text = "\
v 0 0 0
v 1 0 0 1 0 0
v 0 1 0 0 1 0
v 0 0 1 0 0 1
usemtl colored
f 2 3 4
usemtl partly
f 1 2 3
";
        let obj = parse(text).unwrap();
        assert_eq!(
            obj.geometries[0].colors,
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert!(obj.geometries[1].colors.is_empty());
    }

    #[test]
    fn consecutive_usemtl_without_faces_do_not_create_empty_geometries() {
        let obj = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl a\nusemtl b\nf 1 2 3\n").unwrap();
        assert_eq!(obj.geometries.len(), 1);
        assert_eq!(obj.geometries[0].material, "b");
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let err = parse("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(matches!(err, ViewerError::Parse { line: 2, .. }));
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = parse("v 0 zero 0\n").unwrap_err();
        assert!(matches!(err, ViewerError::Parse { line: 1, .. }));
    }
}
