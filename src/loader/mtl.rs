//! Simplistic MTL parser.

use crate::color::Rgb;
use crate::error::{Result, ViewerError};
use crate::model::Material;
use std::collections::HashMap;

fn parse_f32(word: Option<&str>, line: usize) -> Result<f32> {
    let word = word.ok_or_else(|| ViewerError::parse(line, "missing value"))?;
    word.parse()
        .map_err(|_| ViewerError::parse(line, format!("invalid number `{}`", word)))
}

fn parse_rgb<'a>(words: &mut impl Iterator<Item = &'a str>, line: usize) -> Result<Rgb<f32>> {
    let r = parse_f32(words.next(), line)?;
    let g = parse_f32(words.next(), line)?;
    let b = parse_f32(words.next(), line)?;
    Ok(Rgb::new(r, g, b))
}

/// Parses the text of one or several concatenated MTL files.
///
/// Statements that appear before the first `newmtl` are ignored.
pub fn parse(text: &str) -> Result<HashMap<String, Material>> {
    let mut materials = HashMap::new();
    let mut current: Option<Material> = None;

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

        if keyword == "newmtl" {
            if let Some(m) = current.take() {
                let _ = materials.insert(m.name.clone(), m);
            }
            current = Some(Material::named(line[keyword.len()..].trim()));
            continue;
        }

        let material = match current.as_mut() {
            Some(m) => m,
            None => {
                log::debug!("mtl: `{}` outside of a material at line {}", keyword, line_number);
                continue;
            }
        };

        match keyword {
            "Ns" => material.shininess = parse_f32(words.next(), line_number)?,
            "Ka" => material.ambient = parse_rgb(&mut words, line_number)?,
            "Kd" => material.diffuse = parse_rgb(&mut words, line_number)?,
            "Ks" => material.specular = parse_rgb(&mut words, line_number)?,
            "Ke" => material.emissive = parse_rgb(&mut words, line_number)?,
            "Ni" => material.optical_density = parse_f32(words.next(), line_number)?,
            "d" => material.opacity = parse_f32(words.next(), line_number)?,
            "Tr" => material.opacity = 1.0 - parse_f32(words.next(), line_number)?,
            "illum" => {
                let word = words.next().unwrap_or("");
                material.illum = word.parse().map_err(|_| {
                    ViewerError::parse(line_number, format!("invalid illumination model `{}`", word))
                })?;
            }
            other if other.starts_with("map_") => {
                log::debug!("mtl: texture map `{}` ignored", other)
            }
            other => log::debug!("mtl: ignoring keyword `{}` at line {}", other, line_number),
        }
    }

    if let Some(m) = current.take() {
        let _ = materials.insert(m.name.clone(), m);
    }

    Ok(materials)
}
