use crate::error::{Result, ViewerError};
use crate::loader::{mtl, obj, AssetFetcher};
use crate::model::{Geometry, Model};

/// Resolves `reference` the way a browser resolves a relative URL against `base`.
///
/// Absolute paths and full URLs are returned unchanged; anything else is looked up
/// next to `base`, with `.` and `..` segments folded.
pub fn resolve_relative(base: &str, reference: &str) -> String {
    if reference.starts_with('/') || reference.contains("://") {
        return reference.to_string();
    }

    // Keep the scheme and authority of a full URL out of the segment folding.
    let (prefix, path) = match base.find("://") {
        Some(pos) => match base[pos + 3..].find('/') {
            Some(slash) => base.split_at(pos + 3 + slash),
            None => (base, ""),
        },
        None => ("", base),
    };

    let directory = match path.rfind('/') {
        Some(slash) => &path[..=slash],
        None => "",
    };
    let absolute = directory.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in directory.split('/').chain(reference.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().map_or(false, |s| *s != "..") {
                    let _ = segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    let joined = segments.join("/");
    if absolute || !prefix.is_empty() {
        format!("{}/{}", prefix, joined)
    } else {
        joined
    }
}

async fn fetch_non_empty<F: AssetFetcher + ?Sized>(fetcher: &F, url: &str) -> Result<String> {
    let text = fetcher.fetch_text(url).await?;
    if text.trim().is_empty() {
        return Err(ViewerError::asset(url, "empty response"));
    }
    Ok(text)
}

/// Fetches and parses an OBJ file together with every MTL file it references.
///
/// All material files are fetched concurrently and concatenated before being parsed,
/// so a material may be referenced from any of them. If the OBJ or any MTL fails to
/// load the whole model fails with [`ViewerError::AssetLoadFailure`].
pub async fn load_model<F: AssetFetcher + ?Sized>(fetcher: &F, path: &str) -> Result<Model> {
    let text = fetch_non_empty(fetcher, path).await?;
    let parsed = obj::parse(&text)?;

    let material_urls: Vec<String> = parsed
        .material_libs
        .iter()
        .map(|lib| resolve_relative(path, lib))
        .collect();
    let material_texts = futures::future::try_join_all(
        material_urls
            .iter()
            .map(|url| fetch_non_empty(fetcher, url)),
    )
    .await?;
    let materials = mtl::parse(&material_texts.join("\n"))?;

    let geometries: Vec<Geometry> = parsed
        .geometries
        .into_iter()
        .map(|g| {
            let normals = (!g.normals.is_empty()).then_some(g.normals);
            let colors = (!g.colors.is_empty()).then_some(g.colors);
            Geometry::new(g.positions, normals, colors, g.material)
        })
        .collect();

    log::info!(
        "loaded `{}`: {} geometries, {} materials",
        path,
        geometries.len(),
        materials.len()
    );

    Ok(Model {
        source_path: path.to_string(),
        geometries,
        materials,
    })
}
