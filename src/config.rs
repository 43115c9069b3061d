//! Static configuration: the model catalog and the viewer settings.

use crate::color::{Color, TRANSPARENT};
use crate::transform::TransformState;
use glamx::Vec3;

/// One model of the gallery.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogEntry {
    /// Path (or URL) of the OBJ file.
    pub asset_path: String,
    /// Name shown in the selected-models list.
    pub display_name: String,
}

impl CatalogEntry {
    /// Creates a catalog entry.
    pub fn new(asset_path: impl Into<String>, display_name: impl Into<String>) -> Self {
        CatalogEntry {
            asset_path: asset_path.into(),
            display_name: display_name.into(),
        }
    }
}

/// The ordered, read-only list of models shown as thumbnails.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// A catalog made of `entries`, in order.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Catalog { entries }
    }

    /// The medieval village models shipped under `obj/`.
    pub fn village() -> Self {
        Catalog::new(vec![
            CatalogEntry::new("obj/archeryrange.obj", "Archery Range"),
            CatalogEntry::new("obj/bridge.obj", "Bridge"),
            CatalogEntry::new("obj/castle.obj", "Castle"),
            CatalogEntry::new("obj/detail_hill.obj", "Forest and Hill"),
            CatalogEntry::new("obj/house.obj", "House"),
            CatalogEntry::new("obj/market.obj", "Market"),
            CatalogEntry::new("obj/mill.obj", "Mill"),
            CatalogEntry::new("obj/well.obj", "Well"),
        ])
    }

    /// The entry at `index`.
    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the catalog has no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates through the entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }
}

/// Light intensities and the toon-shading switch, shared by every material.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShadingParams {
    /// Weight of the material's ambient color.
    pub ambient_intensity: f32,
    /// Weight of the directional light.
    pub diffuse_intensity: f32,
    /// Weight of the light placed at the camera.
    pub point_light_intensity: f32,
    /// Quantization step of the toon effect. Negative disables it.
    pub toon_threshold: f32,
}

impl ShadingParams {
    /// Threshold value meaning "no toon shading".
    pub const TOON_DISABLED: f32 = -1.0;

    /// Same parameters with toon shading quantized by `threshold`.
    pub fn with_toon(self, threshold: f32) -> Self {
        ShadingParams {
            toon_threshold: threshold,
            ..self
        }
    }

    /// `true` if the toon effect is active.
    pub fn toon_enabled(&self) -> bool {
        self.toon_threshold > 0.0
    }
}

impl Default for ShadingParams {
    fn default() -> Self {
        ShadingParams {
            ambient_intensity: 0.5,
            diffuse_intensity: 0.5,
            point_light_intensity: 0.5,
            toon_threshold: Self::TOON_DISABLED,
        }
    }
}

/// Settings shared by every viewer instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewerConfig {
    /// Vertical field of view, in radians.
    pub fov: f32,
    /// World-space direction towards the light. Normalized before use.
    pub light_direction: Vec3,
    /// Speed of the automatic spin around the Y axis, in radians per second.
    pub spin_speed: f32,
    /// State the shared transform is reset to on every selection.
    pub default_transform: TransformState,
    /// Light intensities and toon shading.
    pub shading: ShadingParams,
    /// Color every canvas is cleared to.
    pub clear_color: Color,
    /// Size of the render target when there is no on-screen canvas.
    pub offscreen_size: (u32, u32),
    /// Identifier of the main viewport canvas.
    pub main_canvas: String,
    /// Prefix of the thumbnail canvas identifiers, followed by the catalog index.
    pub thumbnail_canvas_prefix: String,
}

impl ViewerConfig {
    /// Identifier of the canvas of thumbnail `index`.
    pub fn thumbnail_canvas(&self, index: usize) -> String {
        format!("{}{}", self.thumbnail_canvas_prefix, index)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            fov: 60.0f32.to_radians(),
            light_direction: Vec3::new(-1.0, 3.0, 5.0),
            spin_speed: 1.0,
            default_transform: TransformState::default(),
            shading: ShadingParams::default(),
            clear_color: TRANSPARENT,
            offscreen_size: (300, 150),
            main_canvas: "canvas".to_string(),
            thumbnail_canvas_prefix: "canvas".to_string(),
        }
    }
}
