//! Loaders for OBJ models and their MTL materials.

pub use self::fetch::{AssetFetcher, MemoryFetcher};
#[cfg(not(target_arch = "wasm32"))]
pub use self::fetch::FileFetcher;
pub use self::model_loader::{load_model, resolve_relative};

mod fetch;
mod model_loader;
pub mod mtl;
pub mod obj;
