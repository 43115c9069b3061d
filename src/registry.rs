//! The gallery: one thumbnail per catalog entry, the main viewport and the
//! selected-models list.

use crate::config::{Catalog, ViewerConfig};
use crate::error::{Result, ViewerError};
use crate::gpu::BackendFactory;
use crate::loader::AssetFetcher;
use crate::scheduler::FrameScheduler;
use crate::transform::{SharedTransform, SliderInput};
use crate::viewer::{Viewer, ViewerInstance, ViewerRole};
use std::collections::BTreeMap;
use std::rc::Rc;

type ViewerOf<BF, S> = Viewer<<BF as BackendFactory>::Backend, S>;

/// A model added to the selected-models list.
#[derive(Clone, Debug)]
pub struct SelectedEntry {
    /// Index of the model in the catalog.
    pub catalog_index: usize,
    /// Name shown in the list.
    pub display_name: String,
    /// The transform the main viewport followed when this entry was added.
    pub transform: SharedTransform,
}

/// Owns every viewer of the gallery and routes user input to them.
pub struct InstanceRegistry<F, BF, S>
where
    F: AssetFetcher,
    BF: BackendFactory,
    BF::Backend: 'static,
    S: FrameScheduler + 'static,
{
    catalog: Catalog,
    config: Rc<ViewerConfig>,
    fetcher: F,
    factory: BF,
    scheduler: Rc<S>,
    thumbnails: BTreeMap<usize, ViewerOf<BF, S>>,
    main: Option<ViewerOf<BF, S>>,
    main_model: Option<usize>,
    selected: Vec<SelectedEntry>,
    active: SharedTransform,
}

impl<F, BF, S> InstanceRegistry<F, BF, S>
where
    F: AssetFetcher,
    BF: BackendFactory,
    BF::Backend: 'static,
    S: FrameScheduler + 'static,
{
    /// An empty gallery. Nothing is loaded until [`start`](Self::start).
    pub fn new(catalog: Catalog, config: ViewerConfig, fetcher: F, factory: BF, scheduler: Rc<S>) -> Self {
        let active = SharedTransform::new(config.default_transform);

        InstanceRegistry {
            catalog,
            config: Rc::new(config),
            fetcher,
            factory,
            scheduler,
            thumbnails: BTreeMap::new(),
            main: None,
            main_model: None,
            selected: Vec::new(),
            active,
        }
    }

    async fn build_viewer(
        &self,
        index: usize,
        canvas: &str,
        role: ViewerRole,
        transform: SharedTransform,
    ) -> Result<ViewerOf<BF, S>> {
        let entry = self.catalog.get(index).ok_or(ViewerError::UnknownModel(index))?;
        let instance = ViewerInstance::load(
            &self.fetcher,
            &self.factory,
            &entry.asset_path,
            canvas,
            role,
            transform,
            self.config.clone(),
        )
        .await?;

        let mut viewer = Viewer::new(instance);
        viewer.start(&self.scheduler);
        Ok(viewer)
    }

    /// Loads a thumbnail viewer for every catalog entry and starts them.
    ///
    /// Loads run concurrently. A failing thumbnail is logged and left blank; it
    /// does not prevent the others. Returns the number of thumbnails running.
    pub async fn start(&mut self) -> usize {
        let this = &*self;
        let loads = (0..this.catalog.len()).map(|index| {
            let canvas = this.config.thumbnail_canvas(index);
            async move {
                let viewer = this
                    .build_viewer(index, &canvas, ViewerRole::Thumbnail, SharedTransform::default())
                    .await;
                (index, viewer)
            }
        });
        let results = futures::future::join_all(loads).await;

        for (index, result) in results {
            match result {
                Ok(viewer) => {
                    if let Some(mut previous) = self.thumbnails.insert(index, viewer) {
                        previous.dispose();
                    }
                }
                Err(e) => log::warn!("Thumbnail {} unavailable: {}", index, e),
            }
        }

        log::info!(
            "{} of {} thumbnails running",
            self.thumbnails.len(),
            self.catalog.len()
        );
        self.thumbnails.len()
    }

    /// Shows catalog model `index` in the main viewport and appends it to the
    /// selected-models list.
    ///
    /// The thumbnail canvas is cleared, the transform is reset to its defaults, the
    /// previous main viewer is disposed, and a new one is loaded. Returns the index
    /// of the new entry in [`selected`](Self::selected).
    pub async fn select(&mut self, index: usize) -> Result<usize> {
        let entry = self
            .catalog
            .get(index)
            .cloned()
            .ok_or(ViewerError::UnknownModel(index))?;

        if let Some(thumbnail) = self.thumbnails.get(&index) {
            thumbnail.instance_mut().clear();
        }

        let transform = SharedTransform::new(self.config.default_transform);
        self.active = transform.clone();

        if let Some(mut previous) = self.main.take() {
            previous.dispose();
        }
        self.main_model = None;

        let canvas = self.config.main_canvas.clone();
        let viewer = match self
            .build_viewer(index, &canvas, ViewerRole::Main, transform.clone())
            .await
        {
            Ok(viewer) => viewer,
            Err(e) => {
                log::warn!("Cannot show `{}`: {}", entry.display_name, e);
                return Err(e);
            }
        };

        self.main = Some(viewer);
        self.main_model = Some(index);
        self.selected.push(SelectedEntry {
            catalog_index: index,
            display_name: entry.display_name.clone(),
            transform,
        });
        log::info!("Selected `{}`", entry.display_name);

        Ok(self.selected.len() - 1)
    }

    /// Makes the transform of selected entry `entry` drive the main viewport again.
    ///
    /// The model shown is not reloaded: only the transform changes.
    pub fn reactivate(&mut self, entry: usize) -> Result<()> {
        let selected = self
            .selected
            .get(entry)
            .ok_or(ViewerError::UnknownSelection(entry))?;
        let main = self.main.as_ref().ok_or(ViewerError::Disposed)?;
        main.ensure_alive()?;

        if self.main_model != Some(selected.catalog_index) {
            log::debug!(
                "Re-activating `{}` over another model; keeping the loaded geometry",
                selected.display_name
            );
        }

        self.active = selected.transform.clone();
        main.instance_mut().bind_transform(selected.transform.clone());
        let _ = main.render_now(self.scheduler.now_ms());
        Ok(())
    }

    /// Applies a slider event to the active transform and redraws the main viewport.
    pub fn apply_slider(&mut self, input: SliderInput) {
        self.active.apply(input);
        if let Some(main) = &self.main {
            let _ = main.render_now(self.scheduler.now_ms());
        }
    }

    /// Disposes the thumbnail of catalog entry `index`. Returns `false` if there was none.
    pub fn remove_thumbnail(&mut self, index: usize) -> bool {
        match self.thumbnails.remove(&index) {
            Some(mut viewer) => {
                viewer.dispose();
                true
            }
            None => false,
        }
    }

    /// Disposes every viewer.
    pub fn shutdown(&mut self) {
        if let Some(mut main) = self.main.take() {
            main.dispose();
        }
        for (_, mut thumbnail) in std::mem::take(&mut self.thumbnails) {
            thumbnail.dispose();
        }
        self.main_model = None;
        log::info!("Gallery shut down");
    }

    /// The catalog shown.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The shared configuration.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// The frame scheduler driving every viewer.
    pub fn scheduler(&self) -> &Rc<S> {
        &self.scheduler
    }

    /// The asset fetcher models are loaded with.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The factory canvases get their backend from.
    pub fn factory(&self) -> &BF {
        &self.factory
    }

    /// The transform slider events currently apply to.
    pub fn active_transform(&self) -> &SharedTransform {
        &self.active
    }

    /// The selected-models list, in selection order.
    pub fn selected(&self) -> &[SelectedEntry] {
        &self.selected
    }

    /// The thumbnail viewer of catalog entry `index`.
    pub fn thumbnail(&self, index: usize) -> Option<&ViewerOf<BF, S>> {
        self.thumbnails.get(&index)
    }

    /// The main viewer, if a model is shown.
    pub fn main(&self) -> Option<&ViewerOf<BF, S>> {
        self.main.as_ref()
    }

    /// Catalog index of the model in the main viewport.
    pub fn main_model(&self) -> Option<usize> {
        self.main_model
    }
}
