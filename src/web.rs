//! Browser bindings: HTTP asset fetching, `requestAnimationFrame` and canvas lookup.

use crate::config::{Catalog, ViewerConfig};
use crate::error::{Result, ViewerError};
use crate::gpu::WgpuBackendFactory;
use crate::loader::AssetFetcher;
use crate::registry::InstanceRegistry;
use crate::scheduler::{FrameCallback, FrameRequestId, FrameScheduler, RetainedClosures};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, Request, RequestInit, Response};

/// The canvas element with the id `id`, if there is one.
pub fn canvas_element(id: &str) -> Option<HtmlCanvasElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into::<HtmlCanvasElement>()
        .ok()
}

/// Fetches assets with HTTP GET requests relative to the page.
#[derive(Copy, Clone, Debug, Default)]
pub struct HttpFetcher;

impl AssetFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let failure = |e: wasm_bindgen::JsValue| ViewerError::asset(url, format!("{:?}", e));

        let window = web_sys::window().ok_or_else(|| ViewerError::asset(url, "no window"))?;
        let opts = RequestInit::new();
        opts.set_method("GET");
        let request = Request::new_with_str_and_init(url, &opts).map_err(failure)?;

        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(failure)?;
        let response: Response = response.dyn_into().map_err(failure)?;
        if !response.ok() {
            return Err(ViewerError::asset(url, format!("HTTP error: {}", response.status())));
        }

        let text = JsFuture::from(response.text().map_err(failure)?)
            .await
            .map_err(failure)?;
        text.as_string()
            .ok_or_else(|| ViewerError::asset(url, "response body is not text"))
    }
}

type FrameClosure = Closure<dyn FnMut(f64)>;

/// Schedules frames with the browser's `requestAnimationFrame`.
///
/// Closures are owned here until they run or their request is cancelled.
pub struct AnimationFrameScheduler {
    window: web_sys::Window,
    closures: Rc<RefCell<RetainedClosures<FrameClosure>>>,
}

impl AnimationFrameScheduler {
    /// A scheduler for the current window, if there is one.
    pub fn new() -> Option<Self> {
        Some(AnimationFrameScheduler {
            window: web_sys::window()?,
            closures: Rc::new(RefCell::new(RetainedClosures::new())),
        })
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let handle = Rc::new(Cell::new(0));
        let own_handle = handle.clone();
        let closures = Rc::downgrade(&self.closures);

        let closure: FrameClosure = Closure::once(move |time: f64| {
            if let Some(closures) = closures.upgrade() {
                let previous = closures.borrow_mut().mark_running(own_handle.get());
                drop(previous);
            }
            callback(time)
        });

        match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(id) => {
                handle.set(id);
                self.closures.borrow_mut().insert(id, closure);
                FrameRequestId(id as u32 as u64)
            }
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                FrameRequestId(0)
            }
        }
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        let handle = id.0 as u32 as i32;
        if let Err(e) = self.window.cancel_animation_frame(handle) {
            log::warn!("cancelAnimationFrame failed: {:?}", e);
        }
        let cancelled = self.closures.borrow_mut().cancel(handle);
        drop(cancelled);
    }

    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map(|performance| performance.now())
            .unwrap_or(0.0)
    }
}

/// The registry type of a gallery running in a browser.
pub type WebGallery = InstanceRegistry<HttpFetcher, WgpuBackendFactory, AnimationFrameScheduler>;

/// Builds the gallery for the current page and starts every thumbnail.
pub async fn start_gallery(catalog: Catalog, config: ViewerConfig) -> Result<WebGallery> {
    let scheduler = AnimationFrameScheduler::new().ok_or_else(|| ViewerError::GlContextUnavailable {
        canvas: config.main_canvas.clone(),
    })?;
    let factory = WgpuBackendFactory::new(&config);
    let mut gallery = InstanceRegistry::new(catalog, config, HttpFetcher, factory, Rc::new(scheduler));
    let _ = gallery.start().await;
    Ok(gallery)
}
