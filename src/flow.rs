//! Driving previews from a host event loop.
//!
//! A [`PreviewHost`] owns any number of independent previews. Loads are
//! dispatched according to the platform: natively they are resolved on a tokio
//! runtime, on the web they are spawned with `wasm_bindgen_futures` and their
//! results are applied on the next [`PreviewHost::frame`].
//!
//! # Lifecycle
//!
//! 1. `add()` registers a preview and starts loading its configured asset
//! 2. `request()` points a preview at another asset
//! 3. `frame()` is called once per display refresh; it applies finished loads
//!    and advances every preview by the time since the last frame

#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};

use instant::{Duration, Instant};

use crate::{
    preview::{Completion, ModelPreview, PendingLoad},
    resources::{fetch::AssetSource, reference::AssetReference},
};

pub type PreviewId = usize;

pub struct PreviewHost<S: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    // Completions of spawned loads, applied on the next frame
    #[cfg(target_arch = "wasm32")]
    inbox: Rc<RefCell<Vec<(PreviewId, Completion)>>>,
    previews: Vec<ModelPreview<S>>,
    last_time: Instant,
}

impl<S: AssetSource + 'static> PreviewHost<S> {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            #[cfg(target_arch = "wasm32")]
            inbox: Rc::new(RefCell::new(Vec::new())),
            previews: Vec::new(),
            last_time: Instant::now(),
        })
    }

    /// Registers `preview` and starts loading its configured asset.
    pub fn add(&mut self, mut preview: ModelPreview<S>) -> PreviewId {
        let id = self.previews.len();
        let pending = preview.start();
        self.previews.push(preview);
        if let Some(pending) = pending {
            self.dispatch(id, pending);
        }
        id
    }

    pub fn request(
        &mut self,
        id: PreviewId,
        reference: impl Into<AssetReference>,
    ) -> anyhow::Result<()> {
        let preview = self
            .previews
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("there is no preview with id {}", id))?;
        if let Some(pending) = preview.request(reference) {
            self.dispatch(id, pending);
        }
        Ok(())
    }

    /// Applies finished loads and advances all previews by the wall-clock time since the last frame.
    pub fn frame(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now - self.last_time;
        self.last_time = now;
        self.advance(dt);
        dt
    }

    /// Like [`frame`](Self::frame) with an explicit time step.
    pub fn advance(&mut self, dt: Duration) {
        #[cfg(target_arch = "wasm32")]
        self.drain_inbox();
        self.previews
            .iter_mut()
            .for_each(|preview| preview.update(dt));
    }

    pub fn preview(&self, id: PreviewId) -> Option<&ModelPreview<S>> {
        self.previews.get(id)
    }

    pub fn previews(&self) -> &[ModelPreview<S>] {
        &self.previews
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn dispatch(&mut self, id: PreviewId, pending: PendingLoad<S>) {
        let mut next = Some(pending);
        while let Some(pending) = next {
            let completion: Completion = self.async_runtime.block_on(pending.run());
            next = self.previews[id].complete(completion);
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn dispatch(&mut self, id: PreviewId, pending: PendingLoad<S>) {
        let inbox = self.inbox.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let completion = pending.run().await;
            inbox.borrow_mut().push((id, completion));
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn drain_inbox(&mut self) {
        let finished: Vec<_> = self.inbox.borrow_mut().drain(..).collect();
        for (id, completion) in finished {
            if let Some(next) = self.previews[id].complete(completion) {
                self.dispatch(id, next);
            }
        }
    }
}

/// Installs the platform logger. Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("logger was already installed");
        }
    }
}
