//! The preview widget: one fallback chain, one displayed scene.
//!
//! Loading is split into `request` / `complete` so the widget never blocks:
//! `request` hands out a [`PendingLoad`] future, the host awaits it wherever
//! it likes and passes the [`Completion`] back. Each load carries the
//! generation it was started in; completions from an older generation are
//! dropped, so a superseded request can never overwrite a newer scene.
//!
//! The displayed scene is only replaced when a new one resolved. Until then the
//! previous scene stays visible; only the very first load shows a label.

use std::time::Duration;

use crate::{
    config::PreviewConfig,
    error::LoadError,
    fallback::{ChainState, FallbackChain},
    presentation::Presentation,
    resources::{
        draco::DracoCli,
        fetch::AssetSource,
        reference::AssetReference,
        resolver::{FailureSignal, ResolvedScene, Resolver},
    },
};

/// What the host should draw this frame.
#[derive(Debug)]
pub enum View<'a> {
    /// Nothing was requested.
    Empty,
    Loading { label: &'a str },
    Scene(&'a Presentation),
    /// The chain is exhausted; show a text message instead of 3D content.
    Placeholder { message: &'a str },
}

/// A load that was started but not yet awaited.
pub struct PendingLoad<S> {
    generation: u64,
    reference: AssetReference,
    resolver: Resolver<S>,
}

impl<S: AssetSource> PendingLoad<S> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reference(&self) -> &AssetReference {
        &self.reference
    }

    pub async fn run(self) -> Completion {
        let outcome = self.resolver.resolve(&self.reference).await;
        Completion {
            generation: self.generation,
            reference: self.reference,
            outcome,
        }
    }
}

/// The result of a [`PendingLoad`], to be handed back to [`ModelPreview::complete`].
pub struct Completion {
    generation: u64,
    reference: AssetReference,
    outcome: Result<ResolvedScene, FailureSignal>,
}

impl Completion {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reference(&self) -> &AssetReference {
        &self.reference
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct ModelPreview<S> {
    config: PreviewConfig,
    resolver: Resolver<S>,
    chain: FallbackChain,
    active: Option<Presentation>,
    generation: u64,
    label: String,
    failures: Vec<LoadError>,
    exhausted: Option<LoadError>,
}

impl<S: AssetSource> ModelPreview<S> {
    /// Creates a widget that loads through `source` and decodes Draco with the configured decoder.
    pub fn new(source: S, config: PreviewConfig) -> anyhow::Result<Self> {
        let resolver =
            Resolver::new(source).with_decoder(DracoCli::new(config.decoder_path.clone()));
        Self::with_resolver(resolver, config)
    }

    pub fn with_resolver(resolver: Resolver<S>, config: PreviewConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let resolver = resolver.with_material_override(config.material_override.clone());
        Ok(Self {
            chain: FallbackChain::new(config.fallback.clone()),
            label: config.loading_label.clone(),
            config,
            resolver,
            active: None,
            generation: 0,
            failures: Vec::new(),
            exhausted: None,
        })
    }

    /// Starts loading the configured asset, if there is one.
    pub fn start(&mut self) -> Option<PendingLoad<S>> {
        let asset = self.config.asset.clone()?;
        self.request(asset)
    }

    /// Switches the widget to `reference`.
    ///
    /// Returns the load to run, or `None` when there is nothing to load: the
    /// reference is already requested or it exhausted its fallback earlier.
    pub fn request(&mut self, reference: impl Into<AssetReference>) -> Option<PendingLoad<S>> {
        let reference = reference.into();
        if !self.chain.request(reference.clone()) {
            log::debug!("{} is already requested", reference);
            return None;
        }
        // Anything still in flight belongs to the previous request
        self.generation += 1;
        self.exhausted = None;
        self.failures.clear();

        match self.chain.state() {
            ChainState::Primary => self.label = self.config.loading_label.clone(),
            ChainState::Fallback => self.label = self.config.fallback_label.clone(),
            ChainState::Exhausted => {
                log::info!("{} failed before, not retrying", reference);
                self.exhaust(reference);
                return None;
            }
        }
        let target = self.chain.current()?.clone();
        Some(self.pending(target))
    }

    /// Applies a finished load. Returns the fallback load to run next, if any.
    pub fn complete(&mut self, completion: Completion) -> Option<PendingLoad<S>> {
        if completion.generation != self.generation {
            log::debug!(
                "Ignoring result for {} from superseded request {}",
                completion.reference,
                completion.generation
            );
            return None;
        }
        let signal = match completion.outcome {
            Ok(scene) => {
                self.active = Some(Presentation::new(scene, &self.config.presentation));
                return None;
            }
            Err(signal) => signal,
        };

        let state = self.chain.state();
        self.failures.push(signal.error.clone());
        match self.chain.on_failure() {
            Some(fallback) => {
                log::warn!(
                    "Primary model failed, using fallback {}: {}",
                    fallback,
                    signal.error
                );
                self.label = self.config.fallback_label.clone();
                self.generation += 1;
                Some(self.pending(fallback))
            }
            None => {
                if state == ChainState::Fallback {
                    log::error!("Fallback model failed: {}", signal.error);
                } else {
                    log::error!("Model failed and no fallback is available: {}", signal.error);
                }
                let requested = self
                    .chain
                    .requested()
                    .cloned()
                    .unwrap_or(completion.reference);
                self.exhaust(requested);
                None
            }
        }
    }

    /// Runs `request` and every follow-up load to the end.
    pub async fn load(&mut self, reference: impl Into<AssetReference>) {
        let mut next = self.request(reference);
        while let Some(pending) = next {
            let completion = pending.run().await;
            next = self.complete(completion);
        }
    }

    /// Per-frame update, independent of any load in flight.
    pub fn update(&mut self, dt: Duration) {
        if let Some(presentation) = self.active.as_mut() {
            presentation.update(dt);
        }
    }

    pub fn view(&self) -> View<'_> {
        if self.chain.state() == ChainState::Exhausted {
            return View::Placeholder {
                message: &self.config.placeholder,
            };
        }
        match (&self.active, self.chain.requested()) {
            (Some(presentation), _) => View::Scene(presentation),
            (None, Some(_)) => View::Loading { label: &self.label },
            (None, None) => View::Empty,
        }
    }

    pub fn state(&self) -> ChainState {
        self.chain.state()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        self.active.as_ref()
    }

    /// Failures of the current request and its fallback; cleared by every new request.
    pub fn failures(&self) -> &[LoadError] {
        &self.failures
    }

    /// Set while the widget shows its placeholder.
    pub fn exhausted(&self) -> Option<&LoadError> {
        self.exhausted.as_ref()
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    fn pending(&self, reference: AssetReference) -> PendingLoad<S> {
        PendingLoad {
            generation: self.generation,
            reference,
            resolver: self.resolver.clone(),
        }
    }

    fn exhaust(&mut self, requested: AssetReference) {
        self.active = None;
        self.exhausted = Some(LoadError::FallbackExhausted {
            requested,
            fallback: self.chain.policy().fallback().cloned(),
        });
    }
}
