use std::future::Future;

use base64::Engine;

use crate::{error::LoadError, resources::reference::AssetReference};

/// Storage collaborator of the pipeline: turns a reference into bytes.
///
/// Implementations report every failure as [`LoadError::Network`]; the
/// pipeline never authenticates on its own.
pub trait AssetSource {
    fn fetch(&self, reference: &AssetReference)
    -> impl Future<Output = Result<Vec<u8>, LoadError>>;
}

/// Default source: plain HTTP GET for remote references, the local assets
/// folder (native) or the page origin (web) for everything else.
#[derive(Clone, Debug)]
pub struct AssetStore {
    client: reqwest::Client,
    #[cfg(not(target_arch = "wasm32"))]
    assets_root: std::path::PathBuf,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            #[cfg(not(target_arch = "wasm32"))]
            assets_root: std::path::Path::new("./").join("assets"),
        }
    }

    /// Serve non-remote references from `root` instead of `./assets`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_root(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            assets_root: root.into(),
            ..Self::new()
        }
    }

    async fn fetch_http(
        &self,
        reference: &AssetReference,
        url: reqwest::Url,
    ) -> Result<Vec<u8>, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| LoadError::network(reference, e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::network(reference, e))?;
        Ok(bytes.to_vec())
    }

    #[cfg(target_arch = "wasm32")]
    fn format_url(&self, reference: &AssetReference) -> Result<reqwest::Url, LoadError> {
        let origin = web_sys::window()
            .and_then(|window| window.location().origin().ok())
            .ok_or_else(|| LoadError::network(reference, "page origin is unavailable"))?;
        let base = reqwest::Url::parse(&format!("{}/", origin))
            .map_err(|e| LoadError::network(reference, e))?;
        base.join(reference.as_str())
            .map_err(|e| LoadError::network(reference, e))
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetSource for AssetStore {
    async fn fetch(&self, reference: &AssetReference) -> Result<Vec<u8>, LoadError> {
        log::debug!("fetching {}", reference);
        if reference.is_data_uri() {
            return decode_data_uri(reference, reference.as_str());
        }
        if reference.is_remote() {
            let url = reqwest::Url::parse(reference.as_str())
                .map_err(|e| LoadError::network(reference, e))?;
            return self.fetch_http(reference, url).await;
        }

        #[cfg(target_arch = "wasm32")]
        let data = {
            let url = self.format_url(reference)?;
            self.fetch_http(reference, url).await?
        };
        #[cfg(not(target_arch = "wasm32"))]
        let data = {
            let path = self
                .assets_root
                .join(reference.path().trim_start_matches('/'));
            tokio::fs::read(&path)
                .await
                .map_err(|e| LoadError::network(reference, format!("{}: {}", path.display(), e)))?
        };

        Ok(data)
    }
}

/// Decodes an inline `data:[<mime>];base64,<payload>` URI.
pub fn decode_data_uri(reference: &AssetReference, uri: &str) -> Result<Vec<u8>, LoadError> {
    let base64_prefix = ";base64,";
    match uri.find(base64_prefix) {
        Some(idx) => base64::engine::general_purpose::STANDARD
            .decode(&uri[idx + base64_prefix.len()..])
            .map_err(|e| LoadError::network(reference, format!("invalid base64 payload: {}", e))),
        None => Err(LoadError::network(
            reference,
            "only base64 encoded data URIs are supported",
        )),
    }
}
