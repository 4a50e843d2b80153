use std::{fmt, sync::Arc};

/// URI of a 3D asset: remote (`https://...`), site rooted (`/models/a.glb`),
/// relative (`models/a.glb`) or an inline `data:` URI.
///
/// References are immutable and cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetReference(Arc<str>);

impl AssetReference {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self(Arc::from(uri.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// The path part of the reference, without query or fragment.
    pub fn path(&self) -> &str {
        let end = self.0.find(['?', '#']).unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Lower-case file extension, if the path has one.
    pub fn extension(&self) -> Option<String> {
        if self.is_data_uri() {
            return None;
        }
        let file = self.path().rsplit('/').next()?;
        let (_, ext) = file.rsplit_once('.')?;
        (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// Resolves a sub-resource (buffer, material library) named inside this asset.
    ///
    /// Absolute references are returned unchanged; relative ones replace the
    /// last path segment of `self`.
    pub fn join(&self, relative: &str) -> AssetReference {
        let is_absolute = relative.starts_with('/')
            || relative.starts_with("data:")
            || relative.contains("://");
        if is_absolute || self.is_data_uri() {
            return AssetReference::new(relative);
        }
        match self.path().rfind('/') {
            Some(idx) => AssetReference::new(format!("{}{}", &self.path()[..=idx], relative)),
            None => AssetReference::new(relative),
        }
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // data URIs can be megabytes long
        if self.is_data_uri() && self.0.len() > 48 {
            let head: String = self.0.chars().take(32).collect();
            write!(f, "{}...", head)
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for AssetReference {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for AssetReference {
    fn from(uri: String) -> Self {
        Self(Arc::from(uri))
    }
}

impl From<&AssetReference> for AssetReference {
    fn from(reference: &AssetReference) -> Self {
        reference.clone()
    }
}
