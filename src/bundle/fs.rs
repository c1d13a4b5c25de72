use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BundleFsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("file '{0}' does not exist")]
    NotFound(String),
    #[error(transparent)]
    Dyn(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Source of the index and bundle files, addressed by their name
/// relative to the bundle directory, e.g. `_.index.bin` or `Data.bundle.bin`.
pub trait BundleFs {
    fn get(&self, name: &str) -> Result<Vec<u8>, BundleFsError>;
}

impl<T: BundleFs + ?Sized> BundleFs for &T {
    fn get(&self, name: &str) -> Result<Vec<u8>, BundleFsError> {
        (**self).get(name)
    }
}

impl<T: BundleFs + ?Sized> BundleFs for Box<T> {
    fn get(&self, name: &str) -> Result<Vec<u8>, BundleFsError> {
        self.as_ref().get(name)
    }
}

/// Reads bundles from a local `Bundles2` directory.
#[derive(Debug, Clone)]
pub struct LocalBundleFs {
    base: PathBuf,
}

impl LocalBundleFs {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl BundleFs for LocalBundleFs {
    fn get(&self, name: &str) -> Result<Vec<u8>, BundleFsError> {
        match std::fs::read(self.base.join(name)) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BundleFsError::NotFound(name.to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Bundle files kept in memory, e.g. after extracting them from an archive.
#[derive(Debug, Default, Clone)]
pub struct MemoryBundleFs(HashMap<String, Vec<u8>>);

impl MemoryBundleFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) -> &mut Self {
        self.0.insert(name.into(), data);
        self
    }
}

impl BundleFs for MemoryBundleFs {
    fn get(&self, name: &str) -> Result<Vec<u8>, BundleFsError> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| BundleFsError::NotFound(name.to_owned()))
    }
}
