use super::{Index, IndexError, IndexResult};
use crate::block::{BlockCodec, Lz};
use crate::bundle::BundleFs;
use crate::engine::Engine;
use crate::mem::Mem;

/// Name of the index file in the bundle directory.
pub const INDEX_FILE: &str = "_.index.bin";

/// An [`Index`] together with the [`BundleFs`] its bundles are read from.
#[derive(Debug)]
pub struct BundleIndex<F, C = Lz> {
    fs: F,
    engine: Engine<C>,
    index: Index,
}

impl<F: BundleFs> BundleIndex<F> {
    /// Opens the index of `fs` with the default engine.
    pub fn open(fs: F) -> IndexResult<Self> {
        Self::with_engine(fs, Engine::new())
    }
}

impl<F: BundleFs, C: BlockCodec> BundleIndex<F, C> {
    pub fn with_engine(fs: F, engine: Engine<C>) -> IndexResult<Self> {
        let data = get(&fs, INDEX_FILE)?;
        let index = Index::open(&engine, &data)?;

        tracing::trace!(
            "opened index with {} bundles and {} files",
            index.bundles().len(),
            index.files().len()
        );

        Ok(Self { fs, engine, index })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn engine(&self) -> &Engine<C> {
        &self.engine
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Reads and decompresses the bundle with the id `bundle`.
    pub fn read_bundle(&self, bundle: usize) -> IndexResult<Mem> {
        let info = self
            .index
            .bundle(bundle)
            .ok_or(IndexError::MissingBundle(bundle))?;

        let name = info.file_name();
        let data = get(&self.fs, &name)?;
        tracing::trace!("read bundle '{name}' ({} bytes)", data.len());

        self.engine
            .decompress_bundle(&data)
            .map_err(|source| IndexError::Bundle { name, source })
    }

    /// Reads the contents of the file with the id `id`.
    pub fn read_file(&self, id: usize) -> IndexResult<Vec<u8>> {
        let file = self.index.file(id).ok_or(IndexError::UnknownFile(id))?;
        let data = self.read_bundle(file.bundle_index as usize)?;
        Ok(self.index.extract(id, &data)?.to_vec())
    }

    /// Reads the contents of the file at `path`.
    pub fn read(&self, path: &str) -> IndexResult<Vec<u8>> {
        let id = self
            .index
            .lookup(path)
            .ok_or_else(|| IndexError::UnknownPath(path.to_owned()))?;
        self.read_file(id)
    }
}

fn get<F: BundleFs>(fs: &F, name: &str) -> IndexResult<Vec<u8>> {
    fs.get(name).map_err(|source| IndexError::Fs {
        name: name.to_owned(),
        source,
    })
}
