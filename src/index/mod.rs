//! The bundle index (`_.index.bin`), mapping path hashes to files inside bundles.
mod hash;
mod high;
mod parse;
mod path;

use std::collections::HashMap;

pub use self::hash::{murmur_seed_from_root, Fnv1a64, HashStrategy, FNV_ROOT_HASH};
pub use self::high::{BundleIndex, INDEX_FILE};
pub use self::parse::{BundleInfo, FileInfo, PathRep};
pub use self::path::{PathError, Paths};

use crate::block::BlockCodec;
use crate::bundle::BundleFsError;
use crate::engine::{self, Engine};
use crate::mem::Mem;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to decompress index: {0}")]
    Decompress(#[from] engine::Error),
    #[error("failed to parse index: {0}")]
    Parse(nom::Err<nom::error::Error<()>>),
    #[error("file {file} references bundle {bundle} which does not exist")]
    UnknownBundle { file: usize, bundle: u32 },
    #[error("file {0} does not exist")]
    UnknownFile(usize),
    #[error("bundle {0} does not exist")]
    MissingBundle(usize),
    #[error("file '{0}' can not be found in the index")]
    UnknownPath(String),
    #[error("failed to read '{name}': {source}")]
    Fs {
        name: String,
        #[source]
        source: BundleFsError,
    },
    #[error("failed to decompress bundle '{name}': {source}")]
    Bundle {
        name: String,
        #[source]
        source: engine::Error,
    },
    #[error("could not detect the path hash algorithm")]
    UnknownHash,
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("file {file} ({range:?}) is outside of its bundle ({size} bytes)")]
    FileOutOfRange {
        file: usize,
        range: std::ops::Range<usize>,
        size: usize,
    },
}

impl<T> From<nom::Err<nom::error::Error<T>>> for IndexError {
    fn from(err: nom::Err<nom::error::Error<T>>) -> Self {
        Self::Parse(err.map_input(|_| ()))
    }
}

pub type IndexResult<T> = Result<T, IndexError>;

pub struct Index {
    bundles: Vec<BundleInfo>,
    files: Vec<FileInfo>,
    reps: Vec<PathRep>,
    by_hash: HashMap<u64, usize>,
    path_data: Mem,
    hash: HashStrategy,
}

impl Index {
    /// Decompresses and parses the index bundle `src`.
    pub fn open<C: BlockCodec>(engine: &Engine<C>, src: &[u8]) -> IndexResult<Self> {
        let data = engine.decompress_bundle(src)?;
        tracing::trace!("parsing index bundle with {} bytes", data.len());
        Self::parse(engine, &data)
    }

    /// Parses an already decompressed index.
    pub fn parse<C: BlockCodec>(engine: &Engine<C>, data: &[u8]) -> IndexResult<Self> {
        let (rem, tables) = parse::Tables::parse(data)?;

        let mut by_hash = HashMap::with_capacity(tables.files.len());
        for (id, file) in tables.files.iter().enumerate() {
            if file.bundle_index as usize >= tables.bundles.len() {
                return Err(IndexError::UnknownBundle {
                    file: id,
                    bundle: file.bundle_index,
                });
            }
            by_hash.insert(file.hash, id);
        }

        let path_data = engine.decompress_bundle(rem)?;
        let hash = detect_hash(&tables.reps, &path_data)?;

        tracing::trace!(
            ?hash,
            "parsed {} bundles and {} files from index bundle",
            tables.bundles.len(),
            tables.files.len()
        );

        Ok(Self {
            bundles: tables.bundles,
            files: tables.files,
            reps: tables.reps,
            by_hash,
            path_data,
            hash,
        })
    }

    pub fn bundles(&self) -> &[BundleInfo] {
        &self.bundles
    }

    pub fn files(&self) -> &[FileInfo] {
        &self.files
    }

    pub fn path_reps(&self) -> &[PathRep] {
        &self.reps
    }

    pub fn path_data(&self) -> &[u8] {
        &self.path_data
    }

    pub fn hash_strategy(&self) -> HashStrategy {
        self.hash
    }

    /// Returns the file id for `path`.
    pub fn lookup(&self, path: &str) -> Option<usize> {
        self.by_hash.get(&self.hash.path(path)).copied()
    }

    pub fn file(&self, id: usize) -> Option<&FileInfo> {
        self.files.get(id)
    }

    pub fn bundle(&self, id: usize) -> Option<&BundleInfo> {
        self.bundles.get(id)
    }

    pub fn bundle_by_name(&self, name: &str) -> Option<usize> {
        self.bundles.iter().position(|bundle| bundle.name == name)
    }

    /// All files stored in the bundle with the id `bundle`, in index order.
    pub fn bundle_files(&self, bundle: usize) -> impl Iterator<Item = &FileInfo> + '_ {
        self.files
            .iter()
            .filter(move |file| file.bundle_index as usize == bundle)
    }

    /// Slices the contents of file `id` out of its decompressed bundle.
    pub fn extract<'a>(&self, id: usize, bundle_data: &'a [u8]) -> IndexResult<&'a [u8]> {
        let file = self.files.get(id).ok_or(IndexError::UnknownFile(id))?;

        bundle_data
            .get(file.range())
            .ok_or(IndexError::FileOutOfRange {
                file: id,
                range: file.range(),
                size: bundle_data.len(),
            })
    }

    /// Paths generated by a single path representation.
    pub fn rep_paths(&self, rep: &PathRep) -> IndexResult<Paths<'_>> {
        rep_paths(rep, &self.path_data)
    }

    /// Every path known to the index.
    pub fn paths(&self) -> impl Iterator<Item = IndexResult<String>> + '_ {
        self.reps.iter().flat_map(move |rep| {
            let paths: Box<dyn Iterator<Item = IndexResult<String>> + '_> =
                match self.rep_paths(rep) {
                    Ok(paths) => Box::new(paths.map(|path| path.map_err(IndexError::from))),
                    Err(err) => Box::new(std::iter::once(Err(err))),
                };
            paths
        })
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("bundles", &self.bundles.len())
            .field("files", &self.files.len())
            .field("reps", &self.reps.len())
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

fn rep_paths<'a>(rep: &PathRep, data: &'a [u8]) -> IndexResult<Paths<'a>> {
    let offset = rep.payload_offset as usize;
    let size = rep.payload_size as usize;

    let bytes = offset
        .checked_add(size)
        .and_then(|end| data.get(offset..end))
        .ok_or(PathError::OutOfRange {
            offset,
            size,
            available: data.len(),
        })?;

    Ok(Paths::with_offset(bytes, offset))
}

/// Detects the path hash strategy from the path representations.
///
/// The first representation always describes the root directory.
/// Newer indices use a seeded hash, the seed is recovered from the root
/// hash and verified against the first directory found in the paths.
fn detect_hash(reps: &[PathRep], path_data: &[u8]) -> IndexResult<HashStrategy> {
    let Some(root) = reps.first() else {
        return Err(IndexError::UnknownHash);
    };

    if root.hash == FNV_ROOT_HASH {
        return Ok(HashStrategy::Fnv3_11_2);
    }

    let strategy = HashStrategy::Murmur3_21_2 {
        seed: murmur_seed_from_root(root.hash),
    };

    for rep in &reps[1..] {
        let Some(path) = rep_paths(rep, path_data)?.next().transpose()? else {
            continue;
        };

        if let Some((directory, _)) = path.rsplit_once('/') {
            if strategy.directory(directory) != rep.hash {
                return Err(IndexError::UnknownHash);
            }
            break;
        }
    }

    Ok(strategy)
}
