//! Shared helpers to build blocks and bundles for the integration tests.

#![allow(dead_code)]

use oozbun::block::Writer;

/// Encodes `payload` as a block, turning runs of a repeated byte into
/// back-references and everything else into literals.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut writer = Writer::new();

    let mut literal_start = 0;
    let mut i = 0;
    while i < payload.len() {
        let run = payload[i..].iter().take_while(|&&b| b == payload[i]).count();
        if run > 4 {
            writer.literal(&payload[literal_start..=i]);
            writer.copy(1, run - 1);
            i += run;
            literal_start = i;
        } else {
            i += run;
        }
    }
    writer.literal(&payload[literal_start..]);

    writer.finish()
}

/// Encodes `payload` as a single literal run.
pub fn literal(payload: &[u8]) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.literal(payload);
    writer.finish()
}

/// Deterministic, somewhat compressible test payload.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| {
            if (i / 37) % 3 == 0 {
                seed
            } else {
                (i as u8).wrapping_mul(31).wrapping_add(seed)
            }
        })
        .collect()
}

/// Frames already compressed blocks as a bundle.
pub fn assemble(uncompressed_size: u64, chunk_unpacked_size: u32, blocks: &[Vec<u8>]) -> Vec<u8> {
    let compressed_size: usize = blocks.iter().map(Vec::len).sum();
    let table_size = blocks.len() * 4;

    let mut data = Vec::new();
    data.extend((uncompressed_size as u32).to_le_bytes());
    data.extend((compressed_size as u32).to_le_bytes());
    data.extend((48 + table_size as u32).to_le_bytes());
    data.extend(8u32.to_le_bytes());
    data.extend(1u32.to_le_bytes());
    data.extend(uncompressed_size.to_le_bytes());
    data.extend((compressed_size as u64).to_le_bytes());
    data.extend((blocks.len() as u32).to_le_bytes());
    data.extend(chunk_unpacked_size.to_le_bytes());
    data.extend([0u8; 16]);
    for block in blocks {
        data.extend((block.len() as u32).to_le_bytes());
    }
    for block in blocks {
        data.extend(block);
    }
    data
}

/// Splits `payload` into chunks, encodes each of them and frames them as a bundle.
pub fn bundle(payload: &[u8], chunk_unpacked_size: u32) -> Vec<u8> {
    let blocks: Vec<_> = payload
        .chunks(chunk_unpacked_size as usize)
        .map(encode)
        .collect();
    assemble(payload.len() as u64, chunk_unpacked_size, &blocks)
}

/// Offset of the first segment payload in a bundle built by [`assemble`].
pub fn payload_offset(segments: usize) -> usize {
    oozbun::bundle::HEAD_SIZE + segments * 4
}

/// A file stored in a synthetic index.
pub struct IndexFile {
    pub path: &'static str,
    pub bundle: u32,
    pub contents: &'static [u8],
}

/// Builds path representation programs, see `oozbun::index::Paths`.
#[derive(Default)]
pub struct PathProgram(pub Vec<u8>);

impl PathProgram {
    pub fn toggle(mut self) -> Self {
        self.0.extend(0u32.to_le_bytes());
        self
    }

    pub fn cmd(mut self, n: u32, fragment: &str) -> Self {
        self.0.extend(n.to_le_bytes());
        self.0.extend(fragment.as_bytes());
        self.0.push(0);
        self
    }
}

/// Synthetic game directory contents: the compressed index and bundles.
pub struct GameData {
    pub index: Vec<u8>,
    pub bundles: Vec<(String, Vec<u8>)>,
}

/// Builds a compressed index and its bundles.
///
/// Every file gets its own path representation, hashed like its directory.
/// The first representation is the root directory.
pub fn game_data(
    strategy: oozbun::index::HashStrategy,
    bundle_names: &[&str],
    files: &[IndexFile],
) -> GameData {
    use oozbun::index::HashStrategy;

    let root_hash = match strategy {
        HashStrategy::Fnv3_11_2 => oozbun::index::FNV_ROOT_HASH,
        HashStrategy::Murmur3_21_2 { seed } => murmur2::murmur64a(b"", seed),
    };

    // Bundle contents, files are laid out back to back.
    let mut contents = vec![Vec::new(); bundle_names.len()];
    let mut file_table = Vec::new();
    for file in files {
        let data = &mut contents[file.bundle as usize];
        file_table.push((
            strategy.path(file.path),
            file.bundle,
            data.len() as u32,
            file.contents.len() as u32,
        ));
        data.extend_from_slice(file.contents);
    }

    // One path rep for the root, then one per file.
    let mut path_data = Vec::new();
    let mut reps = vec![(root_hash, 0u32, 0u32)];
    for file in files {
        let (directory, name) = file.path.rsplit_once('/').unwrap();
        let program = PathProgram::default()
            .toggle()
            .cmd(1, &format!("{directory}/"))
            .toggle()
            .cmd(1, name);
        reps.push((
            strategy.directory(directory),
            path_data.len() as u32,
            program.0.len() as u32,
        ));
        path_data.extend(program.0);
    }

    let mut index = Vec::new();
    index.extend((bundle_names.len() as u32).to_le_bytes());
    for (name, data) in bundle_names.iter().zip(&contents) {
        index.extend((name.len() as u32).to_le_bytes());
        index.extend(name.as_bytes());
        index.extend((data.len() as u32).to_le_bytes());
    }
    index.extend((file_table.len() as u32).to_le_bytes());
    for (hash, bundle, offset, size) in file_table {
        index.extend(hash.to_le_bytes());
        index.extend(bundle.to_le_bytes());
        index.extend(offset.to_le_bytes());
        index.extend(size.to_le_bytes());
    }
    index.extend((reps.len() as u32).to_le_bytes());
    for (hash, offset, size) in reps {
        index.extend(hash.to_le_bytes());
        index.extend(offset.to_le_bytes());
        index.extend(size.to_le_bytes());
        index.extend(size.to_le_bytes());
    }
    index.extend(bundle(&path_data, 64));

    GameData {
        index: bundle(&index, 128),
        bundles: bundle_names
            .iter()
            .zip(&contents)
            .map(|(name, data)| (name.to_string(), bundle(data, 16)))
            .collect(),
    }
}
