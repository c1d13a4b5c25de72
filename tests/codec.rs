//! Engines driven by codecs other than the built-in one.
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::IndexFile;
use oozbun::bundle::MemoryBundleFs;
use oozbun::index::HashStrategy;
use oozbun::{BlockCodec, BundleIndex, DecodeError, Engine, Index, Limits, Lz};

/// Blocks are stored uncompressed.
#[derive(Debug, Default)]
struct Stored;

impl BlockCodec for Stored {
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
        let out = dst
            .get_mut(..src.len())
            .ok_or(DecodeError::OutputOverrun)?;
        out.copy_from_slice(src);
        Ok(src.len())
    }
}

/// Counts the blocks decoded by the built-in codec.
#[derive(Debug, Default)]
struct Counting {
    calls: AtomicUsize,
}

impl Counting {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl BlockCodec for Counting {
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Lz.decode(src, dst)
    }
}

const FILES: &[IndexFile] = &[
    IndexFile {
        path: "Data/Mods.dat",
        bundle: 0,
        contents: b"mods table",
    },
    IndexFile {
        path: "Art/2DArt/icon.dds",
        bundle: 1,
        contents: b"DDS ",
    },
];

#[test]
fn stored_codec() {
    let engine = Engine::with_codec(Stored);
    assert_eq!(engine.limits().max_output, oozbun::DEFAULT_MAX_OUTPUT);

    let mut dst = [0u8; 8];
    assert_eq!(engine.decompress_block(b"raw", &mut dst).unwrap(), 3);
    assert_eq!(&dst[..3], b"raw");

    let mem = engine.decompress_block_alloc(b"raw", 3).unwrap();
    assert_eq!(engine.size_of(&mem), 3);
    engine.free(mem);

    let payload = common::payload(300, 5);
    let bundle = common::assemble(
        300,
        256,
        &[payload[..256].to_vec(), payload[256..].to_vec()],
    );
    let mem = engine.decompress_bundle(&bundle).unwrap();
    assert_eq!(&*mem, payload.as_slice());

    // The same bundle is no valid input for the built-in codec.
    assert!(Engine::new().decompress_bundle(&bundle).is_err());
}

#[test]
fn custom_codec_respects_limits() {
    let engine = Engine::with_codec(Stored).with_limits(Limits { max_output: 10 });
    assert_eq!(engine.limits().max_output, 10);

    let bundle = common::assemble(11, 16, &[vec![0u8; 11]]);
    assert!(matches!(
        engine.decompress_bundle(&bundle),
        Err(oozbun::Error::TooLarge { size: 11, .. })
    ));
}

#[test]
fn borrowed_codec_opens_index() {
    let counting = Counting::default();
    let engine = Engine::with_codec(&counting);
    let game = common::game_data(HashStrategy::Fnv3_11_2, &["Data", "Art"], FILES);

    let index = Index::open(&engine, &game.index).unwrap();
    let after_index = engine.codec().calls();
    assert!(after_index >= 2);

    let id = index.lookup("Data/Mods.dat").unwrap();
    let data = engine.decompress_bundle(&game.bundles[0].1).unwrap();
    assert_eq!(index.extract(id, &data).unwrap(), b"mods table");
    assert!(counting.calls() > after_index);
}

#[test]
fn boxed_codec_reads_through_bundle_fs() {
    let game = common::game_data(HashStrategy::Fnv3_11_2, &["Data", "Art"], FILES);
    let mut fs = MemoryBundleFs::new();
    fs.insert(oozbun::index::INDEX_FILE, game.index.clone());
    for (name, data) in &game.bundles {
        fs.insert(format!("{name}.bundle.bin"), data.clone());
    }

    let codec: Box<dyn BlockCodec> = Box::new(Lz);
    let bundles = BundleIndex::with_engine(fs, Engine::with_codec(codec)).unwrap();

    assert_eq!(bundles.read("Art/2DArt/icon.dds").unwrap(), b"DDS ");
    let mem = bundles.read_bundle(0).unwrap();
    assert_eq!(bundles.engine().size_of(&mem), 10);
    bundles.engine().free(mem);
}
