use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use bpaf::Bpaf;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options)]
struct Args {
    /// Largest decompressed output to allocate, in bytes.
    #[bpaf(long("max-size"), argument("BYTES"), optional)]
    max_size: Option<u64>,

    #[bpaf(external)]
    action: Action,
}

#[derive(Debug, Clone, Bpaf)]
enum Action {
    /// Decompress a single raw block to stdout.
    #[bpaf(command)]
    Block {
        /// Compressed block.
        #[bpaf(positional("FILE"))]
        file: PathBuf,
        /// Decompressed size of the block.
        #[bpaf(positional("SIZE"))]
        size: usize,
    },
    /// Decompress a bundle to stdout.
    #[bpaf(command)]
    Bundle {
        /// Bundle file.
        #[bpaf(positional("FILE"))]
        file: PathBuf,
    },
    /// Print the header and segment directory of a bundle as JSON.
    #[bpaf(command)]
    Info {
        /// Bundle file.
        #[bpaf(positional("FILE"))]
        file: PathBuf,
    },
    /// List all paths of the bundle index.
    #[bpaf(command)]
    List {
        /// Game directory containing `Bundles2`.
        #[bpaf(positional("DIR"))]
        dir: PathBuf,
    },
    /// Print the SHA-256 hash of a bundled file.
    #[bpaf(command)]
    Sha {
        /// Game directory containing `Bundles2`.
        #[bpaf(positional("DIR"))]
        dir: PathBuf,
        /// Path of the file inside the bundles.
        #[bpaf(positional("PATH"))]
        path: String,
    },
    /// Extract bundled files.
    #[bpaf(command)]
    Extract {
        /// Output directory.
        #[bpaf(short('o'), argument("PATH"), fallback("./out".into()))]
        out: PathBuf,
        /// Game directory containing `Bundles2`.
        #[bpaf(positional("DIR"))]
        dir: PathBuf,
        /// Paths of the files inside the bundles.
        #[bpaf(positional("PATH"), many)]
        paths: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = args().run();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut limits = oozbun::Limits::default();
    if let Some(max_size) = args.max_size {
        limits.max_output = max_size;
    }
    let engine = oozbun::Engine::new().with_limits(limits);

    match args.action {
        Action::Block { file, size } => block(&engine, &file, size),
        Action::Bundle { file } => bundle(&engine, &file),
        Action::Info { file } => info(&file),
        Action::List { dir } => list(&engine, &dir),
        Action::Sha { dir, path } => sha(&engine, &dir, &path),
        Action::Extract { out, dir, paths } => extract(&engine, &dir, &out, &paths),
    }
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| anyhow::anyhow!("failed to read '{}': {err}", path.display()))
}

fn write_stdout(data: &[u8]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(data)?;
    stdout.flush()?;
    Ok(())
}

fn block(engine: &oozbun::Engine, file: &Path, size: usize) -> anyhow::Result<()> {
    let data = read(file)?;
    let mem = engine
        .decompress_block_alloc(&data, size)
        .map_err(|err| anyhow::anyhow!("could not decompress block: {err}"))?;
    write_stdout(&mem)
}

fn bundle(engine: &oozbun::Engine, file: &Path) -> anyhow::Result<()> {
    let data = read(file)?;
    let mem = engine
        .decompress_bundle(&data)
        .map_err(|err| anyhow::anyhow!("could not decompress bundle: {err}"))?;
    tracing::debug!("decompressed bundle to {} bytes", mem.len());
    write_stdout(&mem)
}

fn info(file: &Path) -> anyhow::Result<()> {
    let data = read(file)?;
    let directory = oozbun::bundle::Directory::parse(&data)?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &directory)?;
    writeln!(stdout)?;

    Ok(())
}

type Bundles = oozbun::BundleIndex<oozbun::LocalBundleFs>;

fn open_index(engine: &oozbun::Engine, dir: &Path) -> anyhow::Result<Bundles> {
    let fs = oozbun::LocalBundleFs::new(dir.join("Bundles2"));
    let bundles = oozbun::BundleIndex::with_engine(fs, engine.clone())?;

    let index = bundles.index();
    tracing::info!(
        "loaded index with {} bundles and {} files",
        index.bundles().len(),
        index.files().len()
    );

    Ok(bundles)
}

fn list(engine: &oozbun::Engine, dir: &Path) -> anyhow::Result<()> {
    let bundles = open_index(engine, dir)?;

    let mut stdout = std::io::stdout().lock();
    for path in bundles.index().paths() {
        writeln!(stdout, "{}", path?)?;
    }

    Ok(())
}

fn sha(engine: &oozbun::Engine, dir: &Path, path: &str) -> anyhow::Result<()> {
    let bundles = open_index(engine, dir)?;
    let contents = bundles.read(path)?;

    let sha256 = {
        let mut hasher = Sha256::new();
        hasher.update(contents);
        hasher.finalize()
    };
    println!("{sha256:x}");

    Ok(())
}

/// Joins a bundled path onto `out`, refusing paths which would leave `out`.
fn output_path(out: &Path, path: &str) -> Option<PathBuf> {
    let path = Path::new(path);
    path.components()
        .all(|component| matches!(component, Component::Normal(_)))
        .then(|| out.join(path))
}

fn extract(
    engine: &oozbun::Engine,
    dir: &Path,
    out: &Path,
    paths: &[String],
) -> anyhow::Result<()> {
    let bundles = open_index(engine, dir)?;
    let index = bundles.index();

    let mut missed = 0usize;
    let mut by_bundle: BTreeMap<usize, Vec<(PathBuf, usize)>> = BTreeMap::new();
    for path in paths {
        let path = path.trim_matches('"');
        let Some(target) = output_path(out, path) else {
            tracing::warn!("refusing to extract '{path}' outside of the output directory");
            missed += 1;
            continue;
        };

        match index.lookup(path) {
            Some(id) => by_bundle
                .entry(index.files()[id].bundle_index as usize)
                .or_default()
                .push((target, id)),
            None => {
                tracing::warn!("could not find file '{path}'");
                missed += 1;
            }
        }
    }

    let mut extracted = 0usize;
    for (bundle_id, files) in by_bundle {
        let data = match bundles.read_bundle(bundle_id) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("{err}, missing {} files", files.len());
                missed += files.len();
                continue;
            }
        };

        for (target, id) in files {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, index.extract(id, &data)?)?;
            extracted += 1;
        }
    }

    tracing::info!(
        "done, {extracted}/{} extracted, {missed} missed",
        paths.len()
    );

    if missed > 0 {
        anyhow::bail!("{missed} files could not be extracted");
    }

    Ok(())
}
