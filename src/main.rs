use clap::Parser;
use facet_gal::config::{self, BuildConfig, OriginalsPolicy};
use facet_gal::filter::TagFilter;
use facet_gal::media::MagickBackend;
use facet_gal::{build, output};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "facet-gal")]
#[command(about = "Incremental catalog and faceted index generator for photo collections")]
#[command(long_about = "\
Incremental catalog and faceted index generator for photo collections

Scans a directory tree of images, extracts metadata with ImageMagick,
generates scaled renditions, and writes a set of JSON index documents a
static front end can browse by keyword, month, or camera.

Runs are incremental: a persistent catalog (db.json in the destination)
records what was processed and when, so repeat runs only touch images that
are new, modified, or missing derived artifacts.

Destination layout:

  dest/
  ├── db.json              # Persistent metadata catalog
  ├── scaled/
  │   ├── 150/...          # Square thumbnails
  │   ├── 1000/...         # Screen-sized renditions
  │   └── original/...     # Originals (only with --originals copy|symlink)
  ├── json/                # Facet index documents
  └── ...                  # Your overlay assets, if any

Defaults can be set in <source>/facet.toml; command-line flags add to or
override them.")]
#[command(version)]
struct Cli {
    /// Source directory of images
    source: PathBuf,

    /// Destination directory for the generated site data
    dest: PathBuf,

    /// Publish only images carrying at least one of these tags (repeatable)
    #[arg(long = "require-tag", value_name = "TAG")]
    require_tags: Vec<String>,

    /// Hide images carrying any of these tags (repeatable)
    #[arg(long = "exclude-tag", value_name = "TAG")]
    exclude_tags: Vec<String>,

    /// How to publish full-resolution originals
    #[arg(long, value_enum)]
    originals: Option<OriginalsPolicy>,

    /// Static asset tree copied over the destination before the build
    #[arg(long, value_name = "DIR")]
    overlay: Option<PathBuf>,

    /// Symlink overlay assets instead of copying them
    #[arg(long)]
    symlink: bool,

    /// Maximum parallel workers (default: all cores)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let file = BuildConfig::load(&cli.source)?;

    let mut require = file.require_tags;
    require.extend(cli.require_tags);
    let mut exclude = file.exclude_tags;
    exclude.extend(cli.exclude_tags);

    let originals = cli.originals.unwrap_or(file.originals);
    let opts = build::BuildOptions {
        source: cli.source,
        dest: cli.dest,
        filter: TagFilter::new(require, exclude),
        originals,
        overlay: cli.overlay.or(file.overlay),
        symlink_assets: cli.symlink || file.symlink_assets,
    };

    init_thread_pool(cli.workers, &file.processing);

    let backend = match originals {
        OriginalsPolicy::Symlink => MagickBackend::with_symlinked_originals(),
        _ => MagickBackend::new(),
    };

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_progress_event(&event);
        }
    });

    let started = Instant::now();
    let result = build::run(&backend, &opts, Some(&tx));
    drop(tx);
    printer.join().ok();

    let report = result?;
    output::print_summary(&report, started.elapsed());
    Ok(())
}

/// Initialize the rayon thread pool. The flag wins over `facet.toml`; both
/// are capped at the number of available cores.
fn init_thread_pool(flag: Option<usize>, processing: &config::ProcessingConfig) {
    let effective = match flag {
        Some(n) => config::effective_workers(&config::ProcessingConfig {
            max_workers: Some(n),
        }),
        None => config::effective_workers(processing),
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(effective)
        .build_global()
        .ok();
}
