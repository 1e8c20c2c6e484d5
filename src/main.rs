use clap::{Parser, Subcommand};
use seed_collage::cache::ImageCache;
use seed_collage::catalog::AssetCatalog;
use seed_collage::config::{self, GeneratorConfig};
use seed_collage::imaging::RustBackend;
use seed_collage::output;
use seed_collage::pipeline::{self, BatchRange, GenerateContext, SeedSource};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Flags for the `generate` command.
#[derive(clap::Args, Clone)]
struct GenerateArgs {
    /// Number of instances to generate
    count: u32,

    /// Number of the first instance
    #[arg(default_value_t = 1)]
    start: u32,

    /// Derive seeds as "<prefix>_<n>" instead of minting random ones
    #[arg(long)]
    seed_prefix: Option<String>,

    /// Disable the decoded-image cache: decode every asset for every instance
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "seed-collage")]
#[command(about = "Deterministic seed-driven collage generator")]
#[command(long_about = "\
Deterministic seed-driven collage generator

Every collage is a pure function of its seed and the asset listing: the same
seed over the same files always yields the same image and the same metadata.

Asset structure:

  images/
  ├── collage.toml          # Generator config (optional)
  ├── signature.png         # Signature overlay (optional, set in config)
  ├── food/                 # One directory per configured category
  │   ├── 1.png             # Numbered files sort by number
  │   └── 2.png
  └── clown/
      └── 1.webp

Output structure:

  output/
  ├── images/1.webp         # One image per instance
  └── metadata/1.json       # Matching trait metadata

Sampling indexes into each category's sorted listing. Renaming or adding
files changes which file a seed picks.

Run 'seed-collage gen-config' to generate a documented collage.toml.")]
#[command(version)]
struct Cli {
    /// Asset root with one subdirectory per category
    #[arg(long, default_value = "images", global = true)]
    assets: PathBuf,

    /// Output directory
    #[arg(long, default_value = "output", global = true)]
    output: PathBuf,

    /// Config file (default: collage.toml in the asset root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate collages and metadata for a range of instances
    Generate(GenerateArgs),
    /// Scan the asset root and list every category
    Check,
    /// Print a stock collage.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match &cli.command {
        Command::Generate(args) => {
            let config = load_config(&cli)?;
            init_thread_pool(&config.processing);
            let catalog = AssetCatalog::scan(&cli.assets, &config.categories)?;
            let backend = RustBackend::new();
            let cache = if args.no_cache {
                ImageCache::disabled()
            } else {
                ImageCache::new()
            };
            let signature = pipeline::load_signature(&config, &cli.assets, &backend, &cache)?;
            let ctx = GenerateContext {
                config: &config,
                catalog: &catalog,
                backend: &backend,
                cache: &cache,
                signature: signature.as_deref(),
            };
            let seeds = match &args.seed_prefix {
                Some(prefix) => SeedSource::Prefixed(prefix.clone()),
                None => SeedSource::Random,
            };

            println!("==> Generating into {}", cli.output.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_generate_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary = pipeline::run_batch(
                BatchRange {
                    start: args.start,
                    count: args.count,
                },
                &seeds,
                &ctx,
                &cli.output,
                Some(tx),
            );
            printer.join().ok();
            output::print_batch_summary(&summary);
            println!("Cache: {}", summary.cache);

            if !summary.is_success() {
                return Err(format!("{} instance(s) failed", summary.failed.len()).into());
            }
        }
        Command::Check => {
            let config = load_config(&cli)?;
            println!("==> Checking {}", cli.assets.display());
            let catalog = AssetCatalog::scan(&cli.assets, &config.categories)?;
            output::print_catalog(&catalog, &config);
            pipeline::check_categories(&config, &catalog)?;
            if let Some(path) = &config.signature.path {
                let full = cli.assets.join(path);
                if !full.is_file() {
                    return Err(format!("Signature not found: {}", full.display()).into());
                }
            }
            println!("==> Assets are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so they never interleave with progress on stdout.
fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Explicit `--config` file, else `collage.toml` in the asset root, else defaults.
fn load_config(cli: &Cli) -> Result<GeneratorConfig, config::ConfigError> {
    match &cli.config {
        Some(path) => config::load_config_file(path),
        None => config::load_config(&cli.assets),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
