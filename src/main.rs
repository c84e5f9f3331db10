use asset_export::config::{self, PipelineConfig};
use asset_export::logging::{LogLevel, init_logging};
use asset_export::paths::Category;
use asset_export::pipeline::{self, BuildOptions, RunReport};
use asset_export::output;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "asset-export")]
#[command(about = "Export Tiled maps, tilesets and Aseprite sprites into the game's resource tree")]
#[command(long_about = "\
Export Tiled maps, tilesets and Aseprite sprites into the game's resource tree

Only assets whose output is missing or older than the source are exported.
Directories named `editoronly` are skipped entirely.

Default layout (relative to --project):

  assets/tiled/maps/**.tmx      → root/res/maps/**.lua
  assets/tiled/tilesets/**.tsx  → root/res/tilesets/**.lua
  assets/tiled/tilesets/**.png  → root/res/tilesets/**.png   (copied)
  assets/ase/**.ase             → root/res/sprites/**.json + .png

Tool paths come from $TILED and $ASEPRITE unless overridden below.
Run 'asset-export gen-config' for a documented assetexport.toml.")]
#[command(version)]
struct Cli {
    /// Project directory containing assets/ and assetexport.toml
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Tiled executable (overrides $TILED and the config file)
    #[arg(long, global = true)]
    tiled: Option<PathBuf>,

    /// Aseprite executable (overrides $ASEPRITE and the config file)
    #[arg(long, global = true)]
    aseprite: Option<PathBuf>,

    /// Log level (overrides $ASSET_EXPORT_LOG)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export every stale asset: maps, then tilesets, then sprites
    Build {
        /// Write a JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Export stale Tiled maps only
    Maps,
    /// Export stale tilesets and copy tileset images only
    Tilesets,
    /// Export stale Aseprite sprites only
    Sprites,
    /// List stale assets without running any tool
    Check,
    /// Print a stock assetexport.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let (options, report_path) = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Build { report } => (BuildOptions::default(), report),
        Command::Maps => (only(Category::Maps), None),
        Command::Tilesets => (only(Category::Tilesets), None),
        Command::Sprites => (only(Category::Sprites), None),
        Command::Check => (
            BuildOptions {
                dry_run: true,
                ..BuildOptions::default()
            },
            None,
        ),
    };

    let config = resolve_config(&cli.project, cli.tiled, cli.aseprite)?;
    let report = run(&config, &options)?;
    output::print_report(&report);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)?;
    }
    Ok(())
}

fn only(category: Category) -> BuildOptions {
    BuildOptions {
        categories: vec![category],
        dry_run: false,
    }
}

/// Layer env vars and CLI flags over the config file, then root every path
/// at the project directory.
fn resolve_config(
    project: &std::path::Path,
    tiled: Option<PathBuf>,
    aseprite: Option<PathBuf>,
) -> Result<PipelineConfig, config::ConfigError> {
    let mut config = config::load_config(project)?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(tiled) = tiled {
        config.tiled.program = tiled;
    }
    if let Some(aseprite) = aseprite {
        config.aseprite.program = aseprite;
    }
    config.validate()?;
    Ok(config.rooted_at(project))
}

/// Run the pipeline, printing one line per asset as it is handled.
fn run(
    config: &PipelineConfig,
    options: &BuildOptions,
) -> Result<RunReport, pipeline::PipelineError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = pipeline::build(config, options, Some(tx));
    printer.join().ok();
    result
}
