//! Kiln CLI - Command-line interface for the Kiln import pipeline

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use commands::{asset, import, module, profile};
use kiln_import::KilnConfig;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Import models, images, sounds and scripts into module asset trees", long_about = None)]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import files (or .zip archives) into a module
    Import {
        /// Files to drop into the import batch
        #[arg(required = true)]
        files: Vec<String>,

        /// Target module (defaults to the configured default module)
        #[arg(long, short)]
        module: Option<String>,

        /// Import profile to use (defaults to the configured active profile)
        #[arg(long, short)]
        profile: Option<String>,

        /// Replace existing assets of the same name in place
        #[arg(long)]
        reimport: bool,

        /// Rename an item before commit, as old=new (old may be kind:name)
        #[arg(long, value_name = "OLD=NEW")]
        rename: Vec<String>,

        /// Commit this item over the registry's asset of the same name
        #[arg(long = "override", value_name = "NAME")]
        overrides: Vec<String>,

        /// Keep the registry's asset and drop this item
        #[arg(long, value_name = "NAME")]
        use_original: Vec<String>,

        /// Leave an item and its children out of the commit
        #[arg(long, value_name = "NAME")]
        skip: Vec<String>,

        /// Directory searched for files that are missing
        #[arg(long = "search-dir", value_name = "DIR")]
        search_dirs: Vec<String>,

        /// Build and validate the import tree without committing
        #[arg(long)]
        dry_run: bool,
    },

    /// Module operations
    #[command(subcommand)]
    Module(module::ModuleCommands),

    /// Inspect registered assets
    #[command(subcommand)]
    Asset(asset::AssetCommands),

    /// Import profile operations
    #[command(subcommand)]
    Profile(profile::ProfileCommands),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = KilnConfig::load()?;
    log::debug!("Using data root {}", config.data_root.display());

    match cli.command {
        Commands::Import {
            files,
            module,
            profile,
            reimport,
            rename,
            overrides,
            use_original,
            skip,
            search_dirs,
            dry_run,
        } => import::run(
            import::ImportArgs {
                files,
                module,
                profile,
                reimport,
                rename,
                overrides,
                use_original,
                skip,
                search_dirs,
                dry_run,
            },
            &config,
        ),
        Commands::Module(cmd) => module::run(cmd, &config),
        Commands::Asset(cmd) => asset::run(cmd, &config),
        Commands::Profile(cmd) => profile::run(cmd, &config),
    }
}
