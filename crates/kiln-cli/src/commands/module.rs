//! Module management commands

use anyhow::Result;
use clap::Subcommand;
use kiln_asset::ModuleRegistry;
use kiln_import::KilnConfig;

#[derive(Subcommand)]
pub enum ModuleCommands {
    /// Declare a new module under the data root
    New {
        /// Module name
        name: String,

        /// Short description stored in module.toml
        #[arg(long)]
        description: Option<String>,
    },

    /// List declared modules
    List,
}

pub fn run(cmd: ModuleCommands, config: &KilnConfig) -> Result<()> {
    match cmd {
        ModuleCommands::New { name, description } => {
            let mut registry = ModuleRegistry::load(&config.data_root)?;
            registry.create_module(&name, description)?;
            println!(
                "Created module '{}' at {}",
                name,
                registry.module_dir(&name).display()
            );
        }
        ModuleCommands::List => {
            let registry = ModuleRegistry::load(&config.data_root)?;
            let modules = registry.modules();
            if modules.is_empty() {
                println!("No modules found in {}", config.data_root.display());
                return Ok(());
            }
            println!("{} module(s):\n", modules.len());
            for decl in modules {
                let count = registry.by_module(&decl.name).len();
                match &decl.description {
                    Some(desc) => println!("  {} ({} asset(s)) - {}", decl.name, count, desc),
                    None => println!("  {} ({} asset(s))", decl.name, count),
                }
            }
        }
    }
    Ok(())
}
