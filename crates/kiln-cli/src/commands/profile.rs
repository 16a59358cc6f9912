//! Import profile commands

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use kiln_import::{ImportProfile, KilnConfig, ProfileLibrary};

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List profiles
    List,

    /// Print a profile's settings
    Show {
        /// Profile name (defaults to the active profile)
        name: Option<String>,

        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },

    /// Create a profile
    New {
        /// Profile name
        name: String,

        /// Copy settings from an existing profile instead of the defaults
        #[arg(long)]
        from: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },

    /// Make a profile the project's active profile
    Set {
        /// Profile name
        name: String,
    },
}

pub fn run(cmd: ProfileCommands, config: &KilnConfig) -> Result<()> {
    let mut library = ProfileLibrary::load(&config.profiles_path)?;

    match cmd {
        ProfileCommands::List => {
            println!("{} profile(s):\n", library.len());
            for name in library.names() {
                let marker = if name == config.active_profile { "*" } else { " " };
                println!("  {} {}", marker, name);
            }
        }
        ProfileCommands::Show { name, format } => {
            let name = name.unwrap_or_else(|| config.active_profile.clone());
            let profile = library
                .get(&name)
                .with_context(|| format!("Profile '{}' not found", name))?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(profile)?),
                "toml" => println!("{}", toml::to_string_pretty(profile)?),
                other => bail!("Unknown format '{}'. Use toml or json.", other),
            }
        }
        ProfileCommands::New { name, from } => {
            let profile = match from {
                Some(base) => {
                    let mut profile = library
                        .get(&base)
                        .cloned()
                        .with_context(|| format!("Profile '{}' not found", base))?;
                    profile.name = name.clone();
                    profile
                }
                None => ImportProfile::new(&name),
            };
            library.add(profile)?;
            println!("Created profile '{}'", name);
        }
        ProfileCommands::Delete { name } => {
            library.remove(&name)?;
            println!("Deleted profile '{}'", name);
            if name == config.active_profile {
                println!("Note: '{}' was the active profile; imports fall back to the default until another is set", name);
            }
        }
        ProfileCommands::Set { name } => {
            if library.get(&name).is_none() {
                bail!("Profile '{}' not found", name);
            }
            KilnConfig::save_active_profile(&name)?;
            println!(
                "Active profile set to '{}' in {}",
                name,
                KilnConfig::project_config_path().display()
            );
        }
    }

    Ok(())
}
