//! Registered asset inspection

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use kiln_asset::{AssetId, AssetKind, ModuleRegistry, RecordDetails, RegisteredAsset, TextureRef};
use kiln_import::KilnConfig;

#[derive(Subcommand)]
pub enum AssetCommands {
    /// List registered assets
    List {
        /// Only assets of this module
        #[arg(long, short)]
        module: Option<String>,

        /// Filter by kind (image, model, animation, material, sound, script, gui)
        #[arg(long)]
        kind: Option<String>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show asset info
    Info {
        /// Asset id as Module:name
        id: String,
    },
}

pub fn run(cmd: AssetCommands, config: &KilnConfig) -> Result<()> {
    match cmd {
        AssetCommands::List {
            module,
            kind,
            format,
        } => run_list(config, module.as_deref(), kind.as_deref(), &format),
        AssetCommands::Info { id } => run_info(config, &id),
    }
}

fn run_list(
    config: &KilnConfig,
    module: Option<&str>,
    kind: Option<&str>,
    format: &str,
) -> Result<()> {
    let registry = ModuleRegistry::load(&config.data_root)?;

    let kind = match kind {
        Some(k) => Some(AssetKind::parse(k).with_context(|| format!("Unknown asset kind '{}'", k))?),
        None => None,
    };

    let assets: Vec<&RegisteredAsset> = match module {
        Some(m) => registry.by_module(m),
        None => registry
            .modules()
            .iter()
            .flat_map(|decl| registry.by_module(&decl.name))
            .collect(),
    };
    let assets: Vec<&RegisteredAsset> = assets
        .into_iter()
        .filter(|a| kind.map_or(true, |k| a.kind() == k))
        .collect();

    if format == "json" {
        let items: Vec<serde_json::Value> = assets
            .iter()
            .map(|a| {
                serde_json::json!({
                    "id": a.id().to_string(),
                    "kind": a.kind().as_str(),
                    "file": a.record.file,
                    "manifest": a.manifest_path.display().to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if assets.is_empty() {
        println!("No assets found in {}", config.data_root.display());
    } else {
        println!("{} asset(s):\n", assets.len());
        for asset in &assets {
            println!("  {} ({})", asset.id(), asset.kind());
        }
    }

    Ok(())
}

fn run_info(config: &KilnConfig, id: &str) -> Result<()> {
    let Some(asset_id) = AssetId::parse(id) else {
        bail!("Expected an asset id of the form Module:name, got '{}'", id);
    };
    let registry = ModuleRegistry::load(&config.data_root)?;
    let Some(asset) = registry.get(&asset_id) else {
        bail!("Asset '{}' not found", id);
    };

    let record = &asset.record;
    println!("Asset: {}", asset_id);
    println!("  Kind: {}", asset.kind());
    println!("  Manifest: {}", asset.manifest_path.display());
    if let Some(file) = &record.file {
        println!("  File: {}", file);
    }
    if let Some(hash) = &record.source_hash {
        println!("  Source hash: {}", hash);
    }

    match &record.details {
        RecordDetails::Image(image) => {
            println!("  Role: {}", image.image_type.as_str());
            if let (Some(w), Some(h)) = (image.width, image.height) {
                println!("  Size: {}x{}", w, h);
            }
            println!("  Mips: {}  HDR: {}  Compressed: {}", image.use_mips, image.is_hdr, image.compressed);
        }
        RecordDetails::Model(model) => {
            println!("  Meshes: {}", model.mesh_count);
            println!("  LOD: {}", model.lod_type);
            if !model.materials.is_empty() {
                println!("  Materials: {}", model.materials.join(", "));
            }
            if !model.animations.is_empty() {
                println!("  Animations: {}", model.animations.join(", "));
            }
            if !model.embedded_clips.is_empty() {
                println!("  Embedded clips: {}", model.embedded_clips.join(", "));
            }
            if let Some(collision) = &model.collision {
                println!("  Collision: {} ({})", collision.collision_type, collision.mesh_prefix);
            }
        }
        RecordDetails::Animation(anim) => {
            println!("  Frames: {}..{}", anim.start_frame, anim.end_frame);
            if let Some(shape) = &anim.shape {
                println!("  Shape: {}", shape);
            }
        }
        RecordDetails::Material(material) => {
            if !material.maps.is_empty() {
                println!("  Maps:");
                for (role, map) in &material.maps {
                    match map {
                        TextureRef::Asset { asset } => println!("    {}: {}", role, asset),
                        TextureRef::File { file } => println!("    {}: {} (file)", role, file),
                    }
                }
            }
        }
        RecordDetails::Sound(sound) => {
            println!("  Volume: {}  Pitch: {}", sound.volume, sound.pitch);
        }
        RecordDetails::Script | RecordDetails::Gui => {}
    }

    Ok(())
}
