//! The import command: drop files, apply resolutions, commit

use anyhow::{anyhow, bail, Result};
use kiln_asset::{AssetKind, AssetRegistry, ModuleRegistry};
use kiln_core::ItemId;
use kiln_import::{
    DirectoryPicker, ImportSession, ItemStatus, KilnConfig, ProfileLibrary, RejectedFile,
    ResolveIntent,
};
use std::path::{Path, PathBuf};

/// Parsed arguments of `kiln import`
pub struct ImportArgs {
    pub files: Vec<String>,
    pub module: Option<String>,
    pub profile: Option<String>,
    pub reimport: bool,
    pub rename: Vec<String>,
    pub overrides: Vec<String>,
    pub use_original: Vec<String>,
    pub skip: Vec<String>,
    pub search_dirs: Vec<String>,
    pub dry_run: bool,
}

pub fn run(args: ImportArgs, config: &KilnConfig) -> Result<()> {
    let module = args
        .module
        .clone()
        .or_else(|| config.default_module.clone())
        .ok_or_else(|| anyhow!("No target module. Pass --module or set default_module in .kiln/config.toml"))?;

    let registry = ModuleRegistry::load(&config.data_root)?;
    if !registry.module_exists(&module) {
        bail!(
            "Module '{}' does not exist. Create it with: kiln module new {}",
            module,
            module
        );
    }
    let library = ProfileLibrary::load(&config.profiles_path)?;

    let mut session = ImportSession::new(registry, library, &config.data_root, &module);
    if !args.search_dirs.is_empty() {
        let dirs = args.search_dirs.iter().map(PathBuf::from).collect();
        session = session.with_picker(DirectoryPicker::new(dirs));
    }
    session.set_reimport(args.reimport);

    let profile = args
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile.clone());
    session.set_active_profile(&profile)?;

    session.begin_drop();
    let mut rejected: Vec<RejectedFile> = Vec::new();
    for file in &args.files {
        let path = Path::new(file);
        if !path.exists() {
            bail!("File not found: {}", file);
        }
        match session.drop_file(path) {
            Ok(roots) if roots.is_empty() => {
                println!("Ignoring {} (not an importable file type)", file)
            }
            Ok(_) => {}
            Err(e) => rejected.push(RejectedFile {
                name: file.clone(),
                reason: e.to_string(),
            }),
        }
    }
    let mut report = session.end_drop();
    rejected.append(&mut report.rejected);

    for query in &args.rename {
        let (old, new) = query
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected --rename OLD=NEW, got '{}'", query))?;
        let id = find_item(&session, old)?;
        report = session.resolve_item(id, ResolveIntent::Rename(new.to_string()))?;
        rejected.append(&mut report.rejected);
    }
    for name in &args.overrides {
        let id = find_item(&session, name)?;
        report = session.resolve_item(id, ResolveIntent::Override)?;
        rejected.append(&mut report.rejected);
    }
    for name in &args.use_original {
        let id = find_item(&session, name)?;
        report = session.resolve_item(id, ResolveIntent::UseOriginal)?;
        rejected.append(&mut report.rejected);
    }
    for name in &args.skip {
        let id = find_item(&session, name)?;
        report = session.toggle_skip(id, true)?;
        rejected.append(&mut report.rejected);
    }

    if !args.search_dirs.is_empty() && session.prompt_missing_files() > 0 {
        report = session.refresh();
        rejected.append(&mut report.rejected);
    }

    print_tree(&session);

    if !rejected.is_empty() {
        println!("\nRejected {} file(s):", rejected.len());
        for r in &rejected {
            println!("  {}: {}", r.name, r.reason);
        }
    }

    println!("\n{}", report.validation.summary());
    for issue in &report.validation.issues {
        println!("  [{}] {} ({}): {}", issue.status, issue.asset_name, issue.kind, issue.message);
    }

    if args.dry_run {
        println!("\nDry run, nothing committed.");
        return Ok(());
    }

    let commit = session.commit()?;
    println!("\nImport into '{}': {}", module, commit.summary());
    for id in &commit.committed {
        println!("  + {}", id);
    }
    for name in &commit.excluded {
        println!("  - {}", name);
    }
    for failure in &commit.errors {
        eprintln!("  ! {}: {}", failure.asset_name, failure.message);
    }

    if !commit.is_success() {
        bail!("{} item(s) failed to commit", commit.errors.len());
    }
    Ok(())
}

/// Find a batch item by name; `kind:name` picks between items sharing a name
fn find_item(session: &ImportSession<ModuleRegistry>, query: &str) -> Result<ItemId> {
    let (kind, name) = match query.split_once(':') {
        Some((k, n)) => match AssetKind::parse(k) {
            Some(kind) => (Some(kind), n),
            None => (None, query),
        },
        None => (None, query),
    };

    let matches: Vec<ItemId> = session
        .batch()
        .find_by_name(name)
        .into_iter()
        .filter(|&id| {
            kind.map_or(true, |k| session.batch().get(id).is_some_and(|item| item.kind == k))
        })
        .collect();

    match matches.as_slice() {
        [] => bail!("No item named '{}' in the import batch", query),
        [id] => Ok(*id),
        _ => bail!(
            "'{}' matches {} items; qualify it with the kind, e.g. model:{}",
            query,
            matches.len(),
            name
        ),
    }
}

fn print_tree(session: &ImportSession<ModuleRegistry>) {
    let batch = session.batch();
    if batch.is_empty() {
        println!("Nothing to import.");
        return;
    }
    println!("Import tree ({} item(s), profile '{}'):\n", batch.len(), session.profile().name);
    for &root in batch.roots() {
        print_item(session, root, 1);
    }
}

fn print_item(session: &ImportSession<ModuleRegistry>, id: ItemId, depth: usize) {
    let Some(item) = session.batch().get(id) else {
        return;
    };
    let marker = match item.status {
        ItemStatus::Clean => " ",
        ItemStatus::Warning => "?",
        ItemStatus::Error => "!",
    };
    let mut line = format!(
        "{}{} {} {} [{}]",
        "  ".repeat(depth),
        marker,
        item.kind,
        item.asset_name,
        item.module_name
    );
    if item.skip {
        line.push_str(" (skipped)");
    }
    if let Some(info) = &item.status_info {
        line.push_str(&format!(" - {}", info));
    }
    println!("{}", line);

    for &child in item.children() {
        print_item(session, child, depth + 1);
    }
}
