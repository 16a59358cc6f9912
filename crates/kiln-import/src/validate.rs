//! Validation of an import batch against itself, the registry and the disk

use crate::item::{ItemStatus, Resolution, StatusType};
use crate::profile::ImportProfile;
use crate::tree::Batch;
use kiln_asset::{AssetFs, AssetKind, AssetRegistry};
use kiln_core::ItemId;
use log::debug;
use std::collections::HashMap;

/// One flagged item
#[derive(Debug, Clone)]
pub struct Issue {
    pub item: ItemId,
    pub asset_name: String,
    pub kind: AssetKind,
    pub status: ItemStatus,
    pub status_type: StatusType,
    pub message: String,
}

/// Result of a validation pass
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any item is flagged
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.status == ItemStatus::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.status == ItemStatus::Warning)
            .count()
    }

    /// Issues of one kind of problem
    pub fn of_type(&self, status_type: StatusType) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(move |i| i.status_type == status_type)
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        if self.issues.is_empty() {
            return "No issues found.".to_string();
        }
        format!(
            "{} issue(s): {} error(s), {} warning(s)",
            self.issues.len(),
            self.error_count(),
            self.warning_count(),
        )
    }
}

/// Flags every live item of a batch.
///
/// Each pass starts from scratch: statuses are cleared and working names go
/// back to their clean names before the rules run. Rules, first match wins:
/// a name shared with another item of the batch, a name already taken in the
/// registry, a source file that is missing.
pub struct Validator<'a> {
    registry: &'a dyn AssetRegistry,
    fs: &'a dyn AssetFs,
    profile: &'a ImportProfile,
    reimport: bool,
}

impl<'a> Validator<'a> {
    pub fn new(
        registry: &'a dyn AssetRegistry,
        fs: &'a dyn AssetFs,
        profile: &'a ImportProfile,
        reimport: bool,
    ) -> Self {
        Self {
            registry,
            fs,
            profile,
            reimport,
        }
    }

    pub fn validate(&self, batch: &mut Batch) -> ValidationReport {
        let order = batch.preorder();
        for id in &order {
            if let Some(item) = batch.get_mut(*id) {
                item.reset_status();
            }
        }

        // Skipped subtrees never commit, so they cannot collide
        let active: Vec<ItemId> = order
            .iter()
            .copied()
            .filter(|id| !batch.is_skipped(*id))
            .collect();

        self.check_batch_duplicates(batch, &active);
        for id in &active {
            self.check_registry(batch, *id);
            self.check_source(batch, *id);
        }

        if self.profile.general.warnings_as_errors {
            for id in &active {
                if let Some(item) = batch.get_mut(*id) {
                    if item.status == ItemStatus::Warning {
                        item.status = ItemStatus::Error;
                    }
                }
            }
        }

        let mut report = ValidationReport::new();
        for id in &active {
            let Some(item) = batch.get(*id) else {
                continue;
            };
            if item.is_clean() {
                continue;
            }
            let message = item.status_info.clone().unwrap_or_default();
            debug!("{} '{}': {}", item.kind, item.asset_name, message);
            report.issues.push(Issue {
                item: *id,
                asset_name: item.asset_name.clone(),
                kind: item.kind,
                status: item.status,
                status_type: item.status_type,
                message,
            });
        }
        report
    }

    fn check_batch_duplicates(&self, batch: &mut Batch, active: &[ItemId]) {
        let mut by_name: HashMap<(String, String), Vec<ItemId>> = HashMap::new();
        for id in active {
            if let Some(item) = batch.get(*id) {
                by_name
                    .entry((item.module_name.clone(), item.asset_name.clone()))
                    .or_default()
                    .push(*id);
            }
        }

        for ids in by_name.values().filter(|ids| ids.len() > 1) {
            let labels: Vec<(ItemId, String)> = ids
                .iter()
                .filter_map(|id| batch.get(*id))
                .map(|item| {
                    (
                        item.id(),
                        format!("'{}' ({})", item.asset_name, item.kind.as_str()),
                    )
                })
                .collect();

            for (id, label) in &labels {
                let others: Vec<&str> = labels
                    .iter()
                    .filter(|(other, _)| other != id)
                    .map(|(_, l)| l.as_str())
                    .collect();
                let info = format!(
                    "{} has the same name as {} in this import; rename one of them",
                    label,
                    others.join(", ")
                );
                if let Some(item) = batch.get_mut(*id) {
                    item.flag(ItemStatus::Warning, StatusType::DuplicateImportAsset, info);
                }
            }
        }
    }

    fn check_registry(&self, batch: &mut Batch, id: ItemId) {
        if self.reimport {
            return;
        }
        let Some(item) = batch.get_mut(id) else {
            return;
        };
        if !item.is_clean() || item.resolution == Some(Resolution::Override) {
            return;
        }
        let Some(existing) = self.registry.find_by_name(&item.module_name, &item.asset_name) else {
            return;
        };

        if item.kind == AssetKind::Material && self.profile.materials.use_existing_materials {
            debug!("Reusing existing material {}", existing);
            item.reuses_existing = true;
            return;
        }

        let info = format!(
            "An asset named '{}' already exists in module '{}'; rename, override or use the original",
            item.asset_name,
            self.registry
                .asset_module(&existing)
                .unwrap_or_else(|| item.module_name.clone()),
        );
        item.flag(ItemStatus::Warning, StatusType::DuplicateAsset, info);
    }

    fn check_source(&self, batch: &mut Batch, id: ItemId) {
        let Some(item) = batch.get_mut(id) else {
            return;
        };
        if !item.is_clean() || item.skip || item.reuses_existing {
            return;
        }

        let info = match item.source() {
            Some(path) if !self.fs.exists(path) => {
                format!("Source file {} does not exist", path.display())
            }
            None if !item.generated => format!(
                "No source file was found for {} '{}'; pick a replacement file",
                item.kind.as_str(),
                item.asset_name
            ),
            _ => return,
        };
        item.flag(ItemStatus::Error, StatusType::MissingFile, info);
    }
}
