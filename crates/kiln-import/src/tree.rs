//! The batch arena holding an import forest

use crate::item::ImportItem;
use kiln_core::{ItemId, KilnError, Result};

/// Every item created since the last `begin_batch`.
///
/// Items live in an append-only arena and refer to each other by [`ItemId`].
/// Removing an item detaches its subtree and tombstones it; handles are never
/// handed out again within the same batch.
#[derive(Debug, Default, Clone)]
pub struct Batch {
    items: Vec<ImportItem>,
    roots: Vec<ItemId>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every item
    pub fn clear(&mut self) {
        self.items.clear();
        self.roots.clear();
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| !i.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn roots(&self) -> &[ItemId] {
        &self.roots
    }

    pub fn get(&self, id: ItemId) -> Option<&ImportItem> {
        self.items.get(id.index()).filter(|i| !i.removed)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut ImportItem> {
        self.items.get_mut(id.index()).filter(|i| !i.removed)
    }

    /// Like [`Batch::get`], failing with `ItemNotFound`
    pub fn item(&self, id: ItemId) -> Result<&ImportItem> {
        self.get(id).ok_or(KilnError::ItemNotFound(id))
    }

    /// Like [`Batch::get_mut`], failing with `ItemNotFound`
    pub fn item_mut(&mut self, id: ItemId) -> Result<&mut ImportItem> {
        self.get_mut(id).ok_or(KilnError::ItemNotFound(id))
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Live items in arena order
    pub fn items(&self) -> impl Iterator<Item = &ImportItem> {
        self.items.iter().filter(|i| !i.removed)
    }

    fn push(&mut self, mut item: ImportItem) -> ItemId {
        let id = ItemId::from_index(self.items.len());
        item.id = id;
        item.parent = None;
        item.children.clear();
        item.removed = false;
        self.items.push(item);
        id
    }

    /// Add a new root item
    pub fn insert_root(&mut self, item: ImportItem) -> ItemId {
        let id = self.push(item);
        self.roots.push(id);
        id
    }

    /// Add a new item as the last child of `parent`
    pub fn insert_child(&mut self, parent: ItemId, item: ImportItem) -> Result<ItemId> {
        self.item(parent)?;
        let id = self.push(item);
        self.items[id.index()].parent = Some(parent);
        self.items[parent.index()].children.push(id);
        Ok(id)
    }

    /// Move an existing item under a new parent.
    ///
    /// Fails when `parent` is the item itself or one of its descendants.
    pub fn attach(&mut self, child: ItemId, parent: ItemId) -> Result<()> {
        self.item(child)?;
        self.item(parent)?;
        if child == parent || self.is_ancestor(child, parent) {
            return Err(KilnError::CycleDetected(format!(
                "{} cannot be placed under its own descendant {}",
                child, parent
            )));
        }

        self.detach(child);
        self.items[child.index()].parent = Some(parent);
        self.items[parent.index()].children.push(child);
        Ok(())
    }

    fn detach(&mut self, id: ItemId) {
        match self.items[id.index()].parent.take() {
            Some(parent) => self.items[parent.index()].children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
    }

    /// Remove an item and its whole subtree from the batch
    pub fn remove(&mut self, id: ItemId) -> Result<()> {
        self.item(id)?;
        self.detach(id);
        for removed in self.subtree(id) {
            self.items[removed.index()].removed = true;
        }
        Ok(())
    }

    /// Remove every child of `id` (and their subtrees)
    pub fn remove_children(&mut self, id: ItemId) -> Result<()> {
        let children = self.item(id)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Whether `ancestor` is a proper ancestor of `id`
    pub fn is_ancestor(&self, ancestor: ItemId, id: ItemId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut current = self.items.get(id.index()).and_then(|i| i.parent);
        while let Some(parent) = current {
            if out.contains(&parent) {
                break;
            }
            out.push(parent);
            current = self.items[parent.index()].parent;
        }
        out
    }

    /// Whether `id` or any ancestor is marked skip
    pub fn is_skipped(&self, id: ItemId) -> bool {
        let own = self.get(id).map(|i| i.skip).unwrap_or(false);
        own || self
            .ancestors(id)
            .iter()
            .any(|a| self.items[a.index()].skip)
    }

    /// Whether `id` itself or an ancestor has the given kind and source.
    ///
    /// The builder consults this before deriving a child so that a derived
    /// item never aliases one of its own ancestors.
    pub fn aliases_lineage(&self, id: ItemId, item: &ImportItem) -> bool {
        let Some(source) = item.source() else {
            return false;
        };
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|a| self.get(a))
            .any(|a| a.kind == item.kind && a.source() == Some(source))
    }

    /// `id` and all of its descendants in pre-order
    pub fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.items[current.index()].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Every live item, roots in order, each followed by its descendants
    pub fn preorder(&self) -> Vec<ItemId> {
        self.roots.iter().flat_map(|r| self.subtree(*r)).collect()
    }

    /// Live items whose working name is `name`
    pub fn find_by_name(&self, name: &str) -> Vec<ItemId> {
        self.items()
            .filter(|i| i.asset_name == name)
            .map(|i| i.id)
            .collect()
    }

}
