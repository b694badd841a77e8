use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{ConflictKey, Mod, ModScope};
use crate::core::error::{InstallerError, InstallerResult};

/// Ordered mod list of one scope of one instance.
///
/// Lookups are linear scans; registries hold tens of entries. The registry
/// does no locking of its own: callers serialize writers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModRegistry {
    scope: ModScope,
    #[serde(default)]
    mods: Vec<Mod>,
}

impl ModRegistry {
    pub fn new(scope: ModScope) -> Self {
        Self {
            scope,
            mods: Vec::new(),
        }
    }

    pub fn scope(&self) -> ModScope {
        self.scope
    }

    /// Fails with the conflict error `add` would return, without mutating.
    pub fn check(&self, candidate: &Mod) -> InstallerResult<()> {
        match self.scope.conflict_key(candidate) {
            ConflictKey::Name => match self.find_by_name(&candidate.name) {
                Some(_) => Err(InstallerError::DuplicateName(candidate.name.clone())),
                None => Ok(()),
            },
            ConflictKey::Id => match self.find_by_id(&candidate.id) {
                Some(_) => Err(InstallerError::DuplicateId(candidate.id.clone())),
                None => Ok(()),
            },
        }
    }

    pub fn add(&mut self, m: Mod) -> InstallerResult<()> {
        self.check(&m)?;
        debug!("Registered {} mod '{}' ({})", scope_label(self.scope), m.name, m.id);
        self.mods.push(m);
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Mod> {
        self.mods.iter().find(|m| m.name == name)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Mod> {
        self.mods.iter().find(|m| m.id == id)
    }

    pub fn find_by_file_name(&self, file_name: &str) -> Option<&Mod> {
        self.mods.iter().find(|m| m.file_name == file_name)
    }

    /// Drops the entry; the artifact on disk is left to the caller.
    pub fn remove(&mut self, file_name: &str) -> Option<Mod> {
        let index = self.mods.iter().position(|m| m.file_name == file_name)?;
        Some(self.mods.remove(index))
    }

    /// Returns false when no mod has that file name.
    pub fn set_active(&mut self, file_name: &str, active: bool) -> bool {
        match self.mods.iter_mut().find(|m| m.file_name == file_name) {
            Some(m) => {
                m.active = active;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mod> {
        self.mods.iter()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}

fn scope_label(scope: ModScope) -> &'static str {
    match scope {
        ModScope::Data => "data",
        ModScope::Fabric => "fabric",
        ModScope::Quilt => "quilt",
        ModScope::Puzzle => "puzzle",
        ModScope::Jar => "jar",
    }
}
