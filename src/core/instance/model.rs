use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{InstallerError, InstallerResult};
use crate::core::mods::{ModLoader, ModRegistry, ModScope};

/// Resolves where each kind of mod lives on disk, creating directories on
/// demand.
pub trait ModsLayout {
    fn mods_dir(&self, loader: ModLoader) -> InstallerResult<PathBuf>;
    fn jar_mods_dir(&self) -> InstallerResult<PathBuf>;
}

/// One registry per scope, persisted in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMods {
    pub data: ModRegistry,
    pub fabric: ModRegistry,
    pub quilt: ModRegistry,
    pub puzzle: ModRegistry,
    pub jar: ModRegistry,
}

impl Default for InstanceMods {
    fn default() -> Self {
        Self {
            data: ModRegistry::new(ModScope::Data),
            fabric: ModRegistry::new(ModScope::Fabric),
            quilt: ModRegistry::new(ModScope::Quilt),
            puzzle: ModRegistry::new(ModScope::Puzzle),
            jar: ModRegistry::new(ModScope::Jar),
        }
    }
}

impl InstanceMods {
    pub fn get(&self, scope: ModScope) -> &ModRegistry {
        match scope {
            ModScope::Data => &self.data,
            ModScope::Fabric => &self.fabric,
            ModScope::Quilt => &self.quilt,
            ModScope::Puzzle => &self.puzzle,
            ModScope::Jar => &self.jar,
        }
    }

    pub fn get_mut(&mut self, scope: ModScope) -> &mut ModRegistry {
        match scope {
            ModScope::Data => &mut self.data,
            ModScope::Fabric => &mut self.fabric,
            ModScope::Quilt => &mut self.quilt,
            ModScope::Puzzle => &mut self.puzzle,
            ModScope::Jar => &mut self.jar,
        }
    }
}

/// Game instance as persisted to disk in `instance.json`.
///
/// Each instance has its own folder under `instances/<uuid>/` with:
/// - `game/mods/`    — extracted vanilla data mods
/// - `fabric-mods/`, `quilt-mods/`, `puzzle-mods/` — loader mod archives
/// - `jarmods/`      — archives patched into the game jar
/// - `instance.json` — this serialized struct
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub loader: ModLoader,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub mods: InstanceMods,
}

impl Instance {
    pub fn new(name: String, loader: ModLoader, base_dir: &Path) -> Self {
        let id = Uuid::new_v4().to_string();
        let path = base_dir.join(&id);

        Self {
            id,
            name,
            path,
            loader,
            created_at: Utc::now(),
            mods: InstanceMods::default(),
        }
    }

    /// Path to the game working directory.
    pub fn game_dir(&self) -> PathBuf {
        self.path.join("game")
    }

    /// Where mods of `loader` are placed, without creating it.
    pub fn mods_path(&self, loader: ModLoader) -> PathBuf {
        match loader {
            ModLoader::Vanilla => self.game_dir().join("mods"),
            ModLoader::Fabric => self.path.join("fabric-mods"),
            ModLoader::Quilt => self.path.join("quilt-mods"),
            ModLoader::Puzzle => self.path.join("puzzle-mods"),
        }
    }

    pub fn jar_mods_path(&self) -> PathBuf {
        self.path.join("jarmods")
    }

    /// Directory holding the artifacts registered under `scope`.
    pub fn scope_path(&self, scope: ModScope) -> PathBuf {
        match scope {
            ModScope::Data => self.mods_path(ModLoader::Vanilla),
            ModScope::Fabric => self.mods_path(ModLoader::Fabric),
            ModScope::Quilt => self.mods_path(ModLoader::Quilt),
            ModScope::Puzzle => self.mods_path(ModLoader::Puzzle),
            ModScope::Jar => self.jar_mods_path(),
        }
    }

    /// Path to this instance's config file.
    pub fn config_path(&self) -> PathBuf {
        self.path.join("instance.json")
    }

    pub fn registry(&self, loader: ModLoader) -> &ModRegistry {
        self.mods.get(ModScope::for_loader(loader))
    }

    pub fn registry_mut(&mut self, loader: ModLoader) -> &mut ModRegistry {
        self.mods.get_mut(ModScope::for_loader(loader))
    }
}

fn ensure_dir(path: PathBuf) -> InstallerResult<PathBuf> {
    std::fs::create_dir_all(&path).map_err(|source| InstallerError::io(&path, source))?;
    Ok(path)
}

impl ModsLayout for Instance {
    fn mods_dir(&self, loader: ModLoader) -> InstallerResult<PathBuf> {
        ensure_dir(self.mods_path(loader))
    }

    fn jar_mods_dir(&self) -> InstallerResult<PathBuf> {
        ensure_dir(self.jar_mods_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mods::Mod;

    #[test]
    fn layout_creates_per_loader_directories() {
        let temp = tempfile::tempdir().unwrap();
        let instance = Instance::new("test".into(), ModLoader::Fabric, temp.path());

        let data = instance.mods_dir(ModLoader::Vanilla).unwrap();
        assert!(data.is_dir());
        assert!(data.ends_with("game/mods"));

        let fabric = instance.mods_dir(ModLoader::Fabric).unwrap();
        assert!(fabric.ends_with("fabric-mods"));
        assert!(instance.jar_mods_dir().unwrap().is_dir());
    }

    #[test]
    fn registries_are_scoped_per_loader() {
        let mut instance = Instance::new("test".into(), ModLoader::Quilt, Path::new("/tmp"));
        instance
            .registry_mut(ModLoader::Quilt)
            .add(Mod::unknown("a.jar"))
            .unwrap();

        assert_eq!(instance.registry(ModLoader::Quilt).len(), 1);
        assert!(instance.registry(ModLoader::Fabric).is_empty());
        assert_eq!(instance.registry(ModLoader::Vanilla).scope(), ModScope::Data);
    }

    #[test]
    fn instance_json_round_trips_mods_in_order() {
        let mut instance = Instance::new("test".into(), ModLoader::Vanilla, Path::new("/tmp"));
        for name in ["zeta", "alpha", "mid"] {
            instance.mods.data.add(Mod::named(name)).unwrap();
        }
        instance.mods.jar.add(Mod::named("patch.zip")).unwrap();

        let json = serde_json::to_string(&instance).unwrap();
        let back: Instance = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mods, instance.mods);
        let names: Vec<_> = back.mods.data.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }
}
