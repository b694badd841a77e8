use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use super::model::Instance;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::mods::ModLoader;

/// Manages the lifecycle of instances on disk.
pub struct InstanceManager {
    /// Root directory where all instances live.
    instances_dir: PathBuf,
    /// One writer lock per instance id.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InstanceManager {
    pub fn new(instances_dir: PathBuf) -> Self {
        Self {
            instances_dir,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to one instance. Hold the guard across a
    /// load, mutate and save sequence.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(id.to_string()).or_default())
        };
        slot.lock_owned().await
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    /// Create a new instance on disk with every mods directory in place.
    pub async fn create(&self, name: &str, loader: ModLoader) -> InstallerResult<Instance> {
        let instance = Instance::new(name.to_string(), loader, &self.instances_dir);

        if instance.path.exists() {
            return Err(InstallerError::InstanceAlreadyExists(instance.id.clone()));
        }

        let data_dir = instance.mods_path(ModLoader::Vanilla);
        let fabric_dir = instance.mods_path(ModLoader::Fabric);
        let quilt_dir = instance.mods_path(ModLoader::Quilt);
        let puzzle_dir = instance.mods_path(ModLoader::Puzzle);
        let jar_dir = instance.jar_mods_path();

        tokio::try_join!(
            create_dir_safe(&data_dir),
            create_dir_safe(&fabric_dir),
            create_dir_safe(&quilt_dir),
            create_dir_safe(&puzzle_dir),
            create_dir_safe(&jar_dir),
        )?;

        self.save(&instance).await?;

        info!("Created instance '{}' ({})", instance.name, instance.id);
        Ok(instance)
    }

    /// Save instance metadata, mod registries included, to disk.
    pub async fn save(&self, instance: &Instance) -> InstallerResult<()> {
        let json = serde_json::to_string_pretty(instance)?;
        let config_path = instance.config_path();

        if let Some(parent) = config_path.parent() {
            create_dir_safe(parent).await?;
        }

        tokio::fs::write(&config_path, json)
            .await
            .map_err(|e| InstallerError::io(&config_path, e))?;

        Ok(())
    }

    /// Load a single instance by ID.
    pub async fn load(&self, id: &str) -> InstallerResult<Instance> {
        let config_path = self.instances_dir.join(id).join("instance.json");
        if !config_path.exists() {
            return Err(InstallerError::InstanceNotFound(id.to_string()));
        }

        let json = tokio::fs::read_to_string(&config_path)
            .await
            .map_err(|e| InstallerError::io(&config_path, e))?;

        let instance: Instance = serde_json::from_str(&json)?;
        Ok(instance)
    }

    /// List all instances, skipping unreadable ones.
    pub async fn list(&self) -> InstallerResult<Vec<Instance>> {
        let mut instances = Vec::new();

        if !self.instances_dir.exists() {
            return Ok(instances);
        }

        let mut entries = tokio::fs::read_dir(&self.instances_dir)
            .await
            .map_err(|e| InstallerError::io(&self.instances_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| InstallerError::io(&self.instances_dir, e))?
        {
            let config_path = entry.path().join("instance.json");
            if !config_path.exists() {
                continue;
            }
            match tokio::fs::read_to_string(&config_path).await {
                Ok(json) => match serde_json::from_str::<Instance>(&json) {
                    Ok(inst) => instances.push(inst),
                    Err(e) => {
                        tracing::warn!("Corrupt instance.json at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Cannot read {:?}: {}", config_path, e);
                }
            }
        }

        instances.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(instances)
    }

    /// Delete an instance, and every mod installed into it, from disk.
    pub async fn delete(&self, id: &str) -> InstallerResult<()> {
        let instance_dir = self.instances_dir.join(id);
        if !instance_dir.exists() {
            return Err(InstallerError::InstanceNotFound(id.to_string()));
        }

        tokio::fs::remove_dir_all(&instance_dir)
            .await
            .map_err(|e| InstallerError::io(&instance_dir, e))?;

        info!("Deleted instance {}", id);
        Ok(())
    }
}

async fn create_dir_safe(path: &Path) -> InstallerResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| InstallerError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mods::Mod;

    #[tokio::test]
    async fn create_save_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(temp.path().to_path_buf());

        let mut instance = manager.create("Survival", ModLoader::Puzzle).await.unwrap();
        assert!(instance.mods_path(ModLoader::Puzzle).is_dir());
        assert!(instance.jar_mods_path().is_dir());

        instance.mods.puzzle.add(Mod::unknown("first.jar")).unwrap();
        instance.mods.puzzle.add(Mod::unknown("second.jar")).unwrap();
        manager.save(&instance).await.unwrap();

        let loaded = manager.load(&instance.id).await.unwrap();
        assert_eq!(loaded.name, "Survival");
        assert_eq!(loaded.loader, ModLoader::Puzzle);
        assert_eq!(loaded.mods, instance.mods);

        let all = manager.list().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn instance_lock_is_exclusive_per_id() {
        let temp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(temp.path().to_path_buf());

        let held = manager.lock("a").await;
        let other = tokio::time::timeout(std::time::Duration::from_millis(50), manager.lock("b"))
            .await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(std::time::Duration::from_millis(50), manager.lock("a"))
            .await;
        assert!(same.is_err());

        drop(held);
        let _again = manager.lock("a").await;
    }

    #[tokio::test]
    async fn delete_removes_instance_and_missing_ids_error() {
        let temp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(temp.path().to_path_buf());
        let instance = manager.create("Doomed", ModLoader::Vanilla).await.unwrap();

        manager.delete(&instance.id).await.unwrap();
        assert!(!instance.path.exists());

        let err = manager.load(&instance.id).await.unwrap_err();
        assert!(matches!(err, InstallerError::InstanceNotFound(_)));
        assert!(manager.delete(&instance.id).await.is_err());
    }

    #[tokio::test]
    async fn list_skips_corrupt_instances() {
        let temp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(temp.path().to_path_buf());
        manager.create("Good", ModLoader::Fabric).await.unwrap();

        let broken = temp.path().join("broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("instance.json"), "{ nope").unwrap();

        let all = manager.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Good");
    }
}
