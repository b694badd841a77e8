// ─── Host Commands ───
// Async entry points a frontend calls. Each mutating command holds the
// instance lock while it loads, works off the async threads and persists
// `instance.json`.

use std::path::PathBuf;

use tracing::info;

use crate::core::error::{InstallerError, InstallerResult};
use crate::core::install::{placement, ModInstaller};
use crate::core::instance::Instance;
use crate::core::mods::{Mod, ModLoader, ModScope};
use crate::core::state::AppState;

pub async fn create_instance(
    state: &AppState,
    name: &str,
    loader: ModLoader,
) -> InstallerResult<Instance> {
    state.instance_manager.create(name, loader).await
}

pub async fn list_instances(state: &AppState) -> InstallerResult<Vec<Instance>> {
    state.instance_manager.list().await
}

pub async fn delete_instance(state: &AppState, id: &str) -> InstallerResult<()> {
    let _guard = state.instance_manager.lock(id).await;
    state.instance_manager.delete(id).await
}

/// Installs `source` for the instance's own loader and saves the instance.
/// Installs into one instance run one at a time.
pub async fn install_mod(
    state: &AppState,
    installer: &ModInstaller,
    instance_id: &str,
    source: PathBuf,
) -> InstallerResult<Mod> {
    let _guard = state.instance_manager.lock(instance_id).await;
    let instance = state.instance_manager.load(instance_id).await?;
    let loader = instance.loader;
    run_install(state, installer, instance, move |installer, instance| {
        installer.install_from_source(&source, loader, instance)
    })
    .await
}

pub async fn install_jar_mod(
    state: &AppState,
    installer: &ModInstaller,
    instance_id: &str,
    source: PathBuf,
) -> InstallerResult<Mod> {
    let _guard = state.instance_manager.lock(instance_id).await;
    let instance = state.instance_manager.load(instance_id).await?;
    run_install(state, installer, instance, move |installer, instance| {
        installer.install_jar_mod(&source, instance)
    })
    .await
}

/// Caller holds the instance lock.
async fn run_install<F>(
    state: &AppState,
    installer: &ModInstaller,
    mut instance: Instance,
    install: F,
) -> InstallerResult<Mod>
where
    F: FnOnce(&ModInstaller, &mut Instance) -> InstallerResult<Mod> + Send + 'static,
{
    let installer = installer.clone();
    let (instance, result) = tokio::task::spawn_blocking(move || {
        let result = install(&installer, &mut instance);
        (instance, result)
    })
    .await
    .map_err(|e| InstallerError::TaskFailed {
        label: "install".into(),
        reason: e.to_string(),
    })?;

    let installed = result?;
    state.instance_manager.save(&instance).await?;
    Ok(installed)
}

pub async fn list_mods(
    state: &AppState,
    instance_id: &str,
    scope: ModScope,
) -> InstallerResult<Vec<Mod>> {
    let instance = state.instance_manager.load(instance_id).await?;
    Ok(instance.mods.get(scope).iter().cloned().collect())
}

pub async fn set_mod_active(
    state: &AppState,
    instance_id: &str,
    scope: ModScope,
    file_name: &str,
    active: bool,
) -> InstallerResult<()> {
    let _guard = state.instance_manager.lock(instance_id).await;
    let mut instance = state.instance_manager.load(instance_id).await?;
    if !instance.mods.get_mut(scope).set_active(file_name, active) {
        return Err(InstallerError::Other(format!("No mod named {file_name}")));
    }
    state.instance_manager.save(&instance).await
}

/// Unregisters a mod and deletes its artifact.
pub async fn remove_mod(
    state: &AppState,
    instance_id: &str,
    scope: ModScope,
    file_name: &str,
) -> InstallerResult<Mod> {
    let _guard = state.instance_manager.lock(instance_id).await;
    let mut instance = state.instance_manager.load(instance_id).await?;
    let removed = instance
        .mods
        .get_mut(scope)
        .remove(file_name)
        .ok_or_else(|| InstallerError::Other(format!("No mod named {file_name}")))?;

    let artifact = instance.scope_path(scope).join(&removed.file_name);
    tokio::task::spawn_blocking(move || placement::delete_if_exists(&artifact))
        .await
        .map_err(|e| InstallerError::TaskFailed {
            label: "remove".into(),
            reason: e.to_string(),
        })??;

    state.instance_manager.save(&instance).await?;
    info!("Removed '{}' from instance {}", removed.name, instance.id);
    Ok(removed)
}
