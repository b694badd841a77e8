use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::collaborators::{ConflictSink, PickRequest, SourcePicker};
use super::placement;
use super::stage::{InstallStage, StageTracker};
use crate::core::archive::{find_top_level_directory, ModArchive};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::i18n::Language;
use crate::core::instance::{Instance, ModsLayout};
use crate::core::mods::{Decoder, DescriptorDecoder, Mod, ModLoader, ModRegistry};
use crate::core::state::{ExtractionStrategy, InstallerSettings};
use crate::core::task::{Executor, TaskHandle};

/// Instance shared between the interactive side and install tasks. An
/// install holds the lock for its whole run.
pub type SharedInstance = Arc<Mutex<Instance>>;

/// Result handed to completion callbacks. `Ok(None)` means nothing was
/// picked.
pub type InstallOutcome = InstallerResult<Option<Mod>>;

/// Turns a picked source into an installed, registered mod.
#[derive(Clone)]
pub struct ModInstaller {
    language: Arc<Language>,
    conflicts: Arc<dyn ConflictSink>,
    extraction: ExtractionStrategy,
}

impl ModInstaller {
    pub fn new(language: Language, conflicts: Arc<dyn ConflictSink>) -> Self {
        Self {
            language: Arc::new(language),
            conflicts,
            extraction: ExtractionStrategy::default(),
        }
    }

    pub fn with_extraction(mut self, extraction: ExtractionStrategy) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn extraction(&self) -> ExtractionStrategy {
        self.extraction
    }

    // ── Blocking entry points ───────────────────────────

    /// Installs `source` for `loader` into `instance`.
    ///
    /// Vanilla sources become data mods (directory or single-root zip);
    /// every other loader takes a descriptor-bearing archive.
    pub fn install_from_source(
        &self,
        source: &Path,
        loader: ModLoader,
        instance: &mut Instance,
    ) -> InstallerResult<Mod> {
        let mut tracker = StageTracker::new(format!("{loader} install of {}", source.display()));
        tracker.enter(InstallStage::Classifying);

        let result = instance.mods_dir(loader).and_then(|mods_dir| {
            let registry = instance.registry_mut(loader);
            if loader.installs_data_mods() {
                self.install_data_mod(source, &mods_dir, registry, &mut tracker)
            } else {
                self.install_java_mod(source, loader, &mods_dir, registry, &mut tracker)
            }
        });

        self.finish(source, result, &mut tracker)
    }

    /// Installs an archive into the instance's jar mods.
    pub fn install_jar_mod(&self, source: &Path, instance: &mut Instance) -> InstallerResult<Mod> {
        let mut tracker = StageTracker::new(format!("jar mod install of {}", source.display()));
        tracker.enter(InstallStage::Classifying);

        let result = self.install_jar_archive(source, instance, &mut tracker);

        self.finish(source, result, &mut tracker)
    }

    // ── Async entry points ──────────────────────────────

    /// Runs `install_from_source` on the executor; `done` runs on the
    /// dispatcher with the outcome.
    pub fn submit_install<D>(
        &self,
        executor: &Executor,
        source: PathBuf,
        loader: ModLoader,
        instance: SharedInstance,
        done: D,
    ) -> TaskHandle
    where
        D: FnOnce(InstallOutcome) + Send + 'static,
    {
        let installer = self.clone();
        let label = format!("installing {loader} mod");
        executor.submit(
            &label,
            move || {
                let mut instance = instance.blocking_lock();
                installer
                    .install_from_source(&source, loader, &mut instance)
                    .map(Some)
            },
            done,
        )
    }

    pub fn submit_jar_install<D>(
        &self,
        executor: &Executor,
        source: PathBuf,
        instance: SharedInstance,
        done: D,
    ) -> TaskHandle
    where
        D: FnOnce(InstallOutcome) + Send + 'static,
    {
        let installer = self.clone();
        executor.submit(
            "installing jar mod",
            move || {
                let mut instance = instance.blocking_lock();
                installer.install_jar_mod(&source, &mut instance).map(Some)
            },
            done,
        )
    }

    /// Asks `picker` for a source matching the instance's loader, then
    /// submits the install. A cancelled pick calls `done(Ok(None))` right
    /// away and returns `None`.
    pub async fn pick_mod<D>(
        &self,
        picker: &dyn SourcePicker,
        settings: &mut InstallerSettings,
        executor: &Executor,
        instance: SharedInstance,
        done: D,
    ) -> Option<TaskHandle>
    where
        D: FnOnce(InstallOutcome) + Send + 'static,
    {
        let loader = instance.lock().await.loader;
        let request = PickRequest::for_loader(loader, settings.last_dir.clone());

        let Some(source) = picker.pick(&request).await else {
            info!("Mod selection cancelled");
            done(Ok(None));
            return None;
        };

        settings.remember_pick(&source);
        Some(self.submit_install(executor, source, loader, instance, done))
    }

    pub async fn pick_jar_mod<D>(
        &self,
        picker: &dyn SourcePicker,
        settings: &mut InstallerSettings,
        executor: &Executor,
        instance: SharedInstance,
        done: D,
    ) -> Option<TaskHandle>
    where
        D: FnOnce(InstallOutcome) + Send + 'static,
    {
        let request = PickRequest::for_jar_mod(settings.last_dir.clone());

        let Some(source) = picker.pick(&request).await else {
            info!("Jar mod selection cancelled");
            done(Ok(None));
            return None;
        };

        settings.remember_pick(&source);
        Some(self.submit_jar_install(executor, source, instance, done))
    }

    // ── Data mods ───────────────────────────────────────

    fn install_data_mod(
        &self,
        source: &Path,
        mods_dir: &Path,
        registry: &mut ModRegistry,
        tracker: &mut StageTracker,
    ) -> InstallerResult<Mod> {
        if source.is_dir() {
            let name = file_name_of(source)?;
            let data_mod = Mod::named(&name);

            tracker.enter(InstallStage::ConflictCheck);
            self.check_conflict(registry, &data_mod)?;

            tracker.enter(InstallStage::Placing);
            let dest = mods_dir.join(&name);
            if !placement::same_location(source, &dest) {
                placement::ensure_not_nested(source, &dest)?;
                placement::delete_if_exists(&dest)?;
                placement::copy_dir_recursive(source, &dest)?;
            }

            registry.add(data_mod.clone())?;
            return Ok(data_mod);
        }

        tracker.enter(InstallStage::Reading);
        let mut archive = ModArchive::open(source)?;
        let headers = archive.headers()?;
        let top_level = find_top_level_directory(&headers)
            .ok_or_else(|| InstallerError::AmbiguousArchiveLayout(source.to_path_buf()))?;

        let data_mod = Mod::named(&top_level);
        tracker.enter(InstallStage::ConflictCheck);
        self.check_conflict(registry, &data_mod)?;

        tracker.enter(InstallStage::Extracting);
        let dest = placement::child_path(mods_dir, &top_level)
            .ok_or_else(|| InstallerError::AmbiguousArchiveLayout(source.to_path_buf()))?;
        match self.extraction {
            ExtractionStrategy::InPlace => {
                placement::delete_if_exists(&dest)?;
                archive.extract_all(mods_dir)?;
            }
            ExtractionStrategy::Staged => {
                let staging = tempfile::Builder::new()
                    .prefix(".staging-")
                    .tempdir_in(mods_dir)
                    .map_err(|e| InstallerError::extraction(mods_dir, e))?;
                archive.extract_all(staging.path())?;

                tracker.enter(InstallStage::Placing);
                placement::delete_if_exists(&dest)?;
                std::fs::rename(staging.path().join(&top_level), &dest)
                    .map_err(|e| InstallerError::extraction(&dest, e))?;
            }
        }

        registry.add(data_mod.clone())?;
        Ok(data_mod)
    }

    // ── Java mods ───────────────────────────────────────

    fn install_java_mod(
        &self,
        source: &Path,
        loader: ModLoader,
        mods_dir: &Path,
        registry: &mut ModRegistry,
        tracker: &mut StageTracker,
    ) -> InstallerResult<Mod> {
        let file_name = file_name_of(source)?;

        tracker.enter(InstallStage::Reading);
        let mut java_mod = {
            let mut archive = ModArchive::open(source)?;
            let descriptor = loader
                .descriptor_file()
                .and_then(|name| archive.find_entry(name).map(|index| (name, index)));

            match descriptor {
                Some((_, index)) => {
                    let text = archive.read_entry_as_text(index)?;
                    tracker.enter(InstallStage::Parsing);
                    let decoder = Decoder::for_loader(loader).ok_or_else(|| {
                        InstallerError::Other(format!("No descriptor decoder for {loader}"))
                    })?;
                    decoder.decode(&text)?
                }
                None => {
                    warn!(
                        "{:?} does not contain '{}'",
                        source,
                        loader.descriptor_file().unwrap_or_default()
                    );
                    Mod::unknown(&file_name)
                }
            }
        };
        java_mod.file_name = file_name.clone();
        java_mod.active = true;

        tracker.enter(InstallStage::ConflictCheck);
        self.check_conflict(registry, &java_mod)?;

        tracker.enter(InstallStage::Placing);
        let dest = mods_dir.join(&file_name);
        if !placement::same_location(source, &dest) {
            placement::replace_file(source, &dest)?;
        }

        registry.add(java_mod.clone())?;
        Ok(java_mod)
    }

    // ── Jar mods ────────────────────────────────────────

    fn install_jar_archive(
        &self,
        source: &Path,
        instance: &mut Instance,
        tracker: &mut StageTracker,
    ) -> InstallerResult<Mod> {
        let jar_dir = instance.jar_mods_dir()?;
        let file_name = file_name_of(source)?;

        tracker.enter(InstallStage::Reading);
        drop(ModArchive::open(source)?);

        let jar_mod = Mod::named(&file_name);
        tracker.enter(InstallStage::ConflictCheck);
        self.check_conflict(&instance.mods.jar, &jar_mod)?;

        tracker.enter(InstallStage::Placing);
        let dest = jar_dir.join(&file_name);
        if !placement::same_location(source, &dest) {
            placement::replace_file(source, &dest)?;
        }

        instance.mods.jar.add(jar_mod.clone())?;
        Ok(jar_mod)
    }

    // ── Helpers ─────────────────────────────────────────

    /// Reports a conflict to the user before failing with it.
    fn check_conflict(&self, registry: &ModRegistry, candidate: &Mod) -> InstallerResult<()> {
        registry.check(candidate).inspect_err(|e| {
            let message = match e {
                InstallerError::DuplicateId(id) => self.language.mod_added_id(id),
                _ => self.language.mod_added_name(&candidate.name),
            };
            self.conflicts.notify(&message);
        })
    }

    fn finish(
        &self,
        source: &Path,
        result: InstallerResult<Mod>,
        tracker: &mut StageTracker,
    ) -> InstallerResult<Mod> {
        match &result {
            Ok(installed) => {
                tracker.enter(InstallStage::Registered);
                info!(
                    "Installed '{}' ({}) as {}",
                    installed.name, installed.id, installed.file_name
                );
            }
            Err(e) => {
                error!(
                    "Could not install {:?} during {}: {}",
                    source,
                    tracker.stage(),
                    e
                );
                tracker.enter(InstallStage::Failed);
            }
        }
        result
    }
}

fn file_name_of(path: &Path) -> InstallerResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| InstallerError::Other(format!("{:?} has no file name", path)))
}
