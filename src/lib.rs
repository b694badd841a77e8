pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::error::{ErrorKind, InstallerError, InstallerResult};
pub use crate::core::install::{
    ConflictSink, InstallOutcome, LogConflictSink, ModInstaller, PickRequest, SharedInstance,
    SourcePicker,
};
pub use crate::core::instance::{Instance, InstanceManager, ModsLayout};
pub use crate::core::mods::{Mod, ModLoader, ModRegistry, ModScope};
pub use crate::core::state::{AppState, ExtractionStrategy, InstallerSettings};
pub use crate::core::task::{Dispatcher, Executor, TaskHandle};

/// Initialize structured logging. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mod_installer_lib=debug")),
        )
        .try_init();
}

/// Installer wired to the state's language and extraction setting.
pub fn installer_for(state: &AppState, conflicts: std::sync::Arc<dyn ConflictSink>) -> ModInstaller {
    ModInstaller::new(state.language.clone(), conflicts).with_extraction(state.settings.extraction)
}
