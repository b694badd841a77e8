use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::core::mods::ModLoader;

/// What the file picker should offer the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    pub title: String,
    /// Accepted archive extensions, without the dot.
    pub extensions: Vec<String>,
    pub allow_directories: bool,
    pub start_dir: Option<PathBuf>,
}

impl PickRequest {
    /// Data mods may be picked as a folder or a zip; loader mods as archives.
    pub fn for_loader(loader: ModLoader, start_dir: Option<PathBuf>) -> Self {
        if loader.installs_data_mods() {
            Self {
                title: "Select a data mod".into(),
                extensions: vec!["zip".into()],
                allow_directories: true,
                start_dir,
            }
        } else {
            Self {
                title: format!("Select a {loader} mod"),
                extensions: vec!["zip".into(), "jar".into()],
                allow_directories: false,
                start_dir,
            }
        }
    }

    pub fn for_jar_mod(start_dir: Option<PathBuf>) -> Self {
        Self {
            title: "Select a jar mod".into(),
            extensions: vec!["zip".into(), "jar".into()],
            allow_directories: false,
            start_dir,
        }
    }
}

/// File selection service. `None` means the user cancelled.
#[async_trait]
pub trait SourcePicker: Send + Sync {
    async fn pick(&self, request: &PickRequest) -> Option<PathBuf>;
}

/// Shows conflict messages to the user.
pub trait ConflictSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Sink for headless use: conflicts only reach the log.
pub struct LogConflictSink;

impl ConflictSink for LogConflictSink {
    fn notify(&self, message: &str) {
        warn!("{}", message);
    }
}
