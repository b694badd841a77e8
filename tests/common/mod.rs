#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mod_installer_lib::core::i18n::Language;
use mod_installer_lib::{ConflictSink, ModInstaller, PickRequest, SourcePicker};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes a zip at `path`. Entries ending in `/` become directories.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, body) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.trim_end_matches('/'), options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap();
    path.to_path_buf()
}

#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ConflictSink for RecordingSink {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Picker that answers every request with a fixed choice.
pub struct FixedPicker {
    pub choice: Option<PathBuf>,
    pub requests: Mutex<Vec<PickRequest>>,
}

impl FixedPicker {
    pub fn new(choice: Option<PathBuf>) -> Self {
        Self {
            choice,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SourcePicker for FixedPicker {
    async fn pick(&self, request: &PickRequest) -> Option<PathBuf> {
        self.requests.lock().unwrap().push(request.clone());
        self.choice.clone()
    }
}

pub fn installer() -> (ModInstaller, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let installer = ModInstaller::new(Language::english(), sink.clone());
    (installer, sink)
}
