use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{InstallerError, InstallerResult};

/// Descriptor payloads are small; anything larger is not a descriptor.
pub const MAX_TEXT_ENTRY_BYTES: u64 = 1024 * 1024;

/// One entry of an archive's central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

impl ArchiveHeader {
    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: false,
            size: 0,
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: true,
            size: 0,
        }
    }
}

/// An opened zip container.
pub struct ModArchive {
    path: PathBuf,
    archive: zip::ZipArchive<File>,
}

impl ModArchive {
    pub fn open(path: &Path) -> InstallerResult<Self> {
        let file = File::open(path).map_err(|e| InstallerError::archive(path, e))?;
        let archive = zip::ZipArchive::new(file).map_err(|e| InstallerError::archive(path, e))?;

        debug!("Opened archive {:?} ({} entries)", path, archive.len());
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    pub fn headers(&mut self) -> InstallerResult<Vec<ArchiveHeader>> {
        let mut headers = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(index)
                .map_err(|e| InstallerError::archive(&self.path, e))?;
            headers.push(ArchiveHeader {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
                size: entry.size(),
            });
        }
        Ok(headers)
    }

    /// Case-sensitive exact match on the full entry path.
    pub fn find_entry(&self, name: &str) -> Option<usize> {
        self.archive.index_for_name(name)
    }

    pub fn read_entry_as_text(&mut self, index: usize) -> InstallerResult<String> {
        let entry = self
            .archive
            .by_index(index)
            .map_err(|e| InstallerError::archive(&self.path, e))?;

        if entry.size() > MAX_TEXT_ENTRY_BYTES {
            return Err(InstallerError::archive(
                &self.path,
                format!(
                    "entry '{}' is {} bytes, over the {} byte limit",
                    entry.name(),
                    entry.size(),
                    MAX_TEXT_ENTRY_BYTES
                ),
            ));
        }

        let name = entry.name().to_string();
        let mut text = String::new();
        entry
            .take(MAX_TEXT_ENTRY_BYTES)
            .read_to_string(&mut text)
            .map_err(|e| InstallerError::archive(&self.path, format!("entry '{name}': {e}")))?;
        Ok(text)
    }

    /// Extracts every entry under `destination`, keeping relative paths.
    ///
    /// Nothing is rolled back on failure.
    pub fn extract_all(&mut self, destination: &Path) -> InstallerResult<()> {
        std::fs::create_dir_all(destination)
            .map_err(|source| InstallerError::extraction(destination, source))?;

        for index in 0..self.archive.len() {
            let mut zipped = self
                .archive
                .by_index(index)
                .map_err(|e| InstallerError::archive(&self.path, e))?;

            let Some(rel_path) = zipped.enclosed_name() else {
                return Err(InstallerError::archive(
                    &self.path,
                    format!("entry '{}' escapes the destination", zipped.name()),
                ));
            };
            let out_path = destination.join(rel_path);

            if zipped.is_dir() {
                std::fs::create_dir_all(&out_path)
                    .map_err(|source| InstallerError::extraction(&out_path, source))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| InstallerError::extraction(parent, source))?;
            }

            let mut out = File::create(&out_path)
                .map_err(|source| InstallerError::extraction(&out_path, source))?;
            std::io::copy(&mut zipped, &mut out)
                .map_err(|source| InstallerError::extraction(&out_path, source))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = zipped.unix_mode() {
                    std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                        .map_err(|source| InstallerError::extraction(&out_path, source))?;
                }
            }
        }

        debug!("Extracted {:?} into {:?}", self.path, destination);
        Ok(())
    }
}

/// Name of the one directory every entry lives under, without the trailing
/// slash. `None` for flat or mixed-root archives, and for any entry that
/// would resolve outside the extraction directory.
pub fn find_top_level_directory(headers: &[ArchiveHeader]) -> Option<String> {
    let mut root: Option<&str> = None;

    for header in headers {
        let name = header.name.trim_start_matches("./");
        if !is_enclosed(name) {
            return None;
        }

        let first = match name.split_once('/') {
            Some((first, _)) => first,
            // A bare name at the root is only acceptable as the directory itself.
            None if header.is_dir => name,
            None => return None,
        };

        if first.is_empty() || first == "." {
            return None;
        }

        match root {
            None => root = Some(first),
            Some(existing) if existing == first => {}
            Some(_) => return None,
        }
    }

    root.map(str::to_string)
}

/// Lexical check that an entry name stays below the directory it is
/// extracted into.
fn is_enclosed(name: &str) -> bool {
    !name.starts_with('/')
        && !name.contains('\\')
        && !name.contains(':')
        && name.split('/').all(|segment| segment != "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn single_root_is_found() {
        let headers = vec![
            ArchiveHeader::dir("terrain-pack/"),
            ArchiveHeader::file("terrain-pack/blocks/stone.json"),
            ArchiveHeader::file("terrain-pack/textures/stone.png"),
        ];
        assert_eq!(
            find_top_level_directory(&headers).as_deref(),
            Some("terrain-pack")
        );
    }

    #[test]
    fn escaping_entries_have_no_root() {
        let parent = vec![ArchiveHeader::file("../evil/a.txt")];
        assert_eq!(find_top_level_directory(&parent), None);

        let nested_parent = vec![
            ArchiveHeader::dir("pack/"),
            ArchiveHeader::file("pack/../../outside.txt"),
        ];
        assert_eq!(find_top_level_directory(&nested_parent), None);

        let absolute = vec![ArchiveHeader::file("/etc/pack/a.txt")];
        assert_eq!(find_top_level_directory(&absolute), None);

        let drive = vec![ArchiveHeader::file("C:\\pack\\a.txt")];
        assert_eq!(find_top_level_directory(&drive), None);

        let current = vec![ArchiveHeader::dir("./."), ArchiveHeader::file("./a.txt")];
        assert_eq!(find_top_level_directory(&current), None);
    }

    #[test]
    fn root_without_explicit_directory_entry_is_found() {
        let headers = vec![
            ArchiveHeader::file("pack/a.json"),
            ArchiveHeader::file("pack/nested/b.json"),
        ];
        assert_eq!(find_top_level_directory(&headers).as_deref(), Some("pack"));
    }

    #[test]
    fn mixed_or_flat_archives_have_no_root() {
        let mixed = vec![
            ArchiveHeader::file("one/a.json"),
            ArchiveHeader::file("two/b.json"),
        ];
        assert_eq!(find_top_level_directory(&mixed), None);

        let flat = vec![ArchiveHeader::file("a.json"), ArchiveHeader::file("b.json")];
        assert_eq!(find_top_level_directory(&flat), None);

        let file_beside_root = vec![
            ArchiveHeader::dir("pack/"),
            ArchiveHeader::file("pack/a.json"),
            ArchiveHeader::file("readme.txt"),
        ];
        assert_eq!(find_top_level_directory(&file_beside_root), None);

        assert_eq!(find_top_level_directory(&[]), None);
    }

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, body) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn open_rejects_non_zip_files() {
        let temp = tempfile::tempdir().unwrap();
        let bogus = temp.path().join("bogus.zip");
        std::fs::write(&bogus, b"definitely not a zip").unwrap();

        let err = ModArchive::open(&bogus).err().unwrap();
        assert!(matches!(err, InstallerError::Archive { .. }));

        let missing = ModArchive::open(&temp.path().join("missing.zip")).err().unwrap();
        assert!(matches!(missing, InstallerError::Archive { .. }));
    }

    #[test]
    fn find_entry_is_exact_and_case_sensitive() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("mod.jar");
        write_zip(
            &path,
            &[
                ("fabric.mod.json", r#"{"id":"m1"}"#),
                ("nested/fabric.mod.json", "{}"),
            ],
        );

        let mut archive = ModArchive::open(&path).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.find_entry("Fabric.mod.json").is_none());
        assert!(archive.find_entry("quilt.mod.json").is_none());

        let index = archive.find_entry("fabric.mod.json").unwrap();
        assert_eq!(archive.read_entry_as_text(index).unwrap(), r#"{"id":"m1"}"#);
    }

    #[test]
    fn extract_all_preserves_relative_paths() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pack.zip");
        write_zip(
            &path,
            &[
                ("pack/", ""),
                ("pack/a.txt", "alpha"),
                ("pack/deep/b.txt", "beta"),
            ],
        );

        let dest = temp.path().join("out");
        let mut archive = ModArchive::open(&path).unwrap();
        let headers = archive.headers().unwrap();
        assert_eq!(headers.len(), 3);
        assert!(headers[0].is_dir);

        archive.extract_all(&dest).unwrap();
        assert_eq!(std::fs::read_to_string(dest.join("pack/a.txt")).unwrap(), "alpha");
        assert_eq!(
            std::fs::read_to_string(dest.join("pack/deep/b.txt")).unwrap(),
            "beta"
        );
    }
}
