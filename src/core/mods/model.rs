use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder written into `version`/`description` of mods whose archive
/// carried no descriptor.
pub const UNKNOWN_METADATA: &str = "<unknown>";

/// Supported mod loaders — strongly typed, no magic strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModLoader {
    Vanilla,
    Fabric,
    Quilt,
    Puzzle,
}

impl ModLoader {
    pub const ALL: [ModLoader; 4] = [
        ModLoader::Vanilla,
        ModLoader::Fabric,
        ModLoader::Quilt,
        ModLoader::Puzzle,
    ];

    /// Descriptor entry looked up at the root of a mod archive.
    pub fn descriptor_file(&self) -> Option<&'static str> {
        match self {
            ModLoader::Vanilla => None,
            ModLoader::Fabric => Some("fabric.mod.json"),
            ModLoader::Quilt => Some("quilt.mod.json"),
            ModLoader::Puzzle => Some("puzzle.mod.json"),
        }
    }

    /// Vanilla installs extracted directories; every other loader installs
    /// single archives.
    pub fn installs_data_mods(&self) -> bool {
        matches!(self, ModLoader::Vanilla)
    }
}

impl std::fmt::Display for ModLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModLoader::Vanilla => write!(f, "vanilla"),
            ModLoader::Fabric => write!(f, "fabric"),
            ModLoader::Quilt => write!(f, "quilt"),
            ModLoader::Puzzle => write!(f, "puzzle"),
        }
    }
}

/// Which list of an instance a mod belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModScope {
    /// Extracted data mods of the vanilla loader.
    Data,
    Fabric,
    Quilt,
    Puzzle,
    /// Archives patched into the game jar.
    Jar,
}

/// How a registry decides that two mods are the same mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKey {
    Name,
    Id,
}

impl ModScope {
    pub fn for_loader(loader: ModLoader) -> Self {
        match loader {
            ModLoader::Vanilla => ModScope::Data,
            ModLoader::Fabric => ModScope::Fabric,
            ModLoader::Quilt => ModScope::Quilt,
            ModLoader::Puzzle => ModScope::Puzzle,
        }
    }

    /// Scopes whose mods normally carry a descriptor id.
    pub fn has_descriptor_identity(&self) -> bool {
        matches!(self, ModScope::Fabric | ModScope::Quilt | ModScope::Puzzle)
    }

    /// Descriptor-less mods fall back to name identity even in id-keyed scopes.
    pub fn conflict_key(&self, m: &Mod) -> ConflictKey {
        if self.has_descriptor_identity() && !m.is_unknown() {
            ConflictKey::Id
        } else {
            ConflictKey::Name
        }
    }
}

/// Installed artifact record, persisted inside `instance.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mod {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Artifact name inside the scope's directory.
    pub file_name: String,
    pub active: bool,
    /// Set for java mods installed without a descriptor.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unknown: bool,
}

impl Mod {
    /// A java mod whose archive carried no descriptor.
    pub fn unknown(file_name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: file_name.to_string(),
            version: UNKNOWN_METADATA.to_string(),
            description: UNKNOWN_METADATA.to_string(),
            file_name: file_name.to_string(),
            active: true,
            unknown: true,
        }
    }

    /// A data or jar mod, identified by its on-disk name.
    pub fn named(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            version: String::new(),
            description: String::new(),
            file_name: name.to_string(),
            active: true,
            unknown: false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_files_per_loader() {
        assert_eq!(ModLoader::Vanilla.descriptor_file(), None);
        assert_eq!(ModLoader::Fabric.descriptor_file(), Some("fabric.mod.json"));
        assert_eq!(ModLoader::Quilt.descriptor_file(), Some("quilt.mod.json"));
        assert_eq!(ModLoader::Puzzle.descriptor_file(), Some("puzzle.mod.json"));
    }

    #[test]
    fn unknown_mods_are_keyed_by_name_in_id_scopes() {
        let unknown = Mod::unknown("mystery.jar");
        assert!(unknown.is_unknown());
        assert_eq!(ModScope::Fabric.conflict_key(&unknown), ConflictKey::Name);

        let mut known = Mod::named("m1");
        known.version = "1.0".into();
        assert_eq!(ModScope::Quilt.conflict_key(&known), ConflictKey::Id);
        assert_eq!(ModScope::Data.conflict_key(&known), ConflictKey::Name);
        assert_eq!(ModScope::Jar.conflict_key(&known), ConflictKey::Name);
    }

    #[test]
    fn placeholder_metadata_does_not_make_a_mod_unknown() {
        let mut declared = Mod::named("m1");
        declared.version = UNKNOWN_METADATA.into();
        declared.description = UNKNOWN_METADATA.into();
        assert!(!declared.is_unknown());
        assert_eq!(ModScope::Fabric.conflict_key(&declared), ConflictKey::Id);

        let json = serde_json::to_string(&Mod::unknown("mystery.jar")).unwrap();
        let restored: Mod = serde_json::from_str(&json).unwrap();
        assert!(restored.is_unknown());

        let legacy: Mod = serde_json::from_str(
            r#"{"id":"m1","name":"Mod One","fileName":"m1.jar","active":true}"#,
        )
        .unwrap();
        assert!(!legacy.is_unknown());
    }

    #[test]
    fn unknown_mods_get_distinct_ids() {
        let a = Mod::unknown("a.jar");
        let b = Mod::unknown("a.jar");
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "a.jar");
        assert_eq!(a.file_name, "a.jar");
        assert!(a.active);
    }

    #[test]
    fn mod_serializes_camel_case() {
        let json = serde_json::to_value(Mod::named("terrain-pack")).unwrap();
        assert_eq!(json["fileName"], "terrain-pack");
        assert_eq!(json["active"], true);
    }
}
