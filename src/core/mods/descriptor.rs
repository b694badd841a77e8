use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::model::{Mod, ModLoader};
use crate::core::error::{InstallerError, InstallerResult};

/// Decodes one loader's descriptor payload into the canonical `Mod` shape.
pub trait DescriptorDecoder {
    fn decode(&self, text: &str) -> InstallerResult<Mod>;
}

/// Optional descriptor fields tolerate any JSON type; only strings are kept.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_string)))
}

/// Flat `{id, name, version, description}` layout shared by Fabric and Puzzle.
#[derive(Debug, Deserialize)]
struct FlatDescriptor {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuiltDescriptor {
    #[serde(default)]
    quilt_loader: Option<QuiltLoaderSection>,
    #[serde(flatten)]
    flat: FlatDescriptor,
}

#[derive(Debug, Deserialize)]
struct QuiltLoaderSection {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    version: Option<String>,
    #[serde(default)]
    metadata: Option<QuiltMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct QuiltMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
}

fn parse<'a, T: Deserialize<'a>>(file: &str, text: &'a str) -> InstallerResult<T> {
    serde_json::from_str(text).map_err(|e| InstallerError::MalformedDescriptor {
        file: file.to_string(),
        reason: e.to_string(),
    })
}

fn require_id(file: &str, id: Option<Value>) -> InstallerResult<String> {
    match id {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        Some(Value::String(_)) => Err(InstallerError::MalformedDescriptor {
            file: file.to_string(),
            reason: "'id' is empty".into(),
        }),
        Some(_) => Err(InstallerError::MalformedDescriptor {
            file: file.to_string(),
            reason: "'id' is not a string".into(),
        }),
        None => Err(InstallerError::MalformedDescriptor {
            file: file.to_string(),
            reason: "missing 'id'".into(),
        }),
    }
}

fn canonical(
    id: String,
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
) -> Mod {
    let name = name.filter(|n| !n.is_empty()).unwrap_or_else(|| id.clone());
    Mod {
        id,
        name,
        version: version.unwrap_or_default(),
        description: description.unwrap_or_default(),
        file_name: String::new(),
        active: true,
        unknown: false,
    }
}

fn decode_flat(file: &str, flat: FlatDescriptor) -> InstallerResult<Mod> {
    let id = require_id(file, flat.id)?;
    Ok(canonical(id, flat.name, flat.version, flat.description))
}

pub struct FabricDecoder;

impl DescriptorDecoder for FabricDecoder {
    fn decode(&self, text: &str) -> InstallerResult<Mod> {
        const FILE: &str = "fabric.mod.json";
        decode_flat(FILE, parse(FILE, text)?)
    }
}

/// Accepts both the `quilt_loader` layout and the flat layout.
pub struct QuiltDecoder;

impl DescriptorDecoder for QuiltDecoder {
    fn decode(&self, text: &str) -> InstallerResult<Mod> {
        const FILE: &str = "quilt.mod.json";
        let descriptor: QuiltDescriptor = parse(FILE, text)?;

        match descriptor.quilt_loader {
            Some(section) => {
                let id = require_id(FILE, section.id)?;
                let metadata = section.metadata.unwrap_or_default();
                Ok(canonical(
                    id,
                    metadata.name.or(descriptor.flat.name),
                    section.version.or(descriptor.flat.version),
                    metadata.description.or(descriptor.flat.description),
                ))
            }
            None => decode_flat(FILE, descriptor.flat),
        }
    }
}

pub struct PuzzleDecoder;

impl DescriptorDecoder for PuzzleDecoder {
    fn decode(&self, text: &str) -> InstallerResult<Mod> {
        const FILE: &str = "puzzle.mod.json";
        decode_flat(FILE, parse(FILE, text)?)
    }
}

/// Per-loader dispatch without `Box<dyn>`.
pub enum Decoder {
    Fabric(FabricDecoder),
    Quilt(QuiltDecoder),
    Puzzle(PuzzleDecoder),
}

impl Decoder {
    /// Vanilla mods carry no descriptor, so there is no decoder for them.
    pub fn for_loader(loader: ModLoader) -> Option<Self> {
        match loader {
            ModLoader::Vanilla => None,
            ModLoader::Fabric => Some(Self::Fabric(FabricDecoder)),
            ModLoader::Quilt => Some(Self::Quilt(QuiltDecoder)),
            ModLoader::Puzzle => Some(Self::Puzzle(PuzzleDecoder)),
        }
    }
}

impl DescriptorDecoder for Decoder {
    fn decode(&self, text: &str) -> InstallerResult<Mod> {
        match self {
            Decoder::Fabric(d) => d.decode(text),
            Decoder::Quilt(d) => d.decode(text),
            Decoder::Puzzle(d) => d.decode(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"id":"m1","name":"Mod One","version":"1.0"}"#;

    #[test]
    fn every_descriptor_loader_decodes_the_flat_sample() {
        for loader in [ModLoader::Fabric, ModLoader::Quilt, ModLoader::Puzzle] {
            let decoder = Decoder::for_loader(loader).unwrap();
            let m = decoder.decode(SAMPLE).unwrap();
            assert_eq!(m.id, "m1", "{loader}");
            assert_eq!(m.name, "Mod One", "{loader}");
            assert_eq!(m.version, "1.0", "{loader}");
            assert_eq!(m.description, "", "{loader}");
            assert!(m.active);
        }
    }

    #[test]
    fn vanilla_has_no_decoder() {
        assert!(Decoder::for_loader(ModLoader::Vanilla).is_none());
    }

    #[test]
    fn name_falls_back_to_id() {
        let m = FabricDecoder.decode(r#"{"id":"lonely"}"#).unwrap();
        assert_eq!(m.name, "lonely");
        assert_eq!(m.version, "");
    }

    #[test]
    fn unknown_and_mistyped_optional_fields_are_tolerated() {
        let text = r#"{
            "schemaVersion": 1,
            "id": "m2",
            "version": 3,
            "description": ["not", "a", "string"],
            "authors": ["someone"],
            "entrypoints": {"main": ["a.B"]}
        }"#;
        let m = PuzzleDecoder.decode(text).unwrap();
        assert_eq!(m.id, "m2");
        assert_eq!(m.version, "");
        assert_eq!(m.description, "");
    }

    #[test]
    fn missing_or_non_string_id_is_malformed() {
        for text in [r#"{"name":"No Id"}"#, r#"{"id":42}"#, r#"{"id":""}"#, "not json"] {
            let err = FabricDecoder.decode(text).unwrap_err();
            assert!(
                matches!(err, InstallerError::MalformedDescriptor { .. }),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn quilt_loader_layout_is_decoded() {
        let text = r#"{
            "schema_version": 1,
            "quilt_loader": {
                "group": "dev.example",
                "id": "cosmic_tweaks",
                "version": "0.4.2",
                "metadata": {"name": "Cosmic Tweaks", "description": "Small fixes"}
            }
        }"#;
        let m = QuiltDecoder.decode(text).unwrap();
        assert_eq!(m.id, "cosmic_tweaks");
        assert_eq!(m.name, "Cosmic Tweaks");
        assert_eq!(m.version, "0.4.2");
        assert_eq!(m.description, "Small fixes");
    }

    #[test]
    fn quilt_loader_section_without_id_is_malformed() {
        let err = QuiltDecoder
            .decode(r#"{"quilt_loader":{"version":"1.0"}}"#)
            .unwrap_err();
        assert!(matches!(err, InstallerError::MalformedDescriptor { .. }));
    }
}
