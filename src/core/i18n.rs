use serde_json::{json, Value};
use tracing::warn;

use crate::core::error::InstallerResult;

pub const MOD_ADDED_NAME: &str = "messages.gui.mods.modAddedName";
pub const MOD_ADDED_ID: &str = "messages.gui.mods.modAddedId";

const MOD_NAME_TOKEN: &str = "$$MOD_NAME$$";
const MOD_ID_TOKEN: &str = "$$MOD_ID$$";

/// Nested JSON string table addressed by dotted keys.
#[derive(Debug, Clone)]
pub struct Language {
    root: Value,
}

impl Language {
    pub fn from_json(json: &str) -> InstallerResult<Self> {
        Ok(Self {
            root: serde_json::from_str(json)?,
        })
    }

    /// Built-in strings used when no translation file is present.
    pub fn english() -> Self {
        Self {
            root: json!({
                "messages": {
                    "gui": {
                        "mods": {
                            "modAddedName": "Mod with name '$$MOD_NAME$$' is already added!",
                            "modAddedId": "Mod with id '$$MOD_ID$$' is already added!"
                        }
                    }
                }
            }),
        }
    }

    /// Missing keys resolve to the key itself.
    pub fn get_string(&self, key: &str) -> String {
        let found = key
            .split('.')
            .try_fold(&self.root, |node, part| node.get(part))
            .and_then(Value::as_str);

        match found {
            Some(s) => s.to_string(),
            None => {
                warn!("Cannot find translation for {}", key);
                key.to_string()
            }
        }
    }

    pub fn mod_added_name(&self, name: &str) -> String {
        self.get_string(MOD_ADDED_NAME).replace(MOD_NAME_TOKEN, name)
    }

    pub fn mod_added_id(&self, id: &str) -> String {
        self.get_string(MOD_ADDED_ID).replace(MOD_ID_TOKEN, id)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}
