pub mod inspector;

pub use inspector::{find_top_level_directory, ArchiveHeader, ModArchive, MAX_TEXT_ENTRY_BYTES};
