pub mod descriptor;
pub mod model;
pub mod registry;

pub use descriptor::{Decoder, DescriptorDecoder};
pub use model::{ConflictKey, Mod, ModLoader, ModScope, UNKNOWN_METADATA};
pub use registry::ModRegistry;
