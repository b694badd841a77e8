// ─── Mod Installer Core ───
// Acquisition and installation pipeline for game mods.
//
// Architecture:
//   core/
//     archive/    — Zip inspection: headers, entry lookup, extraction
//     mods/       — Mod record, loaders, descriptor decoders, registry
//     install/    — Install state machine + file placement
//     task/       — Background executor + interactive dispatcher
//     instance/   — Instance model, layout + CRUD manager
//     state/      — Settings and application state
//     i18n        — Message catalog

pub mod archive;
pub mod error;
pub mod i18n;
pub mod install;
pub mod instance;
pub mod mods;
pub mod state;
pub mod task;
