//! Export and import passes
//!
//! Export: editor query → [`Scene`](crate::scene::Scene) → group merge and
//! hierarchy reconciliation → relative transforms → joint frames → scene
//! description and mesh files. Import mirrors it and creates editor objects.

mod context;
mod export;
mod import;

pub use context::{IdAllocator, SceneBuildContext};
pub use export::{ExportReport, export_scene};
pub use import::{ImportReport, find_scene_file, import_scene};
