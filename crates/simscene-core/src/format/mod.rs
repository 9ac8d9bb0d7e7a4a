//! Scene description format
//!
//! The engine reads one XML document rooted at `<SceneFile>` with a
//! `<version>` and one list per element kind. Parsing goes through one
//! typed record per element kind ([`NodeRecord`], [`JointRecord`], and the
//! scene's own motor, material and sensor records).

mod reader;
mod schema;
mod writer;
mod xml;

pub use reader::{ParsedScene, parse_scene, read_scene_file};
pub use schema::{JointRecord, NodeRecord, PRIMITIVE_FILENAME, SceneDescription};
pub use writer::{write_scene, write_scene_file};
pub use xml::XmlWriter;
