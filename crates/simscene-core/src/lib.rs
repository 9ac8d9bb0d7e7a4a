//! Scene exchange between a 3D editor and a physics simulation engine
//!
//! This crate contains:
//! - Scene graph: rigid bodies, joints, motors, materials and sensors
//! - Mesh codec: the binary indexed triangle format shipped with a scene
//! - Transform and joint-frame resolution in pivot space
//! - Group merging of rigidly connected bodies
//! - Scene description reader and writer (XML)
//! - Export and import passes against an editor

pub mod config;
pub mod editor;
pub mod error;
pub mod format;
pub mod grouping;
pub mod joint_frame;
pub mod mesh;
pub mod pipeline;
pub mod scene;
pub mod transform;
pub mod types;

pub use config::{BridgeConfig, ConfigManager, FormatVersion, MotorDefaults};
pub use error::{ElementKind, ErrorKind, SceneError, SceneResult};
pub use grouping::{GroupMerger, merge_fixed_groups, reconcile_hierarchy};
pub use joint_frame::{JointFrame, resolve_joint_frame};
pub use pipeline::{ExportReport, ImportReport, export_scene, import_scene};
pub use scene::Scene;
pub use types::*;
