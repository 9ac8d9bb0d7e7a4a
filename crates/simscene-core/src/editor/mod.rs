//! Editor collaborator interface
//!
//! The 3D editor is reached only through [`EditorScene`]: a depth-first
//! query, read access to object snapshots, and a handful of creation calls.
//! Everything the bridge stores on editor objects (ids, group ids, joint
//! parameters) lives in the per-object property store under the names in
//! [`keys`].

mod document;

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SceneResult;
use crate::mesh::MeshBuffers;
use crate::types::{Pose, PrimitiveKind};

pub use document::{DocumentGeometry, DocumentObject, EditorDocument};

/// Property names used on editor objects
pub mod keys {
    pub const TYPE: &str = "type";
    pub const ID: &str = "id";
    pub const GROUP: &str = "group";
    pub const MASS: &str = "mass";
    pub const DENSITY: &str = "density";
    pub const PHYSIC_MODE: &str = "physicmode";
    pub const MATERIAL: &str = "material";
    pub const COLL_BITMASK: &str = "coll_bitmask";
    pub const MOVABLE: &str = "movable";
    pub const RADIUS: &str = "radius";
    pub const FILENAME: &str = "filename";

    pub const JOINT_TYPE: &str = "jointType";
    pub const NODE1: &str = "node1";
    pub const NODE2: &str = "node2";
    pub const ANCHOR: &str = "anchor";
    pub const INVERT_AXIS: &str = "invertAxis";
    pub const LOW_STOP: &str = "lowStop";
    pub const HIGH_STOP: &str = "highStop";
    pub const SPRING_CONST: &str = "springConst";
    pub const DAMPING_CONST: &str = "dampingConst";
    pub const ANGLE_OFFSET: &str = "angleOffset";

    pub const P: &str = "p";
    pub const I: &str = "i";
    pub const D: &str = "d";
    pub const MAX_VELOCITY: &str = "maxVelocity";
    pub const MAX_FORCE: &str = "maxForce";
    pub const MIN_VALUE: &str = "minValue";
    pub const MAX_VALUE: &str = "maxValue";
    pub const MOTOR_TYPE: &str = "motorType";
    pub const MOTOR_NAME: &str = "motorName";

    pub const SENSOR_TYPE: &str = "sensorType";
    pub const RATE: &str = "rate";
    pub const IDS: &str = "ids";
    pub const NODE_ID: &str = "nodeID";
    pub const JOINT_ID: &str = "jointID";
    pub const ATTACHED_NODE: &str = "attached_node";
    pub const WIDTH: &str = "width";
    pub const OPENING_WIDTH: &str = "opening_width";
    pub const MAX_DISTANCE: &str = "max_distance";
}

/// Handle of an editor object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub usize);

/// Object role, read from the `type` property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Body,
    Joint,
    Sensor,
    Other,
}

impl ObjectKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Body => "body",
            ObjectKind::Joint => "joint",
            ObjectKind::Sensor => "sensor",
            ObjectKind::Other => "other",
        }
    }

    pub fn from_properties(properties: &Properties) -> Self {
        match properties.get(keys::TYPE).and_then(PropertyValue::as_text) {
            Some("body") => ObjectKind::Body,
            Some("joint") => ObjectKind::Joint,
            Some("sensor") => ObjectKind::Sensor,
            _ => ObjectKind::Other,
        }
    }
}

/// Value in an object's property store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Text(String),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            PropertyValue::Int(i) => Some(*i != 0),
            PropertyValue::Text(t) => match t.trim().to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            PropertyValue::Bool(b) => Some(*b as i64),
            PropertyValue::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f32),
            PropertyValue::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Text form used when a property is copied into a generic field
    pub fn to_text(&self) -> String {
        match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::Text(t) => t.clone(),
            PropertyValue::List(l) => l.join(" "),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Open key-value property store of an editor object
pub type Properties = BTreeMap<String, PropertyValue>;

/// Typed lookups on a property store
pub trait PropertyExt {
    fn float(&self, key: &str) -> Option<f32>;
    fn int(&self, key: &str) -> Option<i64>;
    fn flag(&self, key: &str) -> Option<bool>;
    fn text(&self, key: &str) -> Option<&str>;
}

impl PropertyExt for Properties {
    fn float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(PropertyValue::as_float)
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(PropertyValue::as_int)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(PropertyValue::as_bool)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_text)
    }
}

/// Which objects an export pass covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// Named root objects and everything below them
    Roots(Vec<String>),
}

/// Geometry of an editor object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectGeometry {
    /// Marker object without geometry (joints, sensors)
    Empty,
    Primitive(PrimitiveKind),
    Mesh(MeshBuffers),
}

/// Snapshot of an editor object
#[derive(Debug, Clone, PartialEq)]
pub struct EditorObject {
    pub name: String,
    pub kind: ObjectKind,
    pub parent: Option<ObjectHandle>,
    /// World pose of the object origin
    pub world: Pose,
    /// Authored non-uniform scale
    pub scale: Option<Vec3>,
    /// Local-space bounding box corners
    pub bounding_box: [Vec3; 8],
    pub geometry: ObjectGeometry,
    pub properties: Properties,
}

impl EditorObject {
    /// Center and size of the local bounding box
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let (min, max) = self.bounding_box[1..]
            .iter()
            .fold((self.bounding_box[0], self.bounding_box[0]), |(min, max), c| {
                (min.min(*c), max.max(*c))
            });
        ((min + max) * 0.5, max - min)
    }
}

/// Corners of an axis-aligned box
pub fn box_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}

/// Editor-side material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorMaterial {
    pub name: String,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

/// Narrow interface to the 3D editor
pub trait EditorScene {
    /// Objects covered by `selection`, depth-first from the roots
    fn query(&self, selection: &Selection) -> Vec<ObjectHandle>;

    fn object(&self, handle: ObjectHandle) -> Option<EditorObject>;

    fn material(&self, name: &str) -> Option<EditorMaterial>;

    /// Create a primitive centered on `pose` with engine `extents`
    fn create_primitive(
        &mut self,
        name: &str,
        kind: PrimitiveKind,
        pose: Pose,
        extents: Vec3,
    ) -> ObjectHandle;

    /// Import a mesh file as a new object placed at `pose`
    fn import_mesh_asset(&mut self, name: &str, path: &Path, pose: Pose) -> SceneResult<ObjectHandle>;

    /// Create a marker object without geometry
    fn create_empty(&mut self, name: &str, pose: Pose) -> ObjectHandle;

    fn define_material(&mut self, material: EditorMaterial);

    fn set_parent(&mut self, child: ObjectHandle, parent: Option<ObjectHandle>) -> SceneResult<()>;

    fn set_property(&mut self, handle: ObjectHandle, key: &str, value: PropertyValue);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_coercion() {
        assert_eq!(PropertyValue::Text(" 2.5 ".into()).as_float(), Some(2.5));
        assert_eq!(PropertyValue::Int(3).as_float(), Some(3.0));
        assert_eq!(PropertyValue::Text("True".into()).as_bool(), Some(true));
        assert_eq!(PropertyValue::Float(1.0).as_int(), None);
        assert_eq!(PropertyValue::List(vec!["a".into(), "b".into()]).to_text(), "a b");
    }

    #[test]
    fn test_kind_from_type_property() {
        let mut properties = Properties::new();
        assert_eq!(ObjectKind::from_properties(&properties), ObjectKind::Other);
        properties.insert(keys::TYPE.into(), "joint".into());
        assert_eq!(ObjectKind::from_properties(&properties), ObjectKind::Joint);
    }

    #[test]
    fn test_bounds_from_corners() {
        let object = EditorObject {
            name: "b".into(),
            kind: ObjectKind::Body,
            parent: None,
            world: Pose::IDENTITY,
            scale: None,
            bounding_box: box_corners(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 4.0)),
            geometry: ObjectGeometry::Primitive(PrimitiveKind::Box),
            properties: Properties::new(),
        };
        let (center, size) = object.bounds();
        assert_eq!(center, Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(size, Vec3::new(2.0, 2.0, 4.0));
    }
}
