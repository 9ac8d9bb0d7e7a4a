//! In-memory editor document
//!
//! A minimal stand-in for a real 3D editor: a flat list of named objects
//! with world poses, parent names, geometry and property stores, persisted
//! as RON. Mesh geometry may be referenced by file path and is resolved on
//! load.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{
    EditorMaterial, EditorObject, EditorScene, ObjectGeometry, ObjectHandle, ObjectKind,
    Properties, PropertyValue, Selection, box_corners,
};
use crate::error::{ElementKind, SceneError, SceneResult};
use crate::mesh::{MeshBuffers, load_mesh_buffers};
use crate::types::{Pose, PrimitiveKind};

/// Geometry as stored in a document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum DocumentGeometry {
    #[default]
    Empty,
    /// Primitive with its bounding-box size
    Primitive { kind: PrimitiveKind, size: Vec3 },
    Mesh(MeshBuffers),
    /// Mesh file relative to the document; replaced by `Mesh` on load
    MeshFile(PathBuf),
}

/// One object in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentObject {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub world: Pose,
    #[serde(default)]
    pub scale: Option<Vec3>,
    #[serde(default)]
    pub geometry: DocumentGeometry,
    #[serde(default)]
    pub properties: Properties,
}

impl DocumentObject {
    pub fn new(name: impl Into<String>, world: Pose, geometry: DocumentGeometry) -> Self {
        Self {
            name: name.into(),
            parent: None,
            world,
            scale: None,
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Editor scene held in memory and persisted as RON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorDocument {
    #[serde(default)]
    pub objects: Vec<DocumentObject>,
    #[serde(default)]
    pub materials: Vec<EditorMaterial>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl EditorDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document and resolve its mesh file references
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        let mut document: EditorDocument =
            ron::from_str(&content).map_err(|e| SceneError::io(path, e))?;
        document.base_dir = path.parent().map(Path::to_path_buf);
        document.check_unique_names(path)?;
        document.resolve_mesh_files()?;

        tracing::info!(
            "Loaded editor document {:?} ({} objects)",
            path,
            document.objects.len()
        );
        Ok(document)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SceneResult<()> {
        let path = path.as_ref();
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::io(path, e))?;
        std::fs::write(path, content).map_err(|e| SceneError::io(path, e))?;
        tracing::info!("Saved editor document to {:?}", path);
        Ok(())
    }

    /// Replace `MeshFile` geometry by the loaded mesh buffers
    pub fn resolve_mesh_files(&mut self) -> SceneResult<()> {
        for object in &mut self.objects {
            if let DocumentGeometry::MeshFile(file) = &object.geometry {
                let path = match &self.base_dir {
                    Some(dir) if file.is_relative() => dir.join(file),
                    _ => file.clone(),
                };
                let buffers = load_mesh_buffers(&path).map_err(|e| SceneError::mesh(&path, e))?;
                tracing::debug!(
                    "Resolved mesh for '{}' from {:?} ({} vertices)",
                    object.name,
                    path,
                    buffers.positions.len()
                );
                object.geometry = DocumentGeometry::Mesh(buffers);
            }
        }
        Ok(())
    }

    /// Parents are stored by name, so a duplicate would make the hierarchy ambiguous
    fn check_unique_names(&self, path: &Path) -> SceneResult<()> {
        let mut seen = HashSet::new();
        for object in &self.objects {
            if !seen.insert(object.name.as_str()) {
                return Err(SceneError::io(
                    path,
                    format!("duplicate object name '{}'", object.name),
                ));
            }
        }
        Ok(())
    }

    /// Free name derived from `name`, suffixed `.001`, `.002`, ... on clash
    pub fn unique_name(&self, name: &str) -> String {
        let taken = |candidate: &str| self.objects.iter().any(|o| o.name == candidate);
        if !taken(name) {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{name}.{n:03}"))
            .find(|candidate| !taken(candidate.as_str()))
            .unwrap_or_else(|| name.to_string())
    }

    /// Add an object, renaming it when its name is already taken
    pub fn add_object(&mut self, mut object: DocumentObject) -> ObjectHandle {
        let name = self.unique_name(&object.name);
        if name != object.name {
            tracing::debug!("Renamed object '{}' to '{}'", object.name, name);
            object.name = name;
        }
        self.objects.push(object);
        ObjectHandle(self.objects.len() - 1)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&DocumentObject> {
        self.objects.get(handle.0)
    }

    pub fn handle_by_name(&self, name: &str) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(ObjectHandle)
    }

    fn parent_handle(&self, object: &DocumentObject) -> Option<ObjectHandle> {
        object.parent.as_deref().and_then(|p| self.handle_by_name(p))
    }

    fn children(&self, handle: ObjectHandle) -> impl Iterator<Item = ObjectHandle> + '_ {
        let name = self.objects.get(handle.0).map(|o| o.name.as_str());
        self.objects
            .iter()
            .enumerate()
            .filter(move |(_, o)| o.parent.as_deref().is_some() && o.parent.as_deref() == name)
            .map(|(i, _)| ObjectHandle(i))
    }

    fn push(&mut self, name: &str, pose: Pose, geometry: DocumentGeometry) -> ObjectHandle {
        self.add_object(DocumentObject::new(name, pose, geometry))
    }
}

impl EditorScene for EditorDocument {
    fn query(&self, selection: &Selection) -> Vec<ObjectHandle> {
        let starts: Vec<ObjectHandle> = match selection {
            Selection::All => self
                .objects
                .iter()
                .enumerate()
                .filter(|(_, o)| self.parent_handle(o).is_none())
                .map(|(i, _)| ObjectHandle(i))
                .collect(),
            Selection::Roots(names) => names
                .iter()
                .filter_map(|name| {
                    let handle = self.handle_by_name(name);
                    if handle.is_none() {
                        tracing::warn!("Selected object '{}' not found", name);
                    }
                    handle
                })
                .collect(),
        };

        let mut visited = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<ObjectHandle> = starts.into_iter().rev().collect();
        while let Some(handle) = stack.pop() {
            if !visited.insert(handle) {
                continue;
            }
            out.push(handle);
            let children: Vec<ObjectHandle> = self.children(handle).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    fn object(&self, handle: ObjectHandle) -> Option<EditorObject> {
        let object = self.objects.get(handle.0)?;
        let (bounding_box, geometry) = match &object.geometry {
            DocumentGeometry::Primitive { kind, size } => (
                box_corners(-*size * 0.5, *size * 0.5),
                ObjectGeometry::Primitive(*kind),
            ),
            DocumentGeometry::Mesh(buffers) => {
                let (min, max) = buffers.bounding_box().unwrap_or((Vec3::ZERO, Vec3::ZERO));
                (box_corners(min, max), ObjectGeometry::Mesh(buffers.clone()))
            }
            DocumentGeometry::Empty | DocumentGeometry::MeshFile(_) => {
                (box_corners(Vec3::ZERO, Vec3::ZERO), ObjectGeometry::Empty)
            }
        };

        Some(EditorObject {
            name: object.name.clone(),
            kind: ObjectKind::from_properties(&object.properties),
            parent: self.parent_handle(object),
            world: object.world,
            scale: object.scale,
            bounding_box,
            geometry,
            properties: object.properties.clone(),
        })
    }

    fn material(&self, name: &str) -> Option<EditorMaterial> {
        self.materials.iter().find(|m| m.name == name).cloned()
    }

    fn create_primitive(
        &mut self,
        name: &str,
        kind: PrimitiveKind,
        pose: Pose,
        extents: Vec3,
    ) -> ObjectHandle {
        let size = kind.bounding_size(extents);
        self.push(name, pose, DocumentGeometry::Primitive { kind, size })
    }

    fn import_mesh_asset(&mut self, name: &str, path: &Path, pose: Pose) -> SceneResult<ObjectHandle> {
        let buffers = load_mesh_buffers(path).map_err(|e| SceneError::mesh(path, e))?;
        Ok(self.push(name, pose, DocumentGeometry::Mesh(buffers)))
    }

    fn create_empty(&mut self, name: &str, pose: Pose) -> ObjectHandle {
        self.push(name, pose, DocumentGeometry::Empty)
    }

    fn define_material(&mut self, material: EditorMaterial) {
        match self.materials.iter_mut().find(|m| m.name == material.name) {
            Some(existing) => *existing = material,
            None => self.materials.push(material),
        }
    }

    /// Re-parent keeping world transforms
    fn set_parent(&mut self, child: ObjectHandle, parent: Option<ObjectHandle>) -> SceneResult<()> {
        let child_name = self
            .objects
            .get(child.0)
            .map(|o| o.name.clone())
            .ok_or_else(|| SceneError::unresolved(ElementKind::Node, "?", "object", child.0))?;

        let parent_name = match parent {
            Some(handle) => {
                let name = self.objects.get(handle.0).map(|o| o.name.clone()).ok_or_else(|| {
                    SceneError::unresolved(ElementKind::Node, &child_name, "parent", handle.0)
                })?;

                // Walk up from the new parent; reaching the child means a cycle
                let mut current = Some(handle);
                while let Some(h) = current {
                    if h == child {
                        return Err(SceneError::AmbiguousGrouping {
                            group_id: 0,
                            reason: format!("parenting '{child_name}' under '{name}' creates a cycle"),
                        });
                    }
                    current = self.objects.get(h.0).and_then(|o| self.parent_handle(o));
                }
                Some(name)
            }
            None => None,
        };

        if let Some(object) = self.objects.get_mut(child.0) {
            object.parent = parent_name;
        }
        Ok(())
    }

    fn set_property(&mut self, handle: ObjectHandle, key: &str, value: PropertyValue) {
        if let Some(object) = self.objects.get_mut(handle.0) {
            object.properties.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::keys;

    fn tree() -> EditorDocument {
        let mut doc = EditorDocument::new();
        let cube = DocumentGeometry::Primitive {
            kind: PrimitiveKind::Box,
            size: Vec3::ONE,
        };
        doc.add_object(DocumentObject::new("base", Pose::IDENTITY, cube.clone()));
        doc.add_object(DocumentObject::new("arm", Pose::IDENTITY, cube.clone()).with_parent("base"));
        doc.add_object(DocumentObject::new("ground", Pose::IDENTITY, cube.clone()));
        doc.add_object(DocumentObject::new("hand", Pose::IDENTITY, cube).with_parent("arm"));
        doc
    }

    fn names(doc: &EditorDocument, handles: &[ObjectHandle]) -> Vec<String> {
        handles
            .iter()
            .map(|h| doc.get(*h).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_query_depth_first() {
        let doc = tree();
        let all = doc.query(&Selection::All);
        assert_eq!(names(&doc, &all), ["base", "arm", "hand", "ground"]);

        let arm = doc.query(&Selection::Roots(vec!["arm".into(), "missing".into()]));
        assert_eq!(names(&doc, &arm), ["arm", "hand"]);
    }

    #[test]
    fn test_object_snapshot() {
        let mut doc = tree();
        let hand = doc.handle_by_name("hand").unwrap();
        doc.set_property(hand, keys::TYPE, "body".into());

        let object = doc.object(hand).unwrap();
        assert_eq!(object.kind, ObjectKind::Body);
        assert_eq!(object.parent, doc.handle_by_name("arm"));
        let (center, size) = object.bounds();
        assert_eq!(center, Vec3::ZERO);
        assert_eq!(size, Vec3::ONE);
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let mut doc = tree();
        let base = doc.handle_by_name("base").unwrap();
        let hand = doc.handle_by_name("hand").unwrap();
        assert!(doc.set_parent(base, Some(hand)).is_err());

        let ground = doc.handle_by_name("ground").unwrap();
        doc.set_parent(hand, Some(ground)).unwrap();
        assert_eq!(doc.get(hand).unwrap().parent.as_deref(), Some("ground"));
    }

    #[test]
    fn test_create_primitive_uses_bounding_size() {
        let mut doc = EditorDocument::new();
        let handle = doc.create_primitive(
            "ball",
            PrimitiveKind::Sphere,
            Pose::IDENTITY,
            Vec3::splat(0.5),
        );
        let (_, size) = doc.object(handle).unwrap().bounds();
        assert_eq!(size, Vec3::ONE);
    }

    #[test]
    fn test_save_load_resolves_mesh_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tri.stl"),
            "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n",
        )
        .unwrap();

        let mut doc = tree();
        doc.add_object(
            DocumentObject::new("plate", Pose::IDENTITY, DocumentGeometry::MeshFile("tri.stl".into()))
                .with_property(keys::TYPE, "body"),
        );
        doc.materials.push(EditorMaterial {
            name: "steel".into(),
            diffuse: [0.5, 0.5, 0.6],
            specular: [1.0, 1.0, 1.0],
            shininess: 20.0,
        });
        let path = dir.path().join("scene.ron");
        doc.save(&path).unwrap();

        let loaded = EditorDocument::load(&path).unwrap();
        assert_eq!(loaded.objects.len(), 5);
        assert!(loaded.material("steel").is_some());
        let plate = loaded.handle_by_name("plate").unwrap();
        match &loaded.get(plate).unwrap().geometry {
            DocumentGeometry::Mesh(buffers) => assert_eq!(buffers.positions.len(), 3),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_add_object_renames_clashing_names() {
        let mut doc = tree();
        let first = doc.create_empty("arm", Pose::IDENTITY);
        let second = doc.create_empty("arm", Pose::IDENTITY);
        assert_eq!(doc.get(first).unwrap().name, "arm.001");
        assert_eq!(doc.get(second).unwrap().name, "arm.002");

        // Parenting by name still resolves to the renamed object
        let hand = doc.handle_by_name("hand").unwrap();
        doc.set_parent(hand, Some(second)).unwrap();
        assert_eq!(doc.object(hand).unwrap().parent, Some(second));
        assert_eq!(names(&doc, &doc.query(&Selection::Roots(vec!["arm".into()]))), ["arm"]);
    }

    #[test]
    fn test_load_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = tree();
        doc.objects.push(DocumentObject::new("arm", Pose::IDENTITY, DocumentGeometry::Empty));
        let path = dir.path().join("scene.ron");
        doc.save(&path).unwrap();

        let err = EditorDocument::load(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate object name 'arm'"), "{err}");
    }
}
