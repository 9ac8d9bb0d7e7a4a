//! Export pass: editor objects to a scene archive

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use glam::Vec3;

use super::context::{IdAllocator, SceneBuildContext};
use crate::config::BridgeConfig;
use crate::editor::{
    EditorObject, EditorScene, ObjectGeometry, ObjectHandle, ObjectKind, PropertyExt,
    PropertyValue, Selection, keys,
};
use crate::error::{ElementKind, SceneError, SceneResult};
use crate::format::{JointRecord, NodeRecord, SceneDescription, write_scene_file};
use crate::grouping::{merge_fixed_groups, reconcile_hierarchy};
use crate::mesh::{MeshBuffers, build_mesh, write_mesh_file};
use crate::scene::{
    GroupId, Joint, JointId, MassSpec, Material, MaterialId, Motor, Node, NodeId, Sensor,
    SensorParams,
};
use crate::types::{AnchorPolicy, JointKind, Pose, PrimitiveKind};

/// Summary of an export pass
#[derive(Debug, Default)]
pub struct ExportReport {
    pub scene_file: PathBuf,
    pub mesh_files: Vec<PathBuf>,
    pub nodes: usize,
    pub joints: usize,
    pub motors: usize,
    pub sensors: usize,
    pub diagnostics: Vec<SceneError>,
}

/// Export the selected editor objects into the archive directory.
///
/// Mesh files are written one per mesh-backed body while walking the
/// scene; the scene description is written last. A fatal error can leave
/// some mesh files behind without a scene description.
pub fn export_scene<E: EditorScene + ?Sized>(
    editor: &mut E,
    selection: &Selection,
    archive: &Path,
    config: &BridgeConfig,
) -> SceneResult<ExportReport> {
    let mut exporter = Exporter::new(editor, selection, config);
    exporter.run(archive)
}

struct Exporter<'a, E: EditorScene + ?Sized> {
    editor: &'a mut E,
    ctx: SceneBuildContext<'a>,
    /// Selected objects in query order
    objects: Vec<(ObjectHandle, EditorObject)>,
    index: HashMap<ObjectHandle, usize>,
    body_ids: HashMap<ObjectHandle, NodeId>,
    node_handles: BTreeMap<NodeId, ObjectHandle>,
    body_names: HashMap<String, NodeId>,
    joint_names: HashMap<String, JointId>,
    joint_handles: BTreeMap<JointId, ObjectHandle>,
    material_ids: HashMap<String, MaterialId>,
}

impl<'a, E: EditorScene + ?Sized> Exporter<'a, E> {
    fn new(editor: &'a mut E, selection: &Selection, config: &'a BridgeConfig) -> Self {
        let objects: Vec<(ObjectHandle, EditorObject)> = editor
            .query(selection)
            .into_iter()
            .filter_map(|handle| editor.object(handle).map(|object| (handle, object)))
            .collect();
        let index = objects
            .iter()
            .enumerate()
            .map(|(i, (handle, _))| (*handle, i))
            .collect();

        Self {
            editor,
            ctx: SceneBuildContext::new(config),
            objects,
            index,
            body_ids: HashMap::new(),
            node_handles: BTreeMap::new(),
            body_names: HashMap::new(),
            joint_names: HashMap::new(),
            joint_handles: BTreeMap::new(),
            material_ids: HashMap::new(),
        }
    }

    fn run(&mut self, archive: &Path) -> SceneResult<ExportReport> {
        std::fs::create_dir_all(archive).map_err(|e| SceneError::io(archive, e))?;

        for (handle, id) in self.assign_ids(ObjectKind::Body) {
            self.body_ids.insert(handle, id);
            self.node_handles.insert(id, handle);
            if let Some(name) = self.object(handle).map(|o| o.name.clone()) {
                self.body_names.insert(name, id);
            }
        }
        let groups = self.assign_groups();

        for (handle, object) in self.objects_of(ObjectKind::Body) {
            let Some(&id) = self.body_ids.get(&handle) else { continue };
            let group = groups.get(&id).copied().unwrap_or(0);
            let node = self.build_node(handle, id, group, &object)?;
            if let Err(err) = self.ctx.scene.add_node(node) {
                self.ctx.diagnostic(SceneError::unresolved(
                    ElementKind::Node,
                    &object.name,
                    "index",
                    err,
                ));
            }
        }

        for (handle, id) in self.assign_ids(ObjectKind::Joint) {
            if let Some(object) = self.object(handle).cloned() {
                self.joint_names.insert(object.name.clone(), id);
                self.build_joint(handle, id, &object);
            }
        }

        self.merge_groups();

        self.ctx.scene.resolve_relative_transforms();
        self.ctx.scene.resolve_joint_frames()?;

        let motors = self.build_motors();
        let sensors = self.build_sensors();
        let materials = self.materials();

        let mut description = SceneDescription::new(self.ctx.config.format_version);
        let mut mesh_files = Vec::new();
        for id in self.ctx.scene.depth_first() {
            let Some(node) = self.ctx.scene.node(id) else { continue };
            if let (Some(mesh), Some(filename)) = (&node.mesh, &node.filename) {
                let path = archive.join(filename);
                write_mesh_file(mesh, &path).map_err(|e| SceneError::mesh(&path, e))?;
                mesh_files.push(path);
            }
            description.nodes.push(node_record(node));
        }
        description.joints = self.ctx.scene.joints().map(joint_record).collect();
        description.motors = motors;
        description.materials = materials;
        description.sensors = sensors;

        let stem = archive
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("scene");
        let scene_file = archive.join(format!("{stem}.scene"));
        write_scene_file(&description, &scene_file)?;

        tracing::info!(
            "Exported {} nodes, {} joints, {} motors, {} sensors to {:?} ({} diagnostics)",
            description.nodes.len(),
            description.joints.len(),
            description.motors.len(),
            description.sensors.len(),
            scene_file,
            self.ctx.diagnostics.len()
        );

        Ok(ExportReport {
            scene_file,
            mesh_files,
            nodes: description.nodes.len(),
            joints: description.joints.len(),
            motors: description.motors.len(),
            sensors: description.sensors.len(),
            diagnostics: std::mem::take(&mut self.ctx.diagnostics),
        })
    }

    fn object(&self, handle: ObjectHandle) -> Option<&EditorObject> {
        self.index.get(&handle).map(|&i| &self.objects[i].1)
    }

    fn objects_of(&self, kind: ObjectKind) -> Vec<(ObjectHandle, EditorObject)> {
        self.objects
            .iter()
            .filter(|(_, o)| o.kind == kind)
            .cloned()
            .collect()
    }

    /// Nearest ancestor that is an exported body
    fn body_parent(&self, handle: ObjectHandle) -> Option<NodeId> {
        let mut current = self.object(handle)?.parent;
        while let Some(h) = current {
            if let Some(&id) = self.body_ids.get(&h) {
                return Some(id);
            }
            current = self.object(h).and_then(|o| o.parent);
        }
        None
    }

    /// Node1 of a joint object: the `node1` property, else its body parent
    fn joint_node1(&self, handle: ObjectHandle, object: &EditorObject) -> Option<NodeId> {
        match object.properties.text(keys::NODE1) {
            Some(name) => self.body_names.get(name).copied(),
            None => self.body_parent(handle),
        }
    }

    /// Authored ids where valid, fresh ids otherwise (written back)
    fn assign_ids(&mut self, kind: ObjectKind) -> Vec<(ObjectHandle, u32)> {
        let element = match kind {
            ObjectKind::Joint => ElementKind::Joint,
            ObjectKind::Sensor => ElementKind::Sensor,
            _ => ElementKind::Node,
        };

        let mut ids = IdAllocator::new();
        let mut assigned = Vec::new();
        let mut pending = Vec::new();
        for (handle, object) in self.objects_of(kind) {
            let authored = object
                .properties
                .int(keys::ID)
                .and_then(|id| u32::try_from(id).ok());
            match authored {
                Some(id) if ids.reserve(id) => assigned.push((handle, id)),
                Some(id) => {
                    tracing::warn!("{} '{}': id {} already taken", element, object.name, id);
                    pending.push((handle, object.name));
                }
                None => pending.push((handle, object.name)),
            }
        }

        for (handle, name) in pending {
            if self.ctx.config.auto_assign_ids {
                let id = ids.allocate();
                tracing::debug!("{} '{}': assigned id {}", element, name, id);
                self.editor.set_property(handle, keys::ID, id.into());
                assigned.push((handle, id));
            } else {
                self.ctx.diagnostic(SceneError::missing(element, name, "index"));
            }
        }

        assigned.sort_by_key(|(handle, _)| self.index.get(handle).copied());
        assigned
    }

    /// Group ids per body.
    ///
    /// Unset groups: a root body opens a new group, as does a body driven
    /// by a joint hanging under its parent; any other body joins its
    /// parent's group.
    fn assign_groups(&mut self) -> BTreeMap<NodeId, GroupId> {
        let bodies = self.objects_of(ObjectKind::Body);
        let mut next = bodies
            .iter()
            .filter_map(|(_, o)| o.properties.int(keys::GROUP))
            .filter_map(|g| u32::try_from(g).ok())
            .max()
            .unwrap_or(0)
            + 1;

        // (node1, node2 name) of every joint object
        let joint_links: Vec<(Option<NodeId>, String)> = self
            .objects_of(ObjectKind::Joint)
            .iter()
            .filter_map(|(handle, object)| {
                let node2 = object.properties.text(keys::NODE2)?;
                Some((self.joint_node1(*handle, object), node2.to_string()))
            })
            .collect();

        let mut groups = BTreeMap::new();
        for (handle, object) in bodies {
            let Some(&id) = self.body_ids.get(&handle) else { continue };
            if let Some(group) = object
                .properties
                .int(keys::GROUP)
                .and_then(|g| u32::try_from(g).ok())
            {
                groups.insert(id, group);
                continue;
            }
            if !self.ctx.config.auto_assign_ids {
                groups.insert(id, 0);
                continue;
            }

            let parent = self.body_parent(handle);
            let driven = parent.is_some()
                && joint_links
                    .iter()
                    .any(|(node1, node2)| *node1 == parent && *node2 == object.name);
            let group = match parent.and_then(|p| groups.get(&p)) {
                Some(&group) if !driven => group,
                _ => {
                    next += 1;
                    next - 1
                }
            };
            tracing::debug!("Body '{}': assigned group {}", object.name, group);
            self.editor.set_property(handle, keys::GROUP, group.into());
            groups.insert(id, group);
        }
        groups
    }

    fn build_node(
        &mut self,
        handle: ObjectHandle,
        id: NodeId,
        group_id: GroupId,
        object: &EditorObject,
    ) -> SceneResult<Node> {
        let props = &object.properties;
        let scale = object.scale.unwrap_or(Vec3::ONE);
        let (center, size) = object.bounds();
        let size = if self.ctx.config.apply_object_scale {
            size * scale
        } else {
            size
        };

        let geometry_kind = match &object.geometry {
            ObjectGeometry::Primitive(kind) => *kind,
            ObjectGeometry::Mesh(_) => PrimitiveKind::Mesh,
            ObjectGeometry::Empty => PrimitiveKind::Box,
        };
        let primitive = props
            .text(keys::PHYSIC_MODE)
            .and_then(PrimitiveKind::parse)
            .unwrap_or(geometry_kind);

        let mut node = Node::new(id, &object.name);
        node.parent = self.body_parent(handle);
        node.group_id = group_id;
        node.world = object.world;
        node.pivot = center * scale;
        node.primitive = primitive;
        node.extents = primitive.extents_from_size(size, props.float(keys::RADIUS));
        node.visual_size = size;
        node.collision_bitmask = props
            .int(keys::COLL_BITMASK)
            .and_then(|b| u32::try_from(b).ok())
            .unwrap_or(0);
        node.movable = props.flag(keys::MOVABLE).unwrap_or(true);
        node.mass = match (props.float(keys::MASS), props.float(keys::DENSITY)) {
            (Some(mass), Some(_)) => {
                tracing::warn!("Body '{}' sets both mass and density, using mass", object.name);
                MassSpec::Mass(mass)
            }
            (Some(mass), None) => MassSpec::Mass(mass),
            (None, Some(density)) => MassSpec::Density(density),
            (None, None) => MassSpec::Density(self.ctx.config.default_density),
        };
        node.material_id = self.material_id(object);

        if let ObjectGeometry::Mesh(buffers) = &object.geometry {
            let filename = format!(
                "{}.{}",
                object.name.replace(['/', '\\'], "_"),
                self.ctx.config.mesh_extension
            );
            let scaled = scale_buffers(buffers, scale);
            let mesh = build_mesh(&scaled).map_err(|e| SceneError::mesh(&filename, e))?;
            node.visual_offset = Pose::from_position(-node.pivot);
            node.filename = Some(filename);
            node.mesh = Some(mesh);
        }

        tracing::debug!("Node '{}' (id {}, group {})", node.name, node.id, node.group_id);
        Ok(node)
    }

    /// Sequential 1-based material ids on first reference; 0 = none
    fn material_id(&mut self, object: &EditorObject) -> Option<MaterialId> {
        let name = object.properties.text(keys::MATERIAL)?;
        if let Some(&id) = self.material_ids.get(name) {
            return Some(id);
        }
        if self.editor.material(name).is_none() {
            self.ctx.diagnostic(SceneError::unresolved(
                ElementKind::Node,
                &object.name,
                "material_id",
                name,
            ));
            return None;
        }
        let id = self.material_ids.len() as MaterialId + 1;
        self.material_ids.insert(name.to_string(), id);
        Some(id)
    }

    fn materials(&self) -> Vec<Material> {
        let mut materials: Vec<Material> = self
            .material_ids
            .iter()
            .filter_map(|(name, &id)| {
                let source = self.editor.material(name)?;
                Some(Material {
                    id,
                    name: source.name,
                    diffuse: source.diffuse,
                    specular: source.specular,
                    shininess: source.shininess,
                })
            })
            .collect();
        materials.sort_by_key(|m| m.id);
        materials
    }

    fn build_joint(&mut self, handle: ObjectHandle, id: JointId, object: &EditorObject) {
        let props = &object.properties;
        let Some(kind) = props.text(keys::JOINT_TYPE).and_then(JointKind::parse) else {
            self.ctx
                .diagnostic(SceneError::missing(ElementKind::Joint, &object.name, "type"));
            return;
        };
        let Some(node1) = self.joint_node1(handle, object) else {
            let reference = props.text(keys::NODE1).unwrap_or("<parent>");
            self.ctx.diagnostic(SceneError::unresolved(
                ElementKind::Joint,
                &object.name,
                "nodeindex1",
                reference,
            ));
            return;
        };

        let mut joint = Joint::new(id, &object.name, kind, node1);
        if let Some(name) = props.text(keys::NODE2) {
            match self.body_names.get(name) {
                Some(&node2) => joint.node2 = Some(node2),
                None => self.ctx.diagnostic(SceneError::unresolved(
                    ElementKind::Joint,
                    &object.name,
                    "nodeindex2",
                    name,
                )),
            }
        }

        joint.anchor_policy = props
            .text(keys::ANCHOR)
            .and_then(|text| AnchorPolicy::parse(text, object.world.position))
            .unwrap_or_default();
        joint.frame_rotation = object.world.rotation;
        joint.frame_scale = object.scale.unwrap_or(Vec3::ONE);
        joint.invert_axis = props.flag(keys::INVERT_AXIS).unwrap_or(false);
        joint.low_stop = props.float(keys::LOW_STOP);
        joint.high_stop = props.float(keys::HIGH_STOP);
        joint.spring_const = props.float(keys::SPRING_CONST);
        joint.damping_const = props.float(keys::DAMPING_CONST);
        joint.authored_offset = props.float(keys::ANGLE_OFFSET);
        // Fixed joints keep the marker pose; others are resolved later
        joint.anchor = object.world.position;
        joint.axis = object.world.rotation * Vec3::Z;

        tracing::debug!("Joint '{}' (id {}, {})", joint.name, id, kind.name());
        match self.ctx.scene.add_joint(joint) {
            Ok(_) => {
                self.joint_handles.insert(id, handle);
            }
            Err(err) => self.ctx.diagnostic(SceneError::unresolved(
                ElementKind::Joint,
                &object.name,
                "index",
                err,
            )),
        }
    }

    /// Merge fixed-joint groups, reconcile the hierarchy and mirror both
    /// into the editor
    fn merge_groups(&mut self) {
        let before: BTreeMap<NodeId, GroupId> = self
            .ctx
            .scene
            .nodes()
            .map(|n| (n.id, n.group_id))
            .collect();
        merge_fixed_groups(&mut self.ctx.scene);
        for node in self.ctx.scene.nodes() {
            if before.get(&node.id) != Some(&node.group_id)
                && let Some(&handle) = self.node_handles.get(&node.id)
            {
                self.editor
                    .set_property(handle, keys::GROUP, node.group_id.into());
            }
        }

        let outcome = reconcile_hierarchy(&mut self.ctx.scene);
        for (child, parent) in outcome.reparented {
            let Some(&child_handle) = self.node_handles.get(&child) else { continue };
            let parent_handle = parent.and_then(|p| self.node_handles.get(&p).copied());
            if let Err(err) = self.editor.set_parent(child_handle, parent_handle) {
                self.ctx.diagnostic(err);
            }
        }
        self.ctx.diagnostics.extend(outcome.diagnostics);
    }

    /// One motor per motorized joint without a spring constant
    fn build_motors(&self) -> Vec<Motor> {
        let defaults = &self.ctx.config.motor;
        let mut motors = Vec::new();
        for joint in self.ctx.scene.joints().filter(|j| j.needs_motor()) {
            let props = self
                .joint_handles
                .get(&joint.id)
                .and_then(|h| self.object(*h))
                .map(|o| o.properties.clone())
                .unwrap_or_default();

            motors.push(Motor {
                id: motors.len() as u32 + 1,
                name: props
                    .text(keys::MOTOR_NAME)
                    .unwrap_or(&joint.name)
                    .to_string(),
                joint: joint.id,
                axis: 1,
                max_velocity: props.float(keys::MAX_VELOCITY).unwrap_or(defaults.max_velocity),
                max_force: props.float(keys::MAX_FORCE).unwrap_or(defaults.max_force),
                motor_type: props
                    .int(keys::MOTOR_TYPE)
                    .and_then(|t| u32::try_from(t).ok())
                    .unwrap_or(defaults.motor_type),
                p: props.float(keys::P).unwrap_or(defaults.p),
                i: Some(props.float(keys::I).unwrap_or(defaults.i)),
                d: props.float(keys::D).unwrap_or(defaults.d),
                min_value: props.float(keys::MIN_VALUE).unwrap_or(defaults.min_value),
                max_value: props.float(keys::MAX_VALUE).unwrap_or(defaults.max_value),
                value: joint.angle_offset,
            });
        }
        motors
    }

    fn build_sensors(&mut self) -> Vec<Sensor> {
        let mut sensors = Vec::new();
        for (handle, id) in self.assign_ids(ObjectKind::Sensor) {
            let Some(object) = self.object(handle).cloned() else { continue };
            match self.build_sensor(id, &object) {
                Ok(sensor) => sensors.push(sensor),
                Err(err) => self.ctx.diagnostic(err),
            }
        }
        sensors
    }

    /// Resolve an object name to a body or joint id
    fn reference(&mut self, sensor: &str, field: &'static str, name: &str) -> Option<u32> {
        let id = self
            .body_names
            .get(name)
            .or_else(|| self.joint_names.get(name))
            .copied();
        if id.is_none() {
            self.ctx
                .diagnostic(SceneError::unresolved(ElementKind::Sensor, sensor, field, name));
        }
        id
    }

    fn build_sensor(&mut self, id: u32, object: &EditorObject) -> SceneResult<Sensor> {
        let props = &object.properties;
        let name = object.name.as_str();
        let missing = |field| SceneError::missing(ElementKind::Sensor, name, field);

        let type_name = props.text(keys::SENSOR_TYPE).ok_or_else(|| missing("type"))?;
        let rate = props.float(keys::RATE).ok_or_else(|| missing("rate"))?;
        let referenced_ids = props
            .get(keys::IDS)
            .and_then(PropertyValue::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|target| self.reference(name, "id", target))
            .collect();

        let params = match type_name {
            SensorParams::JOINT_6DOF => {
                let node = props.text(keys::NODE_ID).ok_or_else(|| missing("nodeID"))?;
                let joint = props.text(keys::JOINT_ID).ok_or_else(|| missing("jointID"))?;
                SensorParams::Joint6Dof {
                    node: self.reference(name, "nodeID", node).unwrap_or(0),
                    joint: self.reference(name, "jointID", joint).unwrap_or(0),
                }
            }
            SensorParams::RAY => {
                let attached = props
                    .text(keys::ATTACHED_NODE)
                    .ok_or_else(|| missing("attached_node"))?;
                SensorParams::Ray {
                    attached_node: self.reference(name, "attached_node", attached).unwrap_or(0),
                    width: props
                        .int(keys::WIDTH)
                        .and_then(|w| u32::try_from(w).ok())
                        .ok_or_else(|| missing("width"))?,
                    opening_width: props
                        .float(keys::OPENING_WIDTH)
                        .ok_or_else(|| missing("opening_width"))?,
                    max_distance: props
                        .float(keys::MAX_DISTANCE)
                        .ok_or_else(|| missing("max_distance"))?,
                }
            }
            other => {
                let mut fields = BTreeMap::new();
                for (key, value) in props {
                    if SENSOR_RESERVED_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    match value.as_text() {
                        Some(target) if is_reference_key(key) => {
                            if let Some(id) = self.reference(name, "field", target) {
                                fields.insert(key.clone(), id.to_string());
                            }
                        }
                        _ => {
                            fields.insert(key.clone(), value.to_text());
                        }
                    }
                }
                SensorParams::Generic {
                    type_name: other.to_string(),
                    fields,
                }
            }
        };

        Ok(Sensor {
            id,
            name: object.name.clone(),
            rate,
            referenced_ids,
            params,
        })
    }
}

/// Sensor properties that never become generic fields
const SENSOR_RESERVED_KEYS: &[&str] = &[keys::TYPE, keys::ID, keys::SENSOR_TYPE, keys::RATE, keys::IDS];

/// Generic sensor fields naming another object
pub(crate) fn is_reference_key(key: &str) -> bool {
    key.ends_with("ID") || key.ends_with("_id") || key.ends_with("_node")
}

fn scale_buffers(buffers: &MeshBuffers, scale: Vec3) -> MeshBuffers {
    if scale == Vec3::ONE {
        return buffers.clone();
    }
    let mut scaled = buffers.clone();
    for p in &mut scaled.positions {
        *p = (Vec3::from(*p) * scale).to_array();
    }
    // Normals transform with the inverse scale
    let inverse = scale.recip();
    for n in &mut scaled.normals {
        *n = (Vec3::from(*n) * inverse).normalize_or_zero().to_array();
    }
    for polygon in &mut scaled.polygons {
        polygon.normal = (Vec3::from(polygon.normal) * inverse)
            .normalize_or_zero()
            .to_array();
    }
    scaled
}

fn node_record(node: &Node) -> NodeRecord {
    NodeRecord {
        name: node.name.clone(),
        origname: node.name.clone(),
        filename: node.filename.clone(),
        index: node.id,
        group_id: node.group_id,
        primitive: node.primitive,
        relative_id: node.parent,
        pose: node.local,
        movable: node.movable,
        extents: node.extents,
        material_id: node.material_id.unwrap_or(0),
        mass: node.mass,
        pivot: node.pivot,
        visual_size: node.visual_size,
        visual_offset: node.visual_offset,
        collision_bitmask: node.collision_bitmask,
    }
}

fn joint_record(joint: &Joint) -> JointRecord {
    JointRecord {
        name: joint.name.clone(),
        index: joint.id,
        kind: joint.kind,
        node1: joint.node1,
        node2: joint.node2,
        anchor_policy: joint.anchor_policy,
        anchor: joint.anchor,
        axis: joint.axis,
        low_stop: joint.low_stop,
        high_stop: joint.high_stop,
        damping_const: joint.damping_const,
        spring_const: joint.spring_const,
        angle_offset: joint.angle_offset,
    }
}
