//! Import pass: scene archive to editor objects

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use glam::{Quat, Vec3};

use super::context::SceneBuildContext;
use super::export::is_reference_key;
use crate::config::{BridgeConfig, FormatVersion};
use crate::editor::{EditorMaterial, EditorScene, ObjectHandle, PropertyValue, keys};
use crate::error::{ElementKind, SceneError, SceneResult};
use crate::format::{JointRecord, NodeRecord, read_scene_file};
use crate::mesh::read_mesh_file;
use crate::scene::{Joint, JointId, MassSpec, Motor, Node, NodeId, Scene, Sensor, SensorParams};
use crate::transform::{relative_to_world, visual_world_pose};
use crate::types::Pose;

/// Summary of an import pass
#[derive(Debug, Default)]
pub struct ImportReport {
    pub version: FormatVersion,
    /// The scene as built from the archive, with world transforms
    pub scene: Scene,
    /// Editor objects created for nodes
    pub node_handles: BTreeMap<NodeId, ObjectHandle>,
    /// Editor objects created for joints
    pub joint_handles: BTreeMap<JointId, ObjectHandle>,
    /// Editor objects created for sensors
    pub sensor_handles: Vec<ObjectHandle>,
    pub diagnostics: Vec<SceneError>,
}

/// Locate the scene description inside an archive directory.
///
/// A path to a `.scene` file is returned as is.
pub fn find_scene_file(archive: &Path) -> SceneResult<PathBuf> {
    if archive.is_file() {
        return Ok(archive.to_path_buf());
    }
    let entries = std::fs::read_dir(archive).map_err(|e| SceneError::io(archive, e))?;
    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("scene"))
        .collect();
    found.sort();

    match found.len() {
        0 => Err(SceneError::io(archive, "no .scene file in archive")),
        1 => Ok(found.remove(0)),
        n => Err(SceneError::io(
            archive,
            format!("{n} .scene files in archive, expected one"),
        )),
    }
}

/// Import a scene archive into the editor.
///
/// Nodes are materialised in document order; a `relativeid` must name a
/// node that appeared earlier.
pub fn import_scene<E: EditorScene + ?Sized>(
    editor: &mut E,
    archive: &Path,
    config: &BridgeConfig,
) -> SceneResult<ImportReport> {
    let scene_file = find_scene_file(archive)?;
    let base_dir = scene_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let parsed = read_scene_file(&scene_file)?;
    let description = parsed.description;

    let mut ctx = SceneBuildContext::new(config);
    ctx.diagnostics = parsed.diagnostics;

    for record in &description.nodes {
        add_node(&mut ctx, record, &base_dir)?;
    }
    for record in &description.joints {
        add_joint(&mut ctx, record);
    }

    let mut motors: HashMap<JointId, Motor> = HashMap::new();
    for motor in &description.motors {
        if ctx.scene.joint(motor.joint).is_some() {
            motors.insert(motor.joint, motor.clone());
        } else {
            ctx.diagnostic(SceneError::unresolved(
                ElementKind::Motor,
                &motor.name,
                "jointIndex",
                motor.joint,
            ));
        }
    }
    ctx.scene.motors = description.motors.clone();
    ctx.scene.materials = description.materials.clone();
    ctx.scene.sensors = description.sensors.clone();

    for material in &description.materials {
        editor.define_material(EditorMaterial {
            name: material.name.clone(),
            diffuse: material.diffuse,
            specular: material.specular,
            shininess: material.shininess,
        });
    }

    let mut report = ImportReport {
        version: description.version,
        ..Default::default()
    };
    create_nodes(editor, &mut ctx, &base_dir, &mut report)?;
    create_joints(editor, &ctx, &motors, &mut report);
    create_sensors(editor, &mut ctx, &mut report);

    tracing::info!(
        "Imported {} nodes, {} joints, {} sensors from {:?} ({} diagnostics)",
        report.node_handles.len(),
        report.joint_handles.len(),
        report.sensor_handles.len(),
        scene_file,
        ctx.diagnostics.len()
    );

    report.scene = ctx.scene;
    report.diagnostics = ctx.diagnostics;
    Ok(report)
}

fn add_node(ctx: &mut SceneBuildContext, record: &NodeRecord, base_dir: &Path) -> SceneResult<()> {
    let parent = match record.relative_id {
        Some(parent) if ctx.scene.contains_node(parent) => Some(parent),
        Some(parent) => {
            // Forward references are not resolved; the pose is taken as world
            ctx.diagnostic(SceneError::unresolved(
                ElementKind::Node,
                &record.name,
                "relativeid",
                parent,
            ));
            None
        }
        None => None,
    };

    let mut node = Node::new(record.index, &record.name);
    node.parent = parent;
    node.group_id = record.group_id;
    node.local = record.pose;
    node.pivot = record.pivot;
    node.extents = record.extents;
    node.visual_size = record.visual_size;
    node.visual_offset = record.visual_offset;
    node.primitive = record.primitive;
    node.mass = record.mass;
    node.material_id = (record.material_id != 0).then_some(record.material_id);
    node.collision_bitmask = record.collision_bitmask;
    node.movable = record.movable;
    node.world = relative_to_world(
        &record.pose,
        record.pivot,
        parent.and_then(|p| ctx.scene.node(p)),
    );

    if let Some(filename) = &record.filename {
        let path = base_dir.join(filename);
        let mesh = read_mesh_file(&path).map_err(|e| SceneError::mesh(&path, e))?;
        node.filename = Some(filename.clone());
        node.mesh = Some(mesh);
    }

    tracing::debug!("Node '{}' (id {})", node.name, node.id);
    if let Err(err) = ctx.scene.add_node(node) {
        ctx.diagnostic(SceneError::unresolved(
            ElementKind::Node,
            &record.name,
            "index",
            err,
        ));
    }
    Ok(())
}

fn add_joint(ctx: &mut SceneBuildContext, record: &JointRecord) {
    if !ctx.scene.contains_node(record.node1) {
        ctx.diagnostic(SceneError::unresolved(
            ElementKind::Joint,
            &record.name,
            "nodeindex1",
            record.node1,
        ));
        return;
    }

    let mut joint = Joint::new(record.index, &record.name, record.kind, record.node1);
    match record.node2 {
        Some(node2) if ctx.scene.contains_node(node2) => joint.node2 = Some(node2),
        Some(node2) => ctx.diagnostic(SceneError::unresolved(
            ElementKind::Joint,
            &record.name,
            "nodeindex2",
            node2,
        )),
        None => {}
    }

    let axis = record.axis.normalize_or_zero();
    joint.anchor_policy = record.anchor_policy;
    joint.anchor = record.anchor;
    joint.axis = if axis == Vec3::ZERO { Vec3::Z } else { axis };
    joint.frame_rotation = Quat::from_rotation_arc(Vec3::Z, joint.axis);
    joint.low_stop = record.low_stop;
    joint.high_stop = record.high_stop;
    joint.spring_const = record.spring_const;
    joint.damping_const = record.damping_const;
    joint.angle_offset = record.angle_offset;
    joint.authored_offset = Some(record.angle_offset);

    if let Err(err) = ctx.scene.add_joint(joint) {
        ctx.diagnostic(SceneError::unresolved(
            ElementKind::Joint,
            &record.name,
            "index",
            err,
        ));
    }
}

fn create_nodes<E: EditorScene + ?Sized>(
    editor: &mut E,
    ctx: &mut SceneBuildContext,
    base_dir: &Path,
    report: &mut ImportReport,
) -> SceneResult<()> {
    let material_names: HashMap<u32, String> = ctx
        .scene
        .materials
        .iter()
        .map(|m| (m.id, m.name.clone()))
        .collect();

    let ids: Vec<NodeId> = ctx.scene.node_ids().to_vec();
    for id in ids {
        let Some(node) = ctx.scene.node(id).cloned() else { continue };
        let pose = visual_world_pose(&node);
        let handle = match &node.filename {
            Some(filename) => editor.import_mesh_asset(&node.name, &base_dir.join(filename), pose)?,
            None => editor.create_primitive(&node.name, node.primitive, pose, node.extents),
        };

        editor.set_property(handle, keys::TYPE, "body".into());
        editor.set_property(handle, keys::ID, node.id.into());
        editor.set_property(handle, keys::GROUP, node.group_id.into());
        editor.set_property(handle, keys::PHYSIC_MODE, node.primitive.name().into());
        editor.set_property(handle, keys::MOVABLE, node.movable.into());
        editor.set_property(handle, keys::COLL_BITMASK, node.collision_bitmask.into());
        match node.mass {
            MassSpec::Mass(mass) => editor.set_property(handle, keys::MASS, mass.into()),
            MassSpec::Density(density) => {
                editor.set_property(handle, keys::DENSITY, density.into())
            }
            MassSpec::Unset => {}
        }
        if let Some(material_id) = node.material_id {
            match material_names.get(&material_id) {
                Some(name) => editor.set_property(handle, keys::MATERIAL, name.clone().into()),
                None => ctx.diagnostic(SceneError::unresolved(
                    ElementKind::Node,
                    &node.name,
                    "material_id",
                    material_id,
                )),
            }
        }

        if let Some(parent) = node.parent.and_then(|p| report.node_handles.get(&p)) {
            editor.set_parent(handle, Some(*parent))?;
        }
        report.node_handles.insert(id, handle);
    }
    Ok(())
}

fn create_joints<E: EditorScene + ?Sized>(
    editor: &mut E,
    ctx: &SceneBuildContext,
    motors: &HashMap<JointId, Motor>,
    report: &mut ImportReport,
) {
    for joint in ctx.scene.joints() {
        let handle = editor.create_empty(&joint.name, Pose::new(joint.anchor, joint.frame_rotation));
        editor.set_property(handle, keys::TYPE, "joint".into());
        editor.set_property(handle, keys::ID, joint.id.into());
        editor.set_property(handle, keys::JOINT_TYPE, joint.kind.name().into());
        editor.set_property(handle, keys::ANCHOR, joint.anchor_policy.name().into());
        editor.set_property(handle, keys::ANGLE_OFFSET, joint.angle_offset.into());
        if let Some(node2) = joint.node2.and_then(|id| node_name(&*editor, report, id)) {
            editor.set_property(handle, keys::NODE2, node2.into());
        }

        let optional = [
            (keys::LOW_STOP, joint.low_stop),
            (keys::HIGH_STOP, joint.high_stop),
            (keys::SPRING_CONST, joint.spring_const),
            (keys::DAMPING_CONST, joint.damping_const),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                editor.set_property(handle, key, value.into());
            }
        }

        if let Some(motor) = motors.get(&joint.id) {
            editor.set_property(handle, keys::MOTOR_NAME, motor.name.clone().into());
            editor.set_property(handle, keys::MOTOR_TYPE, motor.motor_type.into());
            editor.set_property(handle, keys::P, motor.p.into());
            editor.set_property(handle, keys::D, motor.d.into());
            if let Some(i) = motor.i {
                editor.set_property(handle, keys::I, i.into());
            }
            editor.set_property(handle, keys::MAX_VELOCITY, motor.max_velocity.into());
            editor.set_property(handle, keys::MAX_FORCE, motor.max_force.into());
            editor.set_property(handle, keys::MIN_VALUE, motor.min_value.into());
            editor.set_property(handle, keys::MAX_VALUE, motor.max_value.into());
        }

        if let Some(&parent) = report.node_handles.get(&joint.node1)
            && let Err(err) = editor.set_parent(handle, Some(parent))
        {
            tracing::warn!("Joint '{}': {}", joint.name, err);
        }
        report.joint_handles.insert(joint.id, handle);
    }
}

fn create_sensors<E: EditorScene + ?Sized>(
    editor: &mut E,
    ctx: &mut SceneBuildContext,
    report: &mut ImportReport,
) {
    let sensors: Vec<Sensor> = ctx.scene.sensors.clone();
    for sensor in &sensors {
        let handle = editor.create_empty(&sensor.name, Pose::IDENTITY);
        editor.set_property(handle, keys::TYPE, "sensor".into());
        editor.set_property(handle, keys::ID, sensor.id.into());
        editor.set_property(handle, keys::SENSOR_TYPE, sensor.params.type_name().into());
        editor.set_property(handle, keys::RATE, sensor.rate.into());

        let names: Vec<String> = sensor
            .referenced_ids
            .iter()
            .filter_map(|&id| object_name(&*editor, ctx, report, sensor, "id", id))
            .collect();
        editor.set_property(handle, keys::IDS, PropertyValue::List(names));

        match &sensor.params {
            SensorParams::Joint6Dof { node, joint } => {
                if let Some(name) = node_name(&*editor, report, *node) {
                    editor.set_property(handle, keys::NODE_ID, name.into());
                } else {
                    ctx.diagnostic(SceneError::unresolved(
                        ElementKind::Sensor,
                        &sensor.name,
                        "nodeID",
                        node,
                    ));
                }
                if let Some(name) = joint_name(&*editor, report, *joint) {
                    editor.set_property(handle, keys::JOINT_ID, name.into());
                } else {
                    ctx.diagnostic(SceneError::unresolved(
                        ElementKind::Sensor,
                        &sensor.name,
                        "jointID",
                        joint,
                    ));
                }
            }
            SensorParams::Ray {
                attached_node,
                width,
                opening_width,
                max_distance,
            } => {
                if let Some(name) = node_name(&*editor, report, *attached_node) {
                    editor.set_property(handle, keys::ATTACHED_NODE, name.into());
                } else {
                    ctx.diagnostic(SceneError::unresolved(
                        ElementKind::Sensor,
                        &sensor.name,
                        "attached_node",
                        attached_node,
                    ));
                }
                editor.set_property(handle, keys::WIDTH, (*width).into());
                editor.set_property(handle, keys::OPENING_WIDTH, (*opening_width).into());
                editor.set_property(handle, keys::MAX_DISTANCE, (*max_distance).into());
            }
            SensorParams::Generic { fields, .. } => {
                for (key, value) in fields {
                    let reference = value
                        .parse::<u32>()
                        .ok()
                        .filter(|_| is_reference_key(key))
                        .and_then(|id| object_name(&*editor, ctx, report, sensor, "field", id));
                    let value = reference.unwrap_or_else(|| value.clone());
                    editor.set_property(handle, key, value.into());
                }
            }
        }
        report.sensor_handles.push(handle);
    }
}

/// Name the editor gave to the object created for node `id`
fn node_name<E: EditorScene + ?Sized>(editor: &E, report: &ImportReport, id: NodeId) -> Option<String> {
    let handle = report.node_handles.get(&id)?;
    editor.object(*handle).map(|o| o.name)
}

fn joint_name<E: EditorScene + ?Sized>(editor: &E, report: &ImportReport, id: JointId) -> Option<String> {
    let handle = report.joint_handles.get(&id)?;
    editor.object(*handle).map(|o| o.name)
}

/// Editor name of the node (or else joint) with `id`
fn object_name<E: EditorScene + ?Sized>(
    editor: &E,
    ctx: &mut SceneBuildContext,
    report: &ImportReport,
    sensor: &Sensor,
    field: &'static str,
    id: u32,
) -> Option<String> {
    let name = node_name(&*editor, report, id).or_else(|| joint_name(&*editor, report, id));
    if name.is_none() {
        ctx.diagnostic(SceneError::unresolved(
            ElementKind::Sensor,
            &sensor.name,
            field,
            id,
        ));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{DocumentGeometry, DocumentObject, EditorDocument, Selection};
    use crate::error::ErrorKind;
    use crate::mesh::generate_box_mesh;
    use crate::pipeline::export_scene;
    use crate::types::{AnchorPolicy, JointKind, PrimitiveKind};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn block(name: &str, world: Pose) -> DocumentObject {
        DocumentObject::new(
            name,
            world,
            DocumentGeometry::Primitive {
                kind: PrimitiveKind::Box,
                size: Vec3::new(0.2, 0.2, 1.0),
            },
        )
        .with_property(keys::TYPE, "body")
    }

    fn world_of(doc: &EditorDocument, name: &str) -> Pose {
        let handle = doc.handle_by_name(name).unwrap();
        doc.get(handle).unwrap().world
    }

    fn parent_of(doc: &EditorDocument, name: &str) -> Option<String> {
        let handle = doc.handle_by_name(name).unwrap();
        doc.get(handle).unwrap().parent.clone()
    }

    /// Two bodies joined by a hinge anchored at their midpoint
    fn midpoint_hinge() -> EditorDocument {
        let mut doc = EditorDocument::new();
        doc.add_object(block("upper", Pose::from_position(Vec3::ZERO)));
        doc.add_object(
            DocumentObject::new(
                "knee",
                Pose::new(Vec3::new(0.0, 0.0, 1.0), Quat::from_rotation_x(FRAC_PI_2)),
                DocumentGeometry::Empty,
            )
            .with_parent("upper")
            .with_property(keys::TYPE, "joint")
            .with_property(keys::JOINT_TYPE, "hinge")
            .with_property(keys::NODE2, "lower")
            .with_property(keys::ANCHOR, "center"),
        );
        doc.add_object(
            block(
                "lower",
                Pose::new(Vec3::new(0.0, 0.0, 2.0), Quat::from_rotation_y(0.3)),
            )
            .with_parent("knee"),
        );
        doc
    }

    #[test]
    fn test_midpoint_hinge_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = midpoint_hinge();
        export_scene(&mut source, &Selection::All, dir.path(), &BridgeConfig::default()).unwrap();

        let mut doc = EditorDocument::new();
        let report = import_scene(&mut doc, dir.path(), &BridgeConfig::default()).unwrap();
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert_eq!(report.version, FormatVersion::V0_2);
        assert_eq!(report.node_handles.len(), 2);
        assert_eq!(report.joint_handles.len(), 1);

        for name in ["upper", "lower"] {
            assert!(
                world_of(&doc, name).abs_diff_eq(&world_of(&source, name), 1e-4, 1e-4),
                "{name}"
            );
        }

        let knee = report.scene.joint_by_name("knee").unwrap();
        assert_eq!(knee.kind, JointKind::Hinge);
        assert_eq!(knee.anchor_policy, AnchorPolicy::Midpoint);
        assert_relative_eq!(knee.anchor.z, 1.0, epsilon = 1e-4);
        assert_relative_eq!(knee.axis.y, -1.0, epsilon = 1e-4);

        let handle = report.joint_handles[&knee.id];
        let marker = doc.get(handle).unwrap();
        assert_eq!(marker.parent.as_deref(), Some("upper"));
        assert!(marker.world.position.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-4));
        assert_eq!(
            marker.properties.get(keys::NODE2),
            Some(&PropertyValue::Text("lower".into()))
        );
        assert_eq!(
            marker.properties.get(keys::P),
            Some(&PropertyValue::Float(13.0))
        );
        assert_eq!(parent_of(&doc, "lower").as_deref(), Some("upper"));
    }

    #[test]
    fn test_import_twice_keeps_hierarchies_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = midpoint_hinge();
        export_scene(&mut source, &Selection::All, dir.path(), &BridgeConfig::default()).unwrap();

        let mut doc = EditorDocument::new();
        import_scene(&mut doc, dir.path(), &BridgeConfig::default()).unwrap();
        let second = import_scene(&mut doc, dir.path(), &BridgeConfig::default()).unwrap();
        assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);
        assert_eq!(doc.objects.len(), 6);

        let upper = second.node_handles[&second.scene.node_by_name("upper").unwrap().id];
        let lower = second.node_handles[&second.scene.node_by_name("lower").unwrap().id];
        let knee = second.joint_handles[&second.scene.joint_by_name("knee").unwrap().id];
        assert_eq!(doc.get(upper).unwrap().name, "upper.001");
        assert_eq!(doc.get(lower).unwrap().name, "lower.001");
        assert_eq!(doc.get(knee).unwrap().name, "knee.001");

        assert_eq!(doc.object(lower).unwrap().parent, Some(upper));
        assert_eq!(doc.object(knee).unwrap().parent, Some(upper));
        assert_eq!(
            doc.get(knee).unwrap().properties.get(keys::NODE2),
            Some(&PropertyValue::Text("lower.001".into()))
        );

        // The first copy is untouched
        assert_eq!(parent_of(&doc, "lower").as_deref(), Some("upper"));
        assert_eq!(doc.query(&Selection::Roots(vec!["upper".into()])).len(), 3);
        assert_eq!(doc.query(&Selection::Roots(vec!["upper.001".into()])).len(), 3);
    }

    #[test]
    fn test_off_center_mesh_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = generate_box_mesh(Vec3::new(2.0, 1.0, 1.0));
        for p in &mut shell.positions {
            p[0] += 1.0;
        }

        let mut source = EditorDocument::new();
        source.add_object(block("base", Pose::IDENTITY));
        source.add_object(
            DocumentObject::new(
                "shell",
                Pose::new(Vec3::new(0.0, 0.0, 1.0), Quat::from_rotation_z(FRAC_PI_2)),
                DocumentGeometry::Mesh(shell.clone()),
            )
            .with_parent("base")
            .with_property(keys::TYPE, "body")
            .with_property(keys::GROUP, 1i64),
        );
        source.add_object(
            DocumentObject::new("weld", Pose::IDENTITY, DocumentGeometry::Empty)
                .with_parent("base")
                .with_property(keys::TYPE, "joint")
                .with_property(keys::JOINT_TYPE, "fixed")
                .with_property(keys::NODE2, "shell"),
        );
        let exported =
            export_scene(&mut source, &Selection::All, dir.path(), &BridgeConfig::default()).unwrap();
        assert_eq!(exported.mesh_files.len(), 1);

        let mut doc = EditorDocument::new();
        let report = import_scene(&mut doc, dir.path(), &BridgeConfig::default()).unwrap();

        let node = report.scene.node_by_name("shell").unwrap();
        assert!(node.pivot.abs_diff_eq(Vec3::X, 1e-6));
        assert!(node.world_pivot().abs_diff_eq(Vec3::new(0.0, 1.0, 1.0), 1e-4));
        assert!(world_of(&doc, "shell").abs_diff_eq(&world_of(&source, "shell"), 1e-4, 1e-4));
        assert_eq!(parent_of(&doc, "shell").as_deref(), Some("base"));

        let handle = doc.handle_by_name("shell").unwrap();
        let DocumentGeometry::Mesh(buffers) = &doc.get(handle).unwrap().geometry else {
            panic!("shell imported without mesh geometry");
        };
        let (min, max) = buffers.bounding_box().unwrap();
        assert!(min.abs_diff_eq(Vec3::new(0.0, -0.5, -0.5), 1e-5));
        assert!(max.abs_diff_eq(Vec3::new(2.0, 0.5, 0.5), 1e-5));

        let weld = report.scene.joint_by_name("weld").unwrap();
        assert_eq!(weld.kind, JointKind::Fixed);
        assert!(report.scene.motors.is_empty());
    }

    const FORWARD_REFERENCE: &str = r#"<?xml version="1.0"?>
<SceneFile>
  <version>0.2</version>
  <nodelist>
    <node name="child">
      <filename>PRIMITIVE</filename>
      <index>1</index>
      <groupid>1</groupid>
      <relativeid>2</relativeid>
      <physicmode>box</physicmode>
      <relativeposition><x>1</x><y>2</y><z>3</z></relativeposition>
      <relativerotation><x>0</x><y>0</y><z>0</z><w>1</w></relativerotation>
      <extend><x>1</x><y>1</y><z>1</z></extend>
      <density>100</density>
    </node>
    <node name="parent">
      <filename>PRIMITIVE</filename>
      <index>2</index>
      <groupid>2</groupid>
      <physicmode>box</physicmode>
      <position><x>5</x><y>0</y><z>0</z></position>
      <rotation><x>0</x><y>0</y><z>0</z><w>1</w></rotation>
      <extend><x>1</x><y>1</y><z>1</z></extend>
      <density>100</density>
    </node>
  </nodelist>
</SceneFile>
"#;

    #[test]
    fn test_forward_relative_id_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("forward.scene"), FORWARD_REFERENCE).unwrap();

        let mut doc = EditorDocument::new();
        let report = import_scene(&mut doc, dir.path(), &BridgeConfig::default()).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind(), ErrorKind::UnresolvedReference);

        let child = report.scene.node(1).unwrap();
        assert_eq!(child.parent, None);
        assert!(child.world.position.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert_eq!(parent_of(&doc, "child"), None);
    }

    #[test]
    fn test_missing_scene_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = EditorDocument::new();
        let err = import_scene(&mut doc, dir.path(), &BridgeConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(doc.objects.is_empty());
    }

    #[test]
    fn test_two_scene_files_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.scene"), FORWARD_REFERENCE).unwrap();
        std::fs::write(dir.path().join("b.scene"), FORWARD_REFERENCE).unwrap();
        assert!(find_scene_file(dir.path()).is_err());

        let single = dir.path().join("a.scene");
        assert_eq!(find_scene_file(&single).unwrap(), single);
    }

    #[test]
    fn test_missing_mesh_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = EditorDocument::new();
        source.add_object(
            DocumentObject::new(
                "hull",
                Pose::IDENTITY,
                DocumentGeometry::Mesh(generate_box_mesh(Vec3::ONE)),
            )
            .with_property(keys::TYPE, "body"),
        );
        let exported =
            export_scene(&mut source, &Selection::All, dir.path(), &BridgeConfig::default()).unwrap();
        std::fs::remove_file(&exported.mesh_files[0]).unwrap();

        let mut doc = EditorDocument::new();
        let err = import_scene(&mut doc, dir.path(), &BridgeConfig::default()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }
}
