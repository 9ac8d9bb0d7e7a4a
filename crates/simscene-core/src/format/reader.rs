//! Scene description reader
//!
//! Each element is read against its own field table. A missing required
//! field drops that element with a `MissingRequiredField` diagnostic and
//! parsing continues with its siblings; malformed XML is fatal.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use glam::{Quat, Vec3};
use roxmltree::{Document, Node};

use super::schema::{
    JointRecord, LEGACY_VERSION_NOTES, NodeRecord, PRIMITIVE_FILENAME, SceneDescription,
    extents_from_version,
};
use crate::config::FormatVersion;
use crate::error::{ElementKind, SceneError, SceneResult};
use crate::scene::{MassSpec, Material, Motor, Sensor, SensorParams};
use crate::types::{AnchorPolicy, JointKind, Pose, PrimitiveKind};

/// Result of parsing a scene description
#[derive(Debug, Clone, Default)]
pub struct ParsedScene {
    pub description: SceneDescription,
    /// Non-fatal problems; the offending elements were skipped
    pub diagnostics: Vec<SceneError>,
}

/// Read and parse a scene description file
pub fn read_scene_file(path: impl AsRef<Path>) -> SceneResult<ParsedScene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
    parse_scene(&text).map_err(|err| match err {
        SceneError::Io { reason, .. } => SceneError::io(path, reason),
        other => other,
    })
}

/// Parse a scene description
pub fn parse_scene(text: &str) -> SceneResult<ParsedScene> {
    let doc = Document::parse(text).map_err(|e| SceneError::io("<scene>", e))?;
    let root = doc.root_element();
    if root.tag_name().name() != "SceneFile" {
        return Err(SceneError::io(
            "<scene>",
            format!("expected <SceneFile> root, found <{}>", root.tag_name().name()),
        ));
    }

    let version = match child_text(root, "version") {
        Some(text) => FormatVersion::parse(text).unwrap_or_else(|| {
            tracing::warn!("Unreadable scene version '{}', assuming 0.1", text);
            FormatVersion::V0_1
        }),
        None => {
            tracing::warn!("Scene has no <version>, assuming 0.1");
            FormatVersion::V0_1
        }
    };
    if version < FormatVersion::V0_2 {
        tracing::warn!("Old scene file version {}, note the following changes:", version);
        for note in LEGACY_VERSION_NOTES {
            tracing::warn!("  - {}", note);
        }
    }

    let mut parsed = ParsedScene {
        description: SceneDescription::new(version),
        diagnostics: Vec::new(),
    };

    for element in elements(root, "node") {
        collect(&mut parsed.diagnostics, &mut parsed.description.nodes, read_node(element, version));
    }
    for element in elements(root, "joint") {
        collect(&mut parsed.diagnostics, &mut parsed.description.joints, read_joint(element));
    }
    for element in elements(root, "motor") {
        collect(&mut parsed.diagnostics, &mut parsed.description.motors, read_motor(element));
    }
    for element in elements(root, "material") {
        collect(
            &mut parsed.diagnostics,
            &mut parsed.description.materials,
            read_material(element),
        );
    }
    for element in elements(root, "sensor") {
        let fields = Fields::new(element, ElementKind::Sensor);
        match read_sensor(&fields, &mut parsed.diagnostics) {
            Ok(sensor) => parsed.description.sensors.push(sensor),
            Err(err) => push_diagnostic(&mut parsed.diagnostics, err),
        }
    }

    tracing::debug!(
        "Parsed scene v{}: {} nodes, {} joints, {} motors, {} materials, {} sensors",
        version,
        parsed.description.nodes.len(),
        parsed.description.joints.len(),
        parsed.description.motors.len(),
        parsed.description.materials.len(),
        parsed.description.sensors.len()
    );
    Ok(parsed)
}

fn collect<T>(diagnostics: &mut Vec<SceneError>, out: &mut Vec<T>, result: SceneResult<T>) {
    match result {
        Ok(record) => out.push(record),
        Err(err) => push_diagnostic(diagnostics, err),
    }
}

fn push_diagnostic(diagnostics: &mut Vec<SceneError>, err: SceneError) {
    tracing::warn!("{}", err);
    diagnostics.push(err);
}

fn elements<'a, 'input>(
    root: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    root.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
        .map(|n| n.text().unwrap_or("").trim())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Field access for one element, carrying its kind and name for errors
struct Fields<'a, 'input> {
    node: Node<'a, 'input>,
    element: ElementKind,
    name: String,
}

impl<'a, 'input> Fields<'a, 'input> {
    fn new(node: Node<'a, 'input>, element: ElementKind) -> Self {
        let name = node
            .attribute("name")
            .or_else(|| child_text(node, "name"))
            .or_else(|| child_text(node, "index"))
            .or_else(|| child_text(node, "id"))
            .unwrap_or("?")
            .to_string();
        Self {
            node,
            element,
            name,
        }
    }

    fn missing(&self, field: &'static str) -> SceneError {
        SceneError::missing(self.element, &self.name, field)
    }

    fn text(&self, tag: &str) -> Option<&'a str> {
        child_text(self.node, tag)
    }

    fn parse<T: FromStr>(&self, tag: &str) -> Option<T> {
        let text = self.text(tag)?;
        match text.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::debug!("{} '{}': unreadable <{}> '{}'", self.element, self.name, tag, text);
                None
            }
        }
    }

    fn required<T: FromStr>(&self, tag: &'static str) -> SceneResult<T> {
        self.parse(tag).ok_or_else(|| self.missing(tag))
    }

    fn flag(&self, tag: &str) -> Option<bool> {
        self.text(tag).and_then(parse_bool)
    }

    fn group(&self, tag: &str) -> Option<Node<'a, 'input>> {
        self.node
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == tag)
    }

    /// Vector child read as `x|y|z`, or the legacy `xpos` / `<tag>x` spellings
    fn vec3(&self, tag: &str) -> Option<Vec3> {
        let group = self.group(tag)?;
        let component = |c: &str| -> Option<f32> {
            [c.to_string(), format!("{c}pos"), format!("{tag}{c}")]
                .iter()
                .find_map(|name| child_text(group, name))
                .and_then(|t| t.parse().ok())
        };
        Some(Vec3::new(component("x")?, component("y")?, component("z")?))
    }

    fn required_vec3(&self, tag: &'static str) -> SceneResult<Vec3> {
        self.vec3(tag).ok_or_else(|| self.missing(tag))
    }

    fn quat(&self, tag: &str) -> Option<Quat> {
        let group = self.group(tag)?;
        let component = |c: &str| -> Option<f32> { child_text(group, c)?.parse().ok() };
        let q = Quat::from_xyzw(component("x")?, component("y")?, component("z")?, component("w")?);
        (q.length_squared() > 0.0).then(|| q.normalize())
    }

    fn required_quat(&self, tag: &'static str) -> SceneResult<Quat> {
        self.quat(tag).ok_or_else(|| self.missing(tag))
    }

    fn rgb(&self, tag: &'static str) -> SceneResult<[f32; 3]> {
        let group = self.group(tag).ok_or_else(|| self.missing(tag))?;
        let component = |c: &str| -> Option<f32> { child_text(group, c)?.parse().ok() };
        match (component("r"), component("g"), component("b")) {
            (Some(r), Some(g), Some(b)) => Ok([r, g, b]),
            _ => Err(self.missing(tag)),
        }
    }
}

fn read_node(element: Node, version: FormatVersion) -> SceneResult<NodeRecord> {
    let fields = Fields::new(element, ElementKind::Node);
    if element.attribute("name").is_none() && fields.text("origname").is_none() {
        return Err(fields.missing("name"));
    }
    let name = element
        .attribute("name")
        .or_else(|| fields.text("origname"))
        .unwrap_or_default()
        .to_string();

    let index = fields.required("index")?;
    let primitive = fields
        .text("physicmode")
        .and_then(PrimitiveKind::parse)
        .ok_or_else(|| fields.missing("physicmode"))?;

    let relative_id = fields.parse::<u32>("relativeid").filter(|&id| id != 0);
    let pose = match relative_id {
        Some(_) => Pose::new(
            fields
                .vec3("relativeposition")
                .or_else(|| fields.vec3("position"))
                .ok_or_else(|| fields.missing("relativeposition"))?,
            fields
                .quat("relativerotation")
                .or_else(|| fields.quat("rotation"))
                .ok_or_else(|| fields.missing("relativerotation"))?,
        ),
        None => Pose::new(
            fields.required_vec3("position")?,
            fields.required_quat("rotation")?,
        ),
    };

    let extents = extents_from_version(primitive, fields.required_vec3("extend")?, version);
    let mass = match (fields.parse("mass"), fields.parse("density")) {
        (Some(mass), _) => MassSpec::Mass(mass),
        (None, Some(density)) => MassSpec::Density(density),
        (None, None) => MassSpec::Unset,
    };
    let filename = fields
        .text("filename")
        .filter(|f| !f.is_empty() && *f != PRIMITIVE_FILENAME)
        .map(str::to_string);
    let visual_offset = Pose::new(
        fields.vec3("visualposition").unwrap_or(Vec3::ZERO),
        fields.quat("visualrotation").unwrap_or(Quat::IDENTITY),
    );

    Ok(NodeRecord {
        origname: fields.text("origname").unwrap_or(&name).to_string(),
        name,
        filename,
        index,
        group_id: fields.parse("groupid").unwrap_or(0),
        primitive,
        relative_id,
        pose,
        movable: fields.flag("movable").unwrap_or(true),
        extents,
        material_id: fields.parse("material_id").unwrap_or(0),
        mass,
        pivot: fields.vec3("pivot").unwrap_or(Vec3::ZERO),
        visual_size: fields.vec3("visualsize").unwrap_or(extents),
        visual_offset,
        collision_bitmask: fields.parse("coll_bitmask").unwrap_or(0),
    })
}

fn read_joint(element: Node) -> SceneResult<JointRecord> {
    let fields = Fields::new(element, ElementKind::Joint);
    let index = fields.required("index")?;
    let kind = fields
        .text("type")
        .and_then(JointKind::parse)
        .ok_or_else(|| fields.missing("type"))?;
    let node1 = fields.required("nodeindex1")?;
    let node2 = fields.parse::<u32>("nodeindex2").filter(|&id| id != 0);

    let anchor = fields.required_vec3("anchor")?;
    let anchor_text = fields.text("anchorpos").ok_or_else(|| fields.missing("anchorpos"))?;
    let anchor_policy = match anchor_text.parse::<u32>() {
        Ok(code) => AnchorPolicy::from_code(code, anchor),
        Err(_) => AnchorPolicy::parse(anchor_text, anchor),
    }
    .ok_or_else(|| fields.missing("anchorpos"))?;

    Ok(JointRecord {
        name: fields.name.clone(),
        index,
        kind,
        node1,
        node2,
        anchor_policy,
        anchor,
        axis: fields.required_vec3("axis1")?,
        low_stop: fields.parse("lowStopAxis1"),
        high_stop: fields.parse("highStopAxis1"),
        damping_const: fields.parse("damping_const_constraint_axis1"),
        spring_const: fields.parse("spring_const_constraint_axis1"),
        angle_offset: fields.required("angle1_offset")?,
    })
}

fn read_motor(element: Node) -> SceneResult<Motor> {
    let fields = Fields::new(element, ElementKind::Motor);
    let id = fields.required("index")?;
    Ok(Motor {
        id,
        name: element
            .attribute("name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("motor_{id}")),
        joint: fields.required("jointIndex")?,
        axis: fields.required("axis")?,
        max_velocity: fields.required("maximumVelocity")?,
        max_force: fields.required("motorMaxForce")?,
        motor_type: fields.required("type")?,
        p: fields.required("p")?,
        i: fields.parse("i"),
        d: fields.required("d")?,
        min_value: fields.required("min_val")?,
        max_value: fields.required("max_val")?,
        value: fields.required("value")?,
    })
}

fn read_material(element: Node) -> SceneResult<Material> {
    let fields = Fields::new(element, ElementKind::Material);
    let id = fields.required("id")?;
    Ok(Material {
        id,
        name: fields
            .text("name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("material_{id}")),
        diffuse: fields.rgb("diffuseFront")?,
        specular: fields.rgb("specularFront")?,
        shininess: fields.required("shininess")?,
    })
}

const SENSOR_COMMON_FIELDS: &[&str] = &["index", "rate", "id", "name"];

fn read_sensor(fields: &Fields, diagnostics: &mut Vec<SceneError>) -> SceneResult<Sensor> {
    let type_name = fields
        .node
        .attribute("type")
        .or_else(|| fields.text("type"))
        .ok_or_else(|| fields.missing("type"))?;
    let id = fields.required("index")?;
    let rate = fields.required("rate")?;

    let mut referenced_ids = Vec::new();
    for reference in fields
        .node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "id")
    {
        let text = reference.text().unwrap_or("").trim();
        match text.parse() {
            Ok(id) => referenced_ids.push(id),
            Err(_) => push_diagnostic(
                diagnostics,
                SceneError::unresolved(ElementKind::Sensor, &fields.name, "id", text),
            ),
        }
    }

    let params = match type_name {
        SensorParams::JOINT_6DOF => {
            let (node, joint) = match (fields.parse("nodeID"), fields.parse("jointID")) {
                (Some(node), Some(joint)) => (node, joint),
                // Old files list the node and joint as plain ids
                _ => match referenced_ids.as_slice() {
                    [node, joint] => (*node, *joint),
                    _ => return Err(fields.missing("nodeID")),
                },
            };
            SensorParams::Joint6Dof { node, joint }
        }
        SensorParams::RAY => SensorParams::Ray {
            attached_node: fields.required("attached_node")?,
            width: fields.required("width")?,
            opening_width: fields.required("opening_width")?,
            max_distance: fields.required("max_distance")?,
        },
        other => {
            let mut extra = BTreeMap::new();
            for child in fields.node.children().filter(|n| n.is_element()) {
                let tag = child.tag_name().name();
                if !SENSOR_COMMON_FIELDS.contains(&tag) && tag != "type" {
                    extra.insert(tag.to_string(), child.text().unwrap_or("").trim().to_string());
                }
            }
            SensorParams::Generic {
                type_name: other.to_string(),
                fields: extra,
            }
        }
    };

    Ok(Sensor {
        id,
        name: fields.name.clone(),
        rate,
        referenced_ids,
        params,
    })
}
