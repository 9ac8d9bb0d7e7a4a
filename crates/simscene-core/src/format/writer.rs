//! Scene description writer

use std::path::Path;

use super::schema::{
    JointRecord, NodeRecord, PRIMITIVE_FILENAME, SceneDescription, extents_for_version,
    is_identity,
};
use super::xml::XmlWriter;
use crate::config::FormatVersion;
use crate::error::{SceneError, SceneResult};
use crate::scene::{MassSpec, Material, Motor, Sensor, SensorParams};

/// Render a scene description as XML
pub fn write_scene(description: &SceneDescription) -> String {
    let version = description.version;
    let mut xml = XmlWriter::new();
    xml.open("SceneFile", &[]);
    xml.leaf("version", version);

    xml.open("nodelist", &[]);
    for node in &description.nodes {
        write_node(&mut xml, node, version);
    }
    xml.close();

    xml.open("jointlist", &[]);
    for joint in &description.joints {
        write_joint(&mut xml, joint);
    }
    xml.close();

    xml.open("motorlist", &[]);
    for motor in &description.motors {
        write_motor(&mut xml, motor);
    }
    xml.close();

    xml.open("materiallist", &[]);
    for material in &description.materials {
        write_material(&mut xml, material);
    }
    xml.close();

    if version.has_pivot() {
        xml.open("sensorlist", &[]);
        for sensor in &description.sensors {
            write_sensor(&mut xml, sensor);
        }
        xml.close();
    } else if !description.sensors.is_empty() {
        tracing::warn!(
            "Version {} has no sensor list, dropping {} sensors",
            version,
            description.sensors.len()
        );
    }

    xml.finish()
}

/// Write the scene description to `path`
pub fn write_scene_file(description: &SceneDescription, path: impl AsRef<Path>) -> SceneResult<()> {
    let path = path.as_ref();
    std::fs::write(path, write_scene(description)).map_err(|e| SceneError::io(path, e))?;
    tracing::debug!("Wrote scene description {:?}", path);
    Ok(())
}

fn write_node(xml: &mut XmlWriter, node: &NodeRecord, version: FormatVersion) {
    xml.open("node", &[("name", node.name.as_str())]);
    xml.leaf("origname", &node.origname);
    xml.leaf("filename", node.filename.as_deref().unwrap_or(PRIMITIVE_FILENAME));
    xml.leaf("index", node.index);
    xml.leaf("groupid", node.group_id);
    xml.leaf("physicmode", node.primitive.name());
    match node.relative_id {
        Some(parent) => {
            xml.leaf("relativeid", parent);
            xml.vec3("relativeposition", node.pose.position);
            xml.quat("relativerotation", node.pose.rotation);
        }
        None => {
            xml.vec3("position", node.pose.position);
            xml.quat("rotation", node.pose.rotation);
        }
    }
    xml.leaf("movable", node.movable);
    xml.vec3("extend", extents_for_version(node.primitive, node.extents, version));
    xml.leaf("material_id", node.material_id);
    match node.mass {
        MassSpec::Mass(mass) => xml.leaf("mass", mass),
        MassSpec::Density(density) => xml.leaf("density", density),
        MassSpec::Unset => {}
    }
    if version.has_pivot() {
        xml.vec3("pivot", node.pivot);
    }
    xml.vec3("visualsize", node.visual_size);
    if !is_identity(&node.visual_offset) {
        xml.vec3("visualposition", node.visual_offset.position);
        xml.quat("visualrotation", node.visual_offset.rotation);
    }
    xml.leaf("coll_bitmask", node.collision_bitmask);
    xml.close();
}

fn write_joint(xml: &mut XmlWriter, joint: &JointRecord) {
    xml.open("joint", &[("name", joint.name.as_str())]);
    xml.leaf("index", joint.index);
    xml.leaf("type", joint.kind.name());
    xml.leaf("nodeindex1", joint.node1);
    xml.leaf("nodeindex2", joint.node2.unwrap_or(0));
    xml.leaf("anchorpos", joint.anchor_policy.code());
    xml.vec3("anchor", joint.anchor);
    xml.vec3("axis1", joint.axis);
    xml.opt_leaf("lowStopAxis1", joint.low_stop);
    xml.opt_leaf("highStopAxis1", joint.high_stop);
    xml.opt_leaf("damping_const_constraint_axis1", joint.damping_const);
    xml.opt_leaf("spring_const_constraint_axis1", joint.spring_const);
    xml.leaf("angle1_offset", joint.angle_offset);
    xml.close();
}

fn write_motor(xml: &mut XmlWriter, motor: &Motor) {
    xml.open("motor", &[("name", motor.name.as_str())]);
    xml.leaf("index", motor.id);
    xml.leaf("jointIndex", motor.joint);
    xml.leaf("axis", motor.axis);
    xml.leaf("maximumVelocity", motor.max_velocity);
    xml.leaf("motorMaxForce", motor.max_force);
    xml.leaf("type", motor.motor_type);
    xml.leaf("p", motor.p);
    xml.leaf("d", motor.d);
    xml.opt_leaf("i", motor.i);
    xml.leaf("min_val", motor.min_value);
    xml.leaf("max_val", motor.max_value);
    xml.leaf("value", motor.value);
    xml.close();
}

fn write_material(xml: &mut XmlWriter, material: &Material) {
    xml.open("material", &[]);
    xml.leaf("id", material.id);
    xml.leaf("name", &material.name);
    xml.rgba("diffuseFront", material.diffuse);
    xml.rgba("specularFront", material.specular);
    xml.leaf("shininess", material.shininess);
    xml.close();
}

fn write_sensor(xml: &mut XmlWriter, sensor: &Sensor) {
    xml.open(
        "sensor",
        &[("name", sensor.name.as_str()), ("type", sensor.params.type_name())],
    );
    xml.leaf("index", sensor.id);
    xml.leaf("rate", sensor.rate);
    for id in &sensor.referenced_ids {
        xml.leaf("id", id);
    }
    match &sensor.params {
        SensorParams::Joint6Dof { node, joint } => {
            xml.leaf("nodeID", node);
            xml.leaf("jointID", joint);
        }
        SensorParams::Ray {
            attached_node,
            width,
            opening_width,
            max_distance,
        } => {
            xml.leaf("attached_node", attached_node);
            xml.leaf("width", width);
            xml.leaf("opening_width", opening_width);
            xml.leaf("max_distance", max_distance);
        }
        SensorParams::Generic { fields, .. } => {
            for (key, value) in fields {
                xml.leaf(key, value);
            }
        }
    }
    xml.close();
}
