//! Motor definition

use super::JointId;

pub type MotorId = u32;

/// Motor driving one joint axis
#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    pub id: MotorId,
    pub name: String,
    pub joint: JointId,
    pub axis: u32,
    pub max_velocity: f32,
    pub max_force: f32,
    /// Engine motor type (1 = PID)
    pub motor_type: u32,
    pub p: f32,
    pub i: Option<f32>,
    pub d: f32,
    pub min_value: f32,
    pub max_value: f32,
    /// Initial target value
    pub value: f32,
}
