//! Joint-related type definitions

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Joint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JointKind {
    #[default]
    Hinge,
    Hinge2,
    Slider,
    Ball,
    Universal,
    Fixed,
    IstructSpine,
}

/// Name and numeric engine id for every joint kind
const JOINT_KIND_TABLE: &[(JointKind, &str, u32)] = &[
    (JointKind::Hinge, "hinge", 1),
    (JointKind::Hinge2, "hinge2", 2),
    (JointKind::Slider, "slider", 3),
    (JointKind::Ball, "ball", 4),
    (JointKind::Universal, "universal", 5),
    (JointKind::Fixed, "fixed", 6),
    (JointKind::IstructSpine, "istruct-spine", 7),
];

impl JointKind {
    pub fn name(&self) -> &'static str {
        JOINT_KIND_TABLE
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("undefined")
    }

    pub fn code(&self) -> u32 {
        JOINT_KIND_TABLE
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, _, code)| *code)
            .unwrap_or(0)
    }

    /// Parse a joint kind from its name or its decimal engine id
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some((kind, _, _)) = JOINT_KIND_TABLE.iter().find(|(_, name, _)| *name == text) {
            return Some(*kind);
        }
        let code: u32 = text.parse().ok()?;
        JOINT_KIND_TABLE
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(kind, _, _)| *kind)
    }

    /// Joints that get a paired motor when no spring constant is authored
    pub fn is_motorized(&self) -> bool {
        matches!(self, JointKind::Hinge | JointKind::Slider)
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, JointKind::Fixed)
    }

    pub fn all() -> impl Iterator<Item = JointKind> {
        JOINT_KIND_TABLE.iter().map(|(kind, _, _)| *kind)
    }
}

/// Where a joint's anchor point is taken from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum AnchorPolicy {
    AtNode1,
    #[default]
    AtNode2,
    Midpoint,
    /// Stored world position, used untransformed
    Custom(Vec3),
}

impl AnchorPolicy {
    /// Numeric code written to `<anchorpos>`
    pub fn code(&self) -> u32 {
        match self {
            AnchorPolicy::AtNode1 => 1,
            AnchorPolicy::AtNode2 => 2,
            AnchorPolicy::Midpoint => 3,
            AnchorPolicy::Custom(_) => 4,
        }
    }

    /// Build a policy from its numeric code; custom anchors take `anchor`
    pub fn from_code(code: u32, anchor: Vec3) -> Option<Self> {
        match code {
            1 => Some(AnchorPolicy::AtNode1),
            2 => Some(AnchorPolicy::AtNode2),
            3 => Some(AnchorPolicy::Midpoint),
            4 => Some(AnchorPolicy::Custom(anchor)),
            _ => None,
        }
    }

    /// Editor property spelling
    pub fn name(&self) -> &'static str {
        match self {
            AnchorPolicy::AtNode1 => "node1",
            AnchorPolicy::AtNode2 => "node2",
            AnchorPolicy::Midpoint => "center",
            AnchorPolicy::Custom(_) => "custom",
        }
    }

    /// Parse the editor property spelling; `custom` takes `anchor`
    pub fn parse(text: &str, anchor: Vec3) -> Option<Self> {
        match text.trim() {
            "node1" => Some(AnchorPolicy::AtNode1),
            "node2" => Some(AnchorPolicy::AtNode2),
            "center" | "midpoint" => Some(AnchorPolicy::Midpoint),
            "custom" => Some(AnchorPolicy::Custom(anchor)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_kind_names_and_codes() {
        for kind in JointKind::all() {
            assert_eq!(JointKind::parse(kind.name()), Some(kind));
            assert_eq!(JointKind::parse(&kind.code().to_string()), Some(kind));
        }
        assert_eq!(JointKind::parse("istruct-spine"), Some(JointKind::IstructSpine));
        assert_eq!(JointKind::parse("0"), None);
        assert_eq!(JointKind::parse("revolute"), None);
    }

    #[test]
    fn test_motorized_kinds() {
        assert!(JointKind::Hinge.is_motorized());
        assert!(JointKind::Slider.is_motorized());
        assert!(!JointKind::Ball.is_motorized());
        assert!(!JointKind::Fixed.is_motorized());
    }

    #[test]
    fn test_anchor_policy_codes() {
        let anchor = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(AnchorPolicy::from_code(3, anchor), Some(AnchorPolicy::Midpoint));
        assert_eq!(
            AnchorPolicy::from_code(4, anchor),
            Some(AnchorPolicy::Custom(anchor))
        );
        assert_eq!(AnchorPolicy::from_code(9, anchor), None);
        assert_eq!(AnchorPolicy::parse("midpoint", anchor), Some(AnchorPolicy::Midpoint));
        assert_eq!(AnchorPolicy::Midpoint.name(), "center");
    }
}
