//! Primitive (physics shape) type definitions

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Physics shape of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PrimitiveKind {
    #[default]
    Box,
    Sphere,
    Cylinder,
    Capsule,
    Plane,
    Mesh,
    Terrain,
    Reference,
}

const PRIMITIVE_KIND_TABLE: &[(PrimitiveKind, &str, u32)] = &[
    (PrimitiveKind::Mesh, "mesh", 1),
    (PrimitiveKind::Box, "box", 2),
    (PrimitiveKind::Sphere, "sphere", 3),
    (PrimitiveKind::Capsule, "capsule", 4),
    (PrimitiveKind::Cylinder, "cylinder", 5),
    (PrimitiveKind::Plane, "plane", 6),
    (PrimitiveKind::Terrain, "terrain", 7),
    (PrimitiveKind::Reference, "reference", 8),
];

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        PRIMITIVE_KIND_TABLE
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("undefined")
    }

    /// Parse from the `physicmode` name or its decimal engine id
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some((kind, _, _)) = PRIMITIVE_KIND_TABLE
            .iter()
            .find(|(_, name, _)| *name == text)
        {
            return Some(*kind);
        }
        let code: u32 = text.parse().ok()?;
        PRIMITIVE_KIND_TABLE
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(kind, _, _)| *kind)
    }

    pub fn has_radius(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Sphere | PrimitiveKind::Cylinder | PrimitiveKind::Capsule
        )
    }

    /// Engine extents from a bounding-box size, with an optional authored radius
    pub fn extents_from_size(&self, size: Vec3, radius: Option<f32>) -> Vec3 {
        match self {
            PrimitiveKind::Sphere => {
                let r = radius.unwrap_or_else(|| size.max_element() * 0.5);
                Vec3::splat(r)
            }
            PrimitiveKind::Cylinder | PrimitiveKind::Capsule => {
                let r = radius.unwrap_or_else(|| size.x.max(size.y) * 0.5);
                Vec3::new(r, size.z, r)
            }
            PrimitiveKind::Plane => Vec3::new(size.x, size.y, 0.0),
            _ => size,
        }
    }

    /// Bounding-box size of a primitive with the given engine extents
    pub fn bounding_size(&self, extents: Vec3) -> Vec3 {
        match self {
            PrimitiveKind::Sphere => Vec3::splat(extents.x * 2.0),
            PrimitiveKind::Cylinder | PrimitiveKind::Capsule => {
                Vec3::new(extents.x * 2.0, extents.x * 2.0, extents.y)
            }
            PrimitiveKind::Plane => Vec3::new(extents.x, extents.y, 0.0),
            _ => extents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_code() {
        assert_eq!(PrimitiveKind::parse("box"), Some(PrimitiveKind::Box));
        assert_eq!(PrimitiveKind::parse(" mesh "), Some(PrimitiveKind::Mesh));
        assert_eq!(PrimitiveKind::parse("3"), Some(PrimitiveKind::Sphere));
        assert_eq!(PrimitiveKind::parse("cone"), None);
        assert_eq!(PrimitiveKind::Capsule.name(), "capsule");
    }

    #[test]
    fn test_extents_round_trip_through_bounding_size() {
        let size = Vec3::new(0.4, 0.4, 1.5);
        for kind in [
            PrimitiveKind::Box,
            PrimitiveKind::Cylinder,
            PrimitiveKind::Capsule,
        ] {
            let extents = kind.extents_from_size(size, None);
            assert_eq!(kind.bounding_size(extents), size);
        }
    }

    #[test]
    fn test_explicit_radius_overrides_bounding_box() {
        let extents = PrimitiveKind::Sphere.extents_from_size(Vec3::ONE, Some(0.2));
        assert_eq!(extents, Vec3::splat(0.2));
        let extents = PrimitiveKind::Cylinder.extents_from_size(Vec3::new(1.0, 1.0, 3.0), Some(0.1));
        assert_eq!(extents, Vec3::new(0.1, 3.0, 0.1));
    }
}
