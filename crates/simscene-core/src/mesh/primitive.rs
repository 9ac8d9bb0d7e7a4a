//! Primitive mesh generation

use glam::Vec3;

use super::{MeshBuffers, Polygon};

/// Generate a box centered at the origin: 8 shared corners, 6 flat quads
pub fn generate_box_mesh(size: Vec3) -> MeshBuffers {
    let h = size * 0.5;
    let positions: Vec<[f32; 3]> = (0..8u32)
        .map(|i| {
            [
                if i & 1 == 0 { -h.x } else { h.x },
                if i & 2 == 0 { -h.y } else { h.y },
                if i & 4 == 0 { -h.z } else { h.z },
            ]
        })
        .collect();

    // Counter-clockwise seen from outside
    let faces: [([u32; 4], [f32; 3]); 6] = [
        ([0, 4, 6, 2], [-1.0, 0.0, 0.0]),
        ([1, 3, 7, 5], [1.0, 0.0, 0.0]),
        ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
        ([2, 6, 7, 3], [0.0, 1.0, 0.0]),
        ([0, 2, 3, 1], [0.0, 0.0, -1.0]),
        ([4, 5, 7, 6], [0.0, 0.0, 1.0]),
    ];

    let normals = positions
        .iter()
        .map(|p| Vec3::from(*p).normalize_or_zero().to_array())
        .collect();

    let polygons = faces
        .iter()
        .map(|(vertices, normal)| Polygon {
            vertices: vertices.to_vec(),
            uvs: None,
            smooth: false,
            normal: *normal,
        })
        .collect();

    MeshBuffers {
        positions,
        normals,
        polygons,
    }
}

/// Unit cube with flat shading
pub fn unit_cube() -> MeshBuffers {
    generate_box_mesh(Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_bounding_box() {
        let mesh = generate_box_mesh(Vec3::new(2.0, 1.0, 0.5));
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Vec3::new(-1.0, -0.5, -0.25));
        assert_eq!(max, Vec3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn test_box_faces_point_outwards() {
        let mesh = unit_cube();
        for polygon in &mesh.polygons {
            let p = |i: usize| Vec3::from(mesh.positions[polygon.vertices[i] as usize]);
            let geometric = (p(1) - p(0)).cross(p(2) - p(0)).normalize();
            assert_eq!(geometric, Vec3::from(polygon.normal));
        }
    }
}
