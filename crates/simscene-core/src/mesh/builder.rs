//! Conversion from editor polygons to the deduplicated triangle layout

use std::collections::HashMap;

use glam::Vec3;

use super::{Corner, Mesh, MeshBuffers, MeshError, Polygon};

/// Decimal places kept in UV/normal dedup keys
const DEDUP_SCALE: f64 = 1e6;

/// Round each component to 6 decimals and return the integer key
pub fn dedup_key<const N: usize>(values: [f32; N]) -> [i64; N] {
    values.map(|v| (f64::from(v) * DEDUP_SCALE).round() as i64)
}

fn key_value<const N: usize>(key: [i64; N]) -> [f32; N] {
    key.map(|k| (k as f64 / DEDUP_SCALE) as f32)
}

/// Fan triangulation from corner 0: (0,1,2), (0,2,3), ...
pub fn fan_triangles(corner_count: usize) -> impl Iterator<Item = [usize; 3]> {
    (1..corner_count.saturating_sub(1)).map(|i| [0, i, i + 1])
}

/// Incremental builder for a codec [`Mesh`]
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: Mesh,
    uv_index: HashMap<[i64; 2], u32>,
    normal_index: HashMap<[i64; 3], u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex; returns its 1-based index
    pub fn push_vertex(&mut self, position: [f32; 3]) -> u32 {
        self.mesh.vertices.push(position);
        self.mesh.vertices.len() as u32
    }

    /// 1-based index of `uv`, adding it to the table on first use
    pub fn uv(&mut self, uv: [f32; 2]) -> u32 {
        let key = dedup_key(uv);
        let uvs = &mut self.mesh.uvs;
        *self.uv_index.entry(key).or_insert_with(|| {
            uvs.push(key_value(key));
            uvs.len() as u32
        })
    }

    /// 1-based index of `normal`, adding it to the table on first use
    pub fn normal(&mut self, normal: [f32; 3]) -> u32 {
        let key = dedup_key(normal);
        let normals = &mut self.mesh.normals;
        *self.normal_index.entry(key).or_insert_with(|| {
            normals.push(key_value(key));
            normals.len() as u32
        })
    }

    pub fn push_triangle(&mut self, corners: [Corner; 3]) {
        self.mesh.faces.push(corners);
    }

    pub fn build(self) -> Mesh {
        self.mesh
    }
}

/// Build a codec mesh from editor buffers.
///
/// Vertices keep their authoring order. Polygons are fan-triangulated.
/// Smooth polygons take each vertex's own normal, flat polygons reuse one
/// normal for every corner.
pub fn build_mesh(buffers: &MeshBuffers) -> Result<Mesh, MeshError> {
    let mut builder = MeshBuilder::new();
    for position in &buffers.positions {
        builder.push_vertex(*position);
    }

    for (index, polygon) in buffers.polygons.iter().enumerate() {
        if polygon.vertices.len() < 3 {
            return Err(MeshError::Parse(format!(
                "polygon {index} has {} corners",
                polygon.vertices.len()
            )));
        }
        if let Some(&bad) = polygon
            .vertices
            .iter()
            .find(|&&v| v as usize >= buffers.positions.len())
        {
            return Err(MeshError::Parse(format!(
                "polygon {index} references vertex {bad}"
            )));
        }
        if let Some(uvs) = &polygon.uvs
            && uvs.len() != polygon.vertices.len()
        {
            return Err(MeshError::Parse(format!(
                "polygon {index} has {} UVs for {} corners",
                uvs.len(),
                polygon.vertices.len()
            )));
        }

        let face_normal = (!polygon.smooth).then(|| flat_normal(buffers, polygon));

        for tri in fan_triangles(polygon.vertices.len()) {
            let corners = tri.map(|corner| {
                let vertex = polygon.vertices[corner];
                let uv = polygon
                    .uvs
                    .as_ref()
                    .map(|uvs| builder.uv(uvs[corner]))
                    .unwrap_or(0);
                let normal = match face_normal {
                    Some(n) => n,
                    None => buffers
                        .normals
                        .get(vertex as usize)
                        .copied()
                        .unwrap_or([0.0, 0.0, 1.0]),
                };
                Corner::new(vertex + 1, uv, builder.normal(normal))
            });
            builder.push_triangle(corners);
        }
    }

    Ok(builder.build())
}

/// Authored face normal, or the geometric normal of the first fan triangle
fn flat_normal(buffers: &MeshBuffers, polygon: &Polygon) -> [f32; 3] {
    if Vec3::from(polygon.normal).length_squared() > 0.0 {
        return polygon.normal;
    }
    let p = |i: usize| Vec3::from(buffers.positions[polygon.vertices[i] as usize]);
    let n = (p(1) - p(0)).cross(p(2) - p(0));
    if n.length_squared() > 0.0 {
        n.normalize().to_array()
    } else {
        [0.0, 0.0, 1.0]
    }
}
