//! Mesh data, the tagged binary mesh codec, and mesh file loading
//!
//! Two representations live here:
//! - [`MeshBuffers`]: editor-side polygons (shared positions, per-vertex
//!   normals, polygons with optional per-corner UVs and a smooth flag)
//! - [`Mesh`]: the engine-side triangle mesh with deduplicated UV and
//!   normal tables, exactly what the codec reads and writes

mod builder;
mod codec;
mod obj;
mod primitive;
mod stl;

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use builder::{MeshBuilder, build_mesh, dedup_key, fan_triangles};
pub use codec::{
    TAG_FACE, TAG_NORMAL, TAG_UV, TAG_VERTEX, decode, encode, read_mesh_file, write_mesh,
    write_mesh_file,
};
pub use obj::load_obj;
pub use primitive::{generate_box_mesh, unit_cube};
pub use stl::load_stl;

/// One triangle corner; indices are 1-based, `uv == 0` means no UV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Corner {
    pub vertex: u32,
    pub uv: u32,
    pub normal: u32,
}

impl Corner {
    pub fn new(vertex: u32, uv: u32, normal: u32) -> Self {
        Self { vertex, uv, normal }
    }
}

/// Triangle mesh in codec layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions in authoring order, never deduplicated
    pub vertices: Vec<[f32; 3]>,
    /// Deduplicated UV table
    pub uvs: Vec<[f32; 2]>,
    /// Deduplicated normal table
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<[Corner; 3]>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Check that every face index points into its table
    pub fn validate(&self) -> Result<(), MeshError> {
        for (face, corners) in self.faces.iter().enumerate() {
            for corner in corners {
                check_index(face, "vertex", corner.vertex, self.vertices.len(), false)?;
                check_index(face, "uv", corner.uv, self.uvs.len(), true)?;
                check_index(face, "normal", corner.normal, self.normals.len(), false)?;
            }
        }
        Ok(())
    }
}

fn check_index(
    face: usize,
    table: &'static str,
    index: u32,
    len: usize,
    zero_allowed: bool,
) -> Result<(), MeshError> {
    if (index == 0 && zero_allowed) || (index >= 1 && index as usize <= len) {
        Ok(())
    } else {
        Err(MeshError::IndexOutOfRange { face, table, index })
    }
}

/// A polygon of an editor mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// 0-based indices into `MeshBuffers::positions`
    pub vertices: Vec<u32>,
    /// One UV per corner, if the mesh has a UV layer
    #[serde(default)]
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Smooth polygons use per-vertex normals, flat ones use `normal`
    #[serde(default)]
    pub smooth: bool,
    #[serde(default)]
    pub normal: [f32; 3],
}

/// Raw editor mesh buffers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals (used by smooth polygons)
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    pub polygons: Vec<Polygon>,
}

impl MeshBuffers {
    /// Axis-aligned bounding box of the positions
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Rebuild editor buffers from a decoded codec mesh.
    ///
    /// Faces whose three corners share one normal become flat polygons,
    /// the rest are smooth with the corner normals stored per vertex.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut normals = vec![[0.0; 3]; mesh.vertices.len()];
        let lookup_normal = |index: u32| -> [f32; 3] {
            mesh.normals
                .get(index.wrapping_sub(1) as usize)
                .copied()
                .unwrap_or([0.0, 0.0, 1.0])
        };

        let polygons = mesh
            .faces
            .iter()
            .map(|corners| {
                let flat = corners[0].normal == corners[1].normal
                    && corners[1].normal == corners[2].normal;
                if !flat {
                    for corner in corners {
                        if let Some(slot) = normals.get_mut(corner.vertex.wrapping_sub(1) as usize) {
                            *slot = lookup_normal(corner.normal);
                        }
                    }
                }
                let uvs = corners
                    .iter()
                    .map(|c| mesh.uvs.get(c.uv.wrapping_sub(1) as usize).copied())
                    .collect::<Option<Vec<_>>>();
                Polygon {
                    vertices: corners.iter().map(|c| c.vertex.saturating_sub(1)).collect(),
                    uvs,
                    smooth: !flat,
                    normal: lookup_normal(corners[0].normal),
                }
            })
            .collect();

        Self {
            positions: mesh.vertices.clone(),
            normals,
            polygons,
        }
    }
}

/// Detect mesh format from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
    Bobj,
    Unknown,
}

impl MeshFormat {
    /// Detect format from file path
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("stl") => MeshFormat::Stl,
            Some("obj") => MeshFormat::Obj,
            Some("bobj") => MeshFormat::Bobj,
            _ => MeshFormat::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "STL",
            MeshFormat::Obj => "OBJ",
            MeshFormat::Bobj => "BOBJ",
            MeshFormat::Unknown => "Unknown",
        }
    }
}

/// Load any supported mesh format into editor buffers
pub fn load_mesh_buffers(path: impl AsRef<Path>) -> Result<MeshBuffers, MeshError> {
    let path = path.as_ref();
    match MeshFormat::from_path(path) {
        MeshFormat::Stl => load_stl(path),
        MeshFormat::Obj => load_obj(path),
        MeshFormat::Bobj => read_mesh_file(path).map(|mesh| MeshBuffers::from_mesh(&mesh)),
        MeshFormat::Unknown => Err(MeshError::UnsupportedFormat(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        )),
    }
}

/// Mesh-related errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty mesh: no geometry found")]
    EmptyMesh,
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Truncated record at byte {offset}")]
    Truncated { offset: usize },
    #[error("Unknown record tag {tag} at byte {offset}")]
    UnknownTag { tag: i32, offset: usize },
    #[error("Face {face}: {table} index {index} out of range")]
    IndexOutOfRange {
        face: usize,
        table: &'static str,
        index: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_format_from_path() {
        assert_eq!(MeshFormat::from_path(Path::new("a/b.STL")), MeshFormat::Stl);
        assert_eq!(MeshFormat::from_path(Path::new("arm.bobj")), MeshFormat::Bobj);
        assert_eq!(MeshFormat::from_path(Path::new("arm.dae")), MeshFormat::Unknown);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mesh = Mesh {
            vertices: vec![[0.0; 3]; 3],
            uvs: vec![],
            normals: vec![[0.0, 0.0, 1.0]],
            faces: vec![[Corner::new(1, 0, 1), Corner::new(2, 0, 1), Corner::new(4, 0, 1)]],
        };
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange { table: "vertex", index: 4, .. })
        ));
    }

    #[test]
    fn test_from_mesh_keeps_flat_faces_flat() {
        let mesh = build_mesh(&unit_cube()).unwrap();
        let buffers = MeshBuffers::from_mesh(&mesh);
        assert_eq!(buffers.positions.len(), 8);
        assert_eq!(buffers.polygons.len(), 12);
        assert!(buffers.polygons.iter().all(|p| !p.smooth));

        let rebuilt = build_mesh(&buffers).unwrap();
        assert_eq!(rebuilt, mesh);
    }

    #[test]
    fn test_load_mesh_buffers_rejects_unknown_extension() {
        let result = load_mesh_buffers("part.dae");
        assert!(matches!(result, Err(MeshError::UnsupportedFormat(ext)) if ext == "dae"));
    }
}
