//! STL mesh loading

use std::io::BufReader;
use std::path::Path;

use super::{MeshBuffers, MeshError, Polygon};

/// Load an STL file as flat-shaded editor buffers
pub fn load_stl(path: impl AsRef<Path>) -> Result<MeshBuffers, MeshError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| MeshError::Io(e.to_string()))?;
    let mut reader = BufReader::new(file);

    let mesh = stl_io::read_stl(&mut reader).map_err(|e| MeshError::Parse(e.to_string()))?;
    if mesh.faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    Ok(index_mesh(&mesh))
}

fn index_mesh(mesh: &stl_io::IndexedMesh) -> MeshBuffers {
    let positions = mesh
        .vertices
        .iter()
        .map(|v| [v[0], v[1], v[2]])
        .collect();

    let polygons = mesh
        .faces
        .iter()
        .map(|face| Polygon {
            vertices: face.vertices.iter().map(|&i| i as u32).collect(),
            uvs: None,
            smooth: false,
            normal: [face.normal[0], face.normal[1], face.normal[2]],
        })
        .collect();

    MeshBuffers {
        positions,
        normals: Vec::new(),
        polygons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_mesh;

    #[test]
    fn test_load_ascii_stl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wedge.stl");
        std::fs::write(
            &path,
            "solid wedge
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 1 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid wedge
",
        )
        .unwrap();

        let buffers = load_stl(&path).unwrap();
        assert_eq!(buffers.positions.len(), 4);
        assert_eq!(buffers.polygons.len(), 2);

        let mesh = build_mesh(&buffers).unwrap();
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(load_stl("/nonexistent/part.stl"), Err(MeshError::Io(_))));
    }
}
