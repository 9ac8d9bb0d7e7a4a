//! Wavefront OBJ mesh loading

use std::path::Path;

use super::{MeshBuffers, MeshError, Polygon};

/// Load every model of an OBJ file into one set of editor buffers.
///
/// Polygons keep their arity. Faces with per-corner normals are smooth and
/// write those normals per vertex; faces without are flat.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshBuffers, MeshError> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ..Default::default()
    };
    let (models, _materials) =
        tobj::load_obj(path, &options).map_err(|e| MeshError::Parse(e.to_string()))?;

    let mut buffers = MeshBuffers::default();
    for model in &models {
        append_model(&mut buffers, &model.mesh);
    }

    if buffers.polygons.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    Ok(buffers)
}

fn append_model(buffers: &mut MeshBuffers, mesh: &tobj::Mesh) {
    let base = buffers.positions.len() as u32;
    buffers
        .positions
        .extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
    buffers.normals.resize(buffers.positions.len(), [0.0; 3]);

    let arities: Vec<usize> = if mesh.face_arities.is_empty() {
        vec![3; mesh.indices.len() / 3]
    } else {
        mesh.face_arities.iter().map(|&a| a as usize).collect()
    };

    let has_normals = !mesh.normal_indices.is_empty();
    let has_uvs = !mesh.texcoord_indices.is_empty();

    let mut start = 0;
    for arity in arities {
        let range = start..start + arity;
        start += arity;

        let vertices: Vec<u32> = mesh.indices[range.clone()].iter().map(|&i| i + base).collect();

        if has_normals {
            for (&vertex, &n) in vertices.iter().zip(&mesh.normal_indices[range.clone()]) {
                let n = n as usize * 3;
                if let Some(normal) = mesh.normals.get(n..n + 3) {
                    buffers.normals[vertex as usize] = [normal[0], normal[1], normal[2]];
                }
            }
        }

        let uvs = has_uvs.then(|| {
            mesh.texcoord_indices[range.clone()]
                .iter()
                .map(|&t| {
                    let t = t as usize * 2;
                    mesh.texcoords
                        .get(t..t + 2)
                        .map(|uv| [uv[0], uv[1]])
                        .unwrap_or([0.0, 0.0])
                })
                .collect()
        });

        buffers.polygons.push(Polygon {
            vertices,
            uvs,
            smooth: has_normals,
            normal: [0.0; 3],
        });
    }
}
