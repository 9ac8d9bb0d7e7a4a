//! Tagged little-endian binary mesh codec (`.bobj`)
//!
//! The stream has no header. Every record starts with an `i32` tag:
//!
//! ```text
//! tag 1  vertex   3 x f32 position
//! tag 2  uv       2 x f32
//! tag 3  normal   3 x f32
//! tag 4  face     3 x (i32 vertex, i32 uv, i32 normal), 1-based, uv 0 = none
//! ```
//!
//! The encoder writes all vertices, then UVs, then normals, then faces.

use std::io::Write;
use std::path::Path;

use super::{Corner, Mesh, MeshError};

pub const TAG_VERTEX: i32 = 1;
pub const TAG_UV: i32 = 2;
pub const TAG_NORMAL: i32 = 3;
pub const TAG_FACE: i32 = 4;

/// Encode a mesh into a byte buffer
pub fn encode(mesh: &Mesh) -> Vec<u8> {
    let size = mesh.vertices.len() * 16
        + mesh.uvs.len() * 12
        + mesh.normals.len() * 16
        + mesh.faces.len() * 40;
    let mut out = Vec::with_capacity(size);

    for v in &mesh.vertices {
        put_record(&mut out, TAG_VERTEX, v);
    }
    for uv in &mesh.uvs {
        put_record(&mut out, TAG_UV, uv);
    }
    for n in &mesh.normals {
        put_record(&mut out, TAG_NORMAL, n);
    }
    for face in &mesh.faces {
        out.extend_from_slice(&TAG_FACE.to_le_bytes());
        for corner in face {
            for index in [corner.vertex, corner.uv, corner.normal] {
                out.extend_from_slice(&(index as i32).to_le_bytes());
            }
        }
    }
    out
}

fn put_record(out: &mut Vec<u8>, tag: i32, values: &[f32]) {
    out.extend_from_slice(&tag.to_le_bytes());
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Write an encoded mesh to any writer
pub fn write_mesh<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    writer.write_all(&encode(mesh))
}

/// Decode a byte stream produced by [`encode`]
pub fn decode(bytes: &[u8]) -> Result<Mesh, MeshError> {
    let mut reader = RecordReader { bytes, offset: 0 };
    let mut mesh = Mesh::default();

    while !reader.is_at_end() {
        let offset = reader.offset;
        match reader.i32()? {
            TAG_VERTEX => mesh.vertices.push([reader.f32()?, reader.f32()?, reader.f32()?]),
            TAG_UV => mesh.uvs.push([reader.f32()?, reader.f32()?]),
            TAG_NORMAL => mesh
                .normals
                .push([reader.f32()?, reader.f32()?, reader.f32()?]),
            TAG_FACE => {
                let mut face = [Corner::default(); 3];
                for corner in &mut face {
                    *corner = Corner::new(reader.index()?, reader.index()?, reader.index()?);
                }
                mesh.faces.push(face);
            }
            tag => return Err(MeshError::UnknownTag { tag, offset }),
        }
    }

    mesh.validate()?;
    Ok(mesh)
}

struct RecordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl RecordReader<'_> {
    fn is_at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn take4(&mut self) -> Result<[u8; 4], MeshError> {
        let bytes = self.bytes;
        let chunk = bytes
            .get(self.offset..self.offset + 4)
            .ok_or(MeshError::Truncated {
                offset: self.offset,
            })?;
        self.offset += 4;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(chunk);
        Ok(buf)
    }

    fn i32(&mut self) -> Result<i32, MeshError> {
        self.take4().map(i32::from_le_bytes)
    }

    fn f32(&mut self) -> Result<f32, MeshError> {
        self.take4().map(f32::from_le_bytes)
    }

    /// Face indices are never negative
    fn index(&mut self) -> Result<u32, MeshError> {
        let offset = self.offset;
        let value = self.i32()?;
        u32::try_from(value).map_err(|_| MeshError::Parse(format!("negative index at byte {offset}")))
    }
}

/// Encode a mesh and write it to `path`
pub fn write_mesh_file(mesh: &Mesh, path: impl AsRef<Path>) -> Result<(), MeshError> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path).map_err(|e| MeshError::Io(e.to_string()))?;
    write_mesh(mesh, &mut file).map_err(|e| MeshError::Io(e.to_string()))?;
    tracing::debug!(
        "Wrote mesh {:?}: {} vertices, {} triangles",
        path,
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(())
}

/// Read and decode a mesh file
pub fn read_mesh_file(path: impl AsRef<Path>) -> Result<Mesh, MeshError> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshBuffers, Polygon, build_mesh, unit_cube};

    fn textured_quad() -> MeshBuffers {
        MeshBuffers {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.5, 0.0, 0.0],
                [1.5, 2.25, 0.0],
                [0.0, 2.25, 0.1],
            ],
            normals: vec![
                [0.0, 0.0, 1.0],
                [0.0, 0.123_456_7, 0.992_35],
                [0.0, 0.0, 1.0],
                [0.577_350_3, 0.577_350_3, 0.577_350_3],
            ],
            polygons: vec![Polygon {
                vertices: vec![0, 1, 2, 3],
                uvs: Some(vec![[0.0, 0.0], [0.333_333_3, 0.0], [1.0, 1.0], [0.0, 1.0]]),
                smooth: true,
                normal: [0.0; 3],
            }],
        }
    }

    #[test]
    fn test_round_trip_preserves_geometry() {
        let mesh = build_mesh(&textured_quad()).unwrap();
        let decoded = decode(&encode(&mesh)).unwrap();

        assert_eq!(decoded.triangle_count(), mesh.triangle_count());
        assert_eq!(decoded.vertices, mesh.vertices);
        assert_eq!(decoded.faces, mesh.faces);
        for (a, b) in decoded.normals.iter().zip(&mesh.normals) {
            for i in 0..3 {
                approx::assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-6);
            }
        }
        for (a, b) in decoded.uvs.iter().zip(&mesh.uvs) {
            approx::assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-6);
            approx::assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_record_layout() {
        let mesh = build_mesh(&unit_cube()).unwrap();
        let bytes = encode(&mesh);
        let expected = 8 * 16 + mesh.normals.len() * 16 + 12 * 40;
        assert_eq!(bytes.len(), expected);
        assert_eq!(&bytes[0..4], &TAG_VERTEX.to_le_bytes());
        assert_eq!(&bytes[4..8], &mesh.vertices[0][0].to_le_bytes());

        let faces_start = 8 * 16 + mesh.normals.len() * 16;
        assert_eq!(&bytes[faces_start..faces_start + 4], &TAG_FACE.to_le_bytes());
        assert_eq!(
            &bytes[faces_start + 4..faces_start + 8],
            &(mesh.faces[0][0].vertex as i32).to_le_bytes()
        );
    }

    #[test]
    fn test_empty_stream_is_empty_mesh() {
        let mesh = decode(&[]).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn test_truncated_stream() {
        let mesh = build_mesh(&unit_cube()).unwrap();
        let bytes = encode(&mesh);
        let result = decode(&bytes[..bytes.len() - 2]);
        assert!(matches!(result, Err(MeshError::Truncated { .. })));
    }

    #[test]
    fn test_unknown_tag() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&9i32.to_le_bytes());
        bytes.extend_from_slice(&0f32.to_le_bytes());
        assert_eq!(
            decode(&bytes),
            Err(MeshError::UnknownTag { tag: 9, offset: 0 })
        );
    }

    #[test]
    fn test_face_index_validation() {
        let mut bytes = Vec::new();
        put_record(&mut bytes, TAG_VERTEX, &[0.0, 0.0, 0.0]);
        put_record(&mut bytes, TAG_NORMAL, &[0.0, 0.0, 1.0]);
        bytes.extend_from_slice(&TAG_FACE.to_le_bytes());
        for index in [1, 0, 1, 2, 0, 1, 1, 0, 1] {
            bytes.extend_from_slice(&(index as i32).to_le_bytes());
        }
        assert!(matches!(
            decode(&bytes),
            Err(MeshError::IndexOutOfRange { table: "vertex", index: 2, .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.bobj");
        let mesh = build_mesh(&unit_cube()).unwrap();
        write_mesh_file(&mesh, &path).unwrap();
        assert_eq!(read_mesh_file(&path).unwrap(), mesh);
    }
}
