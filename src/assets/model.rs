//! Wavefront OBJ loading

use std::path::Path;

use super::AssetError;
use crate::scene::{MeshData, SceneVertex};

/// Load an OBJ file and merge all objects/groups into one mesh
pub fn load_obj(path: &Path) -> Result<MeshData, AssetError> {
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj(path, &load_options).map_err(|e| AssetError::ObjParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mesh = merge_models(&models);
    if mesh.vertices.is_empty() || mesh.indices.is_empty() {
        return Err(AssetError::EmptyModel(path.to_path_buf()));
    }

    tracing::debug!(
        path = %path.display(),
        objects = models.len(),
        vertices = mesh.vertex_count(),
        triangles = mesh.index_count() / 3,
        "Model loaded"
    );
    Ok(mesh)
}

/// Merge all tobj models into a single vertex list and index list
fn merge_models(models: &[tobj::Model]) -> MeshData {
    let mut merged = MeshData::default();

    for model in models {
        let mesh = &model.mesh;
        if mesh.positions.is_empty() {
            continue;
        }

        let offset = merged.vertices.len() as u32;
        let vertex_count = mesh.positions.len() / 3;
        let has_uvs = mesh.texcoords.len() >= vertex_count * 2;
        let has_normals = mesh.normals.len() >= vertex_count * 3;

        for i in 0..vertex_count {
            let position = [mesh.positions[i * 3], mesh.positions[i * 3 + 1], mesh.positions[i * 3 + 2]];
            let uv = if has_uvs {
                [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            };
            let normal = if has_normals {
                [mesh.normals[i * 3], mesh.normals[i * 3 + 1], mesh.normals[i * 3 + 2]]
            } else {
                [0.0, 0.0, 0.0]
            };
            merged.vertices.push(SceneVertex { position, uv, normal });
        }

        merged.indices.extend(mesh.indices.iter().map(|index| index + offset));

        if !has_normals {
            fill_face_normals(&mut merged, offset as usize);
        }
    }

    merged
}

/// Accumulate face normals into vertices from `first_vertex` on
fn fill_face_normals(mesh: &mut MeshData, first_vertex: usize) {
    let mut accumulated = vec![glam::Vec3::ZERO; mesh.vertices.len()];
    for triangle in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if a < first_vertex || b < first_vertex || c < first_vertex {
            continue;
        }
        let pa = glam::Vec3::from(mesh.vertices[a].position);
        let pb = glam::Vec3::from(mesh.vertices[b].position);
        let pc = glam::Vec3::from(mesh.vertices[c].position);
        let normal = (pb - pa).cross(pc - pa);
        for index in [a, b, c] {
            accumulated[index] += normal;
        }
    }
    for (vertex, normal) in mesh.vertices.iter_mut().zip(accumulated).skip(first_vertex) {
        vertex.normal = normal.try_normalize().unwrap_or(glam::Vec3::Y).into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_triangle_obj() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 4 3").unwrap();
        let mesh = load_obj(file.path()).unwrap();
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.vertex_count(), 4);
        // Computed normals face +Z for a CCW quad in the XY plane
        assert!((mesh.vertices[0].normal[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_missing_obj_is_an_error() {
        let result = load_obj(Path::new("/nonexistent/model1.obj"));
        assert!(matches!(result, Err(AssetError::ObjParse { .. })));
    }

    #[test]
    fn test_empty_obj_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "# nothing here").unwrap();
        let result = load_obj(file.path());
        assert!(matches!(result, Err(AssetError::EmptyModel(_))));
    }
}
