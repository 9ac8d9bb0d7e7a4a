//! Material definition

use serde::{Deserialize, Serialize};

use super::MaterialId;

/// Surface material shared by nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

impl Material {
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            diffuse: [0.7, 0.7, 0.7],
            specular: [0.0, 0.0, 0.0],
            shininess: 0.0,
        }
    }
}
