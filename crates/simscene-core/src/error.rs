//! Error taxonomy for export and import passes

use std::path::Path;

use crate::mesh::MeshError;

/// Which element kind an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Scene,
    Node,
    Joint,
    Motor,
    Material,
    Sensor,
    Mesh,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementKind::Scene => "scene",
            ElementKind::Node => "node",
            ElementKind::Joint => "joint",
            ElementKind::Motor => "motor",
            ElementKind::Material => "material",
            ElementKind::Sensor => "sensor",
            ElementKind::Mesh => "mesh",
        };
        f.write_str(name)
    }
}

/// Coarse error kind, used by callers to decide whether a pass can continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingRequiredField,
    UnresolvedReference,
    DegenerateAxis,
    AmbiguousGrouping,
    IoFailure,
}

/// Errors raised while translating a scene
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("{element} '{name}': missing required field <{field}>")]
    MissingRequiredField {
        element: ElementKind,
        name: String,
        field: &'static str,
    },

    #[error("{element} '{name}': unresolved reference {field} = '{reference}'")]
    UnresolvedReference {
        element: ElementKind,
        name: String,
        field: &'static str,
        reference: String,
    },

    #[error("joint '{name}' (id {id}): degenerate axis")]
    DegenerateAxis { id: u32, name: String },

    #[error("group {group_id}: ambiguous grouping, {reason}")]
    AmbiguousGrouping { group_id: u32, reason: String },

    #[error("IO failure on '{path}': {reason}")]
    Io { path: String, reason: String },
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

impl SceneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SceneError::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            SceneError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            SceneError::DegenerateAxis { .. } => ErrorKind::DegenerateAxis,
            SceneError::AmbiguousGrouping { .. } => ErrorKind::AmbiguousGrouping,
            SceneError::Io { .. } => ErrorKind::IoFailure,
        }
    }

    /// Fatal errors abort the whole pass
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DegenerateAxis | ErrorKind::IoFailure
        )
    }

    pub fn missing(element: ElementKind, name: impl Into<String>, field: &'static str) -> Self {
        SceneError::MissingRequiredField {
            element,
            name: name.into(),
            field,
        }
    }

    pub fn unresolved(
        element: ElementKind,
        name: impl Into<String>,
        field: &'static str,
        reference: impl ToString,
    ) -> Self {
        SceneError::UnresolvedReference {
            element,
            name: name.into(),
            field,
            reference: reference.to_string(),
        }
    }

    pub fn io(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        SceneError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn mesh(path: impl AsRef<Path>, err: MeshError) -> Self {
        Self::io(path, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(SceneError::DegenerateAxis { id: 1, name: "j".into() }.is_fatal());
        assert!(SceneError::io("a.bobj", "denied").is_fatal());
        assert!(!SceneError::missing(ElementKind::Node, "n", "index").is_fatal());
        assert!(!SceneError::unresolved(ElementKind::Node, "n", "relativeid", 7).is_fatal());
        assert!(!SceneError::AmbiguousGrouping {
            group_id: 2,
            reason: "no joint parent".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_error_message_names_element() {
        let err = SceneError::unresolved(ElementKind::Node, "arm", "relativeid", 12);
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
        assert_eq!(
            err.to_string(),
            "node 'arm': unresolved reference relativeid = '12'"
        );
    }
}
