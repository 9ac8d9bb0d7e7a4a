//! Per-pass build state

use std::collections::BTreeSet;

use crate::config::BridgeConfig;
use crate::error::SceneError;
use crate::scene::Scene;

/// Hands out unused 1-based ids
#[derive(Debug, Default)]
pub struct IdAllocator {
    used: BTreeSet<u32>,
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            used: BTreeSet::new(),
            next: 1,
        }
    }

    /// Claim an authored id; false if it is 0 or already taken
    pub fn reserve(&mut self, id: u32) -> bool {
        id != 0 && self.used.insert(id)
    }

    /// Next free id
    pub fn allocate(&mut self) -> u32 {
        while self.used.contains(&self.next) || self.next == 0 {
            self.next += 1;
        }
        let id = self.next;
        self.used.insert(id);
        id
    }

    pub fn is_used(&self, id: u32) -> bool {
        self.used.contains(&id)
    }
}

/// State owned by one export or import pass
#[derive(Debug)]
pub struct SceneBuildContext<'a> {
    pub config: &'a BridgeConfig,
    pub scene: Scene,
    /// Non-fatal errors, in the order they occurred
    pub diagnostics: Vec<SceneError>,
}

impl<'a> SceneBuildContext<'a> {
    pub fn new(config: &'a BridgeConfig) -> Self {
        Self {
            config,
            scene: Scene::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record a non-fatal error
    pub fn diagnostic(&mut self, err: SceneError) {
        tracing::warn!("{}", err);
        self.diagnostics.push(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_skips_reserved() {
        let mut ids = IdAllocator::new();
        assert!(ids.reserve(2));
        assert!(!ids.reserve(2));
        assert!(!ids.reserve(0));
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 3);
        assert!(ids.is_used(2));
    }
}
