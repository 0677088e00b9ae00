//! Per-build vertex cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Vertex, VertexKind};

/// Hands out one shared [`Vertex`] per label for the duration of a build.
///
/// Keyed by label only: the first call for a label decides its kind and
/// comment, later calls get the same `Arc` back regardless of what they pass.
#[derive(Debug, Default)]
pub struct VertexCache {
    vertices: HashMap<String, Arc<Vertex>>,
}

impl VertexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &mut self,
        label: &str,
        kind: VertexKind,
        comment: Option<&str>,
    ) -> Arc<Vertex> {
        if let Some(v) = self.vertices.get(label) {
            return v.clone();
        }
        let vertex = Arc::new(Vertex::new(label, kind, comment.map(str::to_string)));
        self.vertices.insert(label.to_string(), vertex.clone());
        vertex
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
