use std::ops::Range;

use crate::coords::Vec2;
use crate::node::{DirtyState, DrawData, MaterialKey, ShapeNode, VertexLayout};

/// A node placed in the frame: item-local geometry plus the item origin.
pub struct NodeRef<'a> {
    pub origin: Vec2,
    pub node: &'a mut dyn ShapeNode,
}

impl<'a> NodeRef<'a> {
    #[inline]
    pub fn new(node: &'a mut dyn ShapeNode) -> Self {
        Self { origin: Vec2::zero(), node }
    }

    #[inline]
    pub fn at(origin: Vec2, node: &'a mut dyn ShapeNode) -> Self {
        Self { origin, node }
    }
}

/// One draw call: a run of nodes sharing vertex layout and material.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub layout: VertexLayout,
    pub material: MaterialKey,
    /// Byte range into [`FramePass::vertices`].
    pub vertex_bytes: Range<usize>,
    /// Range into [`FramePass::indices`]; indices are relative to the batch.
    pub indices: Range<u32>,
    pub vertex_count: u32,
    /// Nodes merged into this batch.
    pub draws: u32,
}

/// Counters of the last [`FramePass::run`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes: u32,
    pub blocked: u32,
    pub failed: u32,
    pub drawn: u32,
    pub batches: u32,
    pub geometry_changes: u32,
}

/// Per-frame traversal of geometry nodes.
///
/// Nodes are given back-to-front. Every node that takes part in the frame
/// is preprocessed before any draw data is read, then draws are appended in
/// paint order and adjacent draws with equal material keys are merged into
/// one triangle strip joined by degenerate triangles.
///
/// Vertices are moved from item space into frame space while appending, so
/// items at different origins still share batches.
///
/// Buffers are reused across frames; no per-frame allocation once warmed.
#[derive(Debug, Default)]
pub struct FramePass {
    vertices: Vec<u8>,
    indices: Vec<u16>,
    batches: Vec<DrawBatch>,
    active: Vec<bool>,
    stats: FrameStats,
}

impl FramePass {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&mut self, nodes: &mut [NodeRef<'_>]) -> &[DrawBatch] {
        self.vertices.clear();
        self.indices.clear();
        self.batches.clear();
        self.active.clear();
        self.stats = FrameStats { nodes: nodes.len() as u32, ..FrameStats::default() };

        for NodeRef { node, .. } in nodes.iter_mut() {
            let active = if node.is_subtree_blocked() {
                self.stats.blocked += 1;
                false
            } else if node.uses_preprocess() {
                match node.preprocess() {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("{:?} node skipped this frame: {e}", node.kind());
                        self.stats.failed += 1;
                        false
                    }
                }
            } else {
                true
            };
            self.active.push(active);
        }

        for (i, NodeRef { origin, node }) in nodes.iter_mut().enumerate() {
            if !self.active[i] {
                continue;
            }
            if node.take_dirty().contains(DirtyState::GEOMETRY) {
                self.stats.geometry_changes += 1;
            }
            if let Some(data) = node.draw_data() {
                self.append(&data, *origin);
                self.stats.drawn += 1;
            }
        }

        self.stats.batches = self.batches.len() as u32;
        log::trace!(
            "frame: {} nodes, {} drawn in {} batches",
            self.stats.nodes,
            self.stats.drawn,
            self.stats.batches
        );
        &self.batches
    }

    fn append(&mut self, data: &DrawData<'_>, origin: Vec2) {
        debug_assert_eq!(data.vertices.len(), data.vertex_count * data.layout.stride());
        let count = data.vertex_count as u32;

        let merge = self.batches.last().is_some_and(|b| {
            b.layout == data.layout
                && b.material.compare(&data.material).is_eq()
                && b.vertex_count + count <= u16::MAX as u32 + 1
        });

        if merge {
            let Some(batch) = self.batches.last_mut() else {
                return;
            };
            let base = batch.vertex_count as u16;
            if let (Some(&last), Some(&first)) = (self.indices.last(), data.indices.first()) {
                self.indices.push(last);
                self.indices.push(base + first);
            }
            self.indices.extend(data.indices.iter().map(|&i| base + i));
            push_vertices(&mut self.vertices, data, origin);
            batch.vertex_count += count;
            batch.vertex_bytes.end = self.vertices.len();
            batch.indices.end = self.indices.len() as u32;
            batch.draws += 1;
            return;
        }

        let vertex_start = self.vertices.len();
        let index_start = self.indices.len() as u32;
        push_vertices(&mut self.vertices, data, origin);
        self.indices.extend_from_slice(data.indices);
        self.batches.push(DrawBatch {
            layout: data.layout,
            material: data.material,
            vertex_bytes: vertex_start..self.vertices.len(),
            indices: index_start..self.indices.len() as u32,
            vertex_count: count,
            draws: 1,
        });
    }

    #[inline]
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Vertex bytes of every batch, back to back.
    #[inline]
    pub fn vertices(&self) -> &[u8] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Appends the vertices of `data`, translating the leading position of each.
fn push_vertices(out: &mut Vec<u8>, data: &DrawData<'_>, origin: Vec2) {
    let start = out.len();
    out.extend_from_slice(data.vertices);
    if origin == Vec2::zero() {
        return;
    }
    for vertex in out[start..].chunks_exact_mut(data.layout.stride()) {
        let mut pos: [f32; 2] = bytemuck::pod_read_unaligned(&vertex[..8]);
        pos[0] += origin.x;
        pos[1] += origin.y;
        vertex[..8].copy_from_slice(bytemuck::bytes_of(&pos));
    }
}
