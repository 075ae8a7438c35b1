use contour_engine::coords::Vec2;
use contour_engine::node::{
    DropShadowNode, FillCenterNode, FillCornersNode, FrameCornersNode, FrameEdgesNode, NodeKind,
    NodeParams, ShapeNode,
};
use contour_engine::scene::NodeRef;
use contour_engine::texture::ContextRegistry;

use crate::shape::{Shape, Visibility};

/// Geometry nodes of one shape item.
///
/// Children are created the first time they become visible and live until
/// the paint node itself is dropped, so toggling a color to transparent and
/// back never reallocates. Paint order is back to front: drop shadow, fill
/// center, fill corners, frame edges, frame corners.
pub struct ShapePaintNode {
    params: NodeParams,
    drop_shadow: Option<DropShadowNode>,
    fill_center: Option<FillCenterNode>,
    fill_corners: Option<FillCornersNode>,
    frame_edges: Option<FrameEdgesNode>,
    frame_corners: Option<FrameCornersNode>,
    /// Visibility last pushed to the children.
    applied: Visibility,
}

impl ShapePaintNode {
    fn new(params: NodeParams) -> Self {
        log::debug!("shape paint node created (dpr {})", params.device_pixel_ratio);
        Self {
            params,
            drop_shadow: None,
            fill_center: None,
            fill_corners: None,
            frame_edges: None,
            frame_corners: None,
            applied: Visibility::default(),
        }
    }

    #[inline]
    pub fn params(&self) -> NodeParams {
        self.params
    }

    pub fn child(&self, kind: NodeKind) -> Option<&dyn ShapeNode> {
        match kind {
            NodeKind::DropShadow => self.drop_shadow.as_ref().map(|n| n as &dyn ShapeNode),
            NodeKind::FillCenter => self.fill_center.as_ref().map(|n| n as &dyn ShapeNode),
            NodeKind::FillCorners => self.fill_corners.as_ref().map(|n| n as &dyn ShapeNode),
            NodeKind::FrameEdges => self.frame_edges.as_ref().map(|n| n as &dyn ShapeNode),
            NodeKind::FrameCorners => self.frame_corners.as_ref().map(|n| n as &dyn ShapeNode),
        }
    }

    /// Number of instantiated children, visible or not.
    pub fn child_count(&self) -> usize {
        [
            self.drop_shadow.is_some(),
            self.fill_center.is_some(),
            self.fill_corners.is_some(),
            self.frame_edges.is_some(),
            self.frame_corners.is_some(),
        ]
        .into_iter()
        .filter(|&created| created)
        .count()
    }

    /// Appends the visible children in paint order, placed at `origin`.
    pub fn push_nodes<'a>(&'a mut self, origin: Vec2, out: &mut Vec<NodeRef<'a>>) {
        let v = self.applied;
        if let (true, Some(n)) = (v.drop_shadow, self.drop_shadow.as_mut()) {
            out.push(NodeRef::at(origin, n));
        }
        if let (true, Some(n)) = (v.fill_center, self.fill_center.as_mut()) {
            out.push(NodeRef::at(origin, n));
        }
        if let (true, Some(n)) = (v.fill_corners, self.fill_corners.as_mut()) {
            out.push(NodeRef::at(origin, n));
        }
        if let (true, Some(n)) = (v.frame_edges, self.frame_edges.as_mut()) {
            out.push(NodeRef::at(origin, n));
        }
        if let (true, Some(n)) = (v.frame_corners, self.frame_corners.as_mut()) {
            out.push(NodeRef::at(origin, n));
        }
    }

    pub fn nodes(&mut self, origin: Vec2) -> Vec<NodeRef<'_>> {
        let mut out = Vec::with_capacity(5);
        self.push_nodes(origin, &mut out);
        out
    }
}

impl Drop for ShapePaintNode {
    fn drop(&mut self) {
        log::debug!("shape paint node destroyed");
    }
}

/// Pushes a visibility change to an existing child.
fn sync_visibility<N: ShapeNode>(child: &mut Option<N>, was: bool, now: bool) {
    if was == now {
        return;
    }
    if let Some(child) = child {
        child.set_visible(now);
    }
}

impl Shape {
    /// Brings `old` in line with the item properties.
    ///
    /// An empty item drops the paint node and every texture reference it
    /// holds. A device pixel ratio change rebuilds all children since texture
    /// keys are derived in device pixels.
    pub fn update_paint_node(
        &mut self,
        registry: &ContextRegistry,
        old: Option<ShapePaintNode>,
    ) -> Option<ShapePaintNode> {
        self.clear_repaint();
        let size = self.size();
        if size.is_empty() {
            return None;
        }

        let params = self.node_params();
        let mut node = match old {
            Some(node) if node.params == params => node,
            _ => ShapePaintNode::new(params),
        };
        let v = self.visibility();
        let (shape, radius) = (self.shape(), self.radius());

        if v.drop_shadow {
            node.drop_shadow
                .get_or_insert_with(|| DropShadowNode::new(registry, params))
                .update(size, shape, radius, &self.drop_shadow_params());
        }
        sync_visibility(&mut node.drop_shadow, node.applied.drop_shadow, v.drop_shadow);

        if v.fill_center {
            node.fill_center
                .get_or_insert_with(|| FillCenterNode::new(registry, params))
                .update(size, shape, radius, self.color(), &self.inner_shadow_params());
        }
        sync_visibility(&mut node.fill_center, node.applied.fill_center, v.fill_center);

        if v.fill_corners {
            node.fill_corners
                .get_or_insert_with(|| FillCornersNode::new(registry, params))
                .update(size, shape, radius, self.color());
        }
        sync_visibility(&mut node.fill_corners, node.applied.fill_corners, v.fill_corners);

        let (thickness, frame_color) = (self.frame_thickness(), self.frame_color());
        if v.frame_edges {
            node.frame_edges
                .get_or_insert_with(|| FrameEdgesNode::new(params))
                .update(size, radius, thickness, frame_color);
        }
        sync_visibility(&mut node.frame_edges, node.applied.frame_edges, v.frame_edges);

        if v.frame_corners {
            node.frame_corners
                .get_or_insert_with(|| FrameCornersNode::new(registry, params))
                .update(size, shape, radius, thickness, frame_color);
        }
        sync_visibility(&mut node.frame_corners, node.applied.frame_corners, v.frame_corners);

        node.applied = v;
        Some(node)
    }
}
