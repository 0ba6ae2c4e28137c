//! Tidy node-link tree layout.
//!
//! Implements the linear-time variant of Walker's algorithm described by
//! Buchheim, Jünger and Leipert. The first walk runs bottom-up and assigns
//! each node a preliminary breadth coordinate relative to its siblings,
//! pushing subtrees apart along their contours; the second walk runs
//! top-down and accumulates the modifiers into final coordinates.
//!
//! Both walks use explicit stacks so that deep trees do not exhaust the
//! call stack.

use std::collections::HashMap;

use log::{debug, trace};
use serde::Deserialize;

use trellis_core::geometry::{Point, Size};

use super::layout_children;
use crate::{
    config::NodeLinkConfig,
    error::LayoutError,
    layout::{Layout, LayoutContext, ParamTable},
    structure::{Graph, NodeId},
};

/// Direction in which the tree grows away from its root.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Root on the left, levels grow to the right (default)
    #[default]
    LeftRight,
    RightLeft,
    /// Root at the top, levels grow downward
    TopBottom,
    BottomTop,
}

impl Orientation {
    /// Whether levels are stacked vertically.
    pub fn is_vertical(self) -> bool {
        matches!(self, Orientation::TopBottom | Orientation::BottomTop)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct WalkerParams {
    prelim: f32,
    modifier: f32,
    shift: f32,
    change: f32,
    number: usize,
    ancestor: Option<NodeId>,
    thread: Option<NodeId>,
    parent: Option<NodeId>,
}

/// Node-link tree layout engine.
#[derive(Debug, Clone)]
pub struct NodeLinkLayout {
    orientation: Orientation,
    sibling_spacing: f32,
    subtree_spacing: f32,
    depth_spacing: f32,
    root_offset: f32,
}

impl Default for NodeLinkLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeLinkLayout {
    pub fn new() -> Self {
        Self::from_config(&NodeLinkConfig::default())
    }

    pub fn from_config(config: &NodeLinkConfig) -> Self {
        Self {
            orientation: config.orientation(),
            sibling_spacing: config.sibling_spacing(),
            subtree_spacing: config.subtree_spacing(),
            depth_spacing: config.depth_spacing(),
            root_offset: config.root_offset(),
        }
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> &mut Self {
        self.orientation = orientation;
        self
    }

    /// Gap between adjacent siblings
    pub fn set_sibling_spacing(&mut self, spacing: f32) -> &mut Self {
        self.sibling_spacing = spacing;
        self
    }

    /// Gap between neighboring subtrees
    pub fn set_subtree_spacing(&mut self, spacing: f32) -> &mut Self {
        self.subtree_spacing = spacing;
        self
    }

    /// Gap between levels
    pub fn set_depth_spacing(&mut self, spacing: f32) -> &mut Self {
        self.depth_spacing = spacing;
        self
    }

    /// Distance of the root from the edge of the bounds
    pub fn set_root_offset(&mut self, offset: f32) -> &mut Self {
        self.root_offset = offset;
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

impl Layout for NodeLinkLayout {
    fn name(&self) -> &'static str {
        "node_link"
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let root = ctx.require_root(self.name(), graph)?;

        let mut walker = Walker::new(self, graph, root);
        walker.first_walk(root);
        let offsets = walker.depth_offsets();
        let placements = walker.second_walk(root);

        let bounds = ctx.bounds();
        let anchor = ctx.anchor();
        let (origin, sign) = match self.orientation {
            Orientation::LeftRight => (bounds.min_x() + self.root_offset, 1.0),
            Orientation::RightLeft => (bounds.max_x() - self.root_offset, -1.0),
            Orientation::TopBottom => (bounds.min_y() + self.root_offset, 1.0),
            Orientation::BottomTop => (bounds.max_y() - self.root_offset, -1.0),
        };

        debug!(
            node_count = placements.len(),
            level_count = offsets.len(),
            orientation:? = self.orientation;
            "Node-link layout"
        );

        for (node, breadth, depth) in placements {
            let along = origin + sign * offsets.get(depth).copied().unwrap_or_default();
            let position = if self.orientation.is_vertical() {
                Point::new(anchor.x() + breadth, along)
            } else {
                Point::new(along, anchor.y() + breadth)
            };
            trace!(node:% = node, position:? = position; "Placed node");
            if let Some(visual) = graph.visual_mut(node) {
                visual.set_position(position);
            }
        }
        Ok(())
    }
}

struct Frame {
    node: NodeId,
    next: usize,
    default_ancestor: Option<NodeId>,
    depth: usize,
}

/// State of a single run.
struct Walker<'a> {
    layout: &'a NodeLinkLayout,
    children: HashMap<NodeId, Vec<NodeId>>,
    sizes: HashMap<NodeId, Size>,
    params: ParamTable<WalkerParams>,
    extents: Vec<f32>,
}

impl<'a> Walker<'a> {
    fn new(layout: &'a NodeLinkLayout, graph: &Graph, root: NodeId) -> Self {
        let mut children = HashMap::new();
        let mut sizes = HashMap::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let kids = layout_children(graph, node);
            stack.extend(kids.iter().copied());
            sizes.insert(node, graph.visual(node).map(|v| v.size()).unwrap_or_default());
            children.insert(node, kids);
        }
        Self {
            layout,
            children,
            sizes,
            params: ParamTable::new(),
            extents: Vec::new(),
        }
    }

    fn kids(&self, node: NodeId) -> &[NodeId] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    fn prelim(&self, node: NodeId) -> f32 {
        self.params.get(node).map_or(0.0, |p| p.prelim)
    }

    fn modifier(&self, node: NodeId) -> f32 {
        self.params.get(node).map_or(0.0, |p| p.modifier)
    }

    fn number(&self, node: NodeId) -> usize {
        self.params.get(node).map_or(0, |p| p.number)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.params.get(node).and_then(|p| p.parent)
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.number(node).checked_sub(1)?;
        self.kids(parent).get(index).copied()
    }

    fn next_left(&self, node: NodeId) -> Option<NodeId> {
        self.kids(node)
            .first()
            .copied()
            .or_else(|| self.params.get(node).and_then(|p| p.thread))
    }

    fn next_right(&self, node: NodeId) -> Option<NodeId> {
        self.kids(node)
            .last()
            .copied()
            .or_else(|| self.params.get(node).and_then(|p| p.thread))
    }

    fn size(&self, node: NodeId) -> Size {
        self.sizes.get(&node).copied().unwrap_or_default()
    }

    /// Extent of a node along the breadth axis.
    fn breadth_extent(&self, node: NodeId) -> f32 {
        let size = self.size(node);
        if self.layout.orientation.is_vertical() {
            size.width()
        } else {
            size.height()
        }
    }

    /// Extent of a node along the depth axis.
    fn depth_extent(&self, node: NodeId) -> f32 {
        let size = self.size(node);
        if self.layout.orientation.is_vertical() {
            size.height()
        } else {
            size.width()
        }
    }

    fn spacing(&self, left: NodeId, right: NodeId, siblings: bool) -> f32 {
        let gap = if siblings {
            self.layout.sibling_spacing
        } else {
            self.layout.subtree_spacing
        };
        gap + 0.5 * (self.breadth_extent(left) + self.breadth_extent(right))
    }

    fn enter(&mut self, node: NodeId, parent: Option<NodeId>, number: usize, depth: usize) {
        let params = self.params.get_mut(node);
        params.number = number;
        params.parent = parent;

        if self.extents.len() <= depth {
            self.extents.resize(depth + 1, 0.0);
        }
        self.extents[depth] = self.extents[depth].max(self.depth_extent(node));
    }

    fn first_walk(&mut self, root: NodeId) {
        self.enter(root, None, 0, 0);
        let mut stack = vec![Frame {
            node: root,
            next: 0,
            default_ancestor: self.kids(root).first().copied(),
            depth: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            if let Some(&child) = self.kids(node).get(frame.next) {
                let (number, depth) = (frame.next, frame.depth + 1);
                self.enter(child, Some(node), number, depth);
                stack.push(Frame {
                    node: child,
                    next: 0,
                    default_ancestor: self.kids(child).first().copied(),
                    depth,
                });
                continue;
            }

            self.finish(node);
            stack.pop();
            if let Some(parent) = stack.last_mut() {
                let ancestor = parent.default_ancestor.unwrap_or(node);
                parent.default_ancestor = Some(self.apportion(node, ancestor));
                parent.next += 1;
            }
        }
    }

    /// Assigns the preliminary coordinate once every child has been walked.
    fn finish(&mut self, node: NodeId) {
        let left = self.previous_sibling(node);
        let outer = {
            let kids = self.kids(node);
            kids.first().copied().zip(kids.last().copied())
        };

        match outer {
            None => {
                let prelim = left.map_or(0.0, |l| self.prelim(l) + self.spacing(l, node, true));
                self.params.get_mut(node).prelim = prelim;
            }
            Some((first, last)) => {
                self.execute_shifts(node);
                let midpoint = 0.5 * (self.prelim(first) + self.prelim(last));
                match left {
                    Some(l) => {
                        let prelim = self.prelim(l) + self.spacing(l, node, true);
                        let params = self.params.get_mut(node);
                        params.prelim = prelim;
                        params.modifier = prelim - midpoint;
                    }
                    None => self.params.get_mut(node).prelim = midpoint,
                }
            }
        }
    }

    /// Separates the subtree of `v` from the subtrees of its left siblings.
    fn apportion(&mut self, v: NodeId, default_ancestor: NodeId) -> NodeId {
        let Some(w) = self.previous_sibling(v) else {
            return default_ancestor;
        };
        let mut ancestor = default_ancestor;

        // inner/outer contours on the right (p) and left (m) side
        let (mut vip, mut vop, mut vim) = (v, v, w);
        let mut vom = self
            .parent(v)
            .and_then(|p| self.kids(p).first().copied())
            .unwrap_or(w);
        let mut sip = self.modifier(vip);
        let mut sop = self.modifier(vop);
        let mut sim = self.modifier(vim);
        let mut som = self.modifier(vom);

        let mut next_right = self.next_right(vim);
        let mut next_left = self.next_left(vip);
        while let (Some(right), Some(left)) = (next_right, next_left) {
            vim = right;
            vip = left;
            vom = self.next_left(vom).unwrap_or(vom);
            vop = self.next_right(vop).unwrap_or(vop);
            self.params.get_mut(vop).ancestor = Some(v);

            let shift = (self.prelim(vim) + sim) - (self.prelim(vip) + sip)
                + self.spacing(vim, vip, false);
            if shift > 0.0 {
                let wm = self.ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }

            sim += self.modifier(vim);
            sip += self.modifier(vip);
            som += self.modifier(vom);
            sop += self.modifier(vop);

            next_right = self.next_right(vim);
            next_left = self.next_left(vip);
        }

        if let Some(right) = next_right
            && self.next_right(vop).is_none()
        {
            let params = self.params.get_mut(vop);
            params.thread = Some(right);
            params.modifier += sim - sop;
        }
        if let Some(left) = next_left
            && self.next_left(vom).is_none()
        {
            let params = self.params.get_mut(vom);
            params.thread = Some(left);
            params.modifier += sip - som;
            ancestor = v;
        }
        ancestor
    }

    /// The sibling of `v` whose subtree contains `vim`, or `default_ancestor`.
    fn ancestor(&self, vim: NodeId, v: NodeId, default_ancestor: NodeId) -> NodeId {
        let candidate = self
            .params
            .get(vim)
            .and_then(|p| p.ancestor)
            .unwrap_or(vim);
        let parent = self.parent(candidate);
        if parent.is_some() && parent == self.parent(v) {
            candidate
        } else {
            default_ancestor
        }
    }

    fn move_subtree(&mut self, wm: NodeId, wp: NodeId, shift: f32) {
        let subtrees = (self.number(wp) as f32 - self.number(wm) as f32).max(1.0);

        let right = self.params.get_mut(wp);
        right.change -= shift / subtrees;
        right.shift += shift;
        right.prelim += shift;
        right.modifier += shift;

        self.params.get_mut(wm).change += shift / subtrees;
    }

    fn execute_shifts(&mut self, node: NodeId) {
        let kids = self.kids(node).to_vec();
        let (mut shift, mut change) = (0.0, 0.0);
        for child in kids.into_iter().rev() {
            let params = self.params.get_mut(child);
            params.prelim += shift;
            params.modifier += shift;
            change += params.change;
            shift += params.shift + change;
        }
    }

    /// Center-to-center distance of every level from the root level.
    fn depth_offsets(&self) -> Vec<f32> {
        let mut offsets = Vec::with_capacity(self.extents.len());
        for (depth, extent) in self.extents.iter().enumerate() {
            let offset = match depth {
                0 => 0.0,
                _ => {
                    offsets[depth - 1]
                        + 0.5 * (self.extents[depth - 1] + extent)
                        + self.layout.depth_spacing
                }
            };
            offsets.push(offset);
        }
        offsets
    }

    /// Final breadth coordinate (relative to the root) and depth of every node.
    fn second_walk(&self, root: NodeId) -> Vec<(NodeId, f32, usize)> {
        let mut placements = Vec::with_capacity(self.children.len());
        let mut stack = vec![(root, -self.prelim(root), 0)];
        while let Some((node, m, depth)) = stack.pop() {
            placements.push((node, self.prelim(node) + m, depth));
            let child_m = m + self.modifier(node);
            for child in self.kids(node) {
                stack.push((*child, child_m, depth + 1));
            }
        }
        placements
    }
}
