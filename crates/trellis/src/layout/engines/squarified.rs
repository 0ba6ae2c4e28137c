//! Squarified tree-map layout.
//!
//! Every node receives a rectangle whose area is proportional to the size
//! of its subtree. Children are packed into their parent's rectangle in
//! rows, largest first, following the greedy heuristic of Bruls, Huizing
//! and van Wijk: a child joins the current row while that does not make
//! the row's worst aspect ratio larger.
//!
//! Nodes are written with their rectangle's center as position and the
//! rectangle's extent as size.

use std::fmt;

use log::{debug, trace, warn};

use trellis_core::{
    geometry::{Bounds, Insets, Point, Size},
    identifier::Id,
};

use super::{layout_children, layout_pre_order};
use crate::{
    config::TreeMapConfig,
    error::LayoutError,
    layout::{Layout, LayoutContext, ParamTable},
    structure::{Graph, NodeId},
};

/// Custom size accessor for [`SizeMetric::Custom`].
pub type SizeFn = Box<dyn Fn(&Graph, NodeId) -> Option<f64> + Send + Sync>;

/// Source of leaf sizes.
///
/// Internal nodes always take the sum of their children. A collapsed node
/// takes the total size of the data leaves below it. Negative and
/// non-finite sizes count as zero.
#[derive(Default)]
pub enum SizeMetric {
    /// Every leaf weighs the same
    #[default]
    LeafCount,
    /// Numeric attribute that every leaf must carry
    Attribute(Id),
    /// Caller supplied accessor; `None` is reported as a missing size
    Custom(SizeFn),
}

impl fmt::Debug for SizeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeMetric::LeafCount => write!(f, "LeafCount"),
            SizeMetric::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            SizeMetric::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl SizeMetric {
    pub fn custom(size: impl Fn(&Graph, NodeId) -> Option<f64> + Send + Sync + 'static) -> Self {
        SizeMetric::Custom(Box::new(size))
    }

    fn leaf_size(&self, graph: &Graph, node: NodeId) -> Result<f64, LayoutError> {
        let size = match self {
            SizeMetric::LeafCount => 1.0,
            SizeMetric::Attribute(name) => graph
                .attributes(node)
                .ok_or(LayoutError::NodeNotFound(node))?
                .require_number(*name)
                .map_err(|source| LayoutError::MissingAttribute { node, source })?,
            SizeMetric::Custom(size) => size(graph, node).ok_or(LayoutError::MissingSize(node))?,
        };
        Ok(if size.is_finite() { size.max(0.0) } else { 0.0 })
    }

    /// Size of a node that takes part in the layout as a leaf.
    ///
    /// Sums the childless graph nodes below `node`, so a collapsed node
    /// keeps the area of its hidden subtree.
    fn subtree_size(&self, graph: &Graph, node: NodeId) -> Result<f64, LayoutError> {
        graph
            .pre_order(node)
            .filter(|n| graph.children(*n).is_empty())
            .map(|leaf| self.leaf_size(graph, leaf))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TreeMapParams {
    area: f64,
    rect: Bounds,
}

/// Squarified tree-map layout engine.
#[derive(Debug, Default)]
pub struct SquarifiedLayout {
    metric: SizeMetric,
    frame_width: f32,
}

impl SquarifiedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TreeMapConfig) -> Self {
        let metric = config
            .size_attribute()
            .map_or(SizeMetric::LeafCount, |name| SizeMetric::Attribute(Id::new(name)));
        Self {
            metric,
            frame_width: config.frame_width(),
        }
    }

    pub fn set_metric(&mut self, metric: SizeMetric) -> &mut Self {
        self.metric = metric;
        self
    }

    pub fn metric(&self) -> &SizeMetric {
        &self.metric
    }

    /// Inset applied to the rectangle of every internal node below the root.
    pub fn set_frame_width(&mut self, frame_width: f32) -> &mut Self {
        self.frame_width = frame_width;
        self
    }

    pub fn frame_width(&self) -> f32 {
        self.frame_width
    }

    /// Rectangle available to the children of `node`.
    ///
    /// With a frame, the children's areas are rescaled to the inset area.
    fn inner_rect(
        &self,
        params: &mut ParamTable<TreeMapParams>,
        node: NodeId,
        kids: &[NodeId],
        is_root: bool,
    ) -> Bounds {
        let TreeMapParams { area, rect } = params.value(node);
        let frame = self.frame_width;
        if is_root || frame <= 0.0 {
            return rect;
        }

        let available = if rect.short_side() > 2.0 * frame {
            let frame_loss =
                2.0 * f64::from(frame) * f64::from(rect.width() + rect.height() - 2.0 * frame);
            (area - frame_loss).max(0.0)
        } else {
            0.0
        };
        let total: f64 = kids.iter().map(|kid| params.value(*kid).area).sum();
        let factor = if total > 0.0 { available / total } else { 0.0 };
        for kid in kids {
            params.get_mut(*kid).area *= factor;
        }
        rect.shrink(Insets::uniform(frame))
    }
}

impl Layout for SquarifiedLayout {
    fn name(&self) -> &'static str {
        "treemap"
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let root = ctx.require_root(self.name(), graph)?;
        let bounds = ctx.bounds();
        let order = layout_pre_order(graph, root);

        let mut params: ParamTable<TreeMapParams> = ParamTable::new();
        for node in order.iter().rev() {
            let kids = layout_children(graph, *node);
            let area = if kids.is_empty() {
                self.metric.subtree_size(graph, *node)?
            } else {
                kids.iter().map(|kid| params.value(*kid).area).sum()
            };
            params.get_mut(*node).area = area;
        }

        let root_area = params.value(root).area;
        let scale = if root_area > 0.0 {
            f64::from(bounds.area().max(0.0)) / root_area
        } else {
            warn!(root:% = root; "Tree-map root has zero area");
            0.0
        };
        for node in &order {
            params.get_mut(*node).area *= scale;
        }
        params.get_mut(root).rect = bounds;

        debug!(
            root:% = root,
            node_count = order.len(),
            frame_width = self.frame_width,
            metric:? = self.metric;
            "Tree-map layout"
        );

        for node in &order {
            let kids = layout_children(graph, *node);
            if kids.is_empty() {
                continue;
            }
            if params.value(*node).area <= 0.0 {
                let center = params.value(*node).rect.center();
                for kid in kids {
                    params.get_mut(kid).rect = Bounds::new_from_center(center, Size::default());
                }
                continue;
            }
            let rect = self.inner_rect(&mut params, *node, &kids, *node == root);
            squarify(&mut params, &kids, rect);
        }

        for node in &order {
            let rect = params.value(*node).rect;
            trace!(node:% = node, rect:? = rect; "Placed node");
            if let Some(visual) = graph.visual_mut(*node) {
                visual.set_position(rect.center());
                visual.set_size(rect.to_size());
            }
        }
        Ok(())
    }
}

/// Packs `kids` into `rect` row by row.
fn squarify(params: &mut ParamTable<TreeMapParams>, kids: &[NodeId], rect: Bounds) {
    let mut pending: Vec<(NodeId, f32)> = kids
        .iter()
        .map(|kid| (*kid, params.value(*kid).area as f32))
        .collect();
    // stable: equal areas keep child order
    pending.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut rect = rect;
    let mut width = rect.short_side();
    let mut row: Vec<(NodeId, f32)> = Vec::new();
    let mut worst = f32::INFINITY;
    let mut next = 0;

    while let Some(&(node, area)) = pending.get(next) {
        if area <= 0.0 {
            params.get_mut(node).rect = Bounds::new_from_center(rect.center(), Size::default());
            next += 1;
            continue;
        }

        row.push((node, area));
        let candidate = worst_ratio(&row, width);
        if row.len() == 1 || candidate <= worst {
            worst = candidate;
            next += 1;
        } else {
            row.pop();
            rect = layout_row(params, &row, width, rect);
            width = rect.short_side();
            row.clear();
            worst = f32::INFINITY;
        }
    }
    if !row.is_empty() {
        layout_row(params, &row, width, rect);
    }
}

/// Largest aspect ratio of a row of `areas` laid along a side of `width`.
fn worst_ratio(row: &[(NodeId, f32)], width: f32) -> f32 {
    let (mut min, mut max, mut sum) = (f32::INFINITY, 0.0_f32, 0.0_f32);
    for (_, area) in row {
        min = min.min(*area);
        max = max.max(*area);
        sum += area;
    }
    let (sum2, width2) = (sum * sum, width * width);
    (width2 * max / sum2).max(sum2 / (width2 * min))
}

/// Places `row` along the side of `rect` of length `width` and returns the
/// remaining rectangle.
fn layout_row(
    params: &mut ParamTable<TreeMapParams>,
    row: &[(NodeId, f32)],
    width: f32,
    rect: Bounds,
) -> Bounds {
    let sum: f32 = row.iter().map(|(_, area)| area).sum();
    let thickness = if width > 0.0 { sum / width } else { 0.0 };
    let horizontal = width == rect.width();

    let mut offset = 0.0;
    for (node, area) in row {
        let length = if thickness > 0.0 { area / thickness } else { 0.0 };
        let cell = if horizontal {
            Bounds::new(rect.min_x() + offset, rect.min_y(), length, thickness)
        } else {
            Bounds::new(rect.min_x(), rect.min_y() + offset, thickness, length)
        };
        params.get_mut(*node).rect = cell;
        offset += length;
    }

    if horizontal {
        let top_left = Point::new(rect.min_x(), rect.min_y() + thickness);
        Bounds::new_from_top_left(
            top_left,
            Size::new(rect.width(), (rect.height() - thickness).max(0.0)),
        )
    } else {
        let top_left = Point::new(rect.min_x() + thickness, rect.min_y());
        Bounds::new_from_top_left(
            top_left,
            Size::new((rect.width() - thickness).max(0.0), rect.height()),
        )
    }
}
