//! Per-node visual state exchanged with layouts and renderers.

use trellis_core::geometry::{Bounds, Point, Size};

/// Visual record attached to every node.
///
/// Interactive collaborators own the flags (`fixed`, `expanded`, `visible`)
/// and the degree-of-interest score; layouts read them and write the
/// position (and the size, for area based layouts). The position is the
/// center of the node.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    position: Point,
    size: Size,
    fixed: bool,
    expanded: bool,
    visible: bool,
    doi: f32,
}

impl Default for Visual {
    fn default() -> Self {
        Self {
            position: Point::default(),
            size: Size::default(),
            fixed: false,
            expanded: true,
            visible: true,
            doi: 0.0,
        }
    }
}

impl Visual {
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Bounds of the node, centered on its position.
    pub fn bounds(&self) -> Bounds {
        self.position.to_bounds(self.size)
    }

    /// Pinned nodes are never moved by the force simulation.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    /// Collapsed nodes are treated as leaves by the tree layouts.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Degree of interest, supplied by filters.
    pub fn doi(&self) -> f32 {
        self.doi
    }

    pub fn set_doi(&mut self, doi: f32) {
        self.doi = doi;
    }
}
