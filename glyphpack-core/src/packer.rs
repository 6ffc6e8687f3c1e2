//! Rectangle packer: binary space partitioning over one atlas page.
//!
//! The page starts as a single free leaf. Each allocation walks the tree
//! depth-first (first child before second) until it finds a free leaf big
//! enough for the request, then splits that leaf until a child matches the
//! request exactly:
//!
//! ```text
//!  ┌─────────────┐       dw >= dh            dh > dw
//!  │             │     ┌────┬────────┐     ┌─────────────┐
//!  │    leaf     │ ──▸ │used│  rest  │  or │    used     │
//!  │             │     │    │        │     ├─────────────┤
//!  └─────────────┘     └────┴────────┘     │    rest     │
//!                                          └─────────────┘
//! ```
//!
//! The axis with the larger leftover delta is cut; on a tie the cut is
//! vertical (width is the primary axis). A split node's two children always
//! partition its rect exactly.
//!
//! Nodes live in an arena indexed by [`NodeId`] so the tree has no owning
//! pointers and no parent links.

use crate::geometry::{Rect, Size};

/// Handle of a node inside a [`RectanglePacker`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    const ROOT: NodeId = NodeId(0);

    #[inline(always)]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
    Leaf { occupied: bool },
    Split { first: NodeId, second: NodeId },
}

#[derive(Clone, Copy, Debug)]
struct PackNode {
    rect: Rect,
    kind: NodeKind,
}

/// Why an allocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    /// The request fits an empty page of this size but not the space left.
    #[error("no room left for a {}x{} cell", .0.width, .0.height)]
    NoRoom(Size),
    /// The request can never fit on this page, however empty.
    #[error("a {}x{} cell can never fit a {}x{} page", .request.width, .request.height, .canvas.width, .canvas.height)]
    NeverFits { request: Size, canvas: Size },
}

/// BSP-tree packer for a single fixed-size canvas.
#[derive(Clone, Debug)]
pub struct RectanglePacker {
    canvas: Size,
    nodes: Vec<PackNode>,
    allocated: usize,
}

impl RectanglePacker {
    /// Create a packer covering `canvas` with one free leaf.
    pub fn new(canvas: Size) -> Self {
        Self {
            canvas,
            nodes: vec![PackNode {
                rect: Rect::from_size(canvas),
                kind: NodeKind::Leaf { occupied: false },
            }],
            allocated: 0,
        }
    }

    /// Canvas size this packer was created with.
    #[inline(always)]
    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Number of successful allocations.
    #[inline(always)]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Number of nodes in the arena (leaves and splits).
    #[inline(always)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every allocation and start over with a single free leaf.
    pub fn reset(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = PackNode {
            rect: Rect::from_size(self.canvas),
            kind: NodeKind::Leaf { occupied: false },
        };
        self.allocated = 0;
    }

    /// `true` when `size` could be placed on an empty page of this canvas.
    #[inline]
    pub fn can_ever_fit(&self, size: Size) -> bool {
        !size.is_empty() && self.canvas.contains(size)
    }

    /// Allocate a rect of exactly `size`.
    ///
    /// Returns [`PackError::NeverFits`] when the request is empty or larger
    /// than the canvas on either axis, and [`PackError::NoRoom`] when it
    /// would fit an empty page but no free leaf is large enough.
    pub fn allocate(&mut self, size: Size) -> Result<Rect, PackError> {
        if !self.can_ever_fit(size) {
            return Err(PackError::NeverFits {
                request: size,
                canvas: self.canvas,
            });
        }

        // Pre-order walk; the second child is pushed first so the first
        // child is visited first.
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = self.nodes[id.index()];
            match node.kind {
                NodeKind::Split { first, second } => {
                    stack.push(second);
                    stack.push(first);
                }
                NodeKind::Leaf { occupied: true } => {}
                NodeKind::Leaf { occupied: false } => {
                    if node.rect.size().contains(size) {
                        let rect = self.place(id, size);
                        self.allocated += 1;
                        return Ok(rect);
                    }
                }
            }
        }

        log::trace!(
            "No room for {}x{} after {} allocations",
            size.width,
            size.height,
            self.allocated
        );
        Err(PackError::NoRoom(size))
    }

    /// Split the free leaf `id` until one descendant matches `size` exactly,
    /// mark it occupied and return its rect. `size` must fit the leaf.
    fn place(&mut self, mut id: NodeId, size: Size) -> Rect {
        loop {
            let rect = self.nodes[id.index()].rect;
            if rect.size() == size {
                self.nodes[id.index()].kind = NodeKind::Leaf { occupied: true };
                return rect;
            }

            let dw = rect.width - size.width;
            let dh = rect.height - size.height;
            let (used, rest) = if dh > dw {
                (
                    Rect::new(rect.x, rect.y, rect.width, size.height),
                    Rect::new(rect.x, rect.y + size.height, rect.width, dh),
                )
            } else {
                (
                    Rect::new(rect.x, rect.y, size.width, rect.height),
                    Rect::new(rect.x + size.width, rect.y, dw, rect.height),
                )
            };

            let first = self.push_leaf(used);
            let second = self.push_leaf(rest);
            self.nodes[id.index()].kind = NodeKind::Split { first, second };
            id = first;
        }
    }

    fn push_leaf(&mut self, rect: Rect) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(PackNode {
            rect,
            kind: NodeKind::Leaf { occupied: false },
        });
        id
    }

    /// Every leaf as `(rect, occupied)`, in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = (Rect, bool)> + '_ {
        self.nodes.iter().filter_map(|n| match n.kind {
            NodeKind::Leaf { occupied } => Some((n.rect, occupied)),
            NodeKind::Split { .. } => None,
        })
    }

    /// Check the structural invariants of the tree: every split's children
    /// partition it exactly. Used by tests.
    pub fn is_well_formed(&self) -> bool {
        self.nodes.iter().all(|n| match n.kind {
            NodeKind::Leaf { .. } => true,
            NodeKind::Split { first, second } => {
                let a = self.nodes[first.index()].rect;
                let b = self.nodes[second.index()].rect;
                n.rect.contains_rect(&a)
                    && n.rect.contains_rect(&b)
                    && !a.intersects(&b)
                    && a.area() + b.area() == n.rect.area()
            }
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
