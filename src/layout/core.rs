use std::collections::HashMap;

use crate::error::{PageError, Result};
use crate::geometry::{Rect, Size};

/// Layout direction for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// Space distribution rules for child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Exact number of cells along the container axis.
    Fixed(u16),
    /// Share of the distributable length, rounded to the nearest cell.
    Percent(u8),
    /// Proportional weight over whatever remains after rigid children.
    Flex(u16),
}

/// Unique identifier for layout nodes.
pub type NodeId = String;

/// Layout node representation (container or leaf).
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: NodeId,
    pub direction: Direction,
    pub constraints: Vec<Constraint>,
    pub children: Vec<LayoutNode>,
    pub gap: u16,
    pub padding: u16,
}

impl LayoutNode {
    pub fn leaf(id: impl Into<NodeId>) -> Self {
        Self::container(id, Direction::Row, Vec::new(), Vec::new())
    }

    pub fn container(
        id: impl Into<NodeId>,
        direction: Direction,
        constraints: Vec<Constraint>,
        children: Vec<LayoutNode>,
    ) -> Self {
        Self {
            id: id.into(),
            direction,
            constraints,
            children,
            gap: 0,
            padding: 0,
        }
    }

    pub fn with_gap(mut self, gap: u16) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_padding(mut self, padding: u16) -> Self {
        self.padding = padding;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Layout tree orchestrator.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub root: LayoutNode,
}

impl LayoutTree {
    pub fn new(root: LayoutNode) -> Self {
        Self { root }
    }

    /// Solve the tree for a terminal size, returning leaf rects keyed by node id.
    ///
    /// Containers only partition space; they never own content, so they are
    /// left out of the result.
    pub fn solve(&self, size: Size) -> Result<HashMap<NodeId, Rect>> {
        if self.root.is_leaf() {
            return Err(PageError::EmptyLayout);
        }

        let mut rects = HashMap::new();
        solve_node(
            &self.root,
            Rect::new(0, 0, size.width, size.height),
            &mut rects,
        );
        Ok(rects)
    }
}

fn solve_node(node: &LayoutNode, rect: Rect, accum: &mut HashMap<NodeId, Rect>) {
    if node.is_leaf() {
        accum.insert(node.id.clone(), rect);
        return;
    }

    let inner = rect.inset(node.padding);
    let axis_length = match node.direction {
        Direction::Row => inner.width,
        Direction::Column => inner.height,
    };
    let gaps = node
        .gap
        .saturating_mul(node.children.len().saturating_sub(1) as u16);
    let spans = distribute(
        axis_length.saturating_sub(gaps),
        node.children.len(),
        &node.constraints,
    );

    let mut cursor = match node.direction {
        Direction::Row => inner.x,
        Direction::Column => inner.y,
    };
    for (child, span) in node.children.iter().zip(spans) {
        let child_rect = match node.direction {
            Direction::Row => Rect::new(cursor, inner.y, span, inner.height),
            Direction::Column => Rect::new(inner.x, cursor, inner.width, span),
        };
        solve_node(child, child_rect, accum);
        cursor = cursor.saturating_add(span).saturating_add(node.gap);
    }
}

/// Split `available` cells between `count` children. Missing constraints
/// default to `Flex(1)`; rigid children that overflow are trimmed from the end.
fn distribute(available: u16, count: usize, constraints: &[Constraint]) -> Vec<u16> {
    let resolved: Vec<Constraint> = (0..count)
        .map(|idx| constraints.get(idx).copied().unwrap_or(Constraint::Flex(1)))
        .collect();

    let total = available as u32;
    let mut spans: Vec<u32> = resolved
        .iter()
        .map(|constraint| match *constraint {
            Constraint::Fixed(value) => value as u32,
            Constraint::Percent(percent) => (total * percent.min(100) as u32 + 50) / 100,
            Constraint::Flex(_) => 0,
        })
        .collect();

    let mut over = spans.iter().sum::<u32>().saturating_sub(total);
    for span in spans.iter_mut().rev() {
        if over == 0 {
            break;
        }
        let cut = (*span).min(over);
        *span -= cut;
        over -= cut;
    }

    let remaining = total.saturating_sub(spans.iter().sum());
    let weights: Vec<u32> = resolved
        .iter()
        .map(|constraint| match *constraint {
            Constraint::Flex(weight) => weight.max(1) as u32,
            _ => 0,
        })
        .collect();
    let total_weight: u32 = weights.iter().sum();

    if remaining > 0 && total_weight > 0 {
        let mut leftover = remaining;
        let mut last_flex = None;
        for (idx, weight) in weights.iter().enumerate() {
            if *weight == 0 {
                continue;
            }
            let share = remaining * weight / total_weight;
            spans[idx] += share;
            leftover -= share;
            last_flex = Some(idx);
        }
        // Rounding remainder goes to the trailing flexible child.
        if let Some(idx) = last_flex {
            spans[idx] += leftover;
        }
    }

    spans
        .into_iter()
        .map(|span| span.min(u16::MAX as u32) as u16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_single_child() {
        assert_eq!(distribute(80, 1, &[]), vec![80]);
    }

    #[test]
    fn flex_remainder_lands_on_last_flexible_child() {
        assert_eq!(
            distribute(10, 3, &[Constraint::Flex(1), Constraint::Flex(1), Constraint::Fixed(3)]),
            vec![3, 4, 3]
        );
    }

    #[test]
    fn overflowing_fixed_children_are_trimmed_from_the_end() {
        assert_eq!(
            distribute(10, 2, &[Constraint::Fixed(8), Constraint::Fixed(8)]),
            vec![8, 2]
        );
    }

    #[test]
    fn row_layout_with_mixed_constraints() {
        let root = LayoutNode::container(
            "page",
            Direction::Row,
            vec![
                Constraint::Fixed(20),
                Constraint::Percent(25),
                Constraint::Flex(1),
            ],
            vec![
                LayoutNode::leaf("controls"),
                LayoutNode::leaf("plate"),
                LayoutNode::leaf("card"),
            ],
        )
        .with_gap(2)
        .with_padding(1);

        let rects = LayoutTree::new(root).solve(Size::new(100, 20)).unwrap();

        assert_eq!(rects["controls"], Rect::new(1, 1, 20, 18));
        assert_eq!(rects["plate"], Rect::new(23, 1, 24, 18));
        assert_eq!(rects["card"], Rect::new(49, 1, 50, 18));
        assert!(!rects.contains_key("page"));
    }

    #[test]
    fn nested_columns_stack_vertically() {
        let root = LayoutNode::container(
            "page",
            Direction::Column,
            vec![Constraint::Fixed(3), Constraint::Flex(1), Constraint::Fixed(1)],
            vec![
                LayoutNode::leaf("header"),
                LayoutNode::container(
                    "body",
                    Direction::Row,
                    vec![Constraint::Flex(3), Constraint::Flex(2)],
                    vec![LayoutNode::leaf("map"), LayoutNode::leaf("side")],
                )
                .with_gap(1),
                LayoutNode::leaf("status"),
            ],
        );

        let rects = LayoutTree::new(root).solve(Size::new(41, 30)).unwrap();
        assert_eq!(rects["header"], Rect::new(0, 0, 41, 3));
        assert_eq!(rects["map"], Rect::new(0, 3, 24, 26));
        assert_eq!(rects["side"], Rect::new(25, 3, 16, 26));
        assert_eq!(rects["status"], Rect::new(0, 29, 41, 1));
    }

    #[test]
    fn leaf_root_is_rejected() {
        let err = LayoutTree::new(LayoutNode::leaf("alone"))
            .solve(Size::new(10, 10))
            .unwrap_err();
        assert!(matches!(err, PageError::EmptyLayout));
    }
}
