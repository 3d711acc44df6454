//! Arena-allocated search tree keyed by card multisets.

use azen_core::game::moves::{Move, MoveKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Move leading here; `None` only for the root.
    pub mv: Option<Move>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visits: u32,
    /// Sum of outcomes from the searcher's point of view.
    pub score: f64,
}

impl Node {
    fn new(mv: Option<Move>, parent: Option<NodeId>) -> Self {
        Self {
            mv,
            parent,
            children: Vec::new(),
            visits: 0,
            score: 0.0,
        }
    }

    pub fn key(&self) -> Option<MoveKey> {
        self.mv.as_ref().map(Move::key)
    }

    pub fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.score / f64::from(self.visits)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<Node>,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None)],
        }
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child_with_key(&self, parent: NodeId, key: MoveKey) -> Option<NodeId> {
        self.get(parent)
            .children
            .iter()
            .copied()
            .find(|child| self.get(*child).key() == Some(key))
    }

    pub fn add_child(&mut self, parent: NodeId, mv: Move) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(Some(mv), Some(parent)));
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// UCB1 over the children of `parent` whose moves are in `available`.
    ///
    /// Returns the first unvisited eligible child if any. When the player to
    /// move is not the searcher (`maximizing == false`) the exploitation term
    /// is inverted.
    pub fn select_child(
        &self,
        parent: NodeId,
        available: &[MoveKey],
        maximizing: bool,
        exploration: f64,
    ) -> Option<NodeId> {
        let node = self.get(parent);
        let log_parent = f64::from(node.visits.max(1)).ln();
        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in &node.children {
            let child = self.get(child_id);
            let eligible = child.key().is_some_and(|key| available.contains(&key));
            if !eligible {
                continue;
            }
            if child.visits == 0 {
                return Some(child_id);
            }
            let mean = child.mean();
            let exploit = if maximizing { mean } else { 1.0 - mean };
            let value = exploit + exploration * (log_parent / f64::from(child.visits)).sqrt();
            if best.is_none_or(|(_, top)| value > top) {
                best = Some((child_id, value));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Adds one visit and `outcome` to every node from `leaf` up to the root.
    pub fn backpropagate(&mut self, leaf: NodeId, outcome: f64) {
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            let node = &mut self.nodes[id.index()];
            node.visits += 1;
            node.score += outcome;
            cursor = node.parent;
        }
    }

    pub fn root_children(&self) -> impl Iterator<Item = &Node> + '_ {
        self.get(NodeId::ROOT)
            .children
            .iter()
            .map(|child| self.get(*child))
    }
}
