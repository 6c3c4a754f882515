//! Search tree vertices.
//!
//! A node holds the position reached by one action from its parent. States are stored canonicalized so that the player to move at a node is
//! always `Player::One`. Values accumulated in a node are from that mover's
//! point of view.

/// Arena index of a node. `NONE` marks the missing parent of a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Visit statistics and children for one position.
#[derive(Debug, Clone)]
pub struct MctsNode<S> {
    /// Back-reference used only for backpropagation
    pub parent: NodeId,

    /// Action that led to this node from parent (None for root)
    pub action: Option<usize>,

    /// Canonical game state at this node
    pub state: S,

    /// Simulations that passed through this node
    pub visit_count: u32,

    /// Sum of backpropagated values, from this node's mover perspective
    pub value_sum: f32,

    /// Prior probability of selecting this node from its parent.
    pub prior: f32,

    /// Children in ascending action order. Empty until expanded.
    pub children: Vec<NodeId>,
}

impl<S> MctsNode<S> {
    /// Create a root node. Roots start with one visit so the first
    /// selection already has a non-zero exploration term.
    pub fn new_root(state: S) -> Self {
        Self {
            parent: NodeId::NONE,
            action: None,
            state,
            visit_count: 1,
            value_sum: 0.0,
            prior: 0.0,
            children: Vec::new(),
        }
    }

    pub fn new_child(parent: NodeId, action: usize, prior: f32, state: S) -> Self {
        Self {
            parent,
            action: Some(action),
            state,
            visit_count: 0,
            value_sum: 0.0,
            prior,
            children: Vec::new(),
        }
    }

    /// Mean value from this node's mover perspective. 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    /// Exploitation term as seen by the parent, mapped into [0, 1].
    ///
    /// The child's mean is from the opponent's perspective, so a child mean of
    /// -1 is worth 1.0 to the parent. Unvisited children score 0.
    #[inline]
    pub fn q_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            1.0 - (self.mean_value() + 1.0) / 2.0
        }
    }

    /// PUCT score `Q + c * sqrt(N_parent) / (N + 1) * P`.
    ///
    /// The parent's square root is passed in so siblings share one sqrt.
    #[inline]
    pub fn ucb_score(&self, parent_visits_sqrt: f32, c_puct: f32) -> f32 {
        let u = c_puct * parent_visits_sqrt / (self.visit_count as f32 + 1.0) * self.prior;
        self.q_value() + u
    }

    #[inline]
    pub fn ucb_score_with_parent_visits(&self, parent_visits: u32, c_puct: f32) -> f32 {
        self.ucb_score((parent_visits as f32).sqrt(), c_puct)
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_no_parent() {
        let root = MctsNode::new_root(0u8);
        assert!(root.parent.is_none());
        assert!(NodeId(7).is_some());
        assert_eq!(NodeId(7).index(), 7);
    }

    #[test]
    fn test_new_root() {
        let node = MctsNode::new_root([1u8, 2, 3]);

        assert!(node.is_root());
        assert_eq!(node.action, None);
        assert_eq!(node.visit_count, 1);
        assert!(!node.is_expanded());
        assert_eq!(node.state, [1, 2, 3]);
    }

    #[test]
    fn test_mean_value() {
        let mut node = MctsNode::new_child(NodeId(0), 3, 0.5, ());
        assert_eq!(node.mean_value(), 0.0);

        node.visit_count = 5;
        node.value_sum = -1.0;
        assert!((node.mean_value() + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_q_value_is_from_parent_perspective() {
        let mut node = MctsNode::new_child(NodeId(0), 0, 0.5, ());
        assert_eq!(node.q_value(), 0.0);

        // Child mover always loses: best possible for the parent
        node.visit_count = 2;
        node.value_sum = -2.0;
        assert!((node.q_value() - 1.0).abs() < 1e-6);

        // Child mover always wins
        node.value_sum = 2.0;
        assert!(node.q_value().abs() < 1e-6);

        // Even
        node.value_sum = 0.0;
        assert!((node.q_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ucb_score() {
        let mut node = MctsNode::new_child(NodeId(0), 0, 0.5, ());
        node.visit_count = 9;
        node.value_sum = 4.5; // mean 0.5 for the child, Q = 0.25 for the parent

        // 0.25 + 1.0 * 10 / 10 * 0.5 = 0.75
        let score = node.ucb_score(10.0, 1.0);
        assert!((score - 0.75).abs() < 1e-6);
        assert!((node.ucb_score_with_parent_visits(100, 1.0) - score).abs() < 1e-6);
    }

    #[test]
    fn test_unvisited_score_is_pure_exploration() {
        let node = MctsNode::new_child(NodeId(0), 0, 0.2, ());
        let ucb = node.ucb_score_with_parent_visits(4, 2.0);
        assert!((ucb - 0.8).abs() < 1e-6);
    }
}
