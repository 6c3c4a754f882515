//! MCTS tree structure with arena allocation.
//!
//! Nodes are stored in a contiguous Vec and referenced by NodeId indices.
//! A child keeps its parent's index so backpropagation can walk upward
//! without reference cycles.

use engine_core::{Game, Player};

use crate::node::{MctsNode, NodeId};

/// MCTS tree with arena-based node storage.
#[derive(Debug, Clone)]
pub struct MctsTree<S> {
    /// Arena storing all nodes
    nodes: Vec<MctsNode<S>>,

    /// Root node index (always 0 after initialization)
    root: NodeId,
}

impl<S: Clone> MctsTree<S> {
    /// Create a new tree rooted at a canonical state.
    pub fn new(root_state: S) -> Self {
        Self {
            nodes: vec![MctsNode::new_root(root_state)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode<S> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode<S> {
        &mut self.nodes[id.index()]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: MctsNode<S>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Select the child with the highest PUCT score.
    ///
    /// Ties go to the earliest child, i.e. the lowest action index.
    pub fn select_child(&self, node_id: NodeId, c_puct: f32) -> Option<NodeId> {
        let node = self.get(node_id);
        let parent_visits_sqrt = (node.visit_count as f32).sqrt();

        let mut best: Option<(NodeId, f32)> = None;
        for &child_id in &node.children {
            let score = self.get(child_id).ucb_score(parent_visits_sqrt, c_puct);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((child_id, score)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Descend from the root through expanded nodes until reaching a leaf.
    pub fn select_leaf(&self, c_puct: f32) -> NodeId {
        let mut current = self.root;
        while self.get(current).is_expanded() {
            match self.select_child(current, c_puct) {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Expand a node with one child per action whose prior is positive.
    ///
    /// The child state is the board after the node's mover (always
    /// `Player::One` in canonical form) plays the action, re-canonicalized
    /// so that the opponent reads as `Player::One`.
    pub fn expand<G>(&mut self, game: &G, node_id: NodeId, policy: &[f32])
    where
        G: Game<State = S>,
    {
        let parent_state = self.get(node_id).state.clone();
        let mut children = Vec::new();

        for (action, &prior) in policy.iter().enumerate() {
            if prior <= 0.0 {
                continue;
            }
            let next = game.next_state(&parent_state, action, Player::One);
            let child_state = game.change_perspective(&next, Player::Two);
            let child = MctsNode::new_child(node_id, action, prior, child_state);
            children.push(self.allocate(child));
        }

        self.get_mut(node_id).children = children;
    }

    /// Backpropagate a value from a leaf to the root.
    /// Value is negated at each level (opponent's perspective).
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f32) {
        self.backpropagate_with(leaf_id, value, |v| -v);
    }

    /// Backpropagate using a game-supplied perspective flip.
    pub fn backpropagate_with<F>(&mut self, leaf_id: NodeId, value: f32, flip: F)
    where
        F: Fn(f32) -> f32,
    {
        let mut current_id = leaf_id;
        let mut current_value = value;

        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.visit_count += 1;
            node.value_sum += current_value;

            current_value = flip(current_value);
            current_id = node.parent;
        }
    }

    /// Raw visit counts of the root's children, indexed by action.
    pub fn root_visit_counts(&self, num_actions: usize) -> Vec<u32> {
        let mut counts = vec![0; num_actions];
        for &child_id in &self.get(self.root).children {
            let child = self.get(child_id);
            if let Some(action) = child.action {
                counts[action] = child.visit_count;
            }
        }
        counts
    }

    /// Get the most visited root action. Ties go to the lowest action.
    pub fn best_action(&self) -> Option<(usize, u32)> {
        let mut best: Option<(usize, u32)> = None;
        for &child_id in &self.get(self.root).children {
            let child = self.get(child_id);
            let Some(action) = child.action else { continue };
            match best {
                Some((_, visits)) if child.visit_count <= visits => {}
                _ => best = Some((action, child.visit_count)),
            }
        }
        best
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(),
        }
    }

    fn compute_max_depth(&self) -> u32 {
        // Children are always allocated after their parent, so one forward
        // pass sees every parent depth before its children.
        let mut depth = vec![0u32; self.nodes.len()];
        let mut max_depth = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.parent.is_some() {
                depth[i] = depth[node.parent.index()] + 1;
                max_depth = max_depth.max(depth[i]);
            }
        }
        max_depth
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_tictactoe::TicTacToe;

    fn expanded_root() -> MctsTree<games_tictactoe::State> {
        let game = TicTacToe::new();
        let mut tree = MctsTree::new(game.initial_state());
        let policy = vec![1.0 / 9.0; 9];
        tree.expand(&game, tree.root(), &policy);
        tree
    }

    #[test]
    fn test_new_tree() {
        let tree = MctsTree::new(0u8);
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.get(tree.root()).visit_count, 1);
    }

    #[test]
    fn test_expand_skips_zero_priors() {
        let game = TicTacToe::new();
        let mut tree = MctsTree::new(game.initial_state());
        let mut policy = vec![0.0; 9];
        policy[0] = 0.5;
        policy[4] = 0.5;
        tree.expand(&game, tree.root(), &policy);

        let root = tree.get(tree.root());
        assert_eq!(root.children.len(), 2);
        let actions: Vec<_> = root
            .children
            .iter()
            .map(|&id| tree.get(id).action)
            .collect();
        assert_eq!(actions, vec![Some(0), Some(4)]);
    }

    #[test]
    fn test_child_states_are_canonical_for_the_next_mover() {
        let tree = expanded_root();
        let first = tree.get(tree.get(tree.root()).children[0]);

        // The root mover's stone reads as the opponent at the child
        assert_eq!(first.state.board()[0], -1);
        assert_eq!(first.action, Some(0));
        assert_eq!(first.parent, tree.root());
    }

    #[test]
    fn test_select_child_breaks_ties_by_lowest_action() {
        let tree = expanded_root();
        let selected = tree.select_child(tree.root(), 2.0).unwrap();
        assert_eq!(tree.get(selected).action, Some(0));
    }

    #[test]
    fn test_select_child_prefers_higher_prior() {
        let game = TicTacToe::new();
        let mut tree = MctsTree::new(game.initial_state());
        let mut policy = vec![0.1; 9];
        policy[6] = 0.2;
        tree.expand(&game, tree.root(), &policy);

        let selected = tree.select_child(tree.root(), 2.0).unwrap();
        assert_eq!(tree.get(selected).action, Some(6));
    }

    #[test]
    fn test_backpropagate_alternates_sign() {
        let mut tree = expanded_root();
        let child = tree.get(tree.root()).children[3];

        tree.backpropagate(child, 1.0);

        let child_node = tree.get(child);
        assert_eq!(child_node.visit_count, 1);
        assert!((child_node.value_sum - 1.0).abs() < 1e-6);

        let root = tree.get(tree.root());
        assert_eq!(root.visit_count, 2);
        assert!((root.value_sum + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_select_leaf_descends_expanded_nodes() {
        let game = TicTacToe::new();
        let mut tree = expanded_root();
        let child = tree.get(tree.root()).children[0];
        let mut policy = vec![1.0 / 8.0; 9];
        policy[0] = 0.0;
        tree.expand(&game, child, &policy);

        let leaf = tree.select_leaf(2.0);
        assert_eq!(tree.get(leaf).parent, child);
        assert_eq!(tree.stats().max_depth, 2);
    }

    #[test]
    fn test_root_visit_counts_and_best_action() {
        let mut tree = expanded_root();
        let children = tree.get(tree.root()).children.clone();
        tree.backpropagate(children[2], 0.0);
        tree.backpropagate(children[5], 0.0);
        tree.backpropagate(children[5], 0.0);

        let counts = tree.root_visit_counts(9);
        assert_eq!(counts, vec![0, 0, 1, 0, 0, 2, 0, 0, 0]);
        assert_eq!(tree.best_action(), Some((5, 2)));
        assert_eq!(tree.stats().root_visits, 4);
    }
}
