use crate::snapshot::{GraphInput, StructuralGraph};

/// Linear timeline of structural snapshots with a current index.
///
/// Never empty: a fresh history holds a single anchor-only snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphHistory {
    snapshots: Vec<StructuralGraph>,
    current: usize,
}

impl Default for GraphHistory {
    fn default() -> Self {
        Self::new(StructuralGraph::with_anchor())
    }
}

impl GraphHistory {
    pub fn new(initial: StructuralGraph) -> Self {
        Self {
            snapshots: vec![initial.normalized()],
            current: 0,
        }
    }

    pub fn from_input(input: GraphInput) -> Self {
        if input.snapshots.is_empty() {
            return Self::default();
        }
        let current = input.current.min(input.snapshots.len() - 1);
        Self {
            snapshots: input
                .snapshots
                .into_iter()
                .map(StructuralGraph::normalized)
                .collect(),
            current,
        }
    }

    pub fn current_snapshot(&self) -> &StructuralGraph {
        &self.snapshots[self.current]
    }

    pub fn history(&self) -> (&[StructuralGraph], usize) {
        (&self.snapshots, self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn get(&self, index: usize) -> Option<&StructuralGraph> {
        self.snapshots.get(index)
    }

    /// Append after the current entry, dropping anything ahead of it, and
    /// make the new entry current. Returns its index.
    pub fn push(&mut self, snapshot: StructuralGraph) -> usize {
        self.snapshots.truncate(self.current + 1);
        self.snapshots.push(snapshot);
        self.current = self.snapshots.len() - 1;
        self.current
    }

    /// Remove the newest entry. The last remaining entry is never removed.
    pub(crate) fn pop(&mut self) -> Option<StructuralGraph> {
        if self.snapshots.len() <= 1 {
            return None;
        }
        let popped = self.snapshots.pop();
        self.current = self.current.min(self.snapshots.len() - 1);
        popped
    }

    /// Jump to `index`, clamped to the timeline. Returns whether it moved.
    pub fn seek(&mut self, index: usize) -> bool {
        let index = index.min(self.snapshots.len() - 1);
        let moved = index != self.current;
        self.current = index;
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn undo(&mut self) -> bool {
        self.can_undo() && self.seek(self.current - 1)
    }

    pub fn redo(&mut self) -> bool {
        self.can_redo() && self.seek(self.current + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeType};

    fn with_node(id: &str) -> StructuralGraph {
        let mut graph = StructuralGraph::with_anchor();
        graph.nodes.push(Node::new(id, id, NodeType::Goal));
        graph
    }

    #[test]
    fn test_push_truncates_future() {
        let mut history = GraphHistory::default();
        history.push(with_node("2"));
        history.push(with_node("3"));
        assert_eq!(history.len(), 3);

        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(history.current_index(), 0);

        let index = history.push(with_node("4"));
        assert_eq!(index, 1);
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert!(history.current_snapshot().node("4").is_some());
    }

    #[test]
    fn test_seek_clamps() {
        let mut history = GraphHistory::default();
        history.push(with_node("2"));
        assert!(history.seek(0));
        assert!(history.seek(99));
        assert_eq!(history.current_index(), 1);
        assert!(!history.seek(1));
    }

    #[test]
    fn test_from_empty_input() {
        let history = GraphHistory::from_input(GraphInput::empty());
        assert_eq!(history.len(), 1);
        assert!(history.current_snapshot().anchor().is_some());
    }

    #[test]
    fn test_pop_keeps_last_entry() {
        let mut history = GraphHistory::default();
        assert!(history.pop().is_none());
        history.push(with_node("2"));
        assert!(history.pop().is_some());
        assert_eq!(history.current_index(), 0);
    }
}
