// Search results as a forward-traversal cursor.
//
// Path reconstruction naturally walks back-pointers from the goal to the
// start, which produces steps in reverse order. Rather than reversing, `Path`
// keeps them that way internally (the next step to take is the last element of
// the vector, so consuming a step is an O(1) `pop`) and only ever exposes
// forward semantics: `peek_next`, `advance`, and forward iterators.
//
// See also: `search.rs` which builds a `Path` from its back-pointer map.

/// One atomic step along a path: the edge taken and the node it arrives at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step<N, E> {
    pub edge: E,
    pub node: N,
}

/// A found route from an origin node to a destination node, consumed one
/// step at a time.
#[derive(Clone, Debug, PartialEq)]
pub struct Path<N, E> {
    origin: N,
    destination: N,
    /// Node most recently reached (the origin until the first `advance`).
    current: N,
    /// Steps not yet taken, last element first.
    pending: Vec<Step<N, E>>,
    total_cost: f32,
}

impl<N: Copy, E: Copy> Path<N, E> {
    /// A path that starts and ends at `node` with no steps.
    pub fn trivial(node: N) -> Self {
        Self {
            origin: node,
            destination: node,
            current: node,
            pending: Vec::new(),
            total_cost: 0.0,
        }
    }

    /// Build from steps listed destination-first, as produced by walking
    /// back-pointers. `reversed_steps[0]` must arrive at the destination.
    pub(crate) fn from_reversed(origin: N, reversed_steps: Vec<Step<N, E>>, total_cost: f32) -> Self {
        let destination = reversed_steps.first().map_or(origin, |s| s.node);
        Self {
            origin,
            destination,
            current: origin,
            pending: reversed_steps,
            total_cost,
        }
    }

    pub fn origin(&self) -> N {
        self.origin
    }

    pub fn destination(&self) -> N {
        self.destination
    }

    /// The node most recently arrived at.
    pub fn current(&self) -> N {
        self.current
    }

    /// Total search cost of the whole path (sum of edge costs, never
    /// including heuristic terms). Unaffected by `advance`.
    pub fn total_cost(&self) -> f32 {
        self.total_cost
    }

    /// The next step to take, if any remain.
    pub fn peek_next(&self) -> Option<&Step<N, E>> {
        self.pending.last()
    }

    /// Consume the next step and move the cursor onto its node.
    pub fn advance(&mut self) -> Option<Step<N, E>> {
        let step = self.pending.pop()?;
        self.current = step.node;
        Some(step)
    }

    /// Number of steps not yet taken.
    pub fn remaining_len(&self) -> usize {
        self.pending.len()
    }

    /// True once every step has been taken.
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all remaining steps; the cursor stays where it is.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Remaining steps in travel order.
    pub fn remaining_steps(&self) -> impl DoubleEndedIterator<Item = &Step<N, E>> + '_ {
        self.pending.iter().rev()
    }

    /// The current node followed by every remaining node, in travel order.
    pub fn remaining_nodes(&self) -> impl Iterator<Item = N> + '_ {
        std::iter::once(self.current).chain(self.remaining_steps().map(|s| s.node))
    }

    /// Every node from the origin to the destination, inclusive. Only
    /// meaningful before any `advance`; afterwards it starts at `current`.
    pub fn nodes(&self) -> Vec<N> {
        self.remaining_nodes().collect()
    }
}
