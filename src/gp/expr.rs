//! Items related to expressions.
//!
//! Expressions are stored within a `DiGraph` arena. The root of an expression always lives at
//! index `0`, edges point from a function node to each of its operands and the weight of each
//! edge is the operand's slot within the function's argument list.

use fnv::FnvHashMap;
use petgraph::{Incoming, Outgoing};
use petgraph::visit::EdgeRef;
use rand::Rng;
use std::mem;

/// A node/expression type that can be evaluated to a single value.
pub trait Evaluate<E> {
    /// The type of the value produced by the node type.
    type Value;
    /// Evaluate this node in terms of the given operand values to produce a value.
    ///
    /// `inputs` is ordered by operand slot and always has a length equal to the node's arity.
    fn evaluate(&self, inputs: &[Self::Value], env: &E) -> Self::Value;
}

/// The position of an operand within its parent function's argument list.
pub type Slot = u32;

/// The directed graph type used to represent an expression.
///
/// Each node within the graph is either a `Function` or a `Terminal`. `Function`s are branch
/// nodes whose operands are reached via `Outgoing` edges. `Terminal`s are leaf nodes, often
/// either inputs to the expression or a constant value.
pub type DiGraph<N> = petgraph::graph::DiGraph<N, Slot, u32>;

/// The node index type used within the expr DiGraph type.
pub type NodeIndex = petgraph::graph::NodeIndex<u32>;

/// The index of the root node of every non-empty expression.
pub fn root() -> NodeIndex {
    NodeIndex::new(0)
}

/// Generate a random expression.
///
/// This function will randomly choose between using `gen::full_tree` and `gen::grow_tree`.
pub fn gen<R, N>(rng: &mut R, max_depth: u32) -> DiGraph<N>
where
    R: Rng,
    N: gen::Node,
{
    match rng.gen_range(0..2) {
        0 => gen::full_tree(rng, max_depth),
        _ => gen::grow_tree(rng, max_depth),
    }
}

/// The operands of the node at `nx` paired with their slot, in slot order.
pub fn operands<N>(expr: &DiGraph<N>, nx: NodeIndex) -> Vec<(Slot, NodeIndex)> {
    let mut operands = expr
        .edges_directed(nx, Outgoing)
        .map(|e| (*e.weight(), e.target()))
        .collect::<Vec<_>>();
    operands.sort_by_key(|&(slot, _)| slot);
    operands
}

/// The parent of the node at `nx`, or `None` for the root.
pub fn parent<N>(expr: &DiGraph<N>, nx: NodeIndex) -> Option<NodeIndex> {
    expr.neighbors_directed(nx, Incoming).next()
}

/// Evaluate the given expression, producing the value of its root.
///
/// Returns `None` if the expression is empty.
pub fn eval<N, E>(expr: &DiGraph<N>, env: &E) -> Option<N::Value>
where
    N: Evaluate<E>,
{
    fn eval_node<N, E>(expr: &DiGraph<N>, nx: NodeIndex, env: &E) -> N::Value
    where
        N: Evaluate<E>,
    {
        let inputs = operands(expr, nx)
            .into_iter()
            .map(|(_, operand)| eval_node(expr, operand, env))
            .collect::<Vec<_>>();
        expr[nx].evaluate(&inputs, env)
    }

    if expr.node_count() == 0 {
        return None;
    }
    Some(eval_node(expr, root(), env))
}

/// The number of levels in the expression. A lone terminal has a depth of `1`.
pub fn depth<N>(expr: &DiGraph<N>) -> u32 {
    if expr.node_count() == 0 {
        return 0;
    }
    let mut curr = vec![root()];
    let mut next = vec![];
    let mut depth = 0;
    while !curr.is_empty() {
        for a in curr.drain(..) {
            next.extend(expr.neighbors_directed(a, Outgoing));
        }
        mem::swap(&mut curr, &mut next);
        depth += 1;
    }
    depth
}

/// The level at which the node at `nx` sits. The root sits at level `1`.
pub fn node_depth<N>(expr: &DiGraph<N>, nx: NodeIndex) -> u32 {
    let mut depth = 1;
    let mut curr = nx;
    while let Some(p) = parent(expr, curr) {
        depth += 1;
        curr = p;
    }
    depth
}

/// Uniformly choose one node of the expression.
///
/// Panics if the expression is empty.
pub fn random_node<R, N>(rng: &mut R, expr: &DiGraph<N>) -> NodeIndex
where
    R: Rng,
{
    assert!(expr.node_count() > 0, "cannot choose a node from an empty expression");
    NodeIndex::new(rng.gen_range(0..expr.node_count()))
}

/// Copy the subtree at `src_root` into `dst` in breadth-first order, returning its new index.
///
/// The copied root is left unattached.
pub fn append_subtree<N>(dst: &mut DiGraph<N>, src: &DiGraph<N>, src_root: NodeIndex) -> NodeIndex
where
    N: Clone,
{
    let dst_root = dst.add_node(src[src_root].clone());
    let mut curr = vec![(src_root, dst_root)];
    let mut next = vec![];
    while !curr.is_empty() {
        for (a_src, a_dst) in curr.drain(..) {
            for (slot, b_src) in operands(src, a_src) {
                let b_dst = dst.add_node(src[b_src].clone());
                dst.add_edge(a_dst, b_dst, slot);
                next.push((b_src, b_dst));
            }
        }
        mem::swap(&mut curr, &mut next);
    }
    dst_root
}

/// Clone the subtree whose root is at the given node into a new directed graph.
///
/// The root of the subtree will be at index `0` within the new graph.
pub fn clone_subtree<N>(tree: &DiGraph<N>, subtree_root: NodeIndex) -> DiGraph<N>
where
    N: Clone,
{
    let mut subtree = DiGraph::with_capacity(tree.node_count(), tree.edge_count());
    append_subtree(&mut subtree, tree, subtree_root);
    subtree
}

/// Produce a copy of `tree` in which the node at `nx` (and all of its operands) is replaced by
/// the given subtree.
///
/// Panics if `subtree` is empty.
pub fn replace_subtree<N>(tree: &DiGraph<N>, nx: NodeIndex, subtree: &DiGraph<N>) -> DiGraph<N>
where
    N: Clone,
{
    assert!(subtree.node_count() > 0, "replacement subtree must not be empty");
    if nx == root() {
        return clone_subtree(subtree, root());
    }

    let mut new_tree = DiGraph::with_capacity(
        tree.node_count() + subtree.node_count(),
        tree.edge_count() + subtree.edge_count(),
    );
    let new_root = new_tree.add_node(tree[root()].clone());

    // Copy the tree level by level, grafting the subtree in place of `nx`.
    let mut curr = vec![(root(), new_root)];
    let mut next = vec![];
    while !curr.is_empty() {
        for (a_src, a_dst) in curr.drain(..) {
            for (slot, b_src) in operands(tree, a_src) {
                let b_dst = if b_src == nx {
                    append_subtree(&mut new_tree, subtree, root())
                } else {
                    let b_dst = new_tree.add_node(tree[b_src].clone());
                    next.push((b_src, b_dst));
                    b_dst
                };
                new_tree.add_edge(a_dst, b_dst, slot);
            }
        }
        mem::swap(&mut curr, &mut next);
    }

    new_tree
}

/// Trim the given tree to the given maximum depth.
///
/// Also replaces any nodes left on the final level with terminals if necessary (determined by
/// whether or not their arity is already `0`).
pub fn trim_tree_to_depth<R, N>(rng: &mut R, tree: &mut DiGraph<N>, max_depth: u32)
where
    R: Rng,
    N: gen::Arity + gen::Terminal + Clone,
{
    if max_depth == 0 {
        tree.clear();
    }
    if tree.node_count() == 0 || depth(tree) <= max_depth {
        return;
    }

    let mut trimmed: DiGraph<N> = DiGraph::with_capacity(tree.node_count(), tree.edge_count());
    if max_depth == 1 {
        trimmed.add_node(gen::Terminal::generate(rng));
        *tree = trimmed;
        return;
    }

    // Track which source node each trimmed node was copied from.
    let mut origin = FnvHashMap::default();
    let new_root = trimmed.add_node(tree[root()].clone());
    origin.insert(new_root, root());

    let mut curr = vec![new_root];
    let mut next = vec![];
    for level in 1..max_depth {
        let last_level = level + 1 == max_depth;
        for a_dst in curr.drain(..) {
            let a_src = origin[&a_dst];
            for (slot, b_src) in operands(tree, a_src) {
                let node = if last_level && tree[b_src].arity() > 0 {
                    gen::Terminal::generate(rng)
                } else {
                    tree[b_src].clone()
                };
                let b_dst = trimmed.add_node(node);
                trimmed.add_edge(a_dst, b_dst, slot);
                origin.insert(b_dst, b_src);
                next.push(b_dst);
            }
        }
        mem::swap(&mut curr, &mut next);
    }

    *tree = trimmed;
}

/// Functions for generating program graphs.
pub mod gen {
    use rand::Rng;
    use std::mem;
    use super::DiGraph;

    /// Node types that know their number of inputs / arguments.
    pub trait Arity {
        /// The number of arguments to the node.
        ///
        /// Function nodes will return 1 or more. Terminal nodes will return 0.
        fn arity(&self) -> u32;
    }

    /// Function types that may be generated for use within an expression.
    pub trait Function: Arity {
        /// Generate an instance of this Function type.
        fn generate<R>(rng: &mut R) -> Self where R: Rng;
    }

    /// Terminal types that may be generated for use within an expression.
    pub trait Terminal {
        /// Generate an instance of this Terminal type.
        fn generate<R>(rng: &mut R) -> Self where R: Rng;
    }

    /// Expression nodes that may be generated.
    pub trait Node: Function + Terminal {}

    impl<T> Node for T where T: Function + Terminal {}

    /// Generate an expression tree using the "full" approach.
    ///
    /// All branches will end with `Terminal`s at the given `max_depth`, while all other nodes
    /// will be `Function`s.
    ///
    /// The "root" or "output" of the expression will be at the node with index `0`.
    ///
    /// Nodes are generated in breadth-first order.
    pub fn full_tree<R, N>(rng: &mut R, depth: u32) -> DiGraph<N>
    where
        R: Rng,
        N: Node,
    {
        // The graph that will contain the tree.
        let mut g: DiGraph<N> = DiGraph::default();

        // Handle the low depth cases.
        match depth {
            0 => return g,
            1 => {
                g.add_node(Terminal::generate(rng));
                return g;
            }
            _ => ()
        }

        // Fill each depth level one at a time.
        let mut curr = vec![g.add_node(Function::generate(rng))];
        let mut next = vec![];
        for _ in 2..depth {
            for a in curr.drain(..) {
                for slot in 0..g[a].arity() {
                    let b = g.add_node(Function::generate(rng));
                    g.add_edge(a, b, slot);
                    next.push(b);
                }
            }
            mem::swap(&mut curr, &mut next);
        }

        // Generate the final depth of nodes.
        for a in curr.drain(..) {
            for slot in 0..g[a].arity() {
                let b = g.add_node(Terminal::generate(rng));
                g.add_edge(a, b, slot);
            }
        }

        g
    }

    /// Generate an expression tree using the "grow" approach.
    ///
    /// The tree will be "grown" by randomly generating functions and terminals for each node
    /// until the maximum depth is reached. The closer a node is to the maximum depth, the more
    /// likely it is to be a terminal. Nodes on the final level are always terminals.
    pub fn grow_tree<R, N>(rng: &mut R, depth: u32) -> DiGraph<N>
    where
        R: Rng,
        N: Node,
    {
        // The graph that will contain the tree.
        let mut g: DiGraph<N> = DiGraph::default();

        // Handle the low depth cases.
        match depth {
            0 => return g,
            1 => {
                g.add_node(Terminal::generate(rng));
                return g;
            }
            _ => ()
        }

        // Fill each depth level one at a time.
        let mut curr = vec![g.add_node(Function::generate(rng))];
        let mut next = vec![];
        for d in 1..depth {
            for a in curr.drain(..) {
                for slot in 0..g[a].arity() {
                    let (node, is_terminal) = match rng.gen_range(0..depth - d) {
                        0 => (Terminal::generate(rng), true),
                        _ => (Function::generate(rng), false),
                    };
                    let b = g.add_node(node);
                    g.add_edge(a, b, slot);
                    if !is_terminal {
                        next.push(b);
                    }
                }
            }
            mem::swap(&mut curr, &mut next);
        }

        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::gen::Arity;
    use crate::gp::Node;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn full_trees_reach_exactly_the_given_depth() {
        let mut rng = XorShiftRng::seed_from_u64(1);
        for depth in 1..6 {
            let expr: DiGraph<Node> = gen::full_tree(&mut rng, depth);
            assert_eq!(super::depth(&expr), depth);
            // Every function is binary, so a full tree is perfectly balanced.
            assert_eq!(expr.node_count(), (1 << depth) - 1);
        }
        let empty: DiGraph<Node> = gen::full_tree(&mut rng, 0);
        assert_eq!(empty.node_count(), 0);
        assert_eq!(super::depth(&empty), 0);
    }

    #[test]
    fn grown_trees_end_in_terminals() {
        let mut rng = XorShiftRng::seed_from_u64(2);
        for _ in 0..64 {
            let expr: DiGraph<Node> = gen::grow_tree(&mut rng, 5);
            assert!(super::depth(&expr) <= 5);
            for nx in expr.node_indices() {
                let operands = operands(&expr, nx);
                assert_eq!(operands.len() as u32, expr[nx].arity());
            }
        }
    }

    #[test]
    fn clone_subtree_roots_at_index_zero() {
        let mut rng = XorShiftRng::seed_from_u64(3);
        let expr: DiGraph<Node> = gen::full_tree(&mut rng, 4);
        let child = operands(&expr, root())[0].1;
        let subtree = clone_subtree(&expr, child);
        assert_eq!(subtree[root()], expr[child]);
        assert_eq!(depth(&subtree), 3);
        assert_eq!(parent(&subtree, root()), None);
        assert_eq!(eval(&subtree, &2.0f64), eval(&clone_subtree(&expr, child), &2.0f64));
    }

    #[test]
    fn eval_of_empty_expression_is_none() {
        let expr: DiGraph<Node> = DiGraph::default();
        assert_eq!(eval(&expr, &1.0f64), None);
    }
}
