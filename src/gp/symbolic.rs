//! Arithmetic expressions over a single real input.
//!
//! 1. What is the "Terminal Set"?
//!
//! - The input variable `x`.
//! - Ephemeral integer constants within `CONSTANT_RANGE`.
//!
//! 2. What is the "Function Set"?
//!
//! - `+` `-` `*` and protected `/`.

use rand::Rng;
use std::fmt;
use std::ops::RangeInclusive;

use super::expr::{self, DiGraph, NodeIndex};
use super::expr::gen::{self, Arity};

/// The range from which ephemeral constants are drawn.
pub const CONSTANT_RANGE: RangeInclusive<i32> = -5..=5;

/// The value produced by protected division when the divisor is zero.
pub const PROTECTED_DIVISION_SENTINEL: f64 = 1.0;

/// The possible leaves of the expression.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Terminal {
    /// A constant value.
    Constant(f64),
    /// The single input variable.
    Input,
}

/// Binary arithmetic functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    /// Division returning `PROTECTED_DIVISION_SENTINEL` for a zero divisor.
    Div,
}

/// The node type used within the expression tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Node {
    Terminal(Terminal),
    Function(Operator),
}

/// An arithmetic expression tree.
///
/// The tree owns all of its nodes, so `clone` produces a fully independent deep copy.
#[derive(Clone, Debug)]
pub struct Tree {
    expr: DiGraph<Node>,
}

// Arity impls.

impl Arity for Operator {
    fn arity(&self) -> u32 {
        2
    }
}

impl Arity for Node {
    fn arity(&self) -> u32 {
        match *self {
            Node::Function(ref f) => f.arity(),
            Node::Terminal(_) => 0,
        }
    }
}

// Function impls.

impl gen::Function for Operator {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        match rng.gen_range(0..4) {
            0 => Operator::Add,
            1 => Operator::Sub,
            2 => Operator::Mul,
            _ => Operator::Div,
        }
    }
}

impl gen::Function for Node {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        Node::Function(<Operator as gen::Function>::generate(rng))
    }
}

// Terminal impls.

impl gen::Terminal for Terminal {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        if rng.gen_bool(0.5) {
            Terminal::Input
        } else {
            Terminal::Constant(f64::from(rng.gen_range(CONSTANT_RANGE)))
        }
    }
}

impl gen::Terminal for Node {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        Node::Terminal(<Terminal as gen::Terminal>::generate(rng))
    }
}

// Evaluate impl.

impl expr::Evaluate<f64> for Node {
    type Value = f64;
    fn evaluate(&self, inputs: &[f64], x: &f64) -> f64 {
        match *self {
            Node::Terminal(Terminal::Constant(c)) => c,
            Node::Terminal(Terminal::Input) => *x,
            Node::Function(op) => op.apply(inputs[0], inputs[1]),
        }
    }
}

impl Operator {
    /// Apply the operator to its two operands.
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match *self {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => if b == 0.0 { PROTECTED_DIVISION_SENTINEL } else { a / b },
        }
    }

    fn symbol(&self) -> &'static str {
        match *self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }
}

impl Tree {
    /// Generate a random tree no deeper than `max_depth` levels.
    ///
    /// Randomly uses either the "full" or "grow" method. A `max_depth` of `0` is treated as `1`.
    pub fn random<R>(rng: &mut R, max_depth: u32) -> Self
    where
        R: Rng,
    {
        Tree { expr: expr::gen(rng, max_depth.max(1)) }
    }

    /// A tree consisting only of the input variable.
    pub fn input() -> Self {
        Self::leaf(Terminal::Input)
    }

    /// A tree consisting only of a constant.
    pub fn constant(value: f64) -> Self {
        Self::leaf(Terminal::Constant(value))
    }

    fn leaf(terminal: Terminal) -> Self {
        let mut expr = DiGraph::default();
        expr.add_node(Node::Terminal(terminal));
        Tree { expr }
    }

    /// Apply `op` to the two given operand trees.
    pub fn function(op: Operator, lhs: &Tree, rhs: &Tree) -> Self {
        let mut expr = DiGraph::with_capacity(
            1 + lhs.node_count() + rhs.node_count(),
            lhs.node_count() + rhs.node_count(),
        );
        let root = expr.add_node(Node::Function(op));
        let a = expr::append_subtree(&mut expr, &lhs.expr, expr::root());
        expr.add_edge(root, a, 0);
        let b = expr::append_subtree(&mut expr, &rhs.expr, expr::root());
        expr.add_edge(root, b, 1);
        Tree { expr }
    }

    /// The underlying expression graph.
    pub fn expr(&self) -> &DiGraph<Node> {
        &self.expr
    }

    /// Evaluate the tree for the given input.
    pub fn evaluate(&self, x: f64) -> f64 {
        // A `Tree` is never empty.
        expr::eval(&self.expr, &x).unwrap_or(f64::NAN)
    }

    /// The number of levels within the tree.
    pub fn depth(&self) -> u32 {
        expr::depth(&self.expr)
    }

    pub fn node_count(&self) -> usize {
        self.expr.node_count()
    }

    /// The level of the given node. The root sits at level `1`.
    pub fn node_depth(&self, nx: NodeIndex) -> u32 {
        expr::node_depth(&self.expr, nx)
    }

    /// Uniformly choose a node to act as a crossover or mutation point.
    pub fn random_node<R>(&self, rng: &mut R) -> NodeIndex
    where
        R: Rng,
    {
        expr::random_node(rng, &self.expr)
    }

    /// Copy the subtree rooted at `nx` into a tree of its own.
    pub fn subtree(&self, nx: NodeIndex) -> Tree {
        Tree { expr: expr::clone_subtree(&self.expr, nx) }
    }

    /// A copy of this tree with the subtree at `nx` replaced by `subtree`.
    pub fn replace_subtree(&self, nx: NodeIndex, subtree: &Tree) -> Tree {
        Tree { expr: expr::replace_subtree(&self.expr, nx, &subtree.expr) }
    }

    /// Trim the tree so that it is no deeper than `max_depth` levels.
    pub fn trim_to_depth<R>(&mut self, rng: &mut R, max_depth: u32)
    where
        R: Rng,
    {
        expr::trim_tree_to_depth(rng, &mut self.expr, max_depth.max(1));
    }

    fn fmt_node(&self, nx: NodeIndex, f: &mut fmt::Formatter) -> fmt::Result {
        match self.expr[nx] {
            Node::Terminal(Terminal::Input) => write!(f, "x"),
            Node::Terminal(Terminal::Constant(c)) => write!(f, "{}", c),
            Node::Function(op) => {
                write!(f, "(")?;
                for (i, (_, operand)) in expr::operands(&self.expr, nx).into_iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.symbol())?;
                    }
                    self.fmt_node(operand, f)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_node(expr::root(), f)
    }
}
