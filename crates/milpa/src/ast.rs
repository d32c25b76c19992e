//! The abstract syntax tree consumed by the evaluator.
//!
//! Every node carries its [`Origin`] so that semantic errors can point back
//! at the offending source position. The tree is a plain owned structure
//! that the evaluator walks by shared reference; nothing in this crate
//! assumes the tree came from the bundled parser, so programs can also be
//! constructed programmatically.

use std::fmt::{self, Display};

use crate::{IntVal, ObjSense, VarKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The built-in functions of the language.
pub enum Func {
	/// Quantifier emitting one constraint per index tuple.
	Forall,
	/// Tensor allocation call, legal only as the right-hand side of a `var`
	/// statement.
	Ndarray,
	/// Quantifier aggregating one linear term per index tuple.
	Sum,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A node of the abstract syntax tree.
pub struct Node {
	/// The discriminator of the node.
	pub kind: NodeKind,
	/// The ordered child nodes (possibly empty).
	pub children: Vec<Node>,
	/// The source position the node was parsed from.
	pub origin: Origin,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(
	variant_size_differences,
	reason = "`Iden` carries its name inline"
)]
/// The discriminator of a [`Node`], one case per kind/tag pair of the
/// language.
pub enum NodeKind {
	/// A parenthesised quantifier block binding loop variables and carrying
	/// guard predicates.
	Block,
	/// A constraint statement; the single child is the constraint expression.
	Constr,
	/// A built-in function application.
	Func(Func),
	/// An identifier, resolved against the scope at evaluation time.
	Iden(String),
	/// An objective statement; the single child is the objective expression.
	Obj(ObjSense),
	/// An operator application.
	Op(Op),
	/// The statement list of a program.
	Root,
	/// An integer literal.
	Value(IntVal),
	/// A variable declaration; the children are the target identifier and
	/// the tensor allocation expression.
	Var(VarKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The operators of the expression language.
pub enum Op {
	/// Addition.
	Add,
	/// Division (numeric operands only).
	Div,
	/// Equality comparison.
	Eq,
	/// Greater-or-equal comparison.
	Ge,
	/// Strict greater-than comparison.
	Gt,
	/// Loop binding `name := set` inside a quantifier block.
	Iter,
	/// Less-or-equal comparison.
	Le,
	/// Strict less-than comparison.
	Lt,
	/// Multiplication.
	Mul,
	/// Inequality comparison.
	Ne,
	/// Parenthesised expression (identity).
	Paren,
	/// Closed integer range `a : b`, inclusive on both ends.
	Range,
	/// Element lookup `a[i][j][k]` into a nested sequence.
	Slice,
	/// Subtraction.
	Sub,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
/// Source position record attached to every [`Node`] for diagnostics.
pub struct Origin {
	/// 1-based source line number.
	pub line: usize,
	/// 1-based column of the first token of the node.
	pub column: usize,
	/// The full text of the source line.
	pub line_text: String,
}

impl Display for Func {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Func::Forall => write!(f, "forall"),
			Func::Ndarray => write!(f, "ndarray"),
			Func::Sum => write!(f, "sum"),
		}
	}
}

impl Node {
	/// Create a new node.
	pub fn new(kind: NodeKind, children: Vec<Node>, origin: Origin) -> Self {
		Node {
			kind,
			children,
			origin,
		}
	}

	/// A short human-readable description of the node, used in diagnostics.
	pub fn describe(&self) -> String {
		match &self.kind {
			NodeKind::Block => "block".to_owned(),
			NodeKind::Constr => "CONSTR statement".to_owned(),
			NodeKind::Func(func) => format!("function `{func}'"),
			NodeKind::Iden(name) => format!("identifier `{name}'"),
			NodeKind::Obj(sense) => format!("OBJ {sense} statement"),
			NodeKind::Op(op) => format!("operator `{op}'"),
			NodeKind::Root => "statement list".to_owned(),
			NodeKind::Value(value) => format!("value {value}"),
			NodeKind::Var(kind) => format!("VAR {kind} statement"),
		}
	}

	/// The name of the identifier this node holds, if it is an identifier.
	pub fn iden(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Iden(name) => Some(name),
			_ => None,
		}
	}
}

impl Op {
	/// Whether the operator is one of the six comparison operators.
	pub fn is_comparison(self) -> bool {
		matches!(self, Op::Eq | Op::Ge | Op::Gt | Op::Le | Op::Lt | Op::Ne)
	}
}

impl Display for Op {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Op::Add => "+",
			Op::Div => "/",
			Op::Eq => "==",
			Op::Ge => ">=",
			Op::Gt => ">",
			Op::Iter => ":=",
			Op::Le => "<=",
			Op::Lt => "<",
			Op::Mul => "*",
			Op::Ne => "!=",
			Op::Paren => "()",
			Op::Range => ":",
			Op::Slice => "[]",
			Op::Sub => "-",
		};
		write!(f, "{s}")
	}
}

impl Display for Origin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "line {}, column {}", self.line, self.column)
	}
}
