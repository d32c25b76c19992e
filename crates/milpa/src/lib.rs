//! # Milpa - A Compiler Front End for a MILP Modelling Language
//!
//! Milpa is a small declarative language for expressing Mixed-Integer Linear
//! Programming (MILP) problems. A program declares decision-variable tensors,
//! one objective, and any number of constraints; quantified constraints
//! (`forall`) and summations (`sum`) range over index tuples drawn from
//! integer sets, closed ranges, and user-bound sequences, filtered by guard
//! predicates. This crate parses such a program and evaluates it against a
//! table of externally bound values, materialising the concrete model: every
//! quantified constraint is expanded to its ground instances and every
//! summation is aggregated into a single linear expression.
//!
//! The solver engine itself is out of scope: the [`Model`] type is a narrow
//! builder that owns the named variables, the accumulated constraints, and
//! the objective, ready to be handed to any MILP back end.

pub mod ast;
pub mod compile;
pub(crate) mod eval;
pub mod parse;
pub(crate) mod quantify;
pub mod scope;
#[cfg(test)]
pub(crate) mod tests;

use std::{
	fmt::{self, Display},
	iter::Sum,
	ops::{Add, AddAssign, Mul, Neg, Sub},
};

use index_vec::{define_index_type, IndexVec};
use itertools::Itertools;

pub use crate::{
	compile::{generate, CompileStatistics, CompilerError},
	parse::{parse, ParseError},
	scope::Scope,
};
use crate::{ast::Node, compile::ModelBuilder};

/// Type alias for a scalar coefficient or constant in a linear expression.
pub type FloatVal = f64;

/// Type alias for a parameter integer value.
pub type IntVal = i64;

define_index_type! {
	/// Reference to a decision variable allocated in a [`Model`].
	pub struct VarId = u32;
}

#[derive(Clone, Debug, Default, PartialEq)]
/// A linear expression: a sum of scalar-weighted decision variables plus a
/// constant offset.
///
/// This object is generally created by slicing a decision-variable tensor and
/// combining the handles with scalars using the `+`, `-`, and `*` operators.
/// Calling methods like [`Self::leq`] or [`Self::eq`] will create a
/// [`LinConstraint`] object that can be added to a [`Model`] object.
pub struct LinExpr {
	/// The scalar-weighted decision-variable terms, in insertion order.
	terms: Vec<(FloatVal, VarId)>,
	/// The constant offset of the expression.
	constant: FloatVal,
}

#[derive(Clone, Debug, PartialEq)]
/// A relational expression over linear expressions, normalised so that all
/// variable terms are on the left-hand side and the constant on the right.
///
/// This is the object submitted to the solver for every ground constraint.
pub struct LinConstraint {
	/// The variable terms on the left-hand side of the relation.
	terms: Vec<(FloatVal, VarId)>,
	/// The relational operator comparing the term sum to the right-hand side.
	operator: LinOperator,
	/// The constant right-hand side value.
	rhs: FloatVal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Possible operators that can be used in a linear constraint.
pub enum LinOperator {
	/// Term sum is equal to the constant.
	Equal,
	/// Term sum is greater than or equal to the constant.
	GreaterEq,
	/// Term sum is less than or equal to the constant.
	LessEq,
}

#[derive(Clone, Debug, Default)]
/// A concrete MILP model under construction: the named decision variables,
/// the accumulated constraints, and the (optional) objective.
///
/// This is the full extent of the solver interface assumed by the evaluator;
/// anything beyond adding variables, adding constraints, and installing the
/// objective belongs to the solver back end.
pub struct Model {
	/// The name of the model.
	name: String,
	/// The definitions of the decision variables that have been created.
	vars: IndexVec<VarId, VarDef>,
	/// The list of constraints that have been added to the model.
	constraints: Vec<LinConstraint>,
	/// The objective expression and its sense, if one has been installed.
	objective: Option<(ObjSense, LinExpr)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Optimisation direction of a model objective.
pub enum ObjSense {
	/// Maximise the objective expression.
	Maximize,
	/// Minimise the objective expression.
	Minimize,
}

#[derive(Clone, Debug, PartialEq)]
#[allow(
	variant_size_differences,
	reason = "`Seq` and `Constraint` are larger than the scalar variants"
)]
/// A value bound to a name in a [`Scope`] or produced by expression
/// evaluation.
///
/// There is no static type information in the source language; operator
/// implementations branch on the variant of their operands.
pub enum Value {
	/// A boolean, produced only by comparisons between pure scalars.
	Bool(bool),
	/// A ground constraint, produced by comparisons involving decision
	/// variables or linear expressions.
	Constraint(LinConstraint),
	/// A floating-point scalar (user input only; literals are integers).
	Float(FloatVal),
	/// An integer scalar.
	Int(IntVal),
	/// A linear expression over decision variables.
	Linear(LinExpr),
	/// A nested sequence of values (user input tensor or allocated
	/// decision-variable tensor, any rank).
	Seq(Vec<Value>),
	/// A single decision-variable handle.
	Var(VarId),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Definition of a decision variable in a [`Model`].
pub struct VarDef {
	/// The name the variable is reported under to the solver.
	name: String,
	/// The kind of the variable.
	kind: VarKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The declared kind of a decision variable.
pub enum VarKind {
	/// A 0/1 variable.
	Binary,
	/// A continuous variable.
	Continuous,
	/// An integer variable.
	Integer,
}

/// Aggregate an iterable of linear expressions into a single linear
/// expression.
///
/// This is the aggregation step used by `sum`; an empty iterable yields the
/// zero expression.
pub fn sum_of<Iter>(exprs: Iter) -> LinExpr
where
	Iter: IntoIterator<Item = LinExpr>,
{
	exprs.into_iter().sum()
}

/// Helper that renders a list of linear terms (and an optional trailing
/// constant) against the variable names of a [`Model`].
struct LinearDisplay<'a> {
	/// The model owning the variable names.
	model: &'a Model,
	/// The terms to render.
	terms: &'a [(FloatVal, VarId)],
	/// The constant to render after the terms.
	constant: FloatVal,
}

impl LinConstraint {
	/// The relational operator of the constraint.
	pub fn operator(&self) -> LinOperator {
		self.operator
	}

	/// The constant right-hand side of the constraint.
	pub fn rhs(&self) -> FloatVal {
		self.rhs
	}

	/// The variable terms on the left-hand side of the constraint.
	pub fn terms(&self) -> &[(FloatVal, VarId)] {
		&self.terms
	}
}

impl LinExpr {
	/// Internal constructor normalising a comparison of two linear
	/// expressions: variable terms of `rhs` move to the left negated, the
	/// constants fold into the right-hand side.
	fn compare(self, operator: LinOperator, rhs: LinExpr) -> LinConstraint {
		let mut terms = self.terms;
		terms.extend(rhs.terms.into_iter().map(|(c, v)| (-c, v)));
		LinConstraint {
			terms,
			operator,
			rhs: rhs.constant - self.constant,
		}
	}

	/// The constant offset of the expression.
	pub fn constant(&self) -> FloatVal {
		self.constant
	}

	/// Create a constraint that enforces that this expression is equal to
	/// `rhs`.
	pub fn eq(self, rhs: LinExpr) -> LinConstraint {
		self.compare(LinOperator::Equal, rhs)
	}

	/// Create a constraint that enforces that this expression is greater than
	/// or equal to `rhs`.
	pub fn geq(self, rhs: LinExpr) -> LinConstraint {
		self.compare(LinOperator::GreaterEq, rhs)
	}

	/// Whether the expression contains no variable terms.
	pub fn is_constant(&self) -> bool {
		self.terms.is_empty()
	}

	/// Create a constraint that enforces that this expression is less than or
	/// equal to `rhs`.
	pub fn leq(self, rhs: LinExpr) -> LinConstraint {
		self.compare(LinOperator::LessEq, rhs)
	}

	/// The scalar-weighted decision-variable terms of the expression.
	pub fn terms(&self) -> &[(FloatVal, VarId)] {
		&self.terms
	}
}

impl Add<LinExpr> for LinExpr {
	type Output = LinExpr;

	fn add(mut self, rhs: LinExpr) -> Self::Output {
		self.terms.extend(rhs.terms);
		self.constant += rhs.constant;
		self
	}
}

impl Add<FloatVal> for LinExpr {
	type Output = LinExpr;

	fn add(mut self, rhs: FloatVal) -> Self::Output {
		self.constant += rhs;
		self
	}
}

impl From<FloatVal> for LinExpr {
	fn from(value: FloatVal) -> Self {
		LinExpr {
			terms: Vec::new(),
			constant: value,
		}
	}
}

impl From<VarId> for LinExpr {
	fn from(value: VarId) -> Self {
		LinExpr {
			terms: vec![(1.0, value)],
			constant: 0.0,
		}
	}
}

impl Mul<FloatVal> for LinExpr {
	type Output = LinExpr;

	fn mul(mut self, rhs: FloatVal) -> Self::Output {
		for (c, _) in &mut self.terms {
			*c *= rhs;
		}
		self.constant *= rhs;
		self
	}
}

impl Neg for LinExpr {
	type Output = LinExpr;

	fn neg(self) -> Self::Output {
		self * -1.0
	}
}

impl Sub<LinExpr> for LinExpr {
	type Output = LinExpr;

	fn sub(self, rhs: LinExpr) -> Self::Output {
		self + -rhs
	}
}

impl Sub<FloatVal> for LinExpr {
	type Output = LinExpr;

	fn sub(self, rhs: FloatVal) -> Self::Output {
		self + -rhs
	}
}

impl Sum<LinExpr> for LinExpr {
	fn sum<I: Iterator<Item = LinExpr>>(iter: I) -> Self {
		iter.fold(LinExpr::default(), |acc, e| acc + e)
	}
}

impl Display for LinOperator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LinOperator::Equal => write!(f, "=="),
			LinOperator::GreaterEq => write!(f, ">="),
			LinOperator::LessEq => write!(f, "<="),
		}
	}
}

impl Model {
	/// Add a ground constraint to the model.
	///
	/// Note that users will generally use the `+=` operator.
	pub fn add_constraint(&mut self, constraint: LinConstraint) {
		self.constraints.push(constraint);
	}

	/// The constraints that have been added to the model, in posting order.
	pub fn constraints(&self) -> &[LinConstraint] {
		&self.constraints
	}

	/// Create a new [`Model`] by compiling a milpa source program against the
	/// given externally bound values.
	///
	/// Returns the populated model, the resulting top-level scope (user
	/// bindings plus every allocated decision-variable tensor), and
	/// statistics about the compilation.
	pub fn from_source<Iter>(
		name: &str,
		source: &str,
		bindings: Iter,
	) -> Result<(Model, Scope, CompileStatistics), CompilerError>
	where
		Iter: IntoIterator<Item = (String, Value)>,
	{
		let root = parse(source)?;
		Self::from_ast(name, &root, bindings)
	}

	/// Create a new [`Model`] by evaluating an already-parsed program.
	///
	/// The tree is walked by shared reference and is guaranteed to be
	/// structurally unchanged when this function returns.
	pub fn from_ast<Iter>(
		name: &str,
		root: &Node,
		bindings: Iter,
	) -> Result<(Model, Scope, CompileStatistics), CompilerError>
	where
		Iter: IntoIterator<Item = (String, Value)>,
	{
		let mut builder = ModelBuilder::new(name, bindings);
		builder.run(root)?;
		Ok(builder.finish())
	}

	/// The name of the model.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Create a new, empty model with the given name.
	pub fn new(name: impl Into<String>) -> Self {
		Model {
			name: name.into(),
			..Model::default()
		}
	}

	/// Create a new decision variable with the given name.
	pub fn new_named_var(&mut self, name: impl Into<String>, kind: VarKind) -> VarId {
		self.vars.push(VarDef {
			name: name.into(),
			kind,
		})
	}

	/// Create a new decision variable with a default name drawn from the
	/// monotonic variable counter.
	pub fn new_var(&mut self, kind: VarKind) -> VarId {
		let name = format!("v{}", self.vars.len());
		self.new_named_var(name, kind)
	}

	/// The objective expression and sense, if one has been installed.
	pub fn objective(&self) -> Option<&(ObjSense, LinExpr)> {
		self.objective.as_ref()
	}

	/// Install the objective expression with the given sense, replacing any
	/// previous objective.
	pub fn set_objective(&mut self, sense: ObjSense, expr: LinExpr) {
		self.objective = Some((sense, expr));
	}

	/// The definition of the given decision variable.
	pub fn var(&self, var: VarId) -> &VarDef {
		&self.vars[var]
	}

	/// The number of decision variables in the model.
	pub fn var_count(&self) -> usize {
		self.vars.len()
	}

	/// Iterator over the decision-variable definitions, in allocation order.
	pub fn vars(&self) -> impl Iterator<Item = &VarDef> {
		self.vars.iter()
	}
}

impl AddAssign<LinConstraint> for Model {
	fn add_assign(&mut self, constraint: LinConstraint) {
		self.add_constraint(constraint);
	}
}

impl Display for Model {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "model {}", self.name)?;
		for var in self.vars.iter() {
			writeln!(f, "  var {} {}", var.kind, var.name)?;
		}
		if let Some((sense, expr)) = &self.objective {
			writeln!(
				f,
				"  obj {} {}",
				sense,
				LinearDisplay {
					model: self,
					terms: &expr.terms,
					constant: expr.constant,
				}
			)?;
		}
		for con in &self.constraints {
			writeln!(
				f,
				"  constr {} {} {}",
				LinearDisplay {
					model: self,
					terms: &con.terms,
					constant: 0.0,
				},
				con.operator,
				con.rhs
			)?;
		}
		Ok(())
	}
}

impl Display for ObjSense {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ObjSense::Maximize => write!(f, "max"),
			ObjSense::Minimize => write!(f, "min"),
		}
	}
}

impl Value {
	/// A short human-readable description of the variant, used in
	/// diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Value::Bool(_) => "boolean",
			Value::Constraint(_) => "constraint",
			Value::Float(_) => "float",
			Value::Int(_) => "integer",
			Value::Linear(_) => "linear expression",
			Value::Seq(_) => "sequence",
			Value::Var(_) => "decision variable",
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<FloatVal> for Value {
	fn from(value: FloatVal) -> Self {
		Value::Float(value)
	}
}

impl From<IntVal> for Value {
	fn from(value: IntVal) -> Self {
		Value::Int(value)
	}
}

impl From<LinConstraint> for Value {
	fn from(value: LinConstraint) -> Self {
		Value::Constraint(value)
	}
}

impl From<LinExpr> for Value {
	fn from(value: LinExpr) -> Self {
		Value::Linear(value)
	}
}

impl From<VarId> for Value {
	fn from(value: VarId) -> Self {
		Value::Var(value)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(value: Vec<T>) -> Self {
		Value::Seq(value.into_iter().map_into().collect())
	}
}

impl VarDef {
	/// The kind of the variable.
	pub fn kind(&self) -> VarKind {
		self.kind
	}

	/// The name the variable is reported under to the solver.
	pub fn name(&self) -> &str {
		&self.name
	}
}

impl Display for VarKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			VarKind::Binary => write!(f, "bin"),
			VarKind::Continuous => write!(f, "cont"),
			VarKind::Integer => write!(f, "int"),
		}
	}
}

impl Display for LinearDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (c, v) in self.terms {
			let name = &self.model.vars[*v].name;
			if first {
				first = false;
				if *c == 1.0 {
					write!(f, "{name}")?;
				} else if *c == -1.0 {
					write!(f, "-{name}")?;
				} else {
					write!(f, "{c} {name}")?;
				}
			} else {
				let sign = if *c < 0.0 { '-' } else { '+' };
				let magnitude = c.abs();
				if magnitude == 1.0 {
					write!(f, " {sign} {name}")?;
				} else {
					write!(f, " {sign} {magnitude} {name}")?;
				}
			}
		}
		if first {
			write!(f, "{}", self.constant)?;
		} else if self.constant != 0.0 {
			let sign = if self.constant < 0.0 { '-' } else { '+' };
			write!(f, " {sign} {}", self.constant.abs())?;
		}
		Ok(())
	}
}
