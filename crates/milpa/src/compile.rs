//! Module for the creation of a [`Model`] from a milpa source program.
//!
//! The statement driver walks the ROOT statement list in order: `var`
//! statements allocate decision-variable tensors and bind them in the root
//! scope before any later statement runs, `obj` installs the objective, and
//! `constr` posts constraints, expanding a top-level `forall` into one
//! ground constraint per accepted index tuple.

use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::{
	ast::{Func, Node, NodeKind, Op, Origin},
	eval::{as_linear, eval},
	parse::ParseError,
	quantify::TupleStream,
	scope::Scope,
	IntVal, Model, ObjSense, Value, VarKind,
};

#[derive(Error, Debug)]
/// Errors that can occur when evaluating a milpa program into a [`Model`].
///
/// Every kind carries the source [`Origin`] of the offending node. All
/// errors are fatal: the evaluator surfaces them to the caller and any
/// partial additions to the model are abandoned with the model object.
pub enum CompilerError {
	#[error("cannot assign to {found} ({origin})")]
	/// The left side of a `var` statement is not a bare name.
	BadAssignmentTarget {
		/// Description of the node found in target position.
		found: String,
		/// Position of the target.
		origin: Origin,
	},
	#[error("invalid block element: {found} ({origin})")]
	/// A block item is neither a loop binding nor a predicate reducing to a
	/// boolean.
	BadBlockElement {
		/// Description of the offending block item.
		found: String,
		/// Position of the item.
		origin: Origin,
	},
	#[error("invalid tensor dimensions: {found} ({origin})")]
	/// An `ndarray` shape has rank outside 1..=3, or a shape or slice
	/// expression did not reduce to a usable size.
	DimensionError {
		/// Description of the offending shape.
		found: String,
		/// Position of the shape expression.
		origin: Origin,
	},
	#[error(transparent)]
	/// The source program could not be parsed.
	Syntax(#[from] ParseError),
	#[error("undefined identifier `{name}' ({origin})")]
	/// A name lookup failed at evaluation time.
	UndefinedIdentifier {
		/// The name that could not be resolved.
		name: String,
		/// Position of the identifier.
		origin: Origin,
	},
	#[error("unexpected statement: {found} ({origin})")]
	/// A top-level node is not a `var`, `obj`, or `constr` statement.
	UnexpectedStatement {
		/// Description of the node found in statement position.
		found: String,
		/// Position of the node.
		origin: Origin,
	},
	#[error("unexpected expression: {found} ({origin})")]
	/// An expression position holds a node the evaluator cannot interpret.
	UnexpectedToken {
		/// Description of what was found.
		found: String,
		/// Position of the expression.
		origin: Origin,
	},
	#[error("unknown function `{name}' ({origin})")]
	/// A function other than the quantifiers appears in expression
	/// position.
	UnknownFunction {
		/// The name of the function.
		name: String,
		/// Position of the function.
		origin: Origin,
	},
	#[error("unsupported variable expression: {found} ({origin})")]
	/// The right side of a `var` statement is not an `ndarray` call.
	UnsupportedVarExpression {
		/// Description of the node found on the right-hand side.
		found: String,
		/// Position of the node.
		origin: Origin,
	},
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
/// Statistical information about the evaluation of a program into a
/// [`Model`].
pub struct CompileStatistics {
	/// Number of ground constraints posted by `constr` statements.
	constraints_posted: u32,
	/// Number of decision variables allocated by `var` statements.
	variables_created: u32,
}

/// Builder for creating a model from a parsed program.
pub(crate) struct ModelBuilder {
	/// The incumbent model.
	model: Model,
	/// The root scope: the caller's bindings plus every allocated
	/// decision-variable tensor.
	root: Rc<Scope>,
	/// Statistics about the evaluation.
	stats: CompileStatistics,
}

/// Compile a milpa source program against the given externally bound
/// values.
///
/// Returns the populated [`Model`] and the resulting top-level scope: the
/// caller's bindings plus every decision-variable tensor allocated by a
/// `var` statement. The caller then drives the solver back end with the
/// model.
pub fn generate<Iter>(
	model_name: &str,
	source: &str,
	bindings: Iter,
) -> Result<(Model, Scope), CompilerError>
where
	Iter: IntoIterator<Item = (String, Value)>,
{
	let (model, scope, _) = Model::from_source(model_name, source, bindings)?;
	Ok((model, scope))
}

/// Strip any number of identity parentheses from an expression.
fn peel_parens(node: &Node) -> &Node {
	let mut node = node;
	while node.kind == NodeKind::Op(Op::Paren) && node.children.len() == 1 {
		node = &node.children[0];
	}
	node
}

impl CompileStatistics {
	/// Returns the number of ground constraints posted by `constr`
	/// statements.
	pub fn constraints_posted(&self) -> u32 {
		self.constraints_posted
	}

	/// Returns the number of decision variables allocated by `var`
	/// statements.
	pub fn variables_created(&self) -> u32 {
		self.variables_created
	}
}

impl ModelBuilder {
	/// Allocate a tensor of fresh decision variables with underscore-joined
	/// coordinate names, row-major, one name component per dimension.
	fn alloc_tensor(&mut self, name: &str, kind: VarKind, shape: &[IntVal]) -> Value {
		let (dim, rest) = match shape.split_first() {
			Some(split) => split,
			None => return Value::Seq(Vec::new()),
		};
		let mut items = Vec::with_capacity(*dim as usize);
		for i in 0..*dim {
			let element = format!("{name}_{i}");
			if rest.is_empty() {
				let var = self.model.new_named_var(element, kind);
				self.stats.variables_created += 1;
				items.push(Value::Var(var));
			} else {
				items.push(self.alloc_tensor(&element, kind, rest));
			}
		}
		Value::Seq(items)
	}

	/// Fetch child `idx` of a statement node.
	fn child(node: &Node, idx: usize) -> Result<&Node, CompilerError> {
		node.children
			.get(idx)
			.ok_or_else(|| CompilerError::UnexpectedStatement {
				found: format!("{} with a missing child", node.describe()),
				origin: node.origin.clone(),
			})
	}

	/// Evaluate a `constr` statement, posting every ground constraint it
	/// expands to.
	fn constr_statement(&mut self, node: &Node) -> Result<(), CompilerError> {
		let expr = Self::child(node, 0)?;
		let target = peel_parens(expr);
		let before = self.stats.constraints_posted;
		if target.kind == NodeKind::Func(Func::Forall) {
			let (body, blocks) =
				target
					.children
					.split_first()
					.ok_or_else(|| CompilerError::UnexpectedToken {
						found: "quantifier without a body".to_owned(),
						origin: target.origin.clone(),
					})?;
			let stream = TupleStream::new(blocks, Rc::clone(&self.root))?;
			for tuple in stream {
				let scope = tuple?;
				match eval(body, &scope)? {
					Value::Constraint(con) => {
						self.model += con;
						self.stats.constraints_posted += 1;
					}
					other => {
						return Err(CompilerError::UnexpectedToken {
							found: format!("forall body reduced to a {}", other.kind_name()),
							origin: body.origin.clone(),
						})
					}
				}
			}
		} else {
			match eval(expr, &self.root)? {
				Value::Constraint(con) => {
					self.model += con;
					self.stats.constraints_posted += 1;
				}
				other => {
					return Err(CompilerError::UnexpectedToken {
						found: format!("constraint reduced to a {}", other.kind_name()),
						origin: expr.origin.clone(),
					})
				}
			}
		}
		debug!(
			posted = self.stats.constraints_posted - before,
			"posted ground constraints"
		);
		Ok(())
	}

	/// Consume the builder, returning the model, the root scope, and the
	/// statistics.
	pub(crate) fn finish(self) -> (Model, Scope, CompileStatistics) {
		let root = Rc::try_unwrap(self.root).unwrap_or_else(|rc| (*rc).clone());
		(self.model, root, self.stats)
	}

	/// Create a builder with an empty model and the caller's root bindings.
	pub(crate) fn new<Iter>(model_name: &str, bindings: Iter) -> Self
	where
		Iter: IntoIterator<Item = (String, Value)>,
	{
		ModelBuilder {
			model: Model::new(model_name),
			root: Rc::new(Scope::root(bindings)),
			stats: CompileStatistics::default(),
		}
	}

	/// Evaluate an `obj` statement, installing the objective.
	fn obj_statement(&mut self, node: &Node, sense: ObjSense) -> Result<(), CompilerError> {
		let expr = Self::child(node, 0)?;
		let value = eval(expr, &self.root)?;
		let found = value.kind_name();
		let Some(linear) = as_linear(value) else {
			return Err(CompilerError::UnexpectedToken {
				found: format!("objective reduced to a {found}"),
				origin: expr.origin.clone(),
			});
		};
		self.model.set_objective(sense, linear);
		Ok(())
	}

	/// Run every statement of the program in order. Later statements see
	/// the bindings introduced by earlier ones.
	pub(crate) fn run(&mut self, root: &Node) -> Result<(), CompilerError> {
		if root.kind != NodeKind::Root {
			return Err(CompilerError::UnexpectedStatement {
				found: root.describe(),
				origin: root.origin.clone(),
			});
		}
		for statement in &root.children {
			self.statement(statement)?;
		}
		Ok(())
	}

	#[tracing::instrument(level = "debug", skip_all)]
	/// Dispatch one top-level statement.
	fn statement(&mut self, node: &Node) -> Result<(), CompilerError> {
		match node.kind {
			NodeKind::Constr => self.constr_statement(node),
			NodeKind::Obj(sense) => self.obj_statement(node, sense),
			NodeKind::Var(kind) => self.var_statement(node, kind),
			_ => Err(CompilerError::UnexpectedStatement {
				found: node.describe(),
				origin: node.origin.clone(),
			}),
		}
	}

	/// Evaluate a `var` statement: allocate the declared tensor and bind it
	/// under its name in the root scope.
	fn var_statement(&mut self, node: &Node, kind: VarKind) -> Result<(), CompilerError> {
		let lhs = Self::child(node, 0)?;
		let Some(name) = lhs.iden() else {
			return Err(CompilerError::BadAssignmentTarget {
				found: lhs.describe(),
				origin: lhs.origin.clone(),
			});
		};
		let rhs = Self::child(node, 1)?;
		if rhs.kind != NodeKind::Func(Func::Ndarray) {
			return Err(CompilerError::UnsupportedVarExpression {
				found: rhs.describe(),
				origin: rhs.origin.clone(),
			});
		}
		let mut shape = Vec::with_capacity(rhs.children.len());
		for dim_node in &rhs.children {
			match eval(dim_node, &self.root)? {
				Value::Int(v) if v >= 0 => shape.push(v),
				Value::Int(v) => {
					return Err(CompilerError::DimensionError {
						found: format!("negative size {v}"),
						origin: dim_node.origin.clone(),
					})
				}
				other => {
					return Err(CompilerError::DimensionError {
						found: format!("a {} shape entry", other.kind_name()),
						origin: dim_node.origin.clone(),
					})
				}
			}
		}
		if shape.is_empty() || shape.len() > 3 {
			return Err(CompilerError::DimensionError {
				found: format!("rank {}", shape.len()),
				origin: rhs.origin.clone(),
			});
		}
		let name = name.to_owned();
		let tensor = self.alloc_tensor(&name, kind, &shape);
		debug!(name = %name, kind = %kind, ?shape, "allocated decision tensor");
		Rc::make_mut(&mut self.root).insert(name, tensor);
		Ok(())
	}
}
