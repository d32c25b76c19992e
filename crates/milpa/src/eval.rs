//! The expression evaluator.
//!
//! Expressions are evaluated under a [`Scope`] and produce a [`Value`]:
//! a scalar, a linear expression over decision variables, a boolean (from a
//! comparison of pure scalars), or a ground constraint (from a comparison
//! involving decision variables). There is no static type information, so
//! every operator dispatches on the variants of its operands; operands are
//! evaluated left to right so that errors surface in source order.

use std::rc::Rc;

use itertools::process_results;

use crate::{
	ast::{Func, Node, NodeKind, Op},
	compile::CompilerError,
	quantify::TupleStream,
	scope::Scope,
	sum_of, FloatVal, LinExpr, Value,
};

/// Evaluate an expression node under the given scope.
pub(crate) fn eval(node: &Node, scope: &Rc<Scope>) -> Result<Value, CompilerError> {
	match &node.kind {
		NodeKind::Value(value) => Ok(Value::Int(*value)),
		NodeKind::Iden(name) => {
			scope
				.lookup(name)
				.cloned()
				.ok_or_else(|| CompilerError::UndefinedIdentifier {
					name: name.clone(),
					origin: node.origin.clone(),
				})
		}
		NodeKind::Op(Op::Paren) => eval(child(node, 0)?, scope),
		NodeKind::Op(op @ (Op::Add | Op::Sub | Op::Mul | Op::Div)) => {
			let lhs = eval(child(node, 0)?, scope)?;
			let rhs = eval(child(node, 1)?, scope)?;
			arith(*op, lhs, rhs, node)
		}
		NodeKind::Op(op) if op.is_comparison() => {
			let lhs = eval(child(node, 0)?, scope)?;
			let rhs = eval(child(node, 1)?, scope)?;
			compare(*op, lhs, rhs, node)
		}
		NodeKind::Op(Op::Slice) => slice(node, scope),
		NodeKind::Func(Func::Sum) => sum(node, scope),
		NodeKind::Func(Func::Forall) => Err(CompilerError::UnexpectedToken {
			found: "`forall' outside a constraint statement".to_owned(),
			origin: node.origin.clone(),
		}),
		NodeKind::Func(Func::Ndarray) => Err(CompilerError::UnknownFunction {
			name: "ndarray".to_owned(),
			origin: node.origin.clone(),
		}),
		_ => Err(CompilerError::UnexpectedToken {
			found: node.describe(),
			origin: node.origin.clone(),
		}),
	}
}

/// Convert an evaluated value into a linear expression, if its variant
/// allows it.
pub(crate) fn as_linear(value: Value) -> Option<LinExpr> {
	match value {
		Value::Float(v) => Some(LinExpr::from(v)),
		Value::Int(v) => Some(LinExpr::from(v as FloatVal)),
		Value::Linear(expr) => Some(expr),
		Value::Var(var) => Some(LinExpr::from(var)),
		_ => None,
	}
}

/// Read a value as a pure numeric scalar, if its variant allows it.
fn as_scalar(value: &Value) -> Option<FloatVal> {
	match value {
		Value::Float(v) => Some(*v),
		Value::Int(v) => Some(*v as FloatVal),
		_ => None,
	}
}

/// Apply an arithmetic operator, promoting to a linear expression when
/// either operand involves decision variables.
fn arith(op: Op, lhs: Value, rhs: Value, node: &Node) -> Result<Value, CompilerError> {
	// Pure scalar arithmetic stays scalar; integers keep exact arithmetic
	// except for division, which follows true division.
	if let (Some(a), Some(b)) = (as_scalar(&lhs), as_scalar(&rhs)) {
		if let (Value::Int(x), Value::Int(y)) = (&lhs, &rhs) {
			match op {
				Op::Add => return Ok(Value::Int(x + y)),
				Op::Sub => return Ok(Value::Int(x - y)),
				Op::Mul => return Ok(Value::Int(x * y)),
				Op::Div => {}
				_ => unreachable!(),
			}
		}
		return match op {
			Op::Add => Ok(Value::Float(a + b)),
			Op::Sub => Ok(Value::Float(a - b)),
			Op::Mul => Ok(Value::Float(a * b)),
			Op::Div if b == 0.0 => Err(CompilerError::UnexpectedToken {
				found: "division by zero".to_owned(),
				origin: node.origin.clone(),
			}),
			Op::Div => Ok(Value::Float(a / b)),
			_ => unreachable!(),
		};
	}

	let lhs_scalar = as_scalar(&lhs);
	let rhs_scalar = as_scalar(&rhs);
	let (lhs_kind, rhs_kind) = (lhs.kind_name(), rhs.kind_name());
	match op {
		Op::Add | Op::Sub => match (as_linear(lhs), as_linear(rhs)) {
			(Some(l), Some(r)) => Ok(Value::Linear(if op == Op::Add { l + r } else { l - r })),
			_ => Err(op_err(op, lhs_kind, rhs_kind, node)),
		},
		Op::Mul => {
			// Exactly one side may carry decision variables.
			if let Some(scale) = lhs_scalar {
				match as_linear(rhs) {
					Some(r) => Ok(Value::Linear(r * scale)),
					None => Err(op_err(op, lhs_kind, rhs_kind, node)),
				}
			} else if let Some(scale) = rhs_scalar {
				match as_linear(lhs) {
					Some(l) => Ok(Value::Linear(l * scale)),
					None => Err(op_err(op, lhs_kind, rhs_kind, node)),
				}
			} else {
				Err(op_err(op, lhs_kind, rhs_kind, node))
			}
		}
		// No division on linear operands.
		Op::Div => Err(op_err(op, lhs_kind, rhs_kind, node)),
		_ => unreachable!(),
	}
}

/// Fetch child `idx` of an operator or function node.
fn child(node: &Node, idx: usize) -> Result<&Node, CompilerError> {
	node.children.get(idx).ok_or_else(|| CompilerError::UnexpectedToken {
		found: format!("{} with a missing operand", node.describe()),
		origin: node.origin.clone(),
	})
}

/// Apply a comparison operator.
///
/// Two pure scalars reduce to a boolean; any operand carrying decision
/// variables turns `==`, `<=`, and `>=` into a ground constraint, while the
/// remaining comparison operators have no linear counterpart.
fn compare(op: Op, lhs: Value, rhs: Value, node: &Node) -> Result<Value, CompilerError> {
	if let (Some(a), Some(b)) = (as_scalar(&lhs), as_scalar(&rhs)) {
		let holds = if let (Value::Int(x), Value::Int(y)) = (&lhs, &rhs) {
			match op {
				Op::Eq => x == y,
				Op::Ge => x >= y,
				Op::Gt => x > y,
				Op::Le => x <= y,
				Op::Lt => x < y,
				Op::Ne => x != y,
				_ => unreachable!(),
			}
		} else {
			match op {
				Op::Eq => a == b,
				Op::Ge => a >= b,
				Op::Gt => a > b,
				Op::Le => a <= b,
				Op::Lt => a < b,
				Op::Ne => a != b,
				_ => unreachable!(),
			}
		};
		return Ok(Value::Bool(holds));
	}

	let (lhs_kind, rhs_kind) = (lhs.kind_name(), rhs.kind_name());
	match (as_linear(lhs), as_linear(rhs)) {
		(Some(l), Some(r)) => match op {
			Op::Eq => Ok(Value::Constraint(l.eq(r))),
			Op::Ge => Ok(Value::Constraint(l.geq(r))),
			Op::Le => Ok(Value::Constraint(l.leq(r))),
			Op::Gt | Op::Lt | Op::Ne => Err(CompilerError::UnexpectedToken {
				found: format!("operator `{op}' on a linear expression"),
				origin: node.origin.clone(),
			}),
			_ => unreachable!(),
		},
		_ => Err(op_err(op, lhs_kind, rhs_kind, node)),
	}
}

/// Construct the semantic error for an operator applied to operand kinds it
/// does not support.
fn op_err(op: Op, lhs: &str, rhs: &str, node: &Node) -> CompilerError {
	CompilerError::UnexpectedToken {
		found: format!("operator `{op}' applied to a {lhs} and a {rhs}"),
		origin: node.origin.clone(),
	}
}

/// Evaluate an element lookup `a[i][j][k]` into a nested sequence.
fn slice(node: &Node, scope: &Rc<Scope>) -> Result<Value, CompilerError> {
	let base = child(node, 0)?;
	let Some(name) = base.iden() else {
		return Err(CompilerError::UnexpectedToken {
			found: format!("slice into {}", base.describe()),
			origin: base.origin.clone(),
		});
	};
	let indices = &node.children[1..];
	if indices.is_empty() || indices.len() > 3 {
		return Err(CompilerError::DimensionError {
			found: format!("slice of rank {}", indices.len()),
			origin: node.origin.clone(),
		});
	}
	let mut current = scope
		.lookup(name)
		.ok_or_else(|| CompilerError::UndefinedIdentifier {
			name: name.to_owned(),
			origin: base.origin.clone(),
		})?;
	for idx_node in indices {
		let idx = index_value(idx_node, scope)?;
		let Value::Seq(items) = current else {
			return Err(CompilerError::UnexpectedToken {
				found: format!("slice into a {}", current.kind_name()),
				origin: idx_node.origin.clone(),
			});
		};
		current = items
			.get(idx)
			.ok_or_else(|| CompilerError::UnexpectedToken {
				found: format!("index {idx} beyond a sequence of length {}", items.len()),
				origin: idx_node.origin.clone(),
			})?;
	}
	Ok(current.clone())
}

/// Evaluate a slice index expression to a non-negative integer.
fn index_value(node: &Node, scope: &Rc<Scope>) -> Result<usize, CompilerError> {
	match eval(node, scope)? {
		Value::Int(v) if v >= 0 => Ok(v as usize),
		Value::Int(v) => Err(CompilerError::UnexpectedToken {
			found: format!("negative index {v}"),
			origin: node.origin.clone(),
		}),
		other => Err(CompilerError::UnexpectedToken {
			found: format!("{} as a sequence index", other.kind_name()),
			origin: node.origin.clone(),
		}),
	}
}

/// Evaluate a `sum` quantifier: compose its blocks, evaluate the body once
/// per accepted tuple, and aggregate the stream into one linear expression.
fn sum(node: &Node, scope: &Rc<Scope>) -> Result<Value, CompilerError> {
	let (body, blocks) =
		node.children
			.split_first()
			.ok_or_else(|| CompilerError::UnexpectedToken {
				found: "quantifier without a body".to_owned(),
				origin: node.origin.clone(),
			})?;
	let stream = TupleStream::new(blocks, Rc::clone(scope))?;
	let terms = stream.map(|tuple| {
		let scope = tuple?;
		let value = eval(body, &scope)?;
		let found = value.kind_name();
		as_linear(value).ok_or_else(|| CompilerError::UnexpectedToken {
			found: format!("sum body reduced to a {found}"),
			origin: body.origin.clone(),
		})
	});
	let total = process_results(terms, |iter| sum_of(iter))?;
	Ok(Value::Linear(total))
}
