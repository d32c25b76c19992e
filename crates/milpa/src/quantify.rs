//! Lazy enumeration of quantifier index tuples.
//!
//! A quantifier owns one or more blocks. Loop bindings *within* a block are
//! advanced in lockstep (parallel composition, ending with the shortest
//! stream), while separate blocks compose as nested loops: the tuples of a
//! later block are enumerated fresh for every tuple of an earlier one, under
//! the extended scope, so later set expressions and guard predicates can
//! reference earlier bindings. Everything is pull-driven; no tuple set is
//! ever materialised.

use std::{
	ops::{Range, RangeInclusive},
	rc::Rc,
	vec,
};

use crate::{
	ast::{Node, NodeKind, Op},
	compile::CompilerError,
	eval::eval,
	scope::Scope,
	IntVal, Value,
};

#[derive(Debug)]
/// One quantifier block as a lazy stream of extension scopes, one per
/// accepted tuple.
pub(crate) struct BlockTuples<'a> {
	/// Loop-variable names of the block, in declaration order.
	names: Vec<&'a str>,
	/// One value stream per loop variable, advanced in lockstep.
	iters: Vec<SetIter>,
	/// The guard predicate expressions of the block.
	guards: Vec<&'a Node>,
	/// The scope the block extends.
	base: Rc<Scope>,
	/// Whether an iter-less block has already yielded its single empty
	/// tuple.
	spent: bool,
}

#[derive(Debug)]
/// The evaluated form of a set expression: a lazy stream of index values.
pub(crate) enum SetIter {
	/// The closed integer range `[a, b]` of a range expression; empty when
	/// `a > b`.
	Closed(RangeInclusive<IntVal>),
	/// The half-open integer set `[0, n)` of an integer-valued set
	/// expression.
	Count(Range<IntVal>),
	/// The elements of a user-bound sequence.
	Items(vec::IntoIter<Value>),
}

#[derive(Debug)]
/// The Cartesian composition of a quantifier's blocks: a lazy, pull-driven
/// stream of fully extended scopes.
pub(crate) struct TupleStream<'a> {
	/// The quantifier's blocks, outermost first.
	blocks: &'a [Node],
	/// The active per-block tuple streams; entry `i + 1` is rebuilt under
	/// every tuple scope yielded by entry `i`.
	stack: Vec<BlockTuples<'a>>,
}

/// Evaluate a set expression in the given scope.
///
/// A range expression becomes the closed range `[a, b]`; any other
/// expression must reduce to an integer `n` (the half-open set `[0, n)`) or
/// to a user-bound sequence.
pub(crate) fn set_iter(expr: &Node, scope: &Rc<Scope>) -> Result<SetIter, CompilerError> {
	if expr.kind == NodeKind::Op(Op::Range) {
		let a = range_end(expr, 0, scope)?;
		let b = range_end(expr, 1, scope)?;
		Ok(SetIter::Closed(a..=b))
	} else {
		match eval(expr, scope)? {
			Value::Int(n) => Ok(SetIter::Count(0..n)),
			Value::Seq(items) => Ok(SetIter::Items(items.into_iter())),
			other => Err(CompilerError::UnexpectedToken {
				found: format!("{} as an index set", other.kind_name()),
				origin: expr.origin.clone(),
			}),
		}
	}
}

/// Evaluate one end of a closed range expression to an integer.
fn range_end(range: &Node, idx: usize, scope: &Rc<Scope>) -> Result<IntVal, CompilerError> {
	let Some(node) = range.children.get(idx) else {
		return Err(CompilerError::UnexpectedToken {
			found: "range with a missing end".to_owned(),
			origin: range.origin.clone(),
		});
	};
	match eval(node, scope)? {
		Value::Int(v) => Ok(v),
		other => Err(CompilerError::UnexpectedToken {
			found: format!("{} as a range end", other.kind_name()),
			origin: node.origin.clone(),
		}),
	}
}

impl<'a> BlockTuples<'a> {
	/// Create the tuple stream of one block over the given base scope.
	///
	/// All iter set expressions are evaluated once, against the base scope;
	/// guard predicates are kept unevaluated and re-checked per tuple.
	pub(crate) fn new(block: &'a Node, base: Rc<Scope>) -> Result<Self, CompilerError> {
		if block.kind != NodeKind::Block {
			return Err(CompilerError::BadBlockElement {
				found: block.describe(),
				origin: block.origin.clone(),
			});
		}
		let mut names = Vec::new();
		let mut iters = Vec::new();
		let mut guards = Vec::new();
		for item in &block.children {
			if item.kind == NodeKind::Op(Op::Iter) {
				let [name_node, set_node] = item.children.as_slice() else {
					return Err(CompilerError::BadBlockElement {
						found: "malformed loop binding".to_owned(),
						origin: item.origin.clone(),
					});
				};
				let Some(name) = name_node.iden() else {
					return Err(CompilerError::BadBlockElement {
						found: name_node.describe(),
						origin: name_node.origin.clone(),
					});
				};
				names.push(name);
				iters.push(set_iter(set_node, &base)?);
			} else {
				guards.push(item);
			}
		}
		Ok(BlockTuples {
			names,
			iters,
			guards,
			base,
			spent: false,
		})
	}

	/// Evaluate the guard conjunction under an extended scope.
	///
	/// Every guard must reduce to a boolean; the conjunction short-circuits
	/// on the first `false`.
	fn guards_hold(&self, scope: &Rc<Scope>) -> Result<bool, CompilerError> {
		for guard in &self.guards {
			match eval(guard, scope)? {
				Value::Bool(true) => {}
				Value::Bool(false) => return Ok(false),
				other => {
					return Err(CompilerError::BadBlockElement {
						found: format!("predicate reduced to a {}", other.kind_name()),
						origin: guard.origin.clone(),
					})
				}
			}
		}
		Ok(true)
	}
}

impl Iterator for BlockTuples<'_> {
	type Item = Result<Rc<Scope>, CompilerError>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let bindings: Vec<(String, Value)> = if self.names.is_empty() {
				// A block without iters yields one empty tuple, still
				// subject to the guards.
				if self.spent {
					return None;
				}
				self.spent = true;
				Vec::new()
			} else {
				let mut tuple = Vec::with_capacity(self.names.len());
				for (name, iter) in self.names.iter().zip(&mut self.iters) {
					match iter.next() {
						Some(value) => tuple.push(((*name).to_owned(), value)),
						None => return None,
					}
				}
				tuple
			};
			let scope = Rc::new(Scope::extend(&self.base, bindings));
			match self.guards_hold(&scope) {
				Ok(true) => return Some(Ok(scope)),
				Ok(false) => {}
				Err(err) => return Some(Err(err)),
			}
		}
	}
}

impl Iterator for SetIter {
	type Item = Value;

	fn next(&mut self) -> Option<Self::Item> {
		match self {
			SetIter::Closed(range) => range.next().map(Value::Int),
			SetIter::Count(range) => range.next().map(Value::Int),
			SetIter::Items(items) => items.next(),
		}
	}
}

impl<'a> TupleStream<'a> {
	/// Create the composed tuple stream of a quantifier's blocks over the
	/// given base scope.
	pub(crate) fn new(blocks: &'a [Node], base: Rc<Scope>) -> Result<Self, CompilerError> {
		let mut stack = Vec::with_capacity(blocks.len());
		if let Some(first) = blocks.first() {
			stack.push(BlockTuples::new(first, base)?);
		}
		Ok(TupleStream { blocks, stack })
	}
}

impl Iterator for TupleStream<'_> {
	type Item = Result<Rc<Scope>, CompilerError>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let depth = self.stack.len();
			let top = self.stack.last_mut()?;
			match top.next() {
				Some(Ok(scope)) => {
					if depth == self.blocks.len() {
						return Some(Ok(scope));
					}
					// Descend: the next block is enumerated fresh under the
					// scope extended by this tuple.
					match BlockTuples::new(&self.blocks[depth], scope) {
						Ok(tuples) => self.stack.push(tuples),
						Err(err) => return Some(Err(err)),
					}
				}
				Some(Err(err)) => return Some(Err(err)),
				None => {
					let _ = self.stack.pop();
					if self.stack.is_empty() {
						return None;
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use crate::{
		ast::{Func, Node, NodeKind},
		compile::CompilerError,
		parse::parse,
		quantify::TupleStream,
		scope::Scope,
		IntVal, Value,
	};

	/// Extract the quantifier node of `constr forall …` source text.
	fn forall_node(source: &str) -> Node {
		let root = parse(source).unwrap();
		let stmt = root.children.into_iter().next().unwrap();
		let func = stmt.children.into_iter().next().unwrap();
		assert_eq!(func.kind, NodeKind::Func(Func::Forall));
		func
	}

	/// Run the composed tuple stream of the quantifier in `source` and
	/// project each accepted tuple onto `names`.
	fn tuples(
		source: &str,
		bindings: Vec<(String, Value)>,
		names: &[&str],
	) -> Result<Vec<Vec<IntVal>>, CompilerError> {
		let func = forall_node(source);
		let scope = Rc::new(Scope::root(bindings));
		let stream = TupleStream::new(&func.children[1..], scope)?;
		stream
			.map(|tuple| {
				let scope = tuple?;
				Ok(names
					.iter()
					.map(|name| match scope.lookup(name) {
						Some(Value::Int(v)) => *v,
						other => panic!("unexpected binding for {name}: {other:?}"),
					})
					.collect())
			})
			.collect()
	}

	#[test]
	fn test_block_iters_zip_in_lockstep() {
		let got = tuples(
			"constr forall (i := a, j := b) x",
			vec![
				("a".to_owned(), Value::Int(3)),
				("b".to_owned(), Value::Int(4)),
			],
			&["i", "j"],
		)
		.unwrap();
		assert_eq!(got, vec![vec![0, 0], vec![1, 1], vec![2, 2]]);
	}

	#[test]
	fn test_blocks_compose_as_nested_loops() {
		let got = tuples(
			"constr forall (i := a) (j := b) x",
			vec![
				("a".to_owned(), Value::Int(3)),
				("b".to_owned(), Value::Int(2)),
			],
			&["i", "j"],
		)
		.unwrap();
		assert_eq!(got.len(), 6);
		assert_eq!(got[0], vec![0, 0]);
		assert_eq!(got[1], vec![0, 1]);
		assert_eq!(got[5], vec![2, 1]);
	}

	#[test]
	fn test_closed_range_is_inclusive_and_ascending() {
		let got = tuples("constr forall (k := 2 : 4) x", Vec::new(), &["k"]).unwrap();
		assert_eq!(got, vec![vec![2], vec![3], vec![4]]);
	}

	#[test]
	fn test_empty_range_when_start_exceeds_end() {
		let got = tuples("constr forall (k := 4 : 2) x", Vec::new(), &["k"]).unwrap();
		assert!(got.is_empty());
	}

	#[test]
	fn test_guard_must_reduce_to_boolean() {
		let err = tuples(
			"constr forall (i := n, i + 1) x",
			vec![("n".to_owned(), Value::Int(2))],
			&["i"],
		)
		.unwrap_err();
		assert!(matches!(err, CompilerError::BadBlockElement { .. }));
	}

	#[test]
	fn test_later_block_sees_earlier_bindings() {
		let got = tuples("constr forall (i := 2 : 3) (j := 0 : i) x", Vec::new(), &["i", "j"])
			.unwrap();
		// i = 2 contributes 3 tuples, i = 3 contributes 4.
		assert_eq!(got.len(), 7);
		assert_eq!(got[2], vec![2, 2]);
		assert_eq!(got[6], vec![3, 3]);
	}

	#[test]
	fn test_non_integer_range_end_is_an_error() {
		let err = tuples(
			"constr forall (k := 0 : f) x",
			vec![("f".to_owned(), Value::Float(2.5))],
			&["k"],
		)
		.unwrap_err();
		assert!(matches!(err, CompilerError::UnexpectedToken { .. }));
	}

	#[test]
	fn test_non_set_identifier_is_an_error() {
		let err = tuples(
			"constr forall (i := f) x",
			vec![("f".to_owned(), Value::Float(2.5))],
			&["i"],
		)
		.unwrap_err();
		assert!(matches!(err, CompilerError::UnexpectedToken { .. }));
	}

	#[test]
	fn test_predicate_order_does_not_change_tuples() {
		let bindings = || vec![("n".to_owned(), Value::Int(3))];
		let left = tuples(
			"constr forall (i := n) (j := n, i != j, j != 0) x",
			bindings(),
			&["i", "j"],
		)
		.unwrap();
		let right = tuples(
			"constr forall (i := n) (j := n, j != 0, i != j) x",
			bindings(),
			&["i", "j"],
		)
		.unwrap();
		assert_eq!(left, right);
		assert_eq!(left.len(), 4);
	}

	#[test]
	fn test_sequence_bound_set_yields_elements() {
		let got = tuples(
			"constr forall (i := w) x",
			vec![("w".to_owned(), Value::from(vec![5_i64, 7]))],
			&["i"],
		)
		.unwrap();
		assert_eq!(got, vec![vec![5], vec![7]]);
	}
}
