//! Layered immutable binding of names to values.
//!
//! A [`Scope`] is a chain of layers: the root layer holds the caller's
//! bindings plus every decision-variable tensor allocated by a `var`
//! statement, and each quantifier tuple adds a transient overlay on top.
//! Child layers never mutate their parents; the bindings of an overlay
//! evaporate when its evaluation returns and the layer is dropped.

use std::{collections::HashMap, rc::Rc};

use crate::Value;

#[derive(Clone, Debug, Default)]
/// A mapping from identifiers to values, layered over an optional parent
/// scope.
pub struct Scope {
	/// The enclosing scope, if this is an overlay layer.
	parent: Option<Rc<Scope>>,
	/// The bindings of this layer.
	bindings: HashMap<String, Value>,
}

impl Scope {
	/// Iterator over the bindings of this layer (not including any parent
	/// layers), in no particular order.
	pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.bindings.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Create a child layer of `parent` holding the given bindings.
	///
	/// Shadowing a name bound in an enclosing layer is allowed; the parent
	/// layer is never modified.
	pub fn extend<Iter>(parent: &Rc<Scope>, bindings: Iter) -> Scope
	where
		Iter: IntoIterator<Item = (String, Value)>,
	{
		Scope {
			parent: Some(Rc::clone(parent)),
			bindings: bindings.into_iter().collect(),
		}
	}

	/// Add a binding to this layer.
	///
	/// Only the statement driver extends the root layer this way, between
	/// statements, when no overlay is alive.
	pub(crate) fn insert(&mut self, name: String, value: Value) {
		let _ = self.bindings.insert(name, value);
	}

	/// Resolve a name against this layer and, failing that, its parents.
	pub fn lookup(&self, name: &str) -> Option<&Value> {
		let mut scope = self;
		loop {
			if let Some(value) = scope.bindings.get(name) {
				return Some(value);
			}
			match &scope.parent {
				Some(parent) => scope = parent,
				None => return None,
			}
		}
	}

	/// Create a root scope from the given bindings.
	pub fn root<Iter>(bindings: Iter) -> Scope
	where
		Iter: IntoIterator<Item = (String, Value)>,
	{
		Scope {
			parent: None,
			bindings: bindings.into_iter().collect(),
		}
	}
}
