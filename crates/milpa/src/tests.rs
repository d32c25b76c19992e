//! Shared test helpers and end-to-end model-building scenarios.
//!
//! The solver engine is outside this crate, so the scenarios assert the
//! emitted model (variable names and kinds, constraint counts and
//! coefficients) and, where the search space is small enough, confirm the
//! optimum with a brute-force sweep over the binary assignments.

use expect_test::expect;
use tracing_test::traced_test;

use crate::{
	FloatVal, IntVal, LinConstraint, LinOperator, Model, ObjSense, Value, VarKind,
};

/// Comparison slack absorbing float rounding in the test evaluator.
const EPS: FloatVal = 1e-6;

/// Exhaustively find the optimal objective value of a model whose decision
/// variables are all binary. Returns `None` when the model is infeasible or
/// has no objective.
pub(crate) fn brute_force_binary(model: &Model) -> Option<(FloatVal, Vec<IntVal>)> {
	assert!(
		model.vars().all(|v| v.kind() == VarKind::Binary),
		"brute force requires a pure binary model"
	);
	let n = model.var_count();
	assert!(n <= 24, "brute force limited to 24 binary variables");
	let (sense, objective) = model.objective()?;
	let mut best: Option<(FloatVal, Vec<IntVal>)> = None;
	for mask in 0_u32..(1_u32 << n) {
		let assignment: Vec<IntVal> = (0..n).map(|i| IntVal::from((mask >> i) & 1)).collect();
		if !model.constraints().iter().all(|c| satisfied(c, &assignment)) {
			continue;
		}
		let value = linear_value(objective.terms(), objective.constant(), &assignment);
		let better = match &best {
			None => true,
			Some((incumbent, _)) => match sense {
				ObjSense::Maximize => value > *incumbent + EPS,
				ObjSense::Minimize => value < *incumbent - EPS,
			},
		};
		if better {
			best = Some((value, assignment));
		}
	}
	best
}

/// Evaluate a term list plus constant under a full assignment.
pub(crate) fn linear_value(
	terms: &[(FloatVal, crate::VarId)],
	constant: FloatVal,
	assignment: &[IntVal],
) -> FloatVal {
	terms
		.iter()
		.map(|(c, v)| c * assignment[v.index()] as FloatVal)
		.sum::<FloatVal>()
		+ constant
}

/// Whether an assignment satisfies a ground constraint.
pub(crate) fn satisfied(con: &LinConstraint, assignment: &[IntVal]) -> bool {
	let sum = linear_value(con.terms(), 0.0, assignment);
	match con.operator() {
		LinOperator::Equal => (sum - con.rhs()).abs() < EPS,
		LinOperator::GreaterEq => sum >= con.rhs() - EPS,
		LinOperator::LessEq => sum <= con.rhs() + EPS,
	}
}

#[test]
#[traced_test]
fn test_knapsack_scenario() {
	let source = "var bin x = ndarray(I)\n\
		obj max sum (i := I) p[i] * x[i]\n\
		constr (sum (i := I) w[i] * x[i]) <= c";
	let bindings = vec![
		("p".to_owned(), Value::from(vec![10_i64, 13, 18, 31, 7, 15])),
		("w".to_owned(), Value::from(vec![11_i64, 15, 20, 35, 10, 33])),
		("c".to_owned(), Value::Int(47)),
		("I".to_owned(), Value::Int(6)),
	];
	let (model, scope, stats) = Model::from_source("knapsack", source, bindings).unwrap();

	assert_eq!(stats.variables_created(), 6);
	assert_eq!(stats.constraints_posted(), 1);
	let Some(Value::Seq(tensor)) = scope.lookup("x") else {
		panic!("expected tensor binding for x");
	};
	assert_eq!(tensor.len(), 6);

	let expected = expect![[r#"
		model knapsack
		  var bin x_0
		  var bin x_1
		  var bin x_2
		  var bin x_3
		  var bin x_4
		  var bin x_5
		  obj max 10 x_0 + 13 x_1 + 18 x_2 + 31 x_3 + 7 x_4 + 15 x_5
		  constr 11 x_0 + 15 x_1 + 20 x_2 + 35 x_3 + 10 x_4 + 33 x_5 <= 47
	"#]];
	expected.assert_eq(&model.to_string());

	// The optimum packs a value of 41; selecting items 0 and 3 attains it.
	let (best, _) = brute_force_binary(&model).unwrap();
	assert!((best - 41.0).abs() < 1e-9);
	let chosen = vec![1, 0, 0, 1, 0, 0];
	assert!(model.constraints().iter().all(|c| satisfied(c, &chosen)));
	let (_, objective) = model.objective().unwrap();
	let value = linear_value(objective.terms(), objective.constant(), &chosen);
	assert!((value - best).abs() < 1e-9);
}

#[test]
fn test_travelling_salesman_scenario() {
	let source = "var bin x = ndarray(V, V)\n\
		var cont y = ndarray(V)\n\
		obj min sum (i := V) (j := V) c[i][j] * x[i][j]\n\
		constr forall (i := V) (sum (j := V, j != i) x[i][j]) == 1\n\
		constr forall (j := V) (sum (i := V, i != j) x[i][j]) == 1\n\
		constr forall (i := V, i != 0) (j := V, j != 0, j != i) y[i] - (n + 1) * x[i][j] >= y[j] - n";
	let v = 14_i64;
	let distances: Vec<Vec<IntVal>> = (0..v)
		.map(|i| (0..v).map(|j| (i - j).abs()).collect())
		.collect();
	let bindings = vec![
		("V".to_owned(), Value::Int(v)),
		("n".to_owned(), Value::Int(v - 1)),
		("c".to_owned(), Value::from(distances)),
	];
	let (model, _, stats) = Model::from_source("tsp", source, bindings).unwrap();

	// 196 binary arc variables plus 14 continuous rank variables.
	assert_eq!(model.var_count(), 210);
	assert_eq!(stats.variables_created(), 210);
	assert_eq!(
		model.vars().filter(|d| d.kind() == VarKind::Continuous).count(),
		14
	);
	assert_eq!(model.var(crate::VarId::from_usize(0)).name(), "x_0_0");

	// Out-degree and in-degree once per node, then MTZ ordering for every
	// ordered pair of non-depot nodes.
	assert_eq!(model.constraints().len(), 14 + 14 + 13 * 12);

	let degree = &model.constraints()[0];
	assert_eq!(degree.operator(), LinOperator::Equal);
	assert_eq!(degree.terms().len(), 13);
	assert_eq!(degree.rhs(), 1.0);

	let mtz = &model.constraints()[28];
	assert_eq!(mtz.operator(), LinOperator::GreaterEq);
	assert_eq!(mtz.terms().len(), 3);
	assert_eq!(mtz.rhs(), -13.0);

	let (sense, objective) = model.objective().unwrap();
	assert_eq!(*sense, ObjSense::Minimize);
	assert_eq!(objective.terms().len(), 196);
}

#[test]
fn test_n_queens_scenario() {
	let source = "var bin x = ndarray(n, n)\n\
		constr forall (i := n) (sum (j := n) x[i][j]) == 1\n\
		constr forall (j := n) (sum (i := n) x[i][j]) == 1\n\
		constr forall (k := 1 - n : n - 1) (sum (i := n) (j := n, i - j == k) x[i][j]) <= 1\n\
		constr forall (k := 0 : 2 * n - 2) (sum (i := n) (j := n, i + j == k) x[i][j]) <= 1";
	let n = 40_i64;
	let bindings = vec![("n".to_owned(), Value::Int(n))];
	let (model, _, _) = Model::from_source("queens", source, bindings).unwrap();

	assert_eq!(model.var_count(), 1600);
	assert!(model.objective().is_none());
	// 40 row and 40 column constraints, then 79 constraints per diagonal
	// direction.
	assert_eq!(model.constraints().len(), 40 + 40 + 79 + 79);

	// The first diagonal (k = -39) holds the single cell (0, 39).
	assert_eq!(model.constraints()[80].terms().len(), 1);
	// The main diagonal (k = 0) holds all 40 cells.
	assert_eq!(model.constraints()[80 + 39].terms().len(), 40);
	// The first anti-diagonal (k = 0) holds the single cell (0, 0).
	assert_eq!(model.constraints()[159].terms().len(), 1);
}

#[test]
fn test_frequency_assignment_scenario() {
	let source = "var bin x = ndarray(N, U)\n\
		var int z = ndarray(1)\n\
		obj min z[0]\n\
		constr forall (i := N) (sum (c := U) x[i][c]) == r[i]\n\
		constr forall (i := N) (j := N, i != j) (c1 := U) (c2 := U, c1 - c2 < d[i][j], c2 - c1 < d[i][j]) x[i][c1] + x[j][c2] <= 1\n\
		constr forall (i := N) (c1 := U) (c2 := U, c1 != c2, c1 - c2 < d[i][i], c2 - c1 < d[i][i]) x[i][c1] + x[i][c2] <= 1\n\
		constr forall (i := N) (c := U) z[0] >= (c + 1) * x[i][c]";
	let nodes = 8_i64;
	let demand = vec![3_i64, 5, 8, 3, 6, 5, 7, 3];
	// Interference radii: adjacent nodes must differ, and a node's own
	// channels must be at least two apart.
	let radii: Vec<Vec<IntVal>> = (0..nodes)
		.map(|i| {
			(0..nodes)
				.map(|j| match (i - j).abs() {
					0 => 2,
					1 => 1,
					_ => 0,
				})
				.collect()
		})
		.collect();
	let channels: IntVal = radii.iter().flatten().sum::<IntVal>()
		+ demand.iter().sum::<IntVal>();
	assert_eq!(channels, 70);
	let bindings = vec![
		("N".to_owned(), Value::Int(nodes)),
		("U".to_owned(), Value::Int(channels)),
		("r".to_owned(), Value::from(demand)),
		("d".to_owned(), Value::from(radii)),
	];
	let (model, _, stats) = Model::from_source("bmcp", source, bindings).unwrap();

	assert_eq!(model.var_count(), 8 * 70 + 1);
	// 8 demand rows; 14 adjacent ordered pairs with a shared channel ban;
	// 138 same-node channel pairs per node; one channel-bound link per
	// cell.
	let expected = 8 + 14 * 70 + 8 * 138 + 8 * 70;
	assert_eq!(model.constraints().len(), expected);
	assert_eq!(stats.constraints_posted(), expected as u32);

	// The channel-bound links relate z to a single cell each.
	let link = model.constraints().last().unwrap();
	assert_eq!(link.operator(), LinOperator::GreaterEq);
	assert_eq!(link.terms().len(), 2);
}

#[test]
fn test_level_packing_scenario() {
	let source = "var bin x = ndarray(n, n)\n\
		obj min sum (i := n) h[i] * x[i][i]\n\
		constr forall (i := n) (sum (j := n) x[i][j]) == 1\n\
		constr forall (j := n) (sum (i := n, i != j) w[i] * x[i][j]) <= (W - w[j]) * x[j][j]";
	let bindings = vec![
		("n".to_owned(), Value::Int(8)),
		("w".to_owned(), Value::from(vec![4_i64, 3, 5, 2, 1, 4, 7, 3])),
		("h".to_owned(), Value::from(vec![2_i64, 4, 1, 5, 6, 3, 5, 4])),
		("W".to_owned(), Value::Int(10)),
	];
	let (model, _, _) = Model::from_source("packing", source, bindings).unwrap();

	assert_eq!(model.var_count(), 64);
	assert_eq!(model.constraints().len(), 16);
	let (_, objective) = model.objective().unwrap();
	assert_eq!(objective.terms().len(), 8);

	// The width row of level 0: seven foreign items on the left, the level
	// opener moved over from the right-hand side.
	let width = &model.constraints()[8];
	assert_eq!(width.operator(), LinOperator::LessEq);
	assert_eq!(width.terms().len(), 8);
	assert_eq!(width.rhs(), 0.0);
	assert_eq!(width.terms()[7].0, -(10.0 - 4.0));
}

#[test]
fn test_generate_returns_model_and_scope() {
	let (model, scope) = crate::generate(
		"small",
		"var bin x = ndarray(2)\nconstr (sum (i := n) x[i]) <= 1",
		vec![("n".to_owned(), Value::Int(2))],
	)
	.unwrap();
	assert_eq!(model.name(), "small");
	assert_eq!(model.constraints().len(), 1);
	assert!(matches!(scope.lookup("x"), Some(Value::Seq(_))));
	assert!(matches!(scope.lookup("n"), Some(Value::Int(2))));
}
