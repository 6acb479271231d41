//! Property-based tests for the expression algebra.

use proptest::prelude::*;
use tensorsmt_smt::{SmtExpr, Solver};

fn arb_var_name() -> impl Strategy<Value = String> {
    "[a-d]".prop_map(|s| s.to_string())
}

/// Small numeric expressions over a handful of shared variables.
fn arb_num_expr(depth: u32) -> impl Strategy<Value = SmtExpr> {
    let leaf = prop_oneof![
        arb_var_name().prop_map(SmtExpr::var),
        (-4i64..=4).prop_map(|v| SmtExpr::real(v as f64)),
    ];

    leaf.prop_recursive(depth, 64, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| SmtExpr::add(a, b).expect("numeric operands")),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| SmtExpr::sub(a, b).expect("numeric operands")),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| SmtExpr::mul(a, b).expect("numeric operands")),
        ]
    })
}

proptest! {
    /// Addition is commutative under the solver for arbitrary operands.
    #[test]
    fn prop_add_commutes(a in arb_num_expr(3), b in arb_num_expr(3)) {
        let lhs = SmtExpr::add(a.clone(), b.clone()).unwrap();
        let rhs = SmtExpr::add(b, a).unwrap();
        let mut solver = Solver::new();
        prop_assert!(solver.check_equivalent(&lhs, &rhs).unwrap());
    }

    /// Addition is associative under the solver.
    #[test]
    fn prop_add_associates(a in arb_num_expr(2), b in arb_num_expr(2), c in arb_num_expr(2)) {
        let lhs = SmtExpr::add(SmtExpr::add(a.clone(), b.clone()).unwrap(), c.clone()).unwrap();
        let rhs = SmtExpr::add(a, SmtExpr::add(b, c).unwrap()).unwrap();
        let mut solver = Solver::new();
        prop_assert!(solver.check_equivalent(&lhs, &rhs).unwrap());
    }

    /// Multiplication distributes over addition under the solver.
    #[test]
    fn prop_mul_distributes(a in arb_num_expr(2), b in arb_num_expr(2), c in arb_num_expr(2)) {
        let lhs = SmtExpr::mul(a.clone(), SmtExpr::add(b.clone(), c.clone()).unwrap()).unwrap();
        let rhs = SmtExpr::add(
            SmtExpr::mul(a.clone(), b).unwrap(),
            SmtExpr::mul(a, c).unwrap(),
        )
        .unwrap();
        let mut solver = Solver::new();
        prop_assert!(solver.check_equivalent(&lhs, &rhs).unwrap());
    }

    /// Every expression is equivalent to itself.
    #[test]
    fn prop_equivalence_reflexive(a in arb_num_expr(3)) {
        let mut solver = Solver::new();
        prop_assert!(solver.check_equivalent(&a, &a).unwrap());
    }
}
