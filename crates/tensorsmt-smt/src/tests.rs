//! Unit tests for the expression algebra and solver.

use crate::{CheckResult, SmtError, SmtExpr, Solver, Sort};

#[test]
fn conjunction_requires_bool_operands() {
    let p = SmtExpr::boolean(true);
    let x = SmtExpr::var("x");

    assert!(SmtExpr::and(p.clone(), p.clone()).is_ok());
    let err = SmtExpr::and(p, x).unwrap_err();
    assert!(matches!(err, SmtError::TypeMismatch { op: "and", .. }));
}

#[test]
fn arithmetic_rejects_bool_operands() {
    let p = SmtExpr::boolean(false);
    let x = SmtExpr::var("x");

    assert!(SmtExpr::add(x.clone(), x.clone()).is_ok());
    assert!(SmtExpr::add(x.clone(), p.clone()).is_err());
    assert!(SmtExpr::div(p, x).is_err());
}

#[test]
fn division_is_representable_with_zero_divisor() {
    // Construction never guards the divisor; well-definedness is tracked
    // separately by the consumer.
    let x = SmtExpr::var("x");
    let zero = SmtExpr::real(0.0);
    assert!(SmtExpr::div(x, zero).is_ok());
}

#[test]
fn sorts_of_compositions() {
    let x = SmtExpr::var("x");
    let i = SmtExpr::int(3);

    assert_eq!(SmtExpr::add(x.clone(), i.clone()).unwrap().sort(), Sort::Real);
    assert_eq!(SmtExpr::add(i.clone(), i.clone()).unwrap().sort(), Sort::Int);
    assert_eq!(SmtExpr::lt(x.clone(), i).unwrap().sort(), Sort::Bool);
    assert_eq!(SmtExpr::sqrt(x).unwrap().sort(), Sort::Real);
}

#[test]
fn display_renders_s_expressions() {
    let x = SmtExpr::var("x");
    let y = SmtExpr::var("y");
    let sum = SmtExpr::add(x.clone(), y).unwrap();
    assert_eq!(sum.to_string(), "(+ x y)");

    let call = SmtExpr::call("reshape_2x3_to_6", vec![x.clone()]);
    assert_eq!(call.to_string(), "(reshape_2x3_to_6 x)");

    let guard = SmtExpr::ne(x, SmtExpr::real(0.0)).unwrap();
    assert_eq!(guard.to_string(), "(distinct x 0.0)");
}

#[test]
fn commutative_addition_is_equivalent() {
    let x = SmtExpr::var("x");
    let y = SmtExpr::var("y");
    let a = SmtExpr::add(x.clone(), y.clone()).unwrap();
    let b = SmtExpr::add(y, x).unwrap();

    assert_ne!(a, b); // structurally different
    let mut solver = Solver::new();
    assert!(solver.check_equivalent(&a, &b).unwrap());
}

#[test]
fn addition_and_subtraction_are_not_equivalent() {
    let x = SmtExpr::var("x");
    let y = SmtExpr::var("y");
    let sum = SmtExpr::add(x.clone(), y.clone()).unwrap();
    let diff = SmtExpr::sub(x, y).unwrap();

    let mut solver = Solver::new();
    assert!(!solver.check_equivalent(&sum, &diff).unwrap());
}

#[test]
fn polynomial_expansion_collects_like_terms() {
    // ((((x+y)+x)+x) + (((x+y)+x)+x)) == 2*(3x + y)
    let x = SmtExpr::var("x");
    let y = SmtExpr::var("y");
    let mut chain = SmtExpr::add(x.clone(), y.clone()).unwrap();
    chain = SmtExpr::add(chain, x.clone()).unwrap();
    chain = SmtExpr::add(chain, x.clone()).unwrap();
    let doubled = SmtExpr::add(chain.clone(), chain).unwrap();

    let three_x = SmtExpr::mul(SmtExpr::real(3.0), x).unwrap();
    let inner = SmtExpr::add(three_x, y).unwrap();
    let expected = SmtExpr::mul(SmtExpr::real(2.0), inner).unwrap();

    let mut solver = Solver::new();
    assert!(solver.check_equivalent(&doubled, &expected).unwrap());
}

#[test]
fn squaring_is_not_doubling() {
    let x = SmtExpr::var("x");
    let squared = SmtExpr::mul(x.clone(), x.clone()).unwrap();
    let doubled = SmtExpr::add(x, SmtExpr::var("x")).unwrap();

    let mut solver = Solver::new();
    assert!(!solver.check_equivalent(&squared, &doubled).unwrap());
}

#[test]
fn uninterpreted_calls_obey_congruence() {
    let x = SmtExpr::var("x");
    let y = SmtExpr::var("y");
    let arg_a = SmtExpr::add(x.clone(), y.clone()).unwrap();
    let arg_b = SmtExpr::add(y, x).unwrap();

    let call_a = SmtExpr::call("softmax_last", vec![arg_a]);
    let call_b = SmtExpr::call("softmax_last", vec![arg_b.clone()]);
    let other = SmtExpr::call("gap_1x8x4x4", vec![arg_b]);

    let mut solver = Solver::new();
    assert!(solver.check_equivalent(&call_a, &call_b).unwrap());
    assert!(!solver.check_equivalent(&call_a, &other).unwrap());
}

#[test]
fn division_by_constant_folds() {
    let x = SmtExpr::var("x");
    let halved = SmtExpr::div(x.clone(), SmtExpr::real(2.0)).unwrap();
    let scaled = SmtExpr::mul(SmtExpr::real(0.5), x).unwrap();

    let mut solver = Solver::new();
    assert!(solver.check_equivalent(&halved, &scaled).unwrap());
}

#[test]
fn division_by_variable_stays_uninterpreted() {
    let x = SmtExpr::var("x");
    let y = SmtExpr::var("y");
    let a = SmtExpr::div(x.clone(), y.clone()).unwrap();
    let b = SmtExpr::div(x.clone(), y).unwrap();
    let c = SmtExpr::div(x.clone(), SmtExpr::var("z")).unwrap();

    let mut solver = Solver::new();
    assert!(solver.check_equivalent(&a, &b).unwrap());
    assert!(!solver.check_equivalent(&a, &c).unwrap());
}

#[test]
fn boolean_equality_queries() {
    let x = SmtExpr::var("x");
    let y = SmtExpr::var("y");
    let sum_a = SmtExpr::add(x.clone(), y.clone()).unwrap();
    let sum_b = SmtExpr::add(y, x).unwrap();

    let eq = SmtExpr::eq(sum_a.clone(), sum_b.clone()).unwrap();
    let neq = SmtExpr::ne(sum_a, sum_b).unwrap();

    let mut solver = Solver::new();
    assert_eq!(solver.check(&eq), CheckResult::Sat);
    assert_eq!(solver.check(&neq), CheckResult::Unsat);
}

#[test]
fn check_on_open_queries_is_unknown() {
    let x = SmtExpr::var("x");
    let guard = SmtExpr::ne(x.clone(), SmtExpr::real(0.0)).unwrap();

    let mut solver = Solver::new();
    assert!(solver.check(&guard).is_unknown());
    assert!(solver.check(&x).is_unknown());
}

#[test]
fn transpose_capability_by_expression_kind() {
    let w = SmtExpr::var("weight");
    assert!(w.supports_transpose());
    let t = w.try_transpose().unwrap();
    assert_eq!(t.to_string(), "(transpose weight)");

    let c = SmtExpr::real(1.0);
    assert!(!c.supports_transpose());
    assert!(c.try_transpose().is_none());

    let p = SmtExpr::boolean(true);
    assert!(p.try_transpose().is_none());
}

#[test]
fn mixed_sort_expressions_are_never_equivalent() {
    let x = SmtExpr::var("x");
    let p = SmtExpr::boolean(true);
    let mut solver = Solver::new();
    assert!(!solver.check_equivalent(&x, &p).unwrap());
}
