//! Equivalence checking via canonical normal forms.
//!
//! The encoder emits expressions from a small fragment: polynomial real
//! arithmetic over free variables, plus applications of uninterpreted
//! function symbols (and a handful of non-polynomial primitives: division by
//! a non-constant, `max`, `sqrt`, `select`). For that fragment, semantic
//! equality is decided by rewriting both sides into a canonical
//! multilinear-polynomial form: constants fold, products distribute over
//! sums, like terms collect, and every non-polynomial subterm is interned as
//! an atom keyed by its operator and the normal forms of its arguments
//! (congruence: identical symbol applied to equivalent arguments yields the
//! same atom).
//!
//! `check_equivalent(a, b)` holds exactly when the two canonical forms
//! coincide, i.e. when the disequality `a ≠ b` is unsatisfiable in the
//! emitted fragment. The [`Solver`] is a scoped resource: acquire one per
//! check (or per test), drop it afterwards; nothing is retained across
//! encoding passes.

use std::collections::HashMap;

use crate::error::SmtError;
use crate::expr::{BinOp, SmtExpr, UnOp};
use crate::sort::Sort;

/// Coefficients below this magnitude are treated as zero after folding.
const COEFF_EPS: f64 = 1e-9;

/// A polynomial coefficient with total ordering and hashing.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Coeff(f64);

impl Coeff {
    fn new(v: f64) -> Self {
        // Normalize -0.0 so bit-level hashing agrees with equality.
        Coeff(if v == 0.0 { 0.0 } else { v })
    }
}

impl PartialEq for Coeff {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == std::cmp::Ordering::Equal
    }
}

impl Eq for Coeff {}

impl PartialOrd for Coeff {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coeff {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for Coeff {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// A power product of atoms, sorted by atom id. The empty monomial is the
/// constant term.
type Monomial = Vec<(usize, u32)>;

/// Canonical polynomial: monomial → coefficient, zero coefficients pruned.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub(crate) struct Poly(std::collections::BTreeMap<Monomial, Coeff>);

impl Poly {
    fn zero() -> Self {
        Poly::default()
    }

    fn constant(v: f64) -> Self {
        let mut p = Poly::zero();
        p.accumulate(Vec::new(), v);
        p
    }

    fn atom(id: usize) -> Self {
        let mut p = Poly::zero();
        p.accumulate(vec![(id, 1)], 1.0);
        p
    }

    fn accumulate(&mut self, mono: Monomial, coeff: f64) {
        let entry = self.0.entry(mono);
        match entry {
            std::collections::btree_map::Entry::Occupied(mut e) => {
                let updated = e.get().0 + coeff;
                if updated.abs() < COEFF_EPS {
                    e.remove();
                } else {
                    *e.get_mut() = Coeff::new(updated);
                }
            }
            std::collections::btree_map::Entry::Vacant(e) => {
                if coeff.abs() >= COEFF_EPS {
                    e.insert(Coeff::new(coeff));
                }
            }
        }
    }

    fn add(mut self, other: &Poly) -> Poly {
        for (mono, coeff) in &other.0 {
            self.accumulate(mono.clone(), coeff.0);
        }
        self
    }

    fn scale(mut self, factor: f64) -> Poly {
        if factor == 0.0 {
            return Poly::zero();
        }
        let entries: Vec<(Monomial, f64)> = self
            .0
            .iter()
            .map(|(m, c)| (m.clone(), c.0 * factor))
            .collect();
        self.0.clear();
        for (m, c) in entries {
            self.accumulate(m, c);
        }
        self
    }

    fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (ma, ca) in &self.0 {
            for (mb, cb) in &other.0 {
                out.accumulate(mono_mul(ma, mb), ca.0 * cb.0);
            }
        }
        out
    }

    /// `Some(c)` iff the polynomial is the constant `c`.
    fn as_constant(&self) -> Option<f64> {
        let empty: Monomial = Vec::new();
        match self.0.len() {
            0 => Some(0.0),
            1 => self.0.get(&empty).map(|c| c.0),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Sign-canonical copy for symmetric relations (`p = 0` vs `-p = 0`).
    fn sign_canonical(&self) -> Poly {
        match self.0.values().next() {
            Some(c) if c.0 < 0.0 => self.clone().scale(-1.0),
            _ => self.clone(),
        }
    }
}

fn mono_mul(a: &Monomial, b: &Monomial) -> Monomial {
    let mut out: std::collections::BTreeMap<usize, u32> = std::collections::BTreeMap::new();
    for &(id, pow) in a.iter().chain(b.iter()) {
        *out.entry(id).or_insert(0) += pow;
    }
    out.into_iter().collect()
}

/// A non-polynomial subterm, keyed by its operator and the canonical forms
/// of its arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum AtomKey {
    Var(String),
    Call(String, Vec<Poly>),
    Div(Poly, Poly),
    Max(Poly, Poly),
    Sqrt(Poly),
    Select(Poly, Poly),
}

/// Canonical form of a Boolean expression: a conjunction of atoms, or a
/// constant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NormBool {
    Const(bool),
    Conj(std::collections::BTreeSet<BoolAtom>),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum BoolAtom {
    Var(String),
    /// `p = 0`, sign-canonical.
    EqZero(Poly),
    /// `p ≠ 0`, sign-canonical.
    NeZero(Poly),
    /// `p < 0`.
    LtZero(Poly),
    /// `p ≤ 0`.
    LeZero(Poly),
    Not(Box<NormBool>),
    Or(Vec<NormBool>),
    Iff(Vec<NormBool>),
}

/// Result of a satisfiability query over the supported fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckResult {
    Sat,
    Unsat,
    /// The query falls outside the fragment the normalizer decides.
    Unknown,
}

impl CheckResult {
    pub fn has_sat(self) -> bool {
        self == CheckResult::Sat
    }

    pub fn has_unsat(self) -> bool {
        self == CheckResult::Unsat
    }

    pub fn is_unknown(self) -> bool {
        self == CheckResult::Unknown
    }
}

/// The backing constraint-solving context.
///
/// Owns the atom interner for one sequence of checks. Create one per check
/// site; it is not shared across encoding passes.
///
/// # Examples
///
/// ```
/// use tensorsmt_smt::{SmtExpr, Solver};
///
/// let x = SmtExpr::var("x");
/// let two_x = SmtExpr::mul(SmtExpr::real(2.0), x.clone()).unwrap();
/// let x_plus_x = SmtExpr::add(x.clone(), x).unwrap();
///
/// let mut solver = Solver::new();
/// assert!(solver.check_equivalent(&two_x, &x_plus_x).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct Solver {
    atoms: Vec<AtomKey>,
    index: HashMap<AtomKey, usize>,
}

impl Solver {
    pub fn new() -> Self {
        Solver::default()
    }

    fn intern(&mut self, key: AtomKey) -> usize {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.atoms.len();
        self.atoms.push(key.clone());
        self.index.insert(key, id);
        id
    }

    /// True iff negating the equality of the two expressions is
    /// unsatisfiable. This is the sole semantic comparison primitive.
    ///
    /// Expressions of differing sorts are never equivalent.
    pub fn check_equivalent(&mut self, lhs: &SmtExpr, rhs: &SmtExpr) -> Result<bool, SmtError> {
        match (lhs.sort(), rhs.sort()) {
            (Sort::Bool, Sort::Bool) => {
                Ok(self.normalize_bool(lhs)? == self.normalize_bool(rhs)?)
            }
            (a, b) if (a.is_numeric() || a == Sort::Array) && (b.is_numeric() || b == Sort::Array) => {
                Ok(self.normalize_num(lhs)? == self.normalize_num(rhs)?)
            }
            _ => Ok(false),
        }
    }

    /// Satisfiability of a Boolean expression, where the normal form decides
    /// it; `Unknown` otherwise.
    pub fn check(&mut self, expr: &SmtExpr) -> CheckResult {
        if !expr.sort().is_bool() {
            return CheckResult::Unknown;
        }
        match self.normalize_bool(expr) {
            Ok(NormBool::Const(false)) => CheckResult::Unsat,
            Ok(NormBool::Const(true)) => CheckResult::Sat,
            _ => CheckResult::Unknown,
        }
    }

    fn normalize_num(&mut self, expr: &SmtExpr) -> Result<Poly, SmtError> {
        match expr {
            SmtExpr::Constant(v) => match v.as_f64() {
                Some(c) => Ok(Poly::constant(c)),
                None => Err(SmtError::type_mismatch(
                    "solver",
                    "a numeric expression",
                    "Bool",
                )),
            },
            SmtExpr::Variable { name, sort } => {
                if sort.is_bool() {
                    return Err(SmtError::type_mismatch(
                        "solver",
                        "a numeric expression",
                        "Bool",
                    ));
                }
                let id = self.intern(AtomKey::Var(name.clone()));
                Ok(Poly::atom(id))
            }
            SmtExpr::UninterpretedCall { name, args } => {
                let mut norm_args = Vec::with_capacity(args.len());
                for arg in args {
                    norm_args.push(self.normalize_num(arg)?);
                }
                let id = self.intern(AtomKey::Call(name.clone(), norm_args));
                Ok(Poly::atom(id))
            }
            SmtExpr::Binary { op, lhs, rhs } => {
                let l = self.normalize_num(lhs)?;
                let r = self.normalize_num(rhs)?;
                match op {
                    BinOp::Add => Ok(l.add(&r)),
                    BinOp::Sub => Ok(l.add(&r.scale(-1.0))),
                    BinOp::Mul => Ok(l.mul(&r)),
                    BinOp::Div => match r.as_constant() {
                        Some(c) if c.abs() >= COEFF_EPS => Ok(l.scale(1.0 / c)),
                        // Non-constant (or zero) divisor: keep the division
                        // uninterpreted, modulo congruence on both sides.
                        _ => {
                            let id = self.intern(AtomKey::Div(l, r));
                            Ok(Poly::atom(id))
                        }
                    },
                    BinOp::Max => {
                        let id = self.intern(AtomKey::Max(l, r));
                        Ok(Poly::atom(id))
                    }
                    BinOp::Select => {
                        let id = self.intern(AtomKey::Select(l, r));
                        Ok(Poly::atom(id))
                    }
                    _ => Err(SmtError::type_mismatch(
                        "solver",
                        "a numeric expression",
                        "Bool",
                    )),
                }
            }
            SmtExpr::Unary { op, operand } => {
                let p = self.normalize_num(operand)?;
                match op {
                    UnOp::Neg => Ok(p.scale(-1.0)),
                    UnOp::Sqrt => match p.as_constant() {
                        Some(c) if c >= 0.0 && (c.sqrt().fract() == 0.0) => {
                            Ok(Poly::constant(c.sqrt()))
                        }
                        _ => {
                            let id = self.intern(AtomKey::Sqrt(p));
                            Ok(Poly::atom(id))
                        }
                    },
                    UnOp::Not => Err(SmtError::type_mismatch(
                        "solver",
                        "a numeric expression",
                        "Bool",
                    )),
                }
            }
        }
    }

    fn normalize_bool(&mut self, expr: &SmtExpr) -> Result<NormBool, SmtError> {
        match expr {
            SmtExpr::Constant(crate::sort::Value::Bool(b)) => Ok(NormBool::Const(*b)),
            SmtExpr::Variable { name, sort } if sort.is_bool() => {
                Ok(conj_of(BoolAtom::Var(name.clone())))
            }
            SmtExpr::Binary { op, lhs, rhs } => match op {
                BinOp::And => {
                    let l = self.normalize_bool(lhs)?;
                    let r = self.normalize_bool(rhs)?;
                    Ok(conj_merge(l, r))
                }
                BinOp::Or => {
                    let l = self.normalize_bool(lhs)?;
                    let r = self.normalize_bool(rhs)?;
                    match (&l, &r) {
                        (NormBool::Const(true), _) | (_, NormBool::Const(true)) => {
                            Ok(NormBool::Const(true))
                        }
                        (NormBool::Const(false), _) => Ok(r.clone()),
                        (_, NormBool::Const(false)) => Ok(l.clone()),
                        _ => {
                            let mut operands = vec![l, r];
                            operands.sort();
                            Ok(conj_of(BoolAtom::Or(operands)))
                        }
                    }
                }
                BinOp::Eq if lhs.sort().is_bool() => {
                    // Boolean equality is kept structural on normal forms.
                    let l = self.normalize_bool(lhs)?;
                    let r = self.normalize_bool(rhs)?;
                    if l == r {
                        Ok(NormBool::Const(true))
                    } else {
                        let mut operands = vec![l, r];
                        operands.sort();
                        Ok(conj_of(BoolAtom::Iff(operands)))
                    }
                }
                BinOp::Eq => {
                    let diff = self.difference(lhs, rhs)?;
                    if diff.is_zero() {
                        Ok(NormBool::Const(true))
                    } else if diff.as_constant().is_some() {
                        Ok(NormBool::Const(false))
                    } else {
                        Ok(conj_of(BoolAtom::EqZero(diff.sign_canonical())))
                    }
                }
                BinOp::Ne => {
                    let diff = self.difference(lhs, rhs)?;
                    if diff.is_zero() {
                        Ok(NormBool::Const(false))
                    } else if diff.as_constant().is_some() {
                        Ok(NormBool::Const(true))
                    } else {
                        Ok(conj_of(BoolAtom::NeZero(diff.sign_canonical())))
                    }
                }
                BinOp::Lt => self.relation(lhs, rhs, false),
                BinOp::Le => self.relation(lhs, rhs, true),
                BinOp::Gt => self.relation(rhs, lhs, false),
                BinOp::Ge => self.relation(rhs, lhs, true),
                _ => Err(SmtError::type_mismatch(
                    "solver",
                    "a Bool expression",
                    expr.sort().to_string(),
                )),
            },
            SmtExpr::Unary { op: UnOp::Not, operand } => {
                match self.normalize_bool(operand)? {
                    NormBool::Const(b) => Ok(NormBool::Const(!b)),
                    norm => {
                        // Single-relation conjunctions flip directly.
                        if let NormBool::Conj(atoms) = &norm {
                            let mut single = atoms.iter().take(2);
                            match (single.next(), single.next()) {
                                (Some(BoolAtom::EqZero(p)), None) => {
                                    return Ok(conj_of(BoolAtom::NeZero(p.clone())))
                                }
                                (Some(BoolAtom::NeZero(p)), None) => {
                                    return Ok(conj_of(BoolAtom::EqZero(p.clone())))
                                }
                                _ => {}
                            }
                        }
                        Ok(conj_of(BoolAtom::Not(Box::new(norm))))
                    }
                }
            }
            _ => Err(SmtError::type_mismatch(
                "solver",
                "a Bool expression",
                expr.sort().to_string(),
            )),
        }
    }

    fn difference(&mut self, lhs: &SmtExpr, rhs: &SmtExpr) -> Result<Poly, SmtError> {
        let l = self.normalize_num(lhs)?;
        let r = self.normalize_num(rhs)?;
        Ok(l.add(&r.scale(-1.0)))
    }

    /// `lhs < rhs` (strict) or `lhs ≤ rhs`, normalized to `p < 0` / `p ≤ 0`.
    fn relation(
        &mut self,
        lhs: &SmtExpr,
        rhs: &SmtExpr,
        inclusive: bool,
    ) -> Result<NormBool, SmtError> {
        let diff = self.difference(lhs, rhs)?;
        if let Some(c) = diff.as_constant() {
            let holds = if inclusive { c <= 0.0 } else { c < 0.0 };
            return Ok(NormBool::Const(holds));
        }
        if inclusive {
            Ok(conj_of(BoolAtom::LeZero(diff)))
        } else {
            Ok(conj_of(BoolAtom::LtZero(diff)))
        }
    }
}

fn conj_of(atom: BoolAtom) -> NormBool {
    let mut set = std::collections::BTreeSet::new();
    set.insert(atom);
    NormBool::Conj(set)
}

fn conj_merge(l: NormBool, r: NormBool) -> NormBool {
    match (l, r) {
        (NormBool::Const(false), _) | (_, NormBool::Const(false)) => NormBool::Const(false),
        (NormBool::Const(true), other) | (other, NormBool::Const(true)) => other,
        (NormBool::Conj(mut a), NormBool::Conj(b)) => {
            a.extend(b);
            NormBool::Conj(a)
        }
    }
}
