//! The symbolic expression tree.

use serde::{Deserialize, Serialize};

use crate::error::SmtError;
use crate::sort::{Sort, Value};

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Unguarded division. Constructing a division never asserts the divisor
    /// is nonzero; callers register a well-definedness obligation when the
    /// divisor may be zero.
    Div,
    Max,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Array read: `(select table index)`.
    Select,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Max => "max",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Eq => "=",
            BinOp::Ne => "distinct",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Select => "select",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
    Sqrt,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not",
            UnOp::Sqrt => "sqrt",
        }
    }
}

/// An immutable node in the logic-expression tree.
///
/// Composition is only possible through the sort-checked constructors;
/// an incompatible composition fails with [`SmtError::TypeMismatch`].
/// Equality is structural; semantic comparison goes through
/// [`crate::Solver::check_equivalent`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SmtExpr {
    Constant(Value),
    Variable { name: String, sort: Sort },
    UninterpretedCall { name: String, args: Vec<SmtExpr> },
    Binary { op: BinOp, lhs: Box<SmtExpr>, rhs: Box<SmtExpr> },
    Unary { op: UnOp, operand: Box<SmtExpr> },
}

impl SmtExpr {
    // --- Leaf constructors (infallible) ---

    pub fn int(v: i64) -> Self {
        SmtExpr::Constant(Value::Int(v))
    }

    pub fn real(v: f64) -> Self {
        SmtExpr::Constant(Value::Real(v))
    }

    pub fn boolean(v: bool) -> Self {
        SmtExpr::Constant(Value::Bool(v))
    }

    /// The Boolean constant `true`, the neutral element of conjunction.
    pub fn tru() -> Self {
        SmtExpr::boolean(true)
    }

    /// A fresh named symbol of `Real` sort. Free/unbound inputs enter the
    /// encoding through this constructor.
    pub fn var(name: impl Into<String>) -> Self {
        SmtExpr::Variable {
            name: name.into(),
            sort: Sort::Real,
        }
    }

    pub fn var_with_sort(name: impl Into<String>, sort: Sort) -> Self {
        SmtExpr::Variable {
            name: name.into(),
            sort,
        }
    }

    /// An application of an uninterpreted function symbol.
    ///
    /// The symbol name is chosen by the caller and must be deterministic in
    /// the operator and its parameters, so that structurally identical
    /// operations produce syntactically identical symbols.
    pub fn call(name: impl Into<String>, args: Vec<SmtExpr>) -> Self {
        SmtExpr::UninterpretedCall {
            name: name.into(),
            args,
        }
    }

    // --- Sort computation ---

    pub fn sort(&self) -> Sort {
        match self {
            SmtExpr::Constant(v) => v.sort(),
            SmtExpr::Variable { sort, .. } => *sort,
            // Uninterpreted tensor operations are abstracted to Real.
            SmtExpr::UninterpretedCall { .. } => Sort::Real,
            SmtExpr::Binary { op, lhs, rhs } => match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Max => {
                    if lhs.sort() == Sort::Real || rhs.sort() == Sort::Real {
                        Sort::Real
                    } else {
                        Sort::Int
                    }
                }
                BinOp::Select => Sort::Real,
                BinOp::And
                | BinOp::Or
                | BinOp::Eq
                | BinOp::Ne
                | BinOp::Lt
                | BinOp::Le
                | BinOp::Gt
                | BinOp::Ge => Sort::Bool,
            },
            SmtExpr::Unary { op, operand } => match op {
                UnOp::Neg => operand.sort(),
                UnOp::Not => Sort::Bool,
                UnOp::Sqrt => Sort::Real,
            },
        }
    }

    // --- Sort-checked composition ---

    fn binary_numeric(op: BinOp, lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        if !lhs.sort().is_numeric() || !rhs.sort().is_numeric() {
            return Err(SmtError::type_mismatch(
                op.symbol(),
                "numeric operands",
                format!("{} and {}", lhs.sort(), rhs.sort()),
            ));
        }
        Ok(SmtExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn add(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::binary_numeric(BinOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::binary_numeric(BinOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::binary_numeric(BinOp::Mul, lhs, rhs)
    }

    /// Unguarded division. Representable even when the divisor may be zero;
    /// the caller is responsible for registering a well-definedness
    /// obligation in that case.
    pub fn div(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::binary_numeric(BinOp::Div, lhs, rhs)
    }

    pub fn max(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::binary_numeric(BinOp::Max, lhs, rhs)
    }

    /// Logical conjunction; both sides must be Boolean.
    pub fn and(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        if !lhs.sort().is_bool() || !rhs.sort().is_bool() {
            return Err(SmtError::type_mismatch(
                "and",
                "Bool operands",
                format!("{} and {}", lhs.sort(), rhs.sort()),
            ));
        }
        Ok(SmtExpr::Binary {
            op: BinOp::And,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn or(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        if !lhs.sort().is_bool() || !rhs.sort().is_bool() {
            return Err(SmtError::type_mismatch(
                "or",
                "Bool operands",
                format!("{} and {}", lhs.sort(), rhs.sort()),
            ));
        }
        Ok(SmtExpr::Binary {
            op: BinOp::Or,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Equality; operands must share a sort (the numeric sorts are mutually
    /// comparable).
    pub fn eq(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::comparison(BinOp::Eq, lhs, rhs)
    }

    pub fn ne(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::comparison(BinOp::Ne, lhs, rhs)
    }

    fn comparison(op: BinOp, lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        let compatible = lhs.sort() == rhs.sort()
            || (lhs.sort().is_numeric() && rhs.sort().is_numeric());
        if !compatible {
            return Err(SmtError::type_mismatch(
                op.symbol(),
                "operands of a common sort",
                format!("{} and {}", lhs.sort(), rhs.sort()),
            ));
        }
        Ok(SmtExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn lt(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::ordering(BinOp::Lt, lhs, rhs)
    }

    pub fn le(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::ordering(BinOp::Le, lhs, rhs)
    }

    pub fn gt(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::ordering(BinOp::Gt, lhs, rhs)
    }

    pub fn ge(lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        Self::ordering(BinOp::Ge, lhs, rhs)
    }

    fn ordering(op: BinOp, lhs: SmtExpr, rhs: SmtExpr) -> Result<SmtExpr, SmtError> {
        if !lhs.sort().is_numeric() || !rhs.sort().is_numeric() {
            return Err(SmtError::type_mismatch(
                op.symbol(),
                "numeric operands",
                format!("{} and {}", lhs.sort(), rhs.sort()),
            ));
        }
        Ok(SmtExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Array read of a tensor-valued expression at a numeric index.
    pub fn select(table: SmtExpr, index: SmtExpr) -> Result<SmtExpr, SmtError> {
        let table_ok = matches!(table.sort(), Sort::Array | Sort::Real);
        if !table_ok || !index.sort().is_numeric() {
            return Err(SmtError::type_mismatch(
                "select",
                "a table and a numeric index",
                format!("{} and {}", table.sort(), index.sort()),
            ));
        }
        Ok(SmtExpr::Binary {
            op: BinOp::Select,
            lhs: Box::new(table),
            rhs: Box::new(index),
        })
    }

    pub fn neg(operand: SmtExpr) -> Result<SmtExpr, SmtError> {
        if !operand.sort().is_numeric() {
            return Err(SmtError::type_mismatch(
                "-",
                "a numeric operand",
                operand.sort().to_string(),
            ));
        }
        Ok(SmtExpr::Unary {
            op: UnOp::Neg,
            operand: Box::new(operand),
        })
    }

    pub fn not(operand: SmtExpr) -> Result<SmtExpr, SmtError> {
        if !operand.sort().is_bool() {
            return Err(SmtError::type_mismatch(
                "not",
                "a Bool operand",
                operand.sort().to_string(),
            ));
        }
        Ok(SmtExpr::Unary {
            op: UnOp::Not,
            operand: Box::new(operand),
        })
    }

    pub fn sqrt(operand: SmtExpr) -> Result<SmtExpr, SmtError> {
        if !operand.sort().is_numeric() {
            return Err(SmtError::type_mismatch(
                "sqrt",
                "a numeric operand",
                operand.sort().to_string(),
            ));
        }
        Ok(SmtExpr::Unary {
            op: UnOp::Sqrt,
            operand: Box::new(operand),
        })
    }

    // --- Capabilities ---

    /// Whether this expression kind supports a symbolic transpose.
    ///
    /// Tensor-valued kinds (variables, uninterpreted calls, arithmetic
    /// combinations) do; constants and Boolean-sorted expressions do not.
    pub fn supports_transpose(&self) -> bool {
        if self.sort().is_bool() {
            return false;
        }
        match self {
            SmtExpr::Constant(_) => false,
            SmtExpr::Variable { .. } | SmtExpr::UninterpretedCall { .. } => true,
            SmtExpr::Binary { op, .. } => matches!(
                op,
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Max | BinOp::Select
            ),
            SmtExpr::Unary { op, .. } => matches!(op, UnOp::Neg | UnOp::Sqrt),
        }
    }

    /// The symbolic transpose of this expression, when the kind supports one.
    pub fn try_transpose(&self) -> Option<SmtExpr> {
        if self.supports_transpose() {
            Some(SmtExpr::call("transpose", vec![self.clone()]))
        } else {
            None
        }
    }
}
