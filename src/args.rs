// args.rs — Argument decomposition
//
// Walks one call-argument expression depth-first and extracts its structural
// components into an `Argument` fingerprint. The walk is pure and assigns no
// roles; callers interpret fingerprints through the positional schemas.
//
// Preconditions: the expression belongs to the unit under analysis.
// Postconditions: component lists are in visit (source) order.
// Failure modes: none.
// Side effects: none.

use crate::ast::{BinOp, Expr, ExprKind, FnId, Span, VarId};

// ── Fingerprint ─────────────────────────────────────────────────────────────

/// Structural decomposition of one argument expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Argument {
    pub variables: Vec<VarId>,
    pub functions: Vec<FnId>,
    pub int_literals: Vec<i128>,
    pub float_literals: Vec<f64>,
    pub binary_operators: Vec<BinOp>,
    /// Original source range, for byte-exact spelling comparison.
    pub span: Span,
}

impl Argument {
    /// First referenced variable, the anchor of buffer- and request-shaped
    /// arguments. `None` means the checks needing a variable skip the call.
    pub fn first_var(&self) -> Option<VarId> {
        self.variables.first().copied()
    }

    /// Component equality: variables, functions, integer literals, and
    /// binary operators compare as multisets; float literals compare by
    /// count only (never by value).
    pub fn components_equal(&self, other: &Argument) -> bool {
        multiset_eq(&self.binary_operators, &other.binary_operators)
            && multiset_eq(&self.variables, &other.variables)
            && multiset_eq(&self.int_literals, &other.int_literals)
            && self.float_literals.len() == other.float_literals.len()
            && multiset_eq(&self.functions, &other.functions)
    }
}

/// Multiset equality via sorted canonical forms.
pub fn multiset_eq<T: Ord + Copy>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

// ── Decomposer ──────────────────────────────────────────────────────────────

/// Decompose one argument expression into its fingerprint.
pub fn decompose(expr: &Expr) -> Argument {
    let mut arg = Argument {
        span: expr.span,
        ..Argument::default()
    };
    walk(expr, &mut arg);
    arg
}

fn walk(expr: &Expr, arg: &mut Argument) {
    match &expr.kind {
        ExprKind::IntLit(v) => arg.int_literals.push(*v),
        ExprKind::FloatLit(v) => arg.float_literals.push(*v),
        ExprKind::Var(id) => arg.variables.push(*id),
        ExprKind::Call { callee, args } => {
            arg.functions.push(*callee);
            for a in args {
                walk(a, arg);
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            arg.binary_operators.push(*op);
            walk(lhs, arg);
            walk(rhs, arg);
        }
        ExprKind::Unary { operand, .. } => walk(operand, arg),
        ExprKind::Index { base, index } => {
            walk(base, arg);
            walk(index, arg);
        }
    }
}
