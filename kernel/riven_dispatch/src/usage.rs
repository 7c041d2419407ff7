//! Usage roles: which evaluation context triggers a builtin lookup.

use riven_expr::Expr;

/// The evaluation context a native function is registered for.
///
/// One symbol may carry code in several roles at once; the evaluator
/// picks the role from where the symbol occurs in the expression being
/// reduced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Usage {
    /// Short-circuit tried before general evaluation of core operators.
    Early,
    /// The symbol is the head of the call being reduced.
    Down,
    /// The symbol is the head of a sub-call inside a held context, as in
    /// `f(..)(..)` where `f` is the inner head.
    Sub,
    /// The symbol occurs as an argument and the surrounding expression
    /// defers to it.
    Up,
    /// Numeric-approximation hook; distinct native signature.
    Approx,
}

impl Usage {
    /// All roles, in dispatch-priority order.
    pub const ALL: [Usage; 5] = [
        Usage::Early,
        Usage::Down,
        Usage::Sub,
        Usage::Up,
        Usage::Approx,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Usage::Early => "early",
            Usage::Down => "down",
            Usage::Sub => "sub",
            Usage::Up => "up",
            Usage::Approx => "approx",
        }
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A native builtin: receives the expression being reduced and returns
/// its replacement.
pub type BuiltinFn = fn(Expr) -> Expr;

/// A numeric-approximation builtin: receives the expression and the
/// requested precision in bits, returns a replacement or `None` when it
/// cannot approximate.
pub type ApproxFn = fn(Expr, f64) -> Option<Expr>;
