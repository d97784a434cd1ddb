// rank.rs — Rank variables and rank-dependent conditional chains
//
// Two concerns: the pre-pass that records every variable used as the rank
// out-parameter of `MPI_Comm_rank`, and the structural view of an
// `if`/`else if`/`else` chain as ordered arms, from which the driver
// produces one `RankCase` per arm.
//
// Preconditions: the rank pre-pass runs before any chain is classified.
// Postconditions: arms are in source order; each arm sees the conditions
//                 of all earlier arms as its unmatched list.
// Failure modes: none.
// Side effects: `collect_rank_variables` populates the context's rank set.

use std::collections::HashSet;

use crate::args::decompose;
use crate::ast::{for_each_call, Expr, IfStmt, Span, Stmt, StmtKind};
use crate::context::AnalysisCtx;

// ── Rank-variable collection (pre-pass) ─────────────────────────────────────

/// Record every variable bound as the rank out-parameter of
/// `MPI_Comm_rank(comm, &rank)`. Pure accumulation; no diagnostics.
pub fn collect_rank_variables(ctx: &mut AnalysisCtx) {
    let mut rank_vars = std::mem::take(&mut ctx.rank_vars);
    for function in &ctx.tu.functions {
        for_each_call(&function.body, &mut |_expr, callee, args| {
            let name = ctx.name_of(callee);
            if !ctx.classifier.is_mpi_comm_rank(name) {
                return;
            }
            if let Some(rank_arg) = args.get(1) {
                if let Some(var) = decompose(rank_arg).first_var() {
                    rank_vars.insert(var);
                }
            }
        });
    }
    ctx.rank_vars = rank_vars;
}

/// Does this condition mention a known rank variable?
pub fn is_rank_branch(ctx: &AnalysisCtx, cond: &Expr) -> bool {
    decompose(cond)
        .variables
        .iter()
        .any(|v| ctx.rank_vars.contains(v))
}

// ── Chain structure ─────────────────────────────────────────────────────────

/// One arm of an `if`/`else if`/`else` chain. `cond` is `None` for the
/// final `else`.
#[derive(Debug)]
pub struct ChainArm<'a> {
    pub cond: Option<&'a Expr>,
    pub body: &'a [Stmt],
    pub span: Span,
}

/// Flatten a conditional chain into its arms, in source order, together
/// with the spans of every `if` link (for the seen-set).
pub fn chain_arms<'a>(ifstmt: &'a IfStmt, span: Span) -> (Vec<ChainArm<'a>>, Vec<Span>) {
    let mut arms = Vec::new();
    let mut links = vec![span];
    arms.push(ChainArm {
        cond: Some(&ifstmt.cond),
        body: &ifstmt.then_branch,
        span,
    });

    let mut tail = ifstmt.else_branch.as_deref();
    while let Some(stmt) = tail {
        match &stmt.kind {
            StmtKind::If(next) => {
                links.push(stmt.span);
                arms.push(ChainArm {
                    cond: Some(&next.cond),
                    body: &next.then_branch,
                    span: stmt.span,
                });
                tail = next.else_branch.as_deref();
            }
            StmtKind::Block(stmts) => {
                arms.push(ChainArm {
                    cond: None,
                    body: stmts,
                    span: stmt.span,
                });
                tail = None;
            }
            _ => {
                // single-statement else arm
                arms.push(ChainArm {
                    cond: None,
                    body: std::slice::from_ref(stmt),
                    span: stmt.span,
                });
                tail = None;
            }
        }
    }
    (arms, links)
}

/// Seen-set of already-expanded chains, keyed by `if` spans, so a chain is
/// expanded once no matter how often its links are revisited.
#[derive(Debug, Default)]
pub struct VisitedIfChains {
    seen: HashSet<Span>,
}

impl VisitedIfChains {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, span: Span) -> bool {
        self.seen.contains(&span)
    }

    pub fn mark(&mut self, links: &[Span]) {
        self.seen.extend(links.iter().copied());
    }
}
