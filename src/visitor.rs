// visitor.rs — Translation-unit traversal driver
//
// Walks every function body in source order, dispatching to the argument
// decomposer, the rank-case builder, and the checks: per-call checks run as
// each call is decomposed, rank chains expand into rank cases as they are
// encountered, and the global scans (redundancy, pair matching) run after
// the full walk.
//
// Preconditions: `tu` is a well-formed translation unit.
// Postconditions: every MPI call is recorded exactly once, in source order;
//                 all diagnostics are accumulated on the returned context.
// Failure modes: none — findings become diagnostics, never errors.
// Side effects: none outside the context.

use crate::args::{decompose, Argument};
use crate::ast::{Expr, ExprKind, FnId, IfStmt, Span, Stmt, StmtKind, TranslationUnit, VarId};
use crate::context::{AnalysisCtx, RankCase};
use crate::diag::Diagnostic;
use crate::rank::{self, VisitedIfChains};

// ── Public types ────────────────────────────────────────────────────────────

/// Result of analyzing one translation unit.
#[derive(Debug)]
pub struct AnalysisResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Requests bound by a non-blocking call and never waited on.
    pub outstanding: Vec<OutstandingRequest>,
}

/// A request still outstanding when the unit's final call has been
/// processed.
#[derive(Debug, Clone)]
pub struct OutstandingRequest {
    pub var: VarId,
    pub name: String,
    pub elem: Option<u64>,
    pub origin_span: Span,
}

// ── Public entry points ─────────────────────────────────────────────────────

/// Run the full analysis over one translation unit.
pub fn analyze_translation_unit(tu: &TranslationUnit) -> AnalysisResult {
    let ctx = analyze_into_context(tu);
    let outstanding = ctx
        .requests
        .iter()
        .map(|r| OutstandingRequest {
            var: r.var,
            name: tu.var(r.var).name.clone(),
            elem: r.elem,
            origin_span: r.origin_span,
        })
        .collect();
    AnalysisResult {
        diagnostics: ctx.diagnostics,
        outstanding,
    }
}

/// Run the full analysis and hand back the finished context, for callers
/// that inspect recorded calls, rank cases, or the request set directly.
pub fn analyze_into_context(tu: &TranslationUnit) -> AnalysisCtx<'_> {
    let mut ctx = AnalysisCtx::new(tu);

    // pre-pass: rank variables must be known before any chain is classified
    rank::collect_rank_variables(&mut ctx);

    let mut driver = Driver {
        seen: VisitedIfChains::new(),
        rank_depth: 0,
    };
    for function in &tu.functions {
        ctx.current_function = Some(function.decl);
        driver.walk_stmts(&mut ctx, &function.body);
    }
    ctx.current_function = None;

    // global scans over the recorded calls and rank cases
    ctx.check_redundant_calls();
    ctx.check_unmatched_calls();
    ctx
}

// ── Driver ──────────────────────────────────────────────────────────────────

struct Driver {
    seen: VisitedIfChains,
    /// Number of rank-case arms the walk is currently inside. Non-zero
    /// while statements of an expanded chain arm are being visited.
    rank_depth: usize,
}

impl Driver {
    fn walk_stmts(&mut self, ctx: &mut AnalysisCtx, stmts: &[Stmt]) {
        for stmt in stmts {
            self.walk_stmt(ctx, stmt);
        }
    }

    fn walk_stmt(&mut self, ctx: &mut AnalysisCtx, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.walk_expr(ctx, expr),
            StmtKind::Decl { init, .. } => {
                if let Some(init) = init {
                    self.walk_expr(ctx, init);
                }
            }
            StmtKind::If(ifstmt) => self.walk_if(ctx, ifstmt, stmt.span),
            StmtKind::While { cond, body } => {
                self.walk_expr(ctx, cond);
                self.walk_stmts(ctx, body);
            }
            StmtKind::Block(stmts) => self.walk_stmts(ctx, stmts),
            StmtKind::Return(expr) => {
                if let Some(expr) = expr {
                    self.walk_expr(ctx, expr);
                }
            }
        }
    }

    /// A conditional whose head condition mentions a rank variable expands
    /// into one rank case per arm; anything else is ordinary traversal.
    fn walk_if(&mut self, ctx: &mut AnalysisCtx, ifstmt: &IfStmt, span: Span) {
        if !rank::is_rank_branch(ctx, &ifstmt.cond) || self.seen.contains(span) {
            self.walk_expr(ctx, &ifstmt.cond);
            self.walk_stmts(ctx, &ifstmt.then_branch);
            if let Some(else_branch) = &ifstmt.else_branch {
                self.walk_stmt(ctx, else_branch);
            }
            return;
        }

        let (arms, links) = rank::chain_arms(ifstmt, span);
        self.seen.mark(&links);

        let mut unmatched: Vec<Argument> = Vec::new();
        for arm in arms {
            if let Some(cond) = arm.cond {
                self.walk_expr(ctx, cond);
            }
            let condition = arm.cond.map(decompose);

            // reserve the case before walking so cases appear in source
            // order even when nested chains expand inside the arm
            let case_idx = ctx.rank_cases.len();
            ctx.rank_cases.push(RankCase {
                condition: condition.clone(),
                unmatched: unmatched.clone(),
                calls: Vec::new(),
                span: arm.span,
            });
            if let Some(condition) = condition {
                unmatched.push(condition);
            }

            let first_call = ctx.calls.len();
            self.rank_depth += 1;
            self.walk_stmts(ctx, arm.body);
            self.rank_depth -= 1;
            let recorded: Vec<usize> = (first_call..ctx.calls.len()).collect();
            ctx.rank_cases[case_idx].calls = recorded;
        }
    }

    fn walk_expr(&mut self, ctx: &mut AnalysisCtx, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call { callee, args } => {
                self.handle_call(ctx, expr, *callee, args);
                for arg in args {
                    self.walk_expr(ctx, arg);
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.walk_expr(ctx, lhs);
                self.walk_expr(ctx, rhs);
            }
            ExprKind::Unary { operand, .. } => self.walk_expr(ctx, operand),
            ExprKind::Index { base, index } => {
                self.walk_expr(ctx, base);
                self.walk_expr(ctx, index);
            }
            ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::Var(_) => {}
        }
    }

    /// Decompose and record an MPI call, then run the per-call checks.
    fn handle_call(&mut self, ctx: &mut AnalysisCtx, expr: &Expr, callee: FnId, args: &[Expr]) {
        let name = ctx.name_of(callee);
        if !ctx.classifier.is_mpi_type(name) {
            return;
        }
        debug_assert!(
            ctx.tu.func(callee).arity.map_or(true, |a| a == args.len()),
            "argument count disagrees with declared arity of {}",
            ctx.tu.func(callee).name
        );

        let fingerprints: Vec<Argument> = args.iter().map(decompose).collect();
        let call_idx = ctx.record_call(name, expr.span, fingerprints);

        ctx.check_buffer_type_match(call_idx);
        ctx.check_invalid_arg_types(call_idx);
        ctx.check_float_args(call_idx);
        if self.rank_depth > 0 {
            ctx.check_collective_call(call_idx);
        }
        ctx.check_request_usage(call_idx);
    }
}
