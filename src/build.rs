// build.rs — Programmatic translation-unit construction
//
// Bridge API for constructing `TranslationUnit`s without a frontend dump:
// declare variables and functions, assemble statement trees with the free
// helper functions, then `finish()` renders a consistent C-like source
// buffer and assigns every node's span into it, so snippets and locations
// behave exactly as they would on real source.
//
// Preconditions: expression helpers produce nodes with placeholder spans.
// Postconditions: every span in the finished unit indexes its rendered text.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write;

use crate::ast::{
    BinOp, Builtin, CType, Expr, ExprKind, FnDecl, FnId, FunctionDef, IfStmt, SourceMap, Span,
    Stmt, StmtKind, TranslationUnit, TypeKind, UnaryOp, VarDecl, VarId,
};

// ── Expression helpers ──────────────────────────────────────────────────────

pub fn int(value: i128) -> Expr {
    expr(ExprKind::IntLit(value))
}

pub fn float(value: f64) -> Expr {
    expr(ExprKind::FloatLit(value))
}

pub fn var(id: VarId) -> Expr {
    expr(ExprKind::Var(id))
}

pub fn call(callee: FnId, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call { callee, args })
}

pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    expr(ExprKind::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

pub fn addr_of(operand: Expr) -> Expr {
    expr(ExprKind::Unary {
        op: UnaryOp::AddrOf,
        operand: Box::new(operand),
    })
}

pub fn index(base: Expr, idx: Expr) -> Expr {
    expr(ExprKind::Index {
        base: Box::new(base),
        index: Box::new(idx),
    })
}

fn expr(kind: ExprKind) -> Expr {
    Expr {
        kind,
        span: Span::default(),
    }
}

// ── Statement helpers ───────────────────────────────────────────────────────

pub fn expr_stmt(e: Expr) -> Stmt {
    stmt(StmtKind::Expr(e))
}

pub fn decl_stmt(var: VarId, init: Option<Expr>) -> Stmt {
    stmt(StmtKind::Decl { var, init })
}

pub fn if_stmt(cond: Expr, then_branch: Vec<Stmt>, else_branch: Option<Stmt>) -> Stmt {
    stmt(StmtKind::If(IfStmt {
        cond,
        then_branch,
        else_branch: else_branch.map(Box::new),
    }))
}

/// A plain `else { ... }` arm, for the tail of `if_stmt`.
pub fn else_block(stmts: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Block(stmts))
}

pub fn while_stmt(cond: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::While { cond, body })
}

pub fn ret(e: Option<Expr>) -> Stmt {
    stmt(StmtKind::Return(e))
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt {
        kind,
        span: Span::default(),
    }
}

// ── Builder ─────────────────────────────────────────────────────────────────

pub struct TuBuilder {
    file: String,
    vars: Vec<VarDecl>,
    fns: Vec<FnDecl>,
    bodies: Vec<(FnId, Vec<Stmt>)>,
}

impl TuBuilder {
    pub fn new(file: impl Into<String>) -> Self {
        TuBuilder {
            file: file.into(),
            vars: Vec::new(),
            fns: Vec::new(),
            bodies: Vec::new(),
        }
    }

    /// Declare a variable.
    pub fn var(&mut self, name: impl Into<String>, ty: CType) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarDecl {
            name: name.into(),
            ty,
        });
        id
    }

    /// Declare a function.
    pub fn func(&mut self, name: impl Into<String>, ret: CType, arity: Option<usize>) -> FnId {
        let id = FnId(self.fns.len() as u32);
        self.fns.push(FnDecl {
            name: name.into(),
            ret,
            arity,
        });
        id
    }

    /// Attach a body to a declared function.
    pub fn define(&mut self, decl: FnId, body: Vec<Stmt>) {
        self.bodies.push((decl, body));
    }

    /// Render the source buffer, assign spans, and produce the unit.
    pub fn finish(self) -> TranslationUnit {
        let TuBuilder {
            file,
            vars,
            fns,
            mut bodies,
        } = self;

        let mut renderer = Renderer {
            vars: &vars,
            fns: &fns,
            out: String::new(),
        };

        let mut functions = Vec::with_capacity(bodies.len());
        for (decl, body) in &mut bodies {
            let start = renderer.pos();
            let signature = &fns[decl.0 as usize];
            let _ = writeln!(
                renderer.out,
                "{} {}() {{",
                type_prefix(&signature.ret),
                signature.name
            );
            for s in body.iter_mut() {
                renderer.render_stmt(s, 1);
            }
            renderer.out.push_str("}\n\n");
            functions.push(FunctionDef {
                decl: *decl,
                body: std::mem::take(body),
                span: Span::new(start, renderer.pos()),
            });
        }

        TranslationUnit {
            source: SourceMap::new(file, renderer.out),
            vars,
            fns,
            functions,
        }
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

struct Renderer<'a> {
    vars: &'a [VarDecl],
    fns: &'a [FnDecl],
    out: String,
}

impl Renderer<'_> {
    fn pos(&self) -> u32 {
        self.out.len() as u32
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str("    ");
        }
    }

    fn render_stmt(&mut self, stmt: &mut Stmt, level: usize) {
        if matches!(stmt.kind, StmtKind::If(_)) {
            self.indent(level);
            self.render_if_chain(stmt, level);
            self.out.push('\n');
            return;
        }
        match &mut stmt.kind {
            StmtKind::Expr(e) => {
                self.indent(level);
                let start = self.pos();
                self.render_expr(e);
                self.out.push(';');
                stmt.span = Span::new(start, self.pos());
                self.out.push('\n');
            }
            StmtKind::Decl { var, init } => {
                self.indent(level);
                let start = self.pos();
                let decl = &self.vars[var.0 as usize];
                let _ = write!(self.out, "{} {}", type_prefix(&decl.ty), decl.name);
                if let Some(len) = decl.ty.array_len {
                    let _ = write!(self.out, "[{len}]");
                }
                if let Some(init) = init {
                    self.out.push_str(" = ");
                    self.render_expr(init);
                }
                self.out.push(';');
                stmt.span = Span::new(start, self.pos());
                self.out.push('\n');
            }
            StmtKind::If(_) => unreachable!("handled above"),
            StmtKind::While { cond, body } => {
                self.indent(level);
                let start = self.pos();
                self.out.push_str("while (");
                self.render_expr(cond);
                self.out.push_str(") {\n");
                for s in body.iter_mut() {
                    self.render_stmt(s, level + 1);
                }
                self.indent(level);
                self.out.push('}');
                stmt.span = Span::new(start, self.pos());
                self.out.push('\n');
            }
            StmtKind::Block(stmts) => {
                self.indent(level);
                let start = self.pos();
                self.out.push_str("{\n");
                for s in stmts.iter_mut() {
                    self.render_stmt(s, level + 1);
                }
                self.indent(level);
                self.out.push('}');
                stmt.span = Span::new(start, self.pos());
                self.out.push('\n');
            }
            StmtKind::Return(e) => {
                self.indent(level);
                let start = self.pos();
                self.out.push_str("return");
                if let Some(e) = e {
                    self.out.push(' ');
                    self.render_expr(e);
                }
                self.out.push(';');
                stmt.span = Span::new(start, self.pos());
                self.out.push('\n');
            }
        }
    }

    /// Render an `if`/`else if`/`else` chain; each link's span starts at
    /// its own `if` keyword and runs to the end of the chain.
    fn render_if_chain(&mut self, stmt: &mut Stmt, level: usize) {
        let start = self.pos();
        let StmtKind::If(ifstmt) = &mut stmt.kind else {
            unreachable!("render_if_chain on non-if statement");
        };

        self.out.push_str("if (");
        self.render_expr(&mut ifstmt.cond);
        self.out.push_str(") {\n");
        for s in ifstmt.then_branch.iter_mut() {
            self.render_stmt(s, level + 1);
        }
        self.indent(level);
        self.out.push('}');

        if let Some(else_branch) = ifstmt.else_branch.as_deref_mut() {
            self.out.push_str(" else ");
            if matches!(else_branch.kind, StmtKind::If(_)) {
                self.render_if_chain(else_branch, level);
            } else if let StmtKind::Block(stmts) = &mut else_branch.kind {
                let else_start = self.pos();
                self.out.push_str("{\n");
                for s in stmts.iter_mut() {
                    self.render_stmt(s, level + 1);
                }
                self.indent(level);
                self.out.push('}');
                else_branch.span = Span::new(else_start, self.pos());
            } else {
                // single-statement else arm
                let else_start = self.pos();
                self.out.push_str("{\n");
                self.render_stmt(else_branch, level + 1);
                self.indent(level);
                self.out.push('}');
                else_branch.span = Span::new(else_start, self.pos());
            }
        }
        stmt.span = Span::new(start, self.pos());
    }

    fn render_expr(&mut self, expr: &mut Expr) {
        let start = self.pos();
        match &mut expr.kind {
            ExprKind::IntLit(v) => {
                let _ = write!(self.out, "{v}");
            }
            ExprKind::FloatLit(v) => {
                let _ = write!(self.out, "{v:?}");
            }
            ExprKind::Var(id) => self.out.push_str(&self.vars[id.0 as usize].name),
            ExprKind::Call { callee, args } => {
                let name = self.fns[callee.0 as usize].name.clone();
                self.out.push_str(&name);
                self.out.push('(');
                let last = args.len().saturating_sub(1);
                for (i, arg) in args.iter_mut().enumerate() {
                    self.render_expr(arg);
                    if i != last {
                        self.out.push_str(", ");
                    }
                }
                self.out.push(')');
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                self.render_expr(lhs);
                let _ = write!(self.out, " {} ", op.symbol());
                self.render_expr(rhs);
            }
            ExprKind::Unary { op, operand } => {
                self.out.push_str(match op {
                    UnaryOp::AddrOf => "&",
                    UnaryOp::Deref => "*",
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                });
                self.render_expr(operand);
            }
            ExprKind::Index { base, index } => {
                self.render_expr(base);
                self.out.push('[');
                self.render_expr(index);
                self.out.push(']');
            }
        }
        expr.span = Span::new(start, self.pos());
    }
}

/// Base type spelling for declaration rendering (array extents are
/// rendered after the declarator).
fn type_prefix(ty: &CType) -> String {
    let base = match &ty.kind {
        TypeKind::Builtin(b) => builtin_name(*b).to_owned(),
        TypeKind::Complex(b) => format!("{} _Complex", builtin_name(*b)),
        TypeKind::Typedef { name, .. } => name.clone(),
        TypeKind::Record(name) => format!("struct {name}"),
        TypeKind::Opaque(name) => name.clone(),
        TypeKind::Void => "void".to_owned(),
    };
    if ty.pointer {
        format!("{base} *")
    } else {
        base
    }
}

fn builtin_name(b: Builtin) -> &'static str {
    match b {
        Builtin::Bool => "bool",
        Builtin::Char => "char",
        Builtin::SChar => "signed char",
        Builtin::UChar => "unsigned char",
        Builtin::WChar => "wchar_t",
        Builtin::Short => "short",
        Builtin::UShort => "unsigned short",
        Builtin::Int => "int",
        Builtin::UInt => "unsigned",
        Builtin::Long => "long",
        Builtin::ULong => "unsigned long",
        Builtin::LongLong => "long long",
        Builtin::ULongLong => "unsigned long long",
        Builtin::Float => "float",
        Builtin::Double => "double",
        Builtin::LongDouble => "long double",
    }
}

// ── Common MPI declarations ─────────────────────────────────────────────────

/// The MPI declarations most units need, declared once per builder. Handy
/// for tests, benchmarks, and bridge smoke checks.
pub struct MpiEnv {
    pub send: FnId,
    pub ssend: FnId,
    pub isend: FnId,
    pub recv: FnId,
    pub irecv: FnId,
    pub scatter: FnId,
    pub gather: FnId,
    pub alltoall: FnId,
    pub bcast: FnId,
    pub ibcast: FnId,
    pub reduce: FnId,
    pub allreduce: FnId,
    pub barrier: FnId,
    pub wait: FnId,
    pub waitall: FnId,
    pub comm_rank: FnId,
    pub comm_world: VarId,
    pub dt_int: VarId,
    pub dt_double: VarId,
    pub dt_float: VarId,
    pub dt_char: VarId,
    pub op_sum: VarId,
    pub in_place: VarId,
    pub status_ignore: VarId,
}

impl MpiEnv {
    pub fn declare(b: &mut TuBuilder) -> Self {
        let int = CType::builtin(Builtin::Int);
        MpiEnv {
            send: b.func("MPI_Send", int.clone(), Some(6)),
            ssend: b.func("MPI_Ssend", int.clone(), Some(6)),
            isend: b.func("MPI_Isend", int.clone(), Some(7)),
            recv: b.func("MPI_Recv", int.clone(), Some(7)),
            irecv: b.func("MPI_Irecv", int.clone(), Some(7)),
            scatter: b.func("MPI_Scatter", int.clone(), Some(8)),
            gather: b.func("MPI_Gather", int.clone(), Some(8)),
            alltoall: b.func("MPI_Alltoall", int.clone(), Some(7)),
            bcast: b.func("MPI_Bcast", int.clone(), Some(5)),
            ibcast: b.func("MPI_Ibcast", int.clone(), Some(6)),
            reduce: b.func("MPI_Reduce", int.clone(), Some(7)),
            allreduce: b.func("MPI_Allreduce", int.clone(), Some(6)),
            barrier: b.func("MPI_Barrier", int.clone(), Some(1)),
            wait: b.func("MPI_Wait", int.clone(), Some(2)),
            waitall: b.func("MPI_Waitall", int.clone(), Some(3)),
            comm_rank: b.func("MPI_Comm_rank", int, Some(2)),
            comm_world: b.var("MPI_COMM_WORLD", CType::opaque("MPI_Comm")),
            dt_int: b.var("MPI_INT", CType::opaque("MPI_Datatype")),
            dt_double: b.var("MPI_DOUBLE", CType::opaque("MPI_Datatype")),
            dt_float: b.var("MPI_FLOAT", CType::opaque("MPI_Datatype")),
            dt_char: b.var("MPI_CHAR", CType::opaque("MPI_Datatype")),
            op_sum: b.var("MPI_SUM", CType::opaque("MPI_Op")),
            in_place: b.var("MPI_IN_PLACE", CType::opaque("MPI_Aint")),
            status_ignore: b.var("MPI_STATUS_IGNORE", CType::opaque("MPI_Status")),
        }
    }
}
