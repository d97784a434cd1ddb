// ast.rs — Translation-unit AST consumed by the analyzer
//
// Data-only model of one C/C++ translation unit as produced by a frontend
// bridge. Declarations live in arenas and are referenced by `VarId`/`FnId`,
// so identity comparisons are integer comparisons. Every expression and
// statement carries a byte `Span` into the unit's source buffer.
//
// Preconditions: produced by `build::TuBuilder` or `loader::load_translation_unit`.
// Postconditions: spans index into `source`; arena ids are in range.
// Failure modes: none (data-only module).
// Side effects: none.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Spans and source mapping ────────────────────────────────────────────────

/// Byte-offset range into a translation unit's source buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// One-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Source manager for one translation unit: byte-exact snippets and
/// `file:line:col` rendering for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub file: String,
    pub text: String,
}

impl SourceMap {
    pub fn new(file: impl Into<String>, text: impl Into<String>) -> Self {
        SourceMap {
            file: file.into(),
            text: text.into(),
        }
    }

    /// The source text covered by `span`, unmodified.
    pub fn snippet(&self, span: Span) -> &str {
        let start = (span.start as usize).min(self.text.len());
        let end = (span.end as usize).min(self.text.len());
        &self.text[start..end]
    }

    /// Line/column of a byte offset (one-based).
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = (offset as usize).min(self.text.len());
        let mut line = 1u32;
        let mut col = 1u32;
        for b in self.text.as_bytes()[..offset].iter() {
            if *b == b'\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        LineCol { line, col }
    }

    /// Render the start of `span` as `file:line:col`.
    pub fn location(&self, span: Span) -> String {
        let lc = self.line_col(span.start);
        format!("{}:{}:{}", self.file, lc.line, lc.col)
    }
}

// ── Declaration arenas ──────────────────────────────────────────────────────

/// Index of a variable declaration in `TranslationUnit::vars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

/// Index of a function declaration in `TranslationUnit::fns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FnId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: CType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnDecl {
    pub name: String,
    pub ret: CType,
    /// Declared parameter count, when the bridge knows it.
    pub arity: Option<usize>,
}

// ── C type model ────────────────────────────────────────────────────────────

/// Builtin C scalar kinds, as seen after desugaring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Bool,
    Char,
    SChar,
    UChar,
    WChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
}

impl Builtin {
    pub fn is_floating(self) -> bool {
        matches!(self, Builtin::Float | Builtin::Double | Builtin::LongDouble)
    }

    /// Integer in the C sense: everything that is not a floating kind,
    /// including `bool` and the character kinds.
    pub fn is_integer(self) -> bool {
        !self.is_floating()
    }
}

/// Unqualified, desugared base of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Builtin(Builtin),
    /// `_Complex` with the given element kind.
    Complex(Builtin),
    /// A typedef name plus the builtin it resolves to. The spelling takes
    /// precedence over the underlying kind for exact-width matching.
    Typedef { name: String, underlying: Builtin },
    /// struct/union/class by tag name.
    Record(String),
    /// Opaque library handle (`MPI_Comm`, `MPI_Datatype`, `MPI_Request`, ...).
    Opaque(String),
    Void,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CType {
    pub kind: TypeKind,
    pub pointer: bool,
    /// Constant array extent, when declared as an array.
    pub array_len: Option<u32>,
}

impl CType {
    pub fn builtin(kind: Builtin) -> Self {
        CType {
            kind: TypeKind::Builtin(kind),
            pointer: false,
            array_len: None,
        }
    }

    pub fn pointer_to(kind: TypeKind) -> Self {
        CType {
            kind,
            pointer: true,
            array_len: None,
        }
    }

    pub fn array_of(kind: TypeKind, len: u32) -> Self {
        CType {
            kind,
            pointer: false,
            array_len: Some(len),
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        CType {
            kind: TypeKind::Opaque(name.into()),
            pointer: false,
            array_len: None,
        }
    }

    pub fn void() -> Self {
        CType {
            kind: TypeKind::Void,
            pointer: false,
            array_len: None,
        }
    }

    /// The desugared builtin behind this type's base, if any. Typedefs
    /// resolve to their underlying kind; complex types resolve to their
    /// element kind.
    pub fn desugared(&self) -> Option<Builtin> {
        match &self.kind {
            TypeKind::Builtin(b) => Some(*b),
            TypeKind::Complex(b) => Some(*b),
            TypeKind::Typedef { underlying, .. } => Some(*underlying),
            _ => None,
        }
    }

    /// Floating in the C sense: a plain (non-pointer, non-array) scalar
    /// whose desugared kind is a floating kind. `_Complex` is not floating.
    pub fn is_floating(&self) -> bool {
        if self.pointer || self.array_len.is_some() {
            return false;
        }
        match &self.kind {
            TypeKind::Builtin(b) => b.is_floating(),
            TypeKind::Typedef { underlying, .. } => underlying.is_floating(),
            _ => false,
        }
    }

    /// Integer in the C sense: a plain scalar of integer kind.
    pub fn is_integer(&self) -> bool {
        if self.pointer || self.array_len.is_some() {
            return false;
        }
        match &self.kind {
            TypeKind::Builtin(b) => b.is_integer(),
            TypeKind::Typedef { underlying, .. } => underlying.is_integer(),
            _ => false,
        }
    }
}

// ── Expressions ─────────────────────────────────────────────────────────────

/// Binary operator kinds, as recorded in argument fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::LogAnd => "&&",
            BinOp::LogOr => "||",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    AddrOf,
    Deref,
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    IntLit(i128),
    FloatLit(f64),
    Var(VarId),
    Call { callee: FnId, args: Vec<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Index { base: Box<Expr>, index: Box<Expr> },
}

// ── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Expr(Expr),
    /// Local declaration; the variable lives in the unit's arena.
    Decl { var: VarId, init: Option<Expr> },
    If(IfStmt),
    While { cond: Expr, body: Vec<Stmt> },
    Block(Vec<Stmt>),
    Return(Option<Expr>),
}

/// One `if`; `else_branch` is another `If` statement for `else if` chains,
/// or a `Block` for a plain `else`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Vec<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

// ── Translation unit ────────────────────────────────────────────────────────

/// A function definition: a declared function with a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub decl: FnId,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// One source file and its transitive includes, as delivered by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub source: SourceMap,
    pub vars: Vec<VarDecl>,
    pub fns: Vec<FnDecl>,
    pub functions: Vec<FunctionDef>,
}

impl TranslationUnit {
    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.0 as usize]
    }

    pub fn func(&self, id: FnId) -> &FnDecl {
        &self.fns[id.0 as usize]
    }
}

// ── Call traversal helper ───────────────────────────────────────────────────

/// Invoke `f` for every call expression under `stmts`, in source order
/// (outer calls before calls nested in their arguments).
pub fn for_each_call<F: FnMut(&Expr, FnId, &[Expr])>(stmts: &[Stmt], f: &mut F) {
    for stmt in stmts {
        for_each_call_in_stmt(stmt, f);
    }
}

fn for_each_call_in_stmt<F: FnMut(&Expr, FnId, &[Expr])>(stmt: &Stmt, f: &mut F) {
    match &stmt.kind {
        StmtKind::Expr(e) => for_each_call_in_expr(e, f),
        StmtKind::Decl { init, .. } => {
            if let Some(e) = init {
                for_each_call_in_expr(e, f);
            }
        }
        StmtKind::If(ifs) => {
            for_each_call_in_expr(&ifs.cond, f);
            for_each_call(&ifs.then_branch, f);
            if let Some(e) = &ifs.else_branch {
                for_each_call_in_stmt(e, f);
            }
        }
        StmtKind::While { cond, body } => {
            for_each_call_in_expr(cond, f);
            for_each_call(body, f);
        }
        StmtKind::Block(stmts) => for_each_call(stmts, f),
        StmtKind::Return(e) => {
            if let Some(e) = e {
                for_each_call_in_expr(e, f);
            }
        }
    }
}

fn for_each_call_in_expr<F: FnMut(&Expr, FnId, &[Expr])>(expr: &Expr, f: &mut F) {
    match &expr.kind {
        ExprKind::Call { callee, args } => {
            f(expr, *callee, args);
            for arg in args {
                for_each_call_in_expr(arg, f);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            for_each_call_in_expr(lhs, f);
            for_each_call_in_expr(rhs, f);
        }
        ExprKind::Unary { operand, .. } => for_each_call_in_expr(operand, f),
        ExprKind::Index { base, index } => {
            for_each_call_in_expr(base, f);
            for_each_call_in_expr(index, f);
        }
        ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::Var(_) => {}
    }
}
