// context.rs — Per-translation-unit analysis context
//
// Central store for one unit's analysis: interned names, the classifier,
// recorded MPI calls with stable ids, the outstanding-request set, rank
// variables, rank cases, and accumulated diagnostics. A fresh context is
// built per translation unit; nothing survives across units.
//
// Preconditions: `tu` outlives the context.
// Postconditions: `calls` preserves insertion order; ids are monotonic.
// Failure modes: none.
// Side effects: none beyond the context's own state.

use std::collections::HashSet;

use crate::args::Argument;
use crate::ast::{FnId, Span, TranslationUnit, VarId};
use crate::classify::FuncClassifier;
use crate::diag::Diagnostic;
use crate::intern::{Interner, NameId};

// ── Stable call ids ─────────────────────────────────────────────────────────

/// Stable identifier of one recorded MPI call site. Allocated in source
/// order, never reused within a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u32);

// ── Records ─────────────────────────────────────────────────────────────────

/// One observed MPI call: callee, call-site span, and one fingerprint per
/// positional argument.
#[derive(Debug, Clone)]
pub struct MpiCall {
    pub id: CallId,
    pub callee: NameId,
    pub span: Span,
    pub args: Vec<Argument>,
    /// Function definition the call appears in.
    pub enclosing: Option<FnId>,
    /// Transient flag of the redundancy scan; always false outside it.
    pub(crate) marked: bool,
}

/// An outstanding non-blocking request binding. `elem` is the literal
/// subscript when the request argument was exactly `array[literal]`;
/// `None` is a scalar request or a dynamic subscript (wildcard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRequest {
    pub var: VarId,
    pub elem: Option<u64>,
    pub origin: CallId,
    pub origin_span: Span,
}

/// One execution arm of a rank-dependent conditional chain.
#[derive(Debug, Clone)]
pub struct RankCase {
    /// Fingerprint of the arm's own condition; `None` for a final `else`.
    pub condition: Option<Argument>,
    /// Conditions of all earlier arms in the same chain, in source order,
    /// recorded unmodified (consumers interpret them as negated).
    pub unmatched: Vec<Argument>,
    /// Indices into the recorded-call list, in lexical order.
    pub calls: Vec<usize>,
    pub span: Span,
}

// ── Context ─────────────────────────────────────────────────────────────────

pub struct AnalysisCtx<'tu> {
    pub tu: &'tu TranslationUnit,
    pub interner: Interner,
    pub classifier: FuncClassifier,
    /// Interned name per function declaration, aligned with `tu.fns`.
    fn_names: Vec<NameId>,
    pub calls: Vec<MpiCall>,
    pub requests: Vec<MpiRequest>,
    pub rank_vars: HashSet<VarId>,
    pub rank_cases: Vec<RankCase>,
    pub diagnostics: Vec<Diagnostic>,
    next_call: u32,
    pub(crate) current_function: Option<FnId>,
}

impl<'tu> AnalysisCtx<'tu> {
    pub fn new(tu: &'tu TranslationUnit) -> Self {
        let mut interner = Interner::new();
        let classifier = FuncClassifier::new(&mut interner);
        let fn_names = tu
            .fns
            .iter()
            .map(|decl| interner.intern(&decl.name))
            .collect();
        AnalysisCtx {
            tu,
            interner,
            classifier,
            fn_names,
            calls: Vec::new(),
            requests: Vec::new(),
            rank_vars: HashSet::new(),
            rank_cases: Vec::new(),
            diagnostics: Vec::new(),
            next_call: 0,
            current_function: None,
        }
    }

    /// Interned name of a function declaration.
    pub fn name_of(&self, id: FnId) -> NameId {
        self.fn_names[id.0 as usize]
    }

    /// Byte-exact source spelling of a span.
    pub fn snippet(&self, span: Span) -> &str {
        self.tu.source.snippet(span)
    }

    /// `file:line:col` of a span's start.
    pub fn location(&self, span: Span) -> String {
        self.tu.source.location(span)
    }

    /// Record a decomposed call, assigning the next stable id. Returns the
    /// call's index in the recorded list.
    pub fn record_call(&mut self, callee: NameId, span: Span, args: Vec<Argument>) -> usize {
        let id = CallId(self.next_call);
        self.next_call += 1;
        self.calls.push(MpiCall {
            id,
            callee,
            span,
            args,
            enclosing: self.current_function,
            marked: false,
        });
        self.calls.len() - 1
    }

    /// Push a diagnostic, tagging it with the current function unless the
    /// check attributed one already.
    pub fn emit(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.function.is_none() {
            if let Some(f) = self.current_function {
                diagnostic.function = Some(self.tu.func(f).name.clone());
            }
        }
        self.diagnostics.push(diagnostic);
    }

    /// Name of a function definition's declaration, for attribution by
    /// checks that run after the walk.
    pub fn function_name(&self, id: Option<FnId>) -> Option<String> {
        id.map(|f| self.tu.func(f).name.clone())
    }

    /// True while any call carries the redundancy-scan mark. The scan
    /// clears every mark before returning.
    pub fn has_marked_calls(&self) -> bool {
        self.calls.iter().any(|c| c.marked)
    }

    /// Find an outstanding request matching `var` and, when both sides
    /// carry one, the element subscript. A `None` on either side is a
    /// wildcard.
    pub fn find_request(&self, var: VarId, elem: Option<u64>) -> Option<usize> {
        // exact element match wins over wildcard consumption
        if elem.is_some() {
            if let Some(i) = self
                .requests
                .iter()
                .position(|r| r.var == var && r.elem == elem)
            {
                return Some(i);
            }
        }
        self.requests
            .iter()
            .position(|r| r.var == var && (r.elem == elem || r.elem.is_none() || elem.is_none()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceMap;

    fn empty_tu() -> TranslationUnit {
        TranslationUnit {
            source: SourceMap::new("t.c", ""),
            vars: Vec::new(),
            fns: Vec::new(),
            functions: Vec::new(),
        }
    }

    #[test]
    fn call_ids_are_monotonic() {
        let tu = empty_tu();
        let mut ctx = AnalysisCtx::new(&tu);
        let name = ctx.interner.intern("MPI_Send");
        let a = ctx.record_call(name, Span::default(), Vec::new());
        let b = ctx.record_call(name, Span::default(), Vec::new());
        assert_eq!(ctx.calls[a].id, CallId(0));
        assert_eq!(ctx.calls[b].id, CallId(1));
        assert!(ctx.calls[a].id < ctx.calls[b].id);
    }

    #[test]
    fn request_lookup_prefers_exact_element() {
        let tu = empty_tu();
        let mut ctx = AnalysisCtx::new(&tu);
        ctx.requests.push(MpiRequest {
            var: VarId(0),
            elem: None,
            origin: CallId(0),
            origin_span: Span::default(),
        });
        ctx.requests.push(MpiRequest {
            var: VarId(0),
            elem: Some(1),
            origin: CallId(1),
            origin_span: Span::default(),
        });
        assert_eq!(ctx.find_request(VarId(0), Some(1)), Some(1));
        assert_eq!(ctx.find_request(VarId(0), None), Some(0));
        assert_eq!(ctx.find_request(VarId(1), None), None);
    }
}
