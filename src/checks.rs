// checks.rs — MPI schema invariant checks
//
// The check suite over recorded calls, fingerprints, and rank cases.
// Per-call checks run as soon as a call is decomposed; the redundancy and
// pair-matching scans run once per translation unit after the full walk.
//
// Preconditions: calls referenced by index exist in the context.
// Postconditions: violations become diagnostics; `marked` flags are false
//                 outside the redundancy scan.
// Failure modes: none — a check that cannot resolve a needed AST attribute
//                skips that call silently.
// Side effects: mutates the context's diagnostics and request set only.

use std::collections::HashSet;

use crate::args::{multiset_eq, Argument};
use crate::ast::{BinOp, Span, VarId};
use crate::context::{AnalysisCtx, CallId, MpiRequest};
use crate::diag::{DiagCategory, Diagnostic};
use crate::schema::{self, P2P_INTEGER_INDICES};
use crate::typematch;

impl AnalysisCtx<'_> {
    // ── Float-in-integer-slot (point-to-point) ──────────────────────────

    /// Report floating components in the count/rank/tag positions: one
    /// diagnostic per offending variable, float-literal group, or floating
    /// function return.
    pub fn check_float_args(&mut self, call_idx: usize) {
        let call = &self.calls[call_idx];
        if !self.classifier.is_point_to_point(call.callee) {
            return;
        }

        let mut findings: Vec<(usize, &'static str)> = Vec::new();
        for &idx in &P2P_INTEGER_INDICES {
            let Some(arg) = call.args.get(idx) else {
                continue;
            };
            for &var in &arg.variables {
                if self.tu.var(var).ty.is_floating() {
                    findings.push((idx, "variable"));
                }
            }
            if !arg.float_literals.is_empty() {
                findings.push((idx, "literal"));
            }
            for &function in &arg.functions {
                if self.tu.func(function).ret.is_floating() {
                    findings.push((idx, "return value from function"));
                }
            }
        }

        let span = call.span;
        for (idx, kind) in findings {
            self.emit(Diagnostic::new(
                DiagCategory::InvalidArgumentType,
                span,
                format!("float {kind} used at index {idx}"),
            ));
        }
    }

    // ── Invalid argument types (point-to-point) ─────────────────────────

    /// Report non-integer, non-floating components in the count/rank/tag
    /// positions (floating ones are covered by `check_float_args`).
    pub fn check_invalid_arg_types(&mut self, call_idx: usize) {
        let call = &self.calls[call_idx];
        if !self.classifier.is_point_to_point(call.callee) {
            return;
        }

        let mut findings: Vec<(usize, &'static str)> = Vec::new();
        for &idx in &P2P_INTEGER_INDICES {
            let Some(arg) = call.args.get(idx) else {
                continue;
            };
            for &var in &arg.variables {
                let ty = &self.tu.var(var).ty;
                if !ty.is_integer() && !ty.is_floating() {
                    findings.push((idx, "variable"));
                }
            }
            for &function in &arg.functions {
                let ret = &self.tu.func(function).ret;
                if !ret.is_integer() && !ret.is_floating() {
                    findings.push((idx, "return value from function"));
                }
            }
        }

        let span = call.span;
        for (idx, kind) in findings {
            self.emit(Diagnostic::new(
                DiagCategory::InvalidArgumentType,
                span,
                format!("non-integer {kind} used at index {idx}"),
            ));
        }
    }

    // ── Buffer/datatype match ───────────────────────────────────────────

    /// Check that each buffer's element type accepts the source spelling of
    /// its datatype argument, per the call family's index pairs.
    pub fn check_buffer_type_match(&mut self, call_idx: usize) {
        let call = &self.calls[call_idx];
        let mut pairs = schema::buffer_datatype_pairs(&self.classifier, call.callee);
        if pairs.is_empty() {
            return;
        }

        // reduce-family send buffer is exempt when literally MPI_IN_PLACE
        if self.classifier.is_reduce(call.callee) {
            if let Some(sendbuf) = call.args.first() {
                if self.snippet(sendbuf.span) == "MPI_IN_PLACE" {
                    pairs.retain(|&(buf, _)| buf != schema::reduce::SENDBUF);
                }
            }
        }

        let mut findings: Vec<(usize, usize, String)> = Vec::new();
        for (buf_idx, dt_idx) in pairs {
            let Some(buf_arg) = call.args.get(buf_idx) else {
                continue;
            };
            let Some(dt_arg) = call.args.get(dt_idx) else {
                continue;
            };
            let Some(buffer) = buf_arg.first_var() else {
                continue;
            };
            let datatype = self.snippet(dt_arg.span);
            if !typematch::buffer_matches_datatype(&self.tu.var(buffer).ty, datatype) {
                findings.push((buf_idx, dt_idx, datatype.to_owned()));
            }
        }

        let span = call.span;
        for (buf_idx, dt_idx, datatype) in findings {
            self.emit(Diagnostic::new(
                DiagCategory::TypeMismatch,
                span,
                format!(
                    "buffer type does not match MPI datatype '{datatype}' \
                     (buffer index {buf_idx}, datatype index {dt_idx})"
                ),
            ));
        }
    }

    // ── Request lifecycle ───────────────────────────────────────────────

    /// Track non-blocking request bindings and waits. A non-blocking call
    /// whose request is already outstanding is a double use; a wait whose
    /// request is not outstanding is an endless wait.
    pub fn check_request_usage(&mut self, call_idx: usize) {
        let callee = self.calls[call_idx].callee;
        let call_span = self.calls[call_idx].span;
        let call_id = self.calls[call_idx].id;

        if self.classifier.is_non_blocking(callee) {
            // the request is always the last argument
            let key = self.calls[call_idx]
                .args
                .last()
                .and_then(|arg| self.request_key(arg));
            let Some((var, elem)) = key else {
                return;
            };
            if let Some(prev) = self
                .requests
                .iter()
                .find(|r| r.var == var && r.elem == elem)
                .copied()
            {
                let name = self.tu.var(var).name.clone();
                let prev_loc = self.location(prev.origin_span);
                self.emit(
                    Diagnostic::new(
                        DiagCategory::DoubleNonblocking,
                        call_span,
                        format!("double use of request '{name}'; previously used at {prev_loc}"),
                    )
                    .with_related(prev.origin_span, "previous use"),
                );
            } else {
                self.requests.push(MpiRequest {
                    var,
                    elem,
                    origin: call_id,
                    origin_span: call_span,
                });
            }
        }

        if self.classifier.is_wait(callee) {
            let mut waited: Vec<(VarId, Option<u64>)> = Vec::new();
            if self.classifier.is_mpi_wait(callee) {
                let key = self.calls[call_idx]
                    .args
                    .first()
                    .and_then(|arg| self.request_key(arg));
                if let Some(key) = key {
                    waited.push(key);
                }
            } else if self.classifier.is_mpi_waitall(callee) {
                // expand exactly the declared array's elements
                let array = self.calls[call_idx].args.get(1).and_then(Argument::first_var);
                if let Some(var) = array {
                    match self.tu.var(var).ty.array_len {
                        Some(len) => {
                            for elem in 0..u64::from(len) {
                                waited.push((var, Some(elem)));
                            }
                        }
                        None => waited.push((var, None)),
                    }
                }
            }

            for (var, elem) in waited {
                match self.find_request(var, elem) {
                    Some(i) => {
                        self.requests.remove(i);
                    }
                    None => {
                        let name = self.tu.var(var).name.clone();
                        self.emit(Diagnostic::new(
                            DiagCategory::DoubleWait,
                            call_span,
                            format!("wait on non-existent request '{name}'"),
                        ));
                    }
                }
            }
        }
    }

    /// Identity of a request argument: its first variable plus the literal
    /// subscript when the expression is exactly `array[literal]`.
    fn request_key(&self, arg: &Argument) -> Option<(VarId, Option<u64>)> {
        let var = arg.first_var()?;
        let is_array = self.tu.var(var).ty.array_len.is_some();
        let elem = match (is_array, arg.variables.len(), arg.int_literals.as_slice()) {
            (true, 1, [lit]) if *lit >= 0 => Some(*lit as u64),
            _ => None,
        };
        Some((var, elem))
    }

    // ── Collective in rank branch ───────────────────────────────────────

    /// A collective operation must not be conditioned on rank. Run once
    /// per call, as it is decomposed, whenever the driver is inside a
    /// rank case — a call shared by nested cases is still checked once.
    pub fn check_collective_call(&mut self, call_idx: usize) {
        let call = &self.calls[call_idx];
        if !self.classifier.is_collective(call.callee) {
            return;
        }
        let span = call.span;
        let name = self.interner.resolve(call.callee).to_owned();
        self.emit(Diagnostic::new(
            DiagCategory::CallInRankBranch,
            span,
            format!("collective call '{name}' inside rank branch"),
        ));
    }

    // ── Redundant duplicate calls ───────────────────────────────────────

    /// Scan all recorded calls in insertion order for redundant duplicates.
    /// Marks suppress the symmetric report and are cleared afterwards.
    pub fn check_redundant_calls(&mut self) {
        for i in 0..self.calls.len() {
            self.check_redundant_call(i);
        }
        for call in &mut self.calls {
            call.marked = false;
        }
    }

    fn check_redundant_call(&mut self, i: usize) {
        let Some(indices) = schema::redundancy_indices(&self.classifier, self.calls[i].callee)
        else {
            return;
        };

        for j in 0..self.calls.len() {
            if !self.qualify_redundancy(i, j) {
                continue;
            }

            let mut identical = true;
            for &idx in indices.components {
                if !self.components_equal_at(i, j, idx) {
                    identical = false;
                    break;
                }
            }
            if identical {
                for &idx in indices.as_string {
                    if !self.spellings_equal_at(i, j, idx) {
                        identical = false;
                        break;
                    }
                }
            }
            if !identical {
                continue;
            }

            // all compared arguments equal: mark to omit the symmetric
            // report, then stop scanning for this call (transitivity
            // surfaces the rest of a duplicate group)
            self.calls[i].marked = true;

            let mut checked: Vec<usize> = indices.components.to_vec();
            checked.extend_from_slice(indices.as_string);
            checked.sort_unstable();
            let index_list = checked
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ");

            let span = self.calls[i].span;
            let other_span = self.calls[j].span;
            let other_name = self.interner.resolve(self.calls[j].callee).to_owned();
            let other_loc = self.location(other_span);
            let function = self.function_name(self.calls[i].enclosing);

            let mut diagnostic = Diagnostic::new(
                DiagCategory::RedundantCall,
                span,
                format!(
                    "identical communication arguments (indices {index_list}) \
                     as {other_name} at {other_loc}; consider combining these calls"
                ),
            )
            .with_related(other_span, "matching call");
            if let Some(function) = function {
                diagnostic = diagnostic.in_function(function);
            }
            self.emit(diagnostic);
            return;
        }
    }

    /// Two calls qualify for the redundancy comparison when the compared
    /// call is unmarked, distinct, of the same communication super-family,
    /// and (for point-to-point) the same direction or (for collectives)
    /// the same sub-family.
    fn qualify_redundancy(&self, i: usize, j: usize) -> bool {
        let a = self.calls[i].callee;
        let b = self.calls[j].callee;
        if self.calls[j].marked || self.calls[i].id == self.calls[j].id {
            return false;
        }
        let c = &self.classifier;
        if c.is_point_to_point(a) && c.is_point_to_point(b) {
            return (c.is_send(a) && c.is_send(b)) || (c.is_recv(a) && c.is_recv(b));
        }
        if c.is_collective(a) && c.is_collective(b) {
            return (c.is_scatter(a) && c.is_scatter(b))
                || (c.is_gather(a) && c.is_gather(b))
                || (c.is_alltoall(a) && c.is_alltoall(b))
                || (c.is_bcast(a) && c.is_bcast(b))
                || (c.is_reduce(a) && c.is_reduce(b));
        }
        false
    }

    fn components_equal_at(&self, i: usize, j: usize, idx: usize) -> bool {
        match (self.calls[i].args.get(idx), self.calls[j].args.get(idx)) {
            (Some(a), Some(b)) => a.components_equal(b),
            _ => false,
        }
    }

    fn spellings_equal_at(&self, i: usize, j: usize, idx: usize) -> bool {
        match (self.calls[i].args.get(idx), self.calls[j].args.get(idx)) {
            (Some(a), Some(b)) => self.snippet(a.span) == self.snippet(b.span),
            _ => false,
        }
    }

    // ── Unmatched point-to-point calls ──────────────────────────────────

    /// Within each rank case, report every point-to-point send with no
    /// partnered receive in any other rank case, and vice versa. A call
    /// appearing in several cases (nested chains) is reported at most once.
    pub fn check_unmatched_calls(&mut self) {
        let mut reported: HashSet<CallId> = HashSet::new();
        let mut findings: Vec<(Span, &'static str, Option<String>)> = Vec::new();

        for (case_idx, case) in self.rank_cases.iter().enumerate() {
            for &ci in &case.calls {
                let call = &self.calls[ci];
                if !self.classifier.is_point_to_point(call.callee)
                    || reported.contains(&call.id)
                {
                    continue;
                }
                let is_send = self.classifier.is_send(call.callee);

                let partnered = self
                    .rank_cases
                    .iter()
                    .enumerate()
                    .filter(|&(other_idx, _)| other_idx != case_idx)
                    .flat_map(|(_, other)| other.calls.iter().copied())
                    .any(|oj| {
                        if is_send {
                            self.is_send_recv_pair(ci, oj)
                        } else {
                            self.is_send_recv_pair(oj, ci)
                        }
                    });

                if !partnered {
                    reported.insert(call.id);
                    let message = if is_send {
                        "unmatched send (no matching receive)"
                    } else {
                        "unmatched recv (no matching send)"
                    };
                    findings.push((
                        call.span,
                        message,
                        self.function_name(call.enclosing),
                    ));
                }
            }
        }

        for (span, message, function) in findings {
            let mut diagnostic = Diagnostic::new(DiagCategory::UnmatchedCall, span, message);
            if let Some(function) = function {
                diagnostic = diagnostic.in_function(function);
            }
            self.emit(diagnostic);
        }
    }

    /// Do the two calls form a send/recv pair?
    fn is_send_recv_pair(&self, send_idx: usize, recv_idx: usize) -> bool {
        let send = &self.calls[send_idx];
        let recv = &self.calls[recv_idx];
        if !self.classifier.is_send(send.callee) || !self.classifier.is_recv(recv.callee) {
            return false;
        }

        // mpi datatypes must share their source spelling
        let (Some(send_dt), Some(recv_dt)) = (
            send.args.get(schema::p2p::DATATYPE),
            recv.args.get(schema::p2p::DATATYPE),
        ) else {
            return false;
        };
        if self.snippet(send_dt.span) != self.snippet(recv_dt.span) {
            return false;
        }

        // count and tag compare by components
        for idx in [schema::p2p::COUNT, schema::p2p::TAG] {
            if !self.components_equal_at(send_idx, recv_idx, idx) {
                return false;
            }
        }

        let (Some(send_rank), Some(recv_rank)) = (
            send.args.get(schema::p2p::RANK),
            recv.args.get(schema::p2p::RANK),
        ) else {
            return false;
        };
        ranks_compatible(send_rank, recv_rank)
    }
}

// ── Rank compatibility ──────────────────────────────────────────────────────

/// Rank compatibility rule for pair matching (spec and design notes):
/// literal ranks must differ, a dynamic rank's embedded literals must
/// permute, referenced functions must permute, and a sole binary operator
/// per side must be equal or an additive inverse. Composite expressions
/// (two or more operators) are not subjected to the operator rule.
fn ranks_compatible(send: &Argument, recv: &Argument) -> bool {
    // send addresses a single literal rank
    if send.int_literals.len() == 1 && send.binary_operators.is_empty() {
        if recv.int_literals.len() != 1 {
            return false;
        }
        if recv.binary_operators.len() == 1 && recv.binary_operators[0] != BinOp::Sub {
            return false;
        }
        // a process does not send to itself
        if send.int_literals[0] == recv.int_literals[0] {
            return false;
        }
    }

    // dynamic rank against embedded literals (either orientation):
    // literals must permute
    let dynamic_vs_literal = (!send.variables.is_empty() && !recv.int_literals.is_empty())
        || (!recv.variables.is_empty() && !send.int_literals.is_empty());
    if dynamic_vs_literal && !multiset_eq(&send.int_literals, &recv.int_literals) {
        return false;
    }

    if !multiset_eq(&send.functions, &recv.functions) {
        return false;
    }

    // a sole operator per side must be equal or an additive inverse;
    // never reject a pair that differs only by an additive inverse
    if send.binary_operators.len() == 1 && recv.binary_operators.len() == 1 {
        let (s, r) = (send.binary_operators[0], recv.binary_operators[0]);
        let inverse = (s == BinOp::Add && r == BinOp::Sub) || (s == BinOp::Sub && r == BinOp::Add);
        if s != r && !inverse {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(vars: &[u32], ints: &[i128], ops: &[BinOp]) -> Argument {
        Argument {
            variables: vars.iter().map(|&v| VarId(v)).collect(),
            int_literals: ints.to_vec(),
            binary_operators: ops.to_vec(),
            ..Argument::default()
        }
    }

    #[test]
    fn literal_ranks_must_differ() {
        assert!(!ranks_compatible(&arg(&[], &[1], &[]), &arg(&[], &[1], &[])));
        assert!(ranks_compatible(&arg(&[], &[0], &[]), &arg(&[], &[1], &[])));
    }

    #[test]
    fn dynamic_rank_literals_must_permute() {
        // send `r + 1`, recv `r + 1` — same literal, same operator
        assert!(ranks_compatible(
            &arg(&[0], &[1], &[BinOp::Add]),
            &arg(&[0], &[1], &[BinOp::Add]),
        ));
        // send `r + 1`, recv `r + 2` — literal mismatch
        assert!(!ranks_compatible(
            &arg(&[0], &[1], &[BinOp::Add]),
            &arg(&[0], &[2], &[BinOp::Add]),
        ));
    }

    #[test]
    fn additive_inverse_pairs_are_never_rejected() {
        // send `r + 1`, recv `r - 1`
        assert!(ranks_compatible(
            &arg(&[0], &[1], &[BinOp::Add]),
            &arg(&[0], &[1], &[BinOp::Sub]),
        ));
        // send `r - 1`, recv `r + 1`
        assert!(ranks_compatible(
            &arg(&[0], &[1], &[BinOp::Sub]),
            &arg(&[0], &[1], &[BinOp::Add]),
        ));
        // send `r * 2`, recv `r + 2` — neither equal nor inverse
        assert!(!ranks_compatible(
            &arg(&[0], &[2], &[BinOp::Mul]),
            &arg(&[0], &[2], &[BinOp::Add]),
        ));
    }

    #[test]
    fn composite_rank_expressions_skip_the_operator_rule() {
        // send `r + k - 1`, recv `r - k + 1`
        assert!(ranks_compatible(
            &arg(&[0, 1], &[1], &[BinOp::Add, BinOp::Sub]),
            &arg(&[0, 1], &[1], &[BinOp::Sub, BinOp::Add]),
        ));
    }
}
