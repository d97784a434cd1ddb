// End-to-end analyzer scenarios at the library boundary.
//
// Each case builds a small translation unit with the bridge builder, runs
// the full analysis, and checks the emitted findings: category, message,
// and count. Positive cases pin the exact diagnostics; negative cases
// must come back clean.

use mpilint::ast::{BinOp, Builtin, CType, TranslationUnit, TypeKind};
use mpilint::build::*;
use mpilint::diag::{DiagCategory, Diagnostic};
use mpilint::visitor::{analyze_into_context, analyze_translation_unit, AnalysisResult};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn analyze(tu: &TranslationUnit) -> AnalysisResult {
    analyze_translation_unit(tu)
}

fn categories(diags: &[Diagnostic]) -> Vec<DiagCategory> {
    diags.iter().map(|d| d.category).collect()
}

fn assert_clean(result: &AnalysisResult) {
    assert!(
        result.diagnostics.is_empty(),
        "expected no findings, got: {:?}",
        result
            .diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
    );
}

/// `int *buf` plus `int n`, the common argument pair.
fn int_buf_and_n(b: &mut TuBuilder) -> (mpilint::ast::VarId, mpilint::ast::VarId) {
    let buf = b.var("buf", CType::pointer_to(TypeKind::Builtin(Builtin::Int)));
    let n = b.var("n", CType::builtin(Builtin::Int));
    (buf, n)
}

// ── Float and invalid argument types ────────────────────────────────────────

#[test]
fn float_literal_in_tag_slot() {
    let mut b = TuBuilder::new("s1.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![expr_stmt(call(
            mpi.send,
            vec![
                var(buf),
                int(1),
                var(mpi.dt_int),
                int(0),
                float(3.14),
                var(mpi.comm_world),
            ],
        ))],
    );
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics[0];
    assert_eq!(d.category, DiagCategory::InvalidArgumentType);
    assert_eq!(d.message, "float literal used at index 4");
    assert_eq!(d.function.as_deref(), Some("main"));
}

#[test]
fn float_variable_and_float_return_in_integer_slots() {
    let mut b = TuBuilder::new("float_var.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let fcount = b.var("fcount", CType::builtin(Builtin::Float));
    let ftag = b.func("current_tag", CType::builtin(Builtin::Double), Some(0));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![expr_stmt(call(
            mpi.send,
            vec![
                var(buf),
                var(fcount),
                var(mpi.dt_int),
                int(0),
                call(ftag, vec![]),
                var(mpi.comm_world),
            ],
        ))],
    );
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 2);
    assert_eq!(result.diagnostics[0].message, "float variable used at index 1");
    assert_eq!(
        result.diagnostics[1].message,
        "float return value from function used at index 4"
    );
}

#[test]
fn pointer_variable_in_count_slot_is_non_integer() {
    let mut b = TuBuilder::new("ptr_count.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let pcount = b.var("pcount", CType::pointer_to(TypeKind::Builtin(Builtin::Int)));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![expr_stmt(call(
            mpi.send,
            vec![
                var(buf),
                var(pcount),
                var(mpi.dt_int),
                int(0),
                int(0),
                var(mpi.comm_world),
            ],
        ))],
    );
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].category, DiagCategory::InvalidArgumentType);
    assert_eq!(
        result.diagnostics[0].message,
        "non-integer variable used at index 1"
    );
}

// ── Buffer/datatype matching ────────────────────────────────────────────────

#[test]
fn double_buffer_against_mpi_int() {
    let mut b = TuBuilder::new("s2.c");
    let mpi = MpiEnv::declare(&mut b);
    let buf = b.var("buf", CType::builtin(Builtin::Double));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![expr_stmt(call(
            mpi.send,
            vec![
                addr_of(var(buf)),
                int(1),
                var(mpi.dt_int),
                int(0),
                int(0),
                var(mpi.comm_world),
            ],
        ))],
    );
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics[0];
    assert_eq!(d.category, DiagCategory::TypeMismatch);
    assert_eq!(
        d.message,
        "buffer type does not match MPI datatype 'MPI_INT' (buffer index 0, datatype index 2)"
    );
}

#[test]
fn matching_buffer_is_clean() {
    let mut b = TuBuilder::new("match.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, n) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![expr_stmt(call(
            mpi.send,
            vec![
                var(buf),
                var(n),
                var(mpi.dt_int),
                int(0),
                int(0),
                var(mpi.comm_world),
            ],
        ))],
    );
    assert_clean(&analyze(&b.finish()));
}

#[test]
fn exact_width_typedef_takes_precedence_over_builtin() {
    let mut b = TuBuilder::new("widths.c");
    let mpi = MpiEnv::declare(&mut b);
    let dt_int32 = b.var("MPI_INT32_T", CType::opaque("MPI_Datatype"));
    let narrow = b.var(
        "samples",
        CType {
            kind: TypeKind::Typedef {
                name: "int32_t".into(),
                underlying: Builtin::Int,
            },
            pointer: true,
            array_len: None,
        },
    );
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            // int32_t* must not pass as MPI_INT even where int is 32-bit
            expr_stmt(call(
                mpi.send,
                vec![
                    var(narrow),
                    int(4),
                    var(mpi.dt_int),
                    int(0),
                    int(0),
                    var(mpi.comm_world),
                ],
            )),
            expr_stmt(call(
                mpi.send,
                vec![
                    var(narrow),
                    int(4),
                    var(dt_int32),
                    int(0),
                    int(1),
                    var(mpi.comm_world),
                ],
            )),
        ],
    );
    let result = analyze(&b.finish());

    assert_eq!(categories(&result.diagnostics), vec![DiagCategory::TypeMismatch]);
    assert!(result.diagnostics[0].message.contains("'MPI_INT'"));
}

#[test]
fn reduce_in_place_skips_send_buffer_only() {
    let mut b = TuBuilder::new("inplace.c");
    let mpi = MpiEnv::declare(&mut b);
    let (recvbuf, n) = int_buf_and_n(&mut b);
    let dbuf = b.var("dbuf", CType::pointer_to(TypeKind::Builtin(Builtin::Double)));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            // MPI_IN_PLACE send buffer: only the recv side is checked
            expr_stmt(call(
                mpi.allreduce,
                vec![
                    var(mpi.in_place),
                    var(recvbuf),
                    var(n),
                    var(mpi.dt_int),
                    var(mpi.op_sum),
                    var(mpi.comm_world),
                ],
            )),
            // double* send buffer against MPI_INT: reported at (0, 3)
            expr_stmt(call(
                mpi.allreduce,
                vec![
                    var(dbuf),
                    var(recvbuf),
                    int(8),
                    var(mpi.dt_int),
                    var(mpi.op_sum),
                    var(mpi.comm_world),
                ],
            )),
        ],
    );
    let result = analyze(&b.finish());

    assert_eq!(categories(&result.diagnostics), vec![DiagCategory::TypeMismatch]);
    assert!(result.diagnostics[0]
        .message
        .contains("(buffer index 0, datatype index 3)"));
}

// ── Redundant duplicate calls ───────────────────────────────────────────────

#[test]
fn redundant_point_to_point_reported_once() {
    let mut b = TuBuilder::new("s3.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let send_call = |a, n, mpi: &MpiEnv| {
        call(
            mpi.send,
            vec![
                var(a),
                var(n),
                var(mpi.dt_int),
                int(1),
                int(0),
                var(mpi.comm_world),
            ],
        )
    };
    b.define(
        main,
        vec![
            expr_stmt(send_call(a, n, &mpi)),
            expr_stmt(send_call(a, n, &mpi)),
        ],
    );
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics[0];
    assert_eq!(d.category, DiagCategory::RedundantCall);
    assert!(d.message.contains("indices 1, 2, 3, 4"), "{}", d.message);
    assert_eq!(d.related_spans.len(), 1, "must name the matching call-site");
}

#[test]
fn three_identical_collectives_surface_two_duplicates() {
    let mut b = TuBuilder::new("bcast3.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, n) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let bcast_call = |mpi: &MpiEnv| {
        call(
            mpi.bcast,
            vec![var(buf), var(n), var(mpi.dt_int), int(0), var(mpi.comm_world)],
        )
    };
    b.define(
        main,
        vec![
            expr_stmt(bcast_call(&mpi)),
            expr_stmt(bcast_call(&mpi)),
            expr_stmt(bcast_call(&mpi)),
        ],
    );
    let result = analyze(&b.finish());

    assert_eq!(
        categories(&result.diagnostics),
        vec![DiagCategory::RedundantCall, DiagCategory::RedundantCall]
    );
}

#[test]
fn differing_tags_are_not_redundant() {
    let mut b = TuBuilder::new("tags.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(
                mpi.send,
                vec![var(a), var(n), var(mpi.dt_int), int(1), int(0), var(mpi.comm_world)],
            )),
            expr_stmt(call(
                mpi.send,
                vec![var(a), var(n), var(mpi.dt_int), int(1), int(1), var(mpi.comm_world)],
            )),
        ],
    );
    assert_clean(&analyze(&b.finish()));
}

#[test]
fn send_and_recv_never_pair_as_duplicates() {
    let mut b = TuBuilder::new("sendrecv.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(
                mpi.send,
                vec![var(a), var(n), var(mpi.dt_int), int(1), int(0), var(mpi.comm_world)],
            )),
            expr_stmt(call(
                mpi.recv,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(0),
                    var(mpi.comm_world),
                    var(mpi.status_ignore),
                ],
            )),
        ],
    );
    assert_clean(&analyze(&b.finish()));
}

#[test]
fn barriers_are_never_redundant() {
    let mut b = TuBuilder::new("barriers.c");
    let mpi = MpiEnv::declare(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(mpi.barrier, vec![var(mpi.comm_world)])),
            expr_stmt(call(mpi.barrier, vec![var(mpi.comm_world)])),
        ],
    );
    assert_clean(&analyze(&b.finish()));
}

// ── Rank cases ──────────────────────────────────────────────────────────────

/// `MPI_Comm_rank(MPI_COMM_WORLD, &r)` preceded by `int r;`.
fn comm_rank_prelude(b: &mut TuBuilder, mpi: &MpiEnv) -> (mpilint::ast::VarId, Vec<mpilint::ast::Stmt>) {
    let r = b.var("r", CType::builtin(Builtin::Int));
    let stmts = vec![
        decl_stmt(r, None),
        expr_stmt(call(mpi.comm_rank, vec![var(mpi.comm_world), addr_of(var(r))])),
    ];
    (r, stmts)
}

#[test]
fn collective_inside_rank_branch() {
    let mut b = TuBuilder::new("s4.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let (r, mut body) = comm_rank_prelude(&mut b, &mpi);
    body.push(if_stmt(
        bin(BinOp::Eq, var(r), int(0)),
        vec![expr_stmt(call(
            mpi.bcast,
            vec![var(buf), int(1), var(mpi.dt_int), int(0), var(mpi.comm_world)],
        ))],
        None,
    ));
    b.define(main, body);
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics[0];
    assert_eq!(d.category, DiagCategory::CallInRankBranch);
    assert_eq!(d.message, "collective call 'MPI_Bcast' inside rank branch");
}

#[test]
fn nested_rank_chain_collective_reported_once() {
    // if (r == 0) { if (r2 == 1) { MPI_Bcast(...); } }
    let mut b = TuBuilder::new("nested.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let (r, mut body) = comm_rank_prelude(&mut b, &mpi);
    let r2 = b.var("r2", CType::builtin(Builtin::Int));
    body.push(decl_stmt(r2, None));
    body.push(expr_stmt(call(
        mpi.comm_rank,
        vec![var(mpi.comm_world), addr_of(var(r2))],
    )));
    body.push(if_stmt(
        bin(BinOp::Eq, var(r), int(0)),
        vec![if_stmt(
            bin(BinOp::Eq, var(r2), int(1)),
            vec![expr_stmt(call(
                mpi.bcast,
                vec![var(buf), int(1), var(mpi.dt_int), int(0), var(mpi.comm_world)],
            ))],
            None,
        )],
        None,
    ));
    b.define(main, body);
    let tu = b.finish();

    let ctx = analyze_into_context(&tu);

    // the nested chain is its own case, and its call also belongs to the
    // enclosing arm's case
    assert_eq!(ctx.rank_cases.len(), 2);
    let bcast_idx = ctx.calls.len() - 1;
    assert!(ctx.rank_cases[0].calls.contains(&bcast_idx));
    assert!(ctx.rank_cases[1].calls.contains(&bcast_idx));

    // one call-site, one report
    assert_eq!(
        categories(&ctx.diagnostics),
        vec![DiagCategory::CallInRankBranch]
    );
    assert_eq!(
        ctx.diagnostics[0].message,
        "collective call 'MPI_Bcast' inside rank branch"
    );
}

#[test]
fn collective_outside_rank_branches_is_clean() {
    let mut b = TuBuilder::new("plain_if.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let x = b.var("x", CType::builtin(Builtin::Int));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![if_stmt(
            bin(BinOp::Eq, var(x), int(0)),
            vec![expr_stmt(call(
                mpi.bcast,
                vec![var(buf), int(1), var(mpi.dt_int), int(0), var(mpi.comm_world)],
            ))],
            None,
        )],
    );
    assert_clean(&analyze(&b.finish()));
}

#[test]
fn unmatched_send_in_rank_case() {
    let mut b = TuBuilder::new("s5.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let (r, mut body) = comm_rank_prelude(&mut b, &mpi);
    body.push(if_stmt(
        bin(BinOp::Eq, var(r), int(0)),
        vec![expr_stmt(call(
            mpi.send,
            vec![var(buf), int(1), var(mpi.dt_int), int(1), int(0), var(mpi.comm_world)],
        ))],
        Some(if_stmt(bin(BinOp::Eq, var(r), int(1)), vec![], None)),
    ));
    b.define(main, body);
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics[0];
    assert_eq!(d.category, DiagCategory::UnmatchedCall);
    assert_eq!(d.message, "unmatched send (no matching receive)");
}

#[test]
fn paired_send_and_recv_across_rank_cases_are_clean() {
    let mut b = TuBuilder::new("paired.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let (r, mut body) = comm_rank_prelude(&mut b, &mpi);
    body.push(if_stmt(
        bin(BinOp::Eq, var(r), int(0)),
        vec![expr_stmt(call(
            mpi.send,
            vec![var(buf), int(1), var(mpi.dt_int), int(1), int(0), var(mpi.comm_world)],
        ))],
        Some(if_stmt(
            bin(BinOp::Eq, var(r), int(1)),
            vec![expr_stmt(call(
                mpi.recv,
                vec![
                    var(buf),
                    int(1),
                    var(mpi.dt_int),
                    int(0),
                    int(0),
                    var(mpi.comm_world),
                    var(mpi.status_ignore),
                ],
            ))],
            None,
        )),
    ));
    b.define(main, body);
    assert_clean(&analyze(&b.finish()));
}

#[test]
fn rank_pair_differing_by_additive_inverse_is_not_flagged() {
    let mut b = TuBuilder::new("inverse.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let (r, mut body) = comm_rank_prelude(&mut b, &mpi);
    body.push(if_stmt(
        bin(BinOp::Eq, var(r), int(0)),
        vec![expr_stmt(call(
            mpi.send,
            vec![
                var(buf),
                int(1),
                var(mpi.dt_int),
                bin(BinOp::Add, var(r), int(1)),
                int(0),
                var(mpi.comm_world),
            ],
        ))],
        Some(else_block(vec![expr_stmt(call(
            mpi.recv,
            vec![
                var(buf),
                int(1),
                var(mpi.dt_int),
                bin(BinOp::Sub, var(r), int(1)),
                int(0),
                var(mpi.comm_world),
                var(mpi.status_ignore),
            ],
        ))])),
    ));
    b.define(main, body);
    assert_clean(&analyze(&b.finish()));
}

#[test]
fn unmatched_recv_mentions_missing_send() {
    let mut b = TuBuilder::new("norecv.c");
    let mpi = MpiEnv::declare(&mut b);
    let (buf, _) = int_buf_and_n(&mut b);
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    let (r, mut body) = comm_rank_prelude(&mut b, &mpi);
    body.push(if_stmt(
        bin(BinOp::Eq, var(r), int(1)),
        vec![expr_stmt(call(
            mpi.recv,
            vec![
                var(buf),
                int(1),
                var(mpi.dt_int),
                int(0),
                int(0),
                var(mpi.comm_world),
                var(mpi.status_ignore),
            ],
        ))],
        Some(else_block(vec![])),
    ));
    b.define(main, body);
    let result = analyze(&b.finish());

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].message, "unmatched recv (no matching send)");
}

// ── Request lifecycle ───────────────────────────────────────────────────────

#[test]
fn double_request_use_then_endless_wait() {
    let mut b = TuBuilder::new("s6.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let bb = b.var("b", CType::pointer_to(TypeKind::Builtin(Builtin::Int)));
    let req = b.var("req", CType::opaque("MPI_Request"));
    let other_req = b.var("other_req", CType::opaque("MPI_Request"));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(
                mpi.isend,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(0),
                    var(mpi.comm_world),
                    addr_of(var(req)),
                ],
            )),
            expr_stmt(call(
                mpi.isend,
                vec![
                    var(bb),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(0),
                    var(mpi.comm_world),
                    addr_of(var(req)),
                ],
            )),
            expr_stmt(call(
                mpi.wait,
                vec![addr_of(var(other_req)), var(mpi.status_ignore)],
            )),
        ],
    );
    let result = analyze(&b.finish());

    let errors: Vec<&Diagnostic> = result
        .diagnostics
        .iter()
        .filter(|d| d.level == mpilint::diag::DiagLevel::Error)
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].category, DiagCategory::DoubleNonblocking);
    assert!(errors[0].message.starts_with("double use of request 'req'"));
    assert_eq!(errors[0].related_spans.len(), 1);
    assert_eq!(errors[1].category, DiagCategory::DoubleWait);
    assert_eq!(errors[1].message, "wait on non-existent request 'other_req'");

    // the doubly-bound request stays outstanding; other_req was never bound
    assert_eq!(result.outstanding.len(), 1);
    assert_eq!(result.outstanding[0].name, "req");
}

#[test]
fn waitall_consumes_each_declared_array_element() {
    let mut b = TuBuilder::new("waitall.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let reqs = b.var("reqs", CType::array_of(TypeKind::Opaque("MPI_Request".into()), 2));
    let statuses = b.var("statuses", CType::array_of(TypeKind::Opaque("MPI_Status".into()), 2));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(
                mpi.isend,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(0),
                    var(mpi.comm_world),
                    addr_of(index(var(reqs), int(0))),
                ],
            )),
            expr_stmt(call(
                mpi.isend,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(1),
                    var(mpi.comm_world),
                    addr_of(index(var(reqs), int(1))),
                ],
            )),
            expr_stmt(call(mpi.waitall, vec![int(2), var(reqs), var(statuses)])),
        ],
    );
    let result = analyze(&b.finish());

    assert_clean(&result);
    assert!(result.outstanding.is_empty());
}

#[test]
fn waitall_reports_each_unbound_array_element() {
    let mut b = TuBuilder::new("waitall_partial.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let reqs = b.var("reqs", CType::array_of(TypeKind::Opaque("MPI_Request".into()), 2));
    let statuses = b.var("statuses", CType::array_of(TypeKind::Opaque("MPI_Status".into()), 2));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(
                mpi.isend,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(0),
                    var(mpi.comm_world),
                    addr_of(index(var(reqs), int(0))),
                ],
            )),
            expr_stmt(call(mpi.waitall, vec![int(2), var(reqs), var(statuses)])),
        ],
    );
    let result = analyze(&b.finish());

    assert_eq!(categories(&result.diagnostics), vec![DiagCategory::DoubleWait]);
    assert_eq!(
        result.diagnostics[0].message,
        "wait on non-existent request 'reqs'"
    );
}

#[test]
fn distinct_array_elements_are_distinct_requests() {
    let mut b = TuBuilder::new("elems.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let reqs = b.var("reqs", CType::array_of(TypeKind::Opaque("MPI_Request".into()), 2));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(
                mpi.isend,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(0),
                    var(mpi.comm_world),
                    addr_of(index(var(reqs), int(0))),
                ],
            )),
            expr_stmt(call(
                mpi.irecv,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(0),
                    int(1),
                    var(mpi.comm_world),
                    addr_of(index(var(reqs), int(1))),
                ],
            )),
        ],
    );
    let result = analyze(&b.finish());

    // no double use; both elements remain outstanding
    assert_clean(&result);
    assert_eq!(result.outstanding.len(), 2);
}

#[test]
fn wait_after_isend_settles_the_request() {
    let mut b = TuBuilder::new("settled.c");
    let mpi = MpiEnv::declare(&mut b);
    let (a, n) = int_buf_and_n(&mut b);
    let req = b.var("req", CType::opaque("MPI_Request"));
    let main = b.func("main", CType::builtin(Builtin::Int), Some(0));
    b.define(
        main,
        vec![
            expr_stmt(call(
                mpi.isend,
                vec![
                    var(a),
                    var(n),
                    var(mpi.dt_int),
                    int(1),
                    int(0),
                    var(mpi.comm_world),
                    addr_of(var(req)),
                ],
            )),
            expr_stmt(call(mpi.wait, vec![addr_of(var(req)), var(mpi.status_ignore)])),
        ],
    );
    let result = analyze(&b.finish());

    assert_clean(&result);
    assert!(result.outstanding.is_empty());
}
