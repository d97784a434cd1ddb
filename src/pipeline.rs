// pipeline.rs — Multi-unit orchestration
//
// Runs the analysis over a batch of translation units, one fresh context
// per unit (nothing leaks across units), with per-unit timing under
// `--verbose` and a provenance record for hermetic report caching.
//
// Preconditions: units validate (see `loader::validate`).
// Postconditions: one report per unit, in input order.
// Failure modes: none — analysis is diagnostic-only.
// Side effects: verbose timing lines on stderr.

use std::time::Instant;

use sha2::{Digest, Sha256};

use crate::ast::TranslationUnit;
use crate::diag::{has_error_diags, Diagnostic};
use crate::visitor::{analyze_translation_unit, OutstandingRequest};

// ── Provenance ──────────────────────────────────────────────────────────────

/// Provenance of one unit's report: a hash of the serialized unit plus the
/// analyzer version, for cache keys and reproducibility checks.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub unit_hash: [u8; 32],
    pub analyzer_version: &'static str,
}

impl Provenance {
    /// Hex string of the unit hash (64 characters).
    pub fn unit_hash_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.unit_hash {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
        }
        s
    }
}

/// Compute provenance from the unit's canonical compact JSON form, so the
/// hash is independent of dump formatting.
pub fn compute_provenance(tu: &TranslationUnit) -> Provenance {
    let canonical = serde_json::to_string(tu).expect("unit serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    let mut unit_hash = [0u8; 32];
    unit_hash.copy_from_slice(&digest);
    Provenance {
        unit_hash,
        analyzer_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Reports ─────────────────────────────────────────────────────────────────

/// Analysis output for one translation unit.
#[derive(Debug)]
pub struct UnitReport {
    pub file: String,
    pub provenance: Provenance,
    pub diagnostics: Vec<Diagnostic>,
    pub outstanding: Vec<OutstandingRequest>,
}

impl UnitReport {
    pub fn has_errors(&self) -> bool {
        has_error_diags(&self.diagnostics)
    }
}

/// Analyze each unit against a private context, in input order.
pub fn analyze_units(units: &[TranslationUnit], verbose: bool) -> Vec<UnitReport> {
    let mut reports = Vec::with_capacity(units.len());
    for tu in units {
        let provenance = compute_provenance(tu);
        let t = Instant::now();
        let result = analyze_translation_unit(tu);
        let elapsed = t.elapsed();
        if verbose {
            eprintln!(
                "mpilint: {} analyzed, {:.1}ms, {} findings",
                tu.source.file,
                elapsed.as_secs_f64() * 1000.0,
                result.diagnostics.len()
            );
        }
        reports.push(UnitReport {
            file: tu.source.file.clone(),
            provenance,
            diagnostics: result.diagnostics,
            outstanding: result.outstanding,
        });
    }
    reports
}
