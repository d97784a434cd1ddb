use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mpilint::loader;
use mpilint::pipeline;

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "mpilint",
    version,
    about = "Schema-level static analyzer for MPI usage in C/C++ translation units"
)]
struct Cli {
    /// Translation-unit dump files (JSON, one per unit)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    emit: EmitFormat,

    /// Print per-unit timing
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Load units ──
    let mut units = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        match loader::load_translation_unit(path) {
            Ok(tu) => {
                if cli.verbose {
                    eprintln!("mpilint: loaded {}", path.display());
                }
                units.push(tu);
            }
            Err(e) => {
                eprintln!("mpilint: error: {}", e);
                return ExitCode::from(2);
            }
        }
    }

    // ── Analyze ──
    let reports = pipeline::analyze_units(&units, cli.verbose);
    let has_errors = reports.iter().any(|r| r.has_errors());

    match cli.emit {
        EmitFormat::Text => {
            for (tu, report) in units.iter().zip(&reports) {
                for diagnostic in &report.diagnostics {
                    println!("{}", diagnostic.render(&tu.source));
                }
            }
            let findings: usize = reports.iter().map(|r| r.diagnostics.len()).sum();
            eprintln!(
                "mpilint: {} unit(s), {} finding(s)",
                reports.len(),
                findings
            );
        }
        EmitFormat::Json => {
            let payload: Vec<_> = reports
                .iter()
                .map(|report| {
                    serde_json::json!({
                        "file": report.file,
                        "unit_hash": report.provenance.unit_hash_hex(),
                        "analyzer_version": report.provenance.analyzer_version,
                        "diagnostics": report.diagnostics,
                        "outstanding_requests": report
                            .outstanding
                            .iter()
                            .map(|r| {
                                serde_json::json!({
                                    "variable": r.name,
                                    "element": r.elem,
                                })
                            })
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).expect("report serialization")
            );
        }
    }

    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
