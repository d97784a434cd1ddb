// typematch.rs — Buffer element type vs. MPI datatype spelling
//
// Decides whether a buffer's element type corresponds to the source
// spelling of the datatype argument (`"MPI_INT"`, `"MPI_C_BOOL"`, ...).
// The datatype is never evaluated; only its spelling is inspected.
//
// Dispatch order follows the C semantics: exact-width typedefs first (the
// spelling takes precedence over the underlying builtin), then complex,
// then the builtin kinds. Anything unrecognized matches, so unknown
// typedefs and non-builtin buffers never produce a report.

use crate::ast::{Builtin, CType, TypeKind};

/// Does `buffer`'s element type accept `datatype` (by spelling)?
///
/// The element type of a pointer is its pointee; arrays decay the same
/// way; a plain variable contributes its own type. All of that is already
/// folded into `CType`, so only the base kind matters here.
pub fn buffer_matches_datatype(buffer: &CType, datatype: &str) -> bool {
    match &buffer.kind {
        TypeKind::Typedef { name, .. } => match_exact_width(name, datatype),
        TypeKind::Complex(kind) => match_complex(*kind, datatype),
        TypeKind::Builtin(kind) => match_builtin(*kind, datatype),
        // no builtin element type: cancel checking
        _ => true,
    }
}

/// Exact-width typedefs (`int8_t`, `uint32_t`, ...). Unknown typedef names
/// are rated as correct.
fn match_exact_width(name: &str, datatype: &str) -> bool {
    match name {
        "int8_t" => datatype == "MPI_INT8_T",
        "int16_t" => datatype == "MPI_INT16_T",
        "int32_t" => datatype == "MPI_INT32_T",
        "int64_t" => datatype == "MPI_INT64_T",
        "uint8_t" => datatype == "MPI_UINT8_T",
        "uint16_t" => datatype == "MPI_UINT16_T",
        "uint32_t" => datatype == "MPI_UINT32_T",
        "uint64_t" => datatype == "MPI_UINT64_T",
        _ => true,
    }
}

fn match_complex(kind: Builtin, datatype: &str) -> bool {
    match kind {
        Builtin::Float => datatype == "MPI_C_COMPLEX" || datatype == "MPI_C_FLOAT_COMPLEX",
        Builtin::Double => datatype == "MPI_C_DOUBLE_COMPLEX",
        Builtin::LongDouble => datatype == "MPI_C_LONG_DOUBLE_COMPLEX",
        _ => true,
    }
}

fn match_builtin(kind: Builtin, datatype: &str) -> bool {
    match kind {
        Builtin::Bool => datatype == "MPI_C_BOOL",
        Builtin::Char | Builtin::SChar => {
            datatype == "MPI_CHAR" || datatype == "MPI_SIGNED_CHAR"
        }
        Builtin::UChar => datatype == "MPI_UNSIGNED_CHAR",
        Builtin::WChar => datatype == "MPI_WCHAR",
        Builtin::Short => datatype == "MPI_SHORT",
        Builtin::Int => datatype == "MPI_INT",
        Builtin::Long => datatype == "MPI_LONG",
        Builtin::LongLong => datatype == "MPI_LONG_LONG" || datatype == "MPI_LONG_LONG_INT",
        Builtin::UShort => datatype == "MPI_UNSIGNED_SHORT",
        Builtin::UInt => datatype == "MPI_UNSIGNED",
        Builtin::ULong => datatype == "MPI_UNSIGNED_LONG",
        Builtin::ULongLong => datatype == "MPI_UNSIGNED_LONG_LONG",
        Builtin::Float => datatype == "MPI_FLOAT",
        Builtin::Double => datatype == "MPI_DOUBLE",
        Builtin::LongDouble => datatype == "MPI_LONG_DOUBLE",
    }
}
