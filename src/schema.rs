// schema.rs — Positional argument schemas of MPI calls
//
// Index constants for the argument layouts the checks reason about, plus
// the per-family index tables used by the redundancy scan and the
// buffer/datatype match. Argument fingerprints carry no role information;
// roles are imposed here, by position.

use crate::classify::FuncClassifier;
use crate::intern::NameId;

// ── Point-to-point layout ───────────────────────────────────────────────────
// (buf, count, datatype, rank, tag, comm[, request])

pub mod p2p {
    pub const BUF: usize = 0;
    pub const COUNT: usize = 1;
    pub const DATATYPE: usize = 2;
    pub const RANK: usize = 3;
    pub const TAG: usize = 4;
    pub const COMM: usize = 5;
}

// ── Reduce-family layout ────────────────────────────────────────────────────
// (sendbuf, recvbuf, count, datatype, op, root, comm[, request])

pub mod reduce {
    pub const SENDBUF: usize = 0;
    pub const RECVBUF: usize = 1;
    pub const COUNT: usize = 2;
    pub const DATATYPE: usize = 3;
    pub const OP: usize = 4;
    pub const ROOT: usize = 5;
}

// ── Scatter/gather/alltoall layout ──────────────────────────────────────────
// (sendbuf, sendcount, sendtype, recvbuf, recvcount, recvtype, root, comm
//  [, request]); root is absent for alltoall/allgather, but the indices the
// checks interrogate are uniform across the family.

pub mod scatter_gather {
    pub const SENDBUF: usize = 0;
    pub const SENDCOUNT: usize = 1;
    pub const SENDTYPE: usize = 2;
    pub const RECVBUF: usize = 3;
    pub const RECVCOUNT: usize = 4;
    pub const RECVTYPE: usize = 5;
    pub const ROOT: usize = 6;
}

// ── Bcast-family layout ─────────────────────────────────────────────────────
// (buffer, count, datatype, root, comm[, request])

pub mod bcast {
    pub const BUFFER: usize = 0;
    pub const COUNT: usize = 1;
    pub const DATATYPE: usize = 2;
    pub const ROOT: usize = 3;
}

/// Point-to-point indices that must hold integer values.
pub const P2P_INTEGER_INDICES: [usize; 3] = [p2p::COUNT, p2p::RANK, p2p::TAG];

// ── Redundancy index tables ─────────────────────────────────────────────────

/// Indices compared for the redundancy scan: `components` are compared as
/// fingerprint multisets, `as_string` by byte-exact source spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedundancyIndices {
    pub components: &'static [usize],
    pub as_string: &'static [usize],
}

/// Redundancy table for `name`, or `None` when the family has no
/// redundancy contract (e.g. barrier, wait, comm-rank).
pub fn redundancy_indices(classifier: &FuncClassifier, name: NameId) -> Option<RedundancyIndices> {
    if classifier.is_point_to_point(name) {
        Some(RedundancyIndices {
            components: &[p2p::COUNT, p2p::RANK, p2p::TAG],
            as_string: &[p2p::DATATYPE],
        })
    } else if classifier.is_reduce(name) {
        Some(RedundancyIndices {
            components: &[reduce::COUNT],
            as_string: &[reduce::DATATYPE, reduce::OP],
        })
    } else if classifier.is_scatter(name) || classifier.is_gather(name) || classifier.is_alltoall(name)
    {
        Some(RedundancyIndices {
            components: &[
                scatter_gather::SENDCOUNT,
                scatter_gather::RECVCOUNT,
                scatter_gather::ROOT,
            ],
            as_string: &[scatter_gather::SENDTYPE, scatter_gather::RECVTYPE],
        })
    } else if classifier.is_bcast(name) {
        Some(RedundancyIndices {
            components: &[bcast::COUNT, bcast::ROOT],
            as_string: &[bcast::DATATYPE],
        })
    } else {
        None
    }
}

// ── Buffer/datatype pair table ──────────────────────────────────────────────

/// `(buffer_index, datatype_index)` pairs whose types must correspond for
/// `name`. The reduce-family send-side pair is subject to the
/// `MPI_IN_PLACE` exemption, which the caller applies.
pub fn buffer_datatype_pairs(classifier: &FuncClassifier, name: NameId) -> Vec<(usize, usize)> {
    if classifier.is_point_to_point(name) {
        vec![(p2p::BUF, p2p::DATATYPE)]
    } else if classifier.is_reduce(name) {
        vec![
            (reduce::SENDBUF, reduce::DATATYPE),
            (reduce::RECVBUF, reduce::DATATYPE),
        ]
    } else if classifier.is_scatter(name) || classifier.is_gather(name) || classifier.is_alltoall(name)
    {
        vec![
            (scatter_gather::SENDBUF, scatter_gather::SENDTYPE),
            (scatter_gather::RECVBUF, scatter_gather::RECVTYPE),
        ]
    } else if classifier.is_bcast(name) {
        vec![(bcast::BUFFER, bcast::DATATYPE)]
    } else {
        vec![]
    }
}
