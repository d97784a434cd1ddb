// classify.rs — MPI function classifier
//
// Tags every recognized MPI function name by semantic family. The table
// below is the complete contract: a name's row lists every family it
// belongs to, and every listed name is an MPI-type name. Membership is
// checked over interned ids, so each predicate is a scan of a small id set.
//
// Preconditions: built against the context's interner before any lookup.
// Postconditions: predicates agree with the static table.
// Failure modes: none; unknown names answer `false` everywhere.
// Side effects: interns the table's names.

use crate::intern::{Interner, NameId};

// ── Family flags ────────────────────────────────────────────────────────────

const SEND: u16 = 1 << 0;
const RECV: u16 = 1 << 1;
const P2P: u16 = 1 << 2;
const COLLECTIVE: u16 = 1 << 3;
const BLOCKING: u16 = 1 << 4;
const NON_BLOCKING: u16 = 1 << 5;
const WAIT: u16 = 1 << 6;
const COMM_RANK: u16 = 1 << 7;

/// Complete classification table. Sub-family groups (scatter, gather, ...)
/// are listed separately below; blocking and non-blocking spellings of one
/// operation share a group.
const TABLE: &[(&str, u16)] = &[
    ("MPI_Send", SEND | P2P | BLOCKING),
    ("MPI_Ssend", SEND | P2P | BLOCKING),
    ("MPI_Bsend", SEND | P2P | BLOCKING),
    ("MPI_Rsend", SEND | P2P | BLOCKING),
    ("MPI_Isend", SEND | P2P | NON_BLOCKING),
    ("MPI_Issend", SEND | P2P | NON_BLOCKING),
    ("MPI_Ibsend", SEND | P2P | NON_BLOCKING),
    ("MPI_Irsend", SEND | P2P | NON_BLOCKING),
    ("MPI_Recv", RECV | P2P | BLOCKING),
    ("MPI_Irecv", RECV | P2P | NON_BLOCKING),
    ("MPI_Scatter", COLLECTIVE | BLOCKING),
    ("MPI_Gather", COLLECTIVE | BLOCKING),
    ("MPI_Allgather", COLLECTIVE | BLOCKING),
    ("MPI_Bcast", COLLECTIVE | BLOCKING),
    ("MPI_Reduce", COLLECTIVE | BLOCKING),
    ("MPI_Allreduce", COLLECTIVE | BLOCKING),
    ("MPI_Alltoall", COLLECTIVE | BLOCKING),
    ("MPI_Barrier", COLLECTIVE | BLOCKING),
    ("MPI_Iscatter", COLLECTIVE | NON_BLOCKING),
    ("MPI_Igather", COLLECTIVE | NON_BLOCKING),
    ("MPI_Iallgather", COLLECTIVE | NON_BLOCKING),
    ("MPI_Ibcast", COLLECTIVE | NON_BLOCKING),
    ("MPI_Ireduce", COLLECTIVE | NON_BLOCKING),
    ("MPI_Iallreduce", COLLECTIVE | NON_BLOCKING),
    ("MPI_Ialltoall", COLLECTIVE | NON_BLOCKING),
    ("MPI_Wait", WAIT),
    ("MPI_Waitall", WAIT),
    ("MPI_Comm_rank", COMM_RANK),
];

const SCATTER: &[&str] = &["MPI_Scatter", "MPI_Iscatter"];
const GATHER: &[&str] = &["MPI_Gather", "MPI_Igather", "MPI_Allgather", "MPI_Iallgather"];
const ALLGATHER: &[&str] = &["MPI_Allgather", "MPI_Iallgather"];
const ALLTOALL: &[&str] = &["MPI_Alltoall", "MPI_Ialltoall"];
const BCAST: &[&str] = &["MPI_Bcast", "MPI_Ibcast"];
const REDUCE: &[&str] = &["MPI_Reduce", "MPI_Ireduce", "MPI_Allreduce", "MPI_Iallreduce"];

// ── Classifier ──────────────────────────────────────────────────────────────

/// Interned-id classification sets for one translation-unit context.
#[derive(Debug)]
pub struct FuncClassifier {
    mpi_type: Vec<NameId>,
    send: Vec<NameId>,
    recv: Vec<NameId>,
    point_to_point: Vec<NameId>,
    collective: Vec<NameId>,
    blocking: Vec<NameId>,
    non_blocking: Vec<NameId>,
    scatter: Vec<NameId>,
    gather: Vec<NameId>,
    allgather: Vec<NameId>,
    alltoall: Vec<NameId>,
    bcast: Vec<NameId>,
    reduce: Vec<NameId>,
    wait: Vec<NameId>,
    mpi_wait: NameId,
    mpi_waitall: NameId,
    barrier: NameId,
    comm_rank: NameId,
}

impl FuncClassifier {
    /// Intern every table name and populate the classification sets.
    pub fn new(interner: &mut Interner) -> Self {
        let mut mpi_type = Vec::new();
        let mut send = Vec::new();
        let mut recv = Vec::new();
        let mut point_to_point = Vec::new();
        let mut collective = Vec::new();
        let mut blocking = Vec::new();
        let mut non_blocking = Vec::new();
        let mut wait = Vec::new();

        for &(name, families) in TABLE {
            let id = interner.intern(name);
            mpi_type.push(id);
            if families & SEND != 0 {
                send.push(id);
            }
            if families & RECV != 0 {
                recv.push(id);
            }
            if families & P2P != 0 {
                point_to_point.push(id);
            }
            if families & COLLECTIVE != 0 {
                collective.push(id);
            }
            if families & BLOCKING != 0 {
                blocking.push(id);
            }
            if families & NON_BLOCKING != 0 {
                non_blocking.push(id);
            }
            if families & WAIT != 0 {
                wait.push(id);
            }
        }

        let group = |interner: &mut Interner, names: &[&str]| -> Vec<NameId> {
            names.iter().map(|n| interner.intern(n)).collect()
        };

        FuncClassifier {
            mpi_type,
            send,
            recv,
            point_to_point,
            collective,
            blocking,
            non_blocking,
            scatter: group(interner, SCATTER),
            gather: group(interner, GATHER),
            allgather: group(interner, ALLGATHER),
            alltoall: group(interner, ALLTOALL),
            bcast: group(interner, BCAST),
            reduce: group(interner, REDUCE),
            wait,
            mpi_wait: interner.intern("MPI_Wait"),
            mpi_waitall: interner.intern("MPI_Waitall"),
            barrier: interner.intern("MPI_Barrier"),
            comm_rank: interner.intern("MPI_Comm_rank"),
        }
    }

    // ── General predicates ──────────────────────────────────────────────

    pub fn is_mpi_type(&self, id: NameId) -> bool {
        self.mpi_type.contains(&id)
    }

    pub fn is_blocking(&self, id: NameId) -> bool {
        self.blocking.contains(&id)
    }

    pub fn is_non_blocking(&self, id: NameId) -> bool {
        self.non_blocking.contains(&id)
    }

    // ── Point-to-point predicates ───────────────────────────────────────

    pub fn is_point_to_point(&self, id: NameId) -> bool {
        self.point_to_point.contains(&id)
    }

    pub fn is_send(&self, id: NameId) -> bool {
        self.send.contains(&id)
    }

    pub fn is_recv(&self, id: NameId) -> bool {
        self.recv.contains(&id)
    }

    // ── Collective predicates ───────────────────────────────────────────

    pub fn is_collective(&self, id: NameId) -> bool {
        self.collective.contains(&id)
    }

    pub fn is_scatter(&self, id: NameId) -> bool {
        self.scatter.contains(&id)
    }

    pub fn is_gather(&self, id: NameId) -> bool {
        self.gather.contains(&id)
    }

    pub fn is_allgather(&self, id: NameId) -> bool {
        self.allgather.contains(&id)
    }

    pub fn is_alltoall(&self, id: NameId) -> bool {
        self.alltoall.contains(&id)
    }

    pub fn is_bcast(&self, id: NameId) -> bool {
        self.bcast.contains(&id)
    }

    pub fn is_reduce(&self, id: NameId) -> bool {
        self.reduce.contains(&id)
    }

    pub fn is_barrier(&self, id: NameId) -> bool {
        id == self.barrier
    }

    // ── Additional predicates ───────────────────────────────────────────

    pub fn is_wait(&self, id: NameId) -> bool {
        self.wait.contains(&id)
    }

    pub fn is_mpi_wait(&self, id: NameId) -> bool {
        id == self.mpi_wait
    }

    pub fn is_mpi_waitall(&self, id: NameId) -> bool {
        id == self.mpi_waitall
    }

    pub fn is_mpi_comm_rank(&self, id: NameId) -> bool {
        id == self.comm_rank
    }

    /// All classified names, for exhaustive property checks.
    pub fn all_names() -> impl Iterator<Item = &'static str> {
        TABLE.iter().map(|&(name, _)| name)
    }
}
