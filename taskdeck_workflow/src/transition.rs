//! The Kanban transition table.
//!
//! Stages, edges and edge requirements are fixed data: the ordered forward
//! path, one reject back-edge out of review, and one privileged reopen
//! edge out of the terminal stage.

use taskdeck_core::types::{Capability, KanbanStage};

/// What an edge demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRequirement {
    /// The edge requires this capability from the permission engine.
    Capability(Capability),

    /// The edge is reserved for full-authority roles (the reopen escape
    /// hatch out of `Done`).
    FullAuthority,
}

/// The fixed transition table.
///
/// `requirement` returns `None` for structurally impossible moves; those
/// are rejected before any permission check runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionTable;

impl TransitionTable {
    /// Requirement for moving `from -> to`, or `None` if the edge does not
    /// exist.
    pub fn requirement(from: KanbanStage, to: KanbanStage) -> Option<EdgeRequirement> {
        use KanbanStage::*;
        match (from, to) {
            (Backlog, Todo) | (Todo, InProgress) | (InProgress, Review) => {
                Some(EdgeRequirement::Capability(Capability::MoveStage))
            }
            (Review, Done) => Some(EdgeRequirement::Capability(Capability::ApproveReview)),
            (Review, InProgress) => Some(EdgeRequirement::Capability(Capability::RejectReview)),
            (Done, InProgress) => Some(EdgeRequirement::FullAuthority),
            _ => None,
        }
    }

    /// Whether `from -> to` is the reject edge, which must carry a reason.
    pub fn is_reject_edge(from: KanbanStage, to: KanbanStage) -> bool {
        from == KanbanStage::Review && to == KanbanStage::InProgress
    }

    /// Whether `from -> to` is the privileged reopen edge.
    pub fn is_reopen_edge(from: KanbanStage, to: KanbanStage) -> bool {
        from == KanbanStage::Done && to == KanbanStage::InProgress
    }
}
