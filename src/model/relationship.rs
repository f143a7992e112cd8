use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::TaskId;

/// The kind of a relationship between two tasks.
///
/// `Parent` means the `from` task has to finish before the `to` task starts;
/// it is the only kind drawn as an arrow. `Child` and `Related` are the
/// symmetric bookkeeping kinds the store keeps alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Parent,
    Child,
    Related,
}

impl RelationshipKind {
    pub fn inverse(self) -> Self {
        match self {
            RelationshipKind::Parent => RelationshipKind::Child,
            RelationshipKind::Child => RelationshipKind::Parent,
            RelationshipKind::Related => RelationshipKind::Related,
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipKind::Parent => "parent",
            RelationshipKind::Child => "child",
            RelationshipKind::Related => "related",
        };
        f.write_str(s)
    }
}

/// Identity of an edge. `Pending` ids are handed out locally for optimistic
/// creates and replaced once the store confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeId {
    Confirmed(Uuid),
    Pending(u64),
}

impl EdgeId {
    pub fn is_pending(&self) -> bool {
        matches!(self, EdgeId::Pending(_))
    }

    pub fn confirmed(&self) -> Option<Uuid> {
        match self {
            EdgeId::Confirmed(id) => Some(*id),
            EdgeId::Pending(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub id: EdgeId,
    pub from_task: TaskId,
    pub to_task: TaskId,
    pub kind: RelationshipKind,
}

impl RelationshipEdge {
    pub fn confirmed(from_task: TaskId, to_task: TaskId, kind: RelationshipKind) -> Self {
        Self {
            id: EdgeId::Confirmed(Uuid::new_v4()),
            from_task,
            to_task,
            kind,
        }
    }

    pub fn is_dependency(&self) -> bool {
        self.kind == RelationshipKind::Parent
    }
}
