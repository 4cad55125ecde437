//! The graph builder: `touch`, the single mutation entrypoint.
//!
//! A touch is one `(owner, node)` access event. Given where the owner
//! currently stands, [`NavGraph::touch`] either creates the node, absorbs a
//! refresh (the owner re-touching the node it is already at), or records
//! another visit to an existing node, linking a new edge or a new
//! antecedent as needed.

use crate::error::CoreError;
use crate::graph::{NavGraph, Position, ROOT_NODE_NAME};
use crate::id::{EdgeId, NodeId, OwnerId};

/// Result of a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// The owner re-touched its current node. Nothing changed.
    Refresh,
    /// The owner moved. `position` is where it now stands.
    Moved {
        position: Position,
        /// `true` if the node did not exist before this touch.
        created: bool,
    },
}

impl TouchOutcome {
    /// Returns the new position, `None` for a refresh.
    pub fn position(&self) -> Option<Position> {
        match self {
            TouchOutcome::Refresh => None,
            TouchOutcome::Moved { position, .. } => Some(*position),
        }
    }
}

impl NavGraph {
    /// Adds a node or counts another visit to an existing one.
    ///
    /// `from` is the owner's current position. It must be `None` when
    /// `name` is the root sentinel and `Some` for every other node.
    ///
    /// Behavior:
    /// 1. Unknown name: create the node, link it from `from` with the
    ///    position's edge as sole antecedent (root gets an entry edge with
    ///    none), index it globally and under the owner.
    /// 2. Known node equal to `from.node`: refresh, nothing changes.
    /// 3. Known node otherwise: bump the owner's counter; create the
    ///    `(owner, from.node, node)` edge or add the antecedent to it if
    ///    missing; index the node under the owner on its first visit.
    ///
    /// The returned position always carries the edge the owner arrived by,
    /// whether it was created, extended or already fully known.
    pub fn touch(
        &mut self,
        name: &str,
        from: Option<Position>,
        owner: &str,
    ) -> Result<TouchOutcome, CoreError> {
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() {
            return Err(CoreError::EmptyOwner);
        }
        if name.is_empty() {
            return Err(CoreError::EmptyNodeName);
        }
        match (name == ROOT_NODE_NAME, from) {
            (true, Some(_)) => return Err(CoreError::UnexpectedParent),
            (false, None) => {
                return Err(CoreError::MissingParent {
                    name: name.to_string(),
                })
            }
            (_, Some(position)) => self.check_position(position, owner)?,
            (true, None) => {}
        }

        let parent = from.map(|p| p.node);
        let pre_edge = from.map(|p| p.edge);

        let Some(node) = self.find_node(name) else {
            let owner_id = self.intern_owner(owner);
            let node = self.insert_node(name, owner_id);
            let edge = self.insert_edge(owner_id, parent, node, pre_edge);
            self.register_owner_node(owner_id, node);
            tracing::debug!(
                owner,
                parent = self.parent_name(parent),
                node = name,
                "new node added"
            );
            return Ok(TouchOutcome::Moved {
                position: Position { node, edge },
                created: true,
            });
        };

        if parent == Some(node) {
            tracing::debug!(owner, node = name, "refresh absorbed");
            return Ok(TouchOutcome::Refresh);
        }

        let owner_id = self.intern_owner(owner);
        let visits = self.node_at(node).add_visit(owner_id);
        let edge = self.link(owner_id, parent, node, pre_edge);
        if visits == 1 {
            self.register_owner_node(owner_id, node);
        }
        tracing::debug!(
            owner,
            parent = self.parent_name(parent),
            node = name,
            visits,
            "existing node touched"
        );
        Ok(TouchOutcome::Moved {
            position: Position { node, edge },
            created: false,
        })
    }

    /// Returns the `(owner, parent, node)` edge, creating it or recording
    /// `pre_edge` on it when this walk instance is new.
    fn link(
        &mut self,
        owner: OwnerId,
        parent: Option<NodeId>,
        node: NodeId,
        pre_edge: Option<EdgeId>,
    ) -> EdgeId {
        match self.find_edge(owner, parent, node) {
            None => self.insert_edge(owner, parent, node, pre_edge),
            Some(edge) => {
                if let Some(pre_edge) = pre_edge {
                    self.edge_at_mut(edge).add_pre_edge(pre_edge);
                }
                edge
            }
        }
    }

    fn parent_name(&self, parent: Option<NodeId>) -> &str {
        parent.map_or("<none>", |id| self.node_at(id).name())
    }
}
