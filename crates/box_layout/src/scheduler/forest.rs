//! Nesting structure: which grid hosts which, and traversal orders.

use std::collections::{HashMap, HashSet};

use indextree::{Node, NodeEdge, NodeId};
use log::{debug, warn};

use super::{GridId, Scheduler, grid_mut, grid_ref};
use crate::config::GridConfig;
use crate::error::ConfigError;
use crate::item::OccupantId;
use crate::layout::GridLayout;
use crate::linkage::ParentLink;
use crate::provider::MeasurementProvider;
use crate::resize::DragPhase;

impl<P: MeasurementProvider> Scheduler<P> {
    /// Reject nesting declared by `config` for the grid on `container`.
    ///
    /// `node` is the grid being configured, if it is already registered; its
    /// own current references do not count against it.
    pub(super) fn check_nesting(
        &self,
        node: Option<NodeId>,
        container: &OccupantId,
        config: &GridConfig,
    ) -> Result<(), ConfigError> {
        let mut referenced = HashSet::new();
        for nested in config.nested_containers() {
            if nested == container {
                return Err(ConfigError::CyclicNesting {
                    container: nested.clone(),
                });
            }
            if !referenced.insert(nested) || self.host_of(nested).is_some_and(|host| Some(host) != node) {
                return Err(ConfigError::AlreadyNested {
                    container: nested.clone(),
                });
            }
        }

        // Walk the would-be ancestors of `container`: none of them may be nested in it.
        let mut current = container.clone();
        let mut visited = HashSet::new();
        while let Some(host) = self.host_of(&current).filter(|host| Some(*host) != node) {
            if !visited.insert(host) {
                break;
            }
            let Some(layout) = grid_ref(&self.arena, host) else {
                break;
            };
            if referenced.contains(layout.container()) {
                return Err(ConfigError::CyclicNesting {
                    container: layout.container().clone(),
                });
            }
            current = layout.container().clone();
        }
        Ok(())
    }

    /// The grid whose configuration references `container` as a nested grid.
    fn host_of(&self, container: &OccupantId) -> Option<NodeId> {
        self.containers.values().copied().find(|node| {
            grid_ref(&self.arena, *node)
                .is_some_and(|layout| layout.config().nested_containers().any(|nested| nested == container))
        })
    }

    /// Rebuild the arena's parent links and the host items' nested links from
    /// the current configurations.
    pub(super) fn relink(&mut self) {
        let mut nodes: Vec<NodeId> = self.containers.values().copied().collect();
        nodes.sort_unstable();

        let mut desired: HashMap<NodeId, ParentLink> = HashMap::new();
        let mut references = Vec::new();
        for host in &nodes {
            let Some(layout) = grid_ref(&self.arena, *host) else {
                continue;
            };
            for (slot, container, propagate) in layout.nested_refs() {
                let nested = self.containers.get(&container).copied().filter(|nested| nested != host);
                if let Some(nested) = nested {
                    desired.entry(nested).or_insert(ParentLink {
                        host: GridId(*host),
                        slot,
                        propagate,
                    });
                }
                references.push((*host, slot, nested));
            }
        }

        for node in &nodes {
            let wanted = desired.get(node).copied();
            let arena_parent = self.arena.get(*node).and_then(Node::parent);
            let current = grid_ref(&self.arena, *node).and_then(GridLayout::parent);
            if current == wanted && arena_parent == wanted.map(|link| link.host.0) {
                continue;
            }
            node.detach(&mut self.arena);
            let applied = wanted.filter(|link| match link.host.0.checked_append(*node, &mut self.arena) {
                Ok(()) => true,
                Err(error) => {
                    warn!("Cannot nest {node:?} under {:?}: {error:?}", link.host);
                    false
                }
            });
            if let Some(layout) = grid_mut(&mut self.arena, *node) {
                debug!("Linking {} to {:?}", layout.container(), applied.map(|link| link.host));
                layout.set_parent(applied);
            }
        }

        for (host, slot, nested) in references {
            let linked = nested.filter(|nested| {
                grid_ref(&self.arena, *nested)
                    .and_then(GridLayout::parent)
                    .is_some_and(|link| link.host.0 == host && link.slot == slot)
            });
            if let Some(layout) = grid_mut(&mut self.arena, host) {
                layout.link_nested(slot, linked.map(GridId));
            }
        }

        self.roots = nodes
            .into_iter()
            .filter(|node| self.arena.get(*node).and_then(Node::parent).is_none())
            .collect();
    }

    /// Drop a grid whose container left the visual tree, with every grid nested in it.
    pub(super) fn remove_stale(&mut self, node: NodeId) {
        let subtree: Vec<NodeId> = node.descendants(&self.arena).collect();
        for member in &subtree {
            let Some(container) = grid_ref(&self.arena, *member).map(|layout| layout.container().clone()) else {
                continue;
            };
            debug!("Dropping grid on {container}: container detached");
            self.containers.remove(&container);
        }
        let link = grid_ref(&self.arena, node).and_then(GridLayout::parent);
        if let Some((host, slot)) = link.and_then(|link| grid_mut(&mut self.arena, link.host.0).map(|host| (host, link.slot))) {
            host.detach_nested(slot);
        }
        if self.capture.is_some_and(|session| subtree.contains(&session.grid.0)) {
            debug!("Active drag ended with its grid");
            self.capture = None;
            self.phase = DragPhase::Idle;
        }
        node.remove_subtree(&mut self.arena);
        self.roots.retain(|root| *root != node);
    }

    /// Every grid, nested grids before their hosts.
    pub(super) fn post_order(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .flat_map(|root| root.traverse(&self.arena))
            .filter_map(|edge| match edge {
                NodeEdge::End(node) => Some(node),
                NodeEdge::Start(_) => None,
            })
            .collect()
    }

    /// Every grid, hosts before their nested grids.
    pub(super) fn pre_order(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .flat_map(|root| root.descendants(&self.arena))
            .collect()
    }
}
