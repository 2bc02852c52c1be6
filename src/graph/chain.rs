//! Chain walking: transitive blockers (upstream) and blocked items (downstream).

use super::GraphSnapshot;
use crate::error::ToolError;
use crate::types::{TaskRef, suggest_correction};
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;

/// Which way to walk from the starting task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainDirection {
    Upstream,
    Downstream,
    #[default]
    Both,
}

impl ChainDirection {
    pub const NAMES: [&'static str; 3] = ["upstream", "downstream", "both"];

    pub fn includes_upstream(&self) -> bool {
        matches!(self, ChainDirection::Upstream | ChainDirection::Both)
    }

    pub fn includes_downstream(&self) -> bool {
        matches!(self, ChainDirection::Downstream | ChainDirection::Both)
    }
}

impl FromStr for ChainDirection {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upstream" => Ok(ChainDirection::Upstream),
            "downstream" => Ok(ChainDirection::Downstream),
            "both" => Ok(ChainDirection::Both),
            other => {
                let mut message =
                    "Direction must be 'upstream', 'downstream', or 'both'".to_string();
                let normalized = other.trim().to_lowercase();
                if let Some(suggestion) = suggest_correction(&normalized, &ChainDirection::NAMES) {
                    message.push_str(&format!(". Did you mean '{}'?", suggestion));
                }
                Err(ToolError::invalid_value("direction", message))
            }
        }
    }
}

/// One task in a chain tree. Upstream nodes carry `blockers`, downstream
/// nodes carry `blocked`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainNode {
    #[serde(flatten)]
    pub item: TaskRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockers: Option<Vec<ChainNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<Vec<ChainNode>>,
}

// Deep chains would otherwise drop recursively.
impl Drop for ChainNode {
    fn drop(&mut self) {
        let mut pending: Vec<ChainNode> = Vec::new();
        pending.extend(self.blockers.take().into_iter().flatten());
        pending.extend(self.blocked.take().into_iter().flatten());
        while let Some(mut node) = pending.pop() {
            pending.extend(node.blockers.take().into_iter().flatten());
            pending.extend(node.blocked.take().into_iter().flatten());
        }
    }
}

impl ChainNode {
    /// Children in whichever direction this node was expanded.
    pub fn children(&self) -> &[ChainNode] {
        self.blockers
            .as_deref()
            .or(self.blocked.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainResult {
    pub item: TaskRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<Vec<ChainNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream: Option<Vec<ChainNode>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Up,
    Down,
}

impl Walk {
    fn next<'a>(&self, snapshot: &'a GraphSnapshot, id: i64) -> &'a [i64] {
        match self {
            Walk::Up => snapshot.blockers_of(id),
            Walk::Down => snapshot.dependents_of(id),
        }
    }

    fn node(&self, item: TaskRef, children: Vec<ChainNode>) -> ChainNode {
        match self {
            Walk::Up => ChainNode {
                item,
                blockers: Some(children),
                blocked: None,
            },
            Walk::Down => ChainNode {
                item,
                blockers: None,
                blocked: Some(children),
            },
        }
    }
}

struct Slot {
    item: TaskRef,
    children: Vec<usize>,
}

/// Walk the chain from `task_id`. Returns `None` if the task does not exist.
///
/// Each direction gets its own visited set. A task already visited in the
/// walk still shows up where it is reached again, but is not expanded, so
/// cycles terminate and diamond-shaped ancestry is expanded only under the
/// first branch that reaches it.
pub fn dependency_chain(
    snapshot: &GraphSnapshot,
    task_id: i64,
    direction: ChainDirection,
) -> Option<ChainResult> {
    let root = snapshot.task(task_id)?.to_ref();

    Some(ChainResult {
        upstream: direction
            .includes_upstream()
            .then(|| walk(snapshot, &root, Walk::Up)),
        downstream: direction
            .includes_downstream()
            .then(|| walk(snapshot, &root, Walk::Down)),
        item: root,
    })
}

/// Pre-order depth-first expansion with an explicit stack.
fn walk(snapshot: &GraphSnapshot, root: &TaskRef, way: Walk) -> Vec<ChainNode> {
    let mut arena = vec![Slot {
        item: root.clone(),
        children: Vec::new(),
    }];
    let mut visited: HashSet<i64> = HashSet::new();
    let mut stack = vec![0usize];

    while let Some(idx) = stack.pop() {
        let id = arena[idx].item.id;
        if !visited.insert(id) {
            continue;
        }

        let first = arena.len();
        for task in way.next(snapshot, id).iter().filter_map(|&n| snapshot.task(n)) {
            arena.push(Slot {
                item: task.to_ref(),
                children: Vec::new(),
            });
        }
        let children: Vec<usize> = (first..arena.len()).collect();
        // Reverse so the first child is expanded first.
        stack.extend(children.iter().rev());
        arena[idx].children = children;
    }

    // Children always sit after their parent in the arena, so building from
    // the back sees every child before its parent.
    let mut built: Vec<Option<ChainNode>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);
    for idx in (1..arena.len()).rev() {
        let children = arena[idx]
            .children
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[idx] = Some(way.node(arena[idx].item.clone(), children));
    }

    arena[0]
        .children
        .iter()
        .filter_map(|&c| built[c].take())
        .collect()
}
