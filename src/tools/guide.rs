//! Static workflow guide for assistants driving the tools.

use super::make_tool;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

const WORKFLOW_GUIDE: &str = r#"# Todo graph workflow

## Capture work
- `add_item` with a short `description`. Put context, acceptance criteria
  and notes in `long_description`.
- Set `priority` (high, medium, low), `due_date` (YYYY-MM-DD) and
  comma-separated `tags` so the ready list orders work sensibly.

## Express ordering
- `add_dependency(blocker_id, blocked_id)` records that the blocker must be
  finished (done or cancelled) before the blocked item can start.
- An item cannot block itself and each pair is recorded once.
- `list_dependencies(item_id)` shows direct blockers and dependents;
  without an id it lists every dependency.
- `get_dependency_chain(item_id, direction)` shows the transitive tree
  upstream (what it waits on), downstream (what waits on it) or both.

## Pick the next item
- `get_ready_items` returns active items whose direct blockers are all
  resolved, highest priority and earliest due date first, plus the blocked
  items with the blockers still holding them.
- Move the chosen item to `in_progress` with `update_item`.

## Finish
- Run the project's tests. Only when they pass, call `mark_item_done`.
- Items that will not be done should be set to `cancelled`; they stop
  blocking their dependents.
- `remove_item` deletes an item and every dependency touching it.

## Review
- `list_items` shows open and in-progress items by default. Use
  `show_all_statuses`, `status_filter`, `priority_filter`, `tag_filter`,
  `sort_by` (prefix `-` for descending), `limit` and `offset` to narrow it.
"#;

pub fn get_tools() -> Vec<Tool> {
    vec![make_tool(
        "assistant_workflow_guide",
        "How to use the todo tools: capturing items, expressing dependencies, picking ready work and finishing it.",
        json!({}),
        vec![],
    )]
}

pub fn assistant_workflow_guide(_args: Value) -> Result<Value> {
    Ok(json!({ "guide": WORKFLOW_GUIDE }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_mentions_every_dependency_tool() {
        let value = assistant_workflow_guide(json!({})).unwrap();
        let guide = value["guide"].as_str().unwrap();

        for tool in [
            "add_dependency",
            "list_dependencies",
            "get_dependency_chain",
            "get_ready_items",
            "mark_item_done",
        ] {
            assert!(guide.contains(tool), "guide does not mention {}", tool);
        }
    }
}
