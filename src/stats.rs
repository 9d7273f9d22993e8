//! Export metadata and summary counts

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::scripts::ScriptMap;

const UNTITLED: &str = "Untitled Export";

/// Summary of a decoded export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Display name, see [`export_name`]
    pub name: String,
    /// Author, `Unknown` when not set
    pub author: String,
    /// Version, `1.0` when not set
    pub version: String,
    /// Description, `No description provided` when not set
    pub description: String,
    /// Number of actions
    pub actions: usize,
    /// Number of sub-actions, nested ones included
    pub sub_actions: usize,
    /// Number of triggers over all actions
    pub triggers: usize,
    /// Number of extracted scripts
    pub scripts: usize,
    /// Number of chat commands
    pub commands: usize,
    /// Number of timed actions
    pub timed_actions: usize,
    /// Number of action queues
    pub queues: usize,
    /// Number of groups, or of distinct action group names if that is larger
    pub groups: usize,
    /// Number of websocket servers
    pub websocket_servers: usize,
    /// Number of websocket clients
    pub websocket_clients: usize,
}

/// Payload root: the `data` object when the export wraps one
fn payload_root(tree: &Value) -> &Value {
    match tree.get("data") {
        Some(data @ Value::Object(_)) => data,
        _ => tree,
    }
}

fn non_empty_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn array_len(value: &Value, key: &str) -> usize {
    value.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

fn count_sub_actions(items: &[Value]) -> usize {
    items
        .iter()
        .filter_map(|item| item.get("subActions").and_then(Value::as_array))
        .map(|subs| subs.len() + count_sub_actions(subs))
        .sum()
}

/// Display name of an export
///
/// A single-action export is named after its action.
pub fn export_name(tree: &Value) -> String {
    let root = payload_root(tree);
    let mut name = non_empty_str(tree, "/meta/name")
        .or_else(|| non_empty_str(tree, "/name"))
        .or_else(|| non_empty_str(root, "/name"))
        .unwrap_or(UNTITLED);

    if let Some([action]) = root.get("actions").and_then(Value::as_array).map(Vec::as_slice) {
        if let Some(action_name) = non_empty_str(action, "/name") {
            name = action_name;
        }
    }
    name.to_string()
}

impl ExportStats {
    /// Gather metadata and counts from a tree and its extracted scripts
    pub fn of(tree: &Value, scripts: &ScriptMap) -> Self {
        let root = payload_root(tree);
        let actions = root.get("actions").and_then(Value::as_array);

        let action_count = match actions {
            Some(list) => list.len(),
            None if root.get("id").is_some() && root.get("name").is_some() => 1,
            None => 0,
        };

        let (triggers, sub_actions, distinct_groups) = match actions {
            Some(list) => {
                let triggers = list.iter().map(|a| array_len(a, "triggers")).sum();
                let groups: HashSet<&str> = list
                    .iter()
                    .filter_map(|a| non_empty_str(a, "/group"))
                    .collect();
                (triggers, count_sub_actions(list), groups.len())
            }
            None => (0, 0, 0),
        };

        Self {
            name: export_name(tree),
            author: non_empty_str(tree, "/meta/author")
                .or_else(|| non_empty_str(tree, "/author"))
                .or_else(|| non_empty_str(root, "/author"))
                .unwrap_or("Unknown")
                .to_string(),
            version: non_empty_str(tree, "/meta/version")
                .or_else(|| non_empty_str(root, "/version"))
                .unwrap_or("1.0")
                .to_string(),
            description: non_empty_str(tree, "/meta/description")
                .or_else(|| non_empty_str(tree, "/description"))
                .or_else(|| non_empty_str(root, "/description"))
                .unwrap_or("No description provided")
                .to_string(),
            actions: action_count,
            sub_actions,
            triggers,
            scripts: scripts.len(),
            commands: array_len(root, "commands"),
            timed_actions: array_len(root, "timedActions"),
            queues: array_len(root, "actionQueues"),
            groups: array_len(root, "groups").max(distinct_groups),
            websocket_servers: array_len(root, "webSocketServers"),
            websocket_clients: array_len(root, "webSocketClients"),
        }
    }
}

impl fmt::Display for ExportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} by {}", self.name, self.version, self.author)?;
        writeln!(
            f,
            "actions: {}  sub-actions: {}  triggers: {}  scripts: {}",
            self.actions, self.sub_actions, self.triggers, self.scripts
        )?;
        write!(
            f,
            "commands: {}  timed actions: {}  queues: {}  groups: {}  websocket servers/clients: {}/{}",
            self.commands,
            self.timed_actions,
            self.queues,
            self.groups,
            self.websocket_servers,
            self.websocket_clients
        )
    }
}
