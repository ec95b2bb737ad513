//! Display records for the selection panel.
//!
//! Everything here reads the opaque metadata bag through a fixed per-role
//! table. Absent or mistyped keys are skipped.

use serde::Serialize;
use serde_json::Value;
use sheetstorm_core::{GraphEdge, GraphNode, Metadata, NodeRole, SyncState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    Flag,
}

struct FieldSpec {
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
}

const fn text(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Text,
    }
}

const fn number(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Number,
    }
}

const fn flag(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Flag,
    }
}

const HOST_FIELDS: &[FieldSpec] = &[
    text("ip_address", "IP Address"),
    text("containment_status", "Containment"),
];

const ACCOUNT_FIELDS: &[FieldSpec] = &[
    text("account_type", "Account Type"),
    text("domain", "Domain"),
    text("sid", "SID"),
    text("status", "Status"),
    flag("is_privileged", "Privileged"),
    text("host_system", "Host"),
];

const MALWARE_FIELDS: &[FieldSpec] = &[
    text("malware_family", "Family"),
    text("sha256", "SHA256"),
    text("md5", "MD5"),
    text("file_path", "Path"),
    text("threat_actor", "Threat Actor"),
    flag("is_tool", "Tool"),
    text("host_system", "Host"),
];

const IP_FIELDS: &[FieldSpec] = &[
    text("direction", "Direction"),
    text("protocol", "Protocol"),
    number("port", "Port"),
    flag("is_malicious", "Malicious"),
    text("destination_host", "Destination"),
    text("threat_intel_source", "Threat Intel"),
    text("description", "Description"),
];

const HOST_INDICATOR_FIELDS: &[FieldSpec] = &[
    text("artifact_type", "Artifact Type"),
    text("artifact_value", "Value"),
    flag("is_malicious", "Malicious"),
    flag("remediated", "Remediated"),
    text("notes", "Notes"),
    text("host_system", "Host"),
];

const GENERIC_FIELDS: &[FieldSpec] = &[text("description", "Description")];

fn fields_for(role: NodeRole) -> &'static [FieldSpec] {
    match role {
        NodeRole::Host | NodeRole::DomainController => HOST_FIELDS,
        NodeRole::Account => ACCOUNT_FIELDS,
        NodeRole::Malware => MALWARE_FIELDS,
        NodeRole::IpAddress => IP_FIELDS,
        NodeRole::HostIndicator => HOST_INDICATOR_FIELDS,
        NodeRole::Attacker
        | NodeRole::C2Server
        | NodeRole::CloudResource
        | NodeRole::Database
        | NodeRole::Generic => GENERIC_FIELDS,
    }
}

fn render(value: &Value, kind: FieldKind) -> Option<String> {
    match (kind, value) {
        (FieldKind::Text, Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        (FieldKind::Text, Value::Number(n)) => Some(n.to_string()),
        (FieldKind::Number, Value::Number(n)) => Some(n.to_string()),
        (FieldKind::Number, Value::String(s)) => s.trim().parse::<i64>().ok().map(|n| n.to_string()),
        (FieldKind::Flag, Value::Bool(b)) => Some((if *b { "Yes" } else { "No" }).to_string()),
        _ => None,
    }
}

fn extract(metadata: &Metadata, specs: &[FieldSpec]) -> Vec<Field> {
    specs
        .iter()
        .filter_map(|spec| {
            let value = render(metadata.get(spec.key)?, spec.kind)?;
            Some(Field {
                label: spec.label,
                value,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    InitialAccess,
    Objective,
    Pending,
    SyncFailed,
}

impl Badge {
    pub fn label(self) -> &'static str {
        match self {
            Badge::InitialAccess => "Initial Access",
            Badge::Objective => "Objective",
            Badge::Pending => "Saving",
            Badge::SyncFailed => "Not Saved",
        }
    }
}

/// What the side panel shows for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub title: String,
    pub subtitle: String,
    pub badges: Vec<Badge>,
    pub fields: Vec<Field>,
}

fn sync_badge(state: SyncState) -> Option<Badge> {
    match state {
        SyncState::Confirmed => None,
        SyncState::Pending => Some(Badge::Pending),
        SyncState::Failed => Some(Badge::SyncFailed),
    }
}

pub fn inspect_node(node: &GraphNode) -> Inspection {
    let mut badges = Vec::new();
    if node.is_initial_access {
        badges.push(Badge::InitialAccess);
    }
    if node.is_objective {
        badges.push(Badge::Objective);
    }
    badges.extend(sync_badge(node.state));

    let mut fields = vec![Field {
        label: "Type",
        value: node.kind.to_string(),
    }];
    fields.extend(extract(&node.metadata, fields_for(node.role)));

    if let Some(correlation) = node.correlation.filter(|c| c.total() > 0) {
        let counts = [
            ("Accounts", correlation.accounts),
            ("Malware", correlation.malware),
            ("Network IOCs", correlation.network_iocs),
            ("Host IOCs", correlation.host_iocs),
            ("Timeline Events", correlation.timeline_events),
        ];
        fields.extend(
            counts
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(label, count)| Field {
                    label,
                    value: count.to_string(),
                }),
        );
    }

    Inspection {
        title: node.label.clone(),
        subtitle: node.role.label().to_string(),
        badges,
        fields,
    }
}

/// Endpoints are looked up in `nodes` for display; unknown ones show their id.
pub fn inspect_edge(edge: &GraphEdge, nodes: &[GraphNode]) -> Inspection {
    let endpoint = |id: &sheetstorm_core::NodeId| {
        nodes
            .iter()
            .find(|n| n.has_id(id))
            .map(|n| n.label.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let optional = [
        ("Tactic", edge.mitre_tactic.as_deref()),
        ("Technique", edge.mitre_technique.as_deref()),
        ("Timestamp", edge.timestamp.as_deref()),
        ("Description", edge.description.as_deref()),
    ];

    let mut fields = vec![
        Field {
            label: "From",
            value: endpoint(&edge.source),
        },
        Field {
            label: "To",
            value: endpoint(&edge.target),
        },
    ];
    fields.extend(
        optional
            .into_iter()
            .filter_map(|(label, value)| match value {
                Some(v) if !v.trim().is_empty() => Some(Field {
                    label,
                    value: v.to_string(),
                }),
                _ => None,
            }),
    );
    if let Some(event) = &edge.linked_event_id {
        fields.push(Field {
            label: "Timeline Event",
            value: event.to_string(),
        });
    }

    Inspection {
        title: edge.display_label().to_string(),
        subtitle: edge.kind.label().to_string(),
        badges: sync_badge(edge.state).into_iter().collect(),
        fields,
    }
}
