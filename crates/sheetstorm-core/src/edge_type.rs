use crate::KindParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relationship between two attack graph nodes.
///
/// `AssociatedWith` is the fallback: unknown wire values decode to it and it
/// renders as a plain association rather than a tactical step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    LateralMovement,
    CredentialTheft,
    DataExfiltration,
    CommandControl,
    InitialAccess,
    PrivilegeEscalation,
    Persistence,
    Discovery,
    Execution,
    DefenseEvasion,
    Collection,
    #[default]
    #[serde(other)]
    AssociatedWith,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 12] = [
        EdgeKind::LateralMovement,
        EdgeKind::CredentialTheft,
        EdgeKind::DataExfiltration,
        EdgeKind::CommandControl,
        EdgeKind::InitialAccess,
        EdgeKind::PrivilegeEscalation,
        EdgeKind::Persistence,
        EdgeKind::Discovery,
        EdgeKind::Execution,
        EdgeKind::DefenseEvasion,
        EdgeKind::Collection,
        EdgeKind::AssociatedWith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::LateralMovement => "lateral_movement",
            EdgeKind::CredentialTheft => "credential_theft",
            EdgeKind::DataExfiltration => "data_exfiltration",
            EdgeKind::CommandControl => "command_control",
            EdgeKind::InitialAccess => "initial_access",
            EdgeKind::PrivilegeEscalation => "privilege_escalation",
            EdgeKind::Persistence => "persistence",
            EdgeKind::Discovery => "discovery",
            EdgeKind::Execution => "execution",
            EdgeKind::DefenseEvasion => "defense_evasion",
            EdgeKind::Collection => "collection",
            EdgeKind::AssociatedWith => "associated_with",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EdgeKind::LateralMovement => "Lateral Movement",
            EdgeKind::CredentialTheft => "Credential Theft",
            EdgeKind::DataExfiltration => "Data Exfiltration",
            EdgeKind::CommandControl => "Command & Control",
            EdgeKind::InitialAccess => "Initial Access",
            EdgeKind::PrivilegeEscalation => "Privilege Escalation",
            EdgeKind::Persistence => "Persistence",
            EdgeKind::Discovery => "Discovery",
            EdgeKind::Execution => "Execution",
            EdgeKind::DefenseEvasion => "Defense Evasion",
            EdgeKind::Collection => "Collection",
            EdgeKind::AssociatedWith => "Associated",
        }
    }

    pub fn is_association(self) -> bool {
        self == EdgeKind::AssociatedWith
    }
}

/// Lenient conversion used on server data.
impl From<&str> for EdgeKind {
    fn from(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for EdgeKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| KindParseError::InvalidEdgeKind(s.to_string()))
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render type handed to the canvas. Every attack graph edge uses the same
/// custom renderer; the relationship tag travels alongside as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRenderType {
    #[default]
    Attack,
}
