use crate::KindParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node type as stored by the backend.
///
/// Values outside the known vocabulary are kept in `Other` so a node written
/// by a newer server survives a load/save cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Workstation,
    Server,
    DomainController,
    Attacker,
    C2Server,
    CloudResource,
    User,
    ServiceAccount,
    External,
    Unknown,
    IpAddress,
    Malware,
    HostIndicator,
    Database,
    WebServer,
    FileServer,
    Other(String),
}

impl NodeKind {
    pub const KNOWN: [NodeKind; 16] = [
        NodeKind::Workstation,
        NodeKind::Server,
        NodeKind::DomainController,
        NodeKind::Attacker,
        NodeKind::C2Server,
        NodeKind::CloudResource,
        NodeKind::User,
        NodeKind::ServiceAccount,
        NodeKind::External,
        NodeKind::Unknown,
        NodeKind::IpAddress,
        NodeKind::Malware,
        NodeKind::HostIndicator,
        NodeKind::Database,
        NodeKind::WebServer,
        NodeKind::FileServer,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Workstation => "workstation",
            NodeKind::Server => "server",
            NodeKind::DomainController => "domain_controller",
            NodeKind::Attacker => "attacker",
            NodeKind::C2Server => "c2_server",
            NodeKind::CloudResource => "cloud_resource",
            NodeKind::User => "user",
            NodeKind::ServiceAccount => "service_account",
            NodeKind::External => "external",
            NodeKind::Unknown => "unknown",
            NodeKind::IpAddress => "ip_address",
            NodeKind::Malware => "malware",
            NodeKind::HostIndicator => "host_indicator",
            NodeKind::Database => "database",
            NodeKind::WebServer => "web_server",
            NodeKind::FileServer => "file_server",
            NodeKind::Other(raw) => raw,
        }
    }

    /// Rendering role lookup. Total: anything unrecognised is `Generic`.
    pub fn role(&self) -> NodeRole {
        match self {
            NodeKind::Workstation | NodeKind::Server | NodeKind::WebServer | NodeKind::FileServer => {
                NodeRole::Host
            }
            NodeKind::DomainController => NodeRole::DomainController,
            NodeKind::Attacker => NodeRole::Attacker,
            NodeKind::C2Server => NodeRole::C2Server,
            NodeKind::User | NodeKind::ServiceAccount => NodeRole::Account,
            NodeKind::IpAddress => NodeRole::IpAddress,
            NodeKind::Malware => NodeRole::Malware,
            NodeKind::HostIndicator => NodeRole::HostIndicator,
            NodeKind::CloudResource => NodeRole::CloudResource,
            NodeKind::Database => NodeRole::Database,
            NodeKind::External | NodeKind::Unknown | NodeKind::Other(_) => NodeRole::Generic,
        }
    }
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Unknown
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        NodeKind::KNOWN
            .iter()
            .find(|kind| kind.as_str() == value)
            .cloned()
            .unwrap_or(NodeKind::Other(value))
    }
}

impl From<NodeKind> for String {
    fn from(value: NodeKind) -> Self {
        match value {
            NodeKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Strict parse for user input; only the known vocabulary is accepted.
impl FromStr for NodeKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::KNOWN
            .iter()
            .find(|kind| kind.as_str() == s.trim())
            .cloned()
            .ok_or_else(|| KindParseError::InvalidNodeKind(s.to_string()))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeRole {
    Host,
    DomainController,
    Attacker,
    C2Server,
    Account,
    IpAddress,
    Malware,
    HostIndicator,
    CloudResource,
    Database,
    #[default]
    Generic,
}

impl NodeRole {
    pub const ALL: [NodeRole; 11] = [
        NodeRole::Host,
        NodeRole::DomainController,
        NodeRole::Attacker,
        NodeRole::C2Server,
        NodeRole::Account,
        NodeRole::IpAddress,
        NodeRole::Malware,
        NodeRole::HostIndicator,
        NodeRole::CloudResource,
        NodeRole::Database,
        NodeRole::Generic,
    ];

    /// Hubs anchor the auto-layout; everything else orbits them.
    pub fn is_hub(self) -> bool {
        matches!(self, NodeRole::Host | NodeRole::DomainController)
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeRole::Host => "Host",
            NodeRole::DomainController => "Domain Controller",
            NodeRole::Attacker => "Attacker",
            NodeRole::C2Server => "C2 Server",
            NodeRole::Account => "Account",
            NodeRole::IpAddress => "Network IOC",
            NodeRole::Malware => "Malware",
            NodeRole::HostIndicator => "Host Indicator",
            NodeRole::CloudResource => "Cloud Resource",
            NodeRole::Database => "Database",
            NodeRole::Generic => "Node",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_lookup_is_total() {
        assert_eq!(NodeKind::Workstation.role(), NodeRole::Host);
        assert_eq!(NodeKind::FileServer.role(), NodeRole::Host);
        assert_eq!(NodeKind::DomainController.role(), NodeRole::DomainController);
        assert_eq!(NodeKind::ServiceAccount.role(), NodeRole::Account);
        assert_eq!(
            NodeKind::Other("satellite_uplink".into()).role(),
            NodeRole::Generic
        );
    }

    #[test]
    fn unknown_wire_values_round_trip() {
        let kind: NodeKind = serde_json::from_str("\"satellite_uplink\"").unwrap();
        assert_eq!(kind, NodeKind::Other("satellite_uplink".into()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"satellite_uplink\"");

        let dc: NodeKind = serde_json::from_str("\"domain_controller\"").unwrap();
        assert_eq!(dc, NodeKind::DomainController);
    }

    #[test]
    fn strict_parse_rejects_unknown_kinds() {
        assert_eq!("c2_server".parse::<NodeKind>(), Ok(NodeKind::C2Server));
        assert!("router".parse::<NodeKind>().is_err());
    }

    #[test]
    fn only_hosts_and_domain_controllers_are_hubs() {
        for kind in NodeKind::KNOWN {
            let role = kind.role();
            assert_eq!(
                role.is_hub(),
                matches!(role, NodeRole::Host | NodeRole::DomainController)
            );
        }
        assert!(!NodeRole::Database.is_hub());
    }
}
