//! Attack graph style tables.
//!
//! Colours are picked per node role and per relationship kind. The theme is
//! always passed in by the caller.

use serde::{Deserialize, Serialize};
use sheetstorm_core::{EdgeKind, NodeRole, SyncState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

/// RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn darken(&self, factor: f32) -> Self {
        Self {
            r: ((self.r as f32) * (1.0 - factor)) as u8,
            g: ((self.g as f32) * (1.0 - factor)) as u8,
            b: ((self.b as f32) * (1.0 - factor)) as u8,
            a: self.a,
        }
    }

    pub fn lighten(&self, factor: f32) -> Self {
        Self {
            r: ((self.r as f32) + (255.0 - self.r as f32) * factor) as u8,
            g: ((self.g as f32) + (255.0 - self.g as f32) * factor) as u8,
            b: ((self.b as f32) + (255.0 - self.b as f32) * factor) as u8,
            a: self.a,
        }
    }

    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    RoundedRect,
    Hexagon,
    Diamond,
    Circle,
    Cylinder,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeColors {
    pub fill: Color,
    pub border: Color,
    pub text: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStyle {
    pub colors: NodeColors,
    pub shape: NodeShape,
    pub border_width: f32,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub color: Color,
    pub width: f32,
    pub dashed: bool,
    pub animated: bool,
    pub arrow_head: bool,
}

// Role accents, shared by both themes.
pub const COLOR_HOST: Color = Color::rgb(59, 130, 246);
pub const COLOR_DOMAIN_CONTROLLER: Color = Color::rgb(124, 58, 237);
pub const COLOR_ATTACKER: Color = Color::rgb(220, 38, 38);
pub const COLOR_C2: Color = Color::rgb(190, 18, 60);
pub const COLOR_ACCOUNT: Color = Color::rgb(234, 179, 8);
pub const COLOR_IP: Color = Color::rgb(6, 182, 212);
pub const COLOR_MALWARE: Color = Color::rgb(249, 115, 22);
pub const COLOR_HOST_INDICATOR: Color = Color::rgb(168, 85, 247);
pub const COLOR_CLOUD: Color = Color::rgb(14, 165, 233);
pub const COLOR_DATABASE: Color = Color::rgb(16, 185, 129);
pub const COLOR_GENERIC: Color = Color::rgb(107, 114, 128);

// Edge colours, grouped by tactic.
pub const COLOR_EDGE_LATERAL: Color = Color::rgb(239, 68, 68);
pub const COLOR_EDGE_CREDENTIAL: Color = Color::rgb(234, 179, 8);
pub const COLOR_EDGE_EXFIL: Color = Color::rgb(236, 72, 153);
pub const COLOR_EDGE_C2: Color = Color::rgb(190, 18, 60);
pub const COLOR_EDGE_INITIAL_ACCESS: Color = Color::rgb(220, 38, 38);
pub const COLOR_EDGE_PRIVESC: Color = Color::rgb(249, 115, 22);
pub const COLOR_EDGE_PERSISTENCE: Color = Color::rgb(124, 58, 237);
pub const COLOR_EDGE_DISCOVERY: Color = Color::rgb(59, 130, 246);
pub const COLOR_EDGE_EXECUTION: Color = Color::rgb(245, 158, 11);
pub const COLOR_EDGE_EVASION: Color = Color::rgb(100, 116, 139);
pub const COLOR_EDGE_COLLECTION: Color = Color::rgb(16, 185, 129);
pub const COLOR_EDGE_ASSOCIATION: Color = Color::rgb(148, 163, 184);

pub const ATTACK_EDGE_WIDTH: f32 = 2.0;
pub const ASSOCIATION_EDGE_WIDTH: f32 = 1.0;

const LIGHT_SURFACE: Color = Color::rgb(255, 255, 255);
const DARK_SURFACE: Color = Color::rgb(31, 41, 55);
const LIGHT_TEXT: Color = Color::rgb(17, 24, 39);
const DARK_TEXT: Color = Color::rgb(243, 244, 246);

pub fn role_color(role: NodeRole) -> Color {
    match role {
        NodeRole::Host => COLOR_HOST,
        NodeRole::DomainController => COLOR_DOMAIN_CONTROLLER,
        NodeRole::Attacker => COLOR_ATTACKER,
        NodeRole::C2Server => COLOR_C2,
        NodeRole::Account => COLOR_ACCOUNT,
        NodeRole::IpAddress => COLOR_IP,
        NodeRole::Malware => COLOR_MALWARE,
        NodeRole::HostIndicator => COLOR_HOST_INDICATOR,
        NodeRole::CloudResource => COLOR_CLOUD,
        NodeRole::Database => COLOR_DATABASE,
        NodeRole::Generic => COLOR_GENERIC,
    }
}

fn role_shape(role: NodeRole) -> NodeShape {
    match role {
        NodeRole::Host | NodeRole::DomainController => NodeShape::RoundedRect,
        NodeRole::Attacker | NodeRole::C2Server => NodeShape::Hexagon,
        NodeRole::IpAddress | NodeRole::HostIndicator => NodeShape::Diamond,
        NodeRole::Account | NodeRole::Malware => NodeShape::Circle,
        NodeRole::Database | NodeRole::CloudResource => NodeShape::Cylinder,
        NodeRole::Generic => NodeShape::RoundedRect,
    }
}

fn role_icon(role: NodeRole) -> &'static str {
    match role {
        NodeRole::Host => "monitor",
        NodeRole::DomainController => "server-cog",
        NodeRole::Attacker => "skull",
        NodeRole::C2Server => "radio-tower",
        NodeRole::Account => "user",
        NodeRole::IpAddress => "globe",
        NodeRole::Malware => "bug",
        NodeRole::HostIndicator => "file-warning",
        NodeRole::CloudResource => "cloud",
        NodeRole::Database => "database",
        NodeRole::Generic => "circle",
    }
}

pub fn node_colors(role: NodeRole, theme: ThemeMode) -> NodeColors {
    let accent = role_color(role);
    match theme {
        ThemeMode::Light => NodeColors {
            fill: accent.lighten(0.85),
            border: accent,
            text: LIGHT_TEXT,
        },
        ThemeMode::Dark => NodeColors {
            fill: DARK_SURFACE.lighten(0.05),
            border: accent.lighten(0.15),
            text: DARK_TEXT,
        },
    }
}

pub fn node_style(role: NodeRole, theme: ThemeMode) -> NodeStyle {
    NodeStyle {
        colors: node_colors(role, theme),
        shape: role_shape(role),
        border_width: if role.is_hub() { 2.0 } else { 1.5 },
        icon: role_icon(role),
    }
}

/// Node style adjusted for sync state: pending nodes fade, failed ones get a
/// red border.
pub fn node_style_for_state(role: NodeRole, state: SyncState, theme: ThemeMode) -> NodeStyle {
    let mut style = node_style(role, theme);
    match state {
        SyncState::Confirmed => {}
        SyncState::Pending => {
            style.colors.fill = style.colors.fill.with_alpha(150);
            style.colors.border = style.colors.border.with_alpha(150);
        }
        SyncState::Failed => {
            style.colors.border = COLOR_ATTACKER;
            style.border_width = 2.5;
        }
    }
    style
}

pub fn edge_color(kind: EdgeKind) -> Color {
    match kind {
        EdgeKind::LateralMovement => COLOR_EDGE_LATERAL,
        EdgeKind::CredentialTheft => COLOR_EDGE_CREDENTIAL,
        EdgeKind::DataExfiltration => COLOR_EDGE_EXFIL,
        EdgeKind::CommandControl => COLOR_EDGE_C2,
        EdgeKind::InitialAccess => COLOR_EDGE_INITIAL_ACCESS,
        EdgeKind::PrivilegeEscalation => COLOR_EDGE_PRIVESC,
        EdgeKind::Persistence => COLOR_EDGE_PERSISTENCE,
        EdgeKind::Discovery => COLOR_EDGE_DISCOVERY,
        EdgeKind::Execution => COLOR_EDGE_EXECUTION,
        EdgeKind::DefenseEvasion => COLOR_EDGE_EVASION,
        EdgeKind::Collection => COLOR_EDGE_COLLECTION,
        EdgeKind::AssociatedWith => COLOR_EDGE_ASSOCIATION,
    }
}

pub fn edge_style(kind: EdgeKind, theme: ThemeMode) -> EdgeStyle {
    if kind.is_association() {
        let color = match theme {
            ThemeMode::Light => COLOR_EDGE_ASSOCIATION,
            ThemeMode::Dark => COLOR_EDGE_ASSOCIATION.darken(0.3),
        };
        return EdgeStyle {
            color,
            width: ASSOCIATION_EDGE_WIDTH,
            dashed: true,
            animated: false,
            arrow_head: false,
        };
    }

    let color = match theme {
        ThemeMode::Light => edge_color(kind),
        ThemeMode::Dark => edge_color(kind).lighten(0.1),
    };
    EdgeStyle {
        color,
        width: ATTACK_EDGE_WIDTH,
        dashed: false,
        // Movement across the environment is animated on the canvas.
        animated: matches!(
            kind,
            EdgeKind::LateralMovement | EdgeKind::CommandControl | EdgeKind::DataExfiltration
        ),
        arrow_head: true,
    }
}

pub fn canvas_background(theme: ThemeMode) -> Color {
    match theme {
        ThemeMode::Light => LIGHT_SURFACE,
        ThemeMode::Dark => DARK_SURFACE,
    }
}
