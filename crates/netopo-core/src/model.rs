//! Persisted shape of a network topology graph.
//!
//! Everything here is plain data with a camelCase JSON wire form. Back
//! references between elements (`parentId`, `haloId`, edge `source` /
//! `target`) are string ids resolved through lookups at use time, never
//! object references, so the whole document survives serialization as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metrics::{compute_metrics, GraphMetrics};

/// Store-assigned identifier of a graph.
pub type GraphId = String;

pub const DEFAULT_EDGE_CAPACITY: f64 = 1.0;
pub const DEFAULT_EDGE_DISTANCE: f64 = 1.0;
pub const DEFAULT_BASE_CONSUMPTION: f64 = 100.0;
pub const DEFAULT_EDGE_CONSUMPTION: f64 = 100.0;
pub const DEFAULT_EDGE_THICKNESS: f64 = 10.0;
pub const DEFAULT_ANTENNA_CONSUMPTION_BASE: f64 = 100.0;

// ============================================================================
// Enumerations
// ============================================================================

/// Editor mode of a graph. Selects which node types are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    RV,
    SC,
    Cloud,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::RV, Mode::SC, Mode::Cloud];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RV" => Some(Self::RV),
            "SC" => Some(Self::SC),
            "Cloud" => Some(Self::Cloud),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RV => "RV",
            Self::SC => "SC",
            Self::Cloud => "Cloud",
        }
    }

    /// Whether the editor offers `kind` in this mode.
    pub fn allows(self, kind: NodeKind) -> bool {
        match self {
            Self::RV | Self::SC => matches!(
                kind,
                NodeKind::Router | NodeKind::User | NodeKind::Antenna
            ),
            Self::Cloud => !matches!(kind, NodeKind::Antenna),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Router,
    User,
    Antenna,
    Cloud,
    PhoneConfig,
    TaskCreator,
}

impl NodeKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "router" => Some(Self::Router),
            "user" => Some(Self::User),
            "antenna" => Some(Self::Antenna),
            "cloud" => Some(Self::Cloud),
            "phone-config" => Some(Self::PhoneConfig),
            "task-creator" => Some(Self::TaskCreator),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::User => "user",
            Self::Antenna => "antenna",
            Self::Cloud => "cloud",
            Self::PhoneConfig => "phone-config",
            Self::TaskCreator => "task-creator",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Pairing,
    Cloud,
}

impl UserType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pairing" => Some(Self::Pairing),
            "cloud" => Some(Self::Cloud),
            _ => None,
        }
    }
}

// ============================================================================
// Elements
// ============================================================================

/// A server hosted by a `cloud` or `phone-config` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capacity: f64,
    #[serde(default)]
    pub consumption: f64,
}

/// A task owned by a `task-creator` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub charge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption_base: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption_radius_enabled: Option<bool>,
    #[serde(default)]
    pub user_type: UserType,
    /// Owning user node, looked up by id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            x,
            y,
            radius: None,
            halo_id: None,
            consumption: None,
            consumption_base: None,
            consumption_radius_enabled: None,
            user_type: UserType::default(),
            parent_id: None,
            servers: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn is_antenna(&self) -> bool {
        self.kind == NodeKind::Antenna
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub capacity: f64,
    pub distance: f64,
    pub base_consumption: f64,
    /// Derived by the calculator on the editor path; stored as given otherwise.
    pub consumption: f64,
    pub thickness: f64,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            capacity: DEFAULT_EDGE_CAPACITY,
            distance: DEFAULT_EDGE_DISTANCE,
            base_consumption: DEFAULT_BASE_CONSUMPTION,
            consumption: DEFAULT_EDGE_CONSUMPTION,
            thickness: DEFAULT_EDGE_THICKNESS,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

// ============================================================================
// Graph-level settings
// ============================================================================

/// Global multipliers for antenna consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntennaSettings {
    pub consumption_enabled: bool,
    pub consumption_radius_enabled: bool,
    pub consumption_base: f64,
}

impl Default for AntennaSettings {
    fn default() -> Self {
        Self {
            consumption_enabled: false,
            consumption_radius_enabled: false,
            consumption_base: DEFAULT_ANTENNA_CONSUMPTION_BASE,
        }
    }
}

/// Output of the external path solver: one colored path of node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSolution {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseImage {
    pub path: String,
    pub caption: String,
}

/// Instructional annotation attached to a graph. `content` is rich HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseContent {
    pub title: String,
    pub content: String,
    pub images: Vec<CourseImage>,
}

// ============================================================================
// Documents
// ============================================================================

/// The author-controlled part of a graph, after validation and defaulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub name: String,
    pub mode: Mode,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub minimum_consumption: Option<f64>,
    #[serde(default)]
    pub optimal_antenna_set: Vec<String>,
    #[serde(default)]
    pub optimal_path_solution: Vec<PathSolution>,
    #[serde(default)]
    pub antenna_settings: AntennaSettings,
    #[serde(default)]
    pub course_content: CourseContent,
}

impl GraphDocument {
    pub fn new(name: impl Into<String>, mode: Mode) -> Self {
        Self {
            name: name.into(),
            mode,
            nodes: Vec::new(),
            edges: Vec::new(),
            minimum_consumption: None,
            optimal_antenna_set: Vec::new(),
            optimal_path_solution: Vec::new(),
            antenna_settings: AntennaSettings::default(),
            course_content: CourseContent::default(),
        }
    }

    pub fn metrics(&self) -> GraphMetrics {
        compute_metrics(&self.nodes, &self.edges, &self.antenna_settings)
    }
}

/// A stored graph: the document plus server-owned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    #[serde(rename = "_id")]
    pub id: GraphId,
    #[serde(flatten)]
    pub document: GraphDocument,
    #[serde(default)]
    pub metrics: GraphMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Graph {
    /// Build a freshly created graph. Metrics are derived from `document`.
    pub fn create(id: impl Into<GraphId>, document: GraphDocument, now: DateTime<Utc>) -> Self {
        let metrics = document.metrics();
        Self {
            id: id.into(),
            document,
            metrics,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the document, keeping identity and creation time.
    pub fn revise(&self, document: GraphDocument, now: DateTime<Utc>) -> Self {
        let metrics = document.metrics();
        Self {
            id: self.id.clone(),
            document,
            metrics,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    pub fn mode(&self) -> Mode {
        self.document.mode
    }
}
