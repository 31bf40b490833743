//! Validation and defaulting of incoming graph bodies.
//!
//! Request bodies are first read into lenient drafts where every required
//! field is optional, so one pass can report every missing field instead of
//! stopping at the first serde error. [`GraphDraft::into_document`] then
//! applies defaults and produces a [`GraphDocument`].

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    AntennaSettings, CourseContent, CourseImage, Edge, GraphDocument, Mode, Node, NodeKind,
    PathSolution, Server, Task, UserType, DEFAULT_BASE_CONSUMPTION, DEFAULT_EDGE_CAPACITY,
    DEFAULT_EDGE_CONSUMPTION, DEFAULT_EDGE_DISTANCE, DEFAULT_EDGE_THICKNESS,
};

/// A rejected write. Carries every violation found.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("graph validation failed: {}", .violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            violations: vec![message.into()],
        }
    }
}

/// Parse and validate a full graph body.
pub fn parse_graph(body: Value) -> Result<GraphDocument, ValidationError> {
    if !body.is_object() {
        return Err(ValidationError::single("graph body must be a JSON object"));
    }
    let draft: GraphDraft = serde_json::from_value(body)
        .map_err(|e| ValidationError::single(format!("malformed graph body: {e}")))?;
    draft.into_document()
}

// ============================================================================
// Drafts
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDraft {
    pub name: Option<String>,
    pub mode: Option<String>,
    pub nodes: Option<Vec<NodeDraft>>,
    pub edges: Option<Vec<EdgeDraft>>,
    pub minimum_consumption: Option<f64>,
    pub optimal_antenna_set: Option<Vec<String>>,
    pub optimal_path_solution: Option<Vec<PathSolution>>,
    pub antenna_settings: Option<AntennaSettingsDraft>,
    pub course_content: Option<CourseContentDraft>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDraft {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub radius: Option<f64>,
    pub halo_id: Option<String>,
    pub consumption: Option<f64>,
    pub consumption_base: Option<f64>,
    pub consumption_radius_enabled: Option<bool>,
    pub user_type: Option<String>,
    pub parent_id: Option<String>,
    pub servers: Option<Vec<ServerDraft>>,
    pub tasks: Option<Vec<TaskDraft>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub capacity: Option<f64>,
    pub consumption: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskDraft {
    pub id: Option<String>,
    pub charge: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDraft {
    pub id: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub capacity: Option<f64>,
    pub distance: Option<f64>,
    pub base_consumption: Option<f64>,
    pub consumption: Option<f64>,
    pub thickness: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntennaSettingsDraft {
    pub consumption_enabled: Option<bool>,
    pub consumption_radius_enabled: Option<bool>,
    pub consumption_base: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CourseContentDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Anything that is not an array is replaced by an empty list.
    pub images: Option<Value>,
}

// ============================================================================
// Draft -> document
// ============================================================================

/// Collects violations while a draft is converted.
#[derive(Default)]
struct Checker {
    violations: Vec<String>,
}

impl Checker {
    fn push(&mut self, message: String) {
        self.violations.push(message);
    }

    fn required<T>(&mut self, value: Option<T>, at: &str, field: &str) -> Option<T> {
        if value.is_none() {
            self.push(format!("{at}: missing required field `{field}`"));
        }
        value
    }

    fn required_id(&mut self, value: Option<String>, at: &str, field: &str) -> Option<String> {
        match self.required(value, at, field) {
            Some(s) if s.trim().is_empty() => {
                self.push(format!("{at}: `{field}` must not be empty"));
                None
            }
            other => other,
        }
    }

    fn finite(&mut self, value: Option<f64>, at: &str, field: &str) -> Option<f64> {
        match value {
            Some(v) if !v.is_finite() => {
                self.push(format!("{at}: `{field}` must be a finite number"));
                None
            }
            other => other,
        }
    }

    fn non_negative(&mut self, value: Option<f64>, at: &str, field: &str) -> Option<f64> {
        match self.finite(value, at, field) {
            Some(v) if v < 0.0 => {
                self.push(format!("{at}: `{field}` must be >= 0 (got {v})"));
                None
            }
            other => other,
        }
    }
}

impl GraphDraft {
    pub fn into_document(self) -> Result<GraphDocument, ValidationError> {
        let mut check = Checker::default();

        let name = match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => Some(n.to_string()),
            Some(_) => {
                check.push("name: must not be empty".to_string());
                None
            }
            None => {
                check.push("graph: missing required field `name`".to_string());
                None
            }
        };

        let mode = match self.mode.as_deref() {
            Some(m) => {
                let parsed = Mode::parse(m);
                if parsed.is_none() {
                    let known: Vec<&str> = Mode::ALL.iter().map(|m| m.as_str()).collect();
                    check.push(format!("mode: `{m}` is not one of {}", known.join(", ")));
                }
                parsed
            }
            None => {
                check.push("graph: missing required field `mode`".to_string());
                None
            }
        };

        let nodes: Vec<Node> = self
            .nodes
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, n)| n.into_node(&format!("nodes[{i}]"), &mut check))
            .collect();

        let edges: Vec<Edge> = self
            .edges
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, e)| e.into_edge(&format!("edges[{i}]"), &mut check))
            .collect();

        let minimum_consumption =
            check.finite(self.minimum_consumption, "graph", "minimumConsumption");

        let antenna_settings = self
            .antenna_settings
            .map(|s| s.into_settings(&mut check))
            .unwrap_or_default();

        let course_content = self
            .course_content
            .map(CourseContentDraft::into_content)
            .unwrap_or_default();

        if !check.violations.is_empty() {
            return Err(ValidationError {
                violations: check.violations,
            });
        }

        // Both are Some once no violation was recorded.
        let (Some(name), Some(mode)) = (name, mode) else {
            return Err(ValidationError::single("graph: missing name or mode"));
        };

        Ok(GraphDocument {
            name,
            mode,
            nodes,
            edges,
            minimum_consumption,
            optimal_antenna_set: self.optimal_antenna_set.unwrap_or_default(),
            optimal_path_solution: self.optimal_path_solution.unwrap_or_default(),
            antenna_settings,
            course_content,
        })
    }
}

impl NodeDraft {
    fn into_node(self, at: &str, check: &mut Checker) -> Option<Node> {
        let id = check.required_id(self.id, at, "id");
        let kind = match check.required(self.kind, at, "type") {
            Some(k) => {
                let parsed = NodeKind::parse(&k);
                if parsed.is_none() {
                    check.push(format!("{at}: unknown node type `{k}`"));
                }
                parsed
            }
            None => None,
        };
        let x = check.required(self.x, at, "x");
        let x = check.finite(x, at, "x");
        let y = check.required(self.y, at, "y");
        let y = check.finite(y, at, "y");

        let user_type = match self.user_type.as_deref() {
            None => Some(UserType::default()),
            Some(u) => {
                let parsed = UserType::parse(u);
                if parsed.is_none() {
                    check.push(format!("{at}: `userType` must be pairing or cloud (got `{u}`)"));
                }
                parsed
            }
        };

        let radius = check.non_negative(self.radius, at, "radius");
        let consumption = check.finite(self.consumption, at, "consumption");
        let consumption_base = check.finite(self.consumption_base, at, "consumptionBase");

        let servers: Vec<Server> = self
            .servers
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let at = format!("{at}.servers[{i}]");
                let id = check.required_id(s.id, &at, "id")?;
                Some(Server {
                    id,
                    name: s.name.unwrap_or_default(),
                    capacity: check.finite(s.capacity, &at, "capacity").unwrap_or(0.0),
                    consumption: check.finite(s.consumption, &at, "consumption").unwrap_or(0.0),
                })
            })
            .collect();

        let tasks: Vec<Task> = self
            .tasks
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(i, t)| {
                let at = format!("{at}.tasks[{i}]");
                let id = check.required_id(t.id, &at, "id")?;
                Some(Task {
                    id,
                    charge: check.finite(t.charge, &at, "charge").unwrap_or(0.0),
                })
            })
            .collect();

        Some(Node {
            id: id?,
            kind: kind?,
            x: x?,
            y: y?,
            radius,
            halo_id: self.halo_id,
            consumption,
            consumption_base,
            consumption_radius_enabled: self.consumption_radius_enabled,
            user_type: user_type?,
            parent_id: self.parent_id,
            servers,
            tasks,
        })
    }
}

impl EdgeDraft {
    fn into_edge(self, at: &str, check: &mut Checker) -> Option<Edge> {
        let id = check.required_id(self.id, at, "id");
        let source = check.required_id(self.source, at, "source");
        let target = check.required_id(self.target, at, "target");
        let capacity = check.non_negative(self.capacity, at, "capacity");
        let distance = check.non_negative(self.distance, at, "distance");
        let base_consumption = check.finite(self.base_consumption, at, "baseConsumption");
        let consumption = check.finite(self.consumption, at, "consumption");
        let thickness = check.finite(self.thickness, at, "thickness");

        Some(Edge {
            id: id?,
            source: source?,
            target: target?,
            capacity: capacity.unwrap_or(DEFAULT_EDGE_CAPACITY),
            distance: distance.unwrap_or(DEFAULT_EDGE_DISTANCE),
            base_consumption: base_consumption.unwrap_or(DEFAULT_BASE_CONSUMPTION),
            consumption: consumption.unwrap_or(DEFAULT_EDGE_CONSUMPTION),
            thickness: thickness.unwrap_or(DEFAULT_EDGE_THICKNESS),
        })
    }
}

impl AntennaSettingsDraft {
    fn into_settings(self, check: &mut Checker) -> AntennaSettings {
        let defaults = AntennaSettings::default();
        AntennaSettings {
            consumption_enabled: self.consumption_enabled.unwrap_or(defaults.consumption_enabled),
            consumption_radius_enabled: self
                .consumption_radius_enabled
                .unwrap_or(defaults.consumption_radius_enabled),
            consumption_base: check
                .finite(self.consumption_base, "antennaSettings", "consumptionBase")
                .unwrap_or(defaults.consumption_base),
        }
    }
}

impl CourseContentDraft {
    fn into_content(self) -> CourseContent {
        let images = match self.images {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| CourseImage {
                    path: string_field(obj.get("path")),
                    caption: string_field(obj.get("caption")),
                })
                .collect(),
            _ => Vec::new(),
        };
        CourseContent {
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            images,
        }
    }
}

fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
