//! Editor session: the in-memory state of one graph being edited.
//!
//! All state lives in [`EditorSession`] and changes only through
//! [`EditorSession::apply`]. Each user action is a discrete [`Command`];
//! applying one returns the [`Event`]s it caused, so editing can be driven
//! and tested without any rendering surface.
//!
//! Edge and antenna consumption is always derived through
//! [`crate::consumption`] on this path, which is what keeps
//! `edge.consumption == baseConsumption × capacity × distance` for graphs
//! produced by the editor.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;
use thiserror::Error;

use crate::consumption::{antenna_consumption, edge_consumption, sanitize_parameter};
use crate::metrics::GraphMetrics;
use crate::model::{
    AntennaSettings, CourseContent, Edge, Graph, GraphDocument, Mode, Node, NodeKind, PathSolution,
    UserType,
    DEFAULT_BASE_CONSUMPTION, DEFAULT_EDGE_CAPACITY, DEFAULT_EDGE_DISTANCE,
};

pub const DEFAULT_ANTENNA_RADIUS: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("node `{0}` not found")]
    NodeNotFound(String),
    #[error("edge `{0}` not found")]
    EdgeNotFound(String),
    #[error("node type `{kind}` is not available in mode {mode}")]
    KindNotAllowed { kind: NodeKind, mode: Mode },
    #[error("node `{0}` is not an antenna")]
    NotAnAntenna(String),
    #[error("an edge cannot connect node `{0}` to itself")]
    SelfLoop(String),
    #[error("no free id left for `{0}`")]
    IdsExhausted(String),
}

/// A discrete editor action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode {
        kind: NodeKind,
        x: f64,
        y: f64,
    },
    MoveNode {
        id: String,
        x: f64,
        y: f64,
    },
    RemoveNode {
        id: String,
    },
    AddEdge {
        source: String,
        target: String,
    },
    /// `None` leaves a parameter unchanged.
    SetEdgeParameters {
        id: String,
        capacity: Option<f64>,
        distance: Option<f64>,
        base_consumption: Option<f64>,
    },
    RemoveEdge {
        id: String,
    },
    SetAntennaRadius {
        id: String,
        radius: f64,
    },
    SetAntennaSettings(AntennaSettings),
    SetMinimumConsumption(Option<f64>),
    SetCourseContent(CourseContent),
}

/// What a command changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NodeAdded(String),
    NodeMoved(String),
    NodeRemoved(String),
    EdgeAdded(String),
    EdgeRemoved(String),
    ConsumptionChanged { id: String, consumption: f64 },
    HaloSynced(String),
    HaloRemoved(String),
    SettingsChanged,
}

/// Visual radius indicator owned by exactly one antenna.
///
/// Halos are not persisted; only the antenna's `haloId` and `radius` are.
#[derive(Debug, Clone, PartialEq)]
pub struct Halo {
    pub id: String,
    pub antenna_id: String,
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    mode: Mode,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    antenna_settings: AntennaSettings,
    minimum_consumption: Option<f64>,
    course_content: CourseContent,
    optimal_antenna_set: Vec<String>,
    optimal_path_solution: Vec<PathSolution>,
    next_node: u64,
    next_edge: u64,
    /// node id -> index into `nodes`
    node_index: HashMap<String, usize>,
    /// antenna id -> halo
    halos: BTreeMap<String, Halo>,
}

impl EditorSession {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            nodes: Vec::new(),
            edges: Vec::new(),
            antenna_settings: AntennaSettings::default(),
            minimum_consumption: None,
            course_content: CourseContent::default(),
            optimal_antenna_set: Vec::new(),
            optimal_path_solution: Vec::new(),
            next_node: 1,
            next_edge: 1,
            node_index: HashMap::new(),
            halos: BTreeMap::new(),
        }
    }

    /// Open a stored graph for editing. Counters continue after the highest
    /// numeric id suffix found.
    pub fn from_graph(graph: &Graph) -> Self {
        let doc = &graph.document;
        let mut session = Self::new(doc.mode);
        session.nodes = doc.nodes.clone();
        session.edges = doc.edges.clone();
        session.antenna_settings = doc.antenna_settings;
        session.minimum_consumption = doc.minimum_consumption;
        session.course_content = doc.course_content.clone();
        session.optimal_antenna_set = doc.optimal_antenna_set.clone();
        session.optimal_path_solution = doc.optimal_path_solution.clone();
        session.next_node = next_counter(session.nodes.iter().map(|n| n.id.as_str()));
        session.next_edge = next_counter(session.edges.iter().map(|e| e.id.as_str()));
        session.reindex();

        let antennas: Vec<String> = session
            .nodes
            .iter()
            .filter(|n| n.is_antenna())
            .map(|n| n.id.clone())
            .collect();
        for id in antennas {
            session.sync_halo(&id);
        }
        session
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn antenna_settings(&self) -> &AntennaSettings {
        &self.antenna_settings
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).and_then(|&i| self.nodes.get(i))
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn halo(&self, antenna_id: &str) -> Option<&Halo> {
        self.halos.get(antenna_id)
    }

    pub fn metrics(&self) -> GraphMetrics {
        crate::metrics::compute_metrics(&self.nodes, &self.edges, &self.antenna_settings)
    }

    pub fn apply(&mut self, command: Command) -> Result<Vec<Event>, SessionError> {
        tracing::debug!(?command, "applying editor command");
        match command {
            Command::AddNode { kind, x, y } => self.add_node(kind, x, y),
            Command::MoveNode { id, x, y } => self.move_node(&id, x, y),
            Command::RemoveNode { id } => self.remove_node(&id),
            Command::AddEdge { source, target } => self.add_edge(source, target),
            Command::SetEdgeParameters {
                id,
                capacity,
                distance,
                base_consumption,
            } => self.set_edge_parameters(&id, capacity, distance, base_consumption),
            Command::RemoveEdge { id } => {
                let before = self.edges.len();
                self.edges.retain(|e| e.id != id);
                if self.edges.len() == before {
                    return Err(SessionError::EdgeNotFound(id));
                }
                Ok(vec![Event::EdgeRemoved(id)])
            }
            Command::SetAntennaRadius { id, radius } => self.set_antenna_radius(&id, radius),
            Command::SetAntennaSettings(settings) => self.set_antenna_settings(settings),
            Command::SetMinimumConsumption(value) => {
                self.minimum_consumption = value.filter(|v| v.is_finite());
                Ok(vec![Event::SettingsChanged])
            }
            Command::SetCourseContent(content) => {
                self.course_content = content;
                Ok(vec![Event::SettingsChanged])
            }
        }
    }

    // ------------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------------

    fn add_node(&mut self, kind: NodeKind, x: f64, y: f64) -> Result<Vec<Event>, SessionError> {
        if !self.mode.allows(kind) {
            return Err(SessionError::KindNotAllowed {
                kind,
                mode: self.mode,
            });
        }

        let id = format!("{}-{}", kind.as_str(), self.next_node);
        if self.node(&id).is_some() {
            return Err(SessionError::IdsExhausted(id));
        }
        self.next_node = self.next_node.saturating_add(1);

        let mut node = Node::new(id.clone(), kind, x, y);
        if kind == NodeKind::User && self.mode == Mode::Cloud {
            node.user_type = UserType::Cloud;
        }

        let mut events = vec![Event::NodeAdded(id.clone())];
        if kind == NodeKind::Antenna {
            node.radius = Some(DEFAULT_ANTENNA_RADIUS);
            node.halo_id = Some(halo_id_for(&id));
            node.consumption_base = Some(self.antenna_settings.consumption_base);
            node.consumption_radius_enabled = Some(self.antenna_settings.consumption_radius_enabled);
            let consumption = antenna_consumption(&self.antenna_settings, DEFAULT_ANTENNA_RADIUS);
            node.consumption = Some(consumption);
            events.push(Event::ConsumptionChanged {
                id: id.clone(),
                consumption,
            });
        }

        self.node_index.insert(id.clone(), self.nodes.len());
        self.nodes.push(node);

        if kind == NodeKind::Antenna {
            events.extend(self.sync_halo(&id));
        }
        Ok(events)
    }

    fn move_node(&mut self, id: &str, x: f64, y: f64) -> Result<Vec<Event>, SessionError> {
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        let is_antenna = node.is_antenna();

        let mut events = vec![Event::NodeMoved(id.to_string())];
        if is_antenna {
            events.extend(self.sync_halo(id));
        }
        Ok(events)
    }

    /// Remove a node, its edges, and the nodes that depend on it.
    ///
    /// Children (nodes whose `parentId` is a removed node) go with it. In
    /// `SC` mode a pairing user also takes its paired parent user along.
    fn remove_node(&mut self, id: &str) -> Result<Vec<Event>, SessionError> {
        if self.node(id).is_none() {
            return Err(SessionError::NodeNotFound(id.to_string()));
        }

        let mut doomed: BTreeSet<String> = BTreeSet::new();
        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            if !doomed.insert(current.clone()) {
                continue;
            }
            for child in self
                .nodes
                .iter()
                .filter(|n| n.parent_id.as_deref() == Some(current.as_str()))
            {
                pending.push(child.id.clone());
            }
            if self.mode == Mode::SC {
                if let Some(partner) = self.node(&current).and_then(|n| self.paired_parent(n)) {
                    pending.push(partner);
                }
            }
        }

        let mut events = Vec::new();
        let edges_before: Vec<String> = self.edges.iter().map(|e| e.id.clone()).collect();
        self.edges
            .retain(|e| !doomed.iter().any(|id| e.touches(id)));
        for edge_id in edges_before {
            if self.edges.iter().all(|e| e.id != edge_id) {
                events.push(Event::EdgeRemoved(edge_id));
            }
        }

        self.nodes.retain(|n| !doomed.contains(&n.id));
        for node_id in &doomed {
            if let Some(halo) = self.halos.remove(node_id) {
                events.push(Event::HaloRemoved(halo.id));
            }
            events.push(Event::NodeRemoved(node_id.clone()));
        }
        self.reindex();
        Ok(events)
    }

    fn paired_parent(&self, node: &Node) -> Option<String> {
        if node.kind != NodeKind::User || node.user_type != UserType::Pairing {
            return None;
        }
        let parent = self.node(node.parent_id.as_deref()?)?;
        (parent.kind == NodeKind::User).then(|| parent.id.clone())
    }

    // ------------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------------

    fn add_edge(&mut self, source: String, target: String) -> Result<Vec<Event>, SessionError> {
        for endpoint in [&source, &target] {
            if self.node(endpoint).is_none() {
                return Err(SessionError::NodeNotFound(endpoint.clone()));
            }
        }
        if source == target {
            return Err(SessionError::SelfLoop(source));
        }

        let id = format!("edge-{}", self.next_edge);
        if self.edge(&id).is_some() {
            return Err(SessionError::IdsExhausted(id));
        }
        self.next_edge = self.next_edge.saturating_add(1);

        let mut edge = Edge::new(id.clone(), source, target);
        edge.consumption = edge_consumption(edge.base_consumption, edge.capacity, edge.distance);
        let consumption = edge.consumption;
        self.edges.push(edge);

        Ok(vec![
            Event::EdgeAdded(id.clone()),
            Event::ConsumptionChanged { id, consumption },
        ])
    }

    fn set_edge_parameters(
        &mut self,
        id: &str,
        capacity: Option<f64>,
        distance: Option<f64>,
        base_consumption: Option<f64>,
    ) -> Result<Vec<Event>, SessionError> {
        let edge = self
            .edges
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| SessionError::EdgeNotFound(id.to_string()))?;

        if let Some(v) = capacity {
            edge.capacity = sanitize_parameter(v, DEFAULT_EDGE_CAPACITY);
        }
        if let Some(v) = distance {
            edge.distance = sanitize_parameter(v, DEFAULT_EDGE_DISTANCE);
        }
        if let Some(v) = base_consumption {
            edge.base_consumption = sanitize_parameter(v, DEFAULT_BASE_CONSUMPTION);
        }
        edge.consumption = edge_consumption(edge.base_consumption, edge.capacity, edge.distance);

        Ok(vec![Event::ConsumptionChanged {
            id: id.to_string(),
            consumption: edge.consumption,
        }])
    }

    // ------------------------------------------------------------------------
    // Antennas
    // ------------------------------------------------------------------------

    fn set_antenna_radius(&mut self, id: &str, radius: f64) -> Result<Vec<Event>, SessionError> {
        let settings = self.antenna_settings;
        let node = self.node_mut(id)?;
        if !node.is_antenna() {
            return Err(SessionError::NotAnAntenna(id.to_string()));
        }
        let radius = sanitize_parameter(radius, DEFAULT_ANTENNA_RADIUS);
        node.radius = Some(radius);
        let consumption = antenna_consumption(&settings, radius);
        node.consumption = Some(consumption);

        let mut events = vec![Event::ConsumptionChanged {
            id: id.to_string(),
            consumption,
        }];
        events.extend(self.sync_halo(id));
        Ok(events)
    }

    fn set_antenna_settings(&mut self, settings: AntennaSettings) -> Result<Vec<Event>, SessionError> {
        self.antenna_settings = AntennaSettings {
            consumption_base: sanitize_parameter(
                settings.consumption_base,
                AntennaSettings::default().consumption_base,
            ),
            ..settings
        };

        let mut events = vec![Event::SettingsChanged];
        let settings = self.antenna_settings;
        for node in self.nodes.iter_mut().filter(|n| n.is_antenna()) {
            let radius = node.radius.unwrap_or(DEFAULT_ANTENNA_RADIUS);
            let consumption = antenna_consumption(&settings, radius);
            node.consumption = Some(consumption);
            node.consumption_base = Some(settings.consumption_base);
            node.consumption_radius_enabled = Some(settings.consumption_radius_enabled);
            events.push(Event::ConsumptionChanged {
                id: node.id.clone(),
                consumption,
            });
        }
        Ok(events)
    }

    /// Mirror an antenna's position and size onto its halo.
    fn sync_halo(&mut self, antenna_id: &str) -> Option<Event> {
        let node = self.node(antenna_id)?;
        let radius = node.radius.unwrap_or(DEFAULT_ANTENNA_RADIUS);
        let halo = Halo {
            id: node.halo_id.clone().unwrap_or_else(|| halo_id_for(antenna_id)),
            antenna_id: antenna_id.to_string(),
            x: node.x,
            y: node.y,
            diameter: radius * 2.0,
        };
        let event = Event::HaloSynced(halo.id.clone());
        self.halos.insert(antenna_id.to_string(), halo);
        Some(event)
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    /// The graph document this session would save.
    pub fn to_document(&self, name: impl Into<String>) -> GraphDocument {
        GraphDocument {
            name: name.into(),
            mode: self.mode,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            minimum_consumption: self.minimum_consumption,
            optimal_antenna_set: self.optimal_antenna_set.clone(),
            optimal_path_solution: self.optimal_path_solution.clone(),
            antenna_settings: self.antenna_settings,
            course_content: self.course_content.clone(),
        }
    }

    /// JSON body for the create/update endpoints.
    pub fn to_body(&self, name: impl Into<String>) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.to_document(name))
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, SessionError> {
        let index = *self
            .node_index
            .get(id)
            .ok_or_else(|| SessionError::NodeNotFound(id.to_string()))?;
        self.nodes
            .get_mut(index)
            .ok_or_else(|| SessionError::NodeNotFound(id.to_string()))
    }

    fn reindex(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }
}

fn halo_id_for(antenna_id: &str) -> String {
    format!("halo-{antenna_id}")
}

/// One past the largest numeric `-<n>` suffix among `ids`. Suffixes with no
/// successor in `u64` are ignored.
fn next_counter<'a>(ids: impl Iterator<Item = &'a str>) -> u64 {
    ids.filter_map(|id| id.rsplit('-').next()?.parse::<u64>().ok()?.checked_add(1))
        .max()
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn add(session: &mut EditorSession, kind: NodeKind) -> String {
        let events = session
            .apply(Command::AddNode { kind, x: 10.0, y: 20.0 })
            .unwrap();
        match &events[0] {
            Event::NodeAdded(id) => id.clone(),
            other => panic!("unexpected event {other:?}"),
        }
    }

    fn connect(session: &mut EditorSession, a: &str, b: &str) -> String {
        let events = session
            .apply(Command::AddEdge {
                source: a.to_string(),
                target: b.to_string(),
            })
            .unwrap();
        match &events[0] {
            Event::EdgeAdded(id) => id.clone(),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn ids_come_from_session_counters() {
        let mut s = EditorSession::new(Mode::RV);
        assert_eq!(add(&mut s, NodeKind::Router), "router-1");
        assert_eq!(add(&mut s, NodeKind::User), "user-2");
        assert_eq!(connect(&mut s, "router-1", "user-2"), "edge-1");
    }

    #[test]
    fn mode_restricts_node_types() {
        let mut s = EditorSession::new(Mode::Cloud);
        let err = s
            .apply(Command::AddNode {
                kind: NodeKind::Antenna,
                x: 0.0,
                y: 0.0,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::KindNotAllowed { .. }));

        let user = add(&mut s, NodeKind::User);
        assert_eq!(s.node(&user).unwrap().user_type, UserType::Cloud);
    }

    #[test]
    fn edge_parameters_drive_consumption() {
        let mut s = EditorSession::new(Mode::RV);
        let r = add(&mut s, NodeKind::Router);
        let u = add(&mut s, NodeKind::User);
        let e = connect(&mut s, &r, &u);
        assert_eq!(s.edge(&e).unwrap().consumption, 100.0);

        s.apply(Command::SetEdgeParameters {
            id: e.clone(),
            capacity: Some(2.0),
            distance: Some(3.0),
            base_consumption: None,
        })
        .unwrap();
        assert_eq!(s.edge(&e).unwrap().consumption, 600.0);

        // Garbage input is coerced to defaults.
        s.apply(Command::SetEdgeParameters {
            id: e.clone(),
            capacity: Some(-4.0),
            distance: Some(f64::NAN),
            base_consumption: Some(10.0),
        })
        .unwrap();
        let edge = s.edge(&e).unwrap();
        assert_eq!(edge.capacity, 1.0);
        assert_eq!(edge.distance, 1.0);
        assert_eq!(edge.consumption, 10.0);
    }

    #[test]
    fn edge_endpoints_must_exist() {
        let mut s = EditorSession::new(Mode::RV);
        let r = add(&mut s, NodeKind::Router);
        let err = s
            .apply(Command::AddEdge {
                source: r.clone(),
                target: "ghost".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, SessionError::NodeNotFound("ghost".to_string()));
        assert!(matches!(
            s.apply(Command::AddEdge { source: r.clone(), target: r }),
            Err(SessionError::SelfLoop(_))
        ));
    }

    #[test]
    fn halo_follows_antenna() {
        let mut s = EditorSession::new(Mode::RV);
        let a = add(&mut s, NodeKind::Antenna);
        let halo = s.halo(&a).unwrap();
        assert_eq!(halo.id, format!("halo-{a}"));
        assert_eq!((halo.x, halo.y), (10.0, 20.0));
        assert_relative_eq!(halo.diameter, 100.0);

        s.apply(Command::MoveNode {
            id: a.clone(),
            x: 5.0,
            y: 6.0,
        })
        .unwrap();
        s.apply(Command::SetAntennaRadius {
            id: a.clone(),
            radius: 12.5,
        })
        .unwrap();
        let halo = s.halo(&a).unwrap();
        assert_eq!((halo.x, halo.y), (5.0, 6.0));
        assert_relative_eq!(halo.diameter, 25.0);

        let events = s.apply(Command::RemoveNode { id: a.clone() }).unwrap();
        assert!(events.contains(&Event::HaloRemoved(format!("halo-{a}"))));
        assert!(s.halo(&a).is_none());
    }

    #[test]
    fn antenna_settings_recompute_every_antenna() {
        let mut s = EditorSession::new(Mode::SC);
        let a1 = add(&mut s, NodeKind::Antenna);
        let a2 = add(&mut s, NodeKind::Antenna);
        s.apply(Command::SetAntennaRadius {
            id: a2.clone(),
            radius: 10.0,
        })
        .unwrap();
        assert_eq!(s.node(&a1).unwrap().consumption, Some(0.0));

        s.apply(Command::SetAntennaSettings(AntennaSettings {
            consumption_enabled: true,
            consumption_radius_enabled: true,
            consumption_base: 5.0,
        }))
        .unwrap();
        assert_eq!(s.node(&a1).unwrap().consumption, Some(250.0));
        assert_eq!(s.node(&a2).unwrap().consumption, Some(50.0));
        assert_relative_eq!(s.metrics().total_consumption, 300.0);

        s.apply(Command::SetAntennaSettings(AntennaSettings {
            consumption_enabled: true,
            consumption_radius_enabled: false,
            consumption_base: 5.0,
        }))
        .unwrap();
        assert_relative_eq!(s.metrics().total_consumption, 10.0);
    }

    #[test]
    fn set_radius_rejects_non_antenna() {
        let mut s = EditorSession::new(Mode::RV);
        let r = add(&mut s, NodeKind::Router);
        assert_eq!(
            s.apply(Command::SetAntennaRadius { id: r.clone(), radius: 3.0 }),
            Err(SessionError::NotAnAntenna(r))
        );
    }

    #[test]
    fn removing_a_node_drops_edges_and_children() {
        let mut s = EditorSession::new(Mode::RV);
        let r = add(&mut s, NodeKind::Router);
        let u = add(&mut s, NodeKind::User);
        let child = add(&mut s, NodeKind::User);
        s.nodes[2].parent_id = Some(u.clone());
        connect(&mut s, &r, &u);
        connect(&mut s, &r, &child);

        let events = s.apply(Command::RemoveNode { id: u.clone() }).unwrap();
        assert!(events.contains(&Event::NodeRemoved(u.clone())));
        assert!(events.contains(&Event::NodeRemoved(child.clone())));
        assert!(s.edges().is_empty());
        assert!(s.node(&r).is_some());
        assert!(s.node(&child).is_none());
    }

    #[test]
    fn sc_mode_removes_paired_user() {
        let mut s = EditorSession::new(Mode::SC);
        let owner = add(&mut s, NodeKind::User);
        let paired = add(&mut s, NodeKind::User);
        let other = add(&mut s, NodeKind::Router);
        s.nodes[1].parent_id = Some(owner.clone());

        s.apply(Command::RemoveNode { id: paired }).unwrap();
        assert!(s.node(&owner).is_none());
        assert!(s.node(&other).is_some());

        // Outside SC the owner stays.
        let mut rv = EditorSession::new(Mode::RV);
        let owner = add(&mut rv, NodeKind::User);
        let paired = add(&mut rv, NodeKind::User);
        rv.nodes[1].parent_id = Some(owner.clone());
        rv.apply(Command::RemoveNode { id: paired }).unwrap();
        assert!(rv.node(&owner).is_some());
    }

    #[test]
    fn reopened_session_continues_counters() {
        let mut s = EditorSession::new(Mode::RV);
        let r = add(&mut s, NodeKind::Router);
        let a = add(&mut s, NodeKind::Antenna);
        connect(&mut s, &r, &a);
        let graph = Graph::create("g", s.to_document("net"), chrono::Utc::now());

        let mut reopened = EditorSession::from_graph(&graph);
        assert!(reopened.halo(&a).is_some());
        assert_eq!(add(&mut reopened, NodeKind::User), "user-3");
        assert_eq!(connect(&mut reopened, &r, "user-3"), "edge-2");
    }

    #[test]
    fn reopened_session_keeps_solver_output() {
        let mut s = EditorSession::new(Mode::RV);
        let r = add(&mut s, NodeKind::Router);
        let mut doc = s.to_document("net");
        doc.optimal_antenna_set = vec![r.clone()];
        doc.optimal_path_solution = vec![PathSolution {
            color: "#f00".to_string(),
            path: vec![r.clone()],
        }];
        let graph = Graph::create("g", doc.clone(), chrono::Utc::now());

        let saved = EditorSession::from_graph(&graph).to_document("net");
        assert_eq!(saved.optimal_antenna_set, doc.optimal_antenna_set);
        assert_eq!(saved.optimal_path_solution, doc.optimal_path_solution);
    }

    #[test]
    fn huge_id_suffixes_do_not_overflow_counters() {
        let mut doc = GraphDocument::new("g", Mode::RV);
        doc.nodes.push(Node::new("router-18446744073709551615", NodeKind::Router, 0.0, 0.0));
        doc.nodes.push(Node::new("user-18446744073709551614", NodeKind::User, 1.0, 1.0));
        doc.edges.push(Edge::new(
            "edge-18446744073709551615",
            "router-18446744073709551615",
            "user-18446744073709551614",
        ));
        let graph = Graph::create("g", doc, chrono::Utc::now());

        let mut s = EditorSession::from_graph(&graph);
        assert_eq!(add(&mut s, NodeKind::User), "user-18446744073709551615");
        assert_eq!(next_counter(["edge-18446744073709551615"].into_iter()), 1);

        // A saturated counter refuses to hand out a taken id.
        assert_eq!(s.next_node, u64::MAX);
        assert_eq!(
            s.apply(Command::AddNode { kind: NodeKind::Router, x: 0.0, y: 0.0 }),
            Err(SessionError::IdsExhausted("router-18446744073709551615".to_string()))
        );
        assert_eq!(s.nodes().len(), 3);
    }

    #[test]
    fn body_is_a_valid_graph() {
        let mut s = EditorSession::new(Mode::RV);
        let r = add(&mut s, NodeKind::Router);
        let a = add(&mut s, NodeKind::Antenna);
        connect(&mut s, &r, &a);
        s.apply(Command::SetMinimumConsumption(Some(120.0))).unwrap();

        let body = s.to_body("campus").unwrap();
        let doc = crate::validate::parse_graph(body).unwrap();
        assert_eq!(doc, s.to_document("campus"));
        assert_eq!(doc.metrics(), s.metrics());
    }
}
