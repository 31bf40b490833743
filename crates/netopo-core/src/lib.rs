//! Netopo graph core
//!
//! The domain model behind the network-topology editor:
//!
//! ```text
//!   editor commands ──► EditorSession ──► GraphDocument ──► Graph (stored)
//!                           │                  ▲                 │
//!                           ▼                  │                 ▼
//!                      consumption        validate / merge     metrics
//! ```
//!
//! - [`consumption`]: edge and antenna power formulas
//! - [`metrics`]: graph-level totals, recomputed on every write
//! - [`model`]: the persisted document shape
//! - [`validate`]: required fields, enums and defaults for incoming bodies
//! - [`merge`]: partial updates against a stored graph
//! - [`session`]: explicit editor state driven by discrete commands
//!
//! Nothing here performs I/O; persistence lives in `netopo-store`.

pub mod consumption;
pub mod merge;
pub mod metrics;
pub mod model;
pub mod session;
pub mod validate;

pub use consumption::{antenna_consumption, edge_consumption};
pub use merge::apply_patch;
pub use metrics::{compute_metrics, GraphMetrics};
pub use model::{
    AntennaSettings, CourseContent, CourseImage, Edge, Graph, GraphDocument, GraphId, Mode, Node,
    NodeKind, PathSolution, Server, Task, UserType,
};
pub use session::{Command, EditorSession, Event, SessionError};
pub use validate::{parse_graph, ValidationError};
