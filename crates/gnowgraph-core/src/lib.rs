//! Typed-graph core of a content-management system.
//!
//! Every node and edge carries a [`Nid`](ontology::Nid). Metatypes form a
//! category tree; Nodetypes (and their Objecttype, Relationtype,
//! Attributetype, Processtype and Systemtype specializations) are the
//! publishable types; Gbobjects are instances. Relations and Attributes are
//! edges identified by their scoped 6-tuple.
//!
//! The [`Graph`] store enforces structure on write. Read-side views
//! (neighbourhoods, sentences, graph JSON) are computed on demand.

pub mod backends;
pub mod config;
pub mod discussion;
pub mod graph;
pub mod import;
pub mod locator;
pub mod manager;
pub mod nbh;
pub mod ontology;
pub mod ping;
pub mod related;
pub mod storage;

pub use config::Config;
pub use graph::{Graph, GraphError, GraphSnapshot};
pub use locator::Locator;
pub use manager::{GraphManager, ManagerError};
pub use nbh::{GraphJson, Neighbourhood, RenderedNeighbourhood};
pub use ontology::{Edge, Nid, Node};
pub use storage::{FileStorage, Storage};
