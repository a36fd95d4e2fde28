//! Mesh topology model: devices and neighbour reports in, styled graph and view commands out.

pub mod controller;
pub mod device;
pub mod error;
pub mod graph;
pub mod index;
pub mod quality;
pub mod renderer;
pub mod snapshot;
pub mod source;

pub use controller::{InteractionController, NavigationRequest, ViewState, load_devices, refresh_topology};
pub use device::{Device, DeviceType, NeighborReport, Relationship};
pub use error::TopologyError;
pub use graph::{GraphEdge, GraphNode, NodeShape, TopologyGraph};
pub use index::DeviceIndex;
pub use renderer::{Easing, FitAnimation, GraphRenderer, RendererEvent};
pub use snapshot::TopologySnapshot;
pub use source::{DeviceSource, HttpDeviceSource};
