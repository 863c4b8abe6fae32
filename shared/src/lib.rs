pub mod models;

pub use models::{ContainerSpec, Metadata, Node, NodeStatus, Pod, Quantity, QuantityError};
