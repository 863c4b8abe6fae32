pub mod metadata;
pub mod node;
pub mod pod;
pub mod quantity;

pub use metadata::Metadata;
pub use node::{Node, NodeStatus};
pub use pod::{ContainerSpec, Pod, PodSpec, ResourceRequirements};
pub use quantity::{Quantity, QuantityError, RESOURCE_CPU, RESOURCE_MEMORY};
