pub mod batch;
pub mod dimacs;
pub mod distance;
pub mod error;
pub mod generator;
pub mod loop_arcs;
pub mod negative;
pub mod network;
pub mod params;
pub mod remaining;
pub mod remap;
pub mod tree;
pub mod weights;

pub use batch::generate_batch;
pub use error::{GeneratorError, NetworkError};
pub use generator::{generate, generate_with_rng, Instance};
pub use negative::NegativeBudget;
pub use network::{Arc, ArcId, Network, NodeId};
pub use params::{generate_sampled, InstanceConfig};
pub use remap::NodeMapping;
pub use weights::{UniformWeights, WeightSampler};
