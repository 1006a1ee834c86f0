mod agent;
pub mod algorithms;
mod approximator;
mod mlp;
pub mod networks;
mod random;
mod selfplay;

pub use agent::{OpponentPolicy, Transition, UpdateMetrics};
pub use algorithms::{td_target, DqnAgent, DqnConfig};
pub use approximator::{argmax, max_value, ValueApproximator};
pub use mlp::{MlpApproximator, NetworkConfig};
pub use networks::{QNetwork, QNetworkConfig};
pub use random::RandomPolicy;
pub use selfplay::{GreedyOpponent, OpponentSnapshot, SelfPlayRegistry};
