mod dqn;

pub use dqn::{td_target, DqnAgent, DqnConfig};
