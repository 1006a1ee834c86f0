use burn::nn::{Initializer, Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Action-value MLP.
///
/// ```text
/// Input:  [batch, input_dim]
/// FC1:    input_dim -> hidden, ReLU
/// FC2:    hidden -> hidden, ReLU
/// Out:    hidden -> output_dim  (Q-values, one per action)
/// ```
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    pub input_dim: usize,
    pub output_dim: usize,
    #[config(default = 32)]
    pub hidden_dim: usize,
}

impl QNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        // He-normal on the ReLU layers.
        let he = Initializer::KaimingNormal {
            gain: 2.0f64.sqrt(),
            fan_out_only: false,
        };
        QNetwork {
            fc1: LinearConfig::new(self.input_dim, self.hidden_dim)
                .with_initializer(he.clone())
                .init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim)
                .with_initializer(he)
                .init(device),
            out: LinearConfig::new(self.hidden_dim, self.output_dim).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: [batch, input_dim] -> [batch, output_dim].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        let x = self.relu.forward(self.fc2.forward(x));
        self.out.forward(x)
    }
}
