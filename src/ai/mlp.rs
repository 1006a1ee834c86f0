use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;

use crate::ai::approximator::ValueApproximator;
use crate::ai::networks::{QNetwork, QNetworkConfig};
use crate::error::ApproximatorError;

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;

/// Network hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub hidden_dim: usize,
    pub learning_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            hidden_dim: 32,
            learning_rate: 1e-4,
        }
    }
}

/// [`ValueApproximator`] backed by a burn MLP trained with Adam on an MSE
/// loss over the full output vector.
pub struct MlpApproximator {
    network: QNetwork<TrainBackend>,
    optimizer: OptimizerAdaptor<Adam, QNetwork<TrainBackend>, TrainBackend>,
    config: NetworkConfig,
    input_dim: usize,
    output_dim: usize,
    device: <TrainBackend as Backend>::Device,
}

impl MlpApproximator {
    pub fn new(config: NetworkConfig, input_dim: usize, output_dim: usize) -> Self {
        let device = Default::default();
        let network = Self::network_config(&config, input_dim, output_dim).init(&device);
        MlpApproximator {
            network,
            optimizer: AdamConfig::new().init(),
            config,
            input_dim,
            output_dim,
            device,
        }
    }

    fn network_config(config: &NetworkConfig, input_dim: usize, output_dim: usize) -> QNetworkConfig {
        QNetworkConfig::new(input_dim, output_dim).with_hidden_dim(config.hidden_dim)
    }

    fn check_states(&self, states: &[Vec<f64>]) -> Result<(), ApproximatorError> {
        match states.iter().find(|s| s.len() != self.input_dim) {
            Some(bad) => Err(ApproximatorError::StateShape {
                expected: self.input_dim,
                got: bad.len(),
            }),
            None => Ok(()),
        }
    }

    fn fit_chunk(
        &mut self,
        states: &[Vec<f64>],
        targets: &[Vec<f64>],
    ) -> Result<f64, ApproximatorError> {
        let x = to_tensor::<TrainBackend>(states, self.input_dim, &self.device);
        let y = to_tensor::<TrainBackend>(targets, self.output_dim, &self.device);

        let diff = self.network.forward(x) - y;
        let loss = (diff.clone() * diff).mean();

        let loss_val = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ApproximatorError::Tensor(format!("{e:?}")))?[0] as f64;
        if !loss_val.is_finite() {
            return Err(ApproximatorError::Diverged(loss_val));
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optimizer
            .step(self.config.learning_rate, self.network.clone(), grads);
        Ok(loss_val)
    }
}

/// Pack rows of `width` values into a [rows, width] f32 tensor.
fn to_tensor<B: Backend>(rows: &[Vec<f64>], width: usize, device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = rows.iter().flatten().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(flat, [rows.len(), width]), device)
}

impl ValueApproximator for MlpApproximator {
    /// The training module itself; burn tensors are immutable, so a clone
    /// is an exact capture.
    type Weights = QNetwork<TrainBackend>;

    fn action_count(&self) -> usize {
        self.output_dim
    }

    fn predict(&self, state: &[f64]) -> Result<Vec<f64>, ApproximatorError> {
        let mut rows = self.predict_batch(&[state.to_vec()])?;
        Ok(rows.remove(0))
    }

    fn predict_batch(&self, states: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ApproximatorError> {
        self.check_states(states)?;
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let x = to_tensor::<InferBackend>(states, self.input_dim, &self.device);
        let q: Vec<f32> = self
            .network
            .valid()
            .forward(x)
            .into_data()
            .to_vec()
            .map_err(|e| ApproximatorError::Tensor(format!("{e:?}")))?;
        Ok(q
            .chunks(self.output_dim)
            .map(|row| row.iter().map(|&v| v as f64).collect())
            .collect())
    }

    fn fit(
        &mut self,
        states: &[Vec<f64>],
        targets: &[Vec<f64>],
        batch_size: usize,
    ) -> Result<f64, ApproximatorError> {
        if states.len() != targets.len() {
            return Err(ApproximatorError::BatchMismatch {
                states: states.len(),
                targets: targets.len(),
            });
        }
        self.check_states(states)?;
        if let Some(bad) = targets.iter().find(|t| t.len() != self.output_dim) {
            return Err(ApproximatorError::TargetShape {
                expected: self.output_dim,
                got: bad.len(),
            });
        }

        let batch_size = batch_size.max(1);
        let mut total = 0.0;
        let mut chunks = 0;
        for (s, t) in states.chunks(batch_size).zip(targets.chunks(batch_size)) {
            total += self.fit_chunk(s, t)?;
            chunks += 1;
        }
        Ok(if chunks == 0 { 0.0 } else { total / chunks as f64 })
    }

    fn get_weights(&self) -> Self::Weights {
        self.network.clone()
    }

    fn set_weights(&mut self, weights: Self::Weights) {
        self.network = weights;
    }

    fn save(&self, path: &Path) -> Result<(), ApproximatorError> {
        self.network
            .clone()
            .valid()
            .save_file(path.to_path_buf(), &DefaultRecorder::default())
            .map_err(|e| ApproximatorError::Record {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn load(&mut self, path: &Path) -> Result<(), ApproximatorError> {
        let network: QNetwork<TrainBackend> =
            Self::network_config(&self.config, self.input_dim, self.output_dim)
                .init(&self.device)
                .load_file(path.to_path_buf(), &DefaultRecorder::default(), &self.device)
                .map_err(|e| ApproximatorError::Record {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
        self.network = network;
        // Moment estimates belong to the discarded parameters.
        self.optimizer = AdamConfig::new().init();
        Ok(())
    }
}
