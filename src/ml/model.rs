// ============================================================
// Layer 5 — Next-Word Model
// ============================================================
// A Bengio-style feedforward language model:
//
//   ids [B, C] → Embedding → [B, C, E] → reshape [B, C·E]
//              → Linear + ReLU → [B, H] → Linear → [B, V]
//
// The Burn module is converted to and from ModelParameters
// (plain Vec<f32> tensors) for export and reload. Burn holds
// linear weights as [d_in, d_out]; ModelParameters holds them
// as [d_out, d_in], so both weights are transposed at the seam.

use anyhow::{anyhow, bail, Result};
use burn::{
    module::Param,
    nn::{
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend, TensorData},
};

use crate::domain::model_spec::{ModelConfig, ModelParameters, ParamSlot, ParamTensor};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; adding them again gives conflicting impls.
#[derive(Config, Debug)]
pub struct NextWordModelConfig {
    pub vocab_size:  usize,
    pub embed_dim:   usize,
    pub context_len: usize,
    pub hidden_dim:  usize,
}

impl NextWordModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> NextWordModel<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device);
        let fc1       = LinearConfig::new(self.context_len * self.embed_dim, self.hidden_dim).init(device);
        let fc2       = LinearConfig::new(self.hidden_dim, self.vocab_size).init(device);
        NextWordModel {
            embedding, fc1, fc2,
            vocab_size:  self.vocab_size,
            embed_dim:   self.embed_dim,
            context_len: self.context_len,
            hidden_dim:  self.hidden_dim,
        }
    }

    pub fn spec(&self) -> ModelConfig {
        ModelConfig {
            vocab_size:  self.vocab_size,
            embed_dim:   self.embed_dim,
            context_len: self.context_len,
            hidden_dim:  self.hidden_dim,
        }
    }
}

impl From<&ModelConfig> for NextWordModelConfig {
    fn from(c: &ModelConfig) -> Self {
        NextWordModelConfig::new(c.vocab_size, c.embed_dim, c.context_len, c.hidden_dim)
    }
}

/// embed each context token → concatenate → ReLU(fc1) → fc2 → vocab scores
#[derive(Module, Debug)]
pub struct NextWordModel<B: Backend> {
    pub embedding:   Embedding<B>,
    pub fc1:         Linear<B>,
    pub fc2:         Linear<B>,
    pub vocab_size:  usize,
    pub embed_dim:   usize,
    pub context_len: usize,
    pub hidden_dim:  usize,
}

impl<B: Backend> NextWordModel<B> {
    /// contexts: [batch, context_len] → logits: [batch, vocab_size]
    pub fn forward(&self, contexts: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, context_len] = contexts.dims();

        let emb = self.embedding.forward(contexts); // [batch, context_len, embed_dim]

        // Concatenate, not pool: position i keeps its own slice of fc1's input.
        let flat = emb.reshape([batch_size, context_len * self.embed_dim]);

        let hidden = relu(self.fc1.forward(flat));
        self.fc2.forward(hidden)
    }

    pub fn forward_loss(
        &self,
        contexts: Tensor<B, 2, Int>,
        targets:  Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(contexts);
        let ce = burn::nn::loss::CrossEntropyLossConfig::new()
            .init(&logits.device());
        let loss = ce.forward(logits.clone(), targets);
        (loss, logits)
    }

    pub fn spec(&self) -> ModelConfig {
        ModelConfig {
            vocab_size:  self.vocab_size,
            embed_dim:   self.embed_dim,
            context_len: self.context_len,
            hidden_dim:  self.hidden_dim,
        }
    }

    /// Copy the five parameter tensors out of the backend.
    pub fn to_parameters(&self) -> Result<ModelParameters> {
        let fc1_bias = self.fc1.bias.as_ref()
            .ok_or_else(|| anyhow!("fc1 was built without a bias"))?;
        let fc2_bias = self.fc2.bias.as_ref()
            .ok_or_else(|| anyhow!("fc2 was built without a bias"))?;

        Ok(ModelParameters::from_ordered([
            to_param_tensor(self.embedding.weight.val())?,
            to_param_tensor(self.fc1.weight.val().transpose())?,
            to_param_tensor(fc1_bias.val())?,
            to_param_tensor(self.fc2.weight.val().transpose())?,
            to_param_tensor(fc2_bias.val())?,
        ]))
    }

    /// Replace every parameter with `params`. Shapes must match this
    /// model's configuration exactly.
    pub fn load_parameters(mut self, params: &ModelParameters, device: &B::Device) -> Result<Self> {
        if let Some((slot, expected, got)) = params.first_mismatch(&self.spec()) {
            bail!(
                "parameter '{}' has shape {:?}, model expects {:?}",
                slot.name(), got, expected
            );
        }

        self.embedding.weight = Param::from_tensor(from_param_tensor::<B, 2>(params.get(ParamSlot::Embedding), device));
        self.fc1.weight       = Param::from_tensor(from_param_tensor::<B, 2>(params.get(ParamSlot::Fc1Weight), device).transpose());
        self.fc1.bias         = Some(Param::from_tensor(from_param_tensor::<B, 1>(params.get(ParamSlot::Fc1Bias), device)));
        self.fc2.weight       = Param::from_tensor(from_param_tensor::<B, 2>(params.get(ParamSlot::Fc2Weight), device).transpose());
        self.fc2.bias         = Some(Param::from_tensor(from_param_tensor::<B, 1>(params.get(ParamSlot::Fc2Bias), device)));
        Ok(self)
    }
}

fn to_param_tensor<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<ParamTensor> {
    let data  = tensor.into_data().convert::<f32>();
    let shape = data.shape.clone();
    let values = data
        .to_vec::<f32>()
        .map_err(|e| anyhow!("cannot read tensor data: {e:?}"))?;
    Ok(ParamTensor::new(shape, values))
}

fn from_param_tensor<B: Backend, const D: usize>(p: &ParamTensor, device: &B::Device) -> Tensor<B, D> {
    Tensor::<B, D>::from_data(TensorData::new(p.data.clone(), p.shape.clone()), device)
}
