// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, training and inference code lives here.
// The data layer only touches Burn for its Dataset/Batcher
// adapters; domain and infra never see a tensor.
//
//   model.rs      — NextWordModel: embedding → concat →
//                   ReLU(fc1) → fc2, plus conversion to and
//                   from framework-free ModelParameters
//
//   trainer.rs    — one configuration's train/validate loop
//                   (cross-entropy + Adam, top-1/top-5 accuracy)
//
//   evaluation.rs — host-side top-k and hit counting
//
//   selection.rs  — best model per context length and overall
//
//   inferencer.rs — softmax top-5 probes on a loaded model
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Bengio et al. (2003) A Neural Probabilistic Language Model

use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};

/// Next-word model architecture
pub mod model;

/// Training loop with validation metrics
pub mod trainer;

/// Top-k hit counting on host-side logits
pub mod evaluation;

/// Picks the configurations to export
pub mod selection;

/// Top-5 probes on a trained or loaded model
pub mod inferencer;

/// GPU training backend (the default)
pub type GpuTrainBackend = Autodiff<Wgpu>;

/// CPU training backend
pub type CpuTrainBackend = Autodiff<NdArray>;

/// Which device family the CLI should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Wgpu,
    Cpu,
}

pub fn wgpu_device() -> WgpuDevice {
    WgpuDevice::default()
}

pub fn cpu_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}
