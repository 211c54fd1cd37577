use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One (context → next token) training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextWordSample {
    pub context: Vec<u32>,
    pub target:  u32,
}

pub struct NextWordDataset {
    samples: Vec<NextWordSample>,
}

impl NextWordDataset {
    pub fn new(samples: Vec<NextWordSample>) -> Self { Self { samples } }
}

impl Dataset<NextWordSample> for NextWordDataset {
    fn get(&self, index: usize) -> Option<NextWordSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
