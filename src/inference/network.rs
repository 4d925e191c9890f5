//! 单隐层前馈网络
//!
//! 13 输入 → 8 隐层 (ReLU) → 1 输出 (sigmoid)，无偏置项。
//! 权重在启动时初始化一次，之后只读（不做设备端学习）。

use libm::expf;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{NodeError, Result};

use super::{FeatureVector, HIDDEN_SIZE, INPUT_SIZE};

/// 权重总数
pub const WEIGHT_COUNT: usize = INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE;
/// 权重二进制块字节数（小端 f32）
pub const WEIGHT_BLOB_LEN: usize = WEIGHT_COUNT * 4;

/// 网络权重
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuralWeights {
  /// 输入到隐层，`input_hidden[i][h]`
  pub input_hidden: [[f32; HIDDEN_SIZE]; INPUT_SIZE],
  /// 隐层到输出
  pub hidden_output: [f32; HIDDEN_SIZE],
}

impl NeuralWeights {
  /// 全零权重
  pub const fn zeros() -> Self {
    Self {
      input_hidden: [[0.0; HIDDEN_SIZE]; INPUT_SIZE],
      hidden_output: [0.0; HIDDEN_SIZE],
    }
  }

  /// 用种子生成 [-0.1, 0.1) 内、量化到 0.001 的伪随机权重
  pub fn from_seed(seed: u64) -> Self {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut weights = Self::zeros();

    for row in weights.input_hidden.iter_mut() {
      for w in row.iter_mut() {
        *w = small_weight(&mut rng);
      }
    }
    for w in weights.hidden_output.iter_mut() {
      *w = small_weight(&mut rng);
    }

    log::debug!("neural weights initialized from seed {:#x}", seed);
    weights
  }

  /// 从小端 f32 二进制块加载训练好的权重
  ///
  /// 布局：先 13×8 输入→隐层（按行），再 8 个隐层→输出。
  pub fn from_le_bytes(blob: &[u8]) -> Result<Self> {
    if blob.len() != WEIGHT_BLOB_LEN {
      return Err(NodeError::WeightBlobLength {
        expected: WEIGHT_BLOB_LEN,
        actual: blob.len(),
      });
    }

    let mut weights = Self::zeros();
    for (index, chunk) in blob.chunks_exact(4).enumerate() {
      let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
      if !value.is_finite() {
        return Err(NodeError::NonFiniteWeight { index });
      }
      if index < INPUT_SIZE * HIDDEN_SIZE {
        weights.input_hidden[index / HIDDEN_SIZE][index % HIDDEN_SIZE] = value;
      } else {
        weights.hidden_output[index - INPUT_SIZE * HIDDEN_SIZE] = value;
      }
    }
    Ok(weights)
  }

  /// 序列化为小端 f32 二进制块
  pub fn to_le_bytes(&self) -> [u8; WEIGHT_BLOB_LEN] {
    let mut blob = [0u8; WEIGHT_BLOB_LEN];
    let values = self
      .input_hidden
      .iter()
      .flat_map(|row| row.iter())
      .chain(self.hidden_output.iter());
    for (chunk, value) in blob.chunks_exact_mut(4).zip(values) {
      chunk.copy_from_slice(&value.to_le_bytes());
    }
    blob
  }

  /// 前向传播，返回 sigmoid 后的异常分数
  pub fn forward(&self, features: &FeatureVector) -> f32 {
    let mut hidden = [0.0f32; HIDDEN_SIZE];

    for (h, node) in hidden.iter_mut().enumerate() {
      let mut sum = 0.0;
      for (i, x) in features.iter().enumerate() {
        sum += self.input_hidden[i][h] * x;
      }
      *node = relu(sum);
    }

    let output: f32 = hidden
      .iter()
      .zip(self.hidden_output.iter())
      .map(|(a, w)| a * w)
      .sum();

    sigmoid(output)
  }
}

fn small_weight(rng: &mut SmallRng) -> f32 {
  rng.gen_range(-100i32..100) as f32 / 1000.0
}

#[inline]
fn relu(x: f32) -> f32 {
  if x > 0.0 {
    x
  } else {
    0.0
  }
}

/// Logistic sigmoid，结果在 [0, 1]
#[inline]
pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + expf(-x))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_seeded_weights_are_small_and_deterministic() {
    let a = NeuralWeights::from_seed(7);
    let b = NeuralWeights::from_seed(7);
    assert_eq!(a, b);

    let all = a
      .input_hidden
      .iter()
      .flat_map(|row| row.iter())
      .chain(a.hidden_output.iter());
    for w in all {
      assert!(*w >= -0.1 && *w < 0.1, "weight {} out of range", w);
      let milli = w * 1000.0;
      assert!((milli - milli.round()).abs() < 1e-3);
    }

    assert_ne!(a, NeuralWeights::from_seed(8));
  }

  #[test]
  fn test_zero_weights_give_half() {
    let weights = NeuralWeights::zeros();
    assert_eq!(weights.forward(&[3.0; INPUT_SIZE]), 0.5);
  }

  #[test]
  fn test_relu_blocks_negative_hidden() {
    let mut weights = NeuralWeights::zeros();
    for row in weights.input_hidden.iter_mut() {
      row[0] = -1.0;
    }
    weights.hidden_output[0] = 5.0;
    // 隐层 0 的激活为负，被 ReLU 截断
    assert_eq!(weights.forward(&[1.0; INPUT_SIZE]), 0.5);
  }

  #[test]
  fn test_forward_matches_hand_computation() {
    let mut weights = NeuralWeights::zeros();
    weights.input_hidden[0][0] = 0.5;
    weights.input_hidden[1][0] = 0.25;
    weights.hidden_output[0] = 2.0;
    let mut x = [0.0; INPUT_SIZE];
    x[0] = 2.0;
    x[1] = 4.0;
    // hidden0 = 0.5*2 + 0.25*4 = 2, output = 4
    let expected = 1.0 / (1.0 + (-4.0f32).exp());
    assert!((weights.forward(&x) - expected).abs() < 1e-6);
  }

  #[test]
  fn test_sigmoid_saturates_inside_unit_interval() {
    assert_eq!(sigmoid(0.0), 0.5);
    assert!(sigmoid(200.0) <= 1.0);
    assert!(sigmoid(-200.0) >= 0.0);
    assert_eq!(sigmoid(f32::INFINITY), 1.0);
    assert_eq!(sigmoid(f32::NEG_INFINITY), 0.0);
  }

  #[test]
  fn test_blob_round_trip() {
    let weights = NeuralWeights::from_seed(99);
    let blob = weights.to_le_bytes();
    assert_eq!(NeuralWeights::from_le_bytes(&blob), Ok(weights));
  }

  #[test]
  fn test_blob_rejects_bad_input() {
    assert_eq!(
      NeuralWeights::from_le_bytes(&[0u8; 10]),
      Err(NodeError::WeightBlobLength {
        expected: WEIGHT_BLOB_LEN,
        actual: 10
      })
    );

    let mut blob = NeuralWeights::zeros().to_le_bytes();
    blob[4..8].copy_from_slice(&f32::NAN.to_le_bytes());
    assert_eq!(
      NeuralWeights::from_le_bytes(&blob),
      Err(NodeError::NonFiniteWeight { index: 1 })
    );
  }
}
