//! # 推理模块
//!
//! 归一化后的 13 维特征经过一个很小的前馈网络得到异常分数，再映射为风险等级。
//! 置信度与异常分数是两个独立字段，目前由 [`FixedConfidence`] 给出常量 0.8。

pub mod network;
pub mod normalizer;

pub use network::NeuralWeights;
pub use normalizer::{features, FeatureNormalizer};

use crate::error::NodeError;
use crate::sensors::SensorSnapshot;

/// 输入特征数
pub const INPUT_SIZE: usize = 13;
/// 隐层节点数
pub const HIDDEN_SIZE: usize = 8;

/// 特征向量
pub type FeatureVector = [f32; INPUT_SIZE];

/// 风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RiskLevel {
  #[default]
  Low = 0,
  Medium = 1,
  High = 2,
  Critical = 3,
}

impl RiskLevel {
  /// 分数阈值：`<0.3` 低，`<0.6` 中，`<0.8` 高，其余临界
  pub fn from_score(score: f32) -> Self {
    if score < 0.3 {
      RiskLevel::Low
    } else if score < 0.6 {
      RiskLevel::Medium
    } else if score < 0.8 {
      RiskLevel::High
    } else {
      RiskLevel::Critical
    }
  }

  pub const fn as_u8(self) -> u8 {
    self as u8
  }

  /// 高风险及以上
  pub fn is_elevated(self) -> bool {
    self >= RiskLevel::High
  }
}

impl TryFrom<u8> for RiskLevel {
  type Error = NodeError;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(RiskLevel::Low),
      1 => Ok(RiskLevel::Medium),
      2 => Ok(RiskLevel::High),
      3 => Ok(RiskLevel::Critical),
      other => Err(NodeError::InvalidRiskLevel(other)),
    }
  }
}

/// 推理结果
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InferenceResult {
  /// 异常分数 [0, 1]
  pub anomaly_score: f32,
  /// 风险等级
  pub risk_level: RiskLevel,
  /// 置信度 [0, 1]
  pub confidence: f32,
  /// 快照时间戳
  pub timestamp: u32,
}

/// 置信度估计
pub trait ConfidenceEstimator {
  /// 根据归一化特征和异常分数给出置信度，结果必须在 [0, 1]
  fn estimate(&self, normalized: &FeatureVector, anomaly_score: f32) -> f32;
}

/// 常量置信度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedConfidence(pub f32);

impl Default for FixedConfidence {
  fn default() -> Self {
    FixedConfidence(0.8)
  }
}

impl ConfidenceEstimator for FixedConfidence {
  fn estimate(&self, _normalized: &FeatureVector, _anomaly_score: f32) -> f32 {
    self.0
  }
}

/// 推理引擎
#[derive(Debug, Clone)]
pub struct InferenceEngine<C: ConfidenceEstimator = FixedConfidence> {
  weights: NeuralWeights,
  normalizer: FeatureNormalizer,
  confidence: C,
}

impl InferenceEngine<FixedConfidence> {
  /// 使用默认归一化常量和常量置信度
  pub fn new(weights: NeuralWeights) -> Self {
    Self::with_parts(weights, FeatureNormalizer::default(), FixedConfidence::default())
  }
}

impl<C: ConfidenceEstimator> InferenceEngine<C> {
  pub fn with_parts(weights: NeuralWeights, normalizer: FeatureNormalizer, confidence: C) -> Self {
    Self {
      weights,
      normalizer,
      confidence,
    }
  }

  pub fn weights(&self) -> &NeuralWeights {
    &self.weights
  }

  pub fn normalizer(&self) -> &FeatureNormalizer {
    &self.normalizer
  }

  /// 对一次快照做推理
  pub fn infer(&self, snapshot: &SensorSnapshot) -> InferenceResult {
    let mut normalized = self.normalizer.normalize(&features(snapshot));
    // NaN/无穷大读数按均值处理
    for value in normalized.iter_mut() {
      if !value.is_finite() {
        *value = 0.0;
      }
    }

    let mut anomaly_score = self.weights.forward(&normalized);
    if !anomaly_score.is_finite() {
      anomaly_score = 0.5;
    }
    let anomaly_score = anomaly_score.clamp(0.0, 1.0);
    let confidence = self
      .confidence
      .estimate(&normalized, anomaly_score)
      .clamp(0.0, 1.0);

    let result = InferenceResult {
      anomaly_score,
      risk_level: RiskLevel::from_score(anomaly_score),
      confidence,
      timestamp: snapshot.timestamp,
    };

    log::debug!(
      "inference: score={} risk={} confidence={}",
      result.anomaly_score,
      result.risk_level.as_u8(),
      result.confidence
    );
    result
  }
}

/// 使用默认归一化常量和常量置信度推理
pub fn infer(snapshot: &SensorSnapshot, weights: &NeuralWeights) -> InferenceResult {
  InferenceEngine::new(*weights).infer(snapshot)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_risk_thresholds() {
    assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(0.2999), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(0.5999), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(0.7999), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(0.8), RiskLevel::Critical);
    assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
  }

  #[test]
  fn test_risk_byte_conversion() {
    for level in [
      RiskLevel::Low,
      RiskLevel::Medium,
      RiskLevel::High,
      RiskLevel::Critical,
    ] {
      assert_eq!(RiskLevel::try_from(level.as_u8()), Ok(level));
    }
    assert_eq!(RiskLevel::try_from(4), Err(NodeError::InvalidRiskLevel(4)));
    assert!(RiskLevel::Critical.is_elevated());
    assert!(!RiskLevel::Medium.is_elevated());
  }

  #[test]
  fn test_zero_weights_score_half_medium() {
    let result = infer(&SensorSnapshot::default(), &NeuralWeights::zeros());
    assert_eq!(result.anomaly_score, 0.5);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert_eq!(result.confidence, 0.8);
  }

  #[test]
  fn test_timestamp_copied() {
    let snapshot = SensorSnapshot {
      timestamp: 1234,
      ..Default::default()
    };
    let result = infer(&snapshot, &NeuralWeights::from_seed(3));
    assert_eq!(result.timestamp, 1234);
    assert!((0.0..=1.0).contains(&result.anomaly_score));
  }

  #[test]
  fn test_non_finite_readings_stay_in_range() {
    let snapshot = SensorSnapshot {
      tilt_x: f32::NAN,
      pore_pressure: f32::INFINITY,
      strain_gauge: f32::NEG_INFINITY,
      ..Default::default()
    };
    let result = infer(&snapshot, &NeuralWeights::from_seed(11));
    assert!(result.anomaly_score.is_finite());
    assert!((0.0..=1.0).contains(&result.anomaly_score));
  }

  #[test]
  fn test_large_weights_reach_critical() {
    let mut weights = NeuralWeights::zeros();
    weights.input_hidden[9][0] = 1.0;
    weights.hidden_output[0] = 10.0;
    let snapshot = SensorSnapshot {
      pore_pressure: 200.0, // +3 std
      ..Default::default()
    };
    let result = infer(&snapshot, &weights);
    assert_eq!(result.risk_level, RiskLevel::Critical);
  }

  struct ScoreAsConfidence;

  impl ConfidenceEstimator for ScoreAsConfidence {
    fn estimate(&self, _normalized: &FeatureVector, anomaly_score: f32) -> f32 {
      anomaly_score * 2.0
    }
  }

  #[test]
  fn test_custom_estimator_is_clamped() {
    let engine = InferenceEngine::with_parts(
      NeuralWeights::zeros(),
      FeatureNormalizer::default(),
      ScoreAsConfidence,
    );
    let result = engine.infer(&SensorSnapshot::default());
    assert_eq!(result.confidence, 1.0);
  }
}
