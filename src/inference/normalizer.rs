//! 特征归一化

use crate::error::{NodeError, Result};
use crate::sensors::SensorSnapshot;

use super::{FeatureVector, INPUT_SIZE};

/// 特征均值（Z轴加速度均值 9.81 对应静止时的重力）
pub const FEATURE_MEANS: FeatureVector = [
  0.0, 0.0, 0.0, // tilt
  0.0, 0.0, 9.81, // accel
  0.0, 0.0, 0.0, // gyro
  125.0, 20.0, 60.0, 50.0, // pore, temp, humidity, strain
];

/// 特征标准差（倾角/陀螺仪/加速度的小标准差使网络对微小偏移敏感）
pub const FEATURE_STDS: FeatureVector = [
  0.1, 0.1, 0.1, // tilt
  2.0, 2.0, 2.0, // accel
  0.01, 0.01, 0.01, // gyro
  25.0, 10.0, 20.0, 25.0, // pore, temp, humidity, strain
];

/// 按固定顺序从快照提取特征
pub fn features(snapshot: &SensorSnapshot) -> FeatureVector {
  [
    snapshot.tilt_x,
    snapshot.tilt_y,
    snapshot.tilt_z,
    snapshot.accel_x,
    snapshot.accel_y,
    snapshot.accel_z,
    snapshot.gyro_x,
    snapshot.gyro_y,
    snapshot.gyro_z,
    snapshot.pore_pressure,
    snapshot.temperature,
    snapshot.humidity,
    snapshot.strain_gauge,
  ]
}

/// 特征归一化器：`(value - mean) / std`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureNormalizer {
  mean: FeatureVector,
  std: FeatureVector,
}

impl Default for FeatureNormalizer {
  fn default() -> Self {
    Self {
      mean: FEATURE_MEANS,
      std: FEATURE_STDS,
    }
  }
}

impl FeatureNormalizer {
  /// 使用自定义常量创建归一化器
  ///
  /// 标准差为零或非有限值时返回错误，避免除零。
  pub fn new(mean: FeatureVector, std: FeatureVector) -> Result<Self> {
    for index in 0..INPUT_SIZE {
      if !std[index].is_finite() || std[index] == 0.0 {
        return Err(NodeError::InvalidNormalization { index });
      }
      if !mean[index].is_finite() {
        return Err(NodeError::InvalidNormalization { index });
      }
    }
    Ok(Self { mean, std })
  }

  /// 均值
  pub fn mean(&self) -> &FeatureVector {
    &self.mean
  }

  /// 标准差
  pub fn std(&self) -> &FeatureVector {
    &self.std
  }

  /// 归一化特征向量
  pub fn normalize(&self, raw: &FeatureVector) -> FeatureVector {
    let mut out = [0.0; INPUT_SIZE];
    for (i, value) in out.iter_mut().enumerate() {
      *value = (raw[i] - self.mean[i]) / self.std[i];
    }
    out
  }
}
