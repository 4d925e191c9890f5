//! # 错误处理模块
//!
//! 决策核心本身（校验、归一化、推理、策略、编码）是全函数，不会失败；
//! 这里的错误只来自构造/加载阶段（配置、权重、归一化常量）和地面侧的帧解码。

use core::fmt;

/// 节点错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError {
  /// 归一化标准差为零或非有限值
  InvalidNormalization {
    /// 特征索引
    index: usize,
  },
  /// 权重二进制块长度不符
  WeightBlobLength {
    /// 期望字节数
    expected: usize,
    /// 实际字节数
    actual: usize,
  },
  /// 权重包含 NaN/无穷大
  NonFiniteWeight {
    /// 扁平化后的权重索引
    index: usize,
  },
  /// 上行帧长度不符
  FrameLength {
    /// 期望字节数
    expected: usize,
    /// 实际字节数
    actual: usize,
  },
  /// 风险等级字节超出 0..=3
  InvalidRiskLevel(u8),
  /// 配置错误
  InvalidConfig(&'static str),
  /// 初始化错误（日志系统重复初始化等）
  Initialization,
}

impl fmt::Display for NodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NodeError::InvalidNormalization { index } => {
        write!(f, "normalization std for feature {} must be finite and non-zero", index)
      }
      NodeError::WeightBlobLength { expected, actual } => {
        write!(f, "weight blob length mismatch: expected {} bytes, got {}", expected, actual)
      }
      NodeError::NonFiniteWeight { index } => write!(f, "weight {} is not finite", index),
      NodeError::FrameLength { expected, actual } => {
        write!(f, "uplink frame length mismatch: expected {} bytes, got {}", expected, actual)
      }
      NodeError::InvalidRiskLevel(level) => write!(f, "invalid risk level byte: {}", level),
      NodeError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
      NodeError::Initialization => write!(f, "initialization failed"),
    }
  }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for NodeError {}

/// 结果类型别名
pub type Result<T> = core::result::Result<T, NodeError>;
