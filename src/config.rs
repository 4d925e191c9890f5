//! # 配置模块
//!
//! 策略常量、编码溢出策略以及节点整体配置。默认值与现场部署的固件保持一致。

use crate::error::{NodeError, Result};

/// 1分钟（毫秒）
pub const MINUTE_MS: u32 = 60 * 1000;
/// 1小时（毫秒）
pub const HOUR_MS: u32 = 60 * MINUTE_MS;

/// 自适应策略配置
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyConfig {
  /// 紧急模式发送间隔 (ms)
  pub emergency_interval_ms: u32,
  /// 高/临界风险发送间隔 (ms)
  pub high_risk_interval_ms: u32,
  /// 中风险发送间隔 (ms)
  pub medium_risk_interval_ms: u32,
  /// 低风险发送间隔 (ms)
  pub low_risk_interval_ms: u32,
  /// 进入紧急模式所需置信度（严格大于）
  pub emergency_confidence: f32,
  /// 低电量阈值 (%)，低于此值间隔/休眠加倍
  pub low_battery_level: u8,
  /// 极低电量阈值 (%)，低于此值休眠时间乘4
  pub very_low_battery_level: u8,
  /// 临界电压 (V)，低于此值请求长时间低功耗保持
  pub critical_voltage: f32,
  /// 低功耗保持时长 (s)
  pub low_power_hold_secs: u32,
  /// 临界风险休眠基准 (ms)
  pub critical_sleep_ms: u32,
  /// 高风险休眠基准 (ms)
  pub high_sleep_ms: u32,
  /// 中风险休眠基准 (ms)
  pub medium_sleep_ms: u32,
  /// 低风险休眠基准 (ms)
  pub low_sleep_ms: u32,
  /// 维护模式下的休眠时长 (ms)
  pub maintenance_sleep_ms: u32,
  /// 白天窗口起始小时（含）
  pub daylight_start_hour: u8,
  /// 白天窗口结束小时（含）
  pub daylight_end_hour: u8,
  /// 判定为太阳能充电的电量 (%)，严格大于
  pub solar_battery_level: u8,
  /// 太阳能充电时休眠缩放（百分比）
  pub solar_sleep_percent: u32,
  /// 建议退避的连续失败次数
  pub failure_backoff_threshold: u32,
}

impl Default for PolicyConfig {
  fn default() -> Self {
    presets::FIELD_DEFAULT.policy
  }
}

impl PolicyConfig {
  /// 验证配置
  pub fn validate(&self) -> Result<()> {
    let intervals = [
      self.emergency_interval_ms,
      self.high_risk_interval_ms,
      self.medium_risk_interval_ms,
      self.low_risk_interval_ms,
    ];
    if intervals.iter().any(|&interval| interval == 0) {
      return Err(NodeError::InvalidConfig("transmission intervals must be non-zero"));
    }

    let sleeps = [
      self.critical_sleep_ms,
      self.high_sleep_ms,
      self.medium_sleep_ms,
      self.low_sleep_ms,
      self.maintenance_sleep_ms,
    ];
    if sleeps.iter().any(|&sleep| sleep == 0) {
      return Err(NodeError::InvalidConfig("sleep durations must be non-zero"));
    }

    if !(self.emergency_confidence > 0.0 && self.emergency_confidence < 1.0) {
      return Err(NodeError::InvalidConfig("emergency confidence must lie in (0, 1)"));
    }

    if self.very_low_battery_level > self.low_battery_level || self.low_battery_level > 100 {
      return Err(NodeError::InvalidConfig("battery bands must satisfy very_low <= low <= 100"));
    }

    if !self.critical_voltage.is_finite() || self.critical_voltage <= 0.0 {
      return Err(NodeError::InvalidConfig("critical voltage must be positive"));
    }

    if self.daylight_start_hour > self.daylight_end_hour || self.daylight_end_hour > 23 {
      return Err(NodeError::InvalidConfig("daylight window must lie within 0..=23"));
    }

    if self.solar_sleep_percent == 0 || self.solar_sleep_percent > 100 {
      return Err(NodeError::InvalidConfig("solar sleep percent must lie in 1..=100"));
    }

    Ok(())
  }
}

/// 13路测量值缩放为 i16 时的溢出处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverflowPolicy {
  /// 截断到 i32 后按位回绕到 i16，与现网设备逐位兼容
  #[default]
  Wrap,
  /// 饱和到 i16 范围
  Saturate,
}

/// 帧编码配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecConfig {
  /// 溢出策略
  pub overflow: OverflowPolicy,
}

/// 节点配置
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeConfig {
  /// 策略配置
  pub policy: PolicyConfig,
  /// 编码配置
  pub codec: CodecConfig,
  /// 权重初始化种子
  pub weight_seed: u64,
}

impl Default for NodeConfig {
  fn default() -> Self {
    presets::FIELD_DEFAULT
  }
}

impl NodeConfig {
  /// 验证配置
  pub fn validate(&self) -> Result<()> {
    self.policy.validate()
  }
}

/// 预定义配置
pub mod presets {
  use super::*;

  /// 现场部署默认配置
  pub const FIELD_DEFAULT: NodeConfig = NodeConfig {
    policy: PolicyConfig {
      emergency_interval_ms: MINUTE_MS,
      high_risk_interval_ms: 5 * MINUTE_MS,
      medium_risk_interval_ms: 15 * MINUTE_MS,
      low_risk_interval_ms: 30 * MINUTE_MS,
      emergency_confidence: 0.7,
      low_battery_level: 20,
      very_low_battery_level: 10,
      critical_voltage: 3.0,
      low_power_hold_secs: 4 * 60 * 60,
      critical_sleep_ms: 30 * 1000,
      high_sleep_ms: 2 * MINUTE_MS,
      medium_sleep_ms: 5 * MINUTE_MS,
      low_sleep_ms: 15 * MINUTE_MS,
      maintenance_sleep_ms: 15 * MINUTE_MS,
      daylight_start_hour: 6,
      daylight_end_hour: 18,
      solar_battery_level: 80,
      solar_sleep_percent: 70,
      failure_backoff_threshold: 3,
    },
    codec: CodecConfig {
      overflow: OverflowPolicy::Wrap,
    },
    weight_seed: 0x4845_5841,
  };

  /// 台架测试配置：间隔缩短到秒级，便于观察状态切换
  pub const BENCH_TEST: NodeConfig = NodeConfig {
    policy: PolicyConfig {
      emergency_interval_ms: 1000,
      high_risk_interval_ms: 5 * 1000,
      medium_risk_interval_ms: 15 * 1000,
      low_risk_interval_ms: 30 * 1000,
      emergency_confidence: 0.7,
      low_battery_level: 20,
      very_low_battery_level: 10,
      critical_voltage: 3.0,
      low_power_hold_secs: 60,
      critical_sleep_ms: 500,
      high_sleep_ms: 2 * 1000,
      medium_sleep_ms: 5 * 1000,
      low_sleep_ms: 15 * 1000,
      maintenance_sleep_ms: 15 * 1000,
      daylight_start_hour: 6,
      daylight_end_hour: 18,
      solar_battery_level: 80,
      solar_sleep_percent: 70,
      failure_backoff_threshold: 3,
    },
    codec: CodecConfig {
      overflow: OverflowPolicy::Saturate,
    },
    weight_seed: 1,
  };
}
