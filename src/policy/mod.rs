//! # 自适应策略模块
//!
//! 根据推理结果、电量和设备时钟决定：是否发送、下次发送间隔、休眠多久，
//! 以及紧急模式的进入/退出。所有可变状态集中在 [`PolicyState`] 中，
//! 由调用方持有并显式传入。
//!
//! 一次评估的顺序：
//!
//! 1. 维护模式下直接返回，不做任何决策；
//! 2. 紧急模式状态转换（边沿触发）；
//! 3. 更新发送间隔；
//! 4. 电压低于临界值时请求长时间低功耗保持，本周期到此结束；
//! 5. 否则给出发送与休眠决策。

pub mod command;
pub mod schedule;

pub use command::{apply_command, leave_maintenance, PolicyMutation};
pub use schedule::{device_hour, sleep_duration, tier_interval, transmission_interval};

use crate::codec::DownlinkCommand;
use crate::config::{PolicyConfig, MINUTE_MS};
use crate::inference::{InferenceResult, RiskLevel};

/// 上电后的初始发送间隔
pub const INITIAL_INTERVAL_MS: u32 = 30 * MINUTE_MS;

/// 策略状态
///
/// 只在重启时重置（构造新值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PolicyState {
  /// 当前发送间隔 (ms)
  pub transmission_interval_ms: u32,
  /// 上次发送时刻 (ms，设备时钟)
  pub last_transmission_ms: u32,
  /// 紧急模式
  pub emergency_mode: bool,
  /// 维护模式
  pub maintenance_mode: bool,
  /// 连续发送/入网失败次数
  pub failed_transmissions: u32,
  /// 下行 0x04 给出的阈值提示，仅记录
  pub threshold_hint: Option<u8>,
}

impl Default for PolicyState {
  fn default() -> Self {
    Self::new()
  }
}

impl PolicyState {
  pub const fn new() -> Self {
    Self {
      transmission_interval_ms: INITIAL_INTERVAL_MS,
      last_transmission_ms: 0,
      emergency_mode: false,
      maintenance_mode: false,
      failed_transmissions: 0,
      threshold_hint: None,
    }
  }

  /// 记录一次发送
  pub fn record_transmission(&mut self, now_ms: u32) {
    self.last_transmission_ms = now_ms;
  }

  /// 发送成功，失败计数清零
  pub fn on_send_success(&mut self) {
    self.failed_transmissions = 0;
  }

  /// 发送失败
  pub fn on_send_failure(&mut self) {
    self.failed_transmissions = self.failed_transmissions.saturating_add(1);
    log::warn!("transmission failed ({} in a row)", self.failed_transmissions);
  }

  /// 入网失败，与发送失败共用计数
  pub fn on_join_failure(&mut self) {
    self.failed_transmissions = self.failed_transmissions.saturating_add(1);
    log::warn!("network join failed ({} in a row)", self.failed_transmissions);
  }
}

/// 一次评估的输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyInputs {
  pub result: InferenceResult,
  /// 电量 (%)
  pub battery_level: u8,
  /// 电池电压 (V)
  pub battery_voltage: f32,
  /// 设备时钟 (ms)，会回绕
  pub now_ms: u32,
}

/// 紧急模式状态转换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmergencyTransition {
  /// 进入紧急模式（需要触发告警）
  Entered,
  /// 风险回落，退出紧急模式
  Exited,
}

/// 低功耗保持请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LowPowerHoldRequest {
  /// 保持时长 (s)
  pub duration_secs: u32,
}

/// 正常周期的决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PolicyDecision {
  /// 本周期是否发送
  pub transmit: bool,
  /// 生效的发送间隔 (ms)
  pub interval_ms: u32,
  /// 建议休眠时长 (ms)
  pub sleep_ms: u32,
  /// 本周期发生的紧急模式转换
  pub transition: Option<EmergencyTransition>,
}

/// 评估结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PolicyOutcome {
  /// 维护模式，跳过所有决策
  Maintenance,
  /// 临界电压，请求长时间低功耗保持，本周期不发送
  Hold {
    request: LowPowerHoldRequest,
    transition: Option<EmergencyTransition>,
  },
  /// 正常决策
  Proceed(PolicyDecision),
}

impl PolicyOutcome {
  /// 本周期的紧急模式转换
  pub fn transition(&self) -> Option<EmergencyTransition> {
    match self {
      PolicyOutcome::Maintenance => None,
      PolicyOutcome::Hold { transition, .. } => *transition,
      PolicyOutcome::Proceed(decision) => decision.transition,
    }
  }
}

/// 策略引擎
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolicyEngine {
  config: PolicyConfig,
}

impl PolicyEngine {
  pub fn new(config: PolicyConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &PolicyConfig {
    &self.config
  }

  /// 评估一次推理结果
  pub fn evaluate(&self, state: &mut PolicyState, inputs: &PolicyInputs) -> PolicyOutcome {
    if state.maintenance_mode {
      log::debug!("maintenance mode active, skipping policy");
      return PolicyOutcome::Maintenance;
    }

    let result = &inputs.result;
    let transition = self.update_emergency(state, result);

    state.transmission_interval_ms = if state.emergency_mode {
      self.config.emergency_interval_ms
    } else {
      transmission_interval(&self.config, result.risk_level, inputs.battery_level)
    };

    if inputs.battery_voltage < self.config.critical_voltage {
      log::error!(
        "battery voltage {}V below critical {}V, requesting {}s low-power hold",
        inputs.battery_voltage,
        self.config.critical_voltage,
        self.config.low_power_hold_secs
      );
      return PolicyOutcome::Hold {
        request: LowPowerHoldRequest {
          duration_secs: self.config.low_power_hold_secs,
        },
        transition,
      };
    }

    PolicyOutcome::Proceed(PolicyDecision {
      transmit: self.should_transmit(state, result, inputs.now_ms),
      interval_ms: state.transmission_interval_ms,
      sleep_ms: self.sleep_duration(result.risk_level, inputs.battery_level, inputs.now_ms),
      transition,
    })
  }

  fn update_emergency(
    &self,
    state: &mut PolicyState,
    result: &InferenceResult,
  ) -> Option<EmergencyTransition> {
    if !state.emergency_mode
      && result.risk_level == RiskLevel::Critical
      && result.confidence > self.config.emergency_confidence
    {
      state.emergency_mode = true;
      log::warn!(
        "entering emergency mode: score={} confidence={}",
        result.anomaly_score,
        result.confidence
      );
      Some(EmergencyTransition::Entered)
    } else if state.emergency_mode && result.risk_level == RiskLevel::Low {
      state.emergency_mode = false;
      log::info!("risk back to low, leaving emergency mode");
      Some(EmergencyTransition::Exited)
    } else {
      None
    }
  }

  /// 是否应当发送
  ///
  /// 紧急模式、间隔已到（回绕减法）或风险为高/临界时发送。
  pub fn should_transmit(&self, state: &PolicyState, result: &InferenceResult, now_ms: u32) -> bool {
    if state.emergency_mode {
      return true;
    }
    if now_ms.wrapping_sub(state.last_transmission_ms) >= state.transmission_interval_ms {
      return true;
    }
    result.risk_level.is_elevated()
  }

  /// 休眠时长 (ms)
  pub fn sleep_duration(&self, risk: RiskLevel, battery_level: u8, now_ms: u32) -> u32 {
    sleep_duration(&self.config, risk, battery_level, now_ms)
  }

  /// 维护模式下的休眠时长
  pub fn maintenance_sleep_ms(&self) -> u32 {
    self.config.maintenance_sleep_ms
  }

  /// 应用下行命令
  pub fn apply_command(&self, state: &mut PolicyState, command: DownlinkCommand) -> PolicyMutation {
    apply_command(state, command)
  }

  /// 连续失败达到阈值，建议调用方退避（策略本身不受影响）
  pub fn backoff_recommended(&self, state: &PolicyState) -> bool {
    state.failed_transmissions >= self.config.failure_backoff_threshold
  }
}
