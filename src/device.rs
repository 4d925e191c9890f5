//! # 设备运行器
//!
//! 决策核心之外的板级主循环：入网、采集、决策、发送、休眠。
//! 每次 [`DeviceRunner::step`] 推进一个状态，便于在 RTIC 任务或测试中驱动。
//!
//! ```text
//! Init → Join ──ok──→ Cycle ──→ Sleep ──→ Cycle ...
//!          └─err─→ Sleep(重试) ─→ Join
//! Cycle ──临界电压──→ Halted
//! ```

use crate::config::MINUTE_MS;
use crate::node::{CycleReport, SensorNode};
use crate::traits::{Clock, PowerControl, RadioLink, SensorSource, StatusIndicator};

/// 入网失败后的重试等待 (ms)
pub const JOIN_RETRY_MS: u32 = MINUTE_MS;

/// 下行接收缓冲区大小
const DOWNLINK_BUF_LEN: usize = 64;

/// 运行器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
  /// 上电
  Init,
  /// 等待入网
  Join,
  /// 执行一次决策周期
  Cycle,
  /// 休眠
  Sleep { duration_ms: u32 },
  /// 已请求低功耗保持，不再运行
  Halted,
}

/// 设备运行器
pub struct DeviceRunner<S, R, P, L> {
  node: SensorNode,
  sensors: S,
  radio: R,
  power: P,
  indicator: L,
  state: DeviceState,
  joined: bool,
  last_report: Option<CycleReport>,
}

impl<S, R, P, L> DeviceRunner<S, R, P, L>
where
  S: SensorSource,
  R: RadioLink,
  P: PowerControl,
  L: StatusIndicator,
{
  pub fn new(node: SensorNode, sensors: S, radio: R, power: P, indicator: L) -> Self {
    Self {
      node,
      sensors,
      radio,
      power,
      indicator,
      state: DeviceState::Init,
      joined: false,
      last_report: None,
    }
  }

  pub fn state(&self) -> DeviceState {
    self.state
  }

  pub fn node(&self) -> &SensorNode {
    &self.node
  }

  pub fn node_mut(&mut self) -> &mut SensorNode {
    &mut self.node
  }

  pub fn radio(&self) -> &R {
    &self.radio
  }

  pub fn power(&self) -> &P {
    &self.power
  }

  pub fn indicator(&self) -> &L {
    &self.indicator
  }

  /// 最近一次决策周期的结果
  pub fn last_report(&self) -> Option<&CycleReport> {
    self.last_report.as_ref()
  }

  pub fn is_halted(&self) -> bool {
    self.state == DeviceState::Halted
  }

  /// 推进一个状态
  pub fn step(&mut self, now_ms: u32) -> DeviceState {
    self.state = match self.state {
      DeviceState::Init => {
        log::info!("device init, joining network");
        DeviceState::Join
      }
      DeviceState::Join => self.join(),
      DeviceState::Cycle => self.cycle(now_ms),
      DeviceState::Sleep { duration_ms } => {
        self.power.sleep(duration_ms);
        if self.joined {
          DeviceState::Cycle
        } else {
          DeviceState::Join
        }
      }
      DeviceState::Halted => DeviceState::Halted,
    };
    self.state
  }

  /// 按时钟推进至多 `max_steps` 步，停机后提前返回
  pub fn run<C: Clock>(&mut self, clock: &C, max_steps: usize) -> DeviceState {
    for _ in 0..max_steps {
      if self.step(clock.now_ms()) == DeviceState::Halted {
        break;
      }
    }
    self.state
  }

  fn join(&mut self) -> DeviceState {
    match self.radio.join() {
      Ok(()) => {
        log::info!("network joined");
        self.joined = true;
        DeviceState::Cycle
      }
      Err(err) => {
        log::warn!("join failed: {:?}", err);
        self.node.on_join_failure();
        DeviceState::Sleep {
          duration_ms: JOIN_RETRY_MS,
        }
      }
    }
  }

  fn cycle(&mut self, now_ms: u32) -> DeviceState {
    self.drain_downlinks();

    let snapshot = self
      .sensors
      .acquire(now_ms)
      .with_signal_strength(self.radio.rssi());
    let report = self.node.run_cycle(snapshot, now_ms);
    self.last_report = Some(report);

    if report.emergency_entered() {
      self.indicator.emergency_alert();
    }

    if let Some(hold) = report.hold {
      self.power.request_low_power_hold(hold.duration_secs);
      return DeviceState::Halted;
    }

    if let Some(frame) = report.payload {
      match self.radio.send(frame.as_bytes()) {
        Ok(()) => self.node.on_send_success(),
        Err(err) => {
          log::warn!("uplink send failed: {:?}", err);
          self.node.on_send_failure();
        }
      }
    }

    if self.node.backoff_recommended() {
      log::warn!(
        "{} consecutive radio failures",
        self.node.state().failed_transmissions
      );
    }

    DeviceState::Sleep {
      duration_ms: report.sleep_ms,
    }
  }

  fn drain_downlinks(&mut self) {
    let mut buf = [0u8; DOWNLINK_BUF_LEN];
    while let Some(len) = self.radio.poll_downlink(&mut buf) {
      let len = len.min(DOWNLINK_BUF_LEN);
      self.node.on_downlink(&buf[..len]);
    }
  }
}
