//! # 外部接口特征
//!
//! 传感器驱动、LoRaWAN 协议栈、深度睡眠硬件都在决策核心之外，
//! 这里只定义核心需要的最小接口，由板级代码实现。

use crate::sensors::SensorSnapshot;

/// 传感器采集
pub trait SensorSource {
  /// 采集一次完整快照
  ///
  /// 质量标志由核心填写，实现方可以保持为空。
  fn acquire(&mut self, now_ms: u32) -> SensorSnapshot;
}

/// 无线链路（LoRaWAN OTAA）
pub trait RadioLink {
  /// 链路错误类型
  type Error: core::fmt::Debug;

  /// 入网
  fn join(&mut self) -> Result<(), Self::Error>;

  /// 发送上行帧
  fn send(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

  /// 最近一次接收的信号强度 (dBm)
  fn rssi(&self) -> i8;

  /// 取出一条待处理的下行帧，返回写入 `buf` 的字节数
  fn poll_downlink(&mut self, buf: &mut [u8]) -> Option<usize>;
}

/// 电源控制
pub trait PowerControl {
  /// 长时间低功耗保持（临界电压）
  fn request_low_power_hold(&mut self, duration_secs: u32);

  /// 周期间休眠
  fn sleep(&mut self, duration_ms: u32);
}

/// 状态指示
pub trait StatusIndicator {
  /// 进入紧急模式时的可见告警（LED 快闪等）
  fn emergency_alert(&mut self);
}

/// 单调时钟
pub trait Clock {
  /// 上电以来的毫秒数，会回绕
  fn now_ms(&self) -> u32;
}
