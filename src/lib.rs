//! # hexapod-edge 决策核心
//!
//! 太阳能/电池供电的滑坡监测节点（ESP32 + LoRaWAN）上运行的决策流水线：
//!
//! 读数校验 → 特征归一化 + 神经网络推理 → 自适应风险/功耗策略（含紧急模式状态机）
//! → 二进制上行帧，以及下行命令解码。
//!
//! 传感器驱动、LoRaWAN 协议栈、深度睡眠硬件都不在本库中，通过 [`traits`]
//! 中的接口接入；[`device::DeviceRunner`] 给出了一个参考主循环。
//!
//! ## 模块组织
//!
//! - [`sensors`] - 快照数据结构与读数校验
//! - [`inference`] - 归一化、前馈网络、风险等级
//! - [`policy`] - 发送/休眠策略与紧急模式
//! - [`codec`] - 上行帧编码、下行命令解码
//! - [`node`] - 把以上串成一次决策周期
//! - [`config`] - 策略常量与预设
//!
//! ## 使用示例
//!
//! ```rust
//! use hexapod_edge::{config::presets, SensorNode, SensorSnapshot};
//!
//! let mut node = SensorNode::new(presets::FIELD_DEFAULT).unwrap();
//! let snapshot = SensorSnapshot {
//!   accel_z: 9.81,
//!   battery_voltage: 3.6,
//!   battery_level: 80,
//!   ..Default::default()
//! };
//! let report = node.run_cycle(snapshot, 0);
//! if let Some(frame) = report.payload {
//!   assert_eq!(frame.as_bytes().len(), 51);
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod inference;
pub mod node;
pub mod policy;
pub mod sensors;
pub mod traits;

// 重新导出常用类型
pub use codec::{decode_downlink, encode_uplink, DownlinkCommand, UplinkFrame, UPLINK_FRAME_LEN};
pub use config::{CodecConfig, NodeConfig, OverflowPolicy, PolicyConfig};
pub use error::{NodeError, Result};
pub use inference::{infer, InferenceEngine, InferenceResult, NeuralWeights, RiskLevel};
pub use node::{CycleReport, NodeBuilder, SensorNode};
pub use policy::{PolicyDecision, PolicyEngine, PolicyOutcome, PolicyState};
pub use sensors::{validate, QualityFlags, SensorSnapshot};

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 主机侧初始化：安装 `env_logger`
///
/// 重复调用返回 [`NodeError::Initialization`]。
#[cfg(feature = "std")]
pub fn init() -> Result<()> {
  env_logger::try_init().map_err(|_| NodeError::Initialization)?;

  log::info!("hexapod-edge 决策核心初始化完成，版本: {}", VERSION);
  Ok(())
}
