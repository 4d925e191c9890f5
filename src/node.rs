//! # 节点门面
//!
//! 把校验、推理、策略和编码串成一次完整的决策周期。

use heapless::spsc::Consumer;

use crate::codec::downlink::DOWNLINK_QUEUE_LEN;
use crate::codec::{decode_downlink, encode_uplink, DownlinkCommand, UplinkFrame};
use crate::config::{CodecConfig, NodeConfig, PolicyConfig};
use crate::error::Result;
use crate::inference::{
  FeatureNormalizer, FixedConfidence, InferenceEngine, InferenceResult, NeuralWeights,
};
use crate::policy::{
  leave_maintenance, EmergencyTransition, LowPowerHoldRequest, PolicyEngine, PolicyInputs,
  PolicyMutation, PolicyOutcome, PolicyState,
};
use crate::sensors::{validate, SensorSnapshot};

/// 一次决策周期的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
  /// 推理结果
  pub result: InferenceResult,
  /// 需要发送的上行帧
  pub payload: Option<UplinkFrame>,
  /// 临界电压时的低功耗保持请求；存在时本周期不应再休眠/发送
  pub hold: Option<LowPowerHoldRequest>,
  /// 建议休眠时长 (ms)
  pub sleep_ms: u32,
  /// 紧急模式转换
  pub transition: Option<EmergencyTransition>,
}

impl CycleReport {
  /// 本周期是否进入紧急模式
  pub fn emergency_entered(&self) -> bool {
    self.transition == Some(EmergencyTransition::Entered)
  }
}

/// 传感器节点
#[derive(Debug, Clone)]
pub struct SensorNode {
  engine: InferenceEngine,
  policy: PolicyEngine,
  codec: CodecConfig,
  state: PolicyState,
}

impl SensorNode {
  /// 使用配置创建节点，权重由种子生成
  pub fn new(config: NodeConfig) -> Result<Self> {
    NodeBuilder::new().config(config).build()
  }

  pub fn builder() -> NodeBuilder {
    NodeBuilder::new()
  }

  pub fn state(&self) -> &PolicyState {
    &self.state
  }

  pub fn policy(&self) -> &PolicyEngine {
    &self.policy
  }

  pub fn weights(&self) -> &NeuralWeights {
    self.engine.weights()
  }

  /// 运行一次决策周期
  pub fn run_cycle(&mut self, snapshot: SensorSnapshot, now_ms: u32) -> CycleReport {
    let snapshot = snapshot.with_quality(validate(&snapshot));
    let result = self.engine.infer(&snapshot);

    let inputs = PolicyInputs {
      result,
      battery_level: snapshot.battery_level,
      battery_voltage: snapshot.battery_voltage,
      now_ms,
    };

    match self.policy.evaluate(&mut self.state, &inputs) {
      PolicyOutcome::Maintenance => CycleReport {
        result,
        payload: None,
        hold: None,
        sleep_ms: self.policy.maintenance_sleep_ms(),
        transition: None,
      },
      PolicyOutcome::Hold { request, transition } => CycleReport {
        result,
        payload: None,
        hold: Some(request),
        sleep_ms: 0,
        transition,
      },
      PolicyOutcome::Proceed(decision) => {
        let payload = if decision.transmit {
          let frame = encode_uplink(&snapshot, &result, self.state.emergency_mode, &self.codec);
          self.state.record_transmission(now_ms);
          Some(frame)
        } else {
          None
        };

        CycleReport {
          result,
          payload,
          hold: None,
          sleep_ms: decision.sleep_ms,
          transition: decision.transition,
        }
      }
    }
  }

  /// 处理一条下行帧
  pub fn on_downlink(&mut self, bytes: &[u8]) -> PolicyMutation {
    match decode_downlink(bytes) {
      Some(command) => self.apply(command),
      None => {
        log::debug!("ignoring malformed downlink ({} bytes)", bytes.len());
        PolicyMutation::Malformed
      }
    }
  }

  /// 应用一条已解码的命令
  pub fn apply(&mut self, command: DownlinkCommand) -> PolicyMutation {
    self.policy.apply_command(&mut self.state, command)
  }

  /// 取出队列中所有待处理命令并依次应用，返回处理条数
  pub fn apply_pending(
    &mut self,
    consumer: &mut Consumer<'_, DownlinkCommand, DOWNLINK_QUEUE_LEN>,
  ) -> usize {
    let mut applied = 0;
    while let Some(command) = consumer.dequeue() {
      self.apply(command);
      applied += 1;
    }
    applied
  }

  /// 本地退出维护模式
  pub fn leave_maintenance(&mut self) {
    leave_maintenance(&mut self.state);
  }

  pub fn on_send_success(&mut self) {
    self.state.on_send_success();
  }

  pub fn on_send_failure(&mut self) {
    self.state.on_send_failure();
  }

  pub fn on_join_failure(&mut self) {
    self.state.on_join_failure();
  }

  /// 连续失败次数是否达到退避阈值
  pub fn backoff_recommended(&self) -> bool {
    self.policy.backoff_recommended(&self.state)
  }
}

/// 节点构建器
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
  config: NodeConfig,
  weights: Option<NeuralWeights>,
  normalizer: Option<FeatureNormalizer>,
}

impl NodeBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// 整体替换配置
  pub fn config(mut self, config: NodeConfig) -> Self {
    self.config = config;
    self
  }

  pub fn policy(mut self, policy: PolicyConfig) -> Self {
    self.config.policy = policy;
    self
  }

  pub fn codec(mut self, codec: CodecConfig) -> Self {
    self.config.codec = codec;
    self
  }

  pub fn weight_seed(mut self, seed: u64) -> Self {
    self.config.weight_seed = seed;
    self
  }

  /// 使用训练好的权重代替种子生成
  pub fn weights(mut self, weights: NeuralWeights) -> Self {
    self.weights = Some(weights);
    self
  }

  pub fn normalizer(mut self, normalizer: FeatureNormalizer) -> Self {
    self.normalizer = Some(normalizer);
    self
  }

  /// 校验配置并构建节点
  pub fn build(self) -> Result<SensorNode> {
    self.config.validate()?;

    let weights = self
      .weights
      .unwrap_or_else(|| NeuralWeights::from_seed(self.config.weight_seed));
    let normalizer = self.normalizer.unwrap_or_default();

    log::info!(
      "sensor node ready (seed {:#x}, overflow {:?})",
      self.config.weight_seed,
      self.config.codec.overflow
    );

    Ok(SensorNode {
      engine: InferenceEngine::with_parts(weights, normalizer, FixedConfidence::default()),
      policy: PolicyEngine::new(self.config.policy),
      codec: self.config.codec,
      state: PolicyState::new(),
    })
  }
}
