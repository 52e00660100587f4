//! # Dispatcher
//!
//! 双端点故障转移分发模块。
//!
//! 负责：
//! - 按危险等级判定操作能否故障转移
//! - 主端点限时执行，超时或失败后转向备端点
//! - 故障转移后按冷却表安排切回
//! - 关闭时停止执行通道与调度器，并关闭两个端点

pub mod classifier;
pub mod dispatcher;
pub mod endpoints;
pub mod error;
pub mod lane;
pub mod metrics;
pub mod request;
pub mod state;
pub mod switchback;

pub use classifier::FailoverPolicy;
pub use contracts::{DangerClass, Endpoint, OperationKind};
pub use dispatcher::{DispatcherBuilder, FailoverDispatcher};
pub use endpoints::MemoryEndpoint;
pub use error::{AttemptFailure, DispatchError, LaneError, SecondaryCause};
pub use lane::{CancelSignal, ExecutionLane, LaneRole};
pub use crate::metrics::{DispatcherMetrics, MetricsSnapshot, RaceOutcome};
pub use request::{AttemptFuture, Request};
pub use state::{Route, RoutingState, Transition};
pub use switchback::{CooldownSchedule, SwitchbackScheduler};
