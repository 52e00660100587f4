//! 调用指标收集模块
//!
//! 记录每次分发调用的结果与耗时，并在内存中聚合以输出摘要。

use std::collections::HashMap;

use contracts::{DangerClass, OperationKind};
use metrics::{counter, gauge, histogram};

/// 调用在调用方看到的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    /// 返回了结果 (主或备)
    Ok,
    /// 端点错误原样返回 (未故障转移)
    BackendFailure,
    /// 分发器产生的失败 (双端失败、中断、关闭)
    DispatchFailure,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Ok => "ok",
            CallStatus::BackendFailure => "backend_failure",
            CallStatus::DispatchFailure => "dispatch_failure",
        }
    }
}

/// 记录一次调用
///
/// # Example
///
/// ```ignore
/// use observability::metrics::{record_call, CallStatus};
///
/// let started = Instant::now();
/// let status = match dispatcher.execute(&request).await { ... };
/// record_call(OperationKind::Find, status, started.elapsed().as_secs_f64() * 1000.0);
/// ```
pub fn record_call(kind: OperationKind, status: CallStatus, latency_ms: f64) {
    counter!(
        "failover_dispatch_client_calls_total",
        "op" => kind.as_str(),
        "danger" => kind.danger_class().as_str(),
        "status" => status.as_str()
    )
    .increment(1);

    histogram!(
        "failover_dispatch_call_latency_ms",
        "danger" => kind.danger_class().as_str()
    )
    .record(latency_ms);
}

/// 记录当前是否处于故障转移状态
pub fn record_switched(switched: bool) {
    gauge!("failover_dispatch_switched").set(if switched { 1.0 } else { 0.0 });
}

/// 记录未触发的切回定时器数量 (正常为 0 或 1)
pub fn record_pending_switchbacks(pending: usize) {
    gauge!("failover_dispatch_pending_switchbacks").set(pending as f64);
}

/// 调用指标聚合器
#[derive(Debug, Clone, Default)]
pub struct CallMetricsAggregator {
    /// 总调用数
    pub total_calls: u64,

    /// 成功数
    pub ok: u64,

    /// 端点原样错误数
    pub backend_failures: u64,

    /// 分发器失败数
    pub dispatch_failures: u64,

    /// 全部调用耗时 (毫秒)
    pub latency_stats: RunningStats,

    /// 按危险等级的耗时
    pub danger_latency: HashMap<DangerClass, RunningStats>,

    /// 按操作类型的失败次数
    pub failures_by_op: HashMap<OperationKind, u64>,
}

impl CallMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, kind: OperationKind, status: CallStatus, latency_ms: f64) {
        self.total_calls += 1;
        match status {
            CallStatus::Ok => self.ok += 1,
            CallStatus::BackendFailure => self.backend_failures += 1,
            CallStatus::DispatchFailure => self.dispatch_failures += 1,
        }
        if status != CallStatus::Ok {
            *self.failures_by_op.entry(kind).or_insert(0) += 1;
        }

        self.latency_stats.push(latency_ms);
        self.danger_latency
            .entry(kind.danger_class())
            .or_default()
            .push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let mut failures_by_op: Vec<_> = self
            .failures_by_op
            .iter()
            .map(|(kind, count)| (kind.as_str().to_string(), *count))
            .collect();
        failures_by_op.sort();

        MetricsSummary {
            total_calls: self.total_calls,
            ok: self.ok,
            backend_failures: self.backend_failures,
            dispatch_failures: self.dispatch_failures,
            success_rate: if self.total_calls > 0 {
                self.ok as f64 / self.total_calls as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            safe_latency_ms: self.danger_summary(DangerClass::Safe),
            medium_latency_ms: self.danger_summary(DangerClass::Medium),
            dangerous_latency_ms: self.danger_summary(DangerClass::Dangerous),
            failures_by_op,
        }
    }

    fn danger_summary(&self, class: DangerClass) -> StatsSummary {
        self.danger_latency
            .get(&class)
            .map(StatsSummary::from)
            .unwrap_or_default()
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_calls: u64,
    pub ok: u64,
    pub backend_failures: u64,
    pub dispatch_failures: u64,
    pub success_rate: f64,
    pub latency_ms: StatsSummary,
    pub safe_latency_ms: StatsSummary,
    pub medium_latency_ms: StatsSummary,
    pub dangerous_latency_ms: StatsSummary,
    /// 按操作名排序
    pub failures_by_op: Vec<(String, u64)>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Call Metrics Summary ===")?;
        writeln!(f, "Total calls: {}", self.total_calls)?;
        writeln!(f, "Succeeded: {} ({:.2}%)", self.ok, self.success_rate)?;
        writeln!(f, "Backend failures: {}", self.backend_failures)?;
        writeln!(f, "Dispatch failures: {}", self.dispatch_failures)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        writeln!(f, "  safe: {}", self.safe_latency_ms)?;
        writeln!(f, "  medium: {}", self.medium_latency_ms)?;
        writeln!(f, "  dangerous: {}", self.dangerous_latency_ms)?;

        if !self.failures_by_op.is_empty() {
            writeln!(f, "Failures by operation:")?;
            for (op, count) in &self.failures_by_op {
                writeln!(f, "  {}: {}", op, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
