//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 故障转移场景测试（超时、双端失败、切回冷却）
//! - 配置加载 -> 分发器 -> 内存端点的 e2e 测试

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ContractError, DangerClass, Endpoint};
    use dispatcher::Request;

    /// Endpoint answering with a fixed tag after a fixed delay
    pub struct TaggedEndpoint {
        name: String,
        tag: u32,
        delay: Duration,
        failing: AtomicBool,
        calls: AtomicU64,
        closed: AtomicBool,
    }

    impl TaggedEndpoint {
        pub fn new(name: &str, tag: u32, delay_ms: u64) -> Self {
            Self {
                name: name.to_string(),
                tag,
                delay: Duration::from_millis(delay_ms),
                failing: AtomicBool::new(false),
                calls: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }
        }

        pub fn failing(self) -> Self {
            self.failing.store(true, Ordering::SeqCst);
            self
        }

        pub fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }

        pub async fn answer(&self) -> Result<u32, ContractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(ContractError::endpoint_unavailable(&self.name, "down"));
            }
            Ok(self.tag)
        }
    }

    impl Endpoint for TaggedEndpoint {
        fn name(&self) -> &str {
            &self.name
        }

        async fn close(&self) -> Result<(), ContractError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    pub fn tag_request(danger: DangerClass) -> Request<TaggedEndpoint, u32> {
        Request::new(danger, |endpoint: Arc<TaggedEndpoint>| async move {
            endpoint.answer().await
        })
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{DangerClass, OperationKind};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_idempotent_writes_are_safe() {
        assert_eq!(OperationKind::UpsertById.danger_class(), DangerClass::Safe);
        assert_eq!(OperationKind::Insert.danger_class(), DangerClass::Medium);
        assert_eq!(OperationKind::Increment.danger_class(), DangerClass::Dangerous);

        let safe = OperationKind::ALL
            .iter()
            .filter(|kind| kind.danger_class() == DangerClass::Safe)
            .count();
        assert_eq!(safe, 8);
    }
}

#[cfg(test)]
mod failover_tests {
    use std::time::Duration;

    use contracts::DangerClass;
    use dispatcher::{DispatchError, FailoverDispatcher, SecondaryCause};

    use crate::support::{tag_request, TaggedEndpoint};

    /// 主端点在预算内应答：所有调用都由主端点完成，不发生切换
    #[tokio::test(start_paused = true)]
    async fn test_fast_primary_never_switches() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("primary", 0, 5),
            TaggedEndpoint::new("secondary", 1, 100),
        )
        .primary_timeout(Duration::from_millis(20))
        .secondary_timeout(Duration::from_millis(1000))
        .build()
        .unwrap();

        let request = tag_request(DangerClass::Safe);
        for _ in 0..100 {
            assert_eq!(dispatcher.execute(&request).await.unwrap(), 0);
        }

        assert!(!dispatcher.is_switched());
        assert_eq!(dispatcher.switch_count(), 0);
        assert_eq!(dispatcher.endpoint(1).calls(), 0);
        assert_eq!(dispatcher.metrics().primary_successes, 100);

        dispatcher.shutdown().await.unwrap();
    }

    /// 主端点慢于预算：第一次调用故障转移，之后由新主端点直接应答
    #[tokio::test(start_paused = true)]
    async fn test_slow_primary_fails_over() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("primary", 0, 40),
            TaggedEndpoint::new("secondary", 1, 0),
        )
        .primary_timeout(Duration::from_millis(20))
        .secondary_timeout(Duration::from_millis(1000))
        .build()
        .unwrap();

        let request = tag_request(DangerClass::Safe);
        let mut tags = [0u32; 2];
        for _ in 0..100 {
            let tag = dispatcher.execute(&request).await.unwrap();
            tags[tag as usize] += 1;
        }

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.dual_failures, 0);
        assert_eq!(tags, [0, 100]);
        assert_eq!(metrics.failovers, 1);
        assert_eq!(metrics.escalations, 1);
        assert!(dispatcher.is_switched());
        assert_eq!(dispatcher.current_route().primary, 1);
        assert_eq!(dispatcher.pending_switchbacks(), 1);

        dispatcher.shutdown().await.unwrap();
        assert_eq!(dispatcher.pending_switchbacks(), 0);
    }

    /// 主端点挂起：被放弃的调用不占用执行通道，后续调用由新主端点完成
    #[tokio::test(start_paused = true)]
    async fn test_hung_primary_does_not_block_new_primary() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("a", 0, 60_000),
            TaggedEndpoint::new("b", 1, 0),
        )
        .primary_timeout(Duration::from_millis(20))
        .secondary_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

        let request = tag_request(DangerClass::Safe);
        for _ in 0..5 {
            assert_eq!(dispatcher.execute(&request).await.unwrap(), 1);
        }

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.dual_failures, 0);
        assert_eq!(metrics.escalations, 1);
        assert_eq!(metrics.primary_successes, 4);
        assert_eq!(dispatcher.endpoint(0).calls(), 1);
        assert_eq!(dispatcher.current_route().primary, 1);

        dispatcher.shutdown().await.unwrap();
    }

    /// 两端都超过各自预算：返回双端失败，且状态切换一次
    #[tokio::test(start_paused = true)]
    async fn test_both_unresponsive() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("primary", 0, 1050),
            TaggedEndpoint::new("secondary", 1, 1050),
        )
        .primary_timeout(Duration::from_millis(20))
        .secondary_timeout(Duration::from_millis(5))
        .build()
        .unwrap();

        let err = dispatcher
            .execute(&tag_request(DangerClass::Safe))
            .await
            .unwrap_err();

        assert!(err.is_dual_failure());
        assert!(err.is_dispatcher_failure());
        match &err {
            DispatchError::DualFailure { cause, .. } => {
                assert!(matches!(cause, SecondaryCause::Unresponsive { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("both primary and secondary"));
        assert_eq!(dispatcher.metrics().dual_failures, 1);
        assert_eq!(dispatcher.switch_count(), 1);

        dispatcher.shutdown().await.unwrap();
    }

    /// 主端点出错（非超时）同样触发故障转移
    #[tokio::test(start_paused = true)]
    async fn test_primary_error_escalates() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("primary", 0, 1).failing(),
            TaggedEndpoint::new("secondary", 1, 1),
        )
        .primary_timeout(Duration::from_millis(20))
        .build()
        .unwrap();

        let tag = dispatcher.execute(&tag_request(DangerClass::Safe)).await.unwrap();
        assert_eq!(tag, 1);
        assert!(dispatcher.is_switched());

        dispatcher.shutdown().await.unwrap();
    }

    /// 危险操作不参与故障转移：主端点错误原样返回
    #[tokio::test(start_paused = true)]
    async fn test_dangerous_error_surfaces_verbatim() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("primary", 0, 1).failing(),
            TaggedEndpoint::new("secondary", 1, 1),
        )
        .build()
        .unwrap();

        let err = dispatcher
            .execute(&tag_request(DangerClass::Dangerous))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Backend(_)));
        assert!(!err.is_dispatcher_failure());
        assert!(!dispatcher.is_switched());
        assert_eq!(dispatcher.endpoint(1).calls(), 0);

        dispatcher.shutdown().await.unwrap();
    }

    /// 并发调用同时超时：只产生一次状态切换与一个切回定时器
    #[tokio::test(start_paused = true)]
    async fn test_concurrent_escalations_toggle_once() {
        let dispatcher = std::sync::Arc::new(
            FailoverDispatcher::builder(
                TaggedEndpoint::new("primary", 0, 500),
                TaggedEndpoint::new("secondary", 1, 0),
            )
            .primary_timeout(Duration::from_millis(20))
            .build()
            .unwrap(),
        );

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let dispatcher = std::sync::Arc::clone(&dispatcher);
            tasks.spawn(async move { dispatcher.execute(&tag_request(DangerClass::Safe)).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap(), 1);
        }

        assert_eq!(dispatcher.switch_count(), 1);
        assert_eq!(dispatcher.pending_switchbacks(), 1);
        assert_eq!(dispatcher.metrics().escalations, 8);

        dispatcher.shutdown().await.unwrap();
    }

    /// 切回冷却按 20s / 60s / 120s 递增，之后保持 120s
    #[tokio::test(start_paused = true)]
    async fn test_cooldown_escalates_across_failovers() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("primary", 0, 1050),
            TaggedEndpoint::new("secondary", 1, 0),
        )
        .primary_timeout(Duration::from_millis(20))
        .secondary_timeout(Duration::from_millis(1000))
        .build()
        .unwrap();

        let request = tag_request(DangerClass::Safe);
        for expected in [20_000u64, 60_000, 120_000, 120_000] {
            assert_eq!(dispatcher.execute(&request).await.unwrap(), 1);
            assert!(dispatcher.is_switched());
            assert_eq!(dispatcher.metrics().last_cooldown_ms, expected);

            // Still switched just before the cooldown elapses
            tokio::time::sleep(Duration::from_millis(expected - 100)).await;
            assert!(dispatcher.is_switched());

            tokio::time::sleep(Duration::from_millis(200)).await;
            assert!(!dispatcher.is_switched());
            assert_eq!(dispatcher.current_route().primary, 0);
            assert_eq!(dispatcher.pending_switchbacks(), 0);
        }

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.failovers, 4);
        assert_eq!(metrics.switchbacks, 4);
        assert_eq!(dispatcher.switch_count(), 4);

        dispatcher.shutdown().await.unwrap();
    }

    /// 关闭后两个端点都被关闭，后续调用被拒绝
    #[tokio::test]
    async fn test_shutdown_closes_endpoints() {
        let dispatcher = FailoverDispatcher::builder(
            TaggedEndpoint::new("primary", 0, 0),
            TaggedEndpoint::new("secondary", 1, 0),
        )
        .build()
        .unwrap();

        dispatcher.shutdown().await.unwrap();
        assert!(dispatcher.endpoint(0).is_closed());
        assert!(dispatcher.endpoint(1).is_closed());

        let err = dispatcher
            .execute(&tag_request(DangerClass::Safe))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Shutdown));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::OperationKind;
    use dispatcher::{FailoverDispatcher, MemoryEndpoint, Request};

    const BLUEPRINT: &str = r#"
[failover]
primary_timeout_ms = 20
secondary_timeout_ms = 1000

[primary]
name = "mem-a"
latency_ms = 1

[secondary]
name = "mem-b"
"#;

    fn build() -> FailoverDispatcher<MemoryEndpoint> {
        let blueprint = ConfigLoader::load_from_str(BLUEPRINT, ConfigFormat::Toml).unwrap();
        FailoverDispatcher::builder(
            MemoryEndpoint::from_config(&blueprint.primary),
            MemoryEndpoint::from_config(&blueprint.secondary),
        )
        .config(blueprint.failover)
        .build()
        .unwrap()
    }

    /// End-to-end: ConfigLoader -> FailoverDispatcher -> MemoryEndpoint
    #[tokio::test(start_paused = true)]
    async fn test_e2e_memory_endpoints() {
        let dispatcher = build();

        let put = Request::for_kind(OperationKind::UpsertById, |endpoint: Arc<MemoryEndpoint>| async move {
            endpoint.put("user:1", Bytes::from_static(b"alice")).await
        });
        let get = Request::for_kind(OperationKind::FindOne, |endpoint: Arc<MemoryEndpoint>| async move {
            endpoint.get("user:1").await
        });
        let incr = Request::for_kind(OperationKind::Increment, |endpoint: Arc<MemoryEndpoint>| async move {
            endpoint.increment("visits", 1).await
        });

        assert!(dispatcher.execute(&put).await.unwrap().is_none());
        assert_eq!(
            dispatcher.execute(&get).await.unwrap().as_deref(),
            Some(&b"alice"[..])
        );
        for expected in 1..=3 {
            assert_eq!(dispatcher.execute(&incr).await.unwrap(), expected);
        }

        assert_eq!(dispatcher.endpoint(0).applied_ops(), 5);
        assert_eq!(dispatcher.endpoint(1).applied_ops(), 0);

        dispatcher.shutdown().await.unwrap();
        assert!(dispatcher.endpoint(0).is_closed());
        assert!(dispatcher.endpoint(1).is_closed());
    }

    /// 读操作在主端点宕机时转移到备端点；写操作留在当前主端点
    #[tokio::test(start_paused = true)]
    async fn test_e2e_outage_moves_reads() {
        let dispatcher = build();
        dispatcher.endpoint(0).set_failing(true);

        let get = Request::for_kind(OperationKind::Find, |endpoint: Arc<MemoryEndpoint>| async move {
            endpoint.get("k").await
        });
        assert!(dispatcher.execute(&get).await.unwrap().is_none());
        assert!(dispatcher.is_switched());

        // Pinned writes follow the current primary, which is now mem-b
        let insert = Request::for_kind(OperationKind::Insert, |endpoint: Arc<MemoryEndpoint>| async move {
            endpoint.insert("k", Bytes::from_static(b"v")).await
        });
        dispatcher.execute(&insert).await.unwrap();
        assert_eq!(dispatcher.endpoint(1).len(), 1);
        assert!(dispatcher.endpoint(0).is_empty());

        // Switchback returns writes to mem-a
        dispatcher.endpoint(0).set_failing(false);
        tokio::time::sleep(Duration::from_millis(20_100)).await;
        assert!(!dispatcher.is_switched());

        dispatcher.execute(&insert).await.unwrap();
        assert_eq!(dispatcher.endpoint(0).len(), 1);

        dispatcher.shutdown().await.unwrap();
    }
}
