//! FailoverDispatcher - routes each call to one of two endpoints
//!
//! Eligible calls race the current primary against its budget and fall back
//! to the secondary; ineligible calls stay pinned to the current primary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{saturating_millis, Endpoint, FailoverConfig};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::classifier::FailoverPolicy;
use crate::error::{AttemptFailure, DispatchError, SecondaryCause};
use crate::lane::{Attempt, AttemptOutcome, ExecutionLane, LaneRole};
use crate::metrics::{DispatcherMetrics, MetricsSnapshot, RaceOutcome};
use crate::request::Request;
use crate::state::{Route, RoutingState, Transition};
use crate::switchback::{CooldownSchedule, SwitchbackScheduler};

/// Builder for creating a FailoverDispatcher
pub struct DispatcherBuilder<E> {
    primary: E,
    secondary: E,
    config: FailoverConfig,
}

impl<E> DispatcherBuilder<E>
where
    E: Endpoint + Send + Sync + 'static,
{
    /// Create a new builder with default failover config
    pub fn new(primary: E, secondary: E) -> Self {
        Self {
            primary,
            secondary,
            config: FailoverConfig::default(),
        }
    }

    /// Replace the whole failover config
    pub fn config(mut self, config: FailoverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn primary_timeout(mut self, timeout: Duration) -> Self {
        self.config.primary_timeout_ms = saturating_millis(timeout);
        self
    }

    pub fn secondary_timeout(mut self, timeout: Duration) -> Self {
        self.config.secondary_timeout_ms = Some(saturating_millis(timeout));
        self
    }

    pub fn failover_medium(mut self, enabled: bool) -> Self {
        self.config.failover_medium = enabled;
        self
    }

    pub fn failover_dangerous(mut self, enabled: bool) -> Self {
        self.config.failover_dangerous = enabled;
        self
    }

    /// Build the dispatcher and start its workers
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(
        name = "failover_dispatcher_build",
        skip(self),
        fields(primary = %self.primary.name(), secondary = %self.secondary.name())
    )]
    pub fn build(self) -> Result<FailoverDispatcher<E>, DispatchError> {
        self.config
            .validate()
            .map_err(|e| DispatchError::Config(e.to_string()))?;

        let schedule = CooldownSchedule::new(self.config.cooldowns())
            .ok_or_else(|| DispatchError::Config("cooldowns_ms must not be empty".to_string()))?;

        let metrics = Arc::new(DispatcherMetrics::new());
        let state = Arc::new(RoutingState::new(self.config.stable_reset()));
        let capacity = self.config.lane_capacity;

        let primary_lane = ExecutionLane::spawn(LaneRole::Primary, capacity, Arc::clone(&metrics));
        let secondary_lane =
            ExecutionLane::spawn(LaneRole::Secondary, capacity, Arc::clone(&metrics));
        let scheduler =
            SwitchbackScheduler::spawn(Arc::clone(&state), schedule, Arc::clone(&metrics));

        let names = [
            self.primary.name().to_string(),
            self.secondary.name().to_string(),
        ];
        let (shutdown_tx, _) = watch::channel(false);

        info!(
            primary_timeout_ms = saturating_millis(self.config.primary_timeout()),
            secondary_timeout_ms = saturating_millis(self.config.secondary_timeout()),
            failover_medium = self.config.failover_medium,
            failover_dangerous = self.config.failover_dangerous,
            "Failover dispatcher started"
        );

        Ok(FailoverDispatcher {
            endpoints: [Arc::new(self.primary), Arc::new(self.secondary)],
            names,
            policy: FailoverPolicy::from_config(&self.config),
            primary_timeout: self.config.primary_timeout(),
            secondary_timeout: self.config.secondary_timeout(),
            state,
            primary_lane,
            secondary_lane,
            scheduler,
            metrics,
            shutdown_tx,
            closed: AtomicBool::new(false),
        })
    }
}

/// Dispatcher over a primary/secondary endpoint pair
pub struct FailoverDispatcher<E> {
    endpoints: [Arc<E>; 2],
    names: [String; 2],
    policy: FailoverPolicy,
    primary_timeout: Duration,
    secondary_timeout: Duration,
    state: Arc<RoutingState>,
    primary_lane: ExecutionLane,
    secondary_lane: ExecutionLane,
    scheduler: SwitchbackScheduler,
    metrics: Arc<DispatcherMetrics>,
    /// Wakes callers blocked on an attempt when shutting down
    shutdown_tx: watch::Sender<bool>,
    closed: AtomicBool,
}

impl<E> FailoverDispatcher<E>
where
    E: Endpoint + Send + Sync + 'static,
{
    pub fn builder(primary: E, secondary: E) -> DispatcherBuilder<E> {
        DispatcherBuilder::new(primary, secondary)
    }

    /// Classify `request` and route it
    pub async fn execute<T>(&self, request: &Request<E, T>) -> Result<T, DispatchError>
    where
        T: Send + 'static,
    {
        let eligible = self.policy.is_eligible(request.danger());
        self.execute_with_failover(request, eligible).await
    }

    /// Route `request`, racing both endpoints when `eligible`
    #[instrument(
        name = "failover_dispatch",
        skip(self, request),
        fields(op = %request.label(), danger = %request.danger())
    )]
    pub async fn execute_with_failover<T>(
        &self,
        request: &Request<E, T>,
        eligible: bool,
    ) -> Result<T, DispatchError>
    where
        T: Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Shutdown);
        }

        let route = self.state.snapshot();
        if eligible {
            self.race(request, route).await
        } else {
            self.execute_pinned(request, route).await
        }
    }

    /// Whether the dispatcher is currently failed over
    pub fn is_switched(&self) -> bool {
        self.state.is_switched()
    }

    pub fn current_route(&self) -> Route {
        self.state.snapshot()
    }

    pub fn switch_count(&self) -> u64 {
        self.state.switch_count()
    }

    /// Switchback timers armed but not yet fired
    pub fn pending_switchbacks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn policy(&self) -> FailoverPolicy {
        self.policy
    }

    pub fn primary_timeout(&self) -> Duration {
        self.primary_timeout
    }

    pub fn secondary_timeout(&self) -> Duration {
        self.secondary_timeout
    }

    /// Endpoint by construction index (0 = configured primary)
    pub fn endpoint(&self, index: usize) -> &Arc<E> {
        &self.endpoints[index]
    }

    pub fn endpoint_name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop lanes and scheduler, then close both endpoints
    ///
    /// Both closes are attempted; the first close error is returned.
    #[instrument(name = "failover_dispatcher_shutdown", skip(self))]
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        info!("Failover dispatcher shutting down");
        self.shutdown_tx.send_replace(true);

        self.primary_lane.shutdown().await;
        self.secondary_lane.shutdown().await;
        self.scheduler.shutdown().await;

        let mut first_error = None;
        for (endpoint, name) in self.endpoints.iter().zip(&self.names) {
            if let Err(e) = endpoint.close().await {
                error!(endpoint = %name, error = %e, "Endpoint close failed");
                first_error.get_or_insert(DispatchError::EndpointClose {
                    endpoint: name.clone(),
                    source: e,
                });
            }
        }

        info!("Failover dispatcher shutdown complete");
        first_error.map_or(Ok(()), Err)
    }

    /// Primary-only path: no budget, failures surface verbatim
    async fn execute_pinned<T>(&self, request: &Request<E, T>, route: Route) -> Result<T, DispatchError>
    where
        T: Send + 'static,
    {
        let endpoint = Arc::clone(&self.endpoints[route.primary]);
        let mut attempt = self.primary_lane.submit(request, endpoint)?;
        debug!(endpoint = %self.names[route.primary], attempt = attempt.id(), "Pinned attempt submitted");

        match self.wait(&mut attempt, None).await {
            Some(AttemptOutcome::Completed(value)) => {
                self.metrics.record(RaceOutcome::PrimarySuccess);
                Ok(value)
            }
            Some(AttemptOutcome::Failed(e)) => {
                self.metrics.inc_backend_failures();
                Err(DispatchError::Backend(e))
            }
            // No budget on this path, so only shutdown ends the wait early
            Some(AttemptOutcome::TimedOut(_)) | Some(AttemptOutcome::Dropped) | None => {
                attempt.cancel();
                Err(self.interrupted(LaneRole::Primary))
            }
        }
    }

    /// Primary under its budget, then secondary under its own
    async fn race<T>(&self, request: &Request<E, T>, route: Route) -> Result<T, DispatchError>
    where
        T: Send + 'static,
    {
        let primary_name = &self.names[route.primary];
        let endpoint = Arc::clone(&self.endpoints[route.primary]);

        let primary_failure = match self.primary_lane.submit(request, endpoint) {
            Err(e) => AttemptFailure::Lane(e),
            Ok(mut attempt) => match self.wait(&mut attempt, Some(self.primary_timeout)).await {
                Some(AttemptOutcome::Completed(value)) => {
                    self.metrics.record(RaceOutcome::PrimarySuccess);
                    return Ok(value);
                }
                Some(AttemptOutcome::Failed(source)) => {
                    attempt.cancel();
                    AttemptFailure::Backend {
                        endpoint: primary_name.clone(),
                        source,
                    }
                }
                Some(AttemptOutcome::TimedOut(budget)) => {
                    attempt.cancel();
                    AttemptFailure::Timeout {
                        endpoint: primary_name.clone(),
                        budget,
                    }
                }
                Some(AttemptOutcome::Dropped) | None => {
                    attempt.cancel();
                    return Err(self.interrupted(LaneRole::Primary));
                }
            },
        };

        warn!(
            endpoint = %primary_name,
            reason = %primary_failure,
            "Primary attempt abandoned, escalating to secondary"
        );
        self.metrics.inc_escalations();
        if let Some(transition) = self.state.fail_over() {
            self.on_transition(transition);
        }

        let secondary_name = &self.names[route.secondary];
        let endpoint = Arc::clone(&self.endpoints[route.secondary]);
        let mut attempt = match self.secondary_lane.submit(request, endpoint) {
            Ok(attempt) => attempt,
            Err(e) => return Err(self.dual_failure(primary_failure, SecondaryCause::Lane(e))),
        };

        match self.wait(&mut attempt, Some(self.secondary_timeout)).await {
            Some(AttemptOutcome::Completed(value)) => {
                self.metrics.record(RaceOutcome::SecondarySuccess);
                Ok(value)
            }
            Some(AttemptOutcome::Failed(source)) => Err(self.dual_failure(
                primary_failure,
                SecondaryCause::Failed {
                    endpoint: secondary_name.clone(),
                    source,
                },
            )),
            Some(AttemptOutcome::TimedOut(waited)) => {
                attempt.cancel();
                Err(self.dual_failure(
                    primary_failure,
                    SecondaryCause::Unresponsive {
                        endpoint: secondary_name.clone(),
                        waited,
                    },
                ))
            }
            Some(AttemptOutcome::Dropped) | None => {
                attempt.cancel();
                Err(self.interrupted(LaneRole::Secondary))
            }
        }
    }

    /// Wait on an attempt; `None` means shutdown interrupted the wait
    async fn wait<T>(
        &self,
        attempt: &mut Attempt<T>,
        budget: Option<Duration>,
    ) -> Option<AttemptOutcome<T>> {
        let mut shutdown = self.shutdown_tx.subscribe();
        if *shutdown.borrow_and_update() {
            return None;
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => None,
            outcome = attempt.settle(budget) => Some(outcome),
        }
    }

    fn on_transition(&self, transition: Transition) {
        match transition {
            Transition::FailedOver {
                primary,
                switch_count,
            } => {
                let cooldown = self.scheduler.arm(switch_count);
                self.metrics.record_failover(cooldown);
                info!(
                    from = %self.names[1 - primary],
                    to = %self.names[primary],
                    switch_count,
                    cooldown_ms = saturating_millis(cooldown),
                    "Failed over, switchback armed"
                );
            }
            Transition::SwitchedBack { primary } => {
                self.metrics.inc_switchbacks();
                info!(to = %self.names[primary], "Switched back");
            }
        }
    }

    fn dual_failure(&self, primary: AttemptFailure, cause: SecondaryCause) -> DispatchError {
        self.metrics.record(RaceOutcome::DualFailure);
        error!(primary = %primary, secondary = %cause, "Both endpoints failed");
        DispatchError::DualFailure { primary, cause }
    }

    fn interrupted(&self, lane: LaneRole) -> DispatchError {
        self.metrics.record(RaceOutcome::InterruptedFailure);
        warn!(lane = %lane, "Wait interrupted");
        DispatchError::Interrupted { lane }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, DangerClass};
    use std::sync::atomic::AtomicU32;
    use tokio::time::sleep;

    /// Mock endpoint for testing
    struct MockEndpoint {
        name: String,
        tag: u32,
        delay_ms: u64,
        should_fail: bool,
        calls: AtomicU32,
        close_fails: bool,
        closed: AtomicBool,
    }

    impl MockEndpoint {
        fn new(name: &str, tag: u32, delay_ms: u64) -> Self {
            Self {
                name: name.to_string(),
                tag,
                delay_ms,
                should_fail: false,
                calls: AtomicU32::new(0),
                close_fails: false,
                closed: AtomicBool::new(false),
            }
        }

        fn failing(mut self) -> Self {
            self.should_fail = true;
            self
        }

        fn failing_close(mut self) -> Self {
            self.close_fails = true;
            self
        }
    }

    impl Endpoint for MockEndpoint {
        fn name(&self) -> &str {
            &self.name
        }

        async fn close(&self) -> Result<(), ContractError> {
            self.closed.store(true, Ordering::SeqCst);
            if self.close_fails {
                return Err(ContractError::Other("close refused".to_string()));
            }
            Ok(())
        }
    }

    fn tag_request(danger: DangerClass) -> Request<MockEndpoint, u32> {
        Request::new(danger, |endpoint: Arc<MockEndpoint>| async move {
            endpoint.calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(endpoint.delay_ms)).await;
            if endpoint.should_fail {
                return Err(ContractError::endpoint_unavailable(&endpoint.name, "mock failure"));
            }
            Ok(endpoint.tag)
        })
    }

    fn build(primary: MockEndpoint, secondary: MockEndpoint) -> FailoverDispatcher<MockEndpoint> {
        FailoverDispatcher::builder(primary, secondary)
            .primary_timeout(Duration::from_millis(20))
            .secondary_timeout(Duration::from_millis(1000))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_primary_success_leaves_state() {
        let dispatcher = build(MockEndpoint::new("a", 0, 1), MockEndpoint::new("b", 1, 1));

        let result = dispatcher.execute(&tag_request(DangerClass::Safe)).await.unwrap();
        assert_eq!(result, 0);
        assert!(!dispatcher.is_switched());
        assert_eq!(dispatcher.metrics().primary_successes, 1);

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_primary_timeout_fails_over_once() {
        let dispatcher = build(MockEndpoint::new("a", 0, 200), MockEndpoint::new("b", 1, 0));

        let result = dispatcher.execute(&tag_request(DangerClass::Safe)).await.unwrap();
        assert_eq!(result, 1);
        assert!(dispatcher.is_switched());
        assert_eq!(dispatcher.switch_count(), 1);
        assert_eq!(dispatcher.pending_switchbacks(), 1);
        assert_eq!(dispatcher.current_route().primary, 1);

        let snapshot = dispatcher.metrics();
        assert_eq!(snapshot.failovers, 1);
        assert_eq!(snapshot.last_cooldown_ms, 20_000);
        assert_eq!(snapshot.secondary_successes, 1);

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_primary_failure_escalates() {
        let dispatcher = build(
            MockEndpoint::new("a", 0, 0).failing(),
            MockEndpoint::new("b", 1, 0),
        );

        let result = dispatcher.execute(&tag_request(DangerClass::Safe)).await.unwrap();
        assert_eq!(result, 1);
        assert!(dispatcher.is_switched());

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_escalation_while_switched_skips_toggle() {
        let dispatcher = build(
            MockEndpoint::new("a", 0, 0).failing(),
            MockEndpoint::new("b", 1, 0).failing(),
        );
        let request = tag_request(DangerClass::Safe);

        // First race fails over to "b"; second race fails on "b" then "a"
        assert!(dispatcher.execute(&request).await.unwrap_err().is_dual_failure());
        assert!(dispatcher.execute(&request).await.unwrap_err().is_dual_failure());

        assert!(dispatcher.is_switched());
        assert_eq!(dispatcher.switch_count(), 1);
        assert_eq!(dispatcher.pending_switchbacks(), 1);
        assert_eq!(dispatcher.metrics().escalations, 2);

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_secondary_failure_is_dual_failure() {
        let dispatcher = build(
            MockEndpoint::new("a", 0, 0).failing(),
            MockEndpoint::new("b", 1, 0).failing(),
        );

        let err = dispatcher
            .execute(&tag_request(DangerClass::Safe))
            .await
            .unwrap_err();
        match &err {
            DispatchError::DualFailure {
                cause: SecondaryCause::Failed { endpoint, .. },
                ..
            } => assert_eq!(endpoint, "b"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("primary and secondary"));

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_secondary_timeout_is_unresponsive() {
        let dispatcher = FailoverDispatcher::builder(
            MockEndpoint::new("a", 0, 300),
            MockEndpoint::new("b", 1, 300),
        )
        .primary_timeout(Duration::from_millis(10))
        .secondary_timeout(Duration::from_millis(5))
        .build()
        .unwrap();

        let err = dispatcher
            .execute(&tag_request(DangerClass::Safe))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::DualFailure {
                cause: SecondaryCause::Unresponsive { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("both primary and secondary unresponsive"));

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_dangerous_stays_on_primary() {
        let dispatcher = build(
            MockEndpoint::new("a", 0, 0).failing(),
            MockEndpoint::new("b", 1, 0),
        );

        let err = dispatcher
            .execute(&tag_request(DangerClass::Dangerous))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Backend(_)));
        assert!(!err.is_dispatcher_failure());
        assert!(!dispatcher.is_switched());
        assert_eq!(dispatcher.endpoint(1).calls.load(Ordering::SeqCst), 0);

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_pinned_path_has_no_budget() {
        let dispatcher = build(MockEndpoint::new("a", 0, 60), MockEndpoint::new("b", 1, 0));

        let result = dispatcher
            .execute(&tag_request(DangerClass::Medium))
            .await
            .unwrap();
        assert_eq!(result, 0);
        assert!(!dispatcher.is_switched());

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_medium_flag_enables_failover() {
        let dispatcher = FailoverDispatcher::builder(
            MockEndpoint::new("a", 0, 0).failing(),
            MockEndpoint::new("b", 1, 0),
        )
        .failover_medium(true)
        .build()
        .unwrap();

        let result = dispatcher
            .execute(&tag_request(DangerClass::Medium))
            .await
            .unwrap();
        assert_eq!(result, 1);

        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_waiting_caller() {
        let dispatcher = Arc::new(build(
            MockEndpoint::new("a", 0, 5_000),
            MockEndpoint::new("b", 1, 0),
        ));

        let caller = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .execute(&tag_request(DangerClass::Dangerous))
                    .await
            })
        };
        sleep(Duration::from_millis(20)).await;

        dispatcher.shutdown().await.unwrap();
        let err = caller.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Interrupted {
                lane: LaneRole::Primary
            }
        ));
        assert_eq!(dispatcher.metrics().interruptions, 1);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_secondary_wait() {
        let dispatcher = Arc::new(build(
            MockEndpoint::new("a", 0, 5_000),
            MockEndpoint::new("b", 1, 5_000),
        ));

        let caller = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.execute(&tag_request(DangerClass::Safe)).await })
        };
        // Primary budget is 20ms; the caller is now waiting on the secondary
        sleep(Duration::from_millis(100)).await;
        assert!(dispatcher.is_switched());

        dispatcher.shutdown().await.unwrap();
        let err = caller.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Interrupted {
                lane: LaneRole::Secondary
            }
        ));
        let metrics = dispatcher.metrics();
        assert_eq!(metrics.interruptions, 1);
        assert_eq!(metrics.dual_failures, 0);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_rejects_calls() {
        let dispatcher = build(MockEndpoint::new("a", 0, 0), MockEndpoint::new("b", 1, 0));

        dispatcher.shutdown().await.unwrap();
        dispatcher.shutdown().await.unwrap();

        let err = dispatcher
            .execute(&tag_request(DangerClass::Safe))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Shutdown));
    }

    #[tokio::test]
    async fn test_shutdown_closes_second_endpoint_after_first_fails() {
        let dispatcher = build(
            MockEndpoint::new("a", 0, 0).failing_close(),
            MockEndpoint::new("b", 1, 0),
        );

        let err = dispatcher.shutdown().await.unwrap_err();
        assert!(matches!(err, DispatchError::EndpointClose { ref endpoint, .. } if endpoint == "a"));
        assert!(dispatcher.endpoint(0).closed.load(Ordering::SeqCst));
        assert!(dispatcher.endpoint(1).closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_build_rejects_empty_cooldowns() {
        let config = FailoverConfig {
            cooldowns_ms: vec![],
            ..Default::default()
        };
        let result = FailoverDispatcher::builder(
            MockEndpoint::new("a", 0, 0),
            MockEndpoint::new("b", 1, 0),
        )
        .config(config)
        .build();
        assert!(matches!(result, Err(DispatchError::Config(_))));
    }

    #[tokio::test]
    async fn test_huge_timeout_saturates() {
        let dispatcher = FailoverDispatcher::builder(
            MockEndpoint::new("a", 0, 0),
            MockEndpoint::new("b", 1, 0),
        )
        .secondary_timeout(Duration::MAX)
        .build()
        .unwrap();

        assert_eq!(dispatcher.secondary_timeout(), Duration::from_millis(u64::MAX));
        dispatcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_default_secondary_timeout_is_fifteen_times() {
        let dispatcher = FailoverDispatcher::builder(
            MockEndpoint::new("a", 0, 0),
            MockEndpoint::new("b", 1, 0),
        )
        .build()
        .unwrap();
        assert_eq!(dispatcher.primary_timeout(), Duration::from_millis(700));
        assert_eq!(dispatcher.secondary_timeout(), Duration::from_millis(10_500));

        dispatcher.shutdown().await.unwrap();
    }
}
