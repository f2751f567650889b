//! Plan warm-up.
//!
//! Pre-builds invocation plans (and optionally runs probe dispatches) so the
//! first real dispatch of each request type skips plan construction.

use crate::{dispatcher::Dispatcher, erased::AnyRequest};
use courier_core::{DispatchError, Request};
use futures::future::BoxFuture;
use std::any::type_name;

/// How a warm-up run treats failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WarmUpPolicy {
    /// Log each failure, record it in the report and keep going.
    #[default]
    BestEffort,
    /// Stop at the first failure and return it.
    FailFast,
}

/// Outcome of a warm-up run.
#[derive(Debug, Default)]
pub struct WarmUpReport {
    warmed: Vec<&'static str>,
    failed: Vec<(&'static str, DispatchError)>,
}

impl WarmUpReport {
    /// Request types warmed successfully, in step order.
    pub fn warmed(&self) -> &[&'static str] {
        &self.warmed
    }

    /// Request types that failed, with their errors.
    pub fn failed(&self) -> &[(&'static str, DispatchError)] {
        &self.failed
    }

    /// Check whether every step succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Step<'d> {
    Plan {
        name: &'static str,
        build: fn(&Dispatcher) -> Result<(), DispatchError>,
    },
    Request(&'d dyn AnyRequest),
    Probe {
        name: &'static str,
        run: fn(&'d Dispatcher) -> BoxFuture<'d, Result<(), DispatchError>>,
    },
}

/// Builder for a warm-up run, created by [`Dispatcher::warm_up`].
///
/// # Example
///
/// ```rust,ignore
/// let report = dispatcher
///     .warm_up()
///     .plan::<Ping>()
///     .probe::<Health>()
///     .run()
///     .await?;
/// assert!(report.is_complete());
/// ```
pub struct WarmUp<'d> {
    dispatcher: &'d Dispatcher,
    steps: Vec<Step<'d>>,
    policy: WarmUpPolicy,
}

impl<'d> WarmUp<'d> {
    pub(crate) fn new(dispatcher: &'d Dispatcher) -> Self {
        Self {
            dispatcher,
            steps: Vec::new(),
            policy: WarmUpPolicy::default(),
        }
    }

    /// Build the plan for `R`. No handler is invoked.
    pub fn plan<R: Request>(mut self) -> Self {
        self.steps.push(Step::Plan {
            name: type_name::<R>(),
            build: |dispatcher| dispatcher.plan_for::<R>().map(drop).map_err(DispatchError::from),
        });
        self
    }

    /// Build the plan for a type-erased request. No handler is invoked.
    pub fn request(mut self, request: &'d dyn AnyRequest) -> Self {
        self.steps.push(Step::Request(request));
        self
    }

    /// Build the plan for `R` and dispatch `R::default()`, discarding the
    /// response.
    pub fn probe<R: Request + Default>(mut self) -> Self {
        self.steps.push(Step::Probe {
            name: type_name::<R>(),
            run: probe::<R>,
        });
        self
    }

    /// Set the failure policy.
    pub fn policy(mut self, policy: WarmUpPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every step in order.
    ///
    /// In [`WarmUpPolicy::FailFast`] mode the first failure is returned;
    /// otherwise failures are collected in the report.
    pub async fn run(self) -> Result<WarmUpReport, DispatchError> {
        let mut report = WarmUpReport::default();

        for step in self.steps {
            let (name, outcome) = match step {
                Step::Plan { name, build } => (name, build(self.dispatcher)),
                Step::Request(request) => (
                    request.request_name(),
                    self.dispatcher
                        .plan_for_dyn(request)
                        .map(drop)
                        .map_err(DispatchError::from),
                ),
                Step::Probe { name, run } => (name, run(self.dispatcher).await),
            };

            match outcome {
                Ok(()) => report.warmed.push(name),
                Err(error) => match self.policy {
                    WarmUpPolicy::FailFast => return Err(error),
                    WarmUpPolicy::BestEffort => {
                        tracing::warn!(request = name, %error, "Warm-up step failed");
                        report.failed.push((name, error));
                    }
                },
            }
        }

        tracing::debug!(
            warmed = report.warmed.len(),
            failed = report.failed.len(),
            "Warm-up finished"
        );
        Ok(report)
    }
}

fn probe<'d, R: Request + Default>(
    dispatcher: &'d Dispatcher,
) -> BoxFuture<'d, Result<(), DispatchError>> {
    Box::pin(async move { dispatcher.dispatch(R::default()).await.map(drop) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_std::{Registry, testing::CountingHandler};
    use std::{any::TypeId, sync::Arc};

    #[derive(Default)]
    struct Ping;

    impl Request for Ping {
        type Response = &'static str;
    }

    struct Orphan;

    impl Request for Orphan {
        type Response = ();
    }

    fn dispatcher(handler: &CountingHandler<&'static str>) -> Dispatcher {
        Dispatcher::new(Arc::new(
            Registry::builder()
                .handler::<Ping, _>(handler.clone())
                .build(),
        ))
    }

    #[tokio::test]
    async fn test_plan_step_invokes_nothing() {
        let handler = CountingHandler::new("Pong");
        let dispatcher = dispatcher(&handler);

        let report = dispatcher.warm_up().plan::<Ping>().run().await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.warmed().len(), 1);
        assert!(dispatcher.cached_plan(TypeId::of::<Ping>()).is_some());
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn test_probe_dispatches_default() {
        let handler = CountingHandler::new("Pong");
        let dispatcher = dispatcher(&handler);

        dispatcher.warm_up().probe::<Ping>().run().await.unwrap();
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_collects_failures() {
        let handler = CountingHandler::new("Pong");
        let dispatcher = dispatcher(&handler);

        let report = dispatcher
            .warm_up()
            .plan::<Orphan>()
            .request(&Ping)
            .run()
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failed().len(), 1);
        assert!(report.failed()[0].1.is_unresolved());
        assert_eq!(report.warmed().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_fast_stops() {
        let handler = CountingHandler::new("Pong");
        let dispatcher = dispatcher(&handler);

        let err = dispatcher
            .warm_up()
            .policy(WarmUpPolicy::FailFast)
            .plan::<Orphan>()
            .plan::<Ping>()
            .run()
            .await
            .unwrap_err();

        assert!(err.is_unresolved());
        assert!(dispatcher.cached_plan(TypeId::of::<Ping>()).is_none());
    }
}
