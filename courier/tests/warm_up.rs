//! Warm-up of invocation plans.

use courier::{
    AnyRequest, Registry, WarmUpPolicy,
    testing::{CountingHandler, FailingHandler, TestFailure},
};
use std::any::TypeId;

mod common;
use common::{Add, AddHandler, Orphan, Ping, dispatcher_over};

#[tokio::test]
async fn test_warm_up_builds_plans_without_invoking_handlers() {
    let handler = CountingHandler::new("Pong".to_string());
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Ping, _>(handler.clone())
            .handler::<Add, _>(AddHandler)
            .build(),
    );
    let add = Add { a: 1, b: 1 };
    let erased: &dyn AnyRequest = &add;

    let report = dispatcher
        .warm_up()
        .plan::<Ping>()
        .request(erased)
        .run()
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.warmed().len(), 2);
    assert!(dispatcher.cached_plan(TypeId::of::<Ping>()).is_some());
    assert!(dispatcher.cached_plan(TypeId::of::<Add>()).is_some());
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_probe_runs_the_pipeline() {
    let handler = CountingHandler::new("Pong".to_string());
    let dispatcher = dispatcher_over(Registry::builder().handler::<Ping, _>(handler.clone()).build());

    dispatcher.warm_up().probe::<Ping>().run().await.unwrap();

    assert_eq!(handler.calls(), 1);
    assert!(dispatcher.cached_plan(TypeId::of::<Ping>()).is_some());
}

#[tokio::test]
async fn test_warm_up_policies() {
    let dispatcher = dispatcher_over(Registry::builder().handler::<Add, _>(AddHandler).build());

    let report = dispatcher
        .warm_up()
        .plan::<Orphan>()
        .plan::<Add>()
        .run()
        .await
        .unwrap();
    assert_eq!(report.failed().len(), 1);
    assert!(report.failed()[0].0.contains("Orphan"));
    assert_eq!(report.warmed().len(), 1);

    let err = dispatcher
        .warm_up()
        .policy(WarmUpPolicy::FailFast)
        .plan::<Orphan>()
        .run()
        .await
        .unwrap_err();
    assert!(err.is_unresolved());
}

#[tokio::test]
async fn test_failing_probe_does_not_stop_best_effort_run() {
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Ping, _>(FailingHandler::new("boom"))
            .handler::<Add, _>(AddHandler)
            .build(),
    );

    let report = dispatcher
        .warm_up()
        .probe::<Ping>()
        .plan::<Add>()
        .run()
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.failed().len(), 1);
    let (name, error) = &report.failed()[0];
    assert!(name.contains("Ping"));
    assert_eq!(error.downcast_ref::<TestFailure>().unwrap().0, "boom");
    assert_eq!(report.warmed().len(), 1);
    assert!(report.warmed()[0].contains("Add"));

    // The plan was built before the dispatch failed.
    assert!(dispatcher.cached_plan(TypeId::of::<Ping>()).is_some());
}

#[tokio::test]
async fn test_failing_probe_stops_fail_fast_run() {
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Ping, _>(FailingHandler::new("boom"))
            .handler::<Add, _>(AddHandler)
            .build(),
    );

    let err = dispatcher
        .warm_up()
        .policy(WarmUpPolicy::FailFast)
        .probe::<Ping>()
        .plan::<Add>()
        .run()
        .await
        .unwrap_err();

    assert!(!err.is_unresolved());
    assert!(err.downcast_ref::<TestFailure>().is_some());
    assert!(dispatcher.cached_plan(TypeId::of::<Add>()).is_none());
}
