//! Plan construction and memoization.

use courier::{
    AnyRequest, CancellationToken, DispatchError, Dispatcher, PlanPath, Registry,
    testing::{CallLog, CountingHandler, CountingProvider, FlagBehavior, RecordingBehavior},
};
use std::{any::TypeId, sync::Arc};

mod common;
use common::{Add, AddHandler, MutableProvider, Orphan, Ping, PingHandler, dispatcher_over};

fn counted(registry: Registry) -> (Arc<CountingProvider<Registry>>, Dispatcher) {
    let provider = Arc::new(CountingProvider::new(registry));
    let dispatcher = Dispatcher::new(provider.clone());
    (provider, dispatcher)
}

#[tokio::test]
async fn test_plan_built_once_per_request_type() {
    let (provider, dispatcher) = counted(
        Registry::builder()
            .handler::<Ping, _>(PingHandler)
            .behavior::<Ping, _>(RecordingBehavior::new("b0", &CallLog::new()))
            .build(),
    );

    dispatcher.dispatch(Ping).await.unwrap();
    let after_first = provider.build_queries();
    assert!(after_first > 0);

    for _ in 0..10 {
        dispatcher.dispatch(Ping).await.unwrap();
    }

    assert_eq!(provider.build_queries(), after_first);
    assert_eq!(dispatcher.cache().len(), 1);
}

#[tokio::test]
async fn test_instances_resolved_on_every_call() {
    let (provider, dispatcher) = counted(
        Registry::builder()
            .handler::<Ping, _>(PingHandler)
            .behavior::<Ping, _>(RecordingBehavior::new("b0", &CallLog::new()))
            .build(),
    );

    for _ in 0..3 {
        dispatcher.dispatch(Ping).await.unwrap();
    }

    assert_eq!(provider.resolves(), 3);
    assert_eq!(provider.resolve_alls(), 3);
}

#[tokio::test]
async fn test_plan_is_shared() {
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Ping, _>(PingHandler)
            .handler::<Add, _>(AddHandler)
            .build(),
    );

    let first = dispatcher.plan_for::<Ping>().unwrap();
    dispatcher.dispatch(Ping).await.unwrap();
    let second = dispatcher.plan_for::<Ping>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.path(), PlanPath::Direct);
    assert_ne!(*first, *dispatcher.plan_for::<Add>().unwrap());
}

#[tokio::test]
async fn test_shared_cache_across_registries_runs_their_behaviors() {
    let plain = dispatcher_over(Registry::builder().handler::<Ping, _>(PingHandler).build());
    let audit = FlagBehavior::new();
    let audited = Dispatcher::builder()
        .registry(
            Registry::builder()
                .handler::<Ping, _>(PingHandler)
                .behavior::<Ping, _>(audit.clone())
                .build(),
        )
        .shared_cache(Arc::clone(plain.cache()))
        .build()
        .unwrap();

    assert_eq!(plain.dispatch(Ping).await.unwrap(), "Pong");
    assert!(!audit.was_called());

    assert_eq!(audited.dispatch(Ping).await.unwrap(), "Pong");
    assert!(audit.was_called());
    assert_eq!(plain.cache().len(), 2);
}

#[tokio::test]
async fn test_failed_build_is_not_cached() {
    let provider = Arc::new(MutableProvider::new());
    let dispatcher = Dispatcher::new(provider.clone());

    assert!(dispatcher.dispatch(Ping).await.unwrap_err().is_unresolved());
    assert!(dispatcher.cached_plan(TypeId::of::<Ping>()).is_none());

    provider.add_handler::<Ping, _>(PingHandler);
    assert_eq!(dispatcher.dispatch(Ping).await.unwrap(), "Pong");
    assert!(dispatcher.cached_plan(TypeId::of::<Ping>()).is_some());
}

#[tokio::test]
async fn test_uncached_path_matches_cached_path() {
    let log = CallLog::new();
    let dispatcher = dispatcher_over(
        Registry::builder()
            .behavior::<Ping, _>(RecordingBehavior::new("b0", &log))
            .behavior::<Ping, _>(RecordingBehavior::new("b1", &log))
            .handler::<Ping, _>(CountingHandler::new("Pong".to_string()).with_log(&log))
            .build(),
    );

    let uncached = dispatcher
        .dispatch_uncached(Ping, CancellationToken::new())
        .await
        .unwrap();
    let uncached_log = log.entries();
    assert!(dispatcher.cache().is_empty());

    log.clear();
    let cached = dispatcher.dispatch(Ping).await.unwrap();

    assert_eq!(uncached, cached);
    assert_eq!(uncached_log, log.entries());

    let err = dispatcher
        .dispatch_uncached(Orphan, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_unresolved());
}

#[tokio::test]
async fn test_dyn_path_matches_typed_path() {
    let log = CallLog::new();
    let dispatcher = dispatcher_over(
        Registry::builder()
            .behavior::<Add, _>(RecordingBehavior::new("b0", &log))
            .handler::<Add, _>(AddHandler)
            .build(),
    );

    let request: Box<dyn AnyRequest> = Box::new(Add { a: 2, b: 3 });
    assert_eq!(request.request_type(), TypeId::of::<Add>());

    let response = dispatcher
        .dispatch_dyn(request, CancellationToken::new())
        .await
        .unwrap();
    assert!(response.is::<i64>());
    let dyn_result = response.downcast::<i64>().unwrap();
    let dyn_log = log.entries();

    log.clear();
    let typed_result = dispatcher.dispatch(Add { a: 2, b: 3 }).await.unwrap();

    assert_eq!(dyn_result, typed_result);
    assert_eq!(dyn_log, log.entries());
    assert_eq!(dispatcher.cache().len(), 1);
}

#[tokio::test]
async fn test_dyn_response_wrong_type() {
    let dispatcher = dispatcher_over(Registry::builder().handler::<Ping, _>(PingHandler).build());

    let response = dispatcher
        .dispatch_dyn(Box::new(Ping), CancellationToken::new())
        .await
        .unwrap();
    let err = response.downcast::<i64>().unwrap_err();

    assert!(matches!(err, DispatchError::ResponseType { expected: "i64", .. }));
}

#[tokio::test]
async fn test_dyn_unregistered_is_unresolved() {
    let dispatcher = dispatcher_over(Registry::builder().build());

    let err = dispatcher
        .dispatch_dyn(Box::new(Orphan), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_unresolved());
    assert!(dispatcher.cache().is_empty());
}
