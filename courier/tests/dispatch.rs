//! Basic dispatch behavior: handler lookup, results and errors.

use courier::{
    BoxError, CancellationToken, DispatchError, Dispatcher, Registry, ResolveError, handler_fn,
    testing::{CountingHandler, FailingHandler, FlagBehavior, TestFailure},
};
use std::sync::Arc;

mod common;
use common::{Add, AddHandler, Orphan, Ping, PingHandler, Wait, WaitHandler, dispatcher_over};

#[tokio::test]
async fn test_dispatch_returns_pong() {
    let dispatcher = dispatcher_over(Registry::builder().handler::<Ping, _>(PingHandler).build());

    let result = dispatcher.dispatch(Ping).await.unwrap();
    assert_eq!(result, "Pong");
}

#[tokio::test]
async fn test_dispatch_invokes_behavior_and_returns_pong() {
    let behavior = FlagBehavior::new();
    let flag = behavior.clone();
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Ping, _>(PingHandler)
            .behavior::<Ping, _>(behavior)
            .build(),
    );

    let result = dispatcher.dispatch(Ping).await.unwrap();

    assert!(flag.was_called());
    assert_eq!(result, "Pong");
}

#[tokio::test]
async fn test_handler_invoked_exactly_once() {
    let handler = CountingHandler::new("Pong".to_string());
    let dispatcher = dispatcher_over(Registry::builder().handler::<Ping, _>(handler.clone()).build());

    dispatcher.dispatch(Ping).await.unwrap();
    assert_eq!(handler.calls(), 1);

    dispatcher.dispatch(Ping).await.unwrap();
    assert_eq!(handler.calls(), 2);
}

#[tokio::test]
async fn test_request_value_reaches_handler() {
    let dispatcher = dispatcher_over(Registry::builder().handler::<Add, _>(AddHandler).build());

    assert_eq!(dispatcher.dispatch(Add { a: 40, b: 2 }).await.unwrap(), 42);
    assert_eq!(dispatcher.dispatch(Add { a: -1, b: 1 }).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unregistered_request_is_unresolved() {
    let handler = CountingHandler::new("Pong".to_string());
    let dispatcher = dispatcher_over(Registry::builder().handler::<Ping, _>(handler.clone()).build());

    let err = dispatcher.dispatch(Orphan).await.unwrap_err();

    assert!(err.is_unresolved());
    assert!(matches!(
        err,
        DispatchError::Unresolved(ResolveError::NotRegistered { .. })
    ));
    assert!(err.to_string().contains("Orphan"));
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_handler_error_is_returned_unchanged() {
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Ping, _>(FailingHandler::new("database unavailable"))
            .build(),
    );

    let err = dispatcher.dispatch(Ping).await.unwrap_err();

    assert!(!err.is_unresolved());
    assert_eq!(err.to_string(), "database unavailable");
    assert!(err.downcast_ref::<TestFailure>().is_some());
    assert!(err.into_source().downcast_ref::<TestFailure>().is_some());
}

#[tokio::test]
async fn test_last_registered_handler_wins() {
    let first = CountingHandler::new("first".to_string());
    let second = CountingHandler::new("second".to_string());
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Ping, _>(first.clone())
            .handler::<Ping, _>(second.clone())
            .build(),
    );

    assert_eq!(dispatcher.dispatch(Ping).await.unwrap(), "second");
    assert_eq!(first.calls(), 0);
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn test_cancellation_token_reaches_handler() {
    let dispatcher = dispatcher_over(Registry::builder().handler::<Wait, _>(WaitHandler).build());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let cancelled = dispatcher
        .dispatch_cancellable(Wait { millis: 5_000 }, cancel)
        .await
        .unwrap();
    assert!(cancelled);

    let finished = dispatcher.dispatch(Wait { millis: 1 }).await.unwrap();
    assert!(!finished);
}

#[tokio::test]
async fn test_fn_handler_dispatch() {
    let dispatcher = dispatcher_over(
        Registry::builder()
            .handler::<Add, _>(handler_fn(|request: &Add, _cancel| {
                let product = request.a * request.b;
                async move { Ok::<_, BoxError>(product) }
            }))
            .build(),
    );

    assert_eq!(dispatcher.dispatch(Add { a: 6, b: 7 }).await.unwrap(), 42);
}

#[tokio::test]
async fn test_builder_with_registry() {
    let dispatcher = Dispatcher::builder()
        .registry(Registry::builder().handler::<Ping, _>(PingHandler).build())
        .build()
        .unwrap();

    assert_eq!(dispatcher.dispatch(Ping).await.unwrap(), "Pong");
}

#[tokio::test]
async fn test_clones_share_state() {
    let dispatcher = Dispatcher::new(Arc::new(
        Registry::builder().handler::<Ping, _>(PingHandler).build(),
    ));
    let clone = dispatcher.clone();

    clone.dispatch(Ping).await.unwrap();
    assert_eq!(dispatcher.cache().len(), 1);
}
