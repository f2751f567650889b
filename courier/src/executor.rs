//! Pipeline executor.
//!
//! Turns a plan plus live instances from a provider into one invocation.
//! Handler and behaviors are resolved on every call; the cancellation token
//! is threaded through unchanged and never inspected here.

use crate::plan::{InvocationPlan, PlanPath};
use courier_core::{
    CancellationToken, CapabilityKey, CapabilityProvider, DispatchError, DynPipelineBehavior,
    DynRequestHandler, Next, Request, resolve_behaviors, resolve_handler,
};
use std::sync::Arc;

/// Execute `plan` for `request`.
///
/// The handler is resolved first, so an unresolvable handler fails before
/// any behavior runs. A [`PlanPath::Direct`] plan never queries behaviors.
pub async fn execute<R: Request>(
    plan: &InvocationPlan,
    provider: &dyn CapabilityProvider,
    request: &R,
    cancel: &CancellationToken,
) -> Result<R::Response, DispatchError> {
    let handler = resolve_handler::<R, _>(provider, plan.handler_key())?;

    match plan.path() {
        PlanPath::Direct => run(&[], &*handler, request, cancel).await,
        PlanPath::Composed { .. } => {
            let behaviors = resolve_behaviors::<R, _>(provider, plan.behavior_key())?;
            run(&behaviors, &*handler, request, cancel).await
        }
    }
}

/// Resolve and run the pipeline for `request` without a plan.
pub async fn compose<R: Request>(
    provider: &dyn CapabilityProvider,
    request: &R,
    cancel: &CancellationToken,
) -> Result<R::Response, DispatchError> {
    let handler = resolve_handler::<R, _>(provider, &CapabilityKey::handler::<R>())?;
    let behaviors = resolve_behaviors::<R, _>(provider, &CapabilityKey::behavior::<R>())?;
    run(&behaviors, &*handler, request, cancel).await
}

async fn run<R: Request>(
    behaviors: &[Arc<dyn DynPipelineBehavior<R>>],
    handler: &dyn DynRequestHandler<R>,
    request: &R,
    cancel: &CancellationToken,
) -> Result<R::Response, DispatchError> {
    let result = if behaviors.is_empty() {
        handler.handle_dyn(request, cancel).await
    } else {
        // The first registered behavior is the outermost link.
        Next::new(request, cancel, behaviors, handler).run().await
    };
    result.map_err(DispatchError::Failed)
}
