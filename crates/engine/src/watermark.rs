//! `ProcessResourceStep` / `WaitForTimestampChange` — the watermark protocol
//! (spec §4.2.2).
//!
//! Handlers run asynchronously and persist through pklres; the watermark is
//! the happens-before edge a dependent step observes, replacing per-resource
//! locking. Grounded on the teacher's `nebula-execution::attempt` poll-loop
//! shape (bounded retry against a shared store) though here the loop polls
//! for a timestamp change rather than a retryable attempt outcome.

use std::time::Duration;

use kestrel_action::{HandlerContext, ResourceHandler};
use kestrel_core::{ActionId, RequestId, Timestamp};
use kestrel_error::ResolverError;
use kestrel_store::PklresStore;

use crate::timeout::StepTimeout;

/// Poll cadence while waiting for a watermark change.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn current_timestamp(store: &PklresStore, request_id: RequestId, collection: &str) -> Timestamp {
    match store.get(request_id, collection, "timestamp") {
        Ok(raw) => raw.parse::<f64>().map(Timestamp::from_nanos).unwrap_or_else(|_| Timestamp::epoch()),
        Err(_) => Timestamp::epoch(),
    }
}

async fn wait_for_timestamp_change(
    store: &PklresStore,
    request_id: RequestId,
    action_id: &ActionId,
    collection: &str,
    step: &'static str,
    pre: Timestamp,
    timeout: StepTimeout,
) -> Result<(), ResolverError> {
    let wait = match timeout {
        StepTimeout::NoWait => return Ok(()),
        StepTimeout::Wait(d) => d,
    };

    let deadline = tokio::time::Instant::now() + wait;
    loop {
        if current_timestamp(store, request_id, collection).differs_from(pre) {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ResolverError::Timeout {
                resource: action_id.clone(),
                step,
                waited: wait,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// `ProcessResourceStep(actionID, step, timeout, handlerFn)` (spec §4.2.2):
/// read the pre-timestamp, invoke the handler, then block until the
/// watermark changes or `timeout` elapses.
///
/// # Errors
///
/// A handler failure is wrapped as `<step> error: <cause>`
/// ([`ResolverError::Step`]); a watermark that never changes within
/// `timeout` is [`ResolverError::Timeout`].
pub async fn process_resource_step<B, H>(
    store: &PklresStore,
    request_id: RequestId,
    action_id: &ActionId,
    collection: &str,
    step: &'static str,
    timeout: StepTimeout,
    handler: &H,
    ctx: &HandlerContext,
    block: &mut B,
) -> Result<(), ResolverError>
where
    H: ResourceHandler<B>,
{
    let pre = current_timestamp(store, request_id, collection);
    handler.handle(ctx, block).await.map_err(|err| ResolverError::step(step, err))?;
    wait_for_timestamp_change(store, request_id, action_id, collection, step, pre, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_action::ActionError;

    struct OkHandler;

    #[async_trait::async_trait]
    impl ResourceHandler<()> for OkHandler {
        async fn handle(&self, ctx: &HandlerContext, _block: &mut ()) -> Result<(), ActionError> {
            ctx.store
                .set(ctx.request_id, &ctx.storage_collection(), "timestamp", &ctx.clock.now().as_nanos().to_string())
                .unwrap();
            Ok(())
        }
    }

    struct NoopHandler;

    #[async_trait::async_trait]
    impl ResourceHandler<()> for NoopHandler {
        async fn handle(&self, _ctx: &HandlerContext, _block: &mut ()) -> Result<(), ActionError> {
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait::async_trait]
    impl ResourceHandler<()> for FailingHandler {
        async fn handle(&self, _ctx: &HandlerContext, _block: &mut ()) -> Result<(), ActionError> {
            Err(ActionError::Transport("boom".into()))
        }
    }

    fn ctx() -> HandlerContext {
        use kestrel_core::RequestId;
        use kestrel_ports::SystemClock;
        use std::sync::Arc;
        HandlerContext::new(
            RequestId::new_v4(),
            ActionId::new("@ag/a:1.0.0").unwrap(),
            Arc::new(PklresStore::new()),
            Arc::new(SystemClock),
            "/.kdeps/",
        )
    }

    #[tokio::test]
    async fn succeeds_when_handler_advances_the_watermark() {
        let ctx = ctx();
        let result = process_resource_step(
            &ctx.store,
            ctx.request_id,
            &ctx.action_id.clone(),
            &ctx.storage_collection(),
            "data",
            StepTimeout::Wait(Duration::from_secs(2)),
            &OkHandler,
            &ctx,
            &mut (),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn times_out_when_watermark_never_changes() {
        let ctx = ctx();
        let result = process_resource_step(
            &ctx.store,
            ctx.request_id,
            &ctx.action_id.clone(),
            &ctx.storage_collection(),
            "data",
            StepTimeout::Wait(Duration::from_millis(50)),
            &NoopHandler,
            &ctx,
            &mut (),
        )
        .await;
        assert!(matches!(result, Err(ResolverError::Timeout { .. })));
    }

    #[tokio::test]
    async fn no_wait_mode_skips_the_poll_entirely() {
        let ctx = ctx();
        let result = process_resource_step(
            &ctx.store,
            ctx.request_id,
            &ctx.action_id.clone(),
            &ctx.storage_collection(),
            "data",
            StepTimeout::NoWait,
            &NoopHandler,
            &ctx,
            &mut (),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn handler_failure_is_wrapped_as_step_error() {
        let ctx = ctx();
        let result = process_resource_step(
            &ctx.store,
            ctx.request_id,
            &ctx.action_id.clone(),
            &ctx.storage_collection(),
            "exec",
            StepTimeout::Wait(Duration::from_secs(1)),
            &FailingHandler,
            &ctx,
            &mut (),
        )
        .await;
        match result {
            Err(ResolverError::Step { step, cause }) => {
                assert_eq!(step, "exec");
                assert!(cause.contains("boom"));
            }
            other => panic!("expected Step error, got {other:?}"),
        }
    }
}
