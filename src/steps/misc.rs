//! Waiting and debugging helpers

use std::time::Duration;

use crate::common::{Error, Result};
use crate::context::RunContext;

/// Pause the scenario, for example while a playbook finishes remotely
///
/// The pause is capped at the configured maximum wait.
pub async fn wait(ctx: &RunContext, seconds: u64) {
    let max = ctx.config().timeouts.max_wait_secs;
    if seconds > max {
        tracing::warn!(requested = seconds, max, "wait capped at the configured maximum");
    }
    tokio::time::sleep(Duration::from_secs(seconds.min(max))).await;
}

/// Stop the scenario and report the active container as JSON
pub fn debug_dump(ctx: &RunContext) -> Result<()> {
    let container = ctx.container()?;
    let json = serde_json::to_string_pretty(container)?;
    Err(Error::DebugHalt(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Config;
    use crate::model::Container;

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_capped() {
        let mut config = Config::default();
        config.timeouts.max_wait_secs = 2;
        let ctx = RunContext::new(config);

        let start = tokio::time::Instant::now();
        wait(&ctx, 3600).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3600));
    }

    #[test]
    fn test_debug_dump_halts_with_container() {
        let mut ctx = RunContext::default();
        ctx.set_container(Container::new("case", "events"));
        match debug_dump(&ctx) {
            Err(Error::DebugHalt(json)) => assert!(json.contains("\"name\": \"case\"")),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
