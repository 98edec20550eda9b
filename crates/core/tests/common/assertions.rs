//! Helpers for driving the scheduler and inspecting resumptions.

use psgcp_core::pending::Resumption;
use psgcp_core::scheduler::Scheduler;
use psgcp_protocol::operation_models::ResumeKind;
use psgcp_protocol::result_models::{ArtifactResult, OperationOutcome};
use std::time::Duration;

/// Tick `scheduler` until a terminal resumption appears or `timeout` passes.
///
/// Returns every resumption observed, in order.
#[allow(dead_code)]
pub async fn drive_until_terminal(
    scheduler: &mut Scheduler,
    timeout: Duration,
) -> Vec<Resumption> {
    let interval = scheduler.settings().tick_interval();
    let deadline = tokio::time::Instant::now() + timeout;
    let mut observed = Vec::new();

    loop {
        let resumed = scheduler.tick();
        let terminal = resumed.iter().any(is_terminal);
        observed.extend(resumed);
        if terminal {
            return observed;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("No terminal resumption within {timeout:?}: {observed:?}");
        }
        tokio::time::sleep(interval).await;
    }
}

#[allow(dead_code)]
pub fn is_terminal(resumption: &Resumption) -> bool {
    matches!(
        resumption.kind,
        ResumeKind::Finished(_) | ResumeKind::Cancelled
    )
}

/// The artifact result carried by the last resumption.
#[allow(dead_code)]
pub fn final_artifact(resumed: &[Resumption]) -> ArtifactResult {
    match resumed.last().map(|r| &r.kind) {
        Some(ResumeKind::Finished(OperationOutcome::Artifact(result))) => result.clone(),
        other => panic!("Expected an artifact outcome, got {other:?}"),
    }
}

/// Concatenation of every data chunk in `resumed`.
#[allow(dead_code)]
pub fn collected_output(resumed: &[Resumption]) -> String {
    resumed
        .iter()
        .filter_map(|r| match &r.kind {
            ResumeKind::DataAvailable(message) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}
