//! Prints job progress events as they arrive.

use scriptloom::{JobPhase, JobProgressBroadcaster, JobProgressEvent};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::short_id;

/// Spawns a task printing every event whose phase or message changed.
/// Abort the handle when done.
pub fn spawn_printer(broadcaster: &JobProgressBroadcaster) -> JoinHandle<()> {
    let mut rx = broadcaster.subscribe();
    tokio::spawn(async move {
        let mut last: Option<(String, JobPhase, String)> = None;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let key = (event.job_id.clone(), event.phase, event.message.clone());
                    if last.as_ref() != Some(&key) {
                        println!("{}", format_event(&event));
                        last = Some(key);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Progress printer skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub fn format_event(event: &JobProgressEvent) -> String {
    let mut line = format!(
        "[{}] {} {:<10} {}",
        event.timestamp.format("%H:%M:%S"),
        short_id(&event.job_id),
        event.phase.to_string(),
        event.title
    );
    if !event.message.is_empty() {
        line.push_str(&format!(" - {}", event.message));
    }
    if event.total_words > 0 {
        line.push_str(&format!(" ({}/{} words)", event.words_written, event.total_words));
    }
    if let (JobPhase::Failed, Some(error)) = (event.phase, &event.error) {
        line.push_str(&format!(": {}", error));
    }
    line
}
