use std::io::{BufRead, IsTerminal};

use scriptloom::{AutomationStatus, QueueController};

use crate::args::RunArgs;
use crate::error::CliError;
use crate::state::AppState;

use super::progress::spawn_printer;

/// Runs the automation queue until it drains or is stopped with Ctrl-C.
pub async fn handle(state: &AppState, args: RunArgs) -> Result<(), CliError> {
    let queue = state.queue.clone();

    let stopper = queue.clone();
    ctrlc::set_handler(move || {
        eprintln!("Stopping automation...");
        stopper.stop();
    })?;

    let printer = (!args.quiet).then(|| spawn_printer(queue.broadcaster()));

    queue.run()?;
    if std::io::stdin().is_terminal() {
        eprintln!("Automation running. Type 'p' to pause, 'r' to resume, 's' to stop.");
        spawn_stdin_controls(queue.clone());
    }

    wait_until_settled(&queue).await;
    if let Some(printer) = printer {
        printer.abort();
    }

    let counts = queue.store().counts();
    println!(
        "Automation {}: {} done, {} failed, {} pending",
        queue.status(),
        counts.done,
        counts.failed,
        counts.pending
    );
    Ok(())
}

/// Returns once the queue is idle with no loop left. A pause that lands
/// between jobs ends the loop while the queue stays paused, so this also
/// waits for the resume or stop that follows.
async fn wait_until_settled(queue: &QueueController) {
    loop {
        queue.wait_idle().await;
        if !queue.status().is_active() {
            return;
        }
        let mut status = queue.subscribe_status();
        if status
            .wait_for(|s| *s != AutomationStatus::Paused)
            .await
            .is_err()
        {
            return;
        }
        tokio::task::yield_now().await;
    }
}

/// Reads single-letter commands from stdin on a plain thread; stdin reads
/// block.
fn spawn_stdin_controls(queue: QueueController) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let result = match line.trim() {
                "p" | "pause" => queue.pause(),
                "r" | "resume" => queue.resume(),
                "s" | "stop" => {
                    queue.stop();
                    Ok(())
                }
                "" => Ok(()),
                other => {
                    eprintln!("Unknown command '{}'", other);
                    Ok(())
                }
            };
            match result {
                Ok(()) => eprintln!("Automation is {}", queue.status()),
                Err(e) => eprintln!("{}", e),
            }
        }
    });
}
