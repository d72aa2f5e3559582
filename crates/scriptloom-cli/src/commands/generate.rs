use crate::args::ScriptArgs;
use crate::error::CliError;
use crate::state::AppState;

use super::progress::spawn_printer;
use super::short_id;

/// Manual flow: one generation, stored only when it succeeds.
pub async fn handle(state: &AppState, args: ScriptArgs) -> Result<(), CliError> {
    let control = state.queue.manual_control();
    ctrlc::set_handler(move || {
        eprintln!("Stopping after the current request...");
        control.stop();
    })?;

    let printer = spawn_printer(state.queue.broadcaster());
    let result = state
        .queue
        .generate_manual(&args.title, &args.concept, args.duration)
        .await;
    printer.abort();

    let job = result?;
    println!(
        "Saved {} '{}' ({} words). Export it with `scriptloom export {}`.",
        short_id(&job.id),
        job.display_title(),
        job.words_written,
        short_id(&job.id)
    );
    Ok(())
}
