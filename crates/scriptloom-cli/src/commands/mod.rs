pub mod export;
pub mod generate;
pub mod jobs;
pub mod keys;
pub mod progress;
pub mod run;
pub mod styles;
pub mod thumbnail;

use crate::args::Command;
use crate::error::CliError;
use crate::state::AppState;

pub async fn dispatch(state: &AppState, command: Command) -> Result<(), CliError> {
    match command {
        Command::Keys(cmd) => keys::handle(state, cmd),
        Command::Jobs(cmd) => jobs::handle(state, cmd),
        Command::Generate(args) => generate::handle(state, args).await,
        Command::Run(args) => run::handle(state, args).await,
        Command::Export(args) => export::handle(state, args),
        Command::Styles(cmd) => styles::handle(state, cmd),
        Command::Thumbnail(args) => thumbnail::handle(state, args).await,
    }
}

/// First eight characters of a job id, enough to recognise it in a listing.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Accepts a full job id or a unique prefix of one.
pub fn resolve_job_id(state: &AppState, id: &str) -> Result<String, CliError> {
    let jobs = state.queue.store().all();
    if jobs.iter().any(|j| j.id == id) {
        return Ok(id.to_string());
    }
    let matches: Vec<&str> = jobs
        .iter()
        .filter(|j| j.id.starts_with(id))
        .map(|j| j.id.as_str())
        .collect();
    match matches.as_slice() {
        [single] => Ok(single.to_string()),
        [] => Err(CliError::Invalid(format!("no job matches '{}'", id))),
        _ => Err(CliError::Invalid(format!(
            "'{}' matches {} jobs, use more characters",
            id,
            matches.len()
        ))),
    }
}
