use scriptloom::export::{self, ExportPart};

use crate::args::{ExportArgs, ExportPartArg};
use crate::error::CliError;
use crate::state::AppState;

use super::resolve_job_id;

pub fn handle(state: &AppState, args: ExportArgs) -> Result<(), CliError> {
    let id = resolve_job_id(state, &args.job_id)?;
    let job = state
        .queue
        .store()
        .get(&id)
        .ok_or_else(|| CliError::Invalid(format!("no job matches '{}'", args.job_id)))?;

    let text = export::export(&job, part(args.part))?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, text).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn part(arg: ExportPartArg) -> ExportPart {
    match arg {
        ExportPartArg::Full => ExportPart::Full,
        ExportPartArg::Hook => ExportPart::HookAndFirstChapter,
        ExportPartArg::Rest => ExportPart::Rest,
    }
}
