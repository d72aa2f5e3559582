use std::path::Path;

use scriptloom::db::style_repo::{self, ThumbnailStyle};

use crate::args::StylesCommand;
use crate::error::CliError;
use crate::state::AppState;

pub fn handle(state: &AppState, cmd: StylesCommand) -> Result<(), CliError> {
    match cmd {
        StylesCommand::List => {
            let styles = style_repo::list(&state.db)?;
            if styles.is_empty() {
                println!("No thumbnail styles");
            }
            for style in styles {
                println!("{:<20}  {}", style.name, preview(&style.master_prompt, 60));
            }
        }
        StylesCommand::Add {
            name,
            prompt,
            analysis_file,
        } => {
            let mut style = ThumbnailStyle::new(name.trim(), prompt.trim());
            if style.name.is_empty() || style.master_prompt.is_empty() {
                return Err(CliError::Invalid(
                    "a style needs a name and a prompt".to_string(),
                ));
            }
            if let Some(path) = analysis_file {
                style.analysis = read_analysis(&path)?;
            }
            style_repo::upsert(&state.db, &style)?;
            println!("Saved style '{}'", style.name);
        }
        StylesCommand::Remove { name } => {
            if style_repo::delete_by_name(&state.db, &name)? {
                println!("Removed style '{}'", name);
            } else {
                return Err(CliError::Invalid(format!("no style named '{}'", name)));
            }
        }
    }
    Ok(())
}

fn read_analysis(path: &Path) -> Result<serde_json::Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
