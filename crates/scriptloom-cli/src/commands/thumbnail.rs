use scriptloom::db::style_repo;
use scriptloom::thumbnail;

use crate::args::ThumbnailArgs;
use crate::error::CliError;
use crate::state::AppState;

pub async fn handle(state: &AppState, args: ThumbnailArgs) -> Result<(), CliError> {
    let style = match &args.style {
        Some(name) => Some(
            style_repo::find_by_name(&state.db, name)?
                .ok_or_else(|| CliError::Invalid(format!("no style named '{}'", name)))?,
        ),
        None => None,
    };

    let image = thumbnail::generate_thumbnail(&state.driver, style.as_ref(), &args.prompt).await?;

    let mut out = args.out;
    if out.extension().is_none() {
        out.set_extension(thumbnail::extension_for(&image.mime_type));
    }
    std::fs::write(&out, &image.bytes).map_err(|source| CliError::Io {
        path: out.clone(),
        source,
    })?;
    println!("Saved {} ({}, {} bytes)", out.display(), image.mime_type, image.bytes.len());
    Ok(())
}
