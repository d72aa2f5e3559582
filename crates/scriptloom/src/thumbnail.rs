//! Thumbnail generation from a saved style profile and a scene description.

use crate::db::style_repo::ThumbnailStyle;
use crate::driver::{DriverError, GeneratedImage, RotationDriver};
use crate::prompts;

/// Image prompt for `scene`, prefixed by the style's master prompt when one
/// is given.
pub fn render_prompt(style: Option<&ThumbnailStyle>, scene: &str) -> String {
    match style {
        Some(style) => prompts::thumbnail_prompt(&style.master_prompt, scene.trim()),
        None => scene.trim().to_string(),
    }
}

/// One 16:9 image generation through the rotation driver.
pub async fn generate_thumbnail(
    driver: &RotationDriver,
    style: Option<&ThumbnailStyle>,
    scene: &str,
) -> Result<GeneratedImage, DriverError> {
    let prompt = render_prompt(style, scene);
    log::info!(
        "Generating thumbnail{}",
        style
            .map(|s| format!(" in style '{}'", s.name))
            .unwrap_or_default()
    );
    driver.generate_image(&prompt).await
}

/// File extension for an image MIME type.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}
