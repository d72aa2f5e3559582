use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info_span, Instrument};

use crate::config::PipelineConfig;
use crate::driver::TextGenerator;
use crate::job::{JobPatch, JobUpdate};
use crate::prompts;

use super::chapters::{
    batch_task_label, plan_batches, split_batch_response, split_batch_response_strict,
};
use super::context::{GenerationReport, GenerationRequest};
use super::control::RunControl;
use super::error::PipelineError;
use super::outline::parse_outline;
use super::progress::ProgressReporter;

pub const TASK_OUTLINE: &str = "Generating story outline...";
pub const TASK_HOOK: &str = "Crafting the perfect hook...";
pub const TASK_COMPLETE: &str = "Script generation complete!";
pub const TASK_PAUSED: &str = "Automation Paused...";

/// Seam between the queue and the pipeline; tests substitute scripted
/// generators here.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        control: &RunControl,
        progress: &dyn ProgressReporter,
    ) -> Result<GenerationReport, PipelineError>;
}

/// Outline, then hook, then chapters in batches. Every remote call goes
/// through the [`TextGenerator`], which owns retry and rotation.
pub struct GenerationPipeline {
    generator: Arc<dyn TextGenerator>,
    config: PipelineConfig,
}

impl GenerationPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, config: PipelineConfig) -> Self {
        Self { generator, config }
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        control: &RunControl,
        progress: &dyn ProgressReporter,
    ) -> Result<GenerationReport, PipelineError> {
        let mut report = GenerationReport::default();
        let poll = self.config.pause_poll();

        // Step 1: outline
        hold(control, progress, poll).await?;
        progress.report(JobUpdate::Task(TASK_OUTLINE.to_string()));
        let outline_text = self
            .generator
            .generate_text(&prompts::outline_prompt(
                &request.title,
                &request.concept,
                request.duration_minutes,
            ))
            .instrument(info_span!("outline"))
            .await?;
        control.checkpoint()?;

        let parsed = parse_outline(&outline_text)?;
        log::info!(
            "Outline '{}' has {} chapters",
            parsed.refined_title,
            parsed.chapters.len()
        );
        progress.report(JobUpdate::Patch(JobPatch {
            raw_outline_text: Some(outline_text.clone()),
            refined_title: Some(parsed.refined_title.clone()),
            outlines: Some(parsed.chapters.clone()),
            chapters_content: Some(vec![String::new(); parsed.chapters.len() + 1]),
            ..Default::default()
        }));
        report.refined_title = parsed.refined_title;
        report.outlines = parsed.chapters;

        // Step 2: hook
        hold(control, progress, poll).await?;
        progress.report(JobUpdate::Task(TASK_HOOK.to_string()));
        let hook = self
            .generator
            .generate_text(&prompts::hook_prompt(&outline_text))
            .instrument(info_span!("hook"))
            .await?;
        control.checkpoint()?;
        progress.report(JobUpdate::Patch(JobPatch {
            hook: Some(hook.trim().to_string()),
            ..Default::default()
        }));

        // Step 3: chapters
        for batch in plan_batches(&report.outlines, self.config.chapter_batch_size) {
            let label = batch_task_label(&batch);
            loop {
                hold(control, progress, poll).await?;
                progress.report(JobUpdate::Task(label.clone()));
                let text = self
                    .generator
                    .generate_text(&prompts::chapter_batch_prompt(&outline_text, &batch))
                    .instrument(info_span!("chapters", batch = %label))
                    .await?;
                control.checkpoint()?;

                if control.is_paused() {
                    log::info!("Paused during '{}', the batch will be requested again", label);
                    report.batches_repeated += 1;
                    continue;
                }

                let pieces = if self.config.strict_chapter_split {
                    split_batch_response_strict(&text, &batch)?
                } else {
                    let split = split_batch_response(&text, &batch);
                    if let Some(warning) = split.warning {
                        log::warn!("Chapter count mismatch, {}", warning);
                        report.warnings.push(warning);
                    }
                    split.pieces
                };
                progress.report(JobUpdate::MergeChapters(pieces));
                report.batches_written += 1;
                break;
            }
        }

        progress.report(JobUpdate::Task(TASK_COMPLETE.to_string()));
        Ok(report)
    }
}

/// Waits out a pause, labelling the job as paused meanwhile, then fails if a
/// stop was requested.
async fn hold(
    control: &RunControl,
    progress: &dyn ProgressReporter,
    poll: Duration,
) -> Result<(), PipelineError> {
    if control.is_paused() && !control.is_stopped() {
        progress.report(JobUpdate::Task(TASK_PAUSED.to_string()));
        control.wait_while_paused(poll).await;
    }
    control.checkpoint()
}

#[async_trait]
impl ScriptGenerator for GenerationPipeline {
    async fn generate(
        &self,
        request: &GenerationRequest,
        control: &RunControl,
        progress: &dyn ProgressReporter,
    ) -> Result<GenerationReport, PipelineError> {
        let span = info_span!("pipeline", title = %request.title);
        self.run(request, control, progress).instrument(span).await
    }
}
