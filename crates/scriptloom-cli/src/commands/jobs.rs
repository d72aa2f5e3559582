use scriptloom::Job;

use crate::args::JobsCommand;
use crate::error::CliError;
use crate::state::AppState;

use super::{resolve_job_id, short_id};

pub fn handle(state: &AppState, cmd: JobsCommand) -> Result<(), CliError> {
    let queue = &state.queue;
    match cmd {
        JobsCommand::Add(args) => {
            let job = queue.enqueue(&args.title, &args.concept, args.duration)?;
            println!("Queued {} '{}'", short_id(&job.id), job.title);
        }
        JobsCommand::List { json } => {
            let jobs = queue.store().all();
            if json {
                print_json(&jobs)?;
            } else {
                print_table(&jobs);
                let counts = queue.store().counts();
                println!(
                    "\n{} pending, {} running, {} done, {} failed",
                    counts.pending, counts.running, counts.done, counts.failed
                );
            }
        }
        JobsCommand::Show { job_id, json } => {
            let id = resolve_job_id(state, &job_id)?;
            let job = queue
                .store()
                .get(&id)
                .ok_or_else(|| CliError::Invalid(format!("no job matches '{}'", job_id)))?;
            if json {
                print_json(&job)?;
            } else {
                print_details(&job);
            }
        }
        JobsCommand::Retry { job_id } => {
            let job = queue.retry(&resolve_job_id(state, &job_id)?)?;
            println!("{} is PENDING again", short_id(&job.id));
        }
        JobsCommand::Delete { job_id } => {
            let id = resolve_job_id(state, &job_id)?;
            queue.delete(&id)?;
            println!("Deleted {}", short_id(&id));
        }
        JobsCommand::Archive { job_id } => {
            let job = queue.toggle_archive(&resolve_job_id(state, &job_id)?)?;
            let label = job
                .library_status
                .map(|s| s.as_str())
                .unwrap_or("AVAILABLE");
            println!("{} is now {}", short_id(&job.id), label);
        }
        JobsCommand::Library { archived } => {
            let jobs = queue.store().library(archived);
            if jobs.is_empty() {
                println!("No {} scripts", if archived { "archived" } else { "finished" });
            }
            for job in jobs {
                println!(
                    "{}  {}  {:>6} words  {}",
                    short_id(&job.id),
                    job.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                    job.words_written,
                    job.display_title()
                );
            }
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Invalid(format!("cannot serialize: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn print_table(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("No jobs");
        return;
    }
    println!(
        "{:<8}  {:<10}  {:<8}  {:>11}  TITLE",
        "ID", "SOURCE", "STATUS", "WORDS"
    );
    for job in jobs {
        println!(
            "{:<8}  {:<10}  {:<8}  {:>11}  {}",
            short_id(&job.id),
            job.source.as_str(),
            job.status.as_str(),
            format!("{}/{}", job.words_written, job.total_words),
            job.display_title()
        );
        if let Some(error) = &job.error {
            println!("          error: {}", error);
        }
    }
}

fn print_details(job: &Job) {
    println!("id:        {}", job.id);
    println!("title:     {}", job.display_title());
    println!("source:    {}", job.source.as_str());
    println!("status:    {}", job.status);
    if let Some(library) = job.library_status {
        println!("library:   {}", library.as_str());
    }
    println!("created:   {}", job.created_at.with_timezone(&chrono::Local).to_rfc3339());
    println!("duration:  {} min", job.duration_minutes);
    println!("words:     {}/{}", job.words_written, job.total_words);
    if let Some(task) = &job.current_task {
        println!("task:      {}", task);
    }
    if let Some(error) = &job.error {
        println!("error:     {}", error);
    }
    if !job.outlines.is_empty() {
        println!("\nOutline:");
        for chapter in &job.outlines {
            let written = job
                .chapters_content
                .get(chapter.id as usize)
                .is_some_and(|c| !c.is_empty());
            let mark = if chapter.is_hook() {
                if job.hook.is_empty() { ' ' } else { '*' }
            } else if written {
                '*'
            } else {
                ' '
            };
            println!(
                "  [{}] {:>2}. {} ({} words)",
                mark, chapter.id, chapter.title, chapter.word_count
            );
        }
    }
}
