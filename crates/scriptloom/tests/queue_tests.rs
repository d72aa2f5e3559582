//! Automation queue scenarios driven end to end through the controller.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::time::{timeout, Instant};

use common::{batch_response, outline_text, queue_config, Behavior, ScriptedGenerator, ScriptedText, TestHarness};
use scriptloom::job::store::INTERRUPTED_ERROR;
use scriptloom::queue::{TASK_COMPLETED, TASK_STOPPED};
use scriptloom::{AutomationStatus, JobPhase, JobProgressEvent, JobStatus, JobStore, LibraryStatus};

/// Receives events until one matches, skipping over lag.
async fn wait_for_event<F>(rx: &mut Receiver<JobProgressEvent>, matches: F) -> JobProgressEvent
where
    F: Fn(&JobProgressEvent) -> bool,
{
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("progress channel closed"),
            }
        }
    };
    timeout(Duration::from_secs(3600), wait)
        .await
        .expect("expected event never arrived")
}

#[tokio::test(start_paused = true)]
async fn test_queue_drains_pending_and_failed_jobs_in_order() {
    let generator = Arc::new(ScriptedGenerator::new());
    let harness = TestHarness::with_generator(generator.clone(), queue_config(300));
    let first = harness.add_job("J1", JobStatus::Pending);
    let done = harness.add_job("J2", JobStatus::Done);
    let failed = harness.add_job("J3", JobStatus::Failed);

    let start = Instant::now();
    harness.queue.run().unwrap();
    harness.queue.wait_idle().await;
    let elapsed = start.elapsed();

    assert_eq!(generator.calls(), vec!["J1", "J3"]);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);

    for id in [&first.id, &failed.id] {
        let job = harness.job(id);
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.library_status, Some(LibraryStatus::Available));
        assert_eq!(job.current_task.as_deref(), Some(TASK_COMPLETED));
        assert_eq!(job.error, None);
    }
    assert_eq!(harness.job(&done.id).status, JobStatus::Done);

    // One cooldown between the two jobs, none after the last one.
    assert!(elapsed >= Duration::from_secs(300));
    assert!(elapsed < Duration::from_secs(301));
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_is_not_retried_within_the_same_run() {
    let generator = Arc::new(
        ScriptedGenerator::new().with("Broken", Behavior::Fail("quota".to_string())),
    );
    let harness = TestHarness::with_generator(generator.clone(), queue_config(5));
    let broken = harness.add_job("Broken", JobStatus::Pending);
    let fine = harness.add_job("Fine", JobStatus::Pending);

    harness.queue.run().unwrap();
    harness.queue.wait_idle().await;

    assert_eq!(generator.calls(), vec!["Broken", "Fine"]);
    let broken = harness.job(&broken.id);
    assert_eq!(broken.status, JobStatus::Failed);
    assert_eq!(
        broken.error.as_deref(),
        Some("All API keys failed. Last error: quota")
    );
    assert_eq!(harness.job(&fine.id).status, JobStatus::Done);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_cooldown_leaves_next_job_pending() {
    let generator = Arc::new(ScriptedGenerator::new());
    let harness = TestHarness::with_generator(generator.clone(), queue_config(300));
    let first = harness.add_job("J1", JobStatus::Pending);
    let second = harness.add_job("J2", JobStatus::Pending);
    let mut events = harness.queue.broadcaster().subscribe();

    let start = Instant::now();
    harness.queue.run().unwrap();
    let cooling = wait_for_event(&mut events, |e| e.phase == JobPhase::Cooldown).await;
    assert_eq!(cooling.job_id, first.id);
    assert_eq!(cooling.message, "Cooldown: Next job in 300s...");

    harness.queue.stop();
    harness.queue.wait_idle().await;

    assert!(start.elapsed() < Duration::from_secs(300));
    assert_eq!(generator.calls(), vec!["J1"]);
    assert_eq!(harness.job(&first.id).status, JobStatus::Done);
    assert_eq!(harness.job(&second.id).status, JobStatus::Pending);

    // A fresh run picks up where the stopped one left off.
    harness.queue.run().unwrap();
    harness.queue.wait_idle().await;
    assert_eq!(generator.calls(), vec!["J1", "J2"]);
    assert_eq!(harness.job(&second.id).status, JobStatus::Done);
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_cooldown_then_resume() {
    let generator = Arc::new(ScriptedGenerator::new());
    let harness = TestHarness::with_generator(generator.clone(), queue_config(300));
    harness.add_job("J1", JobStatus::Pending);
    let second = harness.add_job("J2", JobStatus::Pending);
    let mut events = harness.queue.broadcaster().subscribe();

    harness.queue.run().unwrap();
    wait_for_event(&mut events, |e| e.phase == JobPhase::Cooldown).await;
    harness.queue.pause().unwrap();
    harness.queue.wait_idle().await;

    assert_eq!(harness.queue.status(), AutomationStatus::Paused);
    assert_eq!(harness.job(&second.id).status, JobStatus::Pending);

    harness.queue.resume().unwrap();
    harness.queue.wait_idle().await;
    assert_eq!(generator.calls(), vec!["J1", "J2"]);
    assert_eq!(harness.job(&second.id).status, JobStatus::Done);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_stays_failed_across_pause_and_resume() {
    let generator = Arc::new(
        ScriptedGenerator::new().with("Broken", Behavior::Fail("quota".to_string())),
    );
    let harness = TestHarness::with_generator(generator.clone(), queue_config(300));
    let broken = harness.add_job("Broken", JobStatus::Pending);
    harness.add_job("J2", JobStatus::Pending);
    let third = harness.add_job("J3", JobStatus::Pending);
    let mut events = harness.queue.broadcaster().subscribe();

    harness.queue.run().unwrap();
    wait_for_event(&mut events, |e| e.phase == JobPhase::Cooldown).await;
    harness.queue.pause().unwrap();
    harness.queue.wait_idle().await;
    assert_eq!(harness.queue.status(), AutomationStatus::Paused);

    harness.queue.resume().unwrap();
    harness.queue.wait_idle().await;

    assert_eq!(generator.calls(), vec!["Broken", "J2", "J3"]);
    assert_eq!(harness.job(&broken.id).status, JobStatus::Failed);
    assert_eq!(harness.job(&third.id).status, JobStatus::Done);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);

    // A new run from IDLE gives the failed job another chance.
    harness.queue.run().unwrap();
    harness.queue.wait_idle().await;
    assert_eq!(generator.calls(), vec!["Broken", "J2", "J3", "Broken"]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_during_a_run_is_picked_up_by_that_run() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .with("Flaky", Behavior::Fail("quota".to_string()))
            .with("Flaky", Behavior::Succeed)
            .with("Slow", Behavior::SucceedAfter(Duration::from_secs(5))),
    );
    let harness = TestHarness::with_generator(generator.clone(), queue_config(0));
    let flaky = harness.add_job("Flaky", JobStatus::Pending);
    let slow = harness.add_job("Slow", JobStatus::Pending);

    harness.queue.run().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.job(&flaky.id).status, JobStatus::Failed);
    assert_eq!(harness.job(&slow.id).status, JobStatus::Running);

    harness.queue.retry(&flaky.id).unwrap();
    harness.queue.wait_idle().await;

    assert_eq!(generator.calls(), vec!["Flaky", "Slow", "Flaky"]);
    assert_eq!(harness.job(&flaky.id).status, JobStatus::Done);
    assert_eq!(harness.job(&slow.id).status, JobStatus::Done);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_waiting_on_a_manual_run_leaves_job_untouched() {
    let generator = Arc::new(
        ScriptedGenerator::new().with("Manual", Behavior::SucceedAfter(Duration::from_secs(10))),
    );
    let harness = TestHarness::with_generator(generator.clone(), queue_config(300));
    let queued = harness.add_job("Queued", JobStatus::Pending);

    let manual = {
        let queue = harness.queue.clone();
        tokio::spawn(async move { queue.generate_manual("Manual", "A concept.", 5).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    harness.queue.run().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    harness.queue.stop();
    harness.queue.wait_idle().await;

    let manual = manual.await.unwrap().unwrap();
    assert_eq!(manual.status, JobStatus::Done);
    assert_eq!(generator.calls(), vec!["Manual"]);

    let queued = harness.job(&queued.id);
    assert_eq!(queued.status, JobStatus::Pending);
    assert_eq!(queued.error, None);
    assert_eq!(queued.current_task, None);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_resume_from_a_plain_thread() {
    let generator = Arc::new(ScriptedGenerator::new());
    let harness = TestHarness::with_generator(generator.clone(), queue_config(3));
    harness.add_job("J1", JobStatus::Pending);
    let second = harness.add_job("J2", JobStatus::Pending);
    let mut events = harness.queue.broadcaster().subscribe();

    harness.queue.run().unwrap();
    wait_for_event(&mut events, |e| e.phase == JobPhase::Cooldown).await;
    harness.queue.pause().unwrap();
    harness.queue.wait_idle().await;

    // Terminal controls call in from a thread outside the runtime.
    let queue = harness.queue.clone();
    std::thread::spawn(move || queue.resume())
        .join()
        .unwrap()
        .unwrap();
    harness.queue.wait_idle().await;

    assert_eq!(generator.calls(), vec!["J1", "J2"]);
    assert_eq!(harness.job(&second.id).status, JobStatus::Done);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_run_keeps_written_chapters() {
    let text = Arc::new(
        ScriptedText::new()
            .reply(outline_text("Refined", 4))
            .reply("The hook.")
            .reply(batch_response(&["One.", "Two.", "Three."]))
            .reply_after(Duration::from_secs(60), "Four."),
    );
    let harness = TestHarness::with_pipeline(text.clone(), queue_config(300));
    let job = harness.add_job("Story", JobStatus::Pending);
    let mut events = harness.queue.broadcaster().subscribe();

    harness.queue.run().unwrap();
    wait_for_event(&mut events, |e| e.message == "Writing Chapter 4...").await;
    harness.queue.stop();

    let stopped = harness.job(&job.id);
    assert_eq!(stopped.status, JobStatus::Failed);
    assert_eq!(stopped.error.as_deref(), Some("Stopped by user."));
    assert_eq!(stopped.current_task.as_deref(), Some(TASK_STOPPED));

    harness.queue.wait_idle().await;

    let job = harness.job(&job.id);
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("Stopped by user."));
    assert_eq!(job.refined_title, "Refined");
    assert_eq!(job.hook, "The hook.");
    assert_eq!(&job.chapters_content[1..=3], ["One.", "Two.", "Three."]);
    assert!(job.chapters_content[4].is_empty());
    assert_eq!(text.call_count(), 4);
    assert_eq!(harness.queue.status(), AutomationStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_pause_mid_batch_repeats_the_batch_after_resume() {
    let text = Arc::new(
        ScriptedText::new()
            .reply(outline_text("Refined", 4))
            .reply("The hook.")
            .reply(batch_response(&["One.", "Two.", "Three."]))
            .reply_after(Duration::from_secs(60), "Discarded four.")
            .reply("Final four."),
    );
    let harness = TestHarness::with_pipeline(text.clone(), queue_config(300));
    let job = harness.add_job("Story", JobStatus::Pending);
    let mut events = harness.queue.broadcaster().subscribe();

    harness.queue.run().unwrap();
    wait_for_event(&mut events, |e| e.message == "Writing Chapter 4...").await;
    harness.queue.pause().unwrap();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(harness.queue.status(), AutomationStatus::Paused);
    assert_eq!(text.call_count(), 4);
    let paused = harness.job(&job.id);
    assert_eq!(paused.status, JobStatus::Running);
    assert!(paused.chapters_content[4].is_empty());

    harness.queue.resume().unwrap();
    harness.queue.wait_idle().await;

    let job = harness.job(&job.id);
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.chapters_content[4], "Final four.");
    assert_eq!(text.call_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_running_job_is_recovered_after_restart() {
    let (_dir, path) = TestHarness::temp_db_path();

    let job_id = {
        let store = JobStore::load(TestHarness::open_db(&path)).unwrap();
        let job = store
            .insert(scriptloom::Job::new(
                scriptloom::JobSource::Automation,
                "Interrupted",
                "A concept.",
                10,
            ))
            .unwrap();
        store.update(&job.id, |job| job.status = JobStatus::Running);
        job.id
    };

    let store = Arc::new(JobStore::load(TestHarness::open_db(&path)).unwrap());
    let recovered = store.get(&job_id).unwrap();
    assert_eq!(recovered.status, JobStatus::Failed);
    assert_eq!(recovered.error.as_deref(), Some(INTERRUPTED_ERROR));

    let generator = Arc::new(ScriptedGenerator::new());
    let queue = scriptloom::QueueController::new(
        Arc::clone(&store),
        generator.clone(),
        common::harness::one_key(),
        queue_config(300),
        scriptloom::JobProgressBroadcaster::default(),
    );
    queue.run().unwrap();
    queue.wait_idle().await;

    assert_eq!(generator.calls(), vec!["Interrupted"]);
    drop(queue);
    drop(store);

    let reloaded = JobStore::load(TestHarness::open_db(&path)).unwrap();
    let job = reloaded.get(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.hook, "A short hook.");
    assert_eq!(job.refined_title, "Interrupted (refined)");
}

#[tokio::test(start_paused = true)]
async fn test_status_subscribers_see_the_run_finish() {
    let generator = Arc::new(ScriptedGenerator::new());
    let harness = TestHarness::with_generator(generator, queue_config(0));
    harness.add_job("Only", JobStatus::Pending);
    let mut status = harness.queue.subscribe_status();
    assert_eq!(*status.borrow_and_update(), AutomationStatus::Idle);

    harness.queue.run().unwrap();
    assert_eq!(*status.borrow_and_update(), AutomationStatus::Running);

    let settled = status
        .wait_for(|s| *s == AutomationStatus::Idle)
        .await
        .map(|s| *s)
        .unwrap();
    assert_eq!(settled, AutomationStatus::Idle);
    harness.queue.wait_idle().await;
    assert_eq!(harness.store.counts().done, 1);
}
