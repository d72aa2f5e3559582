//! Scripted stand-ins for the remote API and the generation seams.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use scriptloom::driver::{DriverError, TextGenerator};
use scriptloom::job::{JobPatch, JobUpdate};
use scriptloom::pipeline::{
    GenerationReport, GenerationRequest, PipelineError, ProgressReporter, RunControl,
    ScriptGenerator,
};
use scriptloom::remote::{CallError, Operation, Payload, RemoteCall};

// ─── Remote API ─────────────────────────────────────────────────────────────

/// Remote API fake. Keys listed in `failing` always fail with their error;
/// other keys pop the next scripted text reply.
pub struct FakeRemote {
    replies: Mutex<VecDeque<String>>,
    failing: HashMap<String, CallError>,
    calls: Mutex<Vec<(String, Operation)>>,
}

impl FakeRemote {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            failing: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_key(mut self, key: &str, error: CallError) -> Self {
        self.failing.insert(key.to_string(), error);
        self
    }

    /// `(key, operation)` for every attempt, in order.
    pub fn calls(&self) -> Vec<(String, Operation)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn keys_used(&self) -> Vec<String> {
        self.calls().into_iter().map(|(key, _)| key).collect()
    }
}

#[async_trait]
impl RemoteCall for FakeRemote {
    async fn invoke(
        &self,
        credential: &SecretString,
        operation: &Operation,
    ) -> Result<Payload, CallError> {
        let key = credential.expose_secret().to_string();
        self.calls
            .lock()
            .unwrap()
            .push((key.clone(), operation.clone()));

        if let Some(error) = self.failing.get(&key) {
            return Err(error.clone());
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(Payload::Text)
            .ok_or(CallError::EmptyResponse)
    }
}

// ─── Text generator ─────────────────────────────────────────────────────────

/// Text generator answering from a script, optionally taking virtual time
/// per call so tests can act while a call is in flight.
pub struct ScriptedText {
    replies: Mutex<VecDeque<(Duration, Result<String, DriverError>)>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedText {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.reply_after(Duration::ZERO, text)
    }

    pub fn reply_after(self, delay: Duration, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back((delay, Ok(text.into())));
        self
    }

    pub fn fail(self, error: DriverError) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, Err(error)));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate_text(&self, prompt: &str) -> Result<String, DriverError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some((delay, reply)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
            None => Err(DriverError::AllCredentialsExhausted {
                attempts: 1,
                last_error: "script exhausted".to_string(),
            }),
        }
    }
}

// ─── Script generator ───────────────────────────────────────────────────────

/// How [`ScriptedGenerator`] treats a job, keyed by its title.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Writes a hook and chapter 1, then succeeds.
    Succeed,
    /// Like `Succeed`, after taking the given virtual time.
    SucceedAfter(Duration),
    /// Fails with the given driver message.
    Fail(String),
}

/// Queue-level fake: records the titles it was asked to generate.
///
/// Behaviors given for one title are used in order, one per attempt; the
/// last one repeats.
pub struct ScriptedGenerator {
    behaviors: Mutex<HashMap<String, VecDeque<Behavior>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            behaviors: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(self, title: &str, behavior: Behavior) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .entry(title.to_string())
            .or_default()
            .push_back(behavior);
        self
    }

    fn next_behavior(&self, title: &str) -> Behavior {
        let mut behaviors = self.behaviors.lock().unwrap();
        match behaviors.get_mut(title) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Behavior::Succeed),
            None => Behavior::Succeed,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _control: &RunControl,
        progress: &dyn ProgressReporter,
    ) -> Result<GenerationReport, PipelineError> {
        self.calls.lock().unwrap().push(request.title.clone());

        let behavior = self.next_behavior(&request.title);
        if let Behavior::SucceedAfter(delay) = &behavior {
            tokio::time::sleep(*delay).await;
        }
        match behavior {
            Behavior::Succeed | Behavior::SucceedAfter(_) => {
                progress.report(JobUpdate::Patch(JobPatch {
                    refined_title: Some(format!("{} (refined)", request.title)),
                    hook: Some("A short hook.".to_string()),
                    chapters_content: Some(vec![String::new(); 2]),
                    ..Default::default()
                }));
                progress.report(JobUpdate::MergeChapters(vec![(
                    1,
                    "Chapter one body.".to_string(),
                )]));
                Ok(GenerationReport::default())
            }
            Behavior::Fail(message) => Err(PipelineError::Driver(
                DriverError::AllCredentialsExhausted {
                    attempts: 1,
                    last_error: message,
                },
            )),
        }
    }
}
