pub mod broadcast;
pub mod config;
pub mod credentials;
pub mod db;
pub mod driver;
pub mod error;
pub mod export;
pub mod job;
pub mod pipeline;
pub mod prompts;
pub mod queue;
pub mod rate_gate;
pub mod remote;
pub mod secrets;
pub mod thumbnail;

pub use broadcast::{JobPhase, JobProgressBroadcaster, JobProgressEvent};
pub use config::{load_config, load_config_or_default, Config};
pub use credentials::{CredentialError, CredentialRotator, CredentialStore};
pub use db::{Database, DatabaseError};
pub use driver::{DriverError, RotationDriver, TextGenerator};
pub use error::{ConfigError, Result, ScriptloomError};
pub use job::{Job, JobSource, JobStatus, JobStore, LibraryStatus};
pub use pipeline::{GenerationPipeline, PipelineError, RunControl, ScriptGenerator};
pub use queue::{AutomationStatus, QueueController, QueueError};
pub use rate_gate::RateGate;
pub use remote::{CallError, GeminiClient, RemoteCall};
pub use secrets::{mask_secret, resolve_secret, CredentialCipher, SecretError};
