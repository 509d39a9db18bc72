//! Conversation driver - runs attempts, translates their output, recovers
//! from a failed resume.

use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Error;
use crate::runtime::RunService;
use crate::templates;
use crate::Result;

use super::event::NormalizedEvent;
use super::request::AgentRequest;
use super::run_config::RunConfigBuilder;
use super::translator::{SandboxSession, Translator};

/// Lazy, cancellable stream of normalized events for one conversation turn.
///
/// Dropping it tears down the active run.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<NormalizedEvent>> + Send>>;

/// How an attempt ended
enum AttemptEnd {
    /// Completion marker seen, or the native stream ran dry
    Finished,
    Failed(Error),
}

/// A failed resume is retried once as a fresh run; anything else is final.
fn should_retry(err: &Error, resume_token: Option<&str>) -> bool {
    err.is_process_failure() && resume_token.is_some()
}

/// Drives agent runs for one conversation turn
pub struct ConversationDriver<S: RunService> {
    service: Arc<S>,
    builder: Arc<RunConfigBuilder>,
}

impl<S: RunService + 'static> ConversationDriver<S> {
    /// Create a new driver
    pub fn new(service: S, builder: RunConfigBuilder) -> Self {
        Self {
            service: Arc::new(service),
            builder: Arc::new(builder),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run one conversation turn.
    ///
    /// Events are yielded in the order the run produced them. If the run was
    /// resuming `request.run_resume_token` and failed at the process level,
    /// a single fresh attempt follows; its events come after everything
    /// already yielded.
    pub fn run_conversation(&self, request: AgentRequest) -> EventStream {
        let service = Arc::clone(&self.service);
        let builder = Arc::clone(&self.builder);

        Box::pin(async_stream::stream! {
            let conversation_id = uuid::Uuid::new_v4();
            let mut translator = Translator::new(SandboxSession::new(
                request.sandbox_session_id.clone().unwrap_or_default(),
            ));
            let mut resume_token = request.resume_token().map(str::to_string);
            let mut attempt = 0u32;

            info!(
                %conversation_id,
                runtime_session = request.runtime_session_id.as_deref().unwrap_or(""),
                "Starting conversation"
            );

            loop {
                attempt += 1;
                let config = builder.build(resume_token.as_deref());
                let prompt = templates::with_sandbox_session(&request.prompt, translator.session().id());

                let end = match service.open(&config, &prompt).await {
                    Err(err) => AttemptEnd::Failed(err),
                    Ok(mut native) => {
                        let mut end = AttemptEnd::Finished;
                        while let Some(item) = native.next().await {
                            match item {
                                Ok(message) => {
                                    let translation = translator.translate(message);
                                    for event in translation.events {
                                        yield Ok(event);
                                    }
                                    if translation.completed {
                                        break;
                                    }
                                }
                                Err(err) => {
                                    end = AttemptEnd::Failed(err);
                                    break;
                                }
                            }
                        }
                        end
                    }
                };

                match end {
                    AttemptEnd::Finished => {
                        info!(
                            %conversation_id,
                            attempt,
                            "Conversation finished ({} text chunks)",
                            translator.transcript().len()
                        );
                        break;
                    }
                    AttemptEnd::Failed(err) if should_retry(&err, resume_token.as_deref()) => {
                        warn!(
                            %conversation_id,
                            "Resume failed for session {}, starting fresh session: {}",
                            resume_token.as_deref().unwrap_or_default(),
                            err
                        );
                        resume_token = None;
                    }
                    AttemptEnd::Failed(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}
