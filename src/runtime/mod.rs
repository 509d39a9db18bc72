//! Agent run service abstraction.
//!
//! This module provides:
//! - [`RunService`] trait: opens one agent run and streams its native messages
//! - [`ProcessRunService`]: runs the agent CLI as a child process
//!
//! Dropping a [`NativeStream`] must tear the run down.

mod process;

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

use crate::agent::{NativeMessage, RunConfig};
use crate::Result;

pub use process::ProcessRunService;

/// Native message stream of one run
pub type NativeStream = Pin<Box<dyn Stream<Item = Result<NativeMessage>> + Send>>;

/// Agent run service: swappable runtime abstraction.
///
/// Implementations report an abnormal exit of the run's process (which is how
/// a failed resume surfaces) as [`crate::Error::Process`], either from `open`
/// or as a stream item.
#[async_trait]
pub trait RunService: Send + Sync {
    /// Start a run with `config` and submit `prompt` to it.
    async fn open(&self, config: &RunConfig, prompt: &str) -> Result<NativeStream>;
}

/// What one scripted attempt does
#[cfg(test)]
pub enum Script {
    /// `open` itself fails
    FailOpen(crate::Error),
    /// `open` succeeds and the stream yields these items
    Stream(Vec<Result<NativeMessage>>),
    /// Like `Stream`, then never ends; raises the flag when dropped
    Hang(Vec<Result<NativeMessage>>, std::sync::Arc<std::sync::atomic::AtomicBool>),
}

/// Scripted run service for testing.
#[cfg(test)]
pub struct ScriptedRunService {
    scripts: std::sync::Mutex<std::collections::VecDeque<Script>>,
    opened: std::sync::Mutex<Vec<(RunConfig, String)>>,
}

#[cfg(test)]
impl ScriptedRunService {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: std::sync::Mutex::new(scripts.into()),
            opened: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Configs and prompts of every `open` call, in order
    pub fn opened(&self) -> Vec<(RunConfig, String)> {
        self.opened.lock().unwrap().clone()
    }
}

#[cfg(test)]
struct DropFlag(std::sync::Arc<std::sync::atomic::AtomicBool>);

#[cfg(test)]
impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
#[async_trait]
impl RunService for ScriptedRunService {
    async fn open(&self, config: &RunConfig, prompt: &str) -> Result<NativeStream> {
        self.opened
            .lock()
            .unwrap()
            .push((config.clone(), prompt.to_string()));

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| crate::Error::Run("No more scripted runs".to_string()))?;

        match script {
            Script::FailOpen(err) => Err(err),
            Script::Stream(items) => Ok(Box::pin(futures_util::stream::iter(items))),
            Script::Hang(items, dropped) => Ok(Box::pin(async_stream::stream! {
                let _flag = DropFlag(dropped);
                for item in items {
                    yield item;
                }
                std::future::pending::<()>().await;
            })),
        }
    }
}
