//! Scripted [`JenkinsApi`] fake shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use triggers::{JenkinsApi, JenkinsError};

/// Replays queued crumb and POST results; once a queue is drained the last
/// scripted result for that call repeats.
#[derive(Default)]
pub struct ScriptedJenkins {
    crumbs: Mutex<VecDeque<Result<String, JenkinsError>>>,
    statuses: Mutex<VecDeque<Result<u16, JenkinsError>>>,
    posts: Mutex<Vec<(String, String)>>,
    crumb_calls: Mutex<usize>,
}

impl ScriptedJenkins {
    /// Every crumb fetch succeeds; every POST answers `status`.
    pub fn answering(status: u16) -> Self {
        Self::default()
            .with_crumbs([Ok("crumb-1".to_string())])
            .with_statuses([Ok(status)])
    }

    pub fn with_crumbs(self, crumbs: impl IntoIterator<Item = Result<String, JenkinsError>>) -> Self {
        *self.crumbs.lock().unwrap() = crumbs.into_iter().collect();
        self
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = Result<u16, JenkinsError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    /// `(path, crumb)` for every POST issued, in order.
    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn crumb_calls(&self) -> usize {
        *self.crumb_calls.lock().unwrap()
    }
}

fn next<T: Clone>(queue: &Mutex<VecDeque<T>>) -> T {
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        queue.pop_front().unwrap()
    } else {
        queue.front().cloned().expect("script exhausted")
    }
}

#[async_trait]
impl JenkinsApi for ScriptedJenkins {
    async fn fetch_crumb(&self) -> Result<String, JenkinsError> {
        *self.crumb_calls.lock().unwrap() += 1;
        next(&self.crumbs)
    }

    async fn trigger_job(&self, path: &str, crumb: &str) -> Result<u16, JenkinsError> {
        self.posts
            .lock()
            .unwrap()
            .push((path.to_string(), crumb.to_string()));
        next(&self.statuses)
    }
}

pub fn transport_error() -> JenkinsError {
    JenkinsError::Transport {
        message: "connection refused".to_string(),
    }
}
