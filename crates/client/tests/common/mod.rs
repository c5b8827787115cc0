#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bioinfer_client::{ClientError, TaskStatusSource};
use bioinfer_core::task::{TaskRecord, TaskStatus};
use bioinfer_core::types::CorrelationId;

/// One scripted answer from the status endpoint.
#[derive(Debug, Clone)]
pub enum Step {
    Status(&'static str),
    Done(&'static str),
    Error(Option<&'static str>),
    Http(u16),
}

impl Step {
    fn into_result(self) -> Result<TaskRecord, ClientError> {
        let record = |status: &str, response: Option<&str>, error: Option<&str>| TaskRecord {
            status: TaskStatus::from(status.to_string()),
            response: response.map(|r| serde_json::Value::String(r.to_string())),
            error_message: error.map(str::to_string),
        };

        match self {
            Step::Status(status) => Ok(record(status, None, None)),
            Step::Done(payload) => Ok(record("DONE", Some(payload), None)),
            Step::Error(message) => Ok(record("ERROR", None, message)),
            Step::Http(status) => Err(ClientError::Api {
                status,
                body: String::new(),
            }),
        }
    }
}

/// A status source that replays a fixed script per job. The last step
/// of each script repeats forever.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, id: &str, steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "script for {id} must have at least one step");
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), steps.into());
        self
    }

    /// Ids queried so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, id: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == id).count()
    }
}

#[async_trait]
impl TaskStatusSource for ScriptedSource {
    async fn task_status(&self, id: &CorrelationId) -> Result<TaskRecord, ClientError> {
        self.calls.lock().unwrap().push(id.to_string());

        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts
                .get_mut(id.as_str())
                .unwrap_or_else(|| panic!("no script for task {id}"));
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        };

        step.into_result()
    }
}
