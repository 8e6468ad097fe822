use crate::session::error::{SessionError, SessionResult};
use crate::session::progress::ProgressDisplay;
use crate::session::types::{
    FailedUpload, SessionReport, SessionSignal, SessionSnapshot, TaskEvent, TaskState, UploadTask,
};

/// Completion counter and per-task states of one batch session.
///
/// Pure state: no I/O, no clock beyond timestamps. The owner feeds it
/// `TaskEvent`s one at a time and forwards the returned signals to the host.
/// `AllDone` is emitted exactly once, on the transition that makes every
/// task terminal (or on `start` for an empty batch).
#[derive(Debug)]
pub struct SessionStateMachine {
    session_id: String,
    tasks: Vec<UploadTask>,
    completed: usize,
    display: ProgressDisplay,
    started_at: Option<i64>,
    done_emitted: bool,
}

impl SessionStateMachine {
    pub fn new(session_id: String, tasks: Vec<UploadTask>) -> Self {
        let total = tasks.len();
        Self {
            session_id,
            tasks,
            completed: 0,
            display: ProgressDisplay::count(0, total),
            started_at: None,
            done_emitted: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.done_emitted
    }

    pub fn display(&self) -> ProgressDisplay {
        self.display
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    /// Move every task to `InFlight`. Calling it twice is a no-op.
    pub fn start(&mut self) -> Vec<SessionSignal> {
        if self.started_at.is_some() {
            tracing::warn!("Session {} already started", self.session_id);
            return Vec::new();
        }

        let now = chrono::Utc::now().timestamp();
        self.started_at = Some(now);
        for task in &mut self.tasks {
            task.state = TaskState::InFlight;
            task.started_at = Some(now);
        }

        self.display = ProgressDisplay::count(self.completed, self.total());
        let mut signals = vec![SessionSignal::Progress(self.display.to_string())];
        self.check_done(&mut signals);
        signals
    }

    /// Apply one task event.
    pub fn apply(&mut self, event: TaskEvent) -> SessionResult<Vec<SessionSignal>> {
        if self.started_at.is_none() {
            return Err(SessionError::NotStarted(self.session_id.clone()));
        }

        let index = event.index();
        let total = self.total();
        let completed = self.completed;
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(SessionError::UnknownTask(index))?;

        let mut signals = Vec::new();

        match (task.state.clone(), event) {
            (TaskState::InFlight, TaskEvent::Progress { progress, .. }) => {
                task.bytes_sent = progress.bytes_sent;
                task.bytes_total = progress.bytes_total;

                // The most recently updated task is the one displayed.
                self.display = match progress.percent() {
                    Some(percent) => ProgressDisplay::percent(percent, completed, total),
                    None => ProgressDisplay::count(completed, total),
                };
                signals.push(SessionSignal::Progress(self.display.to_string()));
            }

            (TaskState::InFlight, TaskEvent::Succeeded { .. }) => {
                task.state = TaskState::Succeeded;
                task.finished_at = Some(chrono::Utc::now().timestamp());
                self.finish_task(&mut signals);
            }

            (TaskState::InFlight, TaskEvent::Failed { error, .. }) => {
                task.state = TaskState::Failed { error };
                task.finished_at = Some(chrono::Utc::now().timestamp());
                self.finish_task(&mut signals);
            }

            (state, event) => {
                return Err(SessionError::InvalidTransition(format!(
                    "Cannot handle {:?} for task {} in state {:?}",
                    event, index, state
                )));
            }
        }

        Ok(signals)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            total: self.total(),
            completed: self.completed,
            progress_text: self.display.to_string(),
            tasks: self.tasks.clone(),
        }
    }

    pub fn report(&self) -> SessionReport {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for task in &self.tasks {
            match &task.state {
                TaskState::Succeeded => succeeded.push(task.file_name.clone()),
                TaskState::Failed { error } => failed.push(FailedUpload {
                    file_name: task.file_name.clone(),
                    error: error.clone(),
                }),
                _ => {}
            }
        }

        let finished_at = self
            .tasks
            .iter()
            .filter_map(|t| t.finished_at)
            .max()
            .or(self.started_at)
            .unwrap_or_default();

        SessionReport {
            session_id: self.session_id.clone(),
            total: self.total(),
            succeeded,
            failed,
            started_at: self.started_at.unwrap_or_default(),
            finished_at,
        }
    }

    fn finish_task(&mut self, signals: &mut Vec<SessionSignal>) {
        self.completed += 1;
        self.display = ProgressDisplay::count(self.completed, self.total());
        signals.push(SessionSignal::Progress(self.display.to_string()));
        self.check_done(signals);
    }

    fn check_done(&mut self, signals: &mut Vec<SessionSignal>) {
        if self.completed == self.total() && !self.done_emitted {
            self.done_emitted = true;
            signals.push(SessionSignal::AllDone(self.report()));
        }
    }
}
