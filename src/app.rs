use std::{path::PathBuf, rc::Rc, time::Duration};

use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

use crate::{
    notify::Notifier,
    reminder::{Clock, ReminderScheduler, next_occurrence},
    store::{StoreError, TaskStore},
    task::{Task, TaskId},
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub task_file: PathBuf,
    /// Re-arm reminders at startup for loaded tasks still due later today.
    pub rearm_on_startup: bool,
}

// Shared core for the TUI and the command line
pub struct TodoApp {
    store: TaskStore,
    reminders: ReminderScheduler,
    notifier: Rc<dyn Notifier>,
    clock: Rc<dyn Clock>,
    // In-memory tasks differ from the task file
    dirty: bool,
    shut_down: bool,
}

impl TodoApp {
    /// Loads the task file and arms reminders. This is the only way to get a
    /// ready controller.
    pub fn startup(
        config: AppConfig,
        notifier: Rc<dyn Notifier>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let mut store = TaskStore::new(config.task_file);

        match store.load() {
            Ok(count) => info!(count, path = %store.path().display(), "tasks loaded"),
            Err(err @ StoreError::Decode { .. }) => {
                warn!(error = %err, "task file unreadable, starting with an empty list");
                let moved = store.quarantine()?;
                warn!(path = %moved.display(), "unreadable task file moved aside");
            }
            Err(err) => return Err(err.into()),
        }

        let mut app = TodoApp {
            store,
            reminders: ReminderScheduler::new(),
            notifier,
            clock,
            dirty: false,
            shut_down: false,
        };
        if config.rearm_on_startup {
            app.rearm_pending();
        }
        Ok(app)
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn has_reminder(&self, id: TaskId) -> bool {
        self.reminders.is_armed(id)
    }

    pub fn next_reminder_at(&self) -> Option<NaiveDateTime> {
        self.reminders.next_due()
    }

    /// How long an event loop may sleep before the next `tick`.
    pub fn wait_timeout(&self) -> Duration {
        self.reminders.wait_timeout(self.clock.now())
    }

    /// Adds a task, persists it and arms its reminder. Blank text is ignored.
    /// When the save fails the task is dropped again so memory matches disk.
    pub fn add_task(
        &mut self,
        text: &str,
        time: &str,
        image: &str,
    ) -> Result<Option<TaskId>, AppError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring task with empty text");
            return Ok(None);
        }
        let image = image.trim();
        let image = if image.is_empty() {
            None
        } else {
            Some(image.to_string())
        };

        let task = Task::new(text.to_string(), time.trim().to_string(), image);
        let id = task.id;
        self.store.append(task.clone());
        if let Err(err) = self.store.save() {
            self.store.remove(|t| t.id == id);
            return Err(err.into());
        }
        info!(task = %id, text = %task.text, time = %task.time, "task added");

        self.arm(&task, self.clock.now());
        Ok(Some(id))
    }

    /// Removes every task whose text and time both match, along with their
    /// reminders. Returns how many were removed.
    pub fn delete_task(&mut self, text: &str, time: &str) -> Result<usize, AppError> {
        let removed = self.store.remove(|t| t.matches(text, time));
        self.retire(&removed)?;
        Ok(removed.len())
    }

    pub fn delete_task_by_id(&mut self, id: TaskId) -> Result<bool, AppError> {
        let removed = self.store.remove(|t| t.id == id);
        self.retire(&removed)?;
        Ok(!removed.is_empty())
    }

    /// Fires every reminder that is due now.
    pub fn tick(&mut self) -> Vec<TaskId> {
        let now = self.clock.now();
        self.reminders.fire_due(now, self.notifier.as_ref())
    }

    /// Persists the task list one last time if it has unsaved changes.
    pub fn shutdown(mut self) -> Result<(), AppError> {
        self.shut_down = true;
        if self.dirty {
            self.store.save()?;
            info!(count = self.store.len(), "tasks saved on shutdown");
        }
        Ok(())
    }

    fn retire(&mut self, removed: &[Task]) -> Result<(), AppError> {
        if removed.is_empty() {
            return Ok(());
        }
        for task in removed {
            self.reminders.cancel(task.id);
            info!(task = %task.id, text = %task.text, "task deleted");
        }
        self.dirty = true;
        self.store.save()?;
        self.dirty = false;
        Ok(())
    }

    fn arm(&mut self, task: &Task, now: NaiveDateTime) {
        if let Err(err) = self.reminders.schedule(task, now) {
            warn!(task = %task.id, error = %err, "reminder not scheduled");
        }
    }

    /// Arms loaded tasks due in a later minute of today. The current minute
    /// does not count: its reminder may already have fired before a restart.
    fn rearm_pending(&mut self) {
        let now = self.clock.now();
        for task in self.store.tasks() {
            match task.due_time() {
                Ok(due) => {
                    let due_at = next_occurrence(due, now);
                    if due_at.date() == now.date() && due_at > now {
                        if let Err(err) = self.reminders.schedule(task, now) {
                            warn!(task = %task.id, error = %err, "reminder not scheduled");
                        }
                    } else {
                        info!(
                            task = %task.id,
                            time = %task.time,
                            "reminder not re-armed, due time already passed today"
                        );
                    }
                }
                Err(err) => {
                    warn!(task = %task.id, time = %task.time, error = %err, "invalid due time")
                }
            }
        }
        info!(armed = self.reminders.len(), "reminders re-armed");
    }
}

impl Drop for TodoApp {
    fn drop(&mut self) {
        if self.dirty && !self.shut_down {
            if let Err(err) = self.store.save() {
                error!(error = %err, "failed to save tasks on exit");
            }
        }
    }
}
