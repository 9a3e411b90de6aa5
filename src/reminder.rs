use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, info, warn};

use crate::{
    notify::Notifier,
    task::{Task, TaskId},
};

/// Longest the event loop waits between reminder checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

pub const REMINDER_TITLE: &str = "⏰ Task Reminder";

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("invalid due time {time:?}: {source}")]
    InvalidTime {
        time: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task_id: TaskId,
    pub text: String,
    pub due_at: NaiveDateTime,
}

/// One-shot reminders ordered by due instant. The owner only has to wake up
/// at `next_due()`; nothing polls individual tasks.
#[derive(Debug, Default)]
pub struct ReminderScheduler {
    queue: BTreeSet<(NaiveDateTime, TaskId)>,
    armed: HashMap<TaskId, Reminder>,
}

/// Next instant at which `due` falls, counting the current minute as still
/// due.
pub fn next_occurrence(due: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(due);
    let minute_start = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    if today >= minute_start {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a reminder for `task`, replacing any reminder it already had.
    pub fn schedule(
        &mut self,
        task: &Task,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, ReminderError> {
        let due = task.due_time().map_err(|source| ReminderError::InvalidTime {
            time: task.time.clone(),
            source,
        })?;
        let due_at = next_occurrence(due, now);

        self.cancel(task.id);
        self.queue.insert((due_at, task.id));
        self.armed.insert(
            task.id,
            Reminder {
                task_id: task.id,
                text: task.text.clone(),
                due_at,
            },
        );
        debug!(task = %task.id, %due_at, "reminder armed");
        Ok(due_at)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.armed.remove(&id) {
            Some(reminder) => {
                self.queue.remove(&(reminder.due_at, id));
                debug!(task = %id, "reminder cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, id: TaskId) -> bool {
        self.armed.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    pub fn next_due(&self) -> Option<NaiveDateTime> {
        self.queue.first().map(|(at, _)| *at)
    }

    /// Time until the next reminder is due, capped at the poll interval.
    pub fn wait_timeout(&self, now: NaiveDateTime) -> Duration {
        match self.next_due() {
            Some(due) => (due - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(POLL_INTERVAL),
            None => POLL_INTERVAL,
        }
    }

    /// Retires and returns every reminder due at or before `now`.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
        let mut due = Vec::new();
        while let Some(&(at, id)) = self.queue.first() {
            if at > now {
                break;
            }
            self.queue.pop_first();
            if let Some(reminder) = self.armed.remove(&id) {
                due.push(reminder);
            }
        }
        due
    }

    /// Delivers every due reminder once. A failed delivery still retires the
    /// reminder.
    pub fn fire_due(&mut self, now: NaiveDateTime, notifier: &dyn Notifier) -> Vec<TaskId> {
        self.take_due(now)
            .into_iter()
            .map(|reminder| {
                let message = format!("Time for: {}", reminder.text);
                match notifier.notify(REMINDER_TITLE, &message, NOTIFICATION_TIMEOUT) {
                    Ok(()) => {
                        info!(task = %reminder.task_id, due_at = %reminder.due_at, "reminder fired")
                    }
                    Err(err) => {
                        warn!(task = %reminder.task_id, error = %err, "reminder not delivered")
                    }
                }
                reminder.task_id
            })
            .collect()
    }
}
