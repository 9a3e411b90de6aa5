use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format used for due times, e.g. `02:30 PM`.
pub const TIME_FORMAT: &str = "%I:%M %p";

/// Due time given to new tasks when the user picks none.
pub const DEFAULT_TIME: &str = "12:00 AM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        TaskId(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub text: String,
    pub time: String,
    #[serde(default)]
    pub image: String,
    // Files written before ids existed get a fresh one on load
    #[serde(default)]
    pub id: TaskId,
}

impl Task {
    pub fn new(text: String, time: String, image: Option<String>) -> Self {
        Self {
            text,
            time,
            image: image.unwrap_or_default(),
            id: TaskId::new(),
        }
    }

    pub fn image(&self) -> Option<&str> {
        if self.image.is_empty() {
            None
        } else {
            Some(&self.image)
        }
    }

    pub fn due_time(&self) -> Result<NaiveTime, chrono::ParseError> {
        parse_due_time(&self.time)
    }

    pub fn matches(&self, text: &str, time: &str) -> bool {
        self.text == text && self.time == time
    }
}

pub fn parse_due_time(time: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
}

pub fn format_due_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
