use std::time::Duration;

use notify_rust::{Notification, Timeout};
use tracing::info;

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub(crate) String);

/// Delivers a reminder to the user.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<(), NotifyError>;
}

/// Desktop notifications through the platform notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<(), NotifyError> {
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        Notification::new()
            .summary(title)
            .body(message)
            .appname(&self.app_name)
            .icon("alarm-clock")
            .timeout(Timeout::Milliseconds(millis))
            .show()
            .map_err(|err| NotifyError(err.to_string()))?;
        Ok(())
    }
}

/// Writes reminders to the log only. Used with `--no-notify`.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str, _timeout: Duration) -> Result<(), NotifyError> {
        info!(title, message, "reminder");
        Ok(())
    }
}
