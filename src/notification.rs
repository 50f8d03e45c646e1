//! Transient desktop notification showing the final mixer state
//!
//! Notifications carry a stable message id so that a new one replaces the
//! previous one instead of stacking up.

use crate::error::NotifyError;
use crate::types::{GainLimits, GainValue};
use std::collections::HashMap;
use std::time::Duration;
use zbus::blocking::Connection;
use zbus::proxy;
use zbus::zvariant::Value;

/// Group label shown with every notification
pub const NOTIFICATION_GROUP: &str = "System Volume";

/// Message id shared by all notifications of this tool
pub const NOTIFICATION_MESSAGE_ID: &str = "volume_control_status";

/// Icon shown while the output is muted
pub const MUTED_ICON: &str = "audio-volume-muted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Information,
    Progress,
    Error,
}

/// Notification payload
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub group: String,
    pub message_id: String,
    /// Fraction in `[0, 1]`, progress notifications only
    pub progress: Option<f64>,
    pub icon: Option<String>,
    pub timeout: Duration,
}

impl Notification {
    fn new(kind: NotificationKind, title: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kind,
            title: title.into(),
            group: NOTIFICATION_GROUP.to_string(),
            message_id: NOTIFICATION_MESSAGE_ID.to_string(),
            progress: None,
            icon: None,
            timeout,
        }
    }

    pub fn error(title: impl Into<String>, timeout: Duration) -> Self {
        Self::new(NotificationKind::Error, title, timeout)
    }

    pub fn muted(timeout: Duration) -> Self {
        let mut notification = Self::new(NotificationKind::Information, "Audio Muted", timeout);
        notification.icon = Some(MUTED_ICON.to_string());
        notification
    }

    pub fn volume(volume: GainValue, limits: GainLimits, timeout: Duration) -> Self {
        let title = format!("Volume: {} dB", display_value(volume));
        let mut notification = Self::new(NotificationKind::Progress, title, timeout);
        notification.progress = Some(progress_fraction(volume, limits));
        notification
    }
}

/// Position of `volume` inside the gain range, as a fraction
///
/// A zero-width range reports a full bar.
pub fn progress_fraction(volume: GainValue, limits: GainLimits) -> f64 {
    let span = limits.span();
    if span <= 0.0 {
        return 1.0;
    }
    ((volume - limits.min) / span).clamp(0.0, 1.0)
}

/// Format a mixer value for display, printing negative zero as `0`
pub fn display_value(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Destination for notifications
pub trait NotificationSink {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: &HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Sends notifications to the freedesktop notification service on the
/// session bus
pub struct DesktopNotifier {
    proxy: NotificationsProxyBlocking<'static>,
}

impl DesktopNotifier {
    pub fn connect() -> Result<Self, NotifyError> {
        let connection = Connection::session()?;
        let proxy = NotificationsProxyBlocking::new(&connection)?;
        Ok(Self { proxy })
    }
}

impl NotificationSink for DesktopNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let expire_timeout = i32::try_from(notification.timeout.as_millis())
            .map_err(|_| NotifyError::Timeout(notification.timeout))?;

        // Notification daemons replace entries sharing one of these tags.
        let tag = Value::from(notification.message_id.as_str());
        let progress = notification
            .progress
            .map(|fraction| Value::from((fraction * 100.0).round() as i32));
        let urgency = Value::from(match notification.kind {
            NotificationKind::Error => 2u8,
            _ => 1u8,
        });

        let mut hints: HashMap<&str, &Value<'_>> = HashMap::new();
        hints.insert("x-canonical-private-synchronous", &tag);
        hints.insert("x-dunst-stack-tag", &tag);
        hints.insert("urgency", &urgency);
        if let Some(progress) = &progress {
            hints.insert("value", progress);
        }

        let id = self.proxy.notify(
            &notification.group,
            0,
            notification.icon.as_deref().unwrap_or(""),
            &notification.title,
            "",
            &[],
            &hints,
            expire_timeout,
        )?;
        tracing::debug!("Sent notification {} ({:?})", id, notification.kind);
        Ok(())
    }
}
