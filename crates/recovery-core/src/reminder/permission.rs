use serde::{Deserialize, Serialize};

/// Answer of the host's notification-permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Host capability that asks the user for notification permission.
pub trait NotificationPermission {
    fn request(&self) -> PermissionStatus;
}

/// Permission with a fixed answer, for hosts without a prompt and for tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub PermissionStatus);

impl NotificationPermission for StaticPermission {
    fn request(&self) -> PermissionStatus {
        self.0
    }
}

impl<F> NotificationPermission for F
where
    F: Fn() -> PermissionStatus,
{
    fn request(&self) -> PermissionStatus {
        self()
    }
}
