//! Platform collaborators: the OS notification service, attachment fetching,
//! and an in-process implementation driven by tokio timers.

mod attachment;
mod service;
mod simulated;

pub use attachment::{Attachment, AttachmentError, AttachmentFetcher, FileAttachments, NoAttachments};
pub use service::{
    NotificationPayload, NotificationRequest, NotificationService, PlatformError, PlatformEvent,
    TriggerSpec,
};
pub use simulated::{LocalNotificationCenter, SimulatedPermissions};
