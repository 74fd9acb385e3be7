//! Notification authorization tracking.

mod gate;

pub use gate::{
    AuthorizationOptions, PermissionGate, PermissionService, PermissionState, PermissionStatus,
};
