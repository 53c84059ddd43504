//! Worker event tools.

pub mod events;
pub mod fetch;
pub mod lifecycle;

pub use events::{
    NotificationClickParams, PushParams, SyncParams, notification_click_impl, push_impl, sync_impl,
};
pub use fetch::{FetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl, status_impl, teardown_impl};
