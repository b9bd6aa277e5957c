pub mod matcher;
pub mod notifier;
pub mod poller;

pub use matcher::find_first_match;
pub use notifier::{compose_notification, NotificationMessage, Notifier, SmtpNotifier};
pub use poller::SlotPollerService;
