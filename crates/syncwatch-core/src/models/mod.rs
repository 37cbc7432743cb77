pub mod notification;
pub mod task;
pub mod upload;

pub use notification::NotificationEvent;
pub use task::{is_transient_name, is_transient_path, FileTask};
pub use upload::{FailureKind, UploadOutcome, UploadRecord, UploadStatus};
