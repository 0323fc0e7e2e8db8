// crew-core library entry point
pub mod auth;
pub mod boundary;
pub mod catalog;
pub mod clock;
pub mod console;
pub mod deploy;
pub mod errors;
pub mod hashing;
pub mod images;
pub mod mail;
pub mod memory;
pub mod notes;
pub mod notify;
pub mod otp;
pub mod store;

pub use auth::{Account, AuthService, AuthStore, AuthUser, RecordAuthService, Session};
pub use boundary::{BlobFile, BlobStorage, ChangeEvent, ChangeFeed, ChangeHub, ChangeKind, RecordBackend};
pub use catalog::{CatalogStore, Illustrated};
pub use clock::{Clock, ManualClock, SystemClock};
pub use console::{Backends, Console, ConsoleOptions};
pub use deploy::{Deployment, DeploymentService};
pub use errors::CoreError;
pub use images::{ImageAttachments, ImageFolder};
pub use mail::{MailDispatcher, MailMessage, MailTemplate, RecordingMailer};
pub use memory::{InMemoryBackend, InMemoryBlobStorage};
pub use notes::NoteBoard;
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier, Operation, RecordingNotifier};
pub use otp::{OneTimePasscode, OtpService, PasscodeService};
pub use store::{apply_change, RecordHook, RecordStore, StatusHistory};
