pub mod diff;
pub mod error;
pub mod event;
pub mod iso_duration;
pub mod mailer;
pub mod monitor;
pub mod parse;
pub mod reader;
pub mod status;
pub mod ups;

pub use diff::diff;
pub use error::UPSError;
pub use event::{Event, EventMetadata, FieldValue};
pub use monitor::Monitor;
pub use reader::{PwrstatReader, Reader};
pub use status::*;
pub use ups::{SnapshotProvider, TestOptions, UPS};
