//! Worker process plumbing.
//!
//! This module provides the pieces the supervisor composes: the line
//! codec, the diagnostic-stream progress scraper, the command dispatcher,
//! the raw stream readers and the pre-flight availability check.

pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod preflight;
pub mod progress;
pub mod streams;

pub use codec::EventProtocolCodec;
pub use dispatcher::CommandDispatcher;
pub use error::{CodecError, DispatchError, SupervisorError};
pub use preflight::{check_worker, Availability};
pub use progress::{scrape_percent, ProgressScraper};
