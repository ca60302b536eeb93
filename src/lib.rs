//! `storyreel` - narrated, captioned vertical videos from text stories
//!
//! # Pipeline
//!
//! - **Text**: clean a story for display, expand it for speech, chunk it for
//!   the voice engine ([`text`])
//! - **Speech**: synthesize chunks and join them into one narration track
//!   ([`speech`])
//! - **Timing**: word timestamps from a transcriber, mapped back onto the
//!   displayed words ([`align`])
//! - **Captions**: 2-3 word phrases as SRT and styled ASS tracks
//!   ([`captions`])
//! - **Video**: background window, crop, caption burn, speed change and
//!   metadata via ffmpeg ([`video`])
//! - **Batches**: selection, generation, publishing and record state
//!   ([`batch`], [`store`], [`publish`], [`schedule`])
//!
//! # Example
//!
//! ```rust
//! use storyreel::text;
//!
//! let prepared = text::prepare("TIFU", "I'm 17M and can't believe it", true);
//! assert_eq!(prepared.display, "TIFU. I'm 17M and can't believe it");
//! assert!(prepared.speech.contains("I am seventeen M and cannot believe it"));
//! ```

pub mod align;
pub mod batch;
pub mod captions;
pub mod config;
pub mod error;
pub mod generate;
pub mod job;
pub mod process;
pub mod publish;
pub mod schedule;
pub mod speech;
pub mod store;
pub mod text;
pub mod video;

pub use batch::{BatchReport, Candidate, ItemOutcome, Orchestrator};
pub use config::Config;
pub use error::{ReelError, Result};
pub use generate::{Engines, Generator};
pub use job::Job;
pub use publish::{CommandPublisher, PublishRequest, Publisher};
pub use store::{ContentItem, ContentRecord, ContentStore, GenerationStatus, JsonStore, MemoryStore};

/// Version of storyreel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
