//! Conversion engine: format registry, job lifecycle and entry points.
//!
//! Every conversion goes through the same pipeline: path validation, job
//! creation, parse into the document model, render into the target format.
//! Identity paths skip parsing and rendering entirely.
//!
//! # Example
//!
//! ```no_run
//! use docshift::convert::Engine;
//! use docshift::Format;
//!
//! fn main() -> docshift::Result<()> {
//!     let engine = Engine::new();
//!     let result = engine.convert(b"# Title", Format::Markdown, Format::Html)?;
//!     println!("{}", String::from_utf8_lossy(&result.output));
//!     Ok(())
//! }
//! ```

mod engine;
mod job;
mod store;

pub use engine::Engine;
pub use job::{ConversionJob, JobSnapshot, JobStatus, PROGRESS_DONE, PROGRESS_PARSING};
pub use store::{JobObserver, JobStore, MemoryJobStore};

use crate::format::Format;
use crate::model::DocumentStats;
use crate::parser::ParseOptions;
use crate::render::RenderOptions;

/// Default input limit (5 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Parsing options
    pub parse: ParseOptions,

    /// Rendering options
    pub render: RenderOptions,

    /// Largest accepted input, in bytes
    pub max_input_bytes: usize,

    /// Whether to compute document statistics for results
    pub collect_stats: bool,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parsing options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Set the input size limit.
    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = limit;
        self
    }

    /// Enable statistics collection.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            render: RenderOptions::default(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            collect_stats: true,
        }
    }
}

/// One input of a batch conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Source payload
    pub content: Vec<u8>,
    /// Source format
    pub source: Format,
    /// Target format
    pub target: Format,
}

impl ConversionRequest {
    /// Create a request.
    pub fn new(content: impl Into<Vec<u8>>, source: Format, target: Format) -> Self {
        Self {
            content: content.into(),
            source,
            target,
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Converted bytes
    pub output: Vec<u8>,

    /// Final state of the job
    pub job: JobSnapshot,

    /// MIME type of the output
    pub mime_type: &'static str,

    /// Statistics of the parsed document (not collected for identity paths)
    pub stats: Option<DocumentStats>,
}

impl ConvertResult {
    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    /// Output as text, for the text formats.
    pub fn as_text(&self) -> Option<&str> {
        if self.job.target.is_text() {
            std::str::from_utf8(&self.output).ok()
        } else {
            None
        }
    }
}
