//! The conversion engine.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use super::job::{ConversionJob, PROGRESS_PARSING};
use super::store::JobObserver;
use super::{ConversionRequest, ConvertOptions, ConvertResult};
use crate::error::{ConversionError, Error, Result};
use crate::format::{is_valid_path, Format};
use crate::model::{Block, Document, DocumentStats};
use crate::parser::{DocumentParser, HtmlParser, MarkdownParser};
use crate::render::{DocumentRenderer, HtmlRenderer, MarkdownRenderer, PdfRenderer};

/// Converts documents between formats.
///
/// The engine holds its registry, options and an optional observer, none of
/// which change during a conversion, so one engine can serve concurrent
/// callers.
pub struct Engine {
    parsers: HashMap<Format, Arc<dyn DocumentParser>>,
    renderers: HashMap<Format, Arc<dyn DocumentRenderer>>,
    options: ConvertOptions,
    observer: Option<Arc<dyn JobObserver>>,
}

impl Engine {
    /// Create an engine with the built-in parsers and renderers.
    pub fn new() -> Self {
        Self::with_options(ConvertOptions::default())
    }

    /// Create an engine with the built-in parsers and renderers and custom options.
    pub fn with_options(options: ConvertOptions) -> Self {
        let mut engine = Self::empty(options);
        engine.register_parser(Arc::new(MarkdownParser::new()));
        engine.register_parser(Arc::new(HtmlParser::new()));
        engine.register_renderer(Arc::new(MarkdownRenderer::new()));
        engine.register_renderer(Arc::new(HtmlRenderer::new()));
        engine.register_renderer(Arc::new(PdfRenderer::new()));
        engine
    }

    /// Create an engine with no parsers or renderers registered.
    pub fn empty(options: ConvertOptions) -> Self {
        Self {
            parsers: HashMap::new(),
            renderers: HashMap::new(),
            options,
            observer: None,
        }
    }

    /// Publish every job transition to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Register a parser, replacing any parser for the same format.
    pub fn register_parser(&mut self, parser: Arc<dyn DocumentParser>) {
        self.parsers.insert(parser.format(), parser);
    }

    /// Register a renderer, replacing any renderer for the same format.
    pub fn register_renderer(&mut self, renderer: Arc<dyn DocumentRenderer>) {
        self.renderers.insert(renderer.format(), renderer);
    }

    /// Conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Check whether this engine can convert `source` into `target`.
    pub fn supports(&self, source: Format, target: Format) -> bool {
        is_valid_path(source, target)
            && (source == target
                || (self.parsers.contains_key(&source) && self.renderers.contains_key(&target)))
    }

    /// Validate a request and create its job.
    ///
    /// Fails with [`Error::UnsupportedPath`] or [`Error::InputTooLarge`]
    /// without creating a job.
    pub fn start(
        &self,
        content: impl Into<Vec<u8>>,
        source: Format,
        target: Format,
    ) -> Result<ConversionJob> {
        check_path(source, target)?;
        let content = content.into();
        self.check_size(content.len())?;

        let job = ConversionJob::new(content, source, target);
        log::debug!(
            "job {} created: {} to {}, {} bytes",
            job.id(),
            source,
            target,
            job.input_bytes()
        );
        self.publish(&job);
        Ok(job)
    }

    /// Run a pending job to completion and return the output.
    pub fn run(&self, job: &mut ConversionJob) -> Result<Vec<u8>> {
        self.execute(job).map(|(output, _)| output)
    }

    /// Convert a payload from `source` to `target`.
    pub fn convert(&self, content: &[u8], source: Format, target: Format) -> Result<ConvertResult> {
        let mut job = self.start(content, source, target)?;
        let (output, stats) = self.execute(&mut job)?;
        Ok(ConvertResult {
            output,
            job: job.snapshot(),
            mime_type: target.mime_type(),
            stats,
        })
    }

    /// Read a file and convert it.
    pub fn convert_file(
        &self,
        path: impl AsRef<Path>,
        source: Format,
        target: Format,
    ) -> Result<ConvertResult> {
        let path = path.as_ref();
        check_path(source, target)?;
        let size = fs::metadata(path)?.len();
        self.check_size(usize::try_from(size).unwrap_or(usize::MAX))?;
        let content = fs::read(path)?;
        self.convert(&content, source, target)
    }

    /// Convert independent inputs in parallel. Results keep input order and
    /// every input succeeds or fails on its own.
    pub fn convert_batch(&self, inputs: &[ConversionRequest]) -> Vec<Result<ConvertResult>> {
        log::debug!("batch of {} conversions", inputs.len());
        inputs
            .par_iter()
            .map(|request| self.convert(&request.content, request.source, request.target))
            .collect()
    }

    /// Parse several inputs of the same format and render them as one
    /// document, separated by horizontal rules. Needs at least two inputs.
    pub fn concatenate(
        &self,
        inputs: &[&[u8]],
        source: Format,
        target: Format,
    ) -> Result<ConvertResult> {
        check_path(source, target)?;
        if inputs.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "concatenation needs at least 2 inputs, got {}",
                inputs.len()
            )));
        }
        let total = inputs.iter().map(|input| input.len()).sum();
        self.check_size(total)?;

        let mut job = ConversionJob::for_parts(total, source, target);
        self.publish(&job);
        job.begin()?;
        self.publish(&job);

        match self.concatenate_parts(&mut job, inputs) {
            Ok((output, stats)) => {
                job.complete()?;
                self.publish(&job);
                log::debug!("job {} concatenated {} inputs", job.id(), inputs.len());
                Ok(ConvertResult {
                    output,
                    job: job.snapshot(),
                    mime_type: target.mime_type(),
                    stats,
                })
            }
            Err(cause) => Err(self.fail(&mut job, cause)),
        }
    }

    /// Convert on the blocking thread pool.
    #[cfg(feature = "async")]
    pub async fn convert_async(
        self: Arc<Self>,
        content: Vec<u8>,
        source: Format,
        target: Format,
    ) -> Result<ConvertResult> {
        tokio::task::spawn_blocking(move || self.convert(&content, source, target))
            .await
            .map_err(|e| Error::Other(format!("conversion task failed: {}", e)))?
    }

    fn execute(&self, job: &mut ConversionJob) -> Result<(Vec<u8>, Option<DocumentStats>)> {
        job.begin()?;
        self.publish(job);

        if job.is_identity() {
            let output = job.take_content();
            job.complete()?;
            self.publish(job);
            log::debug!("job {} completed (identity)", job.id());
            return Ok((output, None));
        }

        match self.parse_and_render(job) {
            Ok(result) => {
                job.complete()?;
                self.publish(job);
                log::debug!("job {} completed", job.id());
                Ok(result)
            }
            Err(cause) => Err(self.fail(job, cause)),
        }
    }

    fn parse_and_render(
        &self,
        job: &mut ConversionJob,
    ) -> Result<(Vec<u8>, Option<DocumentStats>)> {
        let parser = self.parser(job.source())?;
        let renderer = self.renderer(job.target())?;

        job.advance(PROGRESS_PARSING)?;
        self.publish(job);
        let doc = parser.parse(job.content(), &self.options.parse)?;
        self.render(renderer.as_ref(), &doc)
    }

    fn concatenate_parts(
        &self,
        job: &mut ConversionJob,
        inputs: &[&[u8]],
    ) -> Result<(Vec<u8>, Option<DocumentStats>)> {
        let parser = self.parser(job.source())?;
        let renderer = self.renderer(job.target())?;

        job.advance(PROGRESS_PARSING)?;
        self.publish(job);

        let mut merged: Option<Document> = None;
        for (i, input) in inputs.iter().enumerate() {
            let doc = parser
                .parse(input, &self.options.parse)
                .map_err(|e| match e {
                    Error::Parse(msg) => Error::Parse(format!("input {}: {}", i + 1, msg)),
                    other => other,
                })?;
            match merged.as_mut() {
                None => merged = Some(doc),
                Some(acc) => {
                    acc.add_block(Block::HorizontalRule);
                    acc.append(doc);
                }
            }
        }
        let merged = merged.unwrap_or_default();
        self.render(renderer.as_ref(), &merged)
    }

    fn render(
        &self,
        renderer: &dyn DocumentRenderer,
        doc: &Document,
    ) -> Result<(Vec<u8>, Option<DocumentStats>)> {
        let output = renderer.render(doc, &self.options.render)?;
        let stats = self.options.collect_stats.then(|| doc.stats());
        Ok((output, stats))
    }

    fn parser(&self, format: Format) -> Result<Arc<dyn DocumentParser>> {
        self.parsers
            .get(&format)
            .cloned()
            .ok_or_else(|| Error::Other(format!("no parser registered for {}", format)))
    }

    fn renderer(&self, format: Format) -> Result<Arc<dyn DocumentRenderer>> {
        self.renderers
            .get(&format)
            .cloned()
            .ok_or_else(|| Error::Other(format!("no renderer registered for {}", format)))
    }

    /// Mark the job failed and wrap the cause. A job that cannot be failed
    /// any more yields the transition error instead.
    fn fail(&self, job: &mut ConversionJob, cause: Error) -> Error {
        if let Err(err) = job.fail(cause.to_string()) {
            return err;
        }
        log::error!(
            "job {} failed ({} to {}): {}",
            job.id(),
            job.source(),
            job.target(),
            cause
        );
        self.publish(job);
        ConversionError::new(job.source(), job.target(), job.id(), cause).into()
    }

    fn publish(&self, job: &ConversionJob) {
        if let Some(observer) = &self.observer {
            observer.on_update(&job.snapshot());
        }
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.options.max_input_bytes {
            return Err(Error::InputTooLarge {
                size,
                limit: self.options.max_input_bytes,
            });
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parsers: Vec<_> = self.parsers.keys().collect();
        parsers.sort();
        let mut renderers: Vec<_> = self.renderers.keys().collect();
        renderers.sort();
        f.debug_struct("Engine")
            .field("parsers", &parsers)
            .field("renderers", &renderers)
            .field("options", &self.options)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

fn check_path(source: Format, target: Format) -> Result<()> {
    if is_valid_path(source, target) {
        Ok(())
    } else {
        log::debug!("rejected unsupported path {} to {}", source, target);
        Err(Error::UnsupportedPath {
            from: source,
            to: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{JobStatus, JobStore, MemoryJobStore};
    use crate::error::ErrorKind;
    use crate::parser::ParseOptions;

    #[test]
    fn test_markdown_to_html() {
        let engine = Engine::new();
        let result = engine
            .convert(b"# Title\n\nSome *text*.", Format::Markdown, Format::Html)
            .unwrap();
        let html = result.as_text().unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
        assert_eq!(result.mime_type, "text/html");
        assert_eq!(result.job.status, JobStatus::Completed);
        assert_eq!(result.job.progress, 100);
        assert_eq!(result.stats.unwrap().heading_count, 1);
    }

    #[test]
    fn test_identity_returns_input() {
        let engine = Engine::new();
        let input = b"not even <valid html";
        let result = engine.convert(input, Format::Html, Format::Html).unwrap();
        assert_eq!(result.output, input.to_vec());
        assert!(result.stats.is_none());

        // PDF identity does not look at the bytes either
        let result = engine.convert(b"junk", Format::Pdf, Format::Pdf).unwrap();
        assert_eq!(result.output, b"junk".to_vec());
    }

    #[test]
    fn test_unsupported_path_creates_no_job() {
        let store = Arc::new(MemoryJobStore::new());
        let engine = Engine::new().with_observer(store.clone());
        let err = engine
            .convert(b"%PDF-1.4", Format::Pdf, Format::Markdown)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedPath { .. }));
        assert_eq!(err.kind(), ErrorKind::UnsupportedPath);
        assert!(store.is_empty());
    }

    #[test]
    fn test_start_then_run() {
        let engine = Engine::new();
        let mut job = engine
            .start(b"- a\n- b".to_vec(), Format::Markdown, Format::Html)
            .unwrap();
        assert_eq!(job.status(), JobStatus::Pending);

        let output = engine.run(&mut job).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("<li>a</li>"));
        assert_eq!(job.status(), JobStatus::Completed);

        // A finished job cannot run again
        assert!(matches!(
            engine.run(&mut job),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_parse_failure_marks_job_failed() {
        let store = Arc::new(MemoryJobStore::new());
        let engine = Engine::new().with_observer(store.clone());
        let err = engine
            .convert(&[0xFF, 0xFE, 0x00], Format::Markdown, Format::Html)
            .unwrap_err();

        let conversion = err.as_conversion().unwrap();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("markdown"));
        assert!(err.to_string().contains("html"));

        let job = store.get(&conversion.job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.progress < 100);
        assert!(!job.error.unwrap().is_empty());
    }

    #[test]
    fn test_strict_html_failure() {
        let options =
            ConvertOptions::default().with_parse_options(ParseOptions::new().strict());
        let engine = Engine::with_options(options);
        let err = engine
            .convert(b"<p><b>broken</i>", Format::Html, Format::Markdown)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.kind().is_client_error());
    }

    #[test]
    fn test_input_limit() {
        let engine = Engine::with_options(ConvertOptions::default().with_max_input_bytes(8));
        let err = engine
            .convert(b"# far too long", Format::Markdown, Format::Html)
            .unwrap_err();
        assert!(matches!(err, Error::InputTooLarge { size: 14, limit: 8 }));
    }

    #[test]
    fn test_missing_renderer_is_internal() {
        let mut engine = Engine::empty(ConvertOptions::default());
        engine.register_parser(Arc::new(MarkdownParser::new()));
        assert!(!engine.supports(Format::Markdown, Format::Html));
        assert!(engine.supports(Format::Markdown, Format::Markdown));

        let err = engine
            .convert(b"# x", Format::Markdown, Format::Html)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_concatenate() {
        let engine = Engine::new();
        let result = engine
            .concatenate(
                &[b"# One".as_slice(), b"# Two".as_slice()],
                Format::Markdown,
                Format::Html,
            )
            .unwrap();
        let html = result.as_text().unwrap();
        assert_eq!(html, "<h1>One</h1>\n<hr />\n<h1>Two</h1>\n");
        assert_eq!(result.job.input_bytes, 10);

        let err = engine
            .concatenate(&[b"# One".as_slice()], Format::Markdown, Format::Html)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
