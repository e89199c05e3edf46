//! End-to-end comparison pipeline: own site + search results → frequency
//! table → generated analysis → compiled document.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use wordy_discovery::SearchProvider;
use wordy_fetch::Fetcher;
use wordy_shared::{FetchResult, Result, Source, WordyError};
use wordy_text::{FrequencyTable, TokenSequence, normalize};

use crate::compiler::DocumentCompiler;
use crate::generation::TextGenerator;
use crate::prompt::{AnalysisPayload, build_prompt};
use crate::render::FrequencyRenderer;

// ---------------------------------------------------------------------------
// Configuration and collaborators
// ---------------------------------------------------------------------------

/// Inputs for one comparison run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// The requester's own website.
    pub own_url: String,
    /// Search keyword used to discover competitors.
    pub keyword: String,
    /// Upper bound on discovered competitor URLs.
    pub result_count: usize,
    /// Per-page fetch timeout.
    pub fetch_timeout_secs: u64,
    /// Maximum competitor pages fetched at once.
    pub fetch_concurrency: usize,
    /// Where the compiled document is written.
    pub output_path: PathBuf,
}

/// External services the pipeline drives.
pub struct Collaborators<'a> {
    pub search: &'a dyn SearchProvider,
    pub generator: &'a dyn TextGenerator,
    pub renderer: &'a dyn FrequencyRenderer,
    pub compiler: &'a DocumentCompiler,
}

// ---------------------------------------------------------------------------
// States and reporting
// ---------------------------------------------------------------------------

/// Pipeline stages, entered strictly in declaration order until `Done`,
/// or `Failed` from any stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    CollectSelf,
    DiscoverCompetitors,
    FetchCompetitors,
    Aggregate,
    BuildPrompt,
    Generate,
    Compile,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CollectSelf => "CollectSelf",
            Self::DiscoverCompetitors => "DiscoverCompetitors",
            Self::FetchCompetitors => "FetchCompetitors",
            Self::Aggregate => "Aggregate",
            Self::BuildPrompt => "BuildPrompt",
            Self::Generate => "Generate",
            Self::Compile => "Compile",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Competitor fetch statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// URLs returned by search.
    pub discovered: usize,
    /// Fetched with usable text.
    pub fetched: usize,
    /// Fetched but produced no text.
    pub failed: usize,
    /// Skipped because they are the own site.
    pub skipped: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Path of the compiled document.
    pub artifact: PathBuf,
    /// Frequencies for the own site alone.
    pub own_table: FrequencyTable,
    /// Frequencies across the own site and every competitor.
    pub combined_table: FrequencyTable,
    /// Why the own site produced no text, if it did not.
    pub own_failure: Option<String>,
    pub competitors: FetchStats,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition, including `Done` and `Failed`.
    fn state(&self, state: PipelineState);
    /// Called after each competitor fetch completes.
    fn source_fetched(&self, url: &str, current: usize, total: usize);
    /// Called once the run succeeded.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn state(&self, _state: PipelineState) {}
    fn source_fetched(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run the full comparison.
///
/// 1. Fetch and tokenize the own site (an empty result is not fatal)
/// 2. Discover competitor URLs
/// 3. Fetch competitors, skipping the own site
/// 4. Aggregate frequencies and render them
/// 5. Build the prompt and generate the document
/// 6. Compile it to the output path
#[instrument(skip_all, fields(url = %config.own_url, keyword = %config.keyword))]
pub async fn run_analysis(
    config: &AnalysisConfig,
    collaborators: &Collaborators<'_>,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let own = Source::own(config.own_url.trim());

    info!("starting comparison pipeline");

    // --- CollectSelf ---
    enter(progress, PipelineState::CollectSelf);
    let fetcher = Fetcher::new(config.fetch_timeout_secs)
        .map_err(|e| fail(progress, PipelineState::CollectSelf, e))?;
    let own_fetch = fetcher.fetch(&own.url).await;
    if let Some(reason) = &own_fetch.failure {
        warn!(%reason, "own site produced no text, continuing with competitor content only");
    }
    let own_tokens = normalize(&own_fetch.text);

    // --- DiscoverCompetitors ---
    enter(progress, PipelineState::DiscoverCompetitors);
    let discovered = collaborators
        .search
        .discover(&config.keyword, config.result_count)
        .await
        .map_err(|e| fail(progress, PipelineState::DiscoverCompetitors, e))?;

    // --- FetchCompetitors ---
    enter(progress, PipelineState::FetchCompetitors);
    let (competitors, skipped) = select_competitors(&own, discovered.iter());
    let fetches = fetch_all(&fetcher, &competitors, config.fetch_concurrency, progress).await;

    let failed = fetches.iter().filter(|f| f.is_failure()).count();
    let stats = FetchStats {
        discovered: discovered.len(),
        fetched: fetches.len() - failed,
        failed,
        skipped,
    };
    info!(
        discovered = stats.discovered,
        fetched = stats.fetched,
        failed = stats.failed,
        skipped = stats.skipped,
        "competitor fetch complete"
    );

    // --- Aggregate ---
    enter(progress, PipelineState::Aggregate);
    let competitor_tokens: Vec<TokenSequence> =
        fetches.iter().map(|f| normalize(&f.text)).collect();
    let own_table = FrequencyTable::from_sequences([&own_tokens]);
    let combined_table =
        FrequencyTable::from_sequences(std::iter::once(&own_tokens).chain(&competitor_tokens));

    if let Err(e) = collaborators.renderer.render(&combined_table) {
        warn!(error = %e, "frequency visualization failed");
    }

    // --- BuildPrompt ---
    enter(progress, PipelineState::BuildPrompt);
    let payload =
        AnalysisPayload::assemble(&own_fetch.text, fetches.iter().map(|f| f.text.as_str()));
    let prompt = build_prompt(&payload);
    info!(
        payload_len = payload.len(),
        prompt_len = prompt.len(),
        "prompt built"
    );

    // --- Generate ---
    enter(progress, PipelineState::Generate);
    let markup = collaborators
        .generator
        .generate(&prompt)
        .await
        .map_err(|e| fail(progress, PipelineState::Generate, e))?;

    // --- Compile ---
    enter(progress, PipelineState::Compile);
    let artifact = collaborators
        .compiler
        .compile(&markup, &config.output_path)
        .await
        .map_err(|e| fail(progress, PipelineState::Compile, e))?;

    let report = RunReport {
        artifact,
        own_table,
        combined_table,
        own_failure: own_fetch.failure,
        competitors: stats,
        elapsed: start.elapsed(),
    };

    enter(progress, PipelineState::Done);
    progress.done(&report);

    info!(
        artifact = %report.artifact.display(),
        distinct_words = report.combined_table.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "comparison pipeline complete"
    );

    Ok(report)
}

fn enter(progress: &dyn ProgressReporter, state: PipelineState) {
    info!(%state, "entering state");
    progress.state(state);
}

fn fail(progress: &dyn ProgressReporter, state: PipelineState, err: WordyError) -> WordyError {
    error!(%state, error = %err, "pipeline failed");
    progress.state(PipelineState::Failed);
    err.in_state(state)
}

/// Turn discovered URLs into competitor sources, dropping the own site.
/// Returns the sources in discovery order and the number skipped.
fn select_competitors<'a, I>(own: &Source, discovered: I) -> (Vec<Source>, usize)
where
    I: IntoIterator<Item = &'a String>,
{
    let mut skipped = 0;
    let competitors = discovered
        .into_iter()
        .map(Source::competitor)
        .filter(|candidate| {
            if candidate.same_page(own) {
                info!(url = %candidate.url, "skipping own site in search results");
                skipped += 1;
                false
            } else {
                true
            }
        })
        .collect();
    (competitors, skipped)
}

/// Fetch every source with at most `concurrency` requests in flight.
/// Results come back in the order of `sources`.
async fn fetch_all(
    fetcher: &Fetcher,
    sources: &[Source],
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> Vec<FetchResult> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handles: Vec<_> = sources
        .iter()
        .map(|source| {
            let fetcher = fetcher.clone();
            let sem = semaphore.clone();
            let url = source.url.clone();
            tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                fetcher.fetch(&url).await
            })
        })
        .collect();

    let total = handles.len();
    let mut results = Vec::with_capacity(total);

    for (i, (handle, source)) in handles.into_iter().zip(sources).enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(url = %source.url, error = %e, "fetch task failed");
                FetchResult::failed(&source.url, None, format!("fetch task failed: {e}"))
            }
        };
        progress.source_fetched(&source.url, i + 1, total);
        results.push(result);
    }

    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
