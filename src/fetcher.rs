use crate::error::FetchError;
use crate::models::{DownloadResult, DownloadTask, RunSummary};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderValue, ACCEPT, LOCATION, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// Per-run fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Downloads smaller than this are deleted and counted as failures.
    pub min_bytes: u64,
    /// Pause after each successful download.
    pub delay: Duration,
    /// Per-request timeout; the in-flight request is aborted when it fires.
    pub timeout: Duration,
    /// Maximum 301/302 hops followed before giving up on a task.
    pub max_redirects: u32,
    pub user_agent: String,
    pub referer: Option<String>,
    pub accept: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            min_bytes: 5000,
            delay: Duration::from_millis(2500),
            timeout: Duration::from_secs(30),
            max_redirects: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: None,
            accept: DEFAULT_ACCEPT.to_string(),
        }
    }
}

/// Sequential, best-effort downloader. One request in flight at a time; every
/// failure is recorded and the run moves on to the next task.
pub struct Fetcher {
    client: Client,
    output_dir: PathBuf,
    options: FetchOptions,
}

impl Fetcher {
    /// Creates the output directory and the HTTP client. Redirects are
    /// followed manually in [`Fetcher::fetch`] so the hop count can be
    /// bounded, so the client's own redirect handling is disabled.
    pub fn new(output_dir: &str, options: FetchOptions) -> Result<Self> {
        let output_path = PathBuf::from(output_dir);
        fs::create_dir_all(&output_path)
            .with_context(|| format!("Failed to create output directory: {output_dir}"))?;

        let client = Client::builder()
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            output_dir: output_path,
            options,
        })
    }

    /// Downloads every task in order, waiting `delay` after each success.
    /// Failures skip the delay and move straight to the next task.
    pub async fn run(&self, tasks: Vec<DownloadTask>) -> RunSummary {
        let mut summary = RunSummary::default();

        let pb = ProgressBar::new(tasks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:30} {bar:40} {pos}/{len}")
                .unwrap()
                .progress_chars("=>-"),
        );

        for task in tasks {
            pb.set_message(task.file_name.clone());

            let outcome = self.fetch(&task).await;
            match &outcome {
                Ok(size) => {
                    pb.println(format!("  {} OK ({:.1} KB)", task.file_name, *size as f64 / 1024.0));
                }
                Err(e) => {
                    tracing::warn!(file = %task.file_name, error = %e, "download failed");
                    pb.println(format!("  {} FAILED: {}", task.file_name, e));
                }
            }

            let succeeded = outcome.is_ok();
            summary.record(DownloadResult { task, outcome });
            pb.inc(1);

            if succeeded && !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
        }

        pb.finish_and_clear();
        summary
    }

    /// Fetches one task: bounded redirect following, streamed write to a
    /// `.part` file, minimum-size check, then rename into place. Returns the
    /// bytes written on success.
    pub async fn fetch(&self, task: &DownloadTask) -> Result<u64, FetchError> {
        let output_path = self.output_dir.join(&task.file_name);
        let partial_path = PathBuf::from(format!("{}.part", output_path.display()));

        let mut url = task.url.clone();
        let mut hops = 0u32;

        let response = loop {
            let mut request = self
                .client
                .get(&url)
                .header(USER_AGENT, &self.options.user_agent)
                .header(ACCEPT, &self.options.accept);
            if let Some(referer) = &self.options.referer {
                request = request.header(REFERER, referer);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
                hops += 1;
                if hops > self.options.max_redirects {
                    return Err(FetchError::RedirectLoop(self.options.max_redirects));
                }
                url = resolve_location(&url, response.headers().get(LOCATION))?;
                tracing::debug!(%url, hops, "following redirect");
                continue;
            }

            if status != StatusCode::OK {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            break response;
        };

        let written = match self.write_body(response, &partial_path).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&partial_path);
                return Err(e);
            }
        };

        if written < self.options.min_bytes {
            fs::remove_file(&partial_path)?;
            return Err(FetchError::TooSmall(written));
        }

        fs::rename(&partial_path, &output_path)?;
        tracing::debug!(file = %task.file_name, bytes = written, "saved");

        Ok(written)
    }

    async fn write_body(
        &self,
        mut response: reqwest::Response,
        partial_path: &PathBuf,
    ) -> Result<u64, FetchError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(partial_path)?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)?;
            written += chunk.len() as u64;
        }

        Ok(written)
    }
}

/// Resolves a `Location` header against the URL that produced it. Relative
/// targets are joined the way a browser would.
fn resolve_location(current: &str, location: Option<&HeaderValue>) -> Result<String, FetchError> {
    let target = location
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| FetchError::Network("redirect without a Location header".to_string()))?;

    let base = Url::parse(current)
        .map_err(|e| FetchError::Network(format!("bad URL {current}: {e}")))?;
    let next = base
        .join(target)
        .map_err(|e| FetchError::Network(format!("bad redirect target {target}: {e}")))?;

    Ok(next.into())
}
