use crate::error::FetchError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// One image to fetch: where it lives and what to call it on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTask {
    pub file_name: String,
    pub url: String,
}

/// Outcome of one attempted task. Success carries the bytes written.
#[derive(Debug)]
pub struct DownloadResult {
    pub task: DownloadTask,
    pub outcome: Result<u64, FetchError>,
}

/// Aggregate report over a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total_bytes: u64,
    pub results: Vec<DownloadResult>,
}

impl RunSummary {
    pub fn record(&mut self, result: DownloadResult) {
        match result.outcome {
            Ok(size) => {
                self.succeeded += 1;
                self.total_bytes += size;
            }
            Err(_) => self.failed += 1,
        }
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Loads the task list from a manifest file. `.json` files hold an array of
/// `{file_name, url}` objects; anything else is parsed as tab-separated
/// `name<TAB>url` lines. Duplicate URLs are dropped, first occurrence wins.
pub fn load_tasks(path: &str) -> Result<Vec<DownloadTask>> {
    let tasks = if path.ends_with(".json") {
        parse_json_manifest(path)?
    } else {
        parse_link_file(path)?
    };

    let mut seen = HashSet::new();
    Ok(dedup_locators(tasks, &mut seen))
}

fn parse_json_manifest(path: &str) -> Result<Vec<DownloadTask>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse manifest: {path}"))
}

fn parse_link_file(path: &str) -> Result<Vec<DownloadTask>> {
    let file = File::open(path).with_context(|| format!("Failed to open link file: {path}"))?;
    let reader = BufReader::new(file);

    let mut tasks = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;

        // Skip header
        if idx == 0 && line.starts_with("file_name") {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() >= 2 {
            tasks.push(DownloadTask {
                file_name: parts[0].trim().to_string(),
                url: parts[1].trim().to_string(),
            });
        } else {
            // Bare URL line, name it after the last path segment; lines with
            // no usable segment get an indexed name so they cannot collide
            let url = parts[0].trim().to_string();
            let file_name =
                file_name_from_url(&url).unwrap_or_else(|| format!("unnamed_{idx}"));
            tasks.push(DownloadTask { file_name, url });
        }
    }

    Ok(tasks)
}

/// Last path segment of the URL with any query string stripped. `None` when
/// the URL ends in a slash and offers no segment to name the file after.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let without_query = url.split('?').next().unwrap_or(url);
    let segment = without_query.rsplit('/').next().unwrap_or(without_query);
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Drops tasks whose URL is already in `seen`. The set is passed in rather
/// than held as ambient state so callers collecting from several sources can
/// share one.
pub fn dedup_locators(
    tasks: Vec<DownloadTask>,
    seen: &mut HashSet<String>,
) -> Vec<DownloadTask> {
    tasks
        .into_iter()
        .filter(|t| seen.insert(t.url.clone()))
        .collect()
}
