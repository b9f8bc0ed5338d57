//! Folder discovery and the bounded document pool

use anyhow::{Context, Result, bail};
use bankfusion_core::BankIdentity;
use futures_util::{StreamExt, stream};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::loader::is_supported;
use crate::pipeline::{Job, Origin, Pipeline, Processed};

/// Supported documents directly inside `dir`, sorted by name
fn documents_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut docs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    docs.sort();
    Ok(docs)
}

/// Bank folders directly inside `input_dir`, sorted by name
pub fn bank_folders(input_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut folders: Vec<(String, PathBuf)> = fs::read_dir(input_dir)
        .with_context(|| format!("read input dir {}", input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let name = p.file_name()?.to_string_lossy().into_owned();
            Some((name, p))
        })
        .collect();
    folders.sort();
    Ok(folders)
}

fn folder_jobs(name: &str, dir: &Path) -> Result<Vec<Job>> {
    let hint = name.parse::<BankIdentity>().ok();
    Ok(documents_in(dir)?
        .into_iter()
        .map(|path| Job {
            path,
            hint,
            origin: Origin::BankFolder(name.to_string()),
        })
        .collect())
}

/// Every document under each bank folder, then loose documents in `input_dir`
pub fn discover_all(input_dir: &Path) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();
    for (name, dir) in bank_folders(input_dir)? {
        jobs.extend(folder_jobs(&name, &dir)?);
    }
    jobs.extend(documents_in(input_dir)?.into_iter().map(Job::loose));
    Ok(jobs)
}

/// Documents of one bank folder. The name is matched case-insensitively.
pub fn discover_bank(input_dir: &Path, bank: &str) -> Result<Vec<Job>> {
    let Some((name, dir)) = bank_folders(input_dir)?
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(bank))
    else {
        bail!("no bank folder '{}' under {}", bank, input_dir.display());
    };
    folder_jobs(&name, &dir)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Report {
    pub succeeded: Vec<(PathBuf, Processed)>,
    pub failed: Vec<Failure>,
}

impl Report {
    pub fn print_summary(&self) {
        let rows: usize = self.succeeded.iter().map(|(_, p)| p.summary.total_transactions).sum();
        println!(
            "\nProcessed {} document(s): {} ok, {} failed, {} transaction(s)",
            self.succeeded.len() + self.failed.len(),
            self.succeeded.len(),
            self.failed.len(),
            rows
        );
        for f in &self.failed {
            println!("  FAILED [{}] {}: {}", f.kind, f.path.display(), f.message);
        }
    }
}

/// Process jobs over a bounded pool. Per-document failures are collected;
/// a failure that is fatal for the run stops the batch and is returned.
pub async fn run_batch(pipeline: &Pipeline, jobs: Vec<Job>, concurrency: usize) -> Result<Report> {
    let mut report = Report::default();
    let mut results = stream::iter(jobs)
        .map(|job| async move {
            let result = pipeline.process(&job).await;
            (job, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((job, result)) = results.next().await {
        match result {
            Ok(processed) => {
                println!(
                    "OK      {} -> {} ({} rows, {})",
                    job.path.display(),
                    processed.output.display(),
                    processed.summary.total_transactions,
                    processed.bank
                );
                report.succeeded.push((job.path, processed));
            }
            Err(e) if e.is_fatal_for_run() => {
                return Err(anyhow::Error::new(e).context(format!("aborting run at {}", job.path.display())));
            }
            Err(e) => {
                warn!(path = %job.path.display(), kind = e.kind(), error = %e, "document failed");
                println!("FAILED  {} [{}] {}", job.path.display(), e.kind(), e);
                report.failed.push(Failure {
                    path: job.path,
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_discovery_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("HDFC")).unwrap();
        fs::create_dir(root.join("misc")).unwrap();
        touch(&root.join("HDFC/b.pdf"));
        touch(&root.join("HDFC/a.txt"));
        touch(&root.join("HDFC/notes.md"));
        touch(&root.join("misc/c.json"));
        touch(&root.join("loose.txt"));

        let jobs = discover_all(root).unwrap();
        let names: Vec<String> = jobs
            .iter()
            .map(|j| j.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.pdf", "c.json", "loose.txt"]);
        assert_eq!(jobs[0].hint, Some(BankIdentity::Hdfc));
        assert_eq!(jobs[0].origin, Origin::BankFolder("HDFC".into()));
        assert_eq!(jobs[2].hint, None);
        assert_eq!(jobs[3].origin, Origin::Loose);
    }

    #[test]
    fn test_discover_bank_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("SBI")).unwrap();
        touch(&dir.path().join("SBI/jan.txt"));
        assert_eq!(discover_bank(dir.path(), "sbi").unwrap().len(), 1);
        assert!(discover_bank(dir.path(), "axis").is_err());
    }
}
