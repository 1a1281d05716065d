//! Hoop CLI Library
//!
//! Session JSON -> analysis -> report JSON + SHA256 digest

use anyhow::{Context, Result};
use hoop_core::{analyze, AnalysisConfig, FrameInput, VideoAnalysis};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

/// Materialized detections of one video, as produced by the upstream tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Frame rate of the source video; overrides `motion.fps` when present
    #[serde(default)]
    pub fps: Option<f64>,
    pub frames: Vec<FrameInput>,
}

/// Headline numbers printed after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub core_version: String,
    pub frames: usize,
    pub possessions: usize,
    pub passes: usize,
    pub interceptions: usize,
    pub tracks: usize,
    /// SHA256 of the compact JSON encoding of the analysis (hex)
    pub digest: String,
}

pub fn load_session(path: &Path) -> Result<Session> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    let session: Session = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse session JSON: {}", path.display()))?;
    Ok(session)
}

/// Explicit config file, else `HOOP_CONFIG`, else defaults.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(AnalysisConfig::from_env_or_default()),
    }
}

pub fn run_analysis(session: &Session, config: &AnalysisConfig) -> Result<VideoAnalysis> {
    let mut config = config.clone();
    if let Some(fps) = session.fps {
        config.motion.fps = fps;
    }

    info!(frames = session.frames.len(), fps = config.motion.fps, "analyzing session");
    let analysis = analyze(&config, &session.frames).context("Analysis failed")?;
    Ok(analysis)
}

/// Hex SHA256 of the compact JSON encoding. Equal inputs give equal digests.
pub fn analysis_digest(analysis: &VideoAnalysis) -> Result<String> {
    let bytes = serde_json::to_vec(analysis).context("Failed to serialize analysis")?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn summarize(analysis: &VideoAnalysis) -> Result<ReportSummary> {
    Ok(ReportSummary {
        core_version: hoop_core::VERSION.to_string(),
        frames: analysis.frames.len(),
        possessions: analysis.possessions.len(),
        passes: analysis.pass_count(),
        interceptions: analysis.interception_count(),
        tracks: analysis.motion.len(),
        digest: analysis_digest(analysis)?,
    })
}

pub fn write_report(path: &Path, analysis: &VideoAnalysis) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(analysis).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

pub fn load_report(path: &Path) -> Result<VideoAnalysis> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse report: {}", path.display()))
}
