//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use xdplab_common::XdpAction;
use xdplab_dataplane::engine::EngineStatsSnapshot;
use xdplab_dataplane::stats::DataRecSnapshot;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Result for one replayed frame
#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub line: usize,
    pub ingress: u32,
    #[serde(flatten)]
    pub action: XdpAction,
    pub len: usize,
    pub frame: String,
}

/// Per-interface counters
#[derive(Debug, Serialize)]
pub struct InterfaceReport {
    pub ifindex: u32,
    #[serde(flatten)]
    pub stats: DataRecSnapshot,
}

/// Run summary
#[derive(Debug, Serialize)]
pub struct Summary {
    pub program: &'static str,
    pub engine: EngineStatsSnapshot,
    pub interfaces: Vec<InterfaceReport>,
}

impl OutputFormat {
    pub fn print_frame(&self, report: &FrameReport) {
        match self {
            OutputFormat::Text => {
                println!(
                    "line {:>4}  if {:>3}  {:<18} {:>5}B  {}",
                    report.line,
                    report.ingress,
                    report.action.to_string(),
                    report.len,
                    report.frame
                );
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(report).unwrap_or_default());
            }
            // Frames go into the summary document
            OutputFormat::Yaml => {}
        }
    }

    pub fn print_summary(&self, summary: &Summary, frames: &[FrameReport]) {
        match self {
            OutputFormat::Text | OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(summary).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                #[derive(Serialize)]
                struct Document<'a> {
                    frames: &'a [FrameReport],
                    summary: &'a Summary,
                }
                let doc = Document { frames, summary };
                println!("{}", serde_yaml::to_string(&doc).unwrap_or_default());
            }
        }
    }
}
