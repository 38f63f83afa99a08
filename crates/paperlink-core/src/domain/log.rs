//! Log stream wire types.
//!
//! The worker pushes UTF-8 JSON text frames over the log stream:
//!
//! - `{"module": "analyze", "message": "..."}` for log lines
//! - `{"type": "progress", "data": {...}}` for analysis progress
//! - the literal `pong` in reply to a keepalive `ping`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MalformedMessage;

/// Outbound keepalive payload.
pub const PING_PAYLOAD: &str = "ping";

/// Worker reply to [`PING_PAYLOAD`].
pub const PONG_PAYLOAD: &str = "pong";

/// Logical log channel, one per UI panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogModule {
    Analyze,
    Config,
    Env,
}

impl LogModule {
    pub const ALL: [Self; 3] = [Self::Analyze, Self::Config, Self::Env];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::Config => "config",
            Self::Env => "env",
        }
    }
}

impl fmt::Display for LogModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogModule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analyze" => Ok(Self::Analyze),
            "config" => Ok(Self::Config),
            "env" => Ok(Self::Env),
            other => Err(format!("unknown log module: {other}")),
        }
    }
}

/// A single log line routed to one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub module: LogModule,
    pub message: String,
}

impl LogEvent {
    pub fn new(module: LogModule, message: impl Into<String>) -> Self {
        Self {
            module,
            message: message.into(),
        }
    }
}

/// Progress of the running analysis, as reported by the worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeProgress {
    /// File currently being processed.
    pub current_file: Option<String>,
    /// Pipeline step name (e.g. `parsing`, `extracting`).
    pub current_step: Option<String>,
    /// 1-based index of the current file.
    pub current_file_index: u32,
    pub total_files: u32,
    /// Overall percentage, 0-100.
    pub progress: f64,
}

impl AnalyzeProgress {
    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }
}

/// A successfully decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Log(LogEvent),
    Progress(AnalyzeProgress),
    Pong,
}

const PROGRESS_KIND: &str = "progress";

#[derive(Deserialize)]
#[serde(untagged)]
enum WireFrame {
    Typed {
        #[serde(rename = "type")]
        kind: String,
        data: AnalyzeProgress,
    },
    Log(LogEvent),
}

impl InboundFrame {
    /// Decode one text payload from the log stream.
    pub fn parse(payload: &str) -> Result<Self, MalformedMessage> {
        if payload.trim() == PONG_PAYLOAD {
            return Ok(Self::Pong);
        }

        match serde_json::from_str::<WireFrame>(payload) {
            Ok(WireFrame::Log(event)) => Ok(Self::Log(event)),
            Ok(WireFrame::Typed { kind, data }) if kind == PROGRESS_KIND => {
                Ok(Self::Progress(data))
            }
            Ok(WireFrame::Typed { kind, .. }) => Err(MalformedMessage::new(
                payload,
                format!("unsupported frame type: {kind}"),
            )),
            Err(e) => Err(MalformedMessage::new(payload, e.to_string())),
        }
    }
}
