use chrono::{DateTime, Utc};
use serde::Serialize;

/// One delta line on its way to the sink.
///
/// Records borrow from the snapshot they were cut from and live only for the
/// duration of a single `forward` call. The delivery target (endpoint and port)
/// belongs to the sink's own configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardRecord<'a> {
    pub line: &'a str,
    /// Address of the device the line was fetched from
    pub source: &'a str,
    /// Host name of the machine running the exporter
    pub host: &'a str,
    pub observed_at: DateTime<Utc>,
}

impl<'a> ForwardRecord<'a> {
    pub fn new(line: &'a str, source: &'a str, host: &'a str) -> Self {
        Self {
            line,
            source,
            host,
            observed_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
