use std::io::{self, Write};

use volley_core::error::{AppError, ErrorCategory};
use volley_core::run::RunReport;

pub const PAYLOAD_BEGIN: &str = "VVVVVVVVVVVVVVVV";
pub const PAYLOAD_END: &str = "----------------";

/// Why the report stopped before printing every outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&AppError> for Halt {
    fn from(err: &AppError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// Re-indent a JSON body with two spaces, keeping key order.
pub fn indent_json(url: &str, body: &[u8]) -> Result<String, AppError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| AppError::DecodeError {
            url: url.to_string(),
            message: format!("Response is not valid JSON: {e}"),
        })?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Print the session line, then each payload in arrival order until the
/// first failure.
pub fn write_report<W: Write>(out: &mut W, report: &RunReport) -> io::Result<Option<Halt>> {
    writeln!(out, "Session: {}", report.session)?;

    for outcome in report.aggregate.reportable() {
        let Some(body) = outcome.body() else {
            continue;
        };
        match indent_json(outcome.url(), body) {
            Ok(pretty) => {
                writeln!(out, "{PAYLOAD_BEGIN}")?;
                writeln!(out, "{pretty}")?;
                writeln!(out, "{PAYLOAD_END}")?;
            }
            Err(e) => return Ok(Some(Halt::from(&e))),
        }
    }

    Ok(report
        .aggregate
        .first_failure()
        .and_then(|outcome| outcome.error())
        .map(Halt::from))
}
