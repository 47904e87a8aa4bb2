use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{Local, SecondsFormat};
use serde::Serialize;

/// Envelope written around every exported result.
#[derive(Debug, Serialize)]
pub struct JsonExport<'a, T: Serialize> {
    pub report: &'a str,
    pub generated_at: String,
    pub data: &'a T,
}

impl<'a, T: Serialize> JsonExport<'a, T> {
    pub fn new(report: &'a str, data: &'a T) -> Self {
        Self {
            report,
            generated_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            data,
        }
    }
}

pub fn to_json_string<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("serialize report")
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(
    path: P,
    report: &str,
    data: &T,
    pretty: bool,
) -> anyhow::Result<()> {
    let json = to_json_string(&JsonExport::new(report, data), pretty)?;
    fs::write(&path, json)
        .with_context(|| format!("write json report to {}", path.as_ref().display()))?;
    Ok(())
}
