//! JSON helpers for package manager output

use serde::de::DeserializeOwned;
use tracing::warn;

/// Parse the first JSON document found in `output`
///
/// Anything before the first `{` is diagnostic preamble and is skipped, as is
/// anything after the document. Output with no document, or a malformed one,
/// yields `T::default()`: for these queries it most often just means there is
/// nothing to report.
pub(crate) fn parse_embedded_document<T>(output: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(start) = output.find('{') else {
        warn!("no JSON document in command output, assuming empty result");
        return T::default();
    };

    let mut stream = serde_json::Deserializer::from_str(&output[start..]).into_iter::<T>();
    match stream.next() {
        Some(Ok(document)) => document,
        Some(Err(e)) => {
            warn!(error = %e, "malformed JSON in command output, assuming empty result");
            T::default()
        }
        None => T::default(),
    }
}

/// Parse one JSON object per non-empty line
///
/// All or nothing: a single malformed line yields an empty list.
pub(crate) fn parse_json_lines<T>(output: &str) -> Vec<T>
where
    T: DeserializeOwned,
{
    let parsed: Result<Vec<T>, _> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(serde_json::from_str)
        .collect();

    parsed.unwrap_or_else(|e| {
        warn!(error = %e, "malformed JSON line in command output, assuming empty result");
        Vec::new()
    })
}
