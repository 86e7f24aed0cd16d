//! Query string parsing and formatting for the `executions` command.
//!
//! The strings use the same keys as the history view's URL
//! (`keyword`, `date`, `status`, `env`, `datasets`, `exec`, `camp`, `tags`)
//! and are percent-encoded the way a browser would.

use reqwest::Url;

use chutney_execution_history::QueryParams;

use crate::error::CliError;

const PLACEHOLDER_BASE: &str = "http://localhost/";

/// Parse a `k=v&k2=v2` query string. A leading `?` is accepted.
///
/// Later occurrences of a key replace earlier ones.
pub fn parse_query_string(raw: &str) -> Result<QueryParams, CliError> {
    let raw = raw.trim().trim_start_matches('?');
    let mut url = Url::parse(PLACEHOLDER_BASE)
        .map_err(|e| CliError::Command(format!("invalid query string: {e}")))?;
    url.set_query(Some(raw));

    Ok(url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}

/// Format query parameters as a percent-encoded `k=v&..` string (without `?`).
pub fn format_query_string(params: &QueryParams) -> String {
    if params.is_empty() {
        return String::new();
    }
    match Url::parse(PLACEHOLDER_BASE) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(params.iter());
            url.query().unwrap_or_default().to_owned()
        }
        Err(_) => String::new(),
    }
}
