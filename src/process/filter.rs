//! Line-oriented search over captured output
//!
//! Plain case-sensitive substring matching. Build logs are never parsed.

use crate::common::{Error, Result};

/// Lines of `output` containing `needle`, in original order, joined with `\n`
///
/// Returns an empty string when no line matches.
pub fn filter_output(output: &str, needle: &str) -> String {
    output
        .lines()
        .filter(|line| line.contains(needle))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether any line of `output` contains `needle`
pub fn contains_line(output: &str, needle: &str) -> bool {
    output.lines().any(|line| line.contains(needle))
}

/// Assert that the lines of `output` mentioning `line_filter` also mention
/// every one of `expected`
///
/// This is how a build log is checked for include paths: narrow it to the
/// compiler invocations for one source file, then look for each path there.
pub fn expect_in_filtered<S: AsRef<str>>(
    output: &str,
    line_filter: &str,
    expected: &[S],
) -> Result<String> {
    let filtered = filter_output(output, line_filter);
    if filtered.is_empty() {
        return Err(Error::assertion(format!(
            "no output line mentions '{}'",
            line_filter
        )));
    }

    let missing: Vec<&str> = expected
        .iter()
        .map(|s| s.as_ref())
        .filter(|needle| !filtered.contains(needle))
        .collect();

    if !missing.is_empty() {
        return Err(Error::assertion(format!(
            "lines mentioning '{}' do not contain {:?}:\n{}",
            line_filter, missing, filtered
        )));
    }

    Ok(filtered)
}
