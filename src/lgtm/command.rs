//! Recognition of `/lgtm` commands in comment text.
use std::sync::LazyLock;

use regex::Regex;

static LGTM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^/lgtm(?: no-issue)?\s*$").unwrap());
static LGTM_CANCEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^/lgtm cancel\s*$").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LgtmCommand {
    /// `/lgtm` or `/lgtm no-issue`
    Approve,
    /// `/lgtm cancel`
    Cancel,
}

/// Finds the command contained in a comment, if there is any.
///
/// The command has to be on its own line. When a comment contains both an approval and a
/// cancellation, the approval wins.
pub fn parse_command(text: &str) -> Option<LgtmCommand> {
    if LGTM_RE.is_match(text) {
        Some(LgtmCommand::Approve)
    } else if LGTM_CANCEL_RE.is_match(text) {
        Some(LgtmCommand::Cancel)
    } else {
        None
    }
}
