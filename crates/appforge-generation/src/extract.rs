//! Pull component code out of a model response

/// Strip a surrounding markdown fence, if any
///
/// Models often wrap the component in ```` ```jsx ```` fences and add prose
/// around it. The first fenced block wins and closes at the first fence
/// that starts a line; an unterminated fence runs to the end of the response.
/// Unfenced responses are returned trimmed.
#[must_use]
pub fn extract_code(response: &str) -> &str {
    let Some(open) = response.find("```") else {
        return response.trim();
    };
    let after_ticks = &response[open + 3..];
    // Skip the language tag line
    let body = match after_ticks.find('\n') {
        Some(newline) => &after_ticks[newline + 1..],
        None => return "",
    };
    match closing_fence(body) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Offset of the first fence that opens its line; fences inside code lines are content
fn closing_fence(body: &str) -> Option<usize> {
    body.match_indices("```").map(|(i, _)| i).find(|&i| {
        body[..i]
            .rsplit('\n')
            .next()
            .is_some_and(|line_start| line_start.trim().is_empty())
    })
}
