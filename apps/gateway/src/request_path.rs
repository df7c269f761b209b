use labmesh_core::{AppError, AppResult};

/// Refuses request paths that the upstream URL would resolve differently
/// from how the gateway matched them.
///
/// Public-path matching, routing and forwarding all work on the raw path, so
/// dot segments (plain or percent-encoded), backslashes and an empty leading
/// segment are rejected instead of normalized.
pub fn ensure_canonical(path: &str) -> AppResult<()> {
    if !path.starts_with('/') || path.starts_with("//") {
        return Err(rejected(path, "must start with a single '/'"));
    }

    let lowered = path.to_ascii_lowercase();
    if lowered.contains('\\') || lowered.contains("%5c") {
        return Err(rejected(path, "must not contain backslashes"));
    }

    let has_dot_segment = lowered
        .split('/')
        .map(|segment| segment.replace("%2e", "."))
        .any(|segment| segment == "." || segment == "..");
    if has_dot_segment {
        return Err(rejected(path, "must not contain dot segments"));
    }

    Ok(())
}

fn rejected(path: &str, reason: &str) -> AppError {
    AppError::Validation(format!("request path '{path}' {reason}"))
}
