use ammonia;

/// Clean free-text notes using the ammonia library.
///
/// Notes are rendered back into the dashboard, so anything that looks
/// like markup is stripped down to safe tags and text before it is
/// stored. This is a fail-safe against stored XSS from imported files
/// as much as from the form itself.
pub fn clean_notes(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}
