/// Clean a model-provided short name: trim, drop CR/LF, strip one trailing period.
pub fn tidy_display_name(raw: &str) -> String {
    let without_breaks: String = raw.trim().chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let trimmed = without_breaks.trim();
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}
