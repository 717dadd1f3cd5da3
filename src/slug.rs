//! Title → package name conversion.

/// CKAN rejects package names longer than this.
pub const MAX_NAME_LENGTH: usize = 100;

/// Turns free text into a URL-safe package name.
///
/// The title is first transliterated to ASCII, so accented and non-Latin
/// letters keep their closest plain spelling. ASCII letters and digits are
/// then kept (lower-cased); every run of anything else becomes a single `-`. Leading and trailing separators are dropped and
/// the result is capped at [`MAX_NAME_LENGTH`]. Applying it to its own output
/// is a no-op.
pub fn slugify(title: &str) -> String {
    let title = deunicode::deunicode(title);
    let mut name = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !name.is_empty() {
                name.push('-');
            }
            pending_separator = false;
            name.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if name.len() > MAX_NAME_LENGTH {
        // only ASCII was pushed, so any byte index is a char boundary
        name.truncate(MAX_NAME_LENGTH);
        while name.ends_with('-') {
            name.pop();
        }
    }

    name
}
