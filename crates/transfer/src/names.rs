/// Reply token that keeps the original file name in a rename prompt.
const KEEP_SENTINEL: &str = "no";

/// Splits `name` into (stem, extension), the extension keeping its dot.
///
/// Only the last dot counts, so `x.tar.gz` splits as `("x.tar", ".gz")`.
/// Names whose dots are all leading (`.bashrc`, `..cache`) have no
/// extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let Some(idx) = name.rfind('.') else {
        return (name, "");
    };
    if name[..idx].chars().all(|c| c == '.') {
        return (name, "");
    }
    name.split_at(idx)
}

/// True if `reply` keeps the original name (case-insensitive sentinel).
pub fn is_keep_sentinel(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case(KEEP_SENTINEL)
}

/// Applies a rename reply: the sentinel keeps `original`, anything else
/// becomes the new stem with the original extension appended. A name with
/// no extension gets nothing appended.
pub fn apply_rename(original: &str, reply: &str) -> String {
    if is_keep_sentinel(reply) {
        return original.to_string();
    }
    let (_, ext) = split_extension(original);
    format!("{}{}", reply.trim(), ext)
}
