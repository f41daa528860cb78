//! Package name normalization

/// Normalize a distribution name for installed-package comparison
///
/// Lowercases and turns underscores into hyphens, the same folding pip
/// applies when it reports installed distributions.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

/// PEP 503 canonical form: runs of `-`, `_`, `.` collapse to a single `-`
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
                in_separator = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}
