//! Import extraction from Python source
//!
//! Source text is first folded into logical statements: comments are
//! dropped, string literals are blanked, and lines joined by open brackets
//! or backslash continuations are merged. Unbalanced brackets and
//! unterminated strings are reported as parse errors so callers can treat
//! the file as unparsable.
//!
//! Only absolute imports are reported, reduced to their top-level
//! identifier: `import a.b as c, d` yields `a` and `d`, `from a.b import x`
//! yields `a`, and `from . import x` yields nothing. Imports in the body
//! of a one-line compound statement (`try: import ujson`) are found too.

use crate::constants::{
    COMPOUND_KEYWORDS, FROM_IMPORT_PATTERN, IMPORT_PATTERN, MODULE_PATH_PATTERN, STDLIB_MODULES,
};
use pipwatch_foundation::{PipwatchError, PipwatchResult};
use std::collections::BTreeSet;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use tracing::{debug, error};

/// Top-level identifiers imported by `source`
pub fn extract_imports(source: &str) -> PipwatchResult<BTreeSet<String>> {
    let mut imports = BTreeSet::new();

    for statement in logical_statements(source)? {
        let statement = strip_compound_headers(statement.trim());

        if let Some(caps) = FROM_IMPORT_PATTERN.captures(statement) {
            let module = &caps[1];
            if module.starts_with('.') || module.is_empty() {
                continue;
            }
            if let Some(top) = top_level(module) {
                imports.insert(top);
            }
        } else if let Some(caps) = IMPORT_PATTERN.captures(statement) {
            for part in caps[1].split(',') {
                let part = part.trim();
                if MODULE_PATH_PATTERN.is_match(part) {
                    if let Some(top) = top_level(part) {
                        imports.insert(top);
                    }
                }
            }
        }
    }

    Ok(imports)
}

/// [`extract_imports`] for a file, with parse errors attributed to `path`
pub fn read_imports(path: &Path) -> PipwatchResult<BTreeSet<String>> {
    let source = std::fs::read_to_string(path).map_err(|e| PipwatchError::io_at(path, e))?;
    extract_imports(&source).map_err(|e| match e {
        PipwatchError::Parse { message, .. } => PipwatchError::parse_in(path, message),
        other => other,
    })
}

/// [`read_imports`] that degrades to an empty set on unreadable or unparsable files
pub fn extract_imports_from_file(path: &Path) -> BTreeSet<String> {
    debug!(file = %path.display(), "Extracting imports");

    match read_imports(path) {
        Ok(imports) => {
            debug!(file = %path.display(), count = imports.len(), ?imports, "Found imports");
            imports
        }
        Err(e @ PipwatchError::Parse { .. }) => {
            error!(file = %path.display(), error = %e, "Syntax error");
            BTreeSet::new()
        }
        Err(e) => {
            error!(file = %path.display(), error = %e, "Error reading file");
            BTreeSet::new()
        }
    }
}

/// Drop names that ship with the Python standard library
pub fn filter_standard_library(imports: &BTreeSet<String>) -> BTreeSet<String> {
    let third_party: BTreeSet<String> = imports
        .iter()
        .filter(|name| !is_standard_library(name))
        .cloned()
        .collect();
    debug!(count = third_party.len(), "Filtered to third-party imports");
    third_party
}

pub fn is_standard_library(name: &str) -> bool {
    STDLIB_MODULES.binary_search(&name).is_ok()
}

/// Drop leading `if ...:`, `try:`, `except E:` style headers from a statement
fn strip_compound_headers(mut statement: &str) -> &str {
    loop {
        let keyword = statement
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default();
        if !COMPOUND_KEYWORDS.contains(&keyword) {
            return statement;
        }
        match header_end(statement) {
            Some(colon) => statement = statement[colon + 1..].trim_start(),
            None => return statement,
        }
    }
}

/// Byte offset of the first `:` outside brackets that is not part of `:=`
fn header_end(statement: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = statement.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                if chars.peek().map(|&(_, next)| next) != Some('=') {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn top_level(module_path: &str) -> Option<String> {
    let first = module_path.split('.').next()?.trim();
    let first = first.split_whitespace().next()?;
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Fold source text into logical statements with comments and strings removed
fn logical_statements(source: &str) -> PipwatchResult<Vec<String>> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut brackets: Vec<(char, usize)> = Vec::new();
    let mut line = 1usize;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '\'' | '"' => {
                skip_string(c, &mut chars, &mut line)?;
                current.push_str("\"\"");
            }
            '\\' => match chars.peek() {
                Some('\n') => {
                    chars.next();
                    line += 1;
                    current.push(' ');
                }
                Some('\r') => {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    current.push(' ');
                }
                _ => current.push(c),
            },
            '(' | '[' | '{' => {
                brackets.push((c, line));
                current.push(c);
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match brackets.pop() {
                    Some((open, _)) if open == expected => current.push(c),
                    Some((open, open_line)) => {
                        return Err(PipwatchError::parse(format!(
                            "closing '{}' on line {} does not match '{}' on line {}",
                            c, line, open, open_line
                        )));
                    }
                    None => {
                        return Err(PipwatchError::parse(format!(
                            "unmatched '{}' on line {}",
                            c, line
                        )));
                    }
                }
            }
            '\n' => {
                line += 1;
                if brackets.is_empty() {
                    flush(&mut current, &mut statements);
                } else {
                    current.push(' ');
                }
            }
            ';' if brackets.is_empty() => flush(&mut current, &mut statements),
            _ => current.push(c),
        }
    }

    if let Some((open, open_line)) = brackets.pop() {
        return Err(PipwatchError::parse(format!(
            "'{}' on line {} was never closed",
            open, open_line
        )));
    }

    flush(&mut current, &mut statements);
    Ok(statements)
}

fn flush(current: &mut String, statements: &mut Vec<String>) {
    if !current.trim().is_empty() {
        statements.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Consume a string literal whose opening quote has already been read
fn skip_string(quote: char, chars: &mut Peekable<Chars<'_>>, line: &mut usize) -> PipwatchResult<()> {
    let start_line = *line;

    let triple = {
        let mut lookahead = chars.clone();
        lookahead.next() == Some(quote) && lookahead.next() == Some(quote)
    };
    if triple {
        chars.next();
        chars.next();
    } else if chars.peek() == Some(&quote) {
        // Empty string
        chars.next();
        return Ok(());
    }

    let mut run = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                run = 0;
                if let Some(escaped) = chars.next() {
                    if escaped == '\n' {
                        *line += 1;
                    }
                }
            }
            '\n' if !triple => {
                return Err(PipwatchError::parse(format!(
                    "unterminated string literal on line {}",
                    start_line
                )));
            }
            '\n' => {
                *line += 1;
                run = 0;
            }
            c if c == quote => {
                run += 1;
                if !triple || run == 3 {
                    return Ok(());
                }
            }
            _ => run = 0,
        }
    }

    Err(PipwatchError::parse(format!(
        "unterminated {}string literal starting on line {}",
        if triple { "triple-quoted " } else { "" },
        start_line
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(source: &str) -> Vec<String> {
        extract_imports(source).unwrap().into_iter().collect()
    }

    #[test]
    fn test_plain_and_aliased_imports() {
        assert_eq!(
            names("import os\nimport numpy as np, pandas.core as pdc\n"),
            vec!["numpy", "os", "pandas"]
        );
    }

    #[test]
    fn test_from_imports_keep_top_level() {
        assert_eq!(
            names("from sklearn.model_selection import train_test_split\n"),
            vec!["sklearn"]
        );
    }

    #[test]
    fn test_one_line_compound_statements() {
        let source = "try: import ujson as json\n\
                      except ImportError: import simplejson as json\n\
                      if TYPE_CHECKING: from numpy import ndarray\n\
                      with ctx(a[1:2], {'k': 1}) as c: import attr\n\
                      else: import toolz; import yaml\n\
                      while (n := 3): import regex\n";
        assert_eq!(
            names(source),
            vec!["attr", "numpy", "regex", "simplejson", "toolz", "ujson", "yaml"]
        );
    }

    #[test]
    fn test_headers_without_imports_are_ignored() {
        assert!(names("if ready:\n    pass\nelse: value = {'import': 1}\nclass Importer: pass\n")
            .is_empty());
    }

    #[test]
    fn test_read_imports_attributes_parse_errors_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.py");
        std::fs::write(&path, "import requests\nvalue = (1,\n").unwrap();

        match read_imports(&path) {
            Err(PipwatchError::Parse { file, .. }) => assert_eq!(file.as_deref(), Some(path.as_path())),
            other => panic!("Expected parse error, got {:?}", other),
        }
        assert!(extract_imports_from_file(&path).is_empty());
    }

    #[test]
    fn test_read_imports_missing_file_is_io_error() {
        let missing = Path::new("/nonexistent/pipwatch/script.py");
        assert!(matches!(read_imports(missing), Err(PipwatchError::Io { .. })));
        assert!(extract_imports_from_file(missing).is_empty());
    }

    #[test]
    fn test_relative_imports_are_ignored() {
        assert!(names("from . import sibling\nfrom ..pkg import thing\nfrom .mod import x\n")
            .is_empty());
    }

    #[test]
    fn test_parenthesized_multiline_from_import() {
        let source = "from requests.adapters import (\n    HTTPAdapter,\n    Retry,\n)\n";
        assert_eq!(names(source), vec!["requests"]);
    }

    #[test]
    fn test_backslash_continuation() {
        assert_eq!(names("import yaml, \\\n    toml\n"), vec!["toml", "yaml"]);
    }

    #[test]
    fn test_semicolon_separated_statements() {
        assert_eq!(names("import bs4; import lxml; x = 1\n"), vec!["bs4", "lxml"]);
    }

    #[test]
    fn test_indented_imports() {
        let source = "try:\n    import ujson as json\nexcept ImportError:\n    import json\n";
        assert_eq!(names(source), vec!["json", "ujson"]);
    }

    #[test]
    fn test_strings_and_comments_are_not_imports() {
        let source = r#"
# import not_a_module
doc = """
import also_not_a_module
"""
message = "import fake"
import real
"#;
        assert_eq!(names(source), vec!["real"]);
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        assert_eq!(names("s = 'it\\'s'\nimport attr\n"), vec!["attr"]);
    }

    #[test]
    fn test_unbalanced_brackets_are_errors() {
        assert!(extract_imports("import os\nprint((1)\n").is_err());
        assert!(extract_imports("x = 1)\n").is_err());
        assert!(extract_imports("x = [1, 2}\n").is_err());
    }

    #[test]
    fn test_unterminated_strings_are_errors() {
        assert!(extract_imports("x = 'oops\nimport os\n").is_err());
        assert!(extract_imports("x = \"\"\"never closed\n").is_err());
    }

    #[test]
    fn test_identifiers_starting_with_keywords() {
        assert!(names("important = 1\nfrom_here = 2\n").is_empty());
    }

    #[test]
    fn test_filter_standard_library() {
        let imports: BTreeSet<String> = ["os", "sys", "requests", "json", "numpy", "__future__"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let third_party: Vec<String> = filter_standard_library(&imports).into_iter().collect();
        assert_eq!(third_party, vec!["numpy", "requests"]);
    }
}
