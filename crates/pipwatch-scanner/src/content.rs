//! Install hints left in source comments

use crate::constants::{PIP_INSTALL_COMMENT_PATTERN, REQUIREMENTS_MENTION_PATTERN};
use std::path::Path;
use tracing::{debug, error};

/// Hints found in a file's comments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentHints {
    /// Requirement specs from `# pip install <spec>` comments, in file order
    pub pip_installs: Vec<String>,
    /// A comment mentions `requirements.txt`
    pub mentions_requirements: bool,
}

impl ContentHints {
    pub fn merge(&mut self, other: ContentHints) {
        self.pip_installs.extend(other.pip_installs);
        self.mentions_requirements |= other.mentions_requirements;
    }
}

pub fn analyze_content(content: &str) -> ContentHints {
    let pip_installs: Vec<String> = PIP_INSTALL_COMMENT_PATTERN
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect();
    let mentions_requirements = REQUIREMENTS_MENTION_PATTERN.is_match(content);

    debug!(count = pip_installs.len(), "Found pip install comments");
    ContentHints {
        pip_installs,
        mentions_requirements,
    }
}

/// [`analyze_content`] for a file; read errors yield no hints
pub fn analyze_file_content(path: &Path) -> ContentHints {
    match std::fs::read_to_string(path) {
        Ok(content) => analyze_content(&content),
        Err(e) => {
            error!(file = %path.display(), error = %e, "Error reading file");
            ContentHints::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pip_install_comments() {
        let hints = analyze_content(
            "# pip install requests>=2.0\n#pip install rich[jupyter]\nimport requests\n",
        );
        assert_eq!(hints.pip_installs, vec!["requests>=2.0", "rich[jupyter]"]);
        assert!(!hints.mentions_requirements);
    }

    #[test]
    fn test_requirements_mention() {
        let hints = analyze_content("import x  # see requirements.txt\n");
        assert!(hints.mentions_requirements);
        assert!(hints.pip_installs.is_empty());

        // Only comments count
        assert!(!analyze_content("open('requirements.txt')\n").mentions_requirements);
    }

    #[test]
    fn test_merge() {
        let mut hints = analyze_content("# pip install a\n");
        hints.merge(analyze_content("# pip install b\n# requirements.txt\n"));
        assert_eq!(hints.pip_installs, vec!["a", "b"]);
        assert!(hints.mentions_requirements);
    }

    #[test]
    fn test_unreadable_file_has_no_hints() {
        let hints = analyze_file_content(Path::new("/nonexistent/pipwatch/script.py"));
        assert_eq!(hints, ContentHints::default());
    }
}
