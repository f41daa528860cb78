//! Constants and regex patterns for source scanning
//!
//! Centralizes the hardcoded values used by the scanner: directory names
//! skipped during discovery, the standard-library module list, and the
//! patterns used to read import statements and install hints.

use once_cell::sync::Lazy;
use regex::Regex;

// === Discovery ===

/// Directories never descended into when collecting `.py` files
pub const SKIP_DIRS: &[&str] = &[
    ".venv",
    "venv",
    "env",
    ".env",
    "node_modules",
    ".git",
    "__pycache__",
    ".tox",
    "build",
    "dist",
    ".eggs",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
];

// === Standard library ===

/// Top-level modules shipped with CPython 3 (`sys.stdlib_module_names`)
pub const STDLIB_MODULES: &[&str] = &[
    "__future__", "_abc", "_aix_support", "_ast", "_asyncio", "_bisect", "_blake2",
    "_bootsubprocess", "_bz2", "_codecs", "_codecs_cn", "_codecs_hk", "_codecs_iso2022",
    "_codecs_jp", "_codecs_kr", "_codecs_tw", "_collections", "_collections_abc",
    "_compat_pickle", "_compression", "_contextvars", "_crypt", "_csv", "_ctypes", "_curses",
    "_curses_panel", "_datetime", "_dbm", "_decimal", "_elementtree", "_frozen_importlib",
    "_frozen_importlib_external", "_functools", "_gdbm", "_hashlib", "_heapq", "_imp", "_io",
    "_json", "_locale", "_lsprof", "_lzma", "_markupbase", "_md5", "_msi", "_multibytecodec",
    "_multiprocessing", "_opcode", "_operator", "_osx_support", "_overlapped", "_pickle",
    "_posixshmem", "_posixsubprocess", "_py_abc", "_pydecimal", "_pyio", "_queue", "_random",
    "_scproxy", "_sha1", "_sha256", "_sha3", "_sha512", "_signal", "_sitebuiltins", "_socket",
    "_sqlite3", "_sre", "_ssl", "_stat", "_statistics", "_string", "_strptime", "_struct",
    "_symtable", "_thread", "_threading_local", "_tkinter", "_tokenize", "_tracemalloc",
    "_typing", "_uuid", "_warnings", "_weakref", "_weakrefset", "_winapi", "_zoneinfo", "abc",
    "aifc", "antigravity", "argparse", "array", "ast", "asynchat", "asyncio", "asyncore",
    "atexit", "audioop", "base64", "bdb", "binascii", "bisect", "builtins", "bz2", "cProfile",
    "calendar", "cgi", "cgitb", "chunk", "cmath", "cmd", "code", "codecs", "codeop",
    "collections", "colorsys", "compileall", "concurrent", "configparser", "contextlib",
    "contextvars", "copy", "copyreg", "crypt", "csv", "ctypes", "curses", "dataclasses",
    "datetime", "dbm", "decimal", "difflib", "dis", "distutils", "doctest", "email",
    "encodings", "ensurepip", "enum", "errno", "faulthandler", "fcntl", "filecmp", "fileinput",
    "fnmatch", "fractions", "ftplib", "functools", "gc", "genericpath", "getopt", "getpass",
    "gettext", "glob", "graphlib", "grp", "gzip", "hashlib", "heapq", "hmac", "html", "http",
    "idlelib", "imaplib", "imghdr", "imp", "importlib", "inspect", "io", "ipaddress",
    "itertools", "json", "keyword", "lib2to3", "linecache", "locale", "logging", "lzma",
    "mailbox", "mailcap", "marshal", "math", "mimetypes", "mmap", "modulefinder", "msilib",
    "msvcrt", "multiprocessing", "netrc", "nis", "nntplib", "nt", "ntpath", "nturl2path",
    "numbers", "opcode", "operator", "optparse", "os", "ossaudiodev", "pathlib", "pdb",
    "pickle", "pickletools", "pipes", "pkgutil", "platform", "plistlib", "poplib", "posix",
    "posixpath", "pprint", "profile", "pstats", "pty", "pwd", "py_compile", "pyclbr", "pydoc",
    "pydoc_data", "pyexpat", "queue", "quopri", "random", "re", "readline", "reprlib",
    "resource", "rlcompleter", "runpy", "sched", "secrets", "select", "selectors", "shelve",
    "shlex", "shutil", "signal", "site", "smtpd", "smtplib", "sndhdr", "socket", "socketserver",
    "spwd", "sqlite3", "sre_compile", "sre_constants", "sre_parse", "ssl", "stat", "statistics",
    "string", "stringprep", "struct", "subprocess", "sunau", "symtable", "sys", "sysconfig",
    "syslog", "tabnanny", "tarfile", "telnetlib", "tempfile", "termios", "textwrap", "this",
    "threading", "time", "timeit", "tkinter", "token", "tokenize", "tomllib", "trace",
    "traceback", "tracemalloc", "tty", "turtle", "turtledemo", "types", "typing", "unicodedata",
    "unittest", "urllib", "uu", "uuid", "venv", "warnings", "wave", "weakref", "webbrowser",
    "winreg", "winsound", "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp", "zipfile",
    "zipimport", "zlib", "zoneinfo",
];

// === Statements ===

/// Keywords that open a compound statement header ending in `:`
pub const COMPOUND_KEYWORDS: &[&str] = &[
    "async", "case", "class", "def", "elif", "else", "except", "finally", "for", "if", "try",
    "while", "with",
];

// === Regex Patterns ===

/// Pattern for `import` statements
///
/// Matches: `import a`, `import a.b as c, d`
pub static IMPORT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^import\s+(.+)$").expect("Python import regex pattern should be valid")
});

/// Pattern for `from ... import` statements, capturing the module path
///
/// Matches: `from a.b import c`, `from . import c`, `from ..a import (b, c)`
pub static FROM_IMPORT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^from\s+(\.*[\w.]*)\s+import\b")
        .expect("Python from-import regex pattern should be valid")
});

/// A single dotted module path, optionally aliased
pub static MODULE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\W\d]\w*)(?:\s*\.\s*[^\W\d]\w*)*(?:\s+as\s+[^\W\d]\w*)?$")
        .expect("Python module path regex pattern should be valid")
});

/// `# pip install <spec>` hints left in comments
pub static PIP_INSTALL_COMMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#\s*pip install\s+([\w\-\[\]<>=.,]+)")
        .expect("pip install comment regex pattern should be valid")
});

/// Comments that mention a requirements file
pub static REQUIREMENTS_MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#.*requirements\.txt").expect("requirements mention regex pattern should be valid")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_pattern() {
        assert!(IMPORT_PATTERN.is_match("import os"));
        assert!(IMPORT_PATTERN.is_match("import numpy as np, pandas"));
        assert!(!IMPORT_PATTERN.is_match("important = 1"));
    }

    #[test]
    fn test_from_import_pattern() {
        let caps = FROM_IMPORT_PATTERN.captures("from a.b import c").unwrap();
        assert_eq!(&caps[1], "a.b");
        let caps = FROM_IMPORT_PATTERN.captures("from . import c").unwrap();
        assert_eq!(&caps[1], ".");
        assert!(!FROM_IMPORT_PATTERN.is_match("from_date = 3"));
    }

    #[test]
    fn test_module_path_pattern() {
        assert!(MODULE_PATH_PATTERN.is_match("a.b.c"));
        assert!(MODULE_PATH_PATTERN.is_match("numpy as np"));
        assert!(!MODULE_PATH_PATTERN.is_match("9lives"));
        assert!(!MODULE_PATH_PATTERN.is_match("a b"));
    }

    #[test]
    fn test_pip_install_comment_pattern() {
        let caps = PIP_INSTALL_COMMENT_PATTERN
            .captures("# pip install requests>=2.0")
            .unwrap();
        assert_eq!(&caps[1], "requests>=2.0");
    }

    #[test]
    fn test_stdlib_list_is_sorted() {
        let mut sorted = STDLIB_MODULES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STDLIB_MODULES);
    }
}
