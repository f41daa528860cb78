//! Python dependency scanning
//!
//! Collects `.py` files, extracts their third-party imports and install
//! hints, checks what the interpreter already has, and drives pip.

pub mod constants;
pub mod content;
pub mod discovery;
pub mod imports;
pub mod installed;
pub mod installer;
pub mod manifest;

pub use content::{analyze_content, analyze_file_content, ContentHints};
pub use discovery::find_python_files;
pub use imports::{
    extract_imports, extract_imports_from_file, filter_standard_library, read_imports,
};
pub use installed::InstalledPackages;
pub use installer::{
    install_all, install_requirements_file, plan_installation, InstallReport, Installer,
    PipInstaller,
};
pub use manifest::write_manifest;
pub use pipwatch_foundation::naming::{canonicalize_name, normalize_name};
