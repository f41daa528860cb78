//! Bulk candidate discovery from PyPI wheels
//!
//! Walks the PyPI simple index, downloads one wheel per package and reads
//! `*.dist-info/top_level.txt` to find import names that differ from the
//! distribution name. The result is a candidate table for `apply-mappings`.

use crate::utils;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use once_cell::sync::Lazy;
use pipwatch_foundation::{MappingEntry, MappingTable};
use pipwatch_scanner::canonicalize_name;
use pipwatch_scanner::imports::is_standard_library;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::time::Duration;

const SIMPLE_INDEX_URL: &str = "https://pypi.org/simple/";
const CANDIDATE_SOURCE: &str = "pypi-simple";

static INDEX_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r">([^<]+)</a>").expect("Simple index link regex pattern should be valid")
});

#[derive(Args)]
pub struct FetchMappingsArgs {
    /// Only packages starting with this prefix (repeatable)
    #[arg(long = "starts-with")]
    starts_with: Vec<String>,

    /// Skip the first N packages after filtering
    #[arg(long, default_value = "0")]
    offset: usize,

    /// Process at most N packages
    #[arg(long)]
    limit: Option<usize>,

    /// Candidate table to write
    #[arg(long, default_value = "scripts/pypi_mappings.json")]
    output: PathBuf,

    /// Bundled mappings file used to skip known imports
    #[arg(long)]
    mappings: Option<PathBuf>,

    /// Keep a copy of the simple index here
    #[arg(long)]
    index_cache: Option<PathBuf>,

    /// Re-download the simple index even when cached
    #[arg(long)]
    refresh_index: bool,

    /// Seconds to wait between packages
    #[arg(long, default_value = "0.2")]
    sleep: f64,

    /// Network timeout in seconds
    #[arg(long, default_value = "15")]
    timeout: u64,

    /// Extra attempts per network call
    #[arg(long, default_value = "2")]
    retries: u32,

    /// Skip wheels larger than this
    #[arg(long, default_value = "5.0")]
    max_wheel_mb: f64,

    /// Preview without writing
    #[arg(long)]
    dry_run: bool,

    /// Report skipped packages and progress
    #[arg(long)]
    verbose: bool,
}

/// One file of the latest release, as listed by the PyPI JSON API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseFile {
    #[serde(default)]
    pub packagetype: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub yanked: bool,
}

#[derive(Debug, Deserialize)]
struct PackageMetadata {
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Serialize)]
struct CandidateTable {
    generated_at: String,
    source: &'static str,
    package_count: usize,
    mapping_count: usize,
    mappings: BTreeMap<String, MappingEntry>,
}

pub fn run(args: FetchMappingsArgs) -> Result<()> {
    let mappings_path = match &args.mappings {
        Some(path) => path.clone(),
        None => utils::bundled_mappings_path()?,
    };
    let existing = utils::load_table(&mappings_path)?;

    let client = utils::http_client(Duration::from_secs(args.timeout))?;
    let index = load_simple_index(&client, &args)?;
    let names = filter_names(
        parse_simple_index(&index),
        &args.starts_with,
        args.offset,
        args.limit,
    );

    if names.is_empty() {
        println!("No packages matched the filters.");
        return Ok(());
    }

    println!(
        "{}",
        format!("Fetching top-level names for {} packages...", names.len()).bold()
    );

    let max_wheel_bytes = (args.max_wheel_mb * 1024.0 * 1024.0) as u64;
    let pause = Duration::from_secs_f64(args.sleep.max(0.0));
    let mut candidates = BTreeMap::new();
    let mut skipped = 0usize;

    for (idx, package) in names.iter().enumerate() {
        match fetch_top_level_names(&client, package, args.retries, max_wheel_bytes) {
            Ok(import_names) => {
                collect_candidates(package, import_names, &existing, &mut candidates);
            }
            Err(e) => {
                skipped += 1;
                if args.verbose {
                    println!("{} Skip {}: {:#}", "⚠️".yellow(), package, e);
                }
            }
        }

        if args.verbose && (idx + 1) % 50 == 0 {
            println!("Processed {}/{} packages", idx + 1, names.len());
        }
        std::thread::sleep(pause);
    }

    if skipped > 0 {
        println!("{} {} packages skipped", "⚠️".yellow(), skipped);
    }

    let output = CandidateTable {
        generated_at: utils::today(),
        source: CANDIDATE_SOURCE,
        package_count: names.len(),
        mapping_count: candidates.len(),
        mappings: candidates,
    };

    if args.dry_run {
        println!(
            "[DRY RUN] Would write {} mappings to {}",
            output.mapping_count,
            args.output.display()
        );
        return Ok(());
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut text = serde_json::to_string_pretty(&output)?;
    text.push('\n');
    std::fs::write(&args.output, text)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "{} Wrote {} mappings to {}",
        "✓".green(),
        output.mapping_count,
        args.output.display()
    );
    Ok(())
}

fn load_simple_index(client: &reqwest::blocking::Client, args: &FetchMappingsArgs) -> Result<String> {
    if let Some(cache) = &args.index_cache {
        if cache.exists() && !args.refresh_index {
            return std::fs::read_to_string(cache)
                .with_context(|| format!("Failed to read {}", cache.display()));
        }
    }

    let bytes = utils::fetch_bytes(client, SIMPLE_INDEX_URL, args.retries)?;
    let content = String::from_utf8(bytes).context("Simple index is not valid UTF-8")?;

    if let Some(cache) = &args.index_cache {
        if let Some(parent) = cache.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(cache, &content)
            .with_context(|| format!("Failed to write {}", cache.display()))?;
    }
    Ok(content)
}

/// Project names linked from a simple index page
pub fn parse_simple_index(html: &str) -> Vec<String> {
    INDEX_LINK
        .captures_iter(html)
        .map(|caps| unescape_html(&caps[1]).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Apply prefix filters, sort case-insensitively, then page with offset/limit
pub fn filter_names(
    names: Vec<String>,
    starts_with: &[String],
    offset: usize,
    limit: Option<usize>,
) -> Vec<String> {
    let prefixes: Vec<String> = starts_with.iter().map(|p| p.to_lowercase()).collect();
    let mut names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .filter(|n| {
            let lower = n.to_lowercase();
            prefixes.is_empty() || prefixes.iter().any(|p| lower.starts_with(p))
        })
        .collect();
    names.sort_by_key(|n| n.to_lowercase());

    names
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Pick the wheel to inspect: pure-Python wheels first, then the smallest
pub fn choose_wheel(files: &[ReleaseFile]) -> Option<&ReleaseFile> {
    files
        .iter()
        .filter(|f| f.packagetype == "bdist_wheel" && !f.yanked)
        .min_by_key(|f| (wheel_rank(&f.filename), f.size.unwrap_or(0)))
}

fn wheel_rank(filename: &str) -> u8 {
    if filename.contains("py2.py3-none-any") {
        1
    } else if filename.contains("py3-none-any") {
        0
    } else {
        2
    }
}

/// Public top-level names from the first `top_level.txt` in a wheel
pub fn read_top_level_from_wheel(data: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).context("Not a zip archive")?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !file.name().ends_with(".dist-info/top_level.txt") {
            continue;
        }
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;
        return Ok(String::from_utf8_lossy(&raw)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('_'))
            .map(str::to_string)
            .collect());
    }
    Ok(Vec::new())
}

fn fetch_top_level_names(
    client: &reqwest::blocking::Client,
    package: &str,
    retries: u32,
    max_wheel_bytes: u64,
) -> Result<Vec<String>> {
    let url = format!("https://pypi.org/pypi/{}/json", package);
    let metadata: PackageMetadata = serde_json::from_slice(&utils::fetch_bytes(client, &url, retries)?)
        .with_context(|| format!("Invalid metadata for {}", package))?;

    let Some(wheel) = choose_wheel(&metadata.urls) else {
        return Ok(Vec::new());
    };
    if wheel.size.is_some_and(|size| size > max_wheel_bytes) {
        return Ok(Vec::new());
    }
    let Some(wheel_url) = wheel.url.as_deref() else {
        return Ok(Vec::new());
    };

    read_top_level_from_wheel(&utils::fetch_bytes(client, wheel_url, retries)?)
}

/// Keep import names worth mapping; earlier packages win on collisions
pub fn collect_candidates(
    package: &str,
    import_names: Vec<String>,
    existing: &MappingTable,
    candidates: &mut BTreeMap<String, MappingEntry>,
) {
    let package_key = canonicalize_name(package);
    for import_name in import_names {
        if import_name.starts_with('_')
            || canonicalize_name(&import_name) == package_key
            || existing.contains(&import_name)
            || candidates.contains_key(&import_name)
            || is_standard_library(&import_name)
        {
            continue;
        }
        candidates.insert(import_name, MappingEntry::new(package));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn wheel(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::<u8>::new()));
        let opts = SimpleFileOptions::default();
        for (name, content) in files {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn release(filename: &str, size: u64) -> ReleaseFile {
        ReleaseFile {
            packagetype: "bdist_wheel".to_string(),
            filename: filename.to_string(),
            size: Some(size),
            url: Some(format!("https://files.example/{}", filename)),
            yanked: false,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_index() {
        let html = r#"<html><body>
<a href="/simple/requests/">requests</a>
<a href="/simple/a-b/">a&amp;b</a>
<a href="/simple/blank/">  </a>
</body></html>"#;
        assert_eq!(parse_simple_index(html), strings(&["requests", "a&b"]));
    }

    #[test]
    fn test_filter_names_prefix_sort_and_page() {
        let names = strings(&["numpy", "Nose", "requests", "nltk", "pandas"]);

        assert_eq!(
            filter_names(names.clone(), &strings(&["N"]), 0, None),
            strings(&["nltk", "Nose", "numpy"])
        );
        assert_eq!(
            filter_names(names.clone(), &strings(&["n", "p"]), 1, Some(2)),
            strings(&["Nose", "numpy"])
        );
        assert_eq!(filter_names(names, &[], 10, None), Vec::<String>::new());
    }

    #[test]
    fn test_choose_wheel_prefers_pure_python() {
        let mut sdist = release("pkg-1.0.tar.gz", 1);
        sdist.packagetype = "sdist".to_string();
        let mut yanked = release("pkg-1.0-py3-none-any.whl", 1);
        yanked.yanked = true;

        let files = vec![
            sdist,
            yanked,
            release("pkg-1.0-cp311-cp311-manylinux_x86_64.whl", 10),
            release("pkg-1.0-py2.py3-none-any.whl", 500),
            release("pkg-1.0-py3-none-any.whl", 900),
        ];
        assert_eq!(
            choose_wheel(&files).unwrap().filename,
            "pkg-1.0-py3-none-any.whl"
        );

        let platform_only = vec![
            release("pkg-1.0-cp311-cp311-win_amd64.whl", 300),
            release("pkg-1.0-cp311-cp311-macosx_arm64.whl", 200),
        ];
        assert_eq!(
            choose_wheel(&platform_only).unwrap().filename,
            "pkg-1.0-cp311-cp311-macosx_arm64.whl"
        );
        assert!(choose_wheel(&[]).is_none());
    }

    #[test]
    fn test_read_top_level_from_wheel() {
        let data = wheel(&[
            ("yaml/__init__.py", ""),
            ("PyYAML-6.0.dist-info/METADATA", "Name: PyYAML\n"),
            ("PyYAML-6.0.dist-info/top_level.txt", "_yaml\nyaml\n\n"),
        ]);
        assert_eq!(read_top_level_from_wheel(&data).unwrap(), strings(&["yaml"]));
    }

    #[test]
    fn test_wheel_without_top_level() {
        let data = wheel(&[("pkg-1.0.dist-info/METADATA", "Name: pkg\n")]);
        assert!(read_top_level_from_wheel(&data).unwrap().is_empty());
        assert!(read_top_level_from_wheel(b"not a zip").is_err());
    }

    #[test]
    fn test_collect_candidates_skips() {
        let mut existing = MappingTable::default();
        existing.insert("PIL", MappingEntry::new("pillow"));

        let mut candidates = BTreeMap::new();
        collect_candidates(
            "Pillow-SIMD",
            strings(&["PIL", "pillow_simd", "json", "_private", "simdext"]),
            &existing,
            &mut candidates,
        );
        collect_candidates("other", strings(&["simdext"]), &existing, &mut candidates);

        assert_eq!(candidates.len(), 1);
        let entry = &candidates["simdext"];
        assert_eq!(entry.package, "Pillow-SIMD");
        assert_eq!(entry.category, "uncategorized");
        assert!(!entry.verified);
    }
}
