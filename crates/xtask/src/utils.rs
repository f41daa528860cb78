use anyhow::{Context, Result};
use pipwatch_foundation::MappingTable;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Sent with every PyPI request made by the maintenance commands
pub const USER_AGENT: &str =
    "pipwatch-mappings-fetcher/1.0 (+https://github.com/Felixdiamond/pipwatch)";

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Run a command and capture output
pub fn run_cmd_output(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to run: {} {}", program, args.join(" ")))?;

    if !output.status.success() {
        anyhow::bail!(
            "{} failed: {}",
            program,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Get the workspace root directory
pub fn workspace_root() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// The bundled table shipped inside pipwatch-registry
pub fn bundled_mappings_path() -> Result<PathBuf> {
    Ok(workspace_root()?
        .join("crates")
        .join("pipwatch-registry")
        .join("resources")
        .join("mappings.json"))
}

pub fn load_table(path: &Path) -> Result<MappingTable> {
    if !path.exists() {
        anyhow::bail!("mappings file not found at {}", path.display());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    MappingTable::from_json(&text).with_context(|| format!("Invalid mappings in {}", path.display()))
}

pub fn save_table(path: &Path, table: &MappingTable) -> Result<()> {
    std::fs::write(path, table.to_pretty_json()?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Today's date as `YYYY-MM-DD`
pub fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}

pub fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url`, retrying `retries` extra times with a fixed delay
pub fn fetch_bytes(client: &reqwest::blocking::Client, url: &str, retries: u32) -> Result<Vec<u8>> {
    with_retries(retries, RETRY_DELAY, || {
        client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map(|bytes| bytes.to_vec())
    })
    .with_context(|| format!("Failed to fetch {}", url))
}

/// Run `attempt` up to `retries + 1` times, sleeping `delay` only between attempts
pub fn with_retries<T, E, F>(retries: u32, delay: Duration, mut attempt: F) -> std::result::Result<T, E>
where
    F: FnMut() -> std::result::Result<T, E>,
{
    let mut remaining = retries;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if remaining == 0 => return Err(e),
            Err(_) => {
                remaining -= 1;
                std::thread::sleep(delay);
            }
        }
    }
}

/// Prompt with `question`; only `y`/`Y` is a yes
pub fn confirm(question: &str) -> bool {
    print!("{} ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
    }
}
