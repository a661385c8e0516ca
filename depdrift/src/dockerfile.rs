//! Dockerfile install scanning
//!
//! A line-oriented scan of a Dockerfile's `RUN` instructions that collects
//! the Python packages the image installs via pip. This is deliberately not
//! a Dockerfile parser: continuation lines are joined, shell commands are
//! split on `&&`/`;`, and only `pip install` invocations contribute.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One package a build file installs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// PEP 503-normalized package name
    pub name: String,
    /// Exact version when the spec pins one with `==`
    pub version: Option<String>,
}

/// Flags whose following token is a flag value, not a package
const FLAGS_WITH_VALUE: &[&str] = &[
    "-r",
    "--requirement",
    "-c",
    "--constraint",
    "-e",
    "--editable",
    "-i",
    "--index-url",
    "--extra-index-url",
    "-t",
    "--target",
    "--platform",
];

/// Packaging tooling pip upgrades in-place; not project dependencies
const TOOLING_PACKAGES: &[&str] = &["pip", "setuptools", "wheel"];

fn spec_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)(?:\[[^\]]*\])?(?:(==|>=|<=|~=|!=|>|<)(.+))?$")
            .expect("package spec pattern is valid")
    })
}

/// Scan Dockerfile content for pip-installed packages
///
/// Returns installs in the order encountered; a package installed twice
/// appears twice and callers keep whichever occurrence they prefer.
pub fn scan_installs(content: &str) -> Vec<InstalledPackage> {
    let mut installs = Vec::new();

    for instruction in logical_lines(content) {
        let mut tokens = instruction.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        if !keyword.eq_ignore_ascii_case("RUN") {
            continue;
        }
        let body: Vec<&str> = tokens.collect();

        for command in split_commands(&body) {
            let Some(first_package) = pip_install_args_start(&command) else {
                continue;
            };

            let mut skip_next = false;
            for token in &command[first_package..] {
                if skip_next {
                    skip_next = false;
                    continue;
                }
                if FLAGS_WITH_VALUE.contains(token) {
                    skip_next = true;
                    continue;
                }
                if token.starts_with('-') {
                    continue;
                }
                if let Some(package) = parse_spec(token) {
                    installs.push(package);
                }
            }
        }
    }

    installs
}

/// PEP 503 name normalization, so scanner output compares against
/// manifest keys
pub fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase().replace(['_', '.'], "-")
}

/// Join backslash-continued physical lines into logical instructions
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for raw in content.lines() {
        let line = raw.trim_end();
        if let Some(stripped) = line.strip_suffix('\\') {
            current.push_str(stripped);
            current.push(' ');
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split a RUN body into individual shell commands
fn split_commands<'a>(tokens: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut commands = Vec::new();
    let mut current = Vec::new();
    for &token in tokens {
        if token == "&&" || token == ";" || token == "||" {
            commands.push(std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }
    commands.push(current);
    commands
}

/// Index of the first argument after a `pip install` invocation, if the
/// command is one
///
/// Matches bare `pip`/`pip3` (with or without a leading path) and
/// `python -m pip`, each followed by `install`.
fn pip_install_args_start(command: &[&str]) -> Option<usize> {
    for (index, window) in command.windows(2).enumerate() {
        let program = window[0].rsplit('/').next().unwrap_or(window[0]);
        if program.starts_with("pip") && window[1] == "install" {
            return Some(index + 2);
        }
    }
    None
}

fn parse_spec(token: &str) -> Option<InstalledPackage> {
    let token = token.trim_matches(|c| c == '"' || c == '\'');
    let captures = spec_pattern().captures(token)?;

    let name = normalize_name(captures.get(1)?.as_str());
    if TOOLING_PACKAGES.contains(&name.as_str()) {
        return None;
    }

    let version = match captures.get(2).map(|m| m.as_str()) {
        Some("==") => captures.get(3).map(|m| m.as_str().trim().to_string()),
        // Range comparators install something, but pin nothing.
        _ => None,
    };

    Some(InstalledPackage { name, version })
}
