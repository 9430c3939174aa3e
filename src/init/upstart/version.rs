use std::path::Path;

use crate::cmd;

/// Upstart version as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    /// The probe failed or its output did not carry a version
    Unknown,
    Reported(String),
}

impl Version {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Version::Unknown => None,
            Version::Reported(v) => Some(v),
        }
    }
}

/// Ask `init_binary --version` which Upstart release is running.
///
/// Never fails: any problem yields [`Version::Unknown`].
pub fn probe(init_binary: &Path) -> Version {
    match cmd::run(init_binary, ["--version"]) {
        Ok(out) => {
            let version = parse_version(&out.stdout);
            if version == Version::Unknown {
                tracing::debug!("no upstart version in {} output", init_binary.display());
            }
            version
        }
        Err(e) => {
            tracing::debug!("version probe failed: {}", e);
            Version::Unknown
        }
    }
}

/// Extract the version from `init (upstart <version>)`.
///
/// Whitespace between the tokens is any run of ASCII whitespace and the
/// version is everything up to the closing parenthesis.
pub fn parse_version(output: &str) -> Version {
    let mut offset = 0;
    while let Some(found) = output[offset..].find("init") {
        let start = offset + found;
        if let Some(v) = match_at(&output[start + "init".len()..]) {
            return Version::Reported(v.to_string());
        }
        offset = start + 1;
    }
    Version::Unknown
}

fn match_at(rest: &str) -> Option<&str> {
    let rest = skip_whitespace(rest)?;
    let rest = rest.strip_prefix('(')?;
    let rest = rest.strip_prefix("upstart")?;

    let ws_len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_whitespace()).len();
    if ws_len == 0 {
        return None;
    }

    let close = rest.find(')')?;
    if close > ws_len {
        Some(&rest[ws_len..close])
    } else if ws_len >= 2 {
        // Only whitespace before ')': the capture takes the last blank.
        Some(&rest[ws_len - 1..close])
    } else {
        None
    }
}

/// Skip at least one whitespace character
fn skip_whitespace(s: &str) -> Option<&str> {
    let trimmed = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    (trimmed.len() < s.len()).then_some(trimmed)
}
