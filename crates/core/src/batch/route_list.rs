//! Route-list files.
//!
//! Plain text, one route per line as `from_code,to_code[,...]`. The first
//! non-empty line is a header and is skipped. Extra columns are ignored.

use std::path::Path;

use tracing::warn;

use super::BatchError;

/// One route named in a route-list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteListEntry {
    /// 1-based line number in the file.
    pub line: usize,
    pub from_code: String,
    pub to_code: String,
}

/// Parse route-list content. Lines without both codes are skipped with a warning.
pub fn parse_route_list(content: &str) -> Vec<RouteListEntry> {
    let mut entries = Vec::new();
    let mut header_seen = false;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let mut fields = line.split(',').map(|f| f.trim().trim_matches('"'));
        let from_code = fields.next().unwrap_or_default();
        let to_code = fields.next().unwrap_or_default();

        if from_code.is_empty() || to_code.is_empty() {
            warn!(line = index + 1, "Skipping malformed route-list line");
            continue;
        }

        entries.push(RouteListEntry {
            line: index + 1,
            from_code: from_code.to_string(),
            to_code: to_code.to_string(),
        });
    }

    entries
}

/// Read and parse a route-list file.
pub fn read_route_list(path: &Path) -> Result<Vec<RouteListEntry>, BatchError> {
    let content = std::fs::read_to_string(path).map_err(|source| BatchError::RouteList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_route_list(&content))
}
