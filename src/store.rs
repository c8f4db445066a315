//! Proxy-list and record-file IO.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

/// Check a path before the pass starts. A missing file is fatal unless
/// `create` is set, in which case it is created empty; a directory at the
/// path is always fatal.
pub fn preflight(path: &Path, create: bool) -> Result<()> {
    if path.is_dir() {
        bail!("{} is a directory", path.display());
    }
    if path.exists() {
        return Ok(());
    }
    if !create {
        bail!("the file {} doesn't exist", path.display());
    }
    fs::File::create(path).with_context(|| format!("creating file {}", path.display()))?;
    info!(file = %path.display(), "created empty record file");
    Ok(())
}

/// Read a text file into lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(contents.lines().map(|l| l.to_string()).collect())
}

/// Replace the record file with `contents` in one step: the new state is
/// written to a sibling temp file first and renamed over the old one, so a
/// failed write leaves the previous records untouched.
pub fn write_records(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(tmp, path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
