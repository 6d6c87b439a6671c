use std::path::{Path, PathBuf};
use sweep_core::paths::CONFIG_FILE;

/// Resolve the working root.
///
/// Priority:
/// 1. `--root` flag / `SWEEP_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.sonar-sweep.yaml`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_config_root(&cwd).unwrap_or(cwd)
}

fn find_config_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(CONFIG_FILE).is_file() {
            return Some(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}
