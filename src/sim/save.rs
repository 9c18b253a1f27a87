/// High-score persistence.
///
/// ## File format:
///   Key-value lines, currently just `high_score=<n>`.
///
/// Stored as highscore.dat next to the executable when that directory
/// is writable, otherwise under the XDG data home. All functions take
/// the path explicitly so tests can point them at a scratch directory.

use std::path::{Path, PathBuf};

const HIGH_SCORE_FILE: &str = "highscore.dat";

fn data_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_gemrunner");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/gemrunner) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gemrunner");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn high_score_path() -> PathBuf {
    data_dir().join(HIGH_SCORE_FILE)
}

/// Missing or malformed files read as zero.
pub fn load_high_score(path: &Path) -> u32 {
    let Ok(text) = std::fs::read_to_string(path) else {
        return 0;
    };
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("high_score=") {
            if let Ok(n) = value.trim().parse() {
                return n;
            }
        }
    }
    0
}

pub fn store_high_score(path: &Path, score: u32) -> Result<(), String> {
    std::fs::write(path, format!("high_score={}\n", score))
        .map_err(|e| format!("Could not write {}: {}", path.display(), e))
}

/// Store `score` if it beats the saved best. Returns the best of the two.
pub fn record_score(path: &Path, score: u32) -> u32 {
    let best = load_high_score(path);
    if score > best {
        if let Err(e) = store_high_score(path, score) {
            eprintln!("Warning: {e}");
        }
        score
    } else {
        best
    }
}
