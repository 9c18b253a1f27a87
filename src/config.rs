/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::sim::level::Rules;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub scoring: ScoringConfig,
    pub levels_dir: PathBuf,
    /// Seed for the per-level tile variety RNG.
    pub variety_seed: u64,
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub time_limit_secs: u64,
    pub points_per_second: u32,
    pub bonus_life_step: u32,
    pub starting_lives: u32,
}

impl GameConfig {
    pub fn rules(&self) -> Rules {
        Rules {
            time_limit: self.scoring.time_limit_secs as f32,
            points_per_second: self.scoring.points_per_second,
            bonus_life_step: self.scoring.bonus_life_step,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlScoring {
    #[serde(default = "default_time_limit")]
    time_limit_secs: u64,
    #[serde(default = "default_points_per_second")]
    points_per_second: u32,
    #[serde(default = "default_bonus_life_step")]
    bonus_life_step: u32,
    #[serde(default = "default_starting_lives")]
    starting_lives: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_variety_seed")]
    variety_seed: u64,
}

// ── Defaults ──

fn default_time_limit() -> u64 { 180 }
fn default_points_per_second() -> u32 { 5 }
fn default_bonus_life_step() -> u32 { 2000 }
fn default_starting_lives() -> u32 { 3 }
fn default_levels_dir() -> String { "levels".into() }
fn default_variety_seed() -> u64 { crate::sim::parser::VARIETY_SEED }

impl Default for TomlScoring {
    fn default() -> Self {
        TomlScoring {
            time_limit_secs: default_time_limit(),
            points_per_second: default_points_per_second(),
            bonus_life_step: default_bonus_life_step(),
            starting_lives: default_starting_lives(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            variety_seed: default_variety_seed(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            scoring: ScoringConfig {
                time_limit_secs: toml_cfg.scoring.time_limit_secs,
                points_per_second: toml_cfg.scoring.points_per_second,
                bonus_life_step: toml_cfg.scoring.bonus_life_step,
                starting_lives: toml_cfg.scoring.starting_lives,
            },
            levels_dir,
            variety_seed: toml_cfg.general.variety_seed,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/gemrunner → /usr/games/gemrunner
        // still finds data relative to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/gemrunner)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gemrunner");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/gemrunner)
    let sys = PathBuf::from("/usr/share/gemrunner");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.scoring.time_limit_secs, 180);
        assert_eq!(cfg.scoring.points_per_second, 5);
        assert_eq!(cfg.scoring.bonus_life_step, 2000);
        assert_eq!(cfg.scoring.starting_lives, 3);
        assert_eq!(cfg.general.levels_dir, "levels");
        assert_eq!(cfg.general.variety_seed, crate::sim::parser::VARIETY_SEED);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str(
            "[scoring]\ntime_limit_secs = 90\n",
        ).unwrap();
        assert_eq!(cfg.scoring.time_limit_secs, 90);
        assert_eq!(cfg.scoring.points_per_second, 5);
    }
}
