//! Runtime configuration.
//!
//! The core consumes an enumerated set of keys — it never watches or
//! re-parses files itself. `patina.toml` is looked for in the working
//! directory first, then the platform config dir. Unknown fields are
//! tolerated so configs can carry keys for newer builds, and a parse
//! error falls back to defaults rather than refusing to start.
//!
//! `apply_context` clamps values that depend on the machine (worker
//! count against available parallelism) and resolves palette strings
//! into colors; the raw parsed values are kept so a later context
//! change can re-clamp.

use anyhow::Result;
use core_color::Rgb;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub scrollback_lines: usize,
    /// 0 = derive from available parallelism.
    pub render_worker_count: usize,
    /// `#rrggbb` entries for palette slots 0–15.
    pub palette: Vec<String>,
    pub default_fg: Option<String>,
    pub default_bg: Option<String>,
    pub box_drawing: BoxDrawingConfig,
    pub bold_in_bright: BoldInBrightConfig,
    /// Initial tab stops; empty = every `tab_interval` columns.
    pub tab_stops: Vec<usize>,
    pub tab_interval: usize,
    pub resize_delay_ms: u64,
    pub overflowing_glyphs: bool,
    pub mouse_alternate_scroll: bool,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            scrollback_lines: 1000,
            render_worker_count: 0,
            palette: Vec::new(),
            default_fg: None,
            default_bg: None,
            box_drawing: BoxDrawingConfig::default(),
            bold_in_bright: BoldInBrightConfig::default(),
            tab_stops: Vec::new(),
            tab_interval: 8,
            resize_delay_ms: 100,
            overflowing_glyphs: false,
            mouse_alternate_scroll: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoxDrawingConfig {
    /// Stroke width as a fraction of the cell diagonal.
    pub base_thickness: f64,
    /// Solid translucent shades instead of stipple patterns.
    pub solid_shades: bool,
}

impl Default for BoxDrawingConfig {
    fn default() -> Self {
        Self {
            base_thickness: 0.04,
            solid_shades: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoldInBrightConfig {
    pub enabled: bool,
    pub palette_based: bool,
    pub amount: f32,
}

impl Default for BoldInBrightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            palette_based: true,
            amount: 1.3,
        }
    }
}

/// Machine context the raw values are clamped against.
#[derive(Debug, Clone, Copy)]
pub struct ConfigContext {
    pub available_parallelism: usize,
}

impl ConfigContext {
    pub fn detect() -> Self {
        Self {
            available_parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Original file contents, for diagnostics.
    pub raw: Option<String>,
    pub file: ConfigFile,
    pub effective_worker_count: usize,
    pub palette16: Option<[Rgb; 16]>,
    pub default_fg: Option<Rgb>,
    pub default_bg: Option<Rgb>,
}

/// Best-effort config path following platform conventions.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("patina.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("patina").join("patina.toml");
    }
    PathBuf::from("patina.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config {
            raw: Some(content),
            file,
            ..Config::default()
        }),
        Err(err) => {
            tracing::warn!(target: "config", %err, ?path, "config parse failed; using defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Clamp machine-dependent values and resolve color strings.
    /// Returns the effective worker count.
    pub fn apply_context(&mut self, ctx: ConfigContext) -> usize {
        let raw = self.file.render_worker_count;
        let derived = ctx.available_parallelism.saturating_sub(1).max(1);
        let effective = if raw == 0 {
            derived
        } else {
            raw.min(ctx.available_parallelism * 2)
        };
        if raw != 0 && effective != raw {
            info!(
                target: "config",
                raw,
                effective,
                parallelism = ctx.available_parallelism,
                "render_worker_count_clamped"
            );
        }
        self.effective_worker_count = effective;

        if !self.file.palette.is_empty() {
            let mut table = [Rgb::BLACK; 16];
            let mut ok = true;
            for (i, slot) in table.iter_mut().enumerate() {
                match self.file.palette.get(i).and_then(|s| Rgb::parse(s)) {
                    Some(c) => *slot = c,
                    None => {
                        tracing::warn!(target: "config", index = i, "bad or missing palette entry");
                        ok = false;
                        break;
                    }
                }
            }
            self.palette16 = ok.then_some(table);
        }
        self.default_fg = self.file.default_fg.as_deref().and_then(Rgb::parse);
        self.default_bg = self.file.default_bg.as_deref().and_then(Rgb::parse);

        effective
    }

    /// Initial tab stops for `cols` columns.
    pub fn tab_stops(&self, cols: usize) -> Vec<usize> {
        if self.file.tab_stops.is_empty() {
            let interval = self.file.tab_interval.max(1);
            (interval..cols).step_by(interval).collect()
        } else {
            let mut stops: Vec<usize> = self
                .file
                .tab_stops
                .iter()
                .copied()
                .filter(|&c| c < cols)
                .collect();
            stops.sort_unstable();
            stops.dedup();
            stops
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(parallelism: usize) -> ConfigContext {
        ConfigContext {
            available_parallelism: parallelism,
        }
    }

    #[test]
    fn defaults_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent__.toml"))).unwrap();
        assert_eq!(cfg.file.scrollback_lines, 1000);
        assert_eq!(cfg.file.tab_interval, 8);
    }

    #[test]
    fn parse_error_falls_back() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "scrollback_lines = \"not a number\"").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.scrollback_lines, 1000);
    }

    #[test]
    fn unknown_fields_tolerated() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "scrollback_lines = 42\nfuture_key = true\n[future_section]\nx = 1\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.scrollback_lines, 42);
    }

    #[test]
    fn worker_count_derivation_and_clamp() {
        let mut cfg = Config::default();
        assert_eq!(cfg.apply_context(ctx(8)), 7);

        cfg.file.render_worker_count = 4;
        assert_eq!(cfg.apply_context(ctx(8)), 4);

        cfg.file.render_worker_count = 400;
        assert_eq!(cfg.apply_context(ctx(8)), 16);

        cfg.file.render_worker_count = 0;
        assert_eq!(cfg.apply_context(ctx(1)), 1);
    }

    #[test]
    fn palette_parsing() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let entries: Vec<String> = (0..16).map(|i| format!("\"#0000{i:02x}\"")).collect();
        std::fs::write(
            tmp.path(),
            format!(
                "palette = [{}]\ndefault_bg = \"#101010\"\n",
                entries.join(", ")
            ),
        )
        .unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        cfg.apply_context(ctx(4));
        let p = cfg.palette16.expect("palette parsed");
        assert_eq!(p[5], Rgb::new(0, 0, 5));
        assert_eq!(cfg.default_bg, Some(Rgb::new(0x10, 0x10, 0x10)));
    }

    #[test]
    fn bad_palette_entry_rejected_whole() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "palette = [\"#123456\", \"oops\"]\n").unwrap();
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        cfg.apply_context(ctx(4));
        assert!(cfg.palette16.is_none());
    }

    #[test]
    fn tab_stops_default_and_custom() {
        let cfg = Config::default();
        assert_eq!(cfg.tab_stops(20), vec![8, 16]);

        let mut cfg = Config::default();
        cfg.file.tab_stops = vec![30, 4, 12, 4];
        assert_eq!(cfg.tab_stops(20), vec![4, 12]);
    }
}
