//! Process-wide settings for mergesplit.
//!
//! Settings are read once before a job starts and handed to the job as an
//! immutable snapshot, so nothing here is ever mutated while a job runs.
//! Values come from built-in defaults, an optional JSON settings file, and
//! finally CLI overrides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{MergeSplitError, Result};

/// Default output base directory.
pub const DEFAULT_OUTPUT_BASE: &str = "Output";

/// Default ceiling for rasterized pages, in KB.
pub const DEFAULT_MAX_JPG_KB: u64 = 200;

/// Default ceiling for compressed documents, in KB.
pub const DEFAULT_MAX_PDF_KB: u64 = 200;

/// Bare name of the compression tool when nothing better is known.
pub const DEFAULT_TOOL: &str = "gs";

/// Ghostscript `PDFSETTINGS` profile used for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionProfile {
    /// Smallest output, lowest image quality.
    Screen,
    /// Medium quality.
    #[default]
    Ebook,
    /// High quality.
    Printer,
    /// Highest quality, color preserving.
    Prepress,
}

impl CompressionProfile {
    /// Value passed to `-dPDFSETTINGS=`.
    pub fn as_tool_arg(&self) -> &'static str {
        match self {
            Self::Screen => "/screen",
            Self::Ebook => "/ebook",
            Self::Printer => "/printer",
            Self::Prepress => "/prepress",
        }
    }
}

impl fmt::Display for CompressionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_tool_arg()[1..])
    }
}

impl FromStr for CompressionProfile {
    type Err = MergeSplitError;

    /// Parse `screen`, `ebook`, `printer` or `prepress`, optionally with the
    /// leading slash Ghostscript uses.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('/').to_lowercase().as_str() {
            "screen" => Ok(Self::Screen),
            "ebook" => Ok(Self::Ebook),
            "printer" => Ok(Self::Printer),
            "prepress" => Ok(Self::Prepress),
            _ => Err(MergeSplitError::invalid_config(format!(
                "Invalid compression profile: {s}. Must be one of: screen, ebook, printer, prepress"
            ))),
        }
    }
}

/// Settings shared by every job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root under which every operation's result folder is created.
    pub output_base: PathBuf,

    /// Maximum size of a rasterized page, in KB.
    pub max_jpg_kb: u64,

    /// Size a compressed document should stay under, in KB.
    pub max_pdf_kb: u64,

    /// Compression profile handed to the tool.
    pub profile: CompressionProfile,

    /// Explicit tool location. `None` means resolve from the search path.
    pub tool_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_base: PathBuf::from(DEFAULT_OUTPUT_BASE),
            max_jpg_kb: DEFAULT_MAX_JPG_KB,
            max_pdf_kb: DEFAULT_MAX_PDF_KB,
            profile: CompressionProfile::default(),
            tool_path: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            MergeSplitError::invalid_config(format!(
                "Failed to parse settings file {}: {e}",
                path.display()
            ))
        })
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a size ceiling is zero or the output base is empty.
    pub fn validate(&self) -> Result<()> {
        if self.output_base.as_os_str().is_empty() {
            return Err(MergeSplitError::invalid_config(
                "Output base directory cannot be empty",
            ));
        }
        if self.max_jpg_kb == 0 {
            return Err(MergeSplitError::invalid_config(
                "Maximum JPG size must be at least 1 KB",
            ));
        }
        if self.max_pdf_kb == 0 {
            return Err(MergeSplitError::invalid_config(
                "Maximum PDF size must be at least 1 KB",
            ));
        }
        Ok(())
    }

    /// Rasterized page ceiling in bytes.
    pub fn max_jpg_bytes(&self) -> u64 {
        self.max_jpg_kb * 1024
    }

    /// Compressed document ceiling in bytes.
    pub fn max_pdf_bytes(&self) -> u64 {
        self.max_pdf_kb * 1024
    }

    /// Tool binary to invoke: the configured path, else whatever the host
    /// search path or conventional install location yields.
    pub fn resolved_tool(&self) -> PathBuf {
        match &self.tool_path {
            Some(path) => path.clone(),
            None => locate_tool(),
        }
    }
}

#[cfg(windows)]
const TOOL_NAMES: &[&str] = &["gswin64c.exe", "gswin32c.exe", "gs.exe"];

#[cfg(not(windows))]
const TOOL_NAMES: &[&str] = &["gs"];

/// Resolve the compression tool from `PATH`, then from the conventional
/// Windows install directory. Falls back to the bare name.
pub fn locate_tool() -> PathBuf {
    let search_dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect())
        .unwrap_or_default();

    if let Some(found) = find_in_dirs(TOOL_NAMES, &search_dirs) {
        return found;
    }

    if let Some(found) = probe_install_dir(Path::new(r"C:\Program Files\gs")) {
        return found;
    }

    PathBuf::from(DEFAULT_TOOL)
}

/// First `dir/name` that exists as a file, searching dirs in order.
pub fn find_in_dirs(names: &[&str], dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Look for `<base>/<version>/bin/gswin64c.exe`, trying version directories
/// in reverse name order.
pub fn probe_install_dir(base: &Path) -> Option<PathBuf> {
    let mut versions: Vec<PathBuf> = std::fs::read_dir(base)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    versions.sort();

    versions
        .into_iter()
        .rev()
        .map(|version| version.join("bin").join("gswin64c.exe"))
        .find(|candidate| candidate.is_file())
}
