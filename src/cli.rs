//! CLI argument parsing for mergesplit.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, settings overrides, and turning the chosen
//! subcommand into a [`JobRequest`].
//!
//! # Examples
//!
//! ```no_run
//! use mergesplit::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let request = cli.to_request().expect("invalid selection");
//! println!("Running {} over {} file(s)", request.kind, request.selection.len());
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{CompressionProfile, Settings};
use crate::error::{MergeSplitError, Result};
use crate::job::{JobRequest, OperationKind, Selection};
use crate::utils::{collect_paths_for_patterns, filter_pdfs, list_folder_pdfs};

/// Batch merge, split, rasterize and compress PDF documents.
///
/// Results are written under the output directory, in a folder per
/// operation and per day.
#[derive(Parser, Debug)]
#[command(name = "mergesplit")]
#[command(version)]
#[command(about = "Batch merge, split, rasterize and compress PDF documents", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base directory results are written under
    ///
    /// Defaults to "Output" in the current directory.
    #[arg(long, global = true, value_name = "DIR", env = "MERGESPLIT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Size ceiling for each rendered JPG, in KB
    #[arg(long, global = true, value_name = "KB")]
    pub max_jpg_kb: Option<u64>,

    /// Size the compressed PDF should stay under, in KB
    ///
    /// Exceeding it produces a warning, not an error.
    #[arg(long, global = true, value_name = "KB")]
    pub max_pdf_kb: Option<u64>,

    /// Compression profile passed to Ghostscript
    ///
    /// - screen: lowest quality, smallest files
    /// - ebook: medium quality (default)
    /// - printer: high quality
    /// - prepress: highest quality, preserves colour
    #[arg(long, global = true, value_name = "PROFILE")]
    #[arg(value_parser = ["screen", "ebook", "printer", "prepress"])]
    pub profile: Option<String>,

    /// Path to the Ghostscript executable
    ///
    /// Searched for on PATH (and the standard install folder on Windows)
    /// when not given.
    #[arg(long, global = true, value_name = "PATH", env = "MERGESPLIT_GS")]
    pub gs_path: Option<PathBuf>,

    /// Read settings from a JSON file
    ///
    /// Command-line flags override values from the file.
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Verbose output - show progress and debug diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print job events as JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

/// Operation to run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Merge PDF files into one document
    ///
    /// With --folder, every PDF in the folder is grouped by the part of its
    /// name before the first underscore, and each group becomes one document
    /// (A_1.pdf + A_2.pdf -> A.pdf). Otherwise at least two files are merged
    /// in the order given.
    ///
    /// Examples:
    ///   mergesplit merge part1.pdf part2.pdf
    ///   mergesplit merge --folder scans/
    Merge {
        /// Folder whose PDFs are merged by group
        #[arg(long, value_name = "DIR", conflicts_with = "inputs")]
        folder: Option<PathBuf>,

        /// Files to merge, in order (glob patterns allowed)
        #[arg(value_name = "FILE", required_unless_present = "folder")]
        inputs: Vec<String>,
    },

    /// Split a PDF into one file per page
    Split {
        /// PDF file to split
        #[arg(value_name = "FILE")]
        input: String,
    },

    /// Render each page of a PDF to a size-bounded JPG
    Convert {
        /// PDF file to convert
        #[arg(value_name = "FILE")]
        input: String,
    },

    /// Compress a PDF with Ghostscript
    Compress {
        /// PDF file to compress
        #[arg(value_name = "FILE")]
        input: String,
    },
}

impl Command {
    /// Operation this subcommand runs.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Merge { .. } => OperationKind::Merge,
            Self::Split { .. } => OperationKind::Split,
            Self::Convert { .. } => OperationKind::ConvertToImage,
            Self::Compress { .. } => OperationKind::Compress,
        }
    }
}

impl Cli {
    /// Build the settings for this run.
    ///
    /// Starts from the settings file if one was given, otherwise the
    /// defaults, then applies command-line overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed, the
    /// profile is unknown, or the resulting settings are invalid.
    pub fn to_settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(ref dir) = self.output_dir {
            settings.output_base = dir.clone();
        }
        if let Some(kb) = self.max_jpg_kb {
            settings.max_jpg_kb = kb;
        }
        if let Some(kb) = self.max_pdf_kb {
            settings.max_pdf_kb = kb;
        }
        if let Some(ref profile) = self.profile {
            settings.profile = CompressionProfile::from_str(profile)?;
        }
        if let Some(ref path) = self.gs_path {
            settings.tool_path = Some(path.clone());
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Resolve the subcommand's inputs into a job request.
    ///
    /// Glob patterns are expanded and the result is filtered to PDF files.
    /// Cardinality is checked later, when the job is started.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid or the merge folder cannot be
    /// listed.
    pub fn to_request(&self) -> Result<JobRequest> {
        let kind = self.command.kind();
        let selection = match &self.command {
            Command::Merge {
                folder: Some(folder),
                ..
            } => Selection::Folder {
                files: list_folder_pdfs(folder)?,
                folder: folder.clone(),
            },
            Command::Merge { inputs, .. } => Selection::Files(resolve_files(inputs)?),
            Command::Split { input } | Command::Convert { input } | Command::Compress { input } => {
                Selection::Files(resolve_files(std::slice::from_ref(input))?)
            }
        };

        Ok(JobRequest::new(kind, selection))
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if a size ceiling is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_jpg_kb == Some(0) {
            return Err(MergeSplitError::invalid_config(
                "--max-jpg-kb must be at least 1",
            ));
        }
        if self.max_pdf_kb == Some(0) {
            return Err(MergeSplitError::invalid_config(
                "--max-pdf-kb must be at least 1",
            ));
        }
        Ok(())
    }

    /// The folder given to `merge --folder`, if any.
    pub fn merge_folder(&self) -> Option<&Path> {
        match &self.command {
            Command::Merge { folder, .. } => folder.as_deref(),
            _ => None,
        }
    }
}

fn resolve_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    Ok(filter_pdfs(collect_paths_for_patterns(patterns)?))
}
