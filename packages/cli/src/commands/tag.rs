use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use glob::Pattern;
use liveedit_tagger::{relative_path, BuildMode, TagReport, TagStatus, Tagger, TaggerOptions};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Development,
    Production,
}

impl From<ModeArg> for BuildMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => BuildMode::Development,
            ModeArg::Production => BuildMode::Production,
        }
    }
}

#[derive(Debug, Args)]
pub struct TagArgs {
    /// File or directory to tag (defaults to the configured source directory)
    pub path: Option<String>,

    /// Build mode; production builds are left untouched
    #[arg(short, long, value_enum, default_value = "development")]
    pub mode: ModeArg,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Write a source map next to each tagged file
    #[arg(long)]
    pub source_maps: bool,
}

pub fn tag(args: TagArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let root = PathBuf::from(cwd);
    let target = match &args.path {
        Some(path) => root.join(path),
        None => config.get_src_dir(cwd),
    };

    if !target.exists() {
        return Err(anyhow!("Path does not exist: {:?}", target));
    }

    let mut options = config.to_tagger_options(args.mode.into());
    if args.source_maps {
        options = options.with_source_maps(true);
    }
    if args.stdout {
        options = options.with_source_maps(false);
    }

    if options.mode != BuildMode::Development {
        println!(
            "{}",
            "⚠️  Production mode: files are left untagged".yellow()
        );
        return Ok(());
    }

    println!("{}", "🏷️  Tagging source files...".bright_blue().bold());

    let excludes = config.exclude_patterns()?;
    let files = find_source_files(&target, &root, &options, &excludes);

    if files.is_empty() {
        println!("{}", "⚠️  No taggable files found".yellow());
        return Ok(());
    }

    println!("Found {} files", files.len());

    let base = if target.is_dir() {
        target.clone()
    } else {
        target.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone())
    };
    let out_dir = match &args.out_dir {
        Some(out) => root.join(out),
        None => config.get_out_dir(cwd),
    };

    let mut tagger = Tagger::new(options)?;
    let mut summary = Summary::default();

    for file in &files {
        let display = file.strip_prefix(&base).unwrap_or(file).display().to_string();

        let report = match tag_source_file(&mut tagger, file, &root) {
            Ok(report) => report,
            Err(e) => {
                summary.errors += 1;
                eprintln!("  {} {} - {}", "✗".red(), display, e.to_string().red());
                continue;
            }
        };

        if args.stdout {
            println!("{}", report.code);
            summary.record(&report);
            continue;
        }

        let output_file = out_dir.join(file.strip_prefix(&base).unwrap_or(file));
        match write_output(&report, &output_file) {
            Ok(()) => {
                summary.record(&report);
                print_file_result(&display, &report, &output_file);
            }
            Err(e) => {
                summary.errors += 1;
                eprintln!("  {} {} - {}", "✗".red(), display, e.to_string().red());
            }
        }
    }

    println!();
    summary.print();

    Ok(())
}

/// Tag one file on disk. Its identity path is relative to `root`.
pub fn tag_source_file(tagger: &mut Tagger, file: &Path, root: &Path) -> Result<TagReport> {
    let source = fs::read_to_string(file)?;
    let identity_path = relative_path(file, root);
    let report = tagger.tag_file(&source, &identity_path);
    debug!(
        file = %identity_path,
        inserted = report.inserted,
        failed = report.failed,
        "Tagged file"
    );
    Ok(report)
}

/// Every file under `target` the tagger applies to and no exclude pattern matches.
pub fn find_source_files(
    target: &Path,
    root: &Path,
    options: &TaggerOptions,
    excludes: &[Pattern],
) -> Vec<PathBuf> {
    let eligible = |path: &Path| {
        let relative = relative_path(path, root);
        options.applies_to(&relative) && !excludes.iter().any(|p| p.matches(&relative))
    };

    if target.is_file() {
        return if eligible(target) {
            vec![target.to_path_buf()]
        } else {
            vec![]
        };
    }

    let mut files: Vec<PathBuf> = WalkDir::new(target)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_vendor_dir(entry, &options.vendor_dirs))
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && eligible(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn is_vendor_dir(entry: &DirEntry, vendor_dirs: &[String]) -> bool {
    entry.file_type().is_dir()
        && entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| vendor_dirs.iter().any(|vendor| vendor == name))
            .unwrap_or(false)
}

fn write_output(report: &TagReport, output_file: &Path) -> Result<()> {
    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_file, &report.code)?;

    if let Some(map) = &report.source_map {
        let mut buffer = Vec::new();
        map.to_writer(&mut buffer)?;
        fs::write(map_path(output_file), buffer)?;
    }

    Ok(())
}

/// `Button.tsx` -> `Button.tsx.map`
fn map_path(output_file: &Path) -> PathBuf {
    let mut name = OsString::from(output_file.as_os_str());
    name.push(".map");
    PathBuf::from(name)
}

fn print_file_result(display: &str, report: &TagReport, output_file: &Path) {
    match report.status {
        TagStatus::PassedThrough => println!(
            "  {} {} copied unchanged (could not be tagged)",
            "⚠️".yellow(),
            display
        ),
        _ if report.failed > 0 => println!(
            "  {} {} → {} ({} elements, {} skipped)",
            "✓".green(),
            display,
            output_file.display(),
            report.inserted,
            report.failed.to_string().yellow()
        ),
        _ => println!(
            "  {} {} → {} ({} elements)",
            "✓".green(),
            display,
            output_file.display(),
            report.inserted
        ),
    }
}

#[derive(Debug, Default, PartialEq)]
struct Summary {
    files: usize,
    elements: usize,
    skipped_elements: usize,
    passed_through: usize,
    errors: usize,
}

impl Summary {
    fn record(&mut self, report: &TagReport) {
        self.files += 1;
        self.elements += report.inserted;
        self.skipped_elements += report.failed;
        if report.status == TagStatus::PassedThrough {
            self.passed_through += 1;
        }
    }

    fn print(&self) {
        if self.errors == 0 && self.passed_through == 0 {
            println!(
                "{} Tagged {} elements in {} files",
                "✅".green(),
                self.elements,
                self.files
            );
        } else {
            println!(
                "{} Tagged {} elements in {} files, {} copied unchanged, {} errors",
                "⚠️".yellow(),
                self.elements,
                self.files,
                self.passed_through,
                self.errors
            );
        }
    }
}
