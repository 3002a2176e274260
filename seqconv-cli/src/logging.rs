// ============================================================================
// seqconv-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: fern dispatch to stderr and the optional run log file
//
// The application logs through the `log` facade; fern is the backend and
// env_logger's filter parser decides what gets through:
// - RUST_LOG directives take precedence when set
// - otherwise `info`, or `debug` with --verbose (shows raw ffmpeg stderr
//   under the `seqconv::ffmpeg` target)
//
// With --log-dir every record is also appended to
// `seqconv_run_<timestamp>.log` in that directory, in a plain dated format.
//
// AI-ASSISTANT-INFO: Logging initialisation for the CLI

use crate::error::{CliErrorContext, CliResult};
use env_logger::filter::{Builder as FilterBuilder, Filter};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let name = format!("seqconv_run_{}.log", seqconv_cli::logging::get_timestamp());
/// assert!(name.starts_with("seqconv_run_"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Name of the run log written into `--log-dir`.
pub fn run_log_file_name() -> String {
    format!("seqconv_run_{}.log", get_timestamp())
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Builds the record filter from RUST_LOG-style `directives`, falling back
/// to the verbosity default when they are absent or blank.
fn build_filter(verbose: bool, directives: Option<&str>) -> Filter {
    let directives = directives
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default_filter(verbose));
    FilterBuilder::new().parse(directives).build()
}

/// Initialises logging. Returns the run log path when `log_dir` is given.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(verbose, rust_log.as_deref());

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        .level(filter.filter())
        .filter(move |metadata| filter.enabled(metadata))
        .chain(console);

    let log_path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).cli_with_context(|| {
                format!("Failed to create log directory '{}'", dir.display())
            })?;
            let path = dir.join(run_log_file_name());
            let file = fern::log_file(&path).cli_with_context(|| {
                format!("Failed to create log file '{}'", path.display())
            })?;
            dispatch = dispatch.chain(
                fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "{} [{}] {}",
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                            record.level(),
                            message
                        ))
                    })
                    .chain(file),
            );
            Some(path)
        }
        None => None,
    };

    // A second init (integration harnesses) keeps the first logger
    let _ = dispatch.apply();
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let stamp = get_timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    fn metadata(level: log::Level, target: &str) -> log::Metadata<'_> {
        log::Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "info");
        assert_eq!(default_filter(true), "debug");
    }

    #[test]
    fn test_verbosity_sets_level_without_directives() {
        let quiet = build_filter(false, None);
        assert!(quiet.enabled(&metadata(log::Level::Info, "seqconv_core")));
        assert!(!quiet.enabled(&metadata(log::Level::Debug, "seqconv::ffmpeg")));

        let verbose = build_filter(true, Some("  "));
        assert!(verbose.enabled(&metadata(log::Level::Debug, "seqconv::ffmpeg")));
    }

    #[test]
    fn test_directives_override_verbosity() {
        let filter = build_filter(true, Some("warn,seqconv::ffmpeg=trace"));
        assert!(!filter.enabled(&metadata(log::Level::Info, "seqconv_core")));
        assert!(filter.enabled(&metadata(log::Level::Warn, "seqconv_core")));
        assert!(filter.enabled(&metadata(log::Level::Trace, "seqconv::ffmpeg")));
    }

    #[test]
    fn test_run_log_name() {
        let name = run_log_file_name();
        assert!(name.starts_with("seqconv_run_"));
        assert!(name.ends_with(".log"));
    }
}
