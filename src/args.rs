use crate::{DEFAULT_API_URL, ProfilerError, ProfilerResult};

use clap::Parser;
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock, time::Duration};

// https://stackoverflow.com/questions/74068168/clap-rs-not-printing-colors-during-help
fn get_styles() -> clap::builder::Styles {
    let cyan = anstyle::Color::Ansi(anstyle::AnsiColor::Cyan);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);

    clap::builder::Styles::styled()
        .placeholder(anstyle::Style::new().fg_color(Some(yellow)))
        .usage(anstyle::Style::new().fg_color(Some(cyan)).bold())
        .header(
            anstyle::Style::new()
                .fg_color(Some(cyan))
                .bold()
                .underline(),
        )
        .literal(anstyle::Style::new().fg_color(Some(green)))
}

// https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template
const APPLET_TEMPLATE: &str = "\
{before-help}
{about-with-newline}
{usage-heading} {usage}

{all-args}
{after-help}";

const EX1: &str = r#" profiler-view sales.csv"#;
const EX2: &str = r#" profiler-view -u http://localhost:8000 -d "%d/%m/%Y" sales.csv"#;
const EX3: &str = r#" RUST_LOG=debug profiler-view -t 30"#;

/// `http(s)://host[:port][/path]`
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9.\-]+(:\d{1,5})?(/[^\s]*)?$").expect("valid url regex")
});

/// At least one strftime directive, e.g. `%d` or `%Y`.
static DATE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[A-Za-z]").expect("valid directive regex"));

/// Command-line arguments for the Profiler View application.
#[derive(Parser, Debug, Clone)]
#[command(
    // Read from `Cargo.toml`.
    author, version, about,
    long_about = None,
    next_line_help = true,
    help_template = APPLET_TEMPLATE,
    styles=get_styles(),
    after_help = format!("EXAMPLES:\n{EX1}\n{EX2}\n{EX3}")
)]
pub struct Arguments {
    /// Base URL of the profiling backend.
    #[arg(
        short = 'u',
        long,
        value_name = "URL",
        default_value = DEFAULT_API_URL,
        help = "Base URL of the profiling backend",
        long_help = "Base URL of the profiling backend.\n\
        The endpoints /upload, /suggest and /generate-chart are resolved against it.\n\
        A trailing '/' is ignored.",
        value_parser = validate_api_url
    )]
    pub api_url: String,

    /// Date-format hint sent with the upload.
    #[arg(
        short = 'd',
        long,
        value_name = "FORMAT",
        help = "Date format hint for datetime columns (e.g. \"%d/%m/%Y\")",
        long_help = "\
Pre-fills the date-format hint sent with every upload.
The backend uses it to parse datetime columns it cannot infer on its own.

FORMAT Requirements:
- Must contain at least one strftime directive (%d, %m, %Y, %H, ...).
- Example: --date-format \"%d/%m/%Y %H:%M\"
",
        value_parser = validate_date_format
    )]
    pub date_format: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(
        short = 't',
        long,
        value_name = "SECONDS",
        help = "Abort backend requests after SECONDS [Default: wait indefinitely]",
        long_help = "Applies a timeout to every backend request.\n\
        A timed out request is reported as 'Request timed out'.",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// How long notifications stay on screen, in seconds.
    #[arg(
        short = 'n',
        long,
        value_name = "SECONDS",
        default_value_t = 3,
        help = "Notification lifetime in seconds",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub notify_secs: u64,

    /// Optional path to a data file to analyze at start-up.
    #[arg(
        value_name = "FILE_PATH",
        default_value = ".",
        required = false,
        help = "Path to a CSV file to analyze at start-up [Optional]",
        long_help = "Path to the input data file.\n\
        When it names a file, it is uploaded as soon as the window opens.\n\
        If omitted, pick a file in the UI (Browse button or drag-drop)."
    )]
    pub path: PathBuf,
}

impl Arguments {
    /// Build `Arguments` struct.
    pub fn build() -> Arguments {
        Arguments::parse()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn notify_duration(&self) -> Duration {
        Duration::from_secs(self.notify_secs)
    }

    /// The file to submit at start-up, if `path` names one.
    pub fn initial_file(&self) -> Option<&PathBuf> {
        self.path.is_file().then_some(&self.path)
    }
}

// --- Validation Functions ---

/// clap validator for '--api-url': `http(s)://host[:port][/path]`, trailing '/' removed.
fn validate_api_url(url: &str) -> ProfilerResult<String> {
    let url = url.trim().trim_end_matches('/');

    if URL_PATTERN.is_match(url) {
        Ok(url.to_string())
    } else {
        Err(ProfilerError::InvalidArgument {
            arg_name: "--api-url".to_string(),
            reason: "Expected http(s)://host[:port][/path]".to_string(),
        })
    }
}

/// clap validator for '--date-format': must carry at least one '%X' directive.
fn validate_date_format(format: &str) -> ProfilerResult<String> {
    let format = format.trim();

    if DATE_DIRECTIVE.is_match(format) {
        Ok(format.to_string())
    } else {
        Err(ProfilerError::InvalidArgument {
            arg_name: "--date-format".to_string(),
            reason: format!("'{format}' contains no strftime directive (e.g. %d, %Y)"),
        })
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
