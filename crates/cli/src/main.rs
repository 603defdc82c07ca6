use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use mp2md_core::{
    ConvertConfig, ImagePolicy, batch_convert, batch_convert_to_text, convert_file_to_markdown, convert_file_to_text,
    convert_url_to_markdown, rename_directories,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for converted articles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Markdown,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: markdown, text", s)),
        }
    }
}

/// Convert captured article pages to Markdown or plain text
#[derive(Parser, Debug)]
#[command(name = "mp2md")]
#[command(author = "mp2md Contributors")]
#[command(version)]
#[command(about = "Convert captured article pages to Markdown or plain text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, global = true, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch an article page and convert it to Markdown
    Url {
        /// Article URL
        url: String,

        /// Output directory or .md file
        #[arg(value_name = "OUTPUT", default_value = ".")]
        output: String,

        /// Image handling (url, save, base64)
        #[arg(short, long, default_value = "base64", value_name = "POLICY")]
        image: ImagePolicy,
    },

    /// Convert a local HTML file
    File {
        /// HTML file to convert
        #[arg(value_name = "HTML")]
        html: String,

        /// Output directory or file
        #[arg(value_name = "OUTPUT", default_value = ".")]
        output: String,

        /// Image handling (url, save, base64)
        #[arg(short, long, default_value = "base64", value_name = "POLICY")]
        image: ImagePolicy,

        /// Output format (markdown, text)
        #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Convert every article subdirectory of a directory
    Batch {
        /// Directory holding one subdirectory per article
        #[arg(value_name = "DIR")]
        dir: String,

        /// Image handling (url, save, base64)
        #[arg(short, long, default_value = "base64", value_name = "POLICY")]
        image: ImagePolicy,

        /// Output format (markdown, text)
        #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Normalize dated article directory names
    Rename {
        /// Directory holding one subdirectory per article
        #[arg(value_name = "DIR")]
        dir: String,
    },

    /// Generate a shell completion script
    Completions {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

impl Cli {
    fn convert_config(&self, image_policy: ImagePolicy) -> ConvertConfig {
        let mut builder = ConvertConfig::builder().image_policy(image_policy).timeout(self.timeout);
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder.build()
    }
}

/// Paths pasted from file managers often arrive wrapped in quotes.
fn clean_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.replace('"', ""))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_written(path: &Path) {
    let size = fs::metadata(path).map(|m| m.len() as usize).unwrap_or_default();
    echo::print_success(&format!(
        "Output written to {} ({})",
        path.display().bright_white(),
        echo::format_size(size)
    ));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(command = ?cli.command, "parsed arguments");

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    match &cli.command {
        Command::Url { url, output, image } => {
            let url = url.replace('"', "");
            let output = clean_path(output);
            let config = cli.convert_config(*image);

            echo::print_step(1, 2, &format!("Fetching {}", url.bright_white().underline()));
            echo::print_step(2, 2, &format!("Converting with image policy {}", image));

            let written = convert_url_to_markdown(&url, &output, &config)
                .await
                .with_context(|| format!("Failed to convert {}", url))?;
            report_written(&written);
        }
        Command::File { html, output, image, format } => {
            let html = clean_path(html);
            let output = clean_path(output);

            echo::print_step(1, 1, &format!("Converting {}", html.display().bright_white()));

            let written = match format {
                OutputFormat::Markdown => convert_file_to_markdown(&html, &output, &cli.convert_config(*image)).await,
                OutputFormat::Text => {
                    if *image != ImagePolicy::default() {
                        echo::print_warning("Image policy is ignored for text output");
                    }
                    convert_file_to_text(&html, &output)
                }
            }
            .with_context(|| format!("Failed to convert {}", html.display()))?;
            report_written(&written);
        }
        Command::Batch { dir, image, format } => {
            let dir = clean_path(dir);

            echo::print_step(1, 1, &format!("Converting articles under {}", dir.display().bright_white()));

            let count = match format {
                OutputFormat::Markdown => batch_convert(&dir, &cli.convert_config(*image)).await,
                OutputFormat::Text => batch_convert_to_text(&dir),
            }
            .with_context(|| format!("Failed to batch convert {}", dir.display()))?;

            if count == 0 {
                echo::print_warning("No articles were converted");
            } else {
                echo::print_success(&format!("Converted {} articles", count));
            }
        }
        Command::Rename { dir } => {
            let dir = clean_path(dir);
            let count = rename_directories(&dir).with_context(|| format!("Failed to rename under {}", dir.display()))?;
            echo::print_success(&format!("Renamed {} directories", count));
        }
        Command::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "mp2md", &mut std::io::stdout());
        }
    }

    Ok(())
}
