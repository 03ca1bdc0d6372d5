//! CLI commands for scorecard-api.
//!
//! Supports API server mode, live scraping and offline parsing of saved pages.

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::routes::validate_url;
use crate::scraper::{extract_course, scrape_course, CourseDocument, RenderedPage, SiteHint};

#[derive(Parser)]
#[command(name = "scorecard-api")]
#[command(version, about = "Golf course scorecard scraper API and CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scrape a scorecard URL with the headless browser
    Scrape {
        #[arg(value_name = "URL")]
        url: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Chrome/Chromium executable override
        #[arg(short, long)]
        browser: Option<PathBuf>,

        /// Navigation timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Extract a scorecard from a saved HTML file
    Parse {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page URL the file was saved from
        #[arg(short, long)]
        url: Option<String>,

        /// Treat the page as a provider page regardless of URL
        #[arg(long)]
        provider: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Run a live scrape.
pub async fn run_scrape(
    url: String,
    format: OutputFormat,
    browser: Option<PathBuf>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;

    if let Some(path) = browser {
        config.browser.executable = Some(path.to_string_lossy().to_string());
    }
    if let Some(secs) = timeout {
        config.browser.navigation_timeout_secs = secs;
    }

    let url = validate_url(&url).map_err(|_| anyhow::anyhow!("Not an http(s) URL: {}", url))?;

    eprintln!("Scraping: {}", url);
    let course = scrape_course(url.as_str(), &config.browser).await?;

    print_course(&course, format)
}

/// Run the extraction strategies over a saved page.
pub fn run_parse(
    input: PathBuf,
    url: Option<String>,
    provider: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(&input)?;
    let page = RenderedPage::from_html(html, None);

    let source_url = url.unwrap_or_else(|| input.display().to_string());
    let hint = if provider {
        SiteHint::Provider
    } else {
        SiteHint::from_url(&source_url)
    };

    eprintln!(
        "Parsing {} ({} scripts, {:?} strategies)",
        input.display(),
        page.script_contents.len(),
        hint
    );
    let course = extract_course(&page, &source_url, hint)?;

    print_course(&course, format)
}

fn print_course(course: &CourseDocument, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(course)?),
        OutputFormat::Table => print!("{}", render_table(course)),
    }
    Ok(())
}

/// Plain-text scorecard: one row per hole, one column per tee.
pub fn render_table(course: &CourseDocument) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} ({})", course.name, course.location);
    let _ = writeln!(
        out,
        "{} holes, par {}, via {}",
        course.hole_count, course.total_par, course.extraction_method
    );
    let _ = writeln!(out);

    let _ = write!(out, "{:>4} {:>4} {:>4}", "Hole", "Par", "SI");
    for tee in &course.tees {
        let _ = write!(out, " {:>8}", tee.display_name);
    }
    let _ = writeln!(out);

    for hole in &course.holes {
        let _ = write!(
            out,
            "{:>4} {:>4} {:>4}",
            hole.number,
            dash(hole.par),
            dash(hole.stroke_index)
        );
        for tee in &course.tees {
            let _ = write!(out, " {:>8}", dash(hole.yardage(&tee.key)));
        }
        let _ = writeln!(out);
    }

    let _ = write!(out, "{:>4} {:>4} {:>4}", "Tot", course.total_par, "");
    for tee in &course.tees {
        let _ = write!(out, " {:>8}", tee.total_yardage);
    }
    let _ = writeln!(out);

    out
}

fn dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CARD: &str = r#"<html><head><title>Oak Hills - Scorecard</title></head><body><table>
        <tr><th>Hole</th><th>White</th><th>Par</th></tr>
        <tr><td>1</td><td>380</td><td>4</td></tr>
        <tr><td>2</td><td>150</td><td></td></tr>
    </table></body></html>"#;

    #[test]
    fn test_cli_parses_scrape() {
        let cli = Cli::try_parse_from([
            "scorecard-api",
            "scrape",
            "https://example.com",
            "--format",
            "table",
            "--timeout",
            "10",
        ])
        .unwrap();

        match cli.command {
            Commands::Scrape {
                url,
                format,
                timeout,
                browser,
            } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(format, OutputFormat::Table);
                assert_eq!(timeout, Some(10));
                assert!(browser.is_none());
            }
            _ => panic!("expected scrape command"),
        }
    }

    #[test]
    fn test_render_table() {
        let page = RenderedPage::from_html(CARD.to_string(), None);
        let course = extract_course(&page, "https://oak.example", SiteHint::Generic).unwrap();
        let table = render_table(&course);

        assert!(table.starts_with("Oak Hills (Unknown Location)"));
        assert!(table.contains("2 holes, par 4, via generic_table"));
        assert!(table.contains("White"));
        assert!(table.lines().any(|l| l.trim_start().starts_with("2") && l.contains('-')));
        assert!(table.lines().last().unwrap().contains("530"));
    }

    #[test]
    fn test_run_parse_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CARD.as_bytes()).unwrap();

        let result = run_parse(
            file.path().to_path_buf(),
            Some("https://oak.example".into()),
            false,
            OutputFormat::Json,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_run_parse_missing_file() {
        assert!(run_parse(PathBuf::from("/nonexistent/card.html"), None, false, OutputFormat::Json).is_err());
    }
}
