//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use wpfleet_core::{HealthGrade, Priority, Severity, SiteStatus, SiteSyncStatus, UpdateStatus};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Colors status-like cells in table output. A disabled painter returns
/// the plain `Display` text.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: should_color(mode),
        }
    }

    fn paint(self, value: impl Display, tone: Tone) -> String {
        if !self.enabled {
            return value.to_string();
        }
        match tone {
            Tone::Good => value.green().to_string(),
            Tone::Warn => value.yellow().to_string(),
            Tone::Bad => value.red().bold().to_string(),
            Tone::Muted => value.dimmed().to_string(),
        }
    }

    pub fn status(self, status: SiteStatus) -> String {
        let tone = match status {
            SiteStatus::Online => Tone::Good,
            SiteStatus::Offline => Tone::Bad,
            SiteStatus::Unknown => Tone::Muted,
        };
        self.paint(status, tone)
    }

    pub fn grade(self, grade: HealthGrade) -> String {
        let tone = match grade {
            HealthGrade::Healthy => Tone::Good,
            HealthGrade::Degraded => Tone::Warn,
            HealthGrade::Critical => Tone::Bad,
        };
        self.paint(grade, tone)
    }

    pub fn severity(self, severity: Severity) -> String {
        let tone = match severity {
            Severity::Critical => Tone::Bad,
            Severity::Warning => Tone::Warn,
        };
        self.paint(severity, tone)
    }

    pub fn priority(self, priority: Priority) -> String {
        let tone = match priority {
            Priority::Critical => Tone::Bad,
            Priority::High => Tone::Warn,
            Priority::Medium | Priority::Low => Tone::Muted,
        };
        self.paint(priority, tone)
    }

    pub fn sync_outcome(self, status: &SiteSyncStatus) -> String {
        match status {
            SiteSyncStatus::Synced { .. } => self.paint("synced", Tone::Good),
            SiteSyncStatus::Offline => self.paint("offline", Tone::Bad),
            SiteSyncStatus::Failed { .. } => self.paint("failed", Tone::Bad),
        }
    }

    pub fn update_status(self, status: UpdateStatus) -> String {
        let tone = match status {
            UpdateStatus::Success => Tone::Good,
            UpdateStatus::Failed => Tone::Bad,
        };
        self.paint(status, tone)
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Warn,
    Bad,
    Muted,
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, which returns a pre-formatted string.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// `Option<T>` cell text, `-` when absent.
pub fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: &'static str,
        count: u32,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: "a", count: 1 }, Item { id: "b", count: 2 }]
    }

    fn render(format: OutputFormat) -> String {
        render_list(
            format,
            &items(),
            |i| Row { id: i.id.into() },
            |i| i.id.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn plain_is_one_id_per_line() {
        assert_eq!(render(OutputFormat::Plain), "a\nb");
    }

    #[test]
    fn compact_json_is_single_line() {
        assert_eq!(
            render(OutputFormat::JsonCompact),
            r#"[{"id":"a","count":1},{"id":"b","count":2}]"#
        );
    }

    #[test]
    fn table_uses_renamed_headers() {
        let table = render(OutputFormat::Table);
        assert!(table.contains("ID"));
        assert!(table.contains('b'));
    }

    #[test]
    fn disabled_painter_emits_no_escape_codes() {
        let painter = Painter::new(ColorMode::Never);
        assert_eq!(painter.status(SiteStatus::Offline), "offline");
        assert_eq!(painter.grade(HealthGrade::Degraded), "degraded");
    }

    #[test]
    fn forced_painter_wraps_in_ansi() {
        let painter = Painter::new(ColorMode::Always);
        let painted = painter.severity(Severity::Critical);
        assert!(painted.contains("\u{1b}["));
        assert!(painted.contains("critical"));
    }

    #[test]
    fn dash_for_missing_values() {
        assert_eq!(or_dash(None::<&str>), "-");
        assert_eq!(or_dash(Some("6.5")), "6.5");
    }
}
