//! Output formatting.

use crate::cli::OutputFormat;
use camino::{Utf8Path, Utf8PathBuf};
use proptypes::ProgramDocument;
use serde::Serialize;

/// What happened to one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FileStatus {
    /// Declarations generated and printed.
    Generated,
    /// Declarations injected and the result printed.
    Injected,
    /// Result written to `target`.
    Written,
    /// Nothing to inject into.
    Skipped,
    Failed,
}

/// The result of processing one source file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub source: Utf8PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Utf8PathBuf>,
    /// Names of the components found in `source`.
    pub components: Vec<String>,
    pub status: FileStatus,
    /// Generated or injected text when not written to disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Failure or skip reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileReport {
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = FileStatus::Failed;
        self.output = None;
        self.message = Some(message.into());
    }
}

/// Summary of a run.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Number of files with at least one component.
    pub file_count: usize,
    pub component_count: usize,
    pub failed_count: usize,
}

impl RunSummary {
    /// Formats the summary line.
    pub fn format(&self) -> String {
        let file_word = if self.file_count == 1 { "file" } else { "files" };
        let component_word = if self.component_count == 1 {
            "component"
        } else {
            "components"
        };
        format!(
            "ts-proptypes processed {} {} in {} {} ({} failed)",
            self.component_count, component_word, self.file_count, file_word, self.failed_count
        )
    }
}

#[derive(Serialize)]
struct JsonRun<'a> {
    files: &'a [FileReport],
    summary: &'a RunSummary,
}

/// Formats run results for stdout.
pub struct Formatter<'a> {
    format: OutputFormat,
    workspace: &'a Utf8Path,
}

impl<'a> Formatter<'a> {
    pub fn new(format: OutputFormat, workspace: &'a Utf8Path) -> Self {
        Self { format, workspace }
    }

    /// The extracted document; JSON in both formats.
    pub fn document(&self, document: &ProgramDocument) -> String {
        serde_json::to_string_pretty(document).unwrap_or_default()
    }

    pub fn reports(&self, reports: &[FileReport], summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(reports),
            OutputFormat::Json => {
                let run = JsonRun {
                    files: reports,
                    summary,
                };
                let mut json = serde_json::to_string_pretty(&run).unwrap_or_default();
                json.push('\n');
                json
            }
        }
    }

    fn relative<'p>(&self, path: &'p Utf8Path) -> &'p Utf8Path {
        path.strip_prefix(self.workspace).unwrap_or(path)
    }

    /// Generated text under a `// path` header, status lines for the rest.
    fn format_human(&self, reports: &[FileReport]) -> String {
        let mut output = String::new();
        for report in reports {
            let source = self.relative(&report.source);
            match report.status {
                FileStatus::Generated | FileStatus::Injected => {
                    let shown = report.target.as_deref().map_or(source, |t| self.relative(t));
                    output.push_str(&format!("// {shown}\n"));
                    output.push_str(report.output.as_deref().unwrap_or_default());
                    output.push('\n');
                }
                FileStatus::Written => {
                    let target = report.target.as_deref().map_or(source, |t| self.relative(t));
                    output.push_str(&format!(
                        "{source} -> {target}: {} component(s)\n",
                        report.components.len()
                    ));
                }
                FileStatus::Skipped => output.push_str(&format!(
                    "{source}: skipped: {}\n",
                    report.message.as_deref().unwrap_or_default()
                )),
                FileStatus::Failed => output.push_str(&format!(
                    "{source}: error: {}\n",
                    report.message.as_deref().unwrap_or_default()
                )),
            }
        }
        output
    }
}
