//! Output dispatch: render format, markdown wrapping, file and console sinks

use crate::error::{ComposeDotError, Result};
use crate::graph::{Graph, GraphExporter};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Rendering format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Graphviz DOT
    #[default]
    Dot,
    /// JSON dump of the node/edge model
    Json,
}

impl OutputFormat {
    /// Info string of the fenced markdown block
    fn fence_tag(self) -> &'static str {
        match self {
            OutputFormat::Dot => "viz",
            OutputFormat::Json => "json",
        }
    }
}

/// Where and how the rendered graph is written. Built once from the
/// command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Write a markdown file next to the input (`<input>.md`)
    pub file_out: bool,
    /// Wrap console output in a fenced code block
    pub markdown: bool,
    /// Do not echo to the console
    pub quiet: bool,
    /// Rendering format
    pub format: OutputFormat,
}

impl OutputConfig {
    /// Render `graph` and write it to the configured sinks. Returns the path
    /// of the written file, if any.
    pub fn emit(
        &self,
        graph: &Graph,
        input: &Path,
        console: &mut dyn Write,
    ) -> Result<Option<PathBuf>> {
        let rendered = match self.format {
            OutputFormat::Dot => graph.to_dot(),
            OutputFormat::Json => {
                let mut json = graph.to_json()?;
                json.push('\n');
                json
            }
        };

        let written = if self.file_out {
            let path = derived_path(input);
            std::fs::write(&path, markdown_file(self.format, &rendered)).map_err(|source| {
                ComposeDotError::Output {
                    path: path.clone(),
                    source,
                }
            })?;
            tracing::info!("Wrote {}", path.display());
            Some(path)
        } else {
            None
        };

        if !self.quiet {
            let text = if self.markdown {
                markdown_console(self.format, &rendered)
            } else {
                rendered
            };
            console.write_all(text.as_bytes())?;
            console.flush()?;
        }

        Ok(written)
    }
}

/// Input path with its extension replaced by `.md`
pub fn derived_path(input: &Path) -> PathBuf {
    input.with_extension("md")
}

fn markdown_console(format: OutputFormat, rendered: &str) -> String {
    format!("\n\n```{}\n\n{}```\n\n", format.fence_tag(), rendered)
}

fn markdown_file(format: OutputFormat, rendered: &str) -> String {
    format!("\n```{}\n{}```\n", format.fence_tag(), rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ComposeParser;
    use crate::graph::GraphBuilder;
    use tempfile::tempdir;

    fn graph() -> Graph {
        let manifest = ComposeParser::parse_str("services:\n  web:\n    image: nginx\n").unwrap();
        GraphBuilder::new().build(&manifest)
    }

    #[test]
    fn test_derived_path() {
        assert_eq!(
            derived_path(Path::new("/srv/app/docker-compose.yml")),
            PathBuf::from("/srv/app/docker-compose.md")
        );
        assert_eq!(derived_path(Path::new("compose")), PathBuf::from("compose.md"));
    }

    #[test]
    fn test_plain_console_output() {
        let mut console: Vec<u8> = Vec::new();
        let written = OutputConfig::default()
            .emit(&graph(), Path::new("compose.yml"), &mut console)
            .unwrap();
        assert!(written.is_none());
        assert_eq!(String::from_utf8(console).unwrap(), graph().to_dot());
    }

    #[test]
    fn test_markdown_console_output() {
        let config = OutputConfig {
            markdown: true,
            ..Default::default()
        };
        let mut console: Vec<u8> = Vec::new();
        config.emit(&graph(), Path::new("compose.yml"), &mut console).unwrap();
        let text = String::from_utf8(console).unwrap();
        assert!(text.starts_with("\n\n```viz\n\ndigraph {\n"));
        assert!(text.ends_with("}\n```\n\n"));
    }

    #[test]
    fn test_quiet_suppresses_console() {
        let config = OutputConfig {
            quiet: true,
            markdown: true,
            ..Default::default()
        };
        let mut console: Vec<u8> = Vec::new();
        config.emit(&graph(), Path::new("compose.yml"), &mut console).unwrap();
        assert!(console.is_empty());
    }

    #[test]
    fn test_file_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("docker-compose.yml");
        let config = OutputConfig {
            file_out: true,
            quiet: true,
            ..Default::default()
        };

        let mut console: Vec<u8> = Vec::new();
        let written = config.emit(&graph(), &input, &mut console).unwrap();

        let path = dir.path().join("docker-compose.md");
        assert_eq!(written.as_deref(), Some(path.as_path()));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("\n```viz\n{}```\n", graph().to_dot()));
        assert!(console.is_empty());
    }

    #[test]
    fn test_unwritable_output_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("missing").join("compose.yml");
        let config = OutputConfig {
            file_out: true,
            ..Default::default()
        };
        let result = config.emit(&graph(), &input, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(ComposeDotError::Output { .. })));
    }

    #[test]
    fn test_json_markdown() {
        let config = OutputConfig {
            markdown: true,
            format: OutputFormat::Json,
            ..Default::default()
        };
        let mut console: Vec<u8> = Vec::new();
        config.emit(&graph(), Path::new("compose.yml"), &mut console).unwrap();
        let text = String::from_utf8(console).unwrap();
        assert!(text.starts_with("\n\n```json\n\n{"));
    }
}
