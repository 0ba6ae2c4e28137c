//! Errors reported by the CLI.
//!
//! [`CliError`] derives [`miette::Diagnostic`] so `main` can render every
//! failure through miette's graphical report handler.

use std::{io, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use trellis::{GraphError, LayoutError, TrellisError};

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(trellis::io))]
    Io(#[from] io::Error),

    #[error("Missing configuration file: {}", .0.display())]
    #[diagnostic(code(trellis::config))]
    MissingConfig(PathBuf),

    #[error("Failed to parse TOML configuration {}", .path.display())]
    #[diagnostic(
        code(trellis::config),
        help("every key is optional; see the `[layout]` sections in the README")
    )]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown layout `{0}`")]
    #[diagnostic(
        code(trellis::args),
        help("expected one of: force, node_link, radial, treemap, balloon, circle, random")
    )]
    UnknownLayout(String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(trellis::args))]
    InvalidArgument(String),

    #[error("Graph error: {0}")]
    #[diagnostic(code(trellis::graph))]
    Graph(#[from] GraphError),

    #[error("Layout error: {0}")]
    #[diagnostic(code(trellis::layout))]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    #[diagnostic(code(trellis::library))]
    Trellis(#[from] TrellisError),

    #[error("Failed to serialize layout snapshot: {0}")]
    #[diagnostic(code(trellis::output))]
    Snapshot(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use miette::Diagnostic;

    use super::*;

    #[test]
    fn test_codes_and_help() {
        let err = CliError::UnknownLayout("sugiyama".to_string());
        assert_eq!(err.to_string(), "Unknown layout `sugiyama`");
        assert_eq!(err.code().unwrap().to_string(), "trellis::args");
        assert!(err.help().unwrap().to_string().contains("node_link"));
    }

    #[test]
    fn test_layout_error_message() {
        let err = CliError::from(LayoutError::MissingRoot("radial"));
        assert_eq!(
            err.to_string(),
            "Layout error: layout `radial` requires a root node"
        );
        assert_eq!(err.code().unwrap().to_string(), "trellis::layout");
    }
}
