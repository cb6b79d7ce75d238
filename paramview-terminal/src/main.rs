//! paramview terminal viewer
//!
//! Controls:
//!   - Mouse drag: orbit, Shift/right drag: pan, wheel: zoom
//!   - Tab / Shift+Tab: select a parameter, [ / ]: step it, Backspace: reset
//!   - Editor: arrows move/turn the model, + / - scale it, N loads the next file
//!   - W / F / P: toggle wireframe, faces, panel
//!   - Q / ESC: quit

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use paramview_core::{GeometryFactory, ParameterPanel, ShapeRegistry, ViewerConfig};
use paramview_terminal::TerminalApp;
use tracing::Level;

#[derive(Parser)]
#[command(name = "paramview-terminal", version, about = "Parametric shapes in the terminal")]
struct Cli {
    /// JSON viewer configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs here (the terminal itself is taken by the renderer)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a parametric shape with a live parameter panel
    Shape {
        /// Shape kind (see `list`)
        #[arg(default_value = "box")]
        kind: String,

        /// Initial parameter value, e.g. `--param width=2`
        #[arg(long = "param", short = 'p', value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Load STL files and move them around
    Edit {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print every shape kind and its parameters
    List,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("missing parameter name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(Level::DEBUG)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>, preset: fn() -> ViewerConfig) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(preset()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let registry = ShapeRegistry::builtin();
    let mut app = match cli.command {
        Command::List => {
            for kind in registry.kinds() {
                let factory = registry.get(kind)?;
                let panel = ParameterPanel::new(factory.schema())?;
                println!("{kind}");
                for control in panel.controls() {
                    println!("    {:<16} {}", control.name, control.display_value());
                }
            }
            return Ok(());
        }
        Command::Shape { kind, params } => {
            let factory = match registry.get(&kind) {
                Ok(factory) => factory,
                Err(err) => {
                    let known: Vec<_> = registry.kinds().collect();
                    bail!("{err} (known: {})", known.join(", "));
                }
            };
            let config = load_config(cli.config.as_deref(), ViewerConfig::geometry_demo)?;
            TerminalApp::shape(factory, config, &params)?
        }
        Command::Edit { files } => {
            let config = load_config(cli.config.as_deref(), ViewerConfig::model_editor)?;
            TerminalApp::editor(files, config)?
        }
    };

    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("width=2.5"),
            Ok(("width".to_string(), "2.5".to_string()))
        );
        assert_eq!(
            parse_key_val("text=a=b"),
            Ok(("text".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_val("width").is_err());
        assert!(parse_key_val("=1").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["paramview-terminal", "shape", "torus", "-p", "tube=0.2"]);
        match cli.command {
            Command::Shape { kind, params } => {
                assert_eq!(kind, "torus");
                assert_eq!(params, vec![("tube".to_string(), "0.2".to_string())]);
            }
            _ => panic!("expected shape"),
        }

        let cli = Cli::parse_from([
            "paramview-terminal",
            "edit",
            "a.stl",
            "--log-file",
            "/tmp/pv.log",
        ]);
        assert!(matches!(cli.command, Command::Edit { ref files } if files.len() == 1));
        assert!(cli.log_file.is_some());
    }
}
