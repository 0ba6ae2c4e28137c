//! CLI logic for the Trellis layout harness.
//!
//! Generates a synthetic graph, runs the configured layout over it and
//! writes the resulting node placements as TOML.

pub mod generate;
pub mod snapshot;

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use std::fs;

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};

use trellis::{
    LayoutBuilder,
    config::AppConfig,
    geometry::Bounds,
    layout::{ForceLayout, LayoutContext, LayoutKind, RandomLayout},
    pipeline::{Action, ActionList, FisheyeTreeFilter},
};

use generate::Generated;
use snapshot::Snapshot;

/// Run the Trellis CLI application
///
/// This function generates the requested graph, lays it out and writes a
/// snapshot of every node's position and size to the output file.
///
/// # Errors
///
/// Returns `CliError` for:
/// - Invalid arguments or an unknown layout name
/// - Configuration loading errors
/// - Layout errors
/// - File I/O and serialization errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        shape:? = args.shape,
        node_count = args.nodes,
        output_path = args.output;
        "Processing graph"
    );

    validate(args)?;

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(name) = &args.layout {
        let kind: LayoutKind = name
            .parse()
            .map_err(|_| CliError::UnknownLayout(name.clone()))?;
        app_config.layout_mut().set_kind(kind);
    }
    let kind = app_config.layout().kind();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let Generated { mut graph, root } =
        generate::generate(args.shape, args.nodes, args.fanout, &mut rng)?;

    let bounds = Bounds::new(0.0, 0.0, args.width, args.height);
    let ctx = LayoutContext::new(bounds).with_root(root);

    let mut actions = build_actions(kind, args, &app_config);
    if kind == LayoutKind::Force {
        ForceLayout::place_on_grid(&mut graph, bounds);
    }
    debug!(actions:? = actions.names(); "Applying actions");
    actions.apply(&mut graph, &ctx)?;
    info!(layout:% = kind; "Layout calculated");

    let snapshot = Snapshot::capture(kind, bounds, &graph, root);
    fs::write(&args.output, toml::to_string(&snapshot)?)?;

    info!(output_file = args.output; "Snapshot exported successfully");

    Ok(())
}

fn validate(args: &Args) -> Result<(), CliError> {
    if args.nodes == 0 {
        return Err(CliError::InvalidArgument(
            "at least one node is required".to_string(),
        ));
    }
    if args.fanout == 0 {
        return Err(CliError::InvalidArgument(
            "fanout must be at least one".to_string(),
        ));
    }
    for (name, value) in [("width", args.width), ("height", args.height)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(CliError::InvalidArgument(format!(
                "{name} must be positive, got {value}"
            )));
        }
    }
    Ok(())
}

/// Optional fisheye filter followed by the selected engine.
///
/// The force layout runs in batch mode here: one call covers the whole
/// configured number of iterations.
fn build_actions(kind: LayoutKind, args: &Args, config: &AppConfig) -> ActionList {
    let mut actions = ActionList::new();
    if let Some(distance) = args.fisheye {
        actions.add(FisheyeTreeFilter::new(distance));
    }

    match (kind, args.seed) {
        (LayoutKind::Force, _) => {
            let force_config = config.layout().force();
            let mut force = ForceLayout::from_config(force_config);
            force.set_run_once(true, force_config.iterations());
            actions.add(force);
        }
        (LayoutKind::Random, Some(seed)) => {
            actions.add(RandomLayout::with_seed(seed));
        }
        (kind, _) => {
            actions.add(LayoutBuilder::new(config.clone()).build(kind));
        }
    }
    actions
}
