//! StempelWerk's main application entry point.
//! Parses the command line, loads the configuration and runs all templates.

use stempelwerk::{
    cli::{get_args, Args},
    config::Settings,
    error::{default_error_handler, Result},
    logger::init_logger,
    plugin::PluginRegistry,
    processor::Processor,
    renderer::MiniJinjaRenderer,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbosity());

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads the configuration and global variables
/// 2. Creates the template environment and applies plugins
/// 3. Processes all (or only modified) templates
fn run(args: Args) -> Result<()> {
    let verbosity = args.verbosity();
    if verbosity >= 0 {
        println!("StempelWerk v{}", env!("CARGO_PKG_VERSION"));
    }

    let settings = Settings::load(&args.config_file, args.globals.as_deref())?;
    let registry = PluginRegistry::builtin();
    let renderer = MiniJinjaRenderer::new(&settings, &registry)?;

    let processor = Processor::new(&settings, &renderer);
    let stats = processor.process_templates(args.only_modified, None)?;

    if stats.processed_templates > 0 {
        if verbosity < 0 {
            println!(
                "{} => {} in {:.3?}",
                stats.processed_templates, stats.saved_files, stats.elapsed
            );
        } else {
            println!("{stats}");
        }
    }
    Ok(())
}
