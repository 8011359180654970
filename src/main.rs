use clap::{Parser, Subcommand};
use readme_gallery::pipeline::{self, Project};
use readme_gallery::scan::Rename;
use readme_gallery::timestamps::FsTimestamps;
use readme_gallery::{config, output};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "readme-gallery")]
#[command(about = "Regenerate a README image gallery grouped by year")]
#[command(long_about = "\
Regenerate a README image gallery grouped by year

Images whose name starts with YYYY-MM are grouped under that year. Other
images are dated from filesystem metadata and renamed to YYYY-MM.<ext>
(or YYYY-MM_N.<ext> on collision).

The README must contain:

  <!-- BEGIN IMAGES -->
  ...generated previews go here...
  <!-- END IMAGES -->

  Total: <!-- BEGIN COUNT -->`0`<!-- END COUNT -->

Each year also gets a side document, images_<year>.md, next to the README.

Run 'readme-gallery gen-config' to generate a documented readme-gallery.toml.")]
#[command(version)]
struct Cli {
    /// Project root containing the README and the images directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to <root>/readme-gallery.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rename undated images and regenerate the README and side documents
    Build,
    /// Validate the project and show what a build would change
    Check,
    /// Rename undated images and print the year groups
    Scan {
        /// Print the grouping as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock readme-gallery.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {}", error_chain(&*err));
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Command::Build => {
            let (project, timestamps) = load_project(cli)?;
            let report = pipeline::build(&project, &timestamps, &mut output::print_rename)?;
            output::print_image_set(&report.images, project.config.group_order);
            println!();
            output::print_build_output(&report, &project.root);
        }
        Command::Check => {
            let (project, timestamps) = load_project(cli)?;
            let report = pipeline::check(&project, &timestamps)?;
            output::print_check_output(&report, project.config.group_order);
        }
        Command::Scan { json: true } => {
            let (project, timestamps) = load_project(cli)?;
            let images = pipeline::scan_only(&project, &timestamps, &mut |_: &Rename| {})?;
            println!("{}", serde_json::to_string_pretty(&images)?);
        }
        Command::Scan { json: false } => {
            let (project, timestamps) = load_project(cli)?;
            let images = pipeline::scan_only(&project, &timestamps, &mut output::print_rename)?;
            output::print_image_set(&images, project.config.group_order);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Display an error followed by each underlying cause not already in its
/// message.
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Resolve the project and the timestamp source its config asks for.
fn load_project(cli: &Cli) -> Result<(Project, FsTimestamps), pipeline::RunError> {
    let project = Project::load(&cli.root, cli.config.as_deref())?;
    let timestamps = FsTimestamps::new(project.config.timestamp_source);
    Ok((project, timestamps))
}
