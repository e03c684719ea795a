//! xplane-obj7 CLI
//!
//! Export JSON scene descriptions to X-Plane OBJ7 files.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use xplane_obj7::report::Level;
use xplane_obj7::scene::ObjectKind;
use xplane_obj7::{ExportConfig, ExportError, FsTextureSource, Obj7Exporter, Platform, Scene};

#[derive(Parser)]
#[command(name = "xplane-obj7")]
#[command(author, version, about = "Export scenes to X-Plane OBJ7 objects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene to an OBJ7 file
    Export {
        /// Scene description (JSON)
        #[arg(short, long)]
        scene: PathBuf,

        /// Output .obj file. Names ending in _cockpit.obj are cockpit objects.
        #[arg(short, long)]
        output: PathBuf,

        /// Exporter settings (JSON); command-line flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write a multiplayer CSL object
        #[arg(long)]
        csl: bool,

        /// Write every face on its own, in scene order
        #[arg(long)]
        no_strips: bool,

        /// Distance under which vertices are merged
        #[arg(long)]
        tolerance: Option<f64>,

        /// Platform marker on the first line
        #[arg(long, value_enum)]
        platform: Option<PlatformArg>,
    },

    /// Show information about a scene
    Info {
        /// Scene description (JSON)
        #[arg(short, long)]
        scene: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PlatformArg {
    /// Windows and Linux
    Ibm,
    /// Mac
    Apple,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ibm => Platform::Ibm,
            PlatformArg::Apple => Platform::Apple,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            scene,
            output,
            config,
            csl,
            no_strips,
            tolerance,
            platform,
        } => {
            let options = ExportOptions {
                config,
                csl,
                no_strips,
                tolerance,
                platform,
            };
            export_scene(&scene, &output, options)
        }
        Commands::Info { scene } => show_scene_info(&scene),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            for object in e.objects() {
                if object.faces.is_empty() {
                    eprintln!("  in \"{}\"", object.name);
                } else {
                    eprintln!("  in \"{}\", faces {:?}", object.name, object.faces);
                }
            }
            ExitCode::FAILURE
        }
    }
}

struct ExportOptions {
    config: Option<PathBuf>,
    csl: bool,
    no_strips: bool,
    tolerance: Option<f64>,
    platform: Option<PlatformArg>,
}

fn load_config(options: &ExportOptions, scene_path: &Path, output: &Path) -> Result<ExportConfig, ExportError> {
    let mut config = match &options.config {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            let mut config: ExportConfig = serde_json::from_str(&json)?;
            config.output_path = output.to_path_buf();
            config.cockpit = config.cockpit || xplane_obj7::config::is_cockpit_filename(output);
            config
        }
        None => ExportConfig::for_output(output),
    };

    if config.scene_dir.as_os_str().is_empty() {
        let dir = scene_path.parent().unwrap_or_else(|| Path::new("."));
        config = config.with_scene_dir(dir);
    }
    if options.csl {
        config = config.with_csl();
    }
    if options.no_strips {
        config = config.with_optimise(false);
    }
    if let Some(tolerance) = options.tolerance {
        config = config.with_vertex_tolerance(tolerance);
    }
    if let Some(platform) = options.platform {
        config = config.with_platform(platform.into());
    }
    Ok(config)
}

fn export_scene(scene_path: &Path, output_path: &Path, options: ExportOptions) -> Result<(), ExportError> {
    println!("Loading scene from {:?}...", scene_path);
    let scene = Scene::load(scene_path)?;
    println!("  Found {} objects", scene.objects.len());

    let config = load_config(&options, scene_path, output_path)?;
    println!("Exporting with config:");
    println!("  - Variant: {:?}", config.variant);
    println!("  - Cockpit: {}", config.cockpit);
    println!("  - Strips: {}", config.optimise);
    println!("  - Vertex tolerance: {}", config.vertex_tolerance);

    let exporter = Obj7Exporter::new(config)?;
    let output = exporter.export(&scene, &FsTextureSource::new())?;
    output.write_to(output_path)?;

    println!(
        "Exported {} primitives to {:?}",
        output.primitives, output_path
    );
    for entry in output.log.entries() {
        let level = match entry.level {
            Level::Info => "Info",
            Level::Warn => "Warn",
        };
        println!("  {}: {}", level, entry.message);
    }

    Ok(())
}

fn show_scene_info(scene_path: &Path) -> Result<(), ExportError> {
    println!("Loading scene from {:?}...", scene_path);
    let scene = Scene::load(scene_path)?;

    let (mut meshes, mut lamps, mut empties, mut faces) = (0, 0, 0, 0);
    for object in &scene.objects {
        match &object.kind {
            ObjectKind::Mesh(mesh) => {
                meshes += 1;
                faces += mesh.faces.len();
            }
            ObjectKind::Lamp(_) => lamps += 1,
            ObjectKind::Empty(_) => empties += 1,
        }
    }

    println!("\nScene Info:");
    println!("  Meshes: {} ({} faces)", meshes, faces);
    println!("  Lamps: {}", lamps);
    println!("  Empties: {}", empties);
    println!("  Images: {}", scene.images.len());
    if let Some(panel) = &scene.panel {
        println!(
            "  Panel: {} ({}x{}, {} regions)",
            panel.image,
            panel.size[0],
            panel.size[1],
            panel.regions.len()
        );
    }

    Ok(())
}
