use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use rtdemo_render_wgpu::{TRACER_WGSL, module_source};
use rtdemo_scene::{Scene, SceneKind, io, shader_layout};
use rtdemo_uniforms::{UniformBlock, UniformLayout};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rtdemo-cli", about = "Inspect scenes and the tracer's uniform contract")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and uniform block summary
    Info,
    /// List the built-in scenes
    Presets,
    /// Print every uniform with its offset and type
    Uniforms {
        /// Also print the values this built-in scene writes
        #[arg(long, conflicts_with = "file")]
        scene: Option<SceneKind>,
        /// Also print the values this scene file writes
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the WGSL module the desktop app compiles
    Wgsl {
        /// Only print the generated uniform declarations
        #[arg(long)]
        prelude: bool,
    },
    /// Load and validate a scene file
    Validate { file: PathBuf },
    /// Write a built-in scene to a YAML or JSON file
    Export { kind: SceneKind, file: PathBuf },
}

/// One line per slot: offset, type, path, and the value when a scene is given.
///
/// Every slot is listed. Only slots the scene wrote carry a value, zero included.
fn uniform_report(layout: &UniformLayout, block: Option<&UniformBlock>) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, slot) in layout.slots() {
        let line = format!("{:>6}  {:<9}  {name}", slot.offset, slot.ty.to_string());
        match block
            .filter(|b| b.was_written(name))
            .and_then(|b| b.get(name))
        {
            Some(value) => lines.push(format!("{line} = {value}")),
            None => lines.push(line),
        }
    }
    lines
}

fn pick_scene(scene: Option<SceneKind>, file: Option<PathBuf>) -> anyhow::Result<Option<Scene>> {
    Ok(match (scene, file) {
        (Some(kind), _) => Some(kind.build()),
        (None, Some(path)) => Some(
            io::load(&path).with_context(|| format!("failed to load {}", path.display()))?,
        ),
        (None, None) => None,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let layout = shader_layout();
            println!("rtdemo-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "uniform block: {} ({} bytes, {} slots)",
                layout.root().name(),
                layout.size(),
                layout.len()
            );
            println!("presets: {}", SceneKind::ALL.len());
        }
        Commands::Presets => {
            for (i, kind) in SceneKind::ALL.into_iter().enumerate() {
                let scene = kind.build();
                println!(
                    "{}: {:<14} {} triangles, {} spheres, {} pentagons, {} materials",
                    i + 1,
                    kind.name(),
                    scene.triangles.len(),
                    scene.spheres.len(),
                    scene.pentagons.len(),
                    scene.materials.len()
                );
            }
        }
        Commands::Uniforms { scene, file } => {
            let layout = Arc::new(shader_layout());
            let block = pick_scene(scene, file)?.map(|scene| {
                let mut block = UniformBlock::new(layout.clone());
                scene.upload(&mut block);
                println!("# scene {}", scene.name);
                block
            });
            for line in uniform_report(&layout, block.as_ref()) {
                println!("{line}");
            }
            if let Some(block) = &block {
                let rejected: Vec<&str> = block.reported().collect();
                if !rejected.is_empty() {
                    bail!("scene wrote unknown uniforms: {}", rejected.join(", "));
                }
            }
        }
        Commands::Wgsl { prelude } => {
            let layout = shader_layout();
            if prelude {
                println!(
                    "{}",
                    layout.wgsl_declarations(
                        rtdemo_render_wgpu::UNIFORM_GROUP,
                        rtdemo_render_wgpu::UNIFORM_BINDING,
                        rtdemo_render_wgpu::UNIFORM_VAR,
                    )
                );
            } else {
                println!("{}", module_source(&layout, TRACER_WGSL));
            }
        }
        Commands::Validate { file } => {
            let scene =
                io::load(&file).with_context(|| format!("invalid scene {}", file.display()))?;
            println!(
                "{}: ok ({} triangles, {} spheres, {} pentagons, {} materials)",
                scene.name,
                scene.triangles.len(),
                scene.spheres.len(),
                scene.pentagons.len(),
                scene.materials.len()
            );
        }
        Commands::Export { kind, file } => {
            io::save(&kind.build(), &file)
                .with_context(|| format!("failed to export {kind} to {}", file.display()))?;
            println!("wrote {kind} to {}", file.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_report_lists_every_slot() {
        let layout = shader_layout();
        let lines = uniform_report(&layout, None);
        assert_eq!(lines.len(), layout.len());
        assert!(lines[0].trim_start().starts_with("0 "));
        assert!(lines.iter().any(|l| l.ends_with("uCamera.scale")));
    }

    #[test]
    fn value_report_keeps_zero_values_the_scene_wrote() {
        let layout = Arc::new(shader_layout());
        let mut block = UniformBlock::new(layout.clone());
        SceneKind::Room.build().upload(&mut block);
        let lines = uniform_report(&layout, Some(&block));
        assert_eq!(lines.len(), layout.len());
        assert!(lines.iter().any(|l| l.contains("triangles_used = 12")));
        assert!(lines.iter().any(|l| l.ends_with("triangles[4].MaterialId = 0")));
        assert!(lines.iter().any(|l| l.ends_with("materials[0].reflectionCoef = 0.0000")));
        let unused = lines.iter().find(|l| l.ends_with("pentagons[0].v1")).unwrap();
        assert!(!unused.contains(" = "));
    }

    #[test]
    fn scene_flag_wins_over_nothing() {
        assert!(pick_scene(None, None).unwrap().is_none());
        let scene = pick_scene(Some(SceneKind::Dodecahedron), None).unwrap().unwrap();
        assert_eq!(scene.pentagons.len(), 12);
    }

    #[test]
    fn exported_preset_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.json");
        io::save(&SceneKind::Room.build(), &path).unwrap();
        let scene = pick_scene(None, Some(path)).unwrap().unwrap();
        assert_eq!(scene, SceneKind::Room.build());
    }
}
