//! # Sixdof CLI
//!
//! `lvlinfo`: load a level and inspect it from the command line.
//!
//! ## Commands
//! - `info` - Room, portal and triangle counts
//! - `room-at` - Room containing a point
//! - `ray` - First wall hit by a movement ray
//! - `visible` - Rooms seen from a point looking down -Z

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::{Mat4, Vec3};
use sixdof_core::Frustum;
use sixdof_level::{Level, Visibility};

/// Sixdof level inspector
#[derive(Parser)]
#[command(name = "lvlinfo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Level description file
    pub level: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Print level statistics
    Info,

    /// Find the room containing a point
    #[command(allow_negative_numbers = true)]
    RoomAt { x: f32, y: f32, z: f32 },

    /// Cast a movement ray from a point
    #[command(allow_negative_numbers = true)]
    Ray {
        x: f32,
        y: f32,
        z: f32,
        dx: f32,
        dy: f32,
        dz: f32,
    },

    /// List the rooms visible from a point
    #[command(allow_negative_numbers = true)]
    Visible { x: f32, y: f32, z: f32 },
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&cli)))
        .init();

    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())
}

/// Default log filter, overridden by `RUST_LOG`
pub fn log_filter(cli: &Cli) -> &'static str {
    if cli.verbose { "debug" } else { "info" }
}

/// Load the level named by `cli` and write the command's report to `out`
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let level = Level::load(&cli.level)
        .with_context(|| format!("loading {}", cli.level.display()))?;
    report(&level, &cli.command, out)
}

/// Write the report for one command
pub fn report(level: &Level, command: &Commands, out: &mut impl Write) -> Result<()> {
    log::debug!("running {:?}", command);
    match *command {
        Commands::Info => info(level, out)?,

        Commands::RoomAt { x, y, z } => match level.room_at(Vec3::new(x, y, z)) {
            Some(id) => writeln!(out, "room {} ({})", id.0, room_name(level, id.0))?,
            None => writeln!(out, "no room")?,
        },

        Commands::Ray { x, y, z, dx, dy, dz } => {
            match level.check_collision(None, Vec3::new(x, y, z), Vec3::new(dx, dy, dz)) {
                Some(hit) => writeln!(
                    out,
                    "hit room {} ({}) t={:.4} pos=({:.3}, {:.3}, {:.3}) normal=({:.3}, {:.3}, {:.3}) depth={:.4}",
                    hit.room.0,
                    room_name(level, hit.room.0),
                    hit.t,
                    hit.pos.x,
                    hit.pos.y,
                    hit.pos.z,
                    hit.normal.x,
                    hit.normal.y,
                    hit.normal.z,
                    hit.depth
                )?,
                None => writeln!(out, "no hit")?,
            }
        }

        Commands::Visible { x, y, z } => {
            let eye = Vec3::new(x, y, z);
            let room = level
                .room_at(eye)
                .with_context(|| format!("({x}, {y}, {z}) is not inside any room"))?;

            let far = level.max_dist().max(1.0) * 2.0;
            let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, far);
            let view = Mat4::look_at_rh(eye, eye + Vec3::NEG_Z, Vec3::Y);
            let frustum = Frustum::from_matrix(proj * view);

            let mut vis = Visibility::new(level);
            vis.update(level, room, &frustum, eye);
            for id in vis.visible_rooms() {
                writeln!(out, "{} {}", id.0, room_name(level, id.0))?;
            }
        }
    }
    Ok(())
}

fn room_name(level: &Level, index: usize) -> &str {
    level.rooms().get(index).map_or("?", |r| r.name.as_str())
}

fn info(level: &Level, out: &mut impl Write) -> Result<()> {
    let bounds = level.bounds();
    writeln!(out, "rooms: {}", level.rooms().len())?;
    for (i, room) in level.rooms().iter().enumerate() {
        let stats = room.octree.stats();
        let unlinked = room.portals.iter().filter(|p| !p.is_linked()).count();
        writeln!(
            out,
            "  {i} {}: {} meshes, {} triangles, {} portals ({} unlinked), {} objects, {} enemies",
            room.name,
            room.meshes.len(),
            stats.triangles,
            room.portals.len(),
            unlinked,
            room.objects.len(),
            room.enemies.len()
        )?;
    }

    let unlinked: Vec<_> = level.portals().filter(|(_, p)| !p.is_linked()).collect();
    writeln!(out, "portals: {} ({} unlinked)", level.portals().count(), unlinked.len())?;
    for (id, portal) in unlinked {
        writeln!(out, "  unlinked: {} in {}", portal.name, room_name(level, id.room.0))?;
    }
    writeln!(out, "triangles: {}", level.triangle_count())?;
    writeln!(out, "actions: {}", level.actions().len())?;
    writeln!(out, "textures: {}", level.textures().len())?;
    writeln!(out, "enemies: {}", level.enemies().len())?;
    writeln!(
        out,
        "bounds: ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "meshes": [
            { "name": "floor", "vertices": [[0,0,0],[0,0,10],[10,0,10],[10,0,0]], "indices": [0,1,2,0,2,3] },
            { "name": "door", "vertices": [[5,0,10],[5,4,10],[6,4,10]] }
        ],
        "nodes": [
            { "name": "hall" },
            { "name": "floor", "parent": 0, "mesh": 0 },
            { "name": "ceiling", "parent": 0, "mesh": 0, "position": [0, 4, 0] },
            { "name": "portal_out", "parent": 0, "mesh": 1 }
        ]
    }"#;

    fn write_level() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.json"), SCENE).unwrap();
        std::fs::write(dir.path().join("level.json"), r#"{ "scene": "scene.json" }"#).unwrap();
        dir
    }

    fn run_to_string(args: &[&str]) -> String {
        let cli = Cli::parse_from(args);
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cli_parse() {
        let cli = Cli::parse_from([
            "lvlinfo", "-v", "level.json", "ray", "1", "-2.5", "3", "0", "-10", "0",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.level, PathBuf::from("level.json"));
        assert_eq!(
            cli.command,
            Commands::Ray {
                x: 1.0,
                y: -2.5,
                z: 3.0,
                dx: 0.0,
                dy: -10.0,
                dz: 0.0
            }
        );
    }

    #[test]
    fn test_log_filter_follows_verbose() {
        let quiet = Cli::parse_from(["lvlinfo", "level.json", "info"]);
        assert_eq!(log_filter(&quiet), "info");
        let verbose = Cli::parse_from(["lvlinfo", "--verbose", "level.json", "info"]);
        assert_eq!(log_filter(&verbose), "debug");
    }

    #[test]
    fn test_info() {
        let dir = write_level();
        let level = dir.path().join("level.json");
        let text = run_to_string(&["lvlinfo", level.to_str().unwrap(), "info"]);
        assert!(text.contains("rooms: 1"));
        assert!(text.contains("0 hall: 2 meshes, 4 triangles, 1 portals (1 unlinked)"));
        assert!(text.contains("unlinked: portal_out in hall"));
    }

    #[test]
    fn test_ray() {
        let dir = write_level();
        let level = dir.path().join("level.json");
        let level = level.to_str().unwrap();
        let text = run_to_string(&["lvlinfo", level, "ray", "2", "1", "3", "0", "-2", "0"]);
        assert!(text.starts_with("hit room 0 (hall) t=0.5000 pos=(2.000, 0.000, 3.000)"), "{text}");

        let text = run_to_string(&["lvlinfo", level, "ray", "2", "1", "3", "0", "0.5", "0"]);
        assert_eq!(text, "no hit\n");

        let text = run_to_string(&["lvlinfo", level, "room-at", "2", "1", "3"]);
        assert_eq!(text, "room 0 (hall)\n");
    }

    #[test]
    fn test_missing_level() {
        let cli = Cli::parse_from(["lvlinfo", "/nonexistent/level.json", "info"]);
        let mut out = Vec::new();
        let err = run(&cli, &mut out).unwrap_err();
        assert!(err.to_string().contains("loading"));
    }
}
