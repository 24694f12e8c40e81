//! Headless demo of the scenegraph2d engine.
//!
//! Builds a small scene (a ship with an exhaust emitter flying through a
//! trigger gate past a spinning square), runs it for a number of frames
//! through the [`SceneManager`] with a recording renderer and reports what
//! happened.

use std::any::Any;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use scenegraph2d::components::collider::Collider;
use scenegraph2d::components::color::Color;
use scenegraph2d::components::component::Component;
use scenegraph2d::components::particle::{EmitterType, ParticleComponent};
use scenegraph2d::components::physics::PhysicsComponent;
use scenegraph2d::components::rigidbody::RigidBody;
use scenegraph2d::components::shape::{ShapeComponent, ShapeType};
use scenegraph2d::error::{EngineError, Result};
use scenegraph2d::math::Vec2;
use scenegraph2d::resources::camera::Camera;
use scenegraph2d::resources::engineconfig::EngineConfig;
use scenegraph2d::scene::{EntityBehavior, EntityId, Scene, SceneLogic, SceneManager};
use scenegraph2d::systems::render::RecordingRenderer;

#[derive(Parser)]
#[command(version, about = "Headless scenegraph2d demo", long_about = None)]
struct Cli {
    /// INI configuration file (defaults are used when it is missing)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of frames to simulate (overrides [demo] frames)
    #[arg(long, value_name = "N")]
    frames: Option<u32>,

    /// Frame delta in seconds (overrides [demo] delta)
    #[arg(long, value_name = "SECONDS")]
    delta: Option<f32>,

    /// Write the final entity snapshot as JSON
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,
}

/// Counts gate crossings.
#[derive(Default)]
struct Ship {
    triggers: u32,
}

impl EntityBehavior for Ship {
    fn on_trigger(&mut self, scene: &mut Scene, me: EntityId, other: Option<EntityId>) -> Result<()> {
        self.triggers += 1;
        let other = match other {
            Some(id) => scene.tag(id)?.to_string(),
            None => "<unowned>".to_string(),
        };
        info!("'{}' passed through '{}'", scene.tag(me)?, other);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Rotates its entity at a fixed rate.
struct Spinner {
    degrees_per_second: f32,
}

impl EntityBehavior for Spinner {
    fn update(&mut self, scene: &mut Scene, me: EntityId, delta: f32) -> Result<()> {
        let t = scene.transform_mut(me)?;
        let rotation = t.local_rotation() + self.degrees_per_second * delta;
        t.set_local_rotation(rotation);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct DemoScene;

impl SceneLogic for DemoScene {
    fn start_up(&mut self, scene: &mut Scene) -> Result<()> {
        let ship = scene.create_entity_with("ship", Ship::default());
        scene.transform_mut(ship)?.set_local_position(Vec2::new(-6.0, 0.0));
        let mut hull = ShapeComponent::primitive(ShapeType::Triangle, 1.0);
        hull.set_fill_color(Some(Color::from_hex("#3cb4ff")?));
        scene.add_component(ship, Component::shape(hull))?;

        let mut body = RigidBody::new()
            .with_collider(Collider::cuboid(Vec2::splat(0.5)))
            .with_drag(0.0, 0.0);
        body.set_velocity(Vec2::new(3.0, 0.0));
        scene.add_component(ship, Component::physics(PhysicsComponent::with_body(body)))?;

        let exhaust = scene.create_entity("exhaust");
        scene.add_child(ship, exhaust)?;
        scene.transform_mut(exhaust)?.set_local_position(Vec2::new(-0.6, 0.0));
        let mut particles = ParticleComponent::with_seed(7);
        particles.set_emitter_type(EmitterType::Direction);
        particles.set_direction(Vec2::new(-1.0, 0.0));
        particles.set_emit_rate(40.0);
        particles.set_max_life(0.8);
        particles.set_sizes(0.2, 0.0);
        particles.set_colors(Color::from_hex("#ffb000")?, Color::TRANSPARENT);
        particles.start();
        scene.add_component(exhaust, Component::particles(particles))?;

        let gate = scene.create_entity("gate");
        let sensor = RigidBody::new().with_collider(Collider::cuboid(Vec2::new(0.25, 2.0)).with_trigger(true));
        scene.add_component(gate, Component::physics(PhysicsComponent::with_body(sensor)))?;

        let spinner = scene.create_entity_with(
            "spinner",
            Spinner {
                degrees_per_second: 90.0,
            },
        );
        scene.transform_mut(spinner)?.set_local_position(Vec2::new(0.0, 3.0));
        let mut square = ShapeComponent::primitive(ShapeType::Square, 1.5);
        square.set_border_color(Some(Color::WHITE));
        scene.add_component(spinner, Component::shape(square))?;
        Ok(())
    }
}

fn load_config(path: Option<PathBuf>) -> EngineConfig {
    let mut config = match path {
        Some(path) => EngineConfig::with_path(path),
        None => EngineConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        warn!("{e}; using defaults");
    }
    config
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config);
    if let Some(frames) = cli.frames {
        config.demo_frames = frames;
    }
    if let Some(delta) = cli.delta {
        config.demo_delta = delta;
    }
    let (frames, delta) = (config.demo_frames, config.demo_delta);
    let (width, height) = config.view_size();

    let camera = Camera::from_config(&config)?;
    let mut manager: SceneManager = SceneManager::with_config(config);
    manager.set_renderer(RecordingRenderer::new(width, height));
    manager.set_camera(camera);
    manager.add_scene(Some("demo"), DemoScene)?;
    manager.set_active_scene("demo")?;

    let mut draws = 0usize;
    for _ in 0..frames {
        manager.update(delta)?;
        draws += manager.last_draw_count();
    }

    let Some(scene) = manager.active_scene() else {
        return Ok(());
    };
    let stats = scene.physics().stats();
    info!(
        "{} frames in {:.2}s simulated: {} component draws, {} physics steps, {} triggers, {} contacts",
        manager.time().frame,
        manager.time().elapsed,
        draws,
        stats.steps,
        stats.triggers,
        stats.contacts
    );
    if let Some(ship) = scene.find_with_tag("ship") {
        let crossings = scene.behavior::<Ship>(ship).map_or(0, |s| s.triggers);
        info!(
            "ship at {:?}, {} gate crossing event(s)",
            scene.transform(ship)?.position(),
            crossings
        );
    }

    if let Some(path) = cli.dump {
        let json = serde_json::to_string_pretty(&scene.snapshot())
            .map_err(|e| EngineError::Config(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| {
            EngineError::Config(format!("failed to write {:?}: {}", path, e))
        })?;
        info!("snapshot written to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
