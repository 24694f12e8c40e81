//! Scene registry and frame driver.
//!
//! A [`SceneManager`] holds named [`SceneLogic`] implementations, the active
//! [`Scene`], the bound renderer and camera, and the [`WorldTime`] clock.
//!
//! Activating a scene disposes the current one, builds a fresh [`Scene`]
//! with a physics registry configured from [`EngineConfig`], runs the
//! logic's `start_up` on it, refreshes its transforms and fires the
//! scene-change callback.
//!
//! [`SceneManager::update`] then runs one frame:
//!
//! 1. advance [`WorldTime`] (time scale applied),
//! 2. scene logic `update`,
//! 3. [`Scene::update`],
//! 4. `begin_frame` on the renderer and [`Scene::draw`] with the camera.

use log::info;
use rustc_hash::FxHashMap;

use crate::error::{EngineError, Result};
use crate::resources::camera::{Camera, ViewProvider};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::physics::Physics;
use crate::resources::worldtime::WorldTime;
use crate::scene::Scene;
use crate::systems::render::{RecordingRenderer, Renderer};

/// Game logic of one registered scene.
pub trait SceneLogic {
    /// Populate a freshly created scene.
    fn start_up(&mut self, scene: &mut Scene) -> Result<()>;

    /// Per-frame logic, before the scene's own update.
    fn update(&mut self, _scene: &mut Scene, _delta: f32) -> Result<()> {
        Ok(())
    }
}

/// How to pick a registered scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRef<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for SceneRef<'a> {
    fn from(name: &'a str) -> Self {
        SceneRef::Name(name)
    }
}

impl From<usize> for SceneRef<'_> {
    fn from(index: usize) -> Self {
        SceneRef::Index(index)
    }
}

type SceneChangeCallback = Box<dyn FnMut(&mut Scene, usize, &str)>;

struct SceneEntry {
    name: String,
    logic: Box<dyn SceneLogic>,
}

pub struct SceneManager<R: Renderer = RecordingRenderer, V: ViewProvider = Camera> {
    scenes: Vec<SceneEntry>,
    names: FxHashMap<String, usize>,
    active: Option<usize>,
    scene: Option<Scene>,
    renderer: Option<R>,
    camera: Option<V>,
    config: EngineConfig,
    time: WorldTime,
    on_scene_change: Option<SceneChangeCallback>,
    last_draw_count: usize,
}

impl<R: Renderer, V: ViewProvider> Default for SceneManager<R, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Renderer, V: ViewProvider> SceneManager<R, V> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    /// Scenes activated later get physics settings from `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            scenes: Vec::new(),
            names: FxHashMap::default(),
            active: None,
            scene: None,
            renderer: None,
            camera: None,
            config,
            time: WorldTime::default(),
            on_scene_change: None,
            last_draw_count: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== REGISTRY ====================

    /// Register `logic` under `name`, or under its index when `None`.
    /// Returns the index.
    pub fn add_scene(&mut self, name: Option<&str>, logic: impl SceneLogic + 'static) -> Result<usize> {
        let index = self.scenes.len();
        let name = name.map_or_else(|| index.to_string(), str::to_string);
        if self.names.contains_key(&name) {
            return Err(EngineError::DuplicateScene(name));
        }
        self.names.insert(name.clone(), index);
        self.scenes.push(SceneEntry {
            name,
            logic: Box::new(logic),
        });
        Ok(index)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.iter().map(|s| s.name.as_str())
    }

    fn resolve(&self, which: SceneRef<'_>) -> Result<usize> {
        if self.scenes.is_empty() {
            return Err(EngineError::NoScenesRegistered);
        }
        match which {
            SceneRef::Name(name) => self
                .names
                .get(name)
                .copied()
                .ok_or_else(|| EngineError::SceneNotFound(name.to_string())),
            SceneRef::Index(index) if index < self.scenes.len() => Ok(index),
            SceneRef::Index(index) => Err(EngineError::SceneIndexOutOfRange {
                index,
                len: self.scenes.len(),
            }),
        }
    }

    /// Dispose the active scene and start `which` on a fresh one.
    pub fn set_active_scene<'a>(&mut self, which: impl Into<SceneRef<'a>>) -> Result<()> {
        let index = self.resolve(which.into())?;

        if let Some(mut old) = self.scene.take() {
            old.dispose()?;
            if let Some(previous) = self.active.and_then(|i| self.scenes.get(i)) {
                info!("scene '{}' disposed", previous.name);
            }
        }
        self.active = None;

        let mut scene = Scene::with_physics(Physics::from_config(&self.config));
        let entry = &mut self.scenes[index];
        entry.logic.start_up(&mut scene)?;
        scene.refresh_transforms();
        info!("scene '{}' activated ({} entities)", entry.name, scene.entity_count());

        if let Some(callback) = self.on_scene_change.as_mut() {
            callback(&mut scene, index, &entry.name);
        }
        self.active = Some(index);
        self.scene = Some(scene);
        Ok(())
    }

    /// Called with `(scene, index, name)` after each activation.
    pub fn set_scene_change_callback(&mut self, callback: impl FnMut(&mut Scene, usize, &str) + 'static) {
        self.on_scene_change = Some(Box::new(callback));
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active
            .and_then(|i| self.scenes.get(i))
            .map(|s| s.name.as_str())
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    // ==================== BINDINGS ====================

    pub fn set_renderer(&mut self, renderer: R) {
        self.renderer = Some(renderer);
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut R> {
        self.renderer.as_mut()
    }

    pub fn set_camera(&mut self, camera: V) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&V> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut V> {
        self.camera.as_mut()
    }

    pub fn time(&self) -> &WorldTime {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut WorldTime {
        &mut self.time
    }

    /// Component draws of the last frame.
    pub fn last_draw_count(&self) -> usize {
        self.last_draw_count
    }

    // ==================== FRAME ====================

    /// Run one frame of the active scene with an unscaled `delta`.
    pub fn update(&mut self, delta: f32) -> Result<()> {
        let (Some(index), Some(scene)) = (self.active, self.scene.as_mut()) else {
            return Err(EngineError::NoActiveScene);
        };
        let renderer = self.renderer.as_mut().ok_or(EngineError::NoRenderer)?;
        let camera = self.camera.as_ref().ok_or(EngineError::NoCamera)?;

        let dt = self.time.advance(delta);
        self.scenes[index].logic.update(scene, dt)?;
        scene.update(dt)?;

        renderer.begin_frame();
        self.last_draw_count = scene.draw(renderer, camera);
        Ok(())
    }
}
