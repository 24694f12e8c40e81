//! Draw traversal and the renderer surface it draws through.
//!
//! The scene never talks to a graphics API directly. Components draw through
//! the [`Renderer`] trait: set an affine transform, then emit polygons or
//! rectangles in the space that transform maps from. [`RecordingRenderer`] is
//! the headless implementation used by tests and the demo binary; it stores
//! every call as a [`DrawCommand`].
//!
//! # Traversal
//!
//! [`render_pass`] walks every root entity:
//! - disabled or disposed entities are skipped with their whole subtree,
//! - entities whose global bounds miss the visible area are culled,
//! - children are drawn before their parent's own components,
//! - each enabled component receives `projection_view * global` and the
//!   renderer transform is reset after it.

use serde::Serialize;

use crate::components::bounds::Bounds;
use crate::components::color::Color;
use crate::math::{Mat3, Vec2};
use crate::resources::camera::ViewProvider;
use crate::scene::{EntityId, Scene};

/// Graphics surface used by component draw hooks.
pub trait Renderer {
    /// Called once before the scene is drawn.
    fn begin_frame(&mut self) {}

    /// Set the active affine transform for subsequent primitives.
    fn set_transform(&mut self, transform: Mat3);

    fn reset_transform(&mut self);

    /// Closed polygon. `stroke` is `(colour, line width)`.
    fn draw_polygon(&mut self, points: &[Vec2], fill: Option<Color>, stroke: Option<(Color, f32)>);

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Color);

    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Resize notification from the host.
    fn resize(&mut self, width: u32, height: u32);
}

/// One recorded renderer call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    BeginFrame,
    SetTransform(Mat3),
    ResetTransform,
    Polygon {
        points: Vec<Vec2>,
        fill: Option<Color>,
        stroke: Option<(Color, f32)>,
    },
    Rect {
        min: Vec2,
        size: Vec2,
        color: Color,
    },
}

/// Headless renderer that keeps every command of the current frame.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Commands recorded since the last `begin_frame`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of polygon and rectangle primitives in the current frame.
    pub fn primitive_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polygon { .. } | DrawCommand::Rect { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::BeginFrame);
        self.frames += 1;
    }

    fn set_transform(&mut self, transform: Mat3) {
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn reset_transform(&mut self) {
        self.commands.push(DrawCommand::ResetTransform);
    }

    fn draw_polygon(&mut self, points: &[Vec2], fill: Option<Color>, stroke: Option<(Color, f32)>) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            fill,
            stroke,
        });
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Color) {
        self.commands.push(DrawCommand::Rect { min, size, color });
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// Draw every visible entity of `scene`. Returns the number of component
/// draw hooks that ran.
pub fn render_pass(scene: &Scene, renderer: &mut dyn Renderer, view: &dyn ViewProvider) -> usize {
    let projection_view = view.projection_view();
    let visible = view.visible_bounds();
    let mut drawn = 0;
    for &root in &scene.roots {
        draw_entity(scene, root, renderer, projection_view, &visible, &mut drawn);
    }
    drawn
}

fn draw_entity(
    scene: &Scene,
    id: EntityId,
    renderer: &mut dyn Renderer,
    projection_view: Mat3,
    visible: &Bounds,
    drawn: &mut usize,
) {
    let Some(entity) = scene.entities.get(id) else {
        return;
    };
    if !entity.enabled || entity.disposed {
        return;
    }
    if !entity.global_bounds.is_intersecting(visible) {
        return;
    }

    for &child in entity.transform.children() {
        draw_entity(scene, child, renderer, projection_view, visible, drawn);
    }

    let world = projection_view * entity.transform.global_matrix();
    for key in &entity.components {
        let Some(component) = scene.components.get(*key) else {
            continue;
        };
        if !component.is_enabled() || component.is_disposed() {
            continue;
        }
        component.run_draw(renderer, world, &entity.transform);
        renderer.reset_transform();
        *drawn += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_renderer_frame_reset() {
        let mut r = RecordingRenderer::new(320, 200);
        r.begin_frame();
        r.fill_rect(Vec2::ZERO, Vec2::ONE, Color::WHITE);
        r.draw_polygon(&[Vec2::ZERO, Vec2::X, Vec2::Y], None, Some((Color::BLACK, 1.0)));
        assert_eq!(r.primitive_count(), 2);
        assert_eq!(r.commands()[0], DrawCommand::BeginFrame);

        r.begin_frame();
        assert_eq!(r.commands().len(), 1);
        assert_eq!(r.frames(), 2);
    }

    #[test]
    fn test_resize() {
        let mut r = RecordingRenderer::new(1, 1);
        r.resize(800, 600);
        assert_eq!(r.size(), (800, 600));
    }
}
