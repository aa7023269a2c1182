//! Frame draw lists
//!
//! Controllers never talk to the backend directly. They record
//! [`DrawCommand`]s into a [`DrawList`] and the compositor submits the whole
//! list once per frame.

use crate::geometry::{Color, Rect, Vec2};
use crate::gpu::{ProgramId, TextureId};

/// A single recorded draw
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Solid rectangle
    FillRect {
        rect: Rect,
        corner_radius: f32,
        color: Color,
    },
    /// Textured quad; `tint` alpha carries the effective opacity
    Texture {
        rect: Rect,
        texture: TextureId,
        tint: Color,
        program: Option<ProgramId>,
    },
    /// Connected line segments
    Polyline {
        points: Vec<Vec2>,
        width: f32,
        color: Color,
    },
    /// Restrict following commands to a rectangle
    PushClip(Rect),
    PopClip,
}

/// Recorded commands for one frame
///
/// Opacity is a stack: everything recorded between `push_opacity` and
/// `pop_opacity` has its alpha multiplied by the accumulated factor.
#[derive(Clone, Debug)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    opacity_stack: Vec<f32>,
    clip_depth: usize,
}

impl DrawList {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            opacity_stack: vec![1.0],
            clip_depth: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the list empty
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.opacity_stack = vec![1.0];
        self.clip_depth = 0;
    }

    /// Current accumulated opacity
    pub fn opacity(&self) -> f32 {
        *self.opacity_stack.last().unwrap_or(&1.0)
    }

    pub fn push_opacity(&mut self, opacity: f32) {
        let current = self.opacity();
        self.opacity_stack.push(current * opacity.clamp(0.0, 1.0));
    }

    pub fn pop_opacity(&mut self) {
        if self.opacity_stack.len() > 1 {
            self.opacity_stack.pop();
        }
    }

    pub fn push_clip(&mut self, rect: Rect) {
        self.clip_depth += 1;
        self.commands.push(DrawCommand::PushClip(rect));
    }

    pub fn pop_clip(&mut self) {
        if self.clip_depth > 0 {
            self.clip_depth -= 1;
            self.commands.push(DrawCommand::PopClip);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, corner_radius: f32, color: Color) {
        let color = color.fade(self.opacity());
        if color.a <= 0.0 {
            return;
        }
        self.commands.push(DrawCommand::FillRect {
            rect,
            corner_radius,
            color,
        });
    }

    pub fn texture(
        &mut self,
        rect: Rect,
        texture: TextureId,
        tint: Color,
        program: Option<ProgramId>,
    ) {
        let tint = tint.fade(self.opacity());
        if tint.a <= 0.0 {
            return;
        }
        self.commands.push(DrawCommand::Texture {
            rect,
            texture,
            tint,
            program,
        });
    }

    pub fn polyline(&mut self, points: Vec<Vec2>, width: f32, color: Color) {
        let color = color.fade(self.opacity());
        if points.len() < 2 || color.a <= 0.0 {
            return;
        }
        self.commands.push(DrawCommand::Polyline {
            points,
            width,
            color,
        });
    }

    /// Number of textured quads referencing `texture`
    pub fn texture_uses(&self, texture: TextureId) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::Texture { texture: t, .. } if *t == texture))
            .count()
    }
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_stack_multiplies() {
        let mut list = DrawList::new();
        list.push_opacity(0.5);
        list.push_opacity(0.5);
        list.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), 0.0, Color::WHITE);
        list.pop_opacity();
        list.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), 0.0, Color::WHITE);
        list.pop_opacity();
        list.pop_opacity();
        assert_eq!(list.opacity(), 1.0);

        match &list.commands()[..] {
            [DrawCommand::FillRect { color: a, .. }, DrawCommand::FillRect { color: b, .. }] => {
                assert!((a.a - 0.25).abs() < 1e-6);
                assert!((b.a - 0.5).abs() < 1e-6);
            }
            other => panic!("unexpected commands: {:?}", other),
        }
    }

    #[test]
    fn test_invisible_commands_are_dropped() {
        let mut list = DrawList::new();
        list.push_opacity(0.0);
        list.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), 0.0, Color::WHITE);
        list.texture(Rect::ZERO, TextureId(1), Color::WHITE, None);
        list.pop_opacity();
        list.polyline(vec![Vec2::ZERO], 1.0, Color::WHITE);
        assert!(list.is_empty());
    }

    #[test]
    fn test_unbalanced_pop_clip_ignored() {
        let mut list = DrawList::new();
        list.pop_clip();
        list.push_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        list.pop_clip();
        list.pop_clip();
        assert_eq!(list.len(), 2);
    }
}
