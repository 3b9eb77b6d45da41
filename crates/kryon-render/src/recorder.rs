// crates/kryon-render/src/recorder.rs
use crate::{CommandRenderer, RenderCommand, RenderResult};
use glam::{Vec2, Vec4};
use std::fmt::Write as _;

/// Backend that keeps the commands of the last frame instead of drawing them.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    viewport: Vec2,
    frames: usize,
    last_frame: Vec<RenderCommand>,
}

impl CommandRecorder {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn last_frame(&self) -> &[RenderCommand] {
        &self.last_frame
    }

    /// One line per command, for terminal dumps.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for command in &self.last_frame {
            let _ = match command {
                RenderCommand::DrawRect { element, position, size, color, border_widths, .. } => writeln!(
                    out,
                    "rect  #{:<4} at ({:.1}, {:.1}) size {:.1}x{:.1} color {} border {}/{}/{}/{}",
                    element,
                    position.x,
                    position.y,
                    size.x,
                    size.y,
                    hex(*color),
                    border_widths.top,
                    border_widths.right,
                    border_widths.bottom,
                    border_widths.left
                ),
                RenderCommand::DrawText { element, position, text, font_size, color, .. } => writeln!(
                    out,
                    "text  #{:<4} at ({:.1}, {:.1}) {:.0}px {} {:?}",
                    element, position.x, position.y, font_size, hex(*color), text
                ),
                RenderCommand::DrawImage { element, position, size, source, .. } => writeln!(
                    out,
                    "image #{:<4} at ({:.1}, {:.1}) size {:.1}x{:.1} {}",
                    element, position.x, position.y, size.x, size.y, source
                ),
            };
        }
        out
    }
}

impl CommandRenderer for CommandRecorder {
    type Context = Vec<RenderCommand>;

    fn begin_frame(&mut self, _clear_color: Vec4) -> RenderResult<Self::Context> {
        Ok(Vec::new())
    }

    fn execute_commands(&mut self, context: &mut Self::Context, commands: &[RenderCommand]) -> RenderResult<()> {
        context.extend_from_slice(commands);
        Ok(())
    }

    fn end_frame(&mut self, context: Self::Context) -> RenderResult<()> {
        self.last_frame = context;
        self.frames += 1;
        Ok(())
    }

    fn viewport_size(&self) -> Vec2 {
        self.viewport
    }
}

fn hex(color: Vec4) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02X}{:02X}{:02X}{:02X}",
        channel(color.x),
        channel(color.y),
        channel(color.z),
        channel(color.w)
    )
}
