//! Display-refresh driver.
//!
//! Each tick advances the camera animation, then paints a [`Frame`]
//! built from an immutable borrow of the session.

use crate::session::Session;
use avn_render::frame::{Frame, FrameSink};

#[derive(Debug, Default)]
pub struct RenderLoop {
    frames: u64,
    dirty: bool,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            frames: 0,
            dirty: true,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Mark the next frame as needed even if nothing animates.
    pub fn request_redraw(&mut self) {
        self.dirty = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// One display refresh.
    pub fn tick(&mut self, session: &mut Session, sink: &mut dyn FrameSink, now_ms: f64) {
        if session.viewport.tick_animation() {
            self.dirty = true;
        }
        self.paint(session, sink, now_ms);
    }

    /// Paint without advancing anything.
    pub fn paint(&mut self, session: &Session, sink: &mut dyn FrameSink, now_ms: f64) {
        self.frames += 1;
        self.dirty = false;
        let frame = build_frame(session, now_ms, self.frames);
        sink.paint(&frame);
    }
}

pub fn build_frame(session: &Session, time_ms: f64, frame_index: u64) -> Frame<'_> {
    let viewport = &session.viewport;
    let (width, height) = viewport.size();
    Frame {
        graph: &session.graph,
        camera: viewport.camera,
        width,
        height,
        marquee: viewport.marquee(),
        edge_draft: viewport.edge_draft(&session.graph),
        editor: session.is_editor(),
        time_ms,
        frame_index,
    }
}
