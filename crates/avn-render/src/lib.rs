pub mod frame;
pub mod hit;
pub mod paint;

pub use frame::{Frame, FrameSink, LOD_THRESHOLD, Theme};
pub use paint::ScenePainter;
