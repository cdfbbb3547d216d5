pub mod choice;
pub mod config;
pub mod input;
pub mod intent;
pub mod mutation;
pub mod render_loop;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod traversal;
pub mod viewport;

pub use config::{SessionConfig, ViewportConfig};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use intent::{ChoiceOption, Intent};
pub use mutation::{GraphMutation, apply_mutation};
pub use render_loop::RenderLoop;
pub use selection::{SelectionMode, SelectionModel};
pub use session::{Mode, Session};
pub use traversal::{TraversalEngine, TraversalState};
pub use viewport::{DragState, Viewport, ViewportEvent};
