//! View model projection and terminal rendering.

mod projection;
mod render;

pub use projection::project;
pub use render::render_state;
