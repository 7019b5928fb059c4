pub mod compositor;
pub mod config;
pub mod image;
pub mod pixel;
pub mod state;
pub mod surface;
