pub mod menu;
pub mod winit;
