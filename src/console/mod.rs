pub mod glyphs;
pub mod input;
pub mod session;
pub mod terminal;
