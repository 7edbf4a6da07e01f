pub mod gamepad;
pub mod input;
pub mod reader;
pub mod renderer;
pub mod sound;
