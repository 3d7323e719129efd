pub mod animation;
pub mod cache;
pub mod error;
pub mod monitor;
pub mod platform;
pub mod renderer;
pub mod tiles;
pub mod window;
