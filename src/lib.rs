pub mod gallery;
pub mod gui;
pub mod hotkey;
pub mod logging;
pub mod overlay;
pub mod settings;
