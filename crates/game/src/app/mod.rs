pub(crate) mod audio;
pub(crate) mod bootstrap;
pub(crate) mod config;
pub(crate) mod debug;
pub(crate) mod hud;
pub(crate) mod loop_runner;
pub(crate) mod world;
