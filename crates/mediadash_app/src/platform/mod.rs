pub mod app;
mod effects;
pub mod logging;
mod render;
mod session;
