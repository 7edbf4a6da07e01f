pub mod animation;
pub mod constants;
pub mod entity;
pub mod motion;
pub mod physics;
pub mod tile;
pub mod tilemap;
