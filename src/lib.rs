pub mod config;
pub mod ecs;
pub mod engine;
pub mod motion;

#[cfg(test)]
mod testing;
