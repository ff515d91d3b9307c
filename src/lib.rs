// Library exports for markflow

pub mod config;
pub mod draw_context;
pub mod error;
pub mod link_opener;
pub mod richtext;
