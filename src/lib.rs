// Library exports for novelcharts

pub mod config;
pub mod data;
pub mod output;
pub mod parser;
pub mod runtime;

// Transforms
pub mod aggregate;
pub mod hierarchy;
pub mod ir;
pub mod ranking;
pub mod timeline;
pub mod words;

// Presentation
pub mod charts;
pub mod palette;
pub mod render;
