pub mod config;
pub mod encode;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod scale;
pub mod surface;
