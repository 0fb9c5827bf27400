mod block;
pub mod ffmpeg;

pub use block::MetadataBlock;
pub use ffmpeg::{Ffmpeg, Remuxer};
