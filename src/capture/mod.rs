mod camera;
pub mod mock;
mod scanner;

pub use camera::{Camera, CaptureError, PathCamera};
pub use scanner::{Scanner, StdinScanner};
