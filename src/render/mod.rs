pub mod backend;
pub mod cpu;
pub mod frame;
pub mod headless;
pub mod interactive;
pub mod native;
pub mod recording;
pub mod surface;
