pub mod engine;
pub mod ring_buffer;
pub mod scope;
