pub mod sauce;
