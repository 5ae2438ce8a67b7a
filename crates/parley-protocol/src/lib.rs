pub mod frames;

pub use frames::{EventFrame, FrameError, InboundFrame, MESSAGE_EVENT};
