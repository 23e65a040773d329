pub mod clock;
pub mod countdown;

pub use clock::{Clock, FrameClock, FrameStats};
pub use countdown::CountdownTimer;
