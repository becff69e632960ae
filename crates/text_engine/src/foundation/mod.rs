//! Foundation utilities shared by the text and render modules

pub mod logging;
pub mod math;
