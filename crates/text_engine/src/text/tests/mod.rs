//! Cross-module tests for the text system

mod support;
mod atlas_to_draw;
mod batching;
