//! Error types for the tree provider

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node is not an element")]
    NotAnElement,

    #[error("node is not a text leaf")]
    NotText,

    #[error("insertion would create a cycle")]
    CycleDetected,

    #[error("child index {index} out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },
}
