use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub(crate) enum Error {
    #[error("temperature must be finite and within [{min}, {max}], got {value}")]
    InvalidTemperature { value: f64, min: f64, max: f64 },

    #[error("flip probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("frame rate {fps} is outside [{min}, {max}] (min must be at least 1)")]
    InvalidFrameRate { fps: u32, min: u32, max: u32 },

    #[error("grid dimensions {height}x{width} must each be within 1..={max}")]
    InvalidDimensions {
        height: usize,
        width: usize,
        max: usize,
    },

    #[error("failed to allocate a {height}x{width} grid")]
    Allocation { height: usize, width: usize },
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
