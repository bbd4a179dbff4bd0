use num_enum::{TryFromPrimitive, TryFromPrimitiveError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CabacError {
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,
    #[error("Invalid {name} value {value}")]
    InvalidEnumValue { name: &'static str, value: u8 },
    #[error("Unknown context group '{0}'")]
    UnknownContextGroup(String),
    #[error("Context index {index} out of range for group {group}")]
    ContextIndexOutOfRange { group: &'static str, index: usize },
    #[error("Invalid tool configuration: {0}")]
    InvalidToolConfiguration(&'static str),
    #[error("Invalid trace at line {line}: {reason}")]
    InvalidTrace { line: usize, reason: String },
    #[error("Substream does not end with a terminating bin")]
    MissingSubstreamEnd,
    #[error("Bin mismatch at trace line {line}: expected {expected}, decoded {decoded}")]
    BinMismatch { line: usize, expected: u32, decoded: u32 },
    #[error("Expected {expected} window sizes, got {actual}")]
    WindowSizeCount { expected: usize, actual: usize },
    #[error("No window size statistics for {slice_type} slices at qp index {qp_idx}")]
    MissingWindowSizes { slice_type: &'static str, qp_idx: usize },
}

impl<T> From<TryFromPrimitiveError<T>> for CabacError
where
    T: TryFromPrimitive<Primitive = u8>,
{
    fn from(error: TryFromPrimitiveError<T>) -> Self {
        CabacError::InvalidEnumValue {
            name: T::NAME,
            value: error.number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SliceType;

    #[test]
    fn test_enum_conversion_error() {
        let error: CabacError = SliceType::try_from(7u8).unwrap_err().into();
        assert_eq!(error, CabacError::InvalidEnumValue { name: "SliceType", value: 7 });
        assert_eq!(error.to_string(), "Invalid SliceType value 7");
    }
}
