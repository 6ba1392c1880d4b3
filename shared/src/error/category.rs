//! Grouping of error codes by the thousands digit

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Area of the storefront an error code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request shape, validation, routing
    General,
    Order,
    Payment,
    /// Upload and model analysis
    File,
    /// Shipping and notifications
    Fulfillment,
    /// Storage, vendors, configuration
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0..=3 => Self::General,
            4 => Self::Order,
            5 => Self::Payment,
            6 => Self::File,
            7 | 8 => Self::Fulfillment,
            _ => Self::System,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Order => "order",
            Self::Payment => "payment",
            Self::File => "file",
            Self::Fulfillment => "fulfillment",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_ranges_map_to_areas() {
        let cases = [
            (0, ErrorCategory::General),
            (9, ErrorCategory::General),
            (4004, ErrorCategory::Order),
            (5002, ErrorCategory::Payment),
            (6504, ErrorCategory::File),
            (7101, ErrorCategory::Fulfillment),
            (9003, ErrorCategory::System),
        ];
        for (code, expected) in cases {
            assert_eq!(ErrorCategory::from_code(code), expected, "code {code}");
        }
    }

    #[test]
    fn test_codes_know_their_area() {
        assert_eq!(ErrorCode::FileTooLarge.category(), ErrorCategory::File);
        assert_eq!(
            ErrorCode::ShippingLabelFailed.category(),
            ErrorCategory::Fulfillment
        );
        assert_eq!(ErrorCode::VendorError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_area_renders_lowercase() {
        assert_eq!(ErrorCategory::Fulfillment.to_string(), "fulfillment");
        assert_eq!(
            serde_json::to_string(&ErrorCategory::Payment).unwrap(),
            "\"payment\""
        );
    }
}
