//! JSON rendering for reports.

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a report (batch summary, document result) to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, RegionKind};
    use crate::region::{SkipReason, SkippedRegion};

    fn skipped() -> SkippedRegion {
        SkippedRegion {
            bbox: BoundingBox::new(1, 2, 3, 4),
            kind: RegionKind::Equation,
            reason: SkipReason::NotFound {
                snippet: "x2".to_string(),
            },
        }
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&skipped(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"kind\": \"equation\""));
        assert!(json.contains("\"reason\": \"not_found\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&[skipped()], JsonFormat::Compact).unwrap();
        assert!(json.starts_with('['));
        assert!(!json.contains('\n'));
        assert!(json.contains("\"snippet\":\"x2\""));
    }
}
