// =============================================================================
// Metric results: typed failure reasons carried to the presentation edge
// =============================================================================
//
// Every metric operation yields a `Metric<T>`: either a computed value or the
// reason it could not be computed. Faults never cross ticker or timeframe
// boundaries; the HTML renderer is the only place where an unavailable metric
// collapses to zero.
// =============================================================================

use serde::Serialize;

/// Why a metric could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MetricError {
    /// The source returned an empty series (or nothing usable after filtering).
    NoData,
    /// The source raised, returned a non-success status, or timed out.
    FetchFault(String),
    /// The division target of a stand-alone percentage was zero.
    DegenerateDenominator,
}

impl std::fmt::Display for MetricError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "no data"),
            Self::FetchFault(msg) => write!(f, "fetch fault: {msg}"),
            Self::DegenerateDenominator => write!(f, "degenerate denominator"),
        }
    }
}

impl std::error::Error for MetricError {}

/// A computed value or the reason it is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Metric<T> {
    Ok { value: T },
    Unavailable { reason: MetricError },
}

impl<T> Metric<T> {
    pub fn ok(value: T) -> Self {
        Self::Ok { value }
    }

    pub fn unavailable(reason: MetricError) -> Self {
        Self::Unavailable { reason }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ok { value } => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&MetricError> {
        match self {
            Self::Ok { .. } => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

impl<T: Clone + Default> Metric<T> {
    /// The value, or `T::default()` (all zeros) when unavailable.
    pub fn value_or_default(&self) -> T {
        self.value().cloned().unwrap_or_default()
    }
}

impl<T> From<Result<T, MetricError>> for Metric<T> {
    fn from(res: Result<T, MetricError>) -> Self {
        match res {
            Ok(value) => Self::ok(value),
            Err(reason) => Self::unavailable(reason),
        }
    }
}
