// All validation happens at the boundary of the public crate. The internal
// crate returns `&'static str`, and we wrap those messages in the variants
// below wherever they can reach a caller.
//
// Unlike a plain enum, `Error` keeps its representation private. The kind
// is exposed (read-only) so callers and tests can branch on it.

/// The error type returned throughout the crate
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// Describes what went wrong
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// The coordinates or values have an unusable shape (mismatched row
    /// counts, a single time step, fewer than 2 points, ...)
    InvalidShape(String),
    /// An unknown distance metric name, or a metric parameter that is out
    /// of range
    InvalidMetric(String),
    /// An unknown binning method name
    InvalidBinningMethod(String),
    /// An axis name other than `space`/`s`/`time`/`t`
    InvalidAxis(String),
    /// An unknown estimator name, or an estimator parameter that is out of
    /// range
    InvalidEstimator(String),
    /// The estimator can't be used to compute the full experimental surface
    UnsupportedEstimatorForSurface(String),
    /// A lag count that can't be used for the requested axis
    InvalidLagCount(String),
    /// Problematic bin edges (either user-provided or returned by a custom
    /// binning function)
    InvalidBinEdges(String),
    /// A maximum lag that can't be used
    InvalidMaxLag(String),
    /// A lag-class index beyond the number of lag classes
    LagIndexOutOfRange {
        axis: &'static str,
        lag: usize,
        n_lags: usize,
    },
}

// define constructor methods for Error
impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub(crate) fn invalid_shape(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidShape(what.into()),
        }
    }

    pub(crate) fn invalid_metric(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidMetric(what.into()),
        }
    }

    /// produce an error for an unknown binning method name
    pub(crate) fn invalid_binning_method(name: &str) -> Self {
        Error {
            kind: ErrorKind::InvalidBinningMethod(format!(
                "\"{name}\" binning method is not known. Choices include: \
                 [\"even\", \"uniform\"]"
            )),
        }
    }

    pub(crate) fn invalid_axis(name: &str) -> Self {
        Error {
            kind: ErrorKind::InvalidAxis(format!(
                "\"{name}\" is not a valid axis. Use one of \"space\" or \"time\""
            )),
        }
    }

    pub(crate) fn invalid_estimator(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidEstimator(what.into()),
        }
    }

    pub(crate) fn unsupported_estimator_for_surface(name: &str) -> Self {
        Error {
            kind: ErrorKind::UnsupportedEstimatorForSurface(name.to_owned()),
        }
    }

    pub(crate) fn invalid_lag_count(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidLagCount(what.into()),
        }
    }

    /// produce an error indicating that problematic bin edges were
    /// encountered. `who` describes where they came from.
    pub(crate) fn invalid_bin_edges(who: &str, what: &str) -> Self {
        Error {
            kind: ErrorKind::InvalidBinEdges(format!("problem with {who}: {what}")),
        }
    }

    pub(crate) fn invalid_max_lag(what: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidMaxLag(what.into()),
        }
    }

    pub(crate) fn lag_index_out_of_range(axis: &'static str, lag: usize, n_lags: usize) -> Self {
        Error {
            kind: ErrorKind::LagIndexOutOfRange { axis, lag, n_lags },
        }
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            ErrorKind::InvalidShape(what) => write!(f, "invalid shape: {what}"),
            ErrorKind::InvalidMetric(what) => write!(f, "invalid distance metric: {what}"),
            ErrorKind::InvalidBinningMethod(what) => write!(f, "{what}"),
            ErrorKind::InvalidAxis(what) => write!(f, "{what}"),
            ErrorKind::InvalidEstimator(what) => write!(f, "invalid estimator: {what}"),
            ErrorKind::UnsupportedEstimatorForSurface(name) => write!(
                f,
                "the \"{name}\" estimator can't be used to compute the \
                 experimental surface"
            ),
            ErrorKind::InvalidLagCount(what) => write!(f, "invalid lag count: {what}"),
            ErrorKind::InvalidBinEdges(what) => write!(f, "invalid bin edges: {what}"),
            ErrorKind::InvalidMaxLag(what) => write!(f, "invalid maximum lag: {what}"),
            ErrorKind::LagIndexOutOfRange { axis, lag, n_lags } => write!(
                f,
                "{axis} lag index {lag} is out of range. There are {n_lags} \
                 {axis} lag classes"
            ),
        }
    }
}
