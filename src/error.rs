use aws_sdk_dynamodb::error::BuildError;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Illegal call sequences or parameter combinations.
///
/// These are raised synchronously by the builder method that detects them, before any
/// request reaches the store, and are never worth retrying.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum UsageError {
    /// A sort key range method was called before `sort_key`.
    #[error("must call sortKey before {method}")]
    SortKeyNotDeclared {
        /// The range method that was called.
        method: &'static str,
    },
    /// A second sort key range method was called.
    #[error("cannot query on two conditions separately for sort key")]
    MultipleSortKeyConditions,
    /// The sort key condition cannot be used in a key condition expression.
    #[error("condition on sort key {name} is only valid in a filter")]
    InvalidSortKeyCondition {
        /// The sort key attribute.
        name: String,
    },
    /// A second condition expression was set on a write.
    #[error("cannot set two conditions")]
    MultipleConditions,
    /// `segment` was called before `total_segments`.
    #[error("call totalSegment before segment")]
    SegmentBeforeTotalSegments,
    /// The segment index does not fit in the declared total.
    #[error("segment {segment} is out of range for {total_segments} total segments")]
    SegmentOutOfRange {
        /// The requested segment.
        segment: i32,
        /// The declared number of segments.
        total_segments: i32,
    },
    /// Only one of segment and total segments was declared.
    #[error("must declare both segment and total segment if using either")]
    IncompleteSegment,
    /// A lookup method was called in the wrong mode.
    #[error("cannot call {method} on a {mode} lookup")]
    LookupMode {
        /// The offending method.
        method: &'static str,
        /// The mode the lookup is locked into.
        mode: &'static str,
    },
    /// A batch holds more entries than the store accepts in one call.
    #[error("batch of {actual} entries exceeds the maximum of {max}")]
    BatchSizeExceeded {
        /// The maximum number of entries.
        max: usize,
        /// The number of entries supplied.
        actual: usize,
    },
    /// A batch or transaction was executed without entries.
    #[error("cannot execute an empty {operation}")]
    EmptyBatch {
        /// The operation that was empty.
        operation: &'static str,
    },
    /// A select mode other than specific attributes was combined with a projection.
    #[error("select must be SPECIFIC_ATTRIBUTES when a projection is set, got {select}")]
    SelectWithProjection {
        /// The rejected select mode.
        select: String,
    },
    /// The return values mode is not supported by the operation.
    #[error("{operation} does not support return values {return_values}")]
    InvalidReturnValues {
        /// The operation.
        operation: &'static str,
        /// The rejected mode.
        return_values: String,
    },
    /// A query was executed without a partition key condition.
    #[error("must call key before executing a query")]
    MissingPartitionKey,
}

/// Errors produced by the request builders and the table facade.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Illegal builder usage.
    #[error(transparent)]
    Usage(#[from] UsageError),
    /// An externally supplied pagination token could not be decoded.
    #[error("invalid pagination token: {0}")]
    InvalidPaginationToken(String),
    /// A wire value could not be decoded into an [`crate::common::attribute::Attribute`].
    #[error("invalid attribute value: {0}")]
    Attribute(String),
    /// A native value could not be converted to or from the item representation.
    #[error(transparent)]
    Serialization(#[from] serde_dynamo::Error),
    /// The SDK rejected the assembled request.
    #[error(transparent)]
    Request(#[from] BuildError),
    /// The store (or its transport) returned an error.
    #[error(transparent)]
    Store(Box<aws_sdk_dynamodb::Error>),
    /// Required configuration is missing.
    #[error("missing configuration: {0}")]
    Configuration(String),
}

impl From<aws_sdk_dynamodb::Error> for Error {
    fn from(error: aws_sdk_dynamodb::Error) -> Self {
        Self::Store(Box::new(error))
    }
}

impl Error {
    /// Whether the error was caused by caller supplied input rather than an internal fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidPaginationToken(_))
    }

    /// Whether the store rejected a conditional write.
    pub fn is_conditional_check_failed(&self) -> bool {
        match self {
            Self::Store(error) => matches!(
                error.as_ref(),
                aws_sdk_dynamodb::Error::ConditionalCheckFailedException(_)
            ),
            _ => false,
        }
    }

    /// Whether the store reported a missing table or index.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(error) => matches!(
                error.as_ref(),
                aws_sdk_dynamodb::Error::ResourceNotFoundException(_)
            ),
            _ => false,
        }
    }
}
