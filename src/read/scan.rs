use crate::{
    client::StoreClient,
    common::{self, attribute::Item},
    error::{Result, UsageError},
    read::common::{MultipleReadArgs, Page, Paginate},
};

use async_trait::async_trait;
use aws_sdk_dynamodb::operation;

/// Scan operation over a whole table or index.
///
/// Parallel scans are a partitioning contract: each worker builds its own scan with the same
/// `total_segments` and a distinct `segment`, and executes it independently.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_table::read::scan::Scan;
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let workers = (0..4).map(|segment| {
///     let client = client.clone();
///     tokio::spawn(async move {
///         Scan::new(client, "resources")
///             .total_segments(4)
///             .segment(segment)?
///             .execute_all()
///             .await
///     })
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Scan<C> {
    client: C,
    expressions: common::Accumulator,
    read: MultipleReadArgs,
    segment: Option<i32>,
    total_segments: Option<i32>,
}

impl<C> Scan<C> {
    /// Start a scan of `table_name`.
    pub fn new(client: C, table_name: impl Into<String>) -> Self {
        Self {
            client,
            expressions: common::Accumulator::default(),
            read: MultipleReadArgs::new(table_name),
            segment: None,
            total_segments: None,
        }
    }

    crate::expression_methods!(names, values, projection);
    crate::multiple_read_methods!();

    /// Divide the keyspace into `total_segments` segments.
    pub fn total_segments(mut self, total_segments: i32) -> Self {
        self.total_segments = Some(total_segments);
        self
    }

    /// Scan only `segment`, counted from zero.
    pub fn segment(mut self, segment: i32) -> Result<Self> {
        let Some(total_segments) = self.total_segments else {
            return Err(UsageError::SegmentBeforeTotalSegments.into());
        };
        if !(0..total_segments).contains(&segment) {
            return Err(UsageError::SegmentOutOfRange {
                segment,
                total_segments,
            }
            .into());
        }
        self.segment = Some(segment);
        Ok(self)
    }

    pub(crate) fn build(self) -> Result<(C, operation::scan::ScanInput)> {
        match (self.segment, self.total_segments) {
            (Some(segment), Some(total_segments)) if !(0..total_segments).contains(&segment) => {
                return Err(UsageError::SegmentOutOfRange {
                    segment,
                    total_segments,
                }
                .into());
            }
            (Some(_), None) | (None, Some(_)) => return Err(UsageError::IncompleteSegment.into()),
            _ => {}
        }
        let multiple_read_operation = self.read.finish(self.expressions)?;
        let builder = operation::scan::ScanInput::builder()
            .set_segment(self.segment)
            .set_total_segments(self.total_segments);
        let input =
            crate::apply_multiple_read_operation!(builder, multiple_read_operation).build()?;
        Ok((self.client, input))
    }
}

impl<C: StoreClient> Scan<C> {
    /// Execute the scan and decode one page of results.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.scan",
            skip_all,
            fields(table = %self.read.table_name, segment = ?self.segment),
            err
        )
    )]
    pub async fn execute(self) -> Result<Page> {
        let (client, input) = self.build()?;
        let output = client.send_scan(input).await?;
        Page::decode(
            output.items,
            output.last_evaluated_key,
            output.count,
            output.scanned_count,
            output.consumed_capacity,
        )
    }

    /// Execute the scan, following continuation keys until the segment is exhausted.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.scan_all",
            skip_all,
            fields(table = %self.read.table_name, segment = ?self.segment),
            err
        )
    )]
    pub async fn execute_all(self) -> Result<Page> {
        let (client, mut input) = self.build()?;
        let mut pages = Vec::new();
        loop {
            let output = client.send_scan(input.clone()).await?;
            let page = Page::decode(
                output.items,
                output.last_evaluated_key,
                output.count,
                output.scanned_count,
                output.consumed_capacity,
            )?;
            let next = page.raw_last_evaluated_key.clone();
            pages.push(page);
            match next {
                Some(key) => input.exclusive_start_key = Some(key),
                None => break,
            }
        }
        Ok(Page::concat(pages))
    }
}

#[async_trait]
impl<C: StoreClient> Paginate for Scan<C> {
    fn resume_from(self, key: Option<Item>) -> Self {
        self.start(key)
    }

    async fn fetch_page(self) -> Result<Page> {
        self.execute().await
    }
}
