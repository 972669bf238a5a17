use std::future::Future;

use cloud_sdk::SdkError;

use crate::error::SweepError;
use crate::model::ResourceKind;

/// Run two independent retrievals concurrently and wait for both.
///
/// Every failure is logged; the pass is aborted with the first one so that no
/// diff is computed against a missing source.
pub async fn join_fetches<A, B, FA, FB>(
    kind: ResourceKind,
    first: FA,
    second: FB,
) -> Result<(A, B), SweepError>
where
    FA: Future<Output = Result<A, SdkError>>,
    FB: Future<Output = Result<B, SdkError>>,
{
    let (first, second) = tokio::join!(first, second);

    for err in [first.as_ref().err(), second.as_ref().err()]
        .into_iter()
        .flatten()
    {
        log::error!("Fetching {kind} failed: {err}");
    }

    let first = first.map_err(|source| SweepError::Fetch { kind, source })?;
    let second = second.map_err(|source| SweepError::Fetch { kind, source })?;
    Ok((first, second))
}
