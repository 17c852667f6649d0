//! FILENAME: core/cascade-engine/src/ranking.rs
//! Summary/Top-N Selector.
//!
//! Ranks the values of one categorical column by their summed measure, then
//! scopes a finer-grained breakdown to the top-ranked keys only.

use serde::{Deserialize, Serialize};

use crate::aggregate::{evaluate, AggregateTable};
use crate::definition::AggregationSpec;
use crate::error::EngineError;
use crate::subset::FilteredSubset;

/// One ranked key with its summed measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedKey {
    pub key: String,
    pub value: f64,
}

/// Sums `measure_column` per `key_column` value and keeps the `n` largest.
///
/// Ordering is descending by value; equal values keep the order in which the
/// key first occurs in the subset. Fewer than `n` distinct keys is fine.
pub fn top_n(
    subset: &FilteredSubset,
    key_column: &str,
    measure_column: &str,
    n: usize,
) -> Result<Vec<RankedKey>, EngineError> {
    let spec = AggregationSpec::sum("top_n", &[key_column], measure_column);
    let table = evaluate(&spec, subset)?.into_table(measure_column);

    let mut ranked: Vec<RankedKey> = table
        .rows
        .into_iter()
        .map(|row| RankedKey {
            key: row.key.into_iter().next().unwrap_or_default(),
            value: row.value,
        })
        .collect();

    // sort_by is stable, so ties stay in first-occurrence order.
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(n);
    Ok(ranked)
}

/// Rows of `subset` whose `key_column` value is one of `keys`.
pub fn restrict_to_keys(
    subset: &FilteredSubset,
    key_column: &str,
    keys: &[String],
) -> Result<FilteredSubset, EngineError> {
    subset.restrict(key_column, keys)
}

/// The ranking plus a `key_column` x `detail_column` table limited to the
/// ranked keys (e.g. top districts stacked by area type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBreakdown {
    pub ranking: Vec<RankedKey>,
    pub table: AggregateTable,
}

pub fn top_n_breakdown(
    subset: &FilteredSubset,
    key_column: &str,
    detail_column: &str,
    measure_column: &str,
    n: usize,
) -> Result<RankedBreakdown, EngineError> {
    let ranking = top_n(subset, key_column, measure_column, n)?;
    let keys: Vec<String> = ranking.iter().map(|r| r.key.clone()).collect();
    let scoped = restrict_to_keys(subset, key_column, &keys)?;

    let spec = AggregationSpec::sum("top_n_breakdown", &[key_column, detail_column], measure_column);
    let table = evaluate(&spec, &scoped)?.into_table(measure_column);

    Ok(RankedBreakdown { ranking, table })
}
