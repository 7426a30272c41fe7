use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::frame::{GroupField, Variable};

const SIZE: &str = "size";
const MEAN: &str = "mean";
const MEDIAN: &str = "median";
const STD_DEV: &str = "std_dev";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub group: String,
    pub size: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent for single-member groups.
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    pub slice: String,
    pub group_by: GroupField,
    pub target: Variable,
    pub groups: Vec<GroupStats>,
}

impl GroupComparison {
    /// Group with the highest mean; ties resolve to the first group in key order.
    pub fn best(&self) -> Option<&GroupStats> {
        self.groups.iter().fold(None, |best: Option<&GroupStats>, group| match best {
            Some(current) if current.mean >= group.mean => Some(current),
            _ => Some(group),
        })
    }
}

/// Partitions rows by `group_by` and summarizes `target`. Rows missing either
/// value are skipped; groups are ordered by key.
pub fn compare_groups(
    frame: &DataFrame,
    slice: &str,
    group_by: GroupField,
    target: Variable,
) -> PolarsResult<GroupComparison> {
    let field = group_by.column();
    let value = target.column();

    let summary = frame
        .clone()
        .lazy()
        .filter(col(field).is_not_null().and(col(value).is_not_null()))
        .group_by([col(field)])
        .agg([
            len().cast(DataType::UInt64).alias(SIZE),
            col(value).mean().alias(MEAN),
            col(value).median().alias(MEDIAN),
            col(value).std(1).alias(STD_DEV),
        ])
        .sort([field], SortMultipleOptions::default())
        .collect()?;

    let keys = summary.column(field)?.str()?;
    let sizes = summary.column(SIZE)?.u64()?;
    let means = summary.column(MEAN)?.f64()?;
    let medians = summary.column(MEDIAN)?.f64()?;
    let std_devs = summary.column(STD_DEV)?.f64()?;

    let mut groups = Vec::with_capacity(summary.height());
    for ((((key, size), mean), median), std_dev) in keys
        .into_iter()
        .zip(sizes)
        .zip(means)
        .zip(medians)
        .zip(std_devs)
    {
        let (Some(key), Some(size), Some(mean), Some(median)) = (key, size, mean, median) else {
            continue;
        };
        groups.push(GroupStats {
            group: key.to_string(),
            size: size as usize,
            mean,
            median,
            std_dev: std_dev.filter(|sd| size > 1 && sd.is_finite()),
        });
    }

    Ok(GroupComparison {
        slice: slice.to_string(),
        group_by,
        target,
        groups,
    })
}
