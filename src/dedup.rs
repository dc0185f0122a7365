//! Removal of repeated time stamps.
//!
//! When the amplifier restarts, a concatenated recording can contain the
//! same time stamp twice: first a stretch without neural data, then the
//! real one. The last occurrence of every time stamp is kept.

use std::collections::HashSet;

use crate::series::ElectricalSeries;

/// Indices of the last occurrence of each value, ascending.
pub fn keep_last_indices(times: &[u64]) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(times.len());
    let mut keep: Vec<usize> = times
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, t)| seen.insert(**t))
        .map(|(i, _)| i)
        .collect();
    keep.reverse();
    keep
}

pub fn drop_duplicated_timestamps(series: &ElectricalSeries) -> ElectricalSeries {
    series.select_rows(&keep_last_indices(&series.time_axis))
}

/// `x_ieeg.h5` becomes `x_clean_ieeg.h5`.
///
/// ```
/// use nkhdf5::dedup::clean_file_name;
///
/// assert_eq!(
///     clean_file_name("sub-PR04_task-biomarker_0001_ieeg.h5"),
///     "sub-PR04_task-biomarker_0001_clean_ieeg.h5"
/// );
/// ```
pub fn clean_file_name(name: &str) -> String {
    format!("{}_ieeg.h5", name.replace("ieeg.h5", "clean"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{SeriesAttributes, COORD_DIMS};
    use ndarray::{array, Array2};

    #[test]
    fn test_keep_last_indices() {
        assert_eq!(keep_last_indices(&[1, 2, 3, 2, 3, 4]), vec![1, 3, 4, 5]);
        assert_eq!(keep_last_indices(&[5, 5, 5]), vec![2]);
        assert_eq!(keep_last_indices(&[]), Vec::<usize>::new());
        assert_eq!(keep_last_indices(&[3, 2, 1]), vec![0, 1, 2]);
    }

    #[test]
    fn test_drop_keeps_second_group() {
        let series = ElectricalSeries::new(
            array![[0.0f32], [0.0], [7.0], [8.0], [9.0]],
            vec![100, 200, 100, 200, 300],
            Vec::new(),
            Array2::zeros((0, COORD_DIMS)),
            SeriesAttributes::default(),
        )
        .unwrap();

        let clean = drop_duplicated_timestamps(&series);
        assert_eq!(clean.time_axis, vec![100, 200, 300]);
        assert_eq!(clean.data, array![[7.0f32], [8.0], [9.0]]);
        assert_eq!(clean.attributes, series.attributes);
    }

    #[test]
    fn test_unique_series_unchanged() {
        let series = ElectricalSeries::new(
            array![[1.0f32, 2.0], [3.0, 4.0]],
            vec![1, 2],
            Vec::new(),
            Array2::zeros((0, COORD_DIMS)),
            SeriesAttributes::default(),
        )
        .unwrap();
        assert_eq!(drop_duplicated_timestamps(&series), series);
    }

    #[test]
    fn test_clean_file_name_without_suffix() {
        assert_eq!(clean_file_name("recording.h5"), "recording.h5_ieeg.h5");
    }
}
