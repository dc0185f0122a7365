//! HDF5 layout for Nihon Kohden EEG files.
//!
//! ```text
//! /                                  attrs: file_type, file_version, subject_id,
//!                                           start, end, age, sex, species
//! /intracranialEEG                   f32 [samples, channels], resizable
//!                                    attrs: units, filter_lowpass, filter_highpass,
//!                                           channel_count
//! /intracranialEEG_time_axis         u64 [samples], attrs: sample_rate, time_zone
//! /intracranialEEG_channellabel_axis str [channels]
//! /intracranialEEG_channelcoord_axis f32 [channels, 3]
//! ```
//!
//! The same four datasets exist for `scalpEEG`, `EKG` and `DCChannel`.

#[cfg(feature = "hdf5-support")]
use std::str::FromStr;
use std::path::Path;

#[cfg(feature = "hdf5-support")]
use hdf5::types::{H5Type, VarLenUnicode};
#[cfg(feature = "hdf5-support")]
use hdf5::{Dataset, File as H5File, Location};
#[cfg(feature = "hdf5-support")]
use log::debug;
#[cfg(feature = "hdf5-support")]
use ndarray::{Array2, ArrayView1, ArrayView2};

#[cfg(feature = "hdf5-support")]
use crate::error::NkError;
use crate::error::Result;
#[cfg(feature = "hdf5-support")]
use crate::series::{
    ChannelLabel, ElectricalSeries, FileAttributes, SeriesAttributes, COORD_DIMS, FILE_TYPE,
};
use crate::series::{NkFile, SeriesKind};
use crate::store::RecordingStore;

pub const TIME_AXIS_SUFFIX: &str = "_time_axis";
pub const CHANNEL_LABEL_AXIS_SUFFIX: &str = "_channellabel_axis";
pub const CHANNEL_COORD_AXIS_SUFFIX: &str = "_channelcoord_axis";

pub fn time_axis_name(kind: SeriesKind) -> String {
    format!("{}{}", kind.dataset_name(), TIME_AXIS_SUFFIX)
}

pub fn channel_label_axis_name(kind: SeriesKind) -> String {
    format!("{}{}", kind.dataset_name(), CHANNEL_LABEL_AXIS_SUFFIX)
}

pub fn channel_coord_axis_name(kind: SeriesKind) -> String {
    format!("{}{}", kind.dataset_name(), CHANNEL_COORD_AXIS_SUFFIX)
}

/// Stores [`NkFile`]s as HDF5 files.
#[derive(Debug, Clone)]
pub struct Hdf5Store {
    /// Rows per chunk of the resizable datasets
    pub chunk_rows: usize,
    /// Deflate level; `None` writes uncompressed chunks
    pub compression: Option<u8>,
}

impl Default for Hdf5Store {
    fn default() -> Self {
        Hdf5Store {
            chunk_rows: 4096,
            compression: None,
        }
    }
}

impl Hdf5Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, level: Option<u8>) -> Self {
        self.compression = level;
        self
    }
}

#[cfg(feature = "hdf5-support")]
impl RecordingStore for Hdf5Store {
    fn create(&self, path: &Path, file: &NkFile) -> Result<()> {
        let h5 = H5File::create(path)?;
        write_file_attributes(&h5, &file.attributes)?;

        for (kind, series) in &file.series {
            series.validate()?;
            self.write_series(&h5, *kind, series)?;
            debug!(
                "{}: wrote {} ({} x {})",
                path.display(),
                kind.dataset_name(),
                series.len(),
                series.channel_count()
            );
        }
        Ok(())
    }

    fn open(&self, path: &Path) -> Result<NkFile> {
        let h5 = open_validated(path)?;
        let mut file = NkFile::new(read_file_attributes(&h5)?);
        for kind in SeriesKind::ALL {
            if h5.link_exists(kind.dataset_name()) {
                file.insert(kind, read_series(&h5, kind)?);
            }
        }
        Ok(file)
    }

    fn open_series(&self, path: &Path, kind: SeriesKind) -> Result<(NkFile, ElectricalSeries)> {
        let h5 = open_validated(path)?;
        let file = NkFile::new(read_file_attributes(&h5)?);
        if !h5.link_exists(kind.dataset_name()) {
            return Err(NkError::missing("dataset", kind.dataset_name()));
        }
        let series = read_series(&h5, kind)?;
        Ok((file, series))
    }

    fn is_openable(&self, path: &Path) -> bool {
        path.is_file() && open_validated(path).is_ok()
    }

    fn format_name(&self) -> &str {
        "HDF5"
    }
}

#[cfg(not(feature = "hdf5-support"))]
impl RecordingStore for Hdf5Store {
    fn create(&self, _path: &Path, _file: &NkFile) -> Result<()> {
        Err(not_enabled())
    }

    fn open(&self, _path: &Path) -> Result<NkFile> {
        Err(not_enabled())
    }

    fn is_openable(&self, _path: &Path) -> bool {
        false
    }

    fn format_name(&self) -> &str {
        "HDF5"
    }
}

#[cfg(not(feature = "hdf5-support"))]
fn not_enabled() -> crate::error::NkError {
    crate::error::NkError::UnsupportedFormat(
        "HDF5 support not enabled. Rebuild with --features hdf5-support".to_string(),
    )
}

#[cfg(feature = "hdf5-support")]
impl Hdf5Store {
    fn write_series(&self, h5: &H5File, kind: SeriesKind, series: &ElectricalSeries) -> Result<()> {
        let attrs = &series.attributes;

        let data = self.write_2d(h5, kind.dataset_name(), series.data.view())?;
        set_attr_str(&data, "units", &attrs.units)?;
        set_attr(&data, "filter_lowpass", attrs.filter_lowpass)?;
        set_attr(&data, "filter_highpass", attrs.filter_highpass)?;
        set_attr(&data, "channel_count", attrs.channel_count as u64)?;

        let time_axis = self.write_1d(h5, &time_axis_name(kind), &series.time_axis)?;
        set_attr(&time_axis, "sample_rate", attrs.sample_rate)?;
        set_attr_str(&time_axis, "time_zone", &attrs.time_zone)?;

        let labels = series
            .channel_labels
            .iter()
            .map(|l| to_var_len_unicode(&l.encode()))
            .collect::<Result<Vec<_>>>()?;
        self.write_1d(h5, &channel_label_axis_name(kind), &labels)?;

        self.write_2d(h5, &channel_coord_axis_name(kind), series.channel_coords.view())?;
        Ok(())
    }

    fn write_1d<T: H5Type>(&self, h5: &H5File, name: &str, values: &[T]) -> Result<Dataset> {
        let mut builder = h5
            .new_dataset::<T>()
            .shape((values.len()..,))
            .chunk((self.chunk_rows,));
        if let Some(level) = self.compression {
            builder = builder.deflate(level);
        }
        let dataset = builder.create(name)?;
        if !values.is_empty() {
            dataset.write(ArrayView1::from(values))?;
        }
        Ok(dataset)
    }

    fn write_2d<T: H5Type>(&self, h5: &H5File, name: &str, values: ArrayView2<T>) -> Result<Dataset> {
        let (rows, cols) = values.dim();
        let mut builder = h5
            .new_dataset::<T>()
            .shape((rows.., cols..))
            .chunk((self.chunk_rows, cols.max(1)));
        if let Some(level) = self.compression {
            builder = builder.deflate(level);
        }
        let dataset = builder.create(name)?;
        if rows > 0 && cols > 0 {
            dataset.write(values)?;
        }
        Ok(dataset)
    }
}

#[cfg(feature = "hdf5-support")]
fn open_validated(path: &Path) -> Result<H5File> {
    let h5 = H5File::open(path)?;
    let file_type = read_attr_string(&h5, "file_type")?;
    if file_type != FILE_TYPE {
        return Err(NkError::UnsupportedFileType(format!(
            "{}: file_type is '{}', expected '{}'",
            path.display(),
            file_type,
            FILE_TYPE
        )));
    }
    Ok(h5)
}

#[cfg(feature = "hdf5-support")]
fn write_file_attributes(h5: &H5File, attrs: &FileAttributes) -> Result<()> {
    set_attr_str(h5, "file_type", &attrs.file_type)?;
    set_attr_str(h5, "file_version", &attrs.file_version)?;
    set_attr_str(h5, "subject_id", &attrs.subject_id)?;
    set_attr(h5, "start", attrs.start)?;
    set_attr(h5, "end", attrs.end)?;
    set_attr_str(h5, "age", &attrs.age)?;
    set_attr_str(h5, "sex", &attrs.sex)?;
    set_attr_str(h5, "species", &attrs.species)?;
    Ok(())
}

#[cfg(feature = "hdf5-support")]
fn read_file_attributes(h5: &H5File) -> Result<FileAttributes> {
    Ok(FileAttributes {
        subject_id: read_attr_string(h5, "subject_id")?,
        start: read_attr(h5, "start")?,
        end: read_attr(h5, "end")?,
        age: read_attr_string(h5, "age")?,
        sex: read_attr_string(h5, "sex")?,
        species: read_attr_string(h5, "species")?,
        file_type: read_attr_string(h5, "file_type")?,
        file_version: read_attr_string(h5, "file_version")?,
    })
}

#[cfg(feature = "hdf5-support")]
fn read_series(h5: &H5File, kind: SeriesKind) -> Result<ElectricalSeries> {
    let data_ds = dataset(h5, kind.dataset_name())?;
    let time_ds = dataset(h5, &time_axis_name(kind))?;
    let label_ds = dataset(h5, &channel_label_axis_name(kind))?;
    let coord_ds = dataset(h5, &channel_coord_axis_name(kind))?;

    let data = read_2d::<f32>(&data_ds)?;
    let time_axis = if time_ds.size() == 0 {
        Vec::new()
    } else {
        time_ds.read_raw::<u64>()?
    };
    let channel_labels = if label_ds.size() == 0 {
        Vec::new()
    } else {
        label_ds
            .read_raw::<VarLenUnicode>()?
            .iter()
            .map(|s| ChannelLabel::decode(s.as_str()))
            .collect()
    };
    let channel_coords = read_2d::<f32>(&coord_ds)?;

    let attributes = SeriesAttributes {
        units: read_attr_string(&data_ds, "units")?,
        sample_rate: read_attr(&time_ds, "sample_rate")?,
        time_zone: read_attr_string(&time_ds, "time_zone")?,
        filter_lowpass: read_attr(&data_ds, "filter_lowpass")?,
        filter_highpass: read_attr(&data_ds, "filter_highpass")?,
        channel_count: read_attr::<u64>(&data_ds, "channel_count")? as usize,
    };

    let channel_coords = if channel_coords.ncols() == COORD_DIMS {
        channel_coords
    } else {
        Array2::zeros((0, COORD_DIMS))
    };

    ElectricalSeries::new(data, time_axis, channel_labels, channel_coords, attributes)
}

#[cfg(feature = "hdf5-support")]
fn dataset(h5: &H5File, name: &str) -> Result<Dataset> {
    h5.dataset(name).map_err(|_| NkError::missing("dataset", name))
}

#[cfg(feature = "hdf5-support")]
fn read_2d<T: H5Type + Clone + Default>(ds: &Dataset) -> Result<Array2<T>> {
    let shape = ds.shape();
    let (rows, cols) = match shape.as_slice() {
        [r, c] => (*r, *c),
        _ => {
            return Err(NkError::InvalidFormat(format!(
                "{} is not two-dimensional", ds.name()
            )))
        }
    };
    if rows == 0 || cols == 0 {
        return Ok(Array2::default((rows, cols)));
    }
    Ok(ds.read_2d::<T>()?)
}

#[cfg(feature = "hdf5-support")]
fn set_attr<T: H5Type>(loc: &Location, name: &str, value: T) -> Result<()> {
    loc.new_attr::<T>().create(name)?.write_scalar(&value)?;
    Ok(())
}

#[cfg(feature = "hdf5-support")]
fn set_attr_str(loc: &Location, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    loc.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

#[cfg(feature = "hdf5-support")]
fn read_attr<T: H5Type>(loc: &Location, name: &str) -> Result<T> {
    let attr = loc.attr(name).map_err(|_| NkError::missing("attribute", name))?;
    Ok(attr.read_scalar::<T>()?)
}

#[cfg(feature = "hdf5-support")]
fn read_attr_string(loc: &Location, name: &str) -> Result<String> {
    let value: VarLenUnicode = read_attr(loc, name)?;
    Ok(value.to_string())
}

#[cfg(feature = "hdf5-support")]
fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| NkError::InvalidFormat(format!("'{}' is not a valid HDF5 string: {}", value, e)))
}
