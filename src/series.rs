//! In-memory model of an NK HDF5 file: root attributes plus one electrical
//! series per channel type.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array2, Axis};

use crate::channels::ChannelType;
use crate::error::{NkError, Result};

pub const FILE_TYPE: &str = "NK_EEG";
pub const FILE_VERSION: &str = "0.1.0";
pub const DEFAULT_UNITS: &str = "microvolts";
pub const DEFAULT_TIME_ZONE: &str = "US/Pacific";

/// Number of coordinates per contact in the coordinate axis
pub const COORD_DIMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKind {
    Ieeg,
    ScalpEeg,
    Ekg,
    Ttl,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 4] = [
        SeriesKind::Ieeg,
        SeriesKind::ScalpEeg,
        SeriesKind::Ekg,
        SeriesKind::Ttl,
    ];

    /// Key the series is addressed by in code and on the command line.
    pub fn map_name(&self) -> &'static str {
        match self {
            SeriesKind::Ieeg => "data_ieeg",
            SeriesKind::ScalpEeg => "data_scalpeeg",
            SeriesKind::Ekg => "data_ekg",
            SeriesKind::Ttl => "data_ttl",
        }
    }

    /// Dataset name inside the HDF5 file.
    pub fn dataset_name(&self) -> &'static str {
        match self {
            SeriesKind::Ieeg => "intracranialEEG",
            SeriesKind::ScalpEeg => "scalpEEG",
            SeriesKind::Ekg => "EKG",
            SeriesKind::Ttl => "DCChannel",
        }
    }

    /// EMG has no series and maps to `None`.
    pub fn for_channel_type(ty: ChannelType) -> Option<SeriesKind> {
        match ty {
            ChannelType::IntracranialEeg => Some(SeriesKind::Ieeg),
            ChannelType::ScalpEeg => Some(SeriesKind::ScalpEeg),
            ChannelType::Ekg => Some(SeriesKind::Ekg),
            ChannelType::Ttl => Some(SeriesKind::Ttl),
            ChannelType::Emg => None,
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        match self {
            SeriesKind::Ieeg => ChannelType::IntracranialEeg,
            SeriesKind::ScalpEeg => ChannelType::ScalpEeg,
            SeriesKind::Ekg => ChannelType::Ekg,
            SeriesKind::Ttl => ChannelType::Ttl,
        }
    }

    pub fn from_map_name(name: &str) -> Option<SeriesKind> {
        SeriesKind::ALL.into_iter().find(|k| k.map_name() == name)
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.map_name())
    }
}

/// One entry of the channel label axis, e.g. `["LA", "10"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLabel(pub Vec<String>);

impl ChannelLabel {
    /// Parts joined by a single space; cleaned names never contain spaces
    /// so [`ChannelLabel::decode`] restores the parts exactly.
    pub fn encode(&self) -> String {
        self.0.join(" ")
    }

    pub fn decode(s: &str) -> Self {
        ChannelLabel(s.split(' ').map(str::to_string).collect())
    }

    /// The cleaned channel name the label was split from.
    pub fn name(&self) -> String {
        self.0.concat()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesAttributes {
    pub units: String,
    pub sample_rate: f64,
    pub time_zone: String,
    pub filter_lowpass: f64,
    pub filter_highpass: f64,
    pub channel_count: usize,
}

impl Default for SeriesAttributes {
    fn default() -> Self {
        SeriesAttributes {
            units: DEFAULT_UNITS.to_string(),
            sample_rate: 0.0,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            filter_lowpass: 0.0,
            filter_highpass: 0.0,
            channel_count: 0,
        }
    }
}

/// Samples x channels data with its time and channel axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricalSeries {
    pub data: Array2<f32>,
    /// Absolute sample times, ns since the Unix epoch
    pub time_axis: Vec<u64>,
    pub channel_labels: Vec<ChannelLabel>,
    /// Channels x 3; zero rows when no coordinates are known
    pub channel_coords: Array2<f32>,
    pub attributes: SeriesAttributes,
}

impl ElectricalSeries {
    /// Checks that the axes agree with the data shape.
    pub fn new(
        data: Array2<f32>,
        time_axis: Vec<u64>,
        channel_labels: Vec<ChannelLabel>,
        channel_coords: Array2<f32>,
        attributes: SeriesAttributes,
    ) -> Result<Self> {
        let series = ElectricalSeries {
            data,
            time_axis,
            channel_labels,
            channel_coords,
            attributes,
        };
        series.validate()?;
        Ok(series)
    }

    pub fn empty(attributes: SeriesAttributes) -> Self {
        ElectricalSeries {
            data: Array2::zeros((0, attributes.channel_count)),
            time_axis: Vec::new(),
            channel_labels: Vec::new(),
            channel_coords: Array2::zeros((0, COORD_DIMS)),
            attributes,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (rows, channels) = self.data.dim();
        if rows != self.time_axis.len() {
            return Err(NkError::InvalidFormat(format!(
                "time axis has {} entries for {} samples", self.time_axis.len(), rows
            )));
        }
        if !self.channel_labels.is_empty() && self.channel_labels.len() != channels {
            return Err(NkError::ChannelMismatch {
                expected: channels,
                found: self.channel_labels.len(),
            });
        }
        if self.channel_coords.ncols() != COORD_DIMS {
            return Err(NkError::InvalidFormat(format!(
                "channel coordinates need {} columns, got {}", COORD_DIMS, self.channel_coords.ncols()
            )));
        }
        Ok(())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.data.ncols()
    }

    /// Appends the samples and times of `other`. An empty series adopts the
    /// channel count of the first non-empty one appended to it.
    pub fn append(&mut self, other: &ElectricalSeries) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() && self.channel_count() != other.channel_count() {
            self.data = Array2::zeros((0, other.channel_count()));
        }
        if self.channel_count() != other.channel_count() {
            return Err(NkError::ChannelMismatch {
                expected: self.channel_count(),
                found: other.channel_count(),
            });
        }
        self.data.append(Axis(0), other.data.view())?;
        self.time_axis.extend_from_slice(&other.time_axis);
        Ok(())
    }

    /// New series holding only the given sample rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> ElectricalSeries {
        ElectricalSeries {
            data: self.data.select(Axis(0), indices),
            time_axis: indices.iter().map(|&i| self.time_axis[i]).collect(),
            channel_labels: self.channel_labels.clone(),
            channel_coords: self.channel_coords.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileAttributes {
    pub subject_id: String,
    /// ns since the Unix epoch
    pub start: u64,
    pub end: u64,
    pub age: String,
    pub sex: String,
    pub species: String,
    pub file_type: String,
    pub file_version: String,
}

impl FileAttributes {
    pub fn new(subject_id: impl Into<String>, start: u64, end: u64) -> Self {
        FileAttributes {
            subject_id: subject_id.into(),
            start,
            end,
            ..Default::default()
        }
    }
}

impl Default for FileAttributes {
    fn default() -> Self {
        FileAttributes {
            subject_id: String::new(),
            start: 0,
            end: 0,
            age: String::new(),
            sex: "U".to_string(),
            species: "Homo sapiens".to_string(),
            file_type: FILE_TYPE.to_string(),
            file_version: FILE_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NkFile {
    pub attributes: FileAttributes,
    pub series: BTreeMap<SeriesKind, ElectricalSeries>,
}

impl NkFile {
    pub fn new(attributes: FileAttributes) -> Self {
        NkFile {
            attributes,
            series: BTreeMap::new(),
        }
    }

    pub fn series(&self, kind: SeriesKind) -> Result<&ElectricalSeries> {
        self.series
            .get(&kind)
            .ok_or_else(|| NkError::missing("series", kind.dataset_name()))
    }

    pub fn insert(&mut self, kind: SeriesKind, series: ElectricalSeries) {
        self.series.insert(kind, series);
    }

    /// Adds an empty series for every kind not present, so every file has
    /// the full layout.
    pub fn fill_empty_series(&mut self, attributes: &SeriesAttributes) {
        for kind in SeriesKind::ALL {
            self.series
                .entry(kind)
                .or_insert_with(|| ElectricalSeries::empty(attributes.clone()));
        }
    }
}
