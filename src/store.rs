use std::path::Path;

use crate::error::Result;
use crate::series::{ElectricalSeries, NkFile, SeriesKind};

/// Persistence for [`NkFile`]s. The pipelines only talk to this trait.
pub trait RecordingStore {
    /// Writes `file` to `path`, replacing anything already there.
    fn create(&self, path: &Path, file: &NkFile) -> Result<()>;

    fn open(&self, path: &Path) -> Result<NkFile>;

    /// Reads a single series. Stores that can address series individually
    /// should override this.
    fn open_series(&self, path: &Path, kind: SeriesKind) -> Result<(NkFile, ElectricalSeries)> {
        let mut file = self.open(path)?;
        let series = file.series(kind)?.clone();
        file.series.clear();
        Ok((file, series))
    }

    fn is_openable(&self, path: &Path) -> bool {
        self.open(path).is_ok()
    }

    fn format_name(&self) -> &str;
}
