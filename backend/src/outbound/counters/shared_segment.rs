//! Counter cache stored in a file segment shared between processes.
//!
//! Each operation takes the in-process mutex and then an exclusive advisory
//! lock on the segment file, so workers in other processes see every delta
//! atomically. The lock is held only for fixed-size positioned reads and
//! writes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs2::FileExt;
use tracing::{debug, info, warn};

use super::layout::{
    HEADER_LEN, SEGMENT_LEN, SegmentHeader, SegmentLayoutError, TABLE_LEN, decode_slot,
    decode_table, encode_table, slot_offset,
};
use crate::domain::ports::{CounterBacking, CounterCache, CounterCacheError};
use crate::domain::{CounterSnapshot, CounterTable, FeedbackType, Meal};

fn io_error(context: &str, path: &Path, err: io::Error) -> CounterCacheError {
    CounterCacheError::unavailable(format!("{context} {}: {err}", path.display()))
}

fn layout_error(path: &Path, err: SegmentLayoutError) -> CounterCacheError {
    CounterCacheError::invalid_segment(format!("{}: {err}", path.display()))
}

/// Counter cache backed by a shared segment file.
#[derive(Debug)]
pub struct SharedSegmentCounterCache {
    path: PathBuf,
    file: Mutex<File>,
    created: bool,
    remove_on_shutdown: bool,
}

impl SharedSegmentCounterCache {
    /// Attach to the segment at `path`, creating and zeroing it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CounterCacheError::Unavailable`] when the file cannot be
    /// opened or locked and [`CounterCacheError::InvalidSegment`] when an
    /// existing file carries a foreign or outdated layout.
    pub fn open(
        path: impl Into<PathBuf>,
        remove_on_shutdown: bool,
    ) -> Result<Self, CounterCacheError> {
        let path = path.into();
        let (file, created) = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => (file, true),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(&path)
                    .map_err(|err| io_error("failed to open counter segment", &path, err))?;
                (file, false)
            }
            Err(err) => return Err(io_error("failed to create counter segment", &path, err)),
        };

        let cache = Self {
            path,
            file: Mutex::new(file),
            created,
            remove_on_shutdown,
        };
        cache.with_segment(|file, path| Self::initialise_or_validate(file, path))?;
        info!(path = %cache.path.display(), created, "attached shared counter segment");
        Ok(cache)
    }

    /// Whether this handle created the segment file.
    pub fn created(&self) -> bool {
        self.created
    }

    fn guard(&self) -> Result<MutexGuard<'_, File>, CounterCacheError> {
        self.file
            .lock()
            .map_err(|_| CounterCacheError::unavailable("counter segment handle lock poisoned"))
    }

    /// Run `op` while holding both the handle mutex and the file lock.
    fn with_segment<T>(
        &self,
        op: impl FnOnce(&mut File, &Path) -> Result<T, CounterCacheError>,
    ) -> Result<T, CounterCacheError> {
        let mut file = self.guard()?;
        FileExt::lock_exclusive(&*file)
            .map_err(|err| io_error("failed to lock counter segment", &self.path, err))?;
        let result = op(&mut *file, &self.path);
        if let Err(err) = FileExt::unlock(&*file) {
            warn!(path = %self.path.display(), error = %err, "failed to unlock counter segment");
        }
        result
    }

    /// An empty file is a segment whose creator has not written it yet.
    fn initialise_or_validate(file: &mut File, path: &Path) -> Result<(), CounterCacheError> {
        let len = file
            .metadata()
            .map_err(|err| io_error("failed to stat counter segment", path, err))?
            .len();
        if len == 0 {
            debug!(path = %path.display(), "initialising empty counter segment");
            return Self::write_segment(file, path, &CounterTable::zeroed());
        }
        if len != SEGMENT_LEN as u64 {
            return Err(layout_error(path, SegmentLayoutError::Truncated { len }));
        }
        Self::read_table(file, path).map(|_| ())
    }

    fn write_segment(
        file: &mut File,
        path: &Path,
        table: &CounterTable,
    ) -> Result<(), CounterCacheError> {
        let mut bytes = [0_u8; SEGMENT_LEN];
        bytes[..HEADER_LEN].copy_from_slice(&SegmentHeader::CURRENT.encode());
        bytes[HEADER_LEN..].copy_from_slice(&encode_table(table));
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(&bytes))
            .map_err(|err| io_error("failed to write counter segment", path, err))
    }

    fn read_table(file: &mut File, path: &Path) -> Result<CounterTable, CounterCacheError> {
        let mut bytes = [0_u8; SEGMENT_LEN];
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_exact(&mut bytes))
            .map_err(|err| io_error("failed to read counter segment", path, err))?;

        let mut header = [0_u8; HEADER_LEN];
        header.copy_from_slice(&bytes[..HEADER_LEN]);
        SegmentHeader::decode(&header).map_err(|err| layout_error(path, err))?;

        let mut table = [0_u8; TABLE_LEN];
        table.copy_from_slice(&bytes[HEADER_LEN..]);
        Ok(decode_table(&table))
    }
}

impl CounterCache for SharedSegmentCounterCache {
    fn backing(&self) -> CounterBacking {
        CounterBacking::SharedSegment
    }

    fn apply_delta(
        &self,
        meal: Meal,
        feedback_type: FeedbackType,
        delta: i32,
    ) -> Result<i32, CounterCacheError> {
        self.with_segment(|file, path| {
            let offset = slot_offset(meal, feedback_type);
            let mut slot = [0_u8; 4];
            file.seek(SeekFrom::Start(offset))
                .and_then(|_| file.read_exact(&mut slot))
                .map_err(|err| io_error("failed to read counter slot", path, err))?;
            let value = decode_slot(&slot).saturating_add(delta);
            file.seek(SeekFrom::Start(offset))
                .and_then(|_| file.write_all(&value.to_le_bytes()))
                .map_err(|err| io_error("failed to write counter slot", path, err))?;
            Ok(value)
        })
    }

    fn snapshot(&self) -> Result<CounterSnapshot, CounterCacheError> {
        let table = self.with_segment(Self::read_table)?;
        Ok(table.to_snapshot())
    }

    fn replace(&self, table: &CounterTable) -> Result<(), CounterCacheError> {
        self.with_segment(|file, path| Self::write_segment(file, path, table))
    }

    fn shutdown(&self) -> Result<(), CounterCacheError> {
        self.with_segment(|file, path| {
            file.sync_data()
                .map_err(|err| io_error("failed to flush counter segment", path, err))
        })?;
        if self.created && self.remove_on_shutdown {
            fs::remove_file(&self.path)
                .map_err(|err| io_error("failed to remove counter segment", &self.path, err))?;
            info!(path = %self.path.display(), "removed shared counter segment");
        }
        Ok(())
    }
}
