use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::model::Event;

/// Records larger than this are treated as a corrupt length prefix.
const MAX_RECORD_LEN: usize = 64 * 1024;

/// Encode a single event to [len][bincode][crc32] format.
fn encode_event(event: &Event) -> io::Result<Vec<u8>> {
    let payload =
        bincode::serialize(event).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);
    let mut record = Vec::with_capacity(payload.len() + 8);
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&payload);
    record.extend_from_slice(&crc.to_le_bytes());
    Ok(record)
}

/// Storage under the log. `File` outside of tests.
pub trait LogFile: Write {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Valid records read back from a log, and where they end.
#[derive(Debug, Default)]
pub struct Replay {
    pub events: Vec<Event>,
    /// Byte length of the valid prefix. Anything after it is a torn or corrupt tail.
    pub valid_len: u64,
}

/// Append-only booking log.
///
/// Format per entry: `[u32: len][bincode: Event][u32: crc32]`
/// - `len` is the byte length of the bincode payload (not including the CRC).
/// - A truncated or corrupt tail (crash mid-write) is skipped on replay and cut
///   off by [`Wal::discard_tail`] before anything new is appended.
/// - A failed append is rolled back to the previous length. If the rollback
///   fails too, the log refuses further appends.
pub struct Wal<F: LogFile = File> {
    file: F,
    path: PathBuf,
    /// Bytes known to hold whole records.
    len: u64,
    appends: u64,
    failed: bool,
}

impl Wal {
    /// Open (or create) the log file at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::with_file(file, path, len))
    }

    /// Replay the log from disk. A missing file is an empty log.
    pub fn replay(path: &Path) -> io::Result<Replay> {
        match File::open(path) {
            Ok(f) => read_records(BufReader::new(f)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Replay::default()),
            Err(e) => Err(e),
        }
    }
}

impl<F: LogFile> Wal<F> {
    fn with_file(file: F, path: &Path, len: u64) -> Self {
        Self {
            file,
            path: path.to_path_buf(),
            len,
            appends: 0,
            failed: false,
        }
    }

    /// Append one event and fsync before returning. On error nothing from
    /// this record is left in the file.
    pub fn append(&mut self, event: &Event) -> io::Result<()> {
        if self.failed {
            return Err(io::Error::other("booking log unusable after a failed rollback"));
        }
        let record = encode_event(event)?;
        if let Err(e) = self.file.write_all(&record).and_then(|()| self.file.sync()) {
            if self.file.truncate(self.len).and_then(|()| self.file.sync()).is_err() {
                self.failed = true;
            }
            return Err(e);
        }
        self.len += record.len() as u64;
        self.appends += 1;
        Ok(())
    }

    /// Cut the file back to `valid_len`, returning how many bytes were dropped.
    pub fn discard_tail(&mut self, valid_len: u64) -> io::Result<u64> {
        if self.len <= valid_len {
            return Ok(0);
        }
        self.file.truncate(valid_len)?;
        self.file.sync()?;
        let dropped = self.len - valid_len;
        self.len = valid_len;
        Ok(dropped)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length in bytes of the records written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Events appended through this handle since it was opened.
    pub fn appends(&self) -> u64 {
        self.appends
    }

    #[cfg(test)]
    pub(crate) fn mark_failed(&mut self) {
        self.failed = true;
    }
}

/// Read records until EOF or the first torn or corrupt one.
fn read_records(mut reader: impl Read) -> io::Result<Replay> {
    let mut replay = Replay::default();
    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_RECORD_LEN {
            break;
        }

        let mut payload = vec![0u8; len];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break, // truncated
            Err(e) => return Err(e),
        }

        let mut crc_buf = [0u8; 4];
        match reader.read_exact(&mut crc_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break, // truncated
            Err(e) => return Err(e),
        }
        if u32::from_le_bytes(crc_buf) != crc32fast::hash(&payload) {
            break;
        }

        match bincode::deserialize::<Event>(&payload) {
            Ok(event) => replay.events.push(event),
            Err(_) => break, // corrupt payload
        }
        replay.valid_len += (len + 8) as u64;
    }
    Ok(replay)
}
