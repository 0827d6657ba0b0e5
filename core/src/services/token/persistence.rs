//! On-disk key ring snapshot
//!
//! Big-endian layout:
//!
//! ```text
//! active_slot:i32  next_rotation_at:i64
//! per slot: present:i32 [expires_at:i64 key_len:i32 key_bytes]
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::entities::ExpiringSecretKey;
use crate::errors::{DomainError, DomainResult};

use super::key_ring::RingState;

/// Upper bound accepted for a stored key length
const MAX_STORED_KEY_LENGTH: usize = 1024;

/// The local key ring file
#[derive(Debug, Clone)]
pub struct KeyRingFile {
    path: PathBuf,
}

impl KeyRingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ring back
    ///
    /// # Returns
    /// * `Ok(None)` - No file yet
    /// * `Ok(Some(state))` - Restored ring with exactly `ring_size` slots
    /// * `Err(DomainError::Persistence)` - Unreadable, truncated or trailing data
    pub fn load(&self, ring_size: usize) -> DomainResult<Option<RingState>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut reader = ByteReader::new(&bytes);
        let active_slot = reader.read_i32()?;
        if active_slot < 0 || active_slot as usize >= ring_size {
            return Err(corrupt(format!("active slot {} out of range", active_slot)));
        }
        let next_rotation_at = reader.read_i64()?;

        let mut slots = Vec::with_capacity(ring_size);
        for _ in 0..ring_size {
            match reader.read_i32()? {
                0 => slots.push(None),
                1 => {
                    let expires_at = reader.read_i64()?;
                    let len = reader.read_i32()?;
                    if len < 0 || len as usize > MAX_STORED_KEY_LENGTH {
                        return Err(corrupt(format!("key length {}", len)));
                    }
                    let key = reader.read_bytes(len as usize)?;
                    slots.push(Some(ExpiringSecretKey::new(key.to_vec(), expires_at)));
                }
                flag => return Err(corrupt(format!("slot presence flag {}", flag))),
            }
        }

        if !reader.is_exhausted() {
            return Err(corrupt("trailing bytes".to_string()));
        }

        Ok(Some(RingState {
            active_slot: active_slot as usize,
            next_rotation_at,
            slots,
        }))
    }

    /// Write the ring to `<file>.tmp`, flush it to disk and rename it over
    /// the live file
    pub fn save(&self, state: &RingState) -> DomainResult<()> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.tmp_path();
        let mut file = File::create(&tmp)?;
        file.write_all(&encode(state)?)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;

        // The rename itself is only durable once the directory entry is
        #[cfg(unix)]
        if let Some(parent) = parent {
            File::open(parent)?.sync_all()?;
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn encode(state: &RingState) -> DomainResult<Vec<u8>> {
    let mut out = Vec::with_capacity(16 + state.slots.len() * 40);
    out.extend_from_slice(&to_i32(state.active_slot)?.to_be_bytes());
    out.extend_from_slice(&state.next_rotation_at.to_be_bytes());
    for slot in &state.slots {
        match slot {
            None => out.extend_from_slice(&0i32.to_be_bytes()),
            Some(key) => {
                out.extend_from_slice(&1i32.to_be_bytes());
                out.extend_from_slice(&key.expires_at().to_be_bytes());
                out.extend_from_slice(&to_i32(key.key_bytes().len())?.to_be_bytes());
                out.extend_from_slice(key.key_bytes());
            }
        }
    }
    Ok(out)
}

fn to_i32(value: usize) -> DomainResult<i32> {
    i32::try_from(value).map_err(|_| DomainError::Persistence {
        message: format!("value {} does not fit the key ring file", value),
    })
}

fn corrupt(detail: String) -> DomainError {
    DomainError::Persistence {
        message: format!("corrupt key ring file: {}", detail),
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> DomainResult<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let out = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(out)
            }
            None => Err(corrupt("unexpected end of file".to_string())),
        }
    }

    fn read_i32(&mut self) -> DomainResult<i32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.read_bytes(4)?);
        Ok(i32::from_be_bytes(buf))
    }

    fn read_i64(&mut self) -> DomainResult<i64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.read_bytes(8)?);
        Ok(i64::from_be_bytes(buf))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
