//! Binary mapper cache file.
//!
//! Big-endian, sequential:
//!
//! ```text
//! version      f64
//! lat_count    i32
//! lon_count    i32
//! lat_axis     f64 * lat_count
//! lon_axis     f64 * lon_count
//! entry_count  i32
//! entries      entry_count * {
//!     x        i32   lon index
//!     y        i32   lat index
//!     len      i32
//!     list     len * { index i32, distance f64 }
//! }
//! ```
//!
//! Entries are written in ascending (lat index, lon index) order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{RegridError, Result};
use crate::mapper::{IndexWithDistance, RegularGridMapper};

/// Version written to and accepted from cache files.
pub const CACHE_FORMAT_VERSION: f64 = 1.0;

fn to_i32(value: usize, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        RegridError::invalid_grid(format!("{} {} does not fit the cache format", field, value))
    })
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

fn write_f64<W: Write>(writer: &mut W, value: f64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_be_bytes(buf))
}

fn read_count<R: Read>(reader: &mut R, field: &'static str) -> Result<usize> {
    let value = read_i32(reader)?;
    usize::try_from(value).map_err(|_| RegridError::NegativeCount { field, value })
}

impl RegularGridMapper {
    /// Serialize the mapper.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        write_f64(&mut writer, CACHE_FORMAT_VERSION)?;
        write_i32(&mut writer, to_i32(self.lat_count(), "lat count")?)?;
        write_i32(&mut writer, to_i32(self.lon_count(), "lon count")?)?;
        for &lat in self.lat_axis() {
            write_f64(&mut writer, lat)?;
        }
        for &lon in self.lon_axis() {
            write_f64(&mut writer, lon)?;
        }

        write_i32(&mut writer, to_i32(self.mapped_points(), "entry count")?)?;
        for (&(lat_i, lon_i), candidates) in self.entries() {
            write_i32(&mut writer, to_i32(lon_i, "lon index")?)?;
            write_i32(&mut writer, to_i32(lat_i, "lat index")?)?;
            write_i32(&mut writer, to_i32(candidates.len(), "candidate count")?)?;
            for candidate in candidates {
                write_i32(&mut writer, to_i32(candidate.index, "cell index")?)?;
                write_f64(&mut writer, candidate.distance)?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Deserialize a mapper. Any version other than
    /// [`CACHE_FORMAT_VERSION`] is rejected.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let version = read_f64(&mut reader)?;
        if version != CACHE_FORMAT_VERSION {
            return Err(RegridError::UnsupportedVersion(version));
        }

        let lat_count = read_count(&mut reader, "lat count")?;
        let lon_count = read_count(&mut reader, "lon count")?;
        let lat_axis = (0..lat_count)
            .map(|_| read_f64(&mut reader))
            .collect::<Result<Vec<_>>>()?;
        let lon_axis = (0..lon_count)
            .map(|_| read_f64(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        let entry_count = read_count(&mut reader, "entry count")?;
        let mut mapping = BTreeMap::new();
        for _ in 0..entry_count {
            let lon_i = read_count(&mut reader, "lon index")?;
            let lat_i = read_count(&mut reader, "lat index")?;
            if lat_i >= lat_count || lon_i >= lon_count {
                return Err(RegridError::invalid_grid(format!(
                    "entry ({}, {}) outside {}x{} grid",
                    lat_i, lon_i, lat_count, lon_count
                )));
            }
            let len = read_count(&mut reader, "candidate count")?;
            let candidates = (0..len)
                .map(|_| -> Result<IndexWithDistance> {
                    let index = read_count(&mut reader, "cell index")?;
                    let distance = read_f64(&mut reader)?;
                    Ok(IndexWithDistance::new(index, distance))
                })
                .collect::<Result<Vec<_>>>()?;
            mapping.insert((lat_i, lon_i), candidates);
        }

        Ok(Self::from_parts(lat_axis, lon_axis, mapping))
    }

    /// Write the mapper to a cache file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        debug!(path = %path.display(), "Saved regular grid mapper");
        Ok(())
    }

    /// Read a mapper from a cache file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mapper = Self::read_from(BufReader::new(file))?;
        debug!(
            path = %path.display(),
            lat_count = mapper.lat_count(),
            lon_count = mapper.lon_count(),
            "Loaded regular grid mapper"
        );
        Ok(mapper)
    }
}
