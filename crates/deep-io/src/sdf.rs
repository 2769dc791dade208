//! Simple deep file (`.sdf`) format support.
//!
//! A compact binary container for a [`DeepImage`]: header, channel lists,
//! per-pixel sample indices and the channel store. All integers are `i32`
//! and all samples `f32`, in native byte order.
//!
//! # Layout
//!
//! ```text
//! i32 version             FORMAT_VERSION
//! i32 width, height
//! i32 num_elements       informational, channels carry their own counts
//! name\0 name\0 ... \n    channel store names, store order
//! name\0 name\0 ... \n    channel names, declared order
//! per pixel, row-major:   i32 index ... i32 -1
//! per store channel:      i32 count, count x f32
//! ```
//!
//! Store order is byte-wise ascending by name.
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_io::sdf;
//!
//! sdf::write("scene.sdf", &deep)?;
//! let back = sdf::read("scene.sdf")?;
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, NativeEndian, ReadBytesExt, WriteBytesExt};
use deep_core::DeepImage;
use tracing::debug;

use crate::{DeepReader, DeepWriter, IoError, IoResult};

/// Newest format version this library reads and the version it writes.
pub const FORMAT_VERSION: i32 = 1;

/// Terminates each pixel's index list.
const INDEX_END: i32 = -1;

/// Terminates a channel name list.
const LIST_END: u8 = b'\n';

/// Upper bound on a single channel name, guards against runaway reads.
const MAX_NAME_LEN: usize = 4096;

/// Largest raster the reader accepts.
const MAX_PIXELS: usize = 1 << 31;

// === SdfReader ===

/// `.sdf` reader.
///
/// Decoding validates as it reads; a file that breaks any [`DeepImage`]
/// invariant yields [`IoError::DecodeError`] and no image.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdfReader;

impl SdfReader {
    /// Creates a new reader.
    pub fn new() -> Self {
        Self
    }

    fn read_from<R: Read>(&self, reader: &mut R) -> IoResult<DeepImage> {
        let version = read_i32(reader)?;
        if version > FORMAT_VERSION {
            return Err(IoError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }
        if version < 1 {
            return Err(IoError::decode(format!("invalid version {version}")));
        }

        let width = read_dim(reader, "width")?;
        let height = read_dim(reader, "height")?;
        // Informational only; every channel carries its own count.
        let header_elements = read_i32(reader)?;

        let pixels = (width as usize)
            .checked_mul(height as usize)
            .filter(|&p| p <= MAX_PIXELS)
            .ok_or_else(|| IoError::decode(format!("image size {width}x{height} too large")))?;

        let store_names = read_name_list(reader)?;
        let declared = read_name_list(reader)?;
        check_name_sets(&store_names, &declared)?;

        debug!(version, width, height, header_elements, channels = ?declared, "reading sdf");

        // Grown as read: the header size is not trusted for allocation.
        let mut index = Vec::new();
        for pixel in 0..pixels {
            let mut list = Vec::new();
            loop {
                let i = read_i32(reader)?;
                if i == INDEX_END {
                    break;
                }
                let i = u32::try_from(i)
                    .map_err(|_| IoError::decode(format!("pixel {pixel}: negative index {i}")))?;
                list.push(i);
            }
            index.push(list);
        }

        let mut store = BTreeMap::new();
        let mut elements: Option<usize> = None;
        for name in store_names {
            let values = read_channel(reader, &name)?;
            match elements {
                None => elements = Some(values.len()),
                Some(n) if n != values.len() => {
                    return Err(IoError::decode(format!(
                        "channel \"{name}\" holds {} samples, other channels hold {n}",
                        values.len()
                    )));
                }
                Some(_) => {}
            }
            store.insert(name, values);
        }

        let elements = elements.unwrap_or(0);
        if usize::try_from(header_elements).ok() != Some(elements) {
            debug!(header_elements, elements, "sdf header element count disagrees with channel data");
        }

        DeepImage::from_parts(width, height, declared, store, index)
            .map_err(|e| IoError::decode(e.to_string()))
    }
}

impl DeepReader for SdfReader {
    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<DeepImage> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        self.read_from(&mut reader)
    }

    fn read_from_memory(&self, data: &[u8]) -> IoResult<DeepImage> {
        let mut cursor = Cursor::new(data);
        self.read_from(&mut cursor)
    }
}

// === SdfWriter ===

/// `.sdf` writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdfWriter;

impl SdfWriter {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self
    }

    fn write_to<W: Write>(&self, writer: &mut W, image: &DeepImage) -> IoResult<()> {
        let num_elements = to_i32(image.num_elements(), "element count")?;
        debug!(
            width = image.width(),
            height = image.height(),
            num_elements,
            "writing sdf"
        );

        writer.write_i32::<NativeEndian>(FORMAT_VERSION)?;
        writer.write_i32::<NativeEndian>(to_i32(image.width() as usize, "width")?)?;
        writer.write_i32::<NativeEndian>(to_i32(image.height() as usize, "height")?)?;
        writer.write_i32::<NativeEndian>(num_elements)?;

        write_name_list(writer, image.channel_names())?;
        write_name_list(writer, image.channel_names_in_order().iter().map(String::as_str))?;

        for list in image.index_lists() {
            for &i in list {
                writer.write_i32::<NativeEndian>(i as i32)?;
            }
            writer.write_i32::<NativeEndian>(INDEX_END)?;
        }

        for (_, values) in image.channel_store() {
            writer.write_i32::<NativeEndian>(num_elements)?;
            for &v in values {
                writer.write_f32::<NativeEndian>(v)?;
            }
        }
        Ok(())
    }
}

impl DeepWriter for SdfWriter {
    fn write<P: AsRef<Path>>(&self, path: P, image: &DeepImage) -> IoResult<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, image)?;
        writer.flush().map_err(|e| IoError::encode(e.to_string()))?;
        Ok(())
    }

    fn write_to_memory(&self, image: &DeepImage) -> IoResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, image)?;
        Ok(buffer)
    }
}

// === Convenience Functions ===

/// Reads an `.sdf` file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<DeepImage> {
    SdfReader::new().read(path)
}

/// Writes a deep image to an `.sdf` file.
pub fn write<P: AsRef<Path>>(path: P, image: &DeepImage) -> IoResult<()> {
    SdfWriter::new().write(path, image)
}

// === Internal Functions ===

fn read_i32<R: Read>(reader: &mut R) -> IoResult<i32> {
    reader
        .read_i32::<NativeEndian>()
        .map_err(|e| IoError::decode(e.to_string()))
}

fn read_u8<R: Read>(reader: &mut R) -> IoResult<u8> {
    reader.read_u8().map_err(|e| IoError::decode(e.to_string()))
}

/// Reads one channel's count and samples.
///
/// The buffer grows with the bytes actually present, so a corrupt count
/// fails at end of input instead of allocating up front.
fn read_channel<R: Read>(reader: &mut R, name: &str) -> IoResult<Vec<f32>> {
    let count = read_i32(reader)?;
    let count = u64::try_from(count)
        .map_err(|_| IoError::decode(format!("channel \"{name}\": negative sample count {count}")))?;

    let expected = count * 4;
    let mut bytes = Vec::new();
    reader
        .by_ref()
        .take(expected)
        .read_to_end(&mut bytes)
        .map_err(|e| IoError::decode(e.to_string()))?;
    if bytes.len() as u64 != expected {
        return Err(IoError::decode(format!(
            "channel \"{name}\": expected {count} samples, file ends after {}",
            bytes.len() / 4
        )));
    }

    let mut values = vec![0.0f32; bytes.len() / 4];
    NativeEndian::read_f32_into(&bytes, &mut values);
    Ok(values)
}

fn read_dim<R: Read>(reader: &mut R, what: &str) -> IoResult<u32> {
    let v = read_i32(reader)?;
    u32::try_from(v).map_err(|_| IoError::decode(format!("negative {what} {v}")))
}

/// Reads NUL-terminated names until a newline follows a terminator.
fn read_name_list<R: Read>(reader: &mut R) -> IoResult<Vec<String>> {
    let mut names = Vec::new();
    let mut current = Vec::new();
    loop {
        let b = read_u8(reader)?;
        if b != 0 {
            if current.len() == MAX_NAME_LEN {
                return Err(IoError::decode("channel name too long"));
            }
            current.push(b);
            continue;
        }

        let name = String::from_utf8(std::mem::take(&mut current))
            .map_err(|e| IoError::decode(format!("channel name is not UTF-8: {e}")))?;
        names.push(name);

        match read_u8(reader)? {
            LIST_END => return Ok(names),
            0 => return Err(IoError::decode("empty channel name")),
            next => current.push(next),
        }
    }
}

fn write_name_list<'a, W: Write>(writer: &mut W, names: impl Iterator<Item = &'a str>) -> IoResult<()> {
    for name in names {
        writer.write_all(name.as_bytes())?;
        writer.write_u8(0)?;
    }
    writer.write_u8(LIST_END)?;
    Ok(())
}

fn check_name_sets(store: &[String], declared: &[String]) -> IoResult<()> {
    let store_set: BTreeSet<&str> = store.iter().map(String::as_str).collect();
    let declared_set: BTreeSet<&str> = declared.iter().map(String::as_str).collect();
    if store_set.len() != store.len() {
        return Err(IoError::decode("duplicate channel in store list"));
    }
    if store_set != declared_set {
        return Err(IoError::decode(format!(
            "store channels {store:?} differ from declared channels {declared:?}"
        )));
    }
    Ok(())
}

fn to_i32(v: usize, what: &str) -> IoResult<i32> {
    i32::try_from(v).map_err(|_| IoError::encode(format!("{what} {v} exceeds i32")))
}
