// src/class_file.rs

//! Minimal class file header reader
//!
//! Output paths are derived from the name a class declares for itself, not
//! from where it was read, because a transformer may rename it. Only the
//! prefix of the class file up to `this_class` is parsed:
//!
//! ```text
//! u4 magic (0xCAFEBABE)
//! u2 minor_version
//! u2 major_version
//! u2 constant_pool_count
//! cp_info constant_pool[constant_pool_count - 1]
//! u2 access_flags
//! u2 this_class
//! ```

use crate::error::{Error, Result};

/// Magic number at the start of every class file
const MAGIC: u32 = 0xCAFE_BABE;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// Constant pool slots the header reader cares about
#[derive(Debug, Clone)]
enum Constant<'a> {
    Utf8(&'a [u8]),
    Class { name_index: u16 },
    Other,
    /// Second slot of a long or double
    Unusable,
}

/// Header fields read from a class payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Binary name, e.g. `com/example/Foo$Inner`
    pub name: String,
}

impl ClassHeader {
    /// Parse the header of a class payload
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.u4()?;
        if magic != MAGIC {
            return Err(Error::ClassFormat(format!(
                "bad magic 0x{:08X}, expected 0x{:08X}",
                magic, MAGIC
            )));
        }

        let minor_version = reader.u2()?;
        let major_version = reader.u2()?;
        let pool = read_constant_pool(&mut reader)?;
        let access_flags = reader.u2()?;
        let this_class = reader.u2()?;

        let name_index = match pool.get(this_class as usize) {
            Some(Constant::Class { name_index }) => *name_index,
            _ => {
                return Err(Error::ClassFormat(format!(
                    "this_class #{} is not a class constant",
                    this_class
                )));
            }
        };
        let name = match pool.get(name_index as usize) {
            Some(Constant::Utf8(raw)) => decode_modified_utf8(raw)?,
            _ => {
                return Err(Error::ClassFormat(format!(
                    "class name #{} is not a utf8 constant",
                    name_index
                )));
            }
        };

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            name,
        })
    }

    /// Path of this class inside a classpath element
    pub fn entry_path(&self) -> String {
        format!("{}{}", self.name, crate::classpath::CLASS_SUFFIX)
    }
}

/// Index 0 of the returned pool is a placeholder; valid indices start at 1.
fn read_constant_pool<'a>(reader: &mut ByteReader<'a>) -> Result<Vec<Constant<'a>>> {
    let count = reader.u2()? as usize;
    if count == 0 {
        return Err(Error::ClassFormat("constant pool count is zero".to_string()));
    }

    let mut pool = Vec::with_capacity(count);
    pool.push(Constant::Unusable);

    while pool.len() < count {
        let tag = reader.u1()?;
        match tag {
            TAG_UTF8 => {
                let len = reader.u2()? as usize;
                pool.push(Constant::Utf8(reader.take(len)?));
            }
            TAG_CLASS => {
                let name_index = reader.u2()?;
                pool.push(Constant::Class { name_index });
            }
            TAG_LONG | TAG_DOUBLE => {
                reader.skip(8)?;
                pool.push(Constant::Other);
                pool.push(Constant::Unusable);
            }
            TAG_INTEGER | TAG_FLOAT | TAG_FIELDREF | TAG_METHODREF | TAG_INTERFACE_METHODREF
            | TAG_NAME_AND_TYPE | TAG_DYNAMIC | TAG_INVOKE_DYNAMIC => {
                reader.skip(4)?;
                pool.push(Constant::Other);
            }
            TAG_METHOD_HANDLE => {
                reader.skip(3)?;
                pool.push(Constant::Other);
            }
            TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => {
                reader.skip(2)?;
                pool.push(Constant::Other);
            }
            _ => {
                return Err(Error::ClassFormat(format!(
                    "unknown constant pool tag {} at index {}",
                    tag,
                    pool.len()
                )));
            }
        }
    }

    Ok(pool)
}

/// Decode the JVM's modified UTF-8
///
/// Differs from standard UTF-8 in encoding NUL as two bytes and
/// supplementary characters as surrogate pairs, so decoding goes through
/// UTF-16 code units.
fn decode_modified_utf8(raw: &[u8]) -> Result<String> {
    if let Ok(s) = std::str::from_utf8(raw) {
        return Ok(s.to_string());
    }

    let invalid = || Error::ClassFormat("invalid modified utf8 in class name".to_string());
    let mut units = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b0 = raw[i] as u16;
        if b0 & 0x80 == 0 {
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *raw.get(i + 1).ok_or_else(invalid)? as u16;
            units.push(((b0 & 0x1F) << 6) | (b1 & 0x3F));
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = *raw.get(i + 1).ok_or_else(invalid)? as u16;
            let b2 = *raw.get(i + 2).ok_or_else(invalid)? as u16;
            units.push(((b0 & 0x0F) << 12) | ((b1 & 0x3F) << 6) | (b2 & 0x3F));
            i += 3;
        } else {
            return Err(invalid());
        }
    }

    String::from_utf16(&units).map_err(|_| invalid())
}

/// Big-endian cursor over a byte slice
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => {
                let bytes: &'a [u8] = self.bytes;
                let slice = &bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(Error::ClassFormat(format!(
                "truncated at offset {} (wanted {} more bytes, {} available)",
                self.pos,
                len,
                self.bytes.len() - self.pos
            ))),
        }
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn u1(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u2(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u4(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}
