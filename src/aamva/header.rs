//! PDF417 file header preceding the first AAMVA subfile.
//!
//! `@\n\x1e\rANSI ` + issuer id (6) + version (2) + jurisdiction version (2)
//! + entry count (2), then one designator per subfile, then the first subfile
//! type immediately followed by its first data element.
use std::{
    borrow::Cow,
    io::{self, BufRead},
};

/// Marker that opens the header, after the compliance indicator and separators.
pub const FILE_TYPE: &str = "ANSI ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub issuer_id: u32,
    pub version: u8,
    pub jurisdiction_version: u8,
    pub entry_count: u8,
}

impl Header {
    /// Decodes the header fields that follow [`FILE_TYPE`].
    pub fn decode(reader: &mut impl BufRead) -> io::Result<Self> {
        Ok(Self {
            issuer_id: decode_digits(read_array::<6>(reader)?)? as u32,
            version: decode_digits(read_array::<2>(reader)?)? as u8,
            jurisdiction_version: decode_digits(read_array::<2>(reader)?)? as u8,
            entry_count: decode_digits(read_array::<2>(reader)?)? as u8,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubfileDesignator {
    pub subfile_type: [u8; 2],
    pub offset: u64,
    pub length: u64,
}

impl SubfileDesignator {
    pub fn decode(reader: &mut impl BufRead) -> io::Result<Self> {
        Ok(Self {
            subfile_type: read_subfile_type(reader)?,
            offset: decode_digits(read_array::<4>(reader)?)?,
            length: decode_digits(read_array::<4>(reader)?)?,
        })
    }
}

/// Header and designators found at the start of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub header: Header,
    pub designators: Vec<SubfileDesignator>,

    /// Byte offset in the payload where the first data element starts.
    pub body_start: usize,
}

impl FileHeader {
    /// Locates and decodes the file header, if the payload carries one.
    pub fn find(payload: &str) -> Option<Self> {
        let start = payload.find(FILE_TYPE)? + FILE_TYPE.len();
        let mut reader = io::Cursor::new(&payload.as_bytes()[start..]);

        let header = Header::decode(&mut reader).ok()?;
        let mut designators = Vec::with_capacity(header.entry_count as usize);
        for _ in 0..header.entry_count {
            designators.push(SubfileDesignator::decode(&mut reader).ok()?);
        }

        let subfile_type = read_subfile_type(&mut reader).ok()?;
        if let Some(first) = designators.first() {
            if first.subfile_type != subfile_type {
                return None;
            }
        }

        Some(Self {
            header,
            designators,
            body_start: start + reader.position() as usize,
        })
    }
}

/// Drops the file header so the first data element starts a line.
///
/// Payloads without a decodable header are returned unchanged.
pub fn strip_file_header(payload: &str) -> Cow<'_, str> {
    match FileHeader::find(payload) {
        Some(file) => {
            tracing::debug!(
                issuer_id = file.header.issuer_id,
                version = file.header.version,
                subfiles = file.designators.len(),
                "stripped AAMVA file header"
            );
            // Every byte consumed by the header is ASCII.
            Cow::Borrowed(&payload[file.body_start..])
        }
        None => Cow::Borrowed(payload),
    }
}

fn read_array<const N: usize>(reader: &mut impl BufRead) -> io::Result<[u8; N]> {
    let mut buffer = [0; N];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

fn read_subfile_type(reader: &mut impl BufRead) -> io::Result<[u8; 2]> {
    let subfile_type = read_array(reader)?;
    if subfile_type.iter().all(u8::is_ascii_uppercase) {
        Ok(subfile_type)
    } else {
        Err(io::ErrorKind::InvalidData.into())
    }
}

fn decode_digit(d: u8) -> io::Result<u64> {
    if d.is_ascii_digit() {
        Ok((d - b'0') as u64)
    } else {
        Err(io::ErrorKind::InvalidData.into())
    }
}

fn decode_digits<const N: usize>(digits: [u8; N]) -> io::Result<u64> {
    digits
        .into_iter()
        .try_fold(0u64, |acc, d| Ok(acc * 10 + decode_digit(d)?))
}
