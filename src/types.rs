use std::{fmt, marker::PhantomData, ops::Deref};

#[derive(Debug, thiserror::Error)]
#[error("invalid field value: {0}")]
pub struct InvalidFieldValue(MaybeAscii);

struct MaybeAscii(Vec<u8>);

impl MaybeAscii {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.is_ascii() => write!(f, "{s:?}"),
            _ => write!(f, "{:?}", self.0),
        }
    }
}

impl fmt::Display for MaybeAscii {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_value(f)
    }
}

impl fmt::Debug for MaybeAscii {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_value(f)
    }
}

/// ASCII character class.
///
/// # Safety
///
/// The `contains` function must return `true` only for ASCII bytes.
pub unsafe trait CharClass {
    fn contains(c: u8) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alpha;

unsafe impl CharClass for Alpha {
    fn contains(c: u8) -> bool {
        c.is_ascii_alphabetic()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Numeric;

unsafe impl CharClass for Numeric {
    fn contains(c: u8) -> bool {
        c.is_ascii_digit()
    }
}

/// Fixed-length field whose bytes all belong to the character class `C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed<C: CharClass, const N: usize> {
    data: [u8; N],
    class: PhantomData<C>,
}

impl<C: CharClass, const N: usize> Fixed<C, N> {
    pub fn new(value: impl AsRef<[u8]>) -> Result<Self, InvalidFieldValue> {
        let bytes = value.as_ref();
        if bytes.len() != N {
            return Err(InvalidFieldValue(MaybeAscii(bytes.to_owned())));
        }

        if !bytes.iter().copied().all(C::contains) {
            return Err(InvalidFieldValue(MaybeAscii(bytes.to_owned())));
        }

        let mut data = [0u8; N];
        data.copy_from_slice(bytes);

        Ok(Self {
            data,
            class: PhantomData,
        })
    }

    /// Validates the first `N` bytes of `value`, ignoring whatever follows.
    pub fn from_prefix(value: impl AsRef<[u8]>) -> Result<Self, InvalidFieldValue> {
        let bytes = value.as_ref();
        match bytes.get(..N) {
            Some(prefix) => Self::new(prefix),
            None => Err(InvalidFieldValue(MaybeAscii(bytes.to_owned()))),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_str(&self) -> &str {
        unsafe {
            // SAFETY: the character class `C` ensures that all bytes are in the
            //         ASCII range.
            std::str::from_utf8_unchecked(self.as_bytes())
        }
    }
}

impl<C: CharClass, const N: usize> Deref for Fixed<C, N> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl<C: CharClass, const N: usize> fmt::Display for Fixed<C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `YYYYMMDD` date digits.
pub type F8N = Fixed<Numeric, 8>;

/// `DDMMYY` expiry followed by `YYMMDD` birth date.
pub type F12N = Fixed<Numeric, 12>;

/// Two-letter province or state code.
pub type F2A = Fixed<Alpha, 2>;
