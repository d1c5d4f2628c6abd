use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use std::fmt;
use thiserror::Error as ThisError;

/// Byte separating the key from the value in a raw transaction.
pub const DELIMITER: u8 = b'=';

/// Gas requested by every transaction. No metering is performed.
pub const GAS_WANTED: i64 = 1;

/// Longest key accepted in a transaction or decoded from storage.
pub const MAX_KEY_LEN: usize = 1024;

/// Longest value accepted in a transaction or decoded from storage.
pub const MAX_VALUE_LEN: usize = 64 * 1024;

/// Outcome of checking a transaction for admission.
///
/// These are the only codes the state machine ever produces for `CheckTx` and
/// `DeliverTx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Code {
    /// The transaction may be applied.
    Valid = 0,
    /// The transaction is not of the form `key=value` or a part is too long.
    Malformed = 1,
    /// The key is already mapped to exactly this value.
    Duplicate = 2,
}

impl Code {
    pub fn is_valid(self) -> bool {
        self == Code::Valid
    }
}

impl From<Code> for u32 {
    fn from(code: Code) -> Self {
        code as u32
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Valid => write!(f, "valid"),
            Code::Malformed => write!(f, "malformed"),
            Code::Duplicate => write!(f, "duplicate"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ParseError {
    #[error("expected exactly one delimiter, found {found}")]
    Delimiters { found: usize },
    #[error("{field} is {len} bytes (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl From<ParseError> for Code {
    fn from(_: ParseError) -> Self {
        Code::Malformed
    }
}

/// A key in the replicated store.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.as_bytes().to_vec())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", String::from_utf8_lossy(&self.0))
    }
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(Vec::<u8>::read_range(reader, 0..=MAX_KEY_LEN)?))
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        self.0.encode_size()
    }
}

/// A `key=value` assignment decoded from raw transaction bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub key: Key,
    pub value: Vec<u8>,
}

impl Transaction {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: Key::new(key),
            value: value.into(),
        }
    }

    /// Decode raw transaction bytes.
    ///
    /// Splitting on [DELIMITER] must yield exactly two parts. Either part may be
    /// empty, so `"=v"`, `"k="` and `"="` are all well formed. Parts longer than
    /// [MAX_KEY_LEN] or [MAX_VALUE_LEN] could never be read back from storage and
    /// are rejected here.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let mut parts = raw.split(|byte| *byte == DELIMITER);
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => {
                return Err(ParseError::Delimiters {
                    found: raw.iter().filter(|byte| **byte == DELIMITER).count(),
                })
            }
        };
        if key.len() > MAX_KEY_LEN {
            return Err(ParseError::TooLong {
                field: "key",
                len: key.len(),
                max: MAX_KEY_LEN,
            });
        }
        if value.len() > MAX_VALUE_LEN {
            return Err(ParseError::TooLong {
                field: "value",
                len: value.len(),
                max: MAX_VALUE_LEN,
            });
        }
        Ok(Self {
            key: Key::from(key),
            value: value.to_vec(),
        })
    }

    /// Raw bytes accepted by [Transaction::parse].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.key.as_ref().len() + 1 + self.value.len());
        raw.extend_from_slice(self.key.as_ref());
        raw.push(DELIMITER);
        raw.extend_from_slice(&self.value);
        raw
    }
}

/// A value held by the durable store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Bytes assigned to a user key (tag 0).
    Entry(Vec<u8>),

    /// Marker written alongside each published block (tag 1).
    Commit { height: u64 },
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Entry(bytes) => {
                0u8.write(writer);
                bytes.write(writer);
            }
            Self::Commit { height } => {
                1u8.write(writer);
                height.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Entry(Vec::<u8>::read_range(
                reader,
                0..=MAX_VALUE_LEN,
            )?)),
            1 => Ok(Self::Commit {
                height: u64::read(reader)?,
            }),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Entry(bytes) => bytes.encode_size(),
            Self::Commit { height } => height.encode_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};
    use proptest::prelude::*;

    #[test]
    fn test_parse_exact_shapes() {
        let tx = Transaction::parse(b"a=b").unwrap();
        assert_eq!(tx.key, Key::from("a"));
        assert_eq!(tx.value, b"b".to_vec());

        assert_eq!(
            Transaction::parse(b"ab"),
            Err(ParseError::Delimiters { found: 0 })
        );
        assert_eq!(
            Transaction::parse(b"a=b=c"),
            Err(ParseError::Delimiters { found: 2 })
        );
    }

    #[test]
    fn test_parse_empty_parts() {
        let tx = Transaction::parse(b"=v").unwrap();
        assert_eq!(tx.key, Key::default());
        assert_eq!(tx.value, b"v".to_vec());

        let tx = Transaction::parse(b"k=").unwrap();
        assert!(tx.value.is_empty());

        let tx = Transaction::parse(b"=").unwrap();
        assert_eq!(tx, Transaction::new(Vec::new(), Vec::new()));

        assert!(Transaction::parse(b"").is_err());
        assert!(Transaction::parse(b"==").is_err());
    }

    #[test]
    fn test_parse_enforces_length_limits() {
        let mut raw = vec![b'k'; MAX_KEY_LEN];
        raw.push(DELIMITER);
        raw.extend(vec![b'v'; MAX_VALUE_LEN]);
        assert!(Transaction::parse(&raw).is_ok());

        let long_key = [vec![b'k'; MAX_KEY_LEN + 1], b"=v".to_vec()].concat();
        assert_eq!(
            Transaction::parse(&long_key),
            Err(ParseError::TooLong {
                field: "key",
                len: MAX_KEY_LEN + 1,
                max: MAX_KEY_LEN,
            })
        );

        let long_value = [b"k=".to_vec(), vec![b'v'; MAX_VALUE_LEN + 1]].concat();
        let err = Transaction::parse(&long_value).unwrap_err();
        assert!(matches!(err, ParseError::TooLong { field: "value", .. }));
        assert_eq!(Code::from(err), Code::Malformed);
    }

    #[test]
    fn test_decode_rejects_oversized_payloads() {
        let entry = Value::Entry(vec![0u8; MAX_VALUE_LEN]);
        assert_eq!(Value::decode(entry.encode()).unwrap(), entry);

        let oversized = Value::Entry(vec![0u8; MAX_VALUE_LEN + 1]);
        assert!(Value::decode(oversized.encode()).is_err());

        let key = Key::new(vec![b'k'; MAX_KEY_LEN + 1]);
        assert!(Key::decode(key.encode()).is_err());
    }

    #[test]
    fn test_to_bytes_matches_parse() {
        let tx = Transaction::new("color", "blue");
        assert_eq!(tx.to_bytes(), b"color=blue".to_vec());
        assert_eq!(Transaction::parse(&tx.to_bytes()).unwrap(), tx);
    }

    #[test]
    fn test_code_numbering() {
        assert_eq!(u32::from(Code::Valid), 0);
        assert_eq!(u32::from(Code::Malformed), 1);
        assert_eq!(u32::from(Code::Duplicate), 2);
        assert_eq!(Code::from(ParseError::Delimiters { found: 3 }), Code::Malformed);
    }

    #[test]
    fn test_value_codec() {
        let entry = Value::Entry(b"payload".to_vec());
        assert_eq!(Value::decode(entry.encode()).unwrap(), entry);

        let commit = Value::Commit { height: 42 };
        let encoded = commit.encode();
        assert_eq!(encoded.len(), commit.encode_size());
        assert_eq!(Value::decode(encoded).unwrap(), commit);

        assert!(matches!(
            Value::decode(&[7u8][..]),
            Err(Error::InvalidEnum(7))
        ));
    }

    proptest! {
        #[test]
        fn prop_wrong_delimiter_count_is_malformed(
            parts in prop::collection::vec(
                prop::collection::vec(any::<u8>().prop_filter("no delimiter", |b| *b != DELIMITER), 0..8),
                1..6,
            ).prop_filter("not exactly two parts", |parts| parts.len() != 2)
        ) {
            let raw = parts.join(&DELIMITER);
            prop_assert!(Transaction::parse(&raw).is_err());
        }

        #[test]
        fn prop_single_delimiter_splits_at_it(
            key in prop::collection::vec(any::<u8>().prop_filter("no delimiter", |b| *b != DELIMITER), 0..16),
            value in prop::collection::vec(any::<u8>().prop_filter("no delimiter", |b| *b != DELIMITER), 0..16),
        ) {
            let tx = Transaction::parse(&Transaction::new(key.clone(), value.clone()).to_bytes()).unwrap();
            prop_assert_eq!(tx.key, Key::new(key));
            prop_assert_eq!(tx.value, value);
        }
    }
}
