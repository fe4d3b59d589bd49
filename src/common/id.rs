//! Kademlia node Id or a lookup target
use rand::Rng;
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::BitXor,
    str::FromStr,
};

use crate::{Result, ValidationError};

/// The size of node IDs in bytes.
pub const ID_SIZE: usize = 20;
/// The size of node IDs in bits.
pub const ID_BITS: usize = ID_SIZE * 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Kademlia node Id or a lookup target
///
/// [Ord] is the raw lexicographic order of the bytes, useful for deterministic
/// tie-breaking and sorted iteration. Proximity is measured with [Id::xor] instead.
///
/// Distance is only defined between two Ids:
///
/// ```compile_fail
/// use kademlia_routing::Id;
///
/// let id = Id::random();
/// let _ = id.xor(&[0u8; 20]);
/// ```
pub struct Id(pub [u8; ID_SIZE]);

impl Id {
    /// The all-zero Id, the XOR distance of any Id to itself.
    pub const ZERO: Id = Id([0; ID_SIZE]);

    pub fn random() -> Id {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; ID_SIZE] = rng.gen();

        Id(random_bytes)
    }

    /// Create a new Id from some bytes. Returns Err if `bytes` is not of length
    /// [ID_SIZE].
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Id> {
        let bytes = bytes.as_ref();
        if bytes.len() != ID_SIZE {
            return Err(ValidationError::InvalidIdSize(bytes.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];
        tmp.copy_from_slice(bytes);

        Ok(Id(tmp))
    }

    /// Create a new Id from a sequence of integers, each of which must be in `[0..255]`.
    pub fn from_values(values: &[i64]) -> Result<Id> {
        if values.len() != ID_SIZE {
            return Err(ValidationError::InvalidIdSize(values.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];

        for (index, (byte, value)) in tmp.iter_mut().zip(values).enumerate() {
            *byte = u8::try_from(*value).map_err(|_| ValidationError::ByteOutOfRange {
                index,
                value: *value,
            })?;
        }

        Ok(Id(tmp))
    }

    /// Id of some arbitrary data, the SHA-1 digest of the bytes.
    pub fn from_sha1<T: AsRef<[u8]>>(data: T) -> Id {
        Id(sha1_smol::Sha1::from(data).digest().bytes())
    }

    /// XOR distance between this Id and a target Id.
    ///
    /// Symmetric, and zero only between equal Ids.
    pub fn xor(&self, other: &Id) -> Id {
        let mut result = [0_u8; ID_SIZE];

        for (i, byte) in result.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }

        Id(result)
    }

    /// Number of leading zero bits, [ID_BITS] for [Id::ZERO].
    pub fn leading_zeros(&self) -> usize {
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                return i * 8 + byte.leading_zeros() as usize;
            }
        }

        ID_BITS
    }

    pub fn is_zero(&self) -> bool {
        self == &Id::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<[u8; ID_SIZE]> for Id {
    fn from(bytes: [u8; ID_SIZE]) -> Id {
        Id(bytes)
    }
}

impl TryFrom<&[u8]> for Id {
    type Error = ValidationError;

    fn try_from(bytes: &[u8]) -> Result<Id> {
        Id::from_bytes(bytes)
    }
}

impl BitXor for Id {
    type Output = Id;

    fn bitxor(self, rhs: Id) -> Id {
        self.xor(&rhs)
    }
}

impl BitXor for &Id {
    type Output = Id;

    fn bitxor(self, rhs: Self) -> Id {
        self.xor(rhs)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl FromStr for Id {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Id> {
        if s.len() % 2 != 0 {
            return Err(ValidationError::InvalidHex(s.to_string()));
        }

        if s.len() != ID_SIZE * 2 {
            return Err(ValidationError::InvalidIdSize(s.len() / 2));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];

        for (byte, pair) in tmp.iter_mut().zip(s.as_bytes().chunks(2)) {
            *byte = std::str::from_utf8(pair)
                .ok()
                .filter(|pair| pair.bytes().all(|c| c.is_ascii_hexdigit()))
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ValidationError::InvalidHex(s.to_string()))?;
        }

        Ok(Id(tmp))
    }
}

// Human readable formats (bencode keeps serde's default) get the hex string,
// binary formats get the raw bytes.
#[cfg(feature = "serde")]
mod serde_impl {
    use serde::{
        de::{self, Visitor},
        Deserialize, Deserializer, Serialize, Serializer,
    };
    use std::fmt::{self, Formatter};

    use super::{Id, ID_SIZE};

    impl Serialize for Id {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.to_string())
            } else {
                serializer.serialize_bytes(&self.0)
            }
        }
    }

    struct IdVisitor;

    impl Visitor<'_> for IdVisitor {
        type Value = Id;

        fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "{ID_SIZE} bytes or {} hex characters", ID_SIZE * 2)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Id, E> {
            v.parse().map_err(E::custom)
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Id, E> {
            if v.len() == ID_SIZE {
                return Id::from_bytes(v).map_err(E::custom);
            }

            std::str::from_utf8(v)
                .map_err(E::custom)
                .and_then(|s| self.visit_str(s))
        }
    }

    impl<'de> Deserialize<'de> for Id {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Id, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(IdVisitor)
            } else {
                deserializer.deserialize_bytes(IdVisitor)
            }
        }
    }
}
