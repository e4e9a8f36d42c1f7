//! Raw binary leaves (file uploads, images, arbitrary blobs).

use bytes::Bytes;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Newtype name that marks a [`Binary`] for the value serializer.
///
/// Other serializers see an ordinary newtype struct and serialize the inner
/// record (with `data` as a byte sequence).
pub(crate) const BINARY_TOKEN: &str = "$netkit::Binary";

pub(crate) const DATA_FIELD: &str = "data";
pub(crate) const CONTENT_TYPE_FIELD: &str = "content_type";
pub(crate) const FILE_NAME_FIELD: &str = "file_name";

/// Raw bytes carried as a single leaf, with optional declared content type
/// and file name.
///
/// ```rust
/// use netkit_value::Binary;
///
/// let avatar = Binary::new(vec![0x89, b'P', b'N', b'G'])
///     .with_content_type("image/png")
///     .with_file_name("avatar.png");
/// assert_eq!(avatar.len(), 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binary {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl Binary {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

struct Fields<'a>(&'a Binary);

struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("Binary", 3)?;
        record.serialize_field(DATA_FIELD, &RawBytes(&self.0.data))?;
        record.serialize_field(CONTENT_TYPE_FIELD, &self.0.content_type)?;
        record.serialize_field(FILE_NAME_FIELD, &self.0.file_name)?;
        record.end()
    }
}

impl Serialize for Binary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(BINARY_TOKEN, &Fields(self))
    }
}
