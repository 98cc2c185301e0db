//! The patient header at the start of every `.cEcg` file.
use crate::{
    error::HeaderError,
    layout::{HEADER_LENGTH, HEADER_STRING_WIDTHS},
    FormatError,
};

/// Patient information and the number of strips in the file.
///
/// All strings are stored on disk as NUL-terminated UTF-16LE in fields of
/// fixed width, see [`HEADER_STRING_WIDTHS`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    n_strips: i32,
    id: String,
    name: String,
    gender: String,
    birthdate: String,
    height: String,
    weight: String,
    telephone: String,
    address: String,
    allergies: String,
    diagnosis: String,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n_strips: i32,
        id: String,
        name: String,
        gender: String,
        birthdate: String,
        height: String,
        weight: String,
        telephone: String,
        address: String,
        allergies: String,
        diagnosis: String,
    ) -> Self {
        Self {
            n_strips,
            id,
            name,
            gender,
            birthdate,
            height,
            weight,
            telephone,
            address,
            allergies,
            diagnosis,
        }
    }

    /// Parse the header from the start of `data`.
    ///
    /// Bytes past [`HEADER_LENGTH`] are not looked at.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < HEADER_LENGTH {
            return Err(HeaderError::Truncated(data.len(), HEADER_LENGTH).into());
        }
        let mut count = [0u8; 4];
        count.copy_from_slice(&data[..4]);
        let n_strips = i32::from_le_bytes(count);
        if n_strips < 0 {
            return Err(HeaderError::NegativeStripCount(n_strips).into());
        }

        let mut rest = &data[4..HEADER_LENGTH];
        let mut fields = HEADER_STRING_WIDTHS.iter().map(|&width| {
            let (field, tail) = rest.split_at(width);
            rest = tail;
            read_utf16_string(field)
        });
        // Iterator yields exactly one string per width
        let mut next = || fields.next().unwrap_or_default();
        Ok(Self {
            n_strips,
            id: next(),
            name: next(),
            gender: next(),
            birthdate: next(),
            height: next(),
            weight: next(),
            telephone: next(),
            address: next(),
            allergies: next(),
            diagnosis: next(),
        })
    }

    /// Serialize into the fixed [`HEADER_LENGTH`] byte layout.
    ///
    /// Strings too long for their field are truncated.
    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let mut data = [0u8; HEADER_LENGTH];
        data[..4].copy_from_slice(&self.n_strips.to_le_bytes());
        let mut start = 4;
        for (value, width) in self.strings().into_iter().zip(HEADER_STRING_WIDTHS) {
            write_utf16_string(value, &mut data[start..start + width]);
            start += width;
        }
        data
    }

    fn strings(&self) -> [&str; 10] {
        [
            &self.id,
            &self.name,
            &self.gender,
            &self.birthdate,
            &self.height,
            &self.weight,
            &self.telephone,
            &self.address,
            &self.allergies,
            &self.diagnosis,
        ]
    }

    /// Copy of this header declaring `n_strips` strips.
    pub fn with_strip_count(&self, n_strips: i32) -> Self {
        Self {
            n_strips,
            ..self.clone()
        }
    }

    /// Copy of this header with a different patient id.
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    pub fn n_strips(&self) -> i32 {
        self.n_strips
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn birthdate(&self) -> &str {
        &self.birthdate
    }

    pub fn height(&self) -> &str {
        &self.height
    }

    pub fn weight(&self) -> &str {
        &self.weight
    }

    pub fn telephone(&self) -> &str {
        &self.telephone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn allergies(&self) -> &str {
        &self.allergies
    }

    pub fn diagnosis(&self) -> &str {
        &self.diagnosis
    }
}

/// Decode UTF-16LE code units up to the first NUL or the end of the field.
fn read_utf16_string(field: &[u8]) -> String {
    let units = field
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect::<Vec<_>>();
    String::from_utf16_lossy(&units)
}

/// Write `value` as UTF-16LE plus a NUL terminator into a zeroed `field`.
fn write_utf16_string(value: &str, field: &mut [u8]) {
    let max_units = field.len() / 2 - 1;
    let mut units = value.encode_utf16().take(max_units).collect::<Vec<_>>();
    // Don't leave half of a surrogate pair behind after truncating
    if units
        .last()
        .is_some_and(|unit| (0xD800..0xDC00).contains(unit))
    {
        units.pop();
    }
    for (unit, slot) in units.into_iter().zip(field.chunks_exact_mut(2)) {
        slot.copy_from_slice(&unit.to_le_bytes());
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn patient() -> Header {
        Header::new(
            3,
            "2".into(),
            "Jane Doe".into(),
            "F".into(),
            "1970-01-01".into(),
            "170".into(),
            "60".into(),
            "555-0100".into(),
            "1 Main Street".into(),
            "None".into(),
            "Ünïcødé 💓".into(),
        )
    }

    #[test]
    fn test_header_round_trip() -> eyre::Result<()> {
        let header = patient();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_LENGTH);
        assert_eq!(&bytes[..4], &3i32.to_le_bytes());
        // "2" then the NUL terminator
        assert_eq!(&bytes[4..8], &[b'2', 0, 0, 0]);
        assert_eq!(Header::from_bytes(&bytes)?, header);
        Ok(())
    }

    #[test]
    fn test_header_truncated() {
        let err = Header::from_bytes(&[0u8; HEADER_LENGTH - 1]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::HeaderError(HeaderError::Truncated(1391, HEADER_LENGTH))
        ));
    }

    #[test]
    fn test_negative_strip_count() {
        let mut bytes = [0u8; HEADER_LENGTH];
        bytes[..4].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            Header::from_bytes(&bytes),
            Err(FormatError::HeaderError(HeaderError::NegativeStripCount(-1)))
        ));
    }

    #[test]
    fn test_string_truncated_to_field() -> eyre::Result<()> {
        // id field is 32 bytes, so 15 code units and a NUL
        let header = patient().with_id("0123456789abcdefghij");
        let parsed = Header::from_bytes(&header.to_bytes())?;
        assert_eq!(parsed.id(), "0123456789abcde");
        assert_eq!(parsed.name(), "Jane Doe");
        Ok(())
    }

    #[test]
    fn test_truncation_drops_split_surrogate() {
        let mut field = [0u8; 8];
        // 3 code units fit, the heart needs units 3 and 4
        write_utf16_string("ab💓", &mut field);
        assert_eq!(read_utf16_string(&field), "ab");
    }

    #[test]
    fn test_unterminated_field() {
        let field = [b'h', 0, b'i', 0];
        assert_eq!(read_utf16_string(&field), "hi");
    }

    #[test]
    fn test_clone_and_mutate_leaves_original() {
        let header = patient();
        let saved = header.with_strip_count(1).with_id("42");
        assert_eq!(header.n_strips(), 3);
        assert_eq!(header.id(), "2");
        assert_eq!(saved.n_strips(), 1);
        assert_eq!(saved.id(), "42");
        assert_eq!(saved.diagnosis(), header.diagnosis());
    }
}
