use crate::{structs::NAME_LENGTH, Error};

const BYTES_IN_U32: usize = 4;

pub fn u32_from_bytes(bytes: &[u8]) -> u32 {
    let mut raw = [0; BYTES_IN_U32];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

/// Names are stored in fixed [`NAME_LENGTH`] fields and double as path components
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty()
        || name.len() > NAME_LENGTH
        || name == "."
        || name == ".."
        || name.contains(['/', '\0'])
    {
        return Err(Error::InvalidName);
    }
    Ok(())
}

/// Copy a validated name into a fixed field and return its length
pub fn encode_name(name: &str, field: &mut [u8]) -> usize {
    let length = usize::min(name.len(), field.len());
    field[..length].copy_from_slice(&name.as_bytes()[..length]);
    length
}
