use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("malformed player id: {0:?}")]
    Malformed(String),
    #[error("nil player id")]
    Nil,
}

/// Parses a player id in canonical hyphenated form.
///
/// Other textual UUID encodings (simple, braced, urn) are rejected so that a
/// player has exactly one spelling on the wire.
pub fn parse_player_id(raw: &str) -> Result<Uuid, IdentifierError> {
    if raw.len() != 36 {
        return Err(IdentifierError::Malformed(raw.to_string()));
    }

    let id = Uuid::try_parse(raw).map_err(|_| IdentifierError::Malformed(raw.to_string()))?;
    if id.is_nil() {
        return Err(IdentifierError::Nil);
    }

    Ok(id)
}
