use crate::error::SchemaError;

// Identifier policy shared by type names, role names, field names, and
// metadata columns: leading ASCII letter, then letters, digits, underscore.
fn is_valid(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate one identifier, labelling the failure with its role.
pub fn check(role: &'static str, ident: &str) -> Result<(), SchemaError> {
    if is_valid(ident) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            role,
            ident: ident.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for ident in ["Author", "book_shelf", "a", "X9", "snake_case_2"] {
            assert!(check("test", ident).is_ok(), "rejected '{ident}'");
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for ident in ["", "9lives", "_lead", "has space", "semi;colon", "dash-ed"] {
            assert!(check("test", ident).is_err(), "accepted '{ident}'");
        }
    }
}
