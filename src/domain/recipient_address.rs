/// A non-empty recipient address. The core treats this as an opaque string —
/// no email-format validation is performed, per spec (recipients are "a
/// non-empty list of non-empty strings", not necessarily RFC 5322 mailboxes).
#[derive(Debug, Clone)]
pub struct RecipientAddress(String);

impl RecipientAddress {
    pub fn parse(address: String) -> Result<Self, String> {
        if address.trim().is_empty() {
            return Err("recipient address must not be empty".to_string());
        }
        Ok(Self(address))
    }
}

impl AsRef<str> for RecipientAddress {
    fn as_ref(&self) -> &str { &self.0 }
}

impl From<RecipientAddress> for String {
    fn from(value: RecipientAddress) -> Self { value.0 }
}
