/// A non-empty campaign name. Left private so `parse` remains the only way
/// to construct one, matching the `SubscriberName` newtype-plus-parse idiom.
#[derive(Debug, Clone)]
pub struct CampaignName(String);

impl CampaignName {
    pub fn parse(name: String) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("campaign name must not be empty".to_string());
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for CampaignName {
    fn as_ref(&self) -> &str { &self.0 }
}

impl From<CampaignName> for String {
    fn from(value: CampaignName) -> Self { value.0 }
}
