//! Declarative change sets for subscription records.

use shared_types::SubscriptionRecord;

/// Target domain of a flag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagDomain {
    /// Document-type notifications.
    Documents,
    /// Public-service notifications.
    PublicServices,
}

/// A declarative change set produced by a strategy.
///
/// Modifiers are the only way a record is mutated. They are convergent:
/// applying the same modifier twice leaves the record in the same state
/// as applying it once.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionModifier {
    set_provider_id: Option<(String, String)>,
    clear_provider_id: Option<String>,
    flags: Vec<(FlagDomain, String, bool)>,
    segments: Vec<String>,
}

impl SubscriptionModifier {
    /// Start an empty modifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the external subscription id assigned by a provider.
    #[must_use]
    pub fn set_provider_id(mut self, provider: impl Into<String>, id: impl Into<String>) -> Self {
        self.set_provider_id = Some((provider.into(), id.into()));
        self
    }

    /// Remove the external subscription id of a provider.
    #[must_use]
    pub fn clear_provider_id(mut self, provider: impl Into<String>) -> Self {
        self.clear_provider_id = Some(provider.into());
        self
    }

    /// Set a boolean flag in one of the subscription domains.
    #[must_use]
    pub fn set_flag(mut self, domain: FlagDomain, item: impl Into<String>, value: bool) -> Self {
        self.flags.push((domain, item.into(), value));
        self
    }

    /// Enroll the user in a provider segment.
    #[must_use]
    pub fn add_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// True when the modifier changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set_provider_id.is_none()
            && self.clear_provider_id.is_none()
            && self.flags.is_empty()
            && self.segments.is_empty()
    }

    /// Apply the change set to a record in place.
    pub fn apply_to(&self, record: &mut SubscriptionRecord) {
        if let Some((provider, id)) = &self.set_provider_id {
            record.provider_ids.insert(provider.clone(), id.clone());
        }
        if let Some(provider) = &self.clear_provider_id {
            record.provider_ids.remove(provider);
        }
        for (domain, item, value) in &self.flags {
            let flags = match domain {
                FlagDomain::Documents => &mut record.documents,
                FlagDomain::PublicServices => &mut record.public_services,
            };
            flags.items.insert(item.clone(), *value);
        }
        for segment in &self.segments {
            if !record.public_services.segments.contains(segment) {
                record.public_services.segments.push(segment.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_twice_is_convergent() {
        let modifier = SubscriptionModifier::new()
            .set_provider_id("ubch", "ext-1")
            .set_flag(FlagDomain::Documents, "passport", true)
            .add_segment("seg-1");

        let mut record = SubscriptionRecord::empty("u-1".into());
        modifier.apply_to(&mut record);
        let once = record.clone();
        modifier.apply_to(&mut record);

        assert_eq!(record.provider_ids, once.provider_ids);
        assert_eq!(record.public_services.segments, vec!["seg-1".to_owned()]);
        assert_eq!(record.documents.items.get("passport"), Some(&true));
    }

    #[test]
    fn test_clear_provider_id() {
        let mut record = SubscriptionRecord::empty("u-1".into());
        SubscriptionModifier::new()
            .set_provider_id("ubch", "ext-1")
            .apply_to(&mut record);
        SubscriptionModifier::new()
            .clear_provider_id("ubch")
            .apply_to(&mut record);
        assert!(record.provider_ids.is_empty());
    }
}
