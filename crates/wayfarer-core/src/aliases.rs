use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, WayfarerError};

/// Alternative spellings of destinations, used when checking that a
/// looked-up address really lies in the destination ("Rome" vs "Roma").
///
/// Keys and aliases are stored lowercase. Lookups are symmetric: any
/// spelling in a group yields the whole group.
#[derive(Debug, Clone, Default)]
pub struct DestinationAliases {
    table: HashMap<String, BTreeSet<String>>,
}

impl DestinationAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML table of `destination = ["alias", ...]` entries.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> =
            toml::from_str(content).map_err(|e| WayfarerError::Config(e.to_string()))?;
        let mut aliases = Self::new();
        aliases.merge(&raw);
        Ok(aliases)
    }

    /// Add entries; existing groups are extended, not replaced.
    pub fn merge(&mut self, entries: &HashMap<String, Vec<String>>) {
        for (key, names) in entries {
            let group = self.table.entry(normalize(key)).or_default();
            group.extend(names.iter().map(|n| normalize(n)).filter(|n| !n.is_empty()));
        }
    }

    /// Every spelling known for `destination`, including itself.
    ///
    /// Only the city part counts: "Rome, Italy" and "Roma (IT)" both
    /// resolve through "rome"/"roma".
    pub fn names_for(&self, destination: &str) -> BTreeSet<String> {
        let needle = normalize(city_part(destination));
        let mut names = BTreeSet::new();
        if needle.is_empty() {
            return names;
        }
        names.insert(needle.clone());
        for (key, group) in &self.table {
            if *key == needle || group.contains(&needle) {
                names.insert(key.clone());
                names.extend(group.iter().cloned());
            }
        }
        names
    }

    /// Whether `address` mentions the destination under any known spelling.
    pub fn address_matches(&self, address: &str, destination: &str) -> bool {
        let address = address.to_lowercase();
        self.names_for(destination)
            .iter()
            .any(|name| address.contains(name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Text before the first `,` or `(`.
fn city_part(destination: &str) -> &str {
    destination
        .split([',', '('])
        .next()
        .unwrap_or(destination)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
