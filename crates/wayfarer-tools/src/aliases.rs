use std::collections::HashMap;

use wayfarer_core::aliases::DestinationAliases;
use wayfarer_core::error::Result;

const BUILTIN_ALIASES: &str = include_str!("../assets/destination_aliases.toml");

/// The shipped alias table, extended with installation-specific entries.
pub fn load_aliases(extra: Option<&HashMap<String, Vec<String>>>) -> Result<DestinationAliases> {
    let mut aliases = DestinationAliases::from_toml(BUILTIN_ALIASES)?;
    if let Some(extra) = extra {
        aliases.merge(extra);
    }
    Ok(aliases)
}
