use serde::Serialize;

use crate::identifiers::Identifier;
use crate::InputError;

/// A regional marketplace variant, identified by its domain suffix.
///
/// `locale` is carried alongside the suffix but does not influence fetching
/// or parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Storefront {
    pub label: &'static str,
    pub domain_suffix: &'static str,
    pub locale: &'static str,
}

const fn storefront(
    label: &'static str,
    domain_suffix: &'static str,
    locale: &'static str,
) -> Storefront {
    Storefront {
        label,
        domain_suffix,
        locale,
    }
}

/// Every storefront a caller may select, in display order.
pub const CATALOG: &[Storefront] = &[
    storefront("Amazon.com", "com", "en"),
    storefront("Amazon.ca", "ca", "en"),
    storefront("Amazon.co.uk", "co.uk", "en"),
    storefront("Amazon.de", "de", "de"),
    storefront("Amazon.fr", "fr", "fr"),
    storefront("Amazon.it", "it", "it"),
    storefront("Amazon.es", "es", "es"),
    storefront("Amazon.com.mx", "com.mx", "es"),
    storefront("Amazon.in", "in", "hi"),
    storefront("Amazon.com.br", "com.br", "pt"),
    storefront("Amazon.au", "au", "en"),
    storefront("Amazon.nl", "nl", "nl"),
    storefront("Amazon.sg", "sg", "en"),
    storefront("Amazon.se", "se", "sv"),
    storefront("Amazon.pl", "pl", "pl"),
    storefront("Amazon.sa", "sa", "ar"),
    storefront("Amazon.ae", "ae", "ar"),
    storefront("Amazon.co.il", "co.il", "he"),
    storefront("Amazon.tr", "tr", "tr"),
];

impl Storefront {
    /// Finds a catalog entry by domain suffix (`co.uk`) or label
    /// (`Amazon.co.uk`), ignoring ASCII case.
    #[must_use]
    pub fn lookup(key: &str) -> Option<Storefront> {
        let key = key.trim();
        CATALOG
            .iter()
            .find(|s| s.domain_suffix.eq_ignore_ascii_case(key) || s.label.eq_ignore_ascii_case(key))
            .copied()
    }

    /// Resolves a caller selection against the catalog.
    ///
    /// Caller order is preserved; a storefront named twice is kept once, at
    /// its first position.
    ///
    /// # Errors
    ///
    /// - [`InputError::UnknownStorefront`] for a key that matches nothing.
    /// - [`InputError::NoStorefronts`] if `keys` is empty.
    pub fn select<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Storefront>, InputError> {
        let mut selected: Vec<Storefront> = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            let found =
                Self::lookup(key).ok_or_else(|| InputError::UnknownStorefront(key.to_owned()))?;
            if !selected.contains(&found) {
                selected.push(found);
            }
        }
        if selected.is_empty() {
            return Err(InputError::NoStorefronts);
        }
        Ok(selected)
    }

    /// Product detail page for `identifier` on this storefront.
    #[must_use]
    pub fn product_url(&self, identifier: &Identifier) -> String {
        format!(
            "https://www.amazon.{}/dp/{}?th=1",
            self.domain_suffix, identifier
        )
    }

    /// Name of the per-storefront output subdirectory.
    #[must_use]
    pub fn output_dir_name(&self) -> String {
        format!("images_{}", self.domain_suffix)
    }
}

impl std::fmt::Display for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label)
    }
}
