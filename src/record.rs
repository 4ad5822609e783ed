//! Product record model
//!
//! A `ProductRecord` is one extracted listing. Fields are kept as display
//! text exactly as the storefront renders them; prices are not parsed.

/// Placeholder for any field the page did not provide
pub const SENTINEL: &str = "N/A";

/// Column headers, in export order
pub const COLUMN_HEADERS: [&str; 9] = [
    "Categoria",
    "Nome do Produto",
    "Voltagem",
    "Preço Principal",
    "Preço à Vista",
    "Qtd. Parcelas",
    "Valor Parcela",
    "URL da Imagem",
    "URL Pública da Imagem",
];

/// One product listing extracted from a category page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub category: String,
    pub name: String,
    pub voltage: String,
    pub primary_price: String,
    pub cash_price: String,
    pub installment_count: String,
    pub installment_value: String,
    /// Image address inside the logged-in portal
    pub image_url: String,
    /// Same image on the public asset domain
    pub public_image_url: String,
}

impl ProductRecord {
    /// Creates a record for the given category with every field set to the sentinel
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: SENTINEL.to_string(),
            voltage: SENTINEL.to_string(),
            primary_price: SENTINEL.to_string(),
            cash_price: SENTINEL.to_string(),
            installment_count: SENTINEL.to_string(),
            installment_value: SENTINEL.to_string(),
            image_url: SENTINEL.to_string(),
            public_image_url: SENTINEL.to_string(),
        }
    }

    /// Returns true if the record is an installation service add-on rather than a unit
    pub fn is_installation_service(&self) -> bool {
        is_installation_name(&self.name)
    }

    /// Field values in `COLUMN_HEADERS` order
    pub fn values(&self) -> [&str; 9] {
        [
            self.category.as_str(),
            self.name.as_str(),
            self.voltage.as_str(),
            self.primary_price.as_str(),
            self.cash_price.as_str(),
            self.installment_count.as_str(),
            self.installment_value.as_str(),
            self.image_url.as_str(),
            self.public_image_url.as_str(),
        ]
    }

    /// Returns true if the public image link points somewhere
    pub fn has_public_image(&self) -> bool {
        !self.public_image_url.is_empty() && self.public_image_url != SENTINEL
    }
}

/// Returns true if a product name describes an installation service
///
/// Matches "instalação" and the unaccented "instalacao" anywhere in the
/// name, ignoring case.
pub fn is_installation_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    lowered.contains("instalação") || lowered.contains("instalacao")
}

/// Returns the value, or the sentinel when the value is absent
pub fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| SENTINEL.to_string())
}
