//! Product card field extraction
//!
//! A card's markup is read once and parsed with `scraper`; each field is
//! then resolved through an ordered list of lookups, the first lookup that
//! yields non-empty text winning.

use crate::record::{is_installation_name, or_sentinel, ProductRecord, SENTINEL};
use crate::url::public_image_url;
use scraper::{ElementRef, Html, Selector};

/// One way of reading a field from a parsed card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLookup {
    /// Text of the first element matching the selector
    Text(&'static str),
    /// Text of the first `div.text-caption` containing the phrase (case-insensitive)
    CaptionContaining(&'static str),
    /// First non-empty attribute value among elements matching the selector
    Attr(&'static str, &'static str),
}

impl FieldLookup {
    pub fn apply(&self, card: ElementRef<'_>) -> Option<String> {
        match *self {
            Self::Text(selector) => text_of(card, selector),
            Self::CaptionContaining(phrase) => caption_containing(card, phrase),
            Self::Attr(selector, attribute) => attr_of(card, selector, attribute),
        }
    }
}

pub const NAME_LOOKUPS: &[FieldLookup] = &[
    FieldLookup::Text("div.menuItems.text-caption.q-pt-sm.ellipsis-2-lines"),
    FieldLookup::Text("div.menuItems"),
    FieldLookup::Text("div.ellipsis-2-lines"),
];

pub const VOLTAGE_LOOKUPS: &[FieldLookup] = &[
    FieldLookup::Text("div.q-chip--outline"),
    FieldLookup::Text("div.q-chip"),
];

pub const PRIMARY_PRICE_LOOKUPS: &[FieldLookup] = &[
    FieldLookup::Text("div.text-h6.text-weight-bold.text-teal-9"),
    FieldLookup::Text("div.text-h6"),
];

pub const INSTALLMENT_LOOKUPS: &[FieldLookup] =
    &[FieldLookup::Text("div.text-caption.text-weight-bold")];

pub const CASH_PRICE_LOOKUPS: &[FieldLookup] = &[
    FieldLookup::CaptionContaining("à vista"),
    FieldLookup::Text("div.text-caption"),
];

pub const IMAGE_LOOKUPS: &[FieldLookup] = &[
    FieldLookup::Attr("div.q-img img[src]", "src"),
    FieldLookup::Attr("img[src]", "src"),
];

/// Separator between installment count and value, e.g. "10x de R$ 199,90"
const INSTALLMENT_SEPARATOR: &str = " de ";

/// Raw field values found on one card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub name: Option<String>,
    pub voltage: Option<String>,
    pub primary_price: Option<String>,
    pub installment_info: Option<String>,
    pub cash_price: Option<String>,
    pub image_url: Option<String>,
}

impl CardFields {
    /// Builds a record, filling missing fields with the sentinel
    pub fn into_record(self, category: &str, public_image_base: &str) -> ProductRecord {
        let (installment_count, installment_value) =
            split_installments(self.installment_info.as_deref());
        let image_url = or_sentinel(self.image_url);
        let public_image_url = public_image_url(&image_url, public_image_base);

        ProductRecord {
            category: category.to_string(),
            name: or_sentinel(self.name),
            voltage: or_sentinel(self.voltage),
            primary_price: or_sentinel(self.primary_price),
            cash_price: or_sentinel(self.cash_price),
            installment_count,
            installment_value,
            image_url,
            public_image_url,
        }
    }

    /// Returns true if the card is an installation service rather than a product
    pub fn is_installation_service(&self) -> bool {
        self.name.as_deref().map(is_installation_name).unwrap_or(false)
    }
}

/// Extracts every field from a card's outer HTML
pub fn parse_card(html: &str) -> CardFields {
    let fragment = Html::parse_fragment(html);
    let card = fragment.root_element();

    CardFields {
        name: first_match(card, NAME_LOOKUPS),
        voltage: first_match(card, VOLTAGE_LOOKUPS),
        primary_price: first_match(card, PRIMARY_PRICE_LOOKUPS),
        installment_info: first_match(card, INSTALLMENT_LOOKUPS),
        cash_price: first_match(card, CASH_PRICE_LOOKUPS),
        image_url: first_match(card, IMAGE_LOOKUPS),
    }
}

/// Splits "<count> de <value>" on the first separator
///
/// Both halves are trimmed. Text without the separator, or no text at all,
/// yields the sentinel for both halves.
pub fn split_installments(info: Option<&str>) -> (String, String) {
    match info.and_then(|text| text.split_once(INSTALLMENT_SEPARATOR)) {
        Some((count, value)) => (count.trim().to_string(), value.trim().to_string()),
        None => (SENTINEL.to_string(), SENTINEL.to_string()),
    }
}

fn first_match(card: ElementRef<'_>, lookups: &[FieldLookup]) -> Option<String> {
    lookups.iter().find_map(|lookup| lookup.apply(card))
}

/// Collapses runs of whitespace and trims; empty text counts as missing
fn clean_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn text_of(card: ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    card.select(&selector).next().and_then(clean_text)
}

fn attr_of(card: ElementRef<'_>, selector: &str, attribute: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    card.select(&selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn caption_containing(card: ElementRef<'_>, phrase: &str) -> Option<String> {
    let selector = Selector::parse("div.text-caption").ok()?;
    let phrase = phrase.to_lowercase();
    card.select(&selector)
        .filter_map(clean_text)
        .find(|text| text.to_lowercase().contains(&phrase))
}
