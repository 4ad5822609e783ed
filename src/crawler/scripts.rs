//! Page scripts evaluated in the storefront
//!
//! Values are always passed as script arguments, never spliced into the
//! source.

/// Finds the first category tile whose text contains `arguments[0]`
pub const CATEGORY_SEARCH: &str = r#"
const wanted = arguments[0];
return Array.from(document.querySelectorAll('div.text-teal-10'))
    .find(el => el.textContent.includes(wanted)) || null;
"#;

/// Collects product cards by walking up from price and installment elements
pub const STRUCTURAL_CARDS: &str = r#"
const cards = [];
const collect = (el) => {
    const card = el.closest('div.q-card') || el.closest('div[class*="card"]');
    if (card && !cards.includes(card)) {
        cards.push(card);
    }
};
document.querySelectorAll('div.text-h6.text-weight-bold.text-teal-9').forEach(collect);
document.querySelectorAll('div.text-caption.text-weight-bold').forEach(collect);
return cards;
"#;

/// Returns the enabled "next page" button, or null
pub const NEXT_PAGE_BUTTON: &str = r#"
const next = Array.from(document.querySelectorAll('button')).find(btn => {
    const icon = btn.querySelector('i.material-icons');
    return (icon && icon.textContent.includes('fast_forward'))
        || btn.textContent.toLowerCase().includes('próxima');
});
return (next && !next.disabled) ? next : null;
"#;
