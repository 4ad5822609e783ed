//! URL handling module for Leveros Harvest
//!
//! Product images inside the portal are served from an authenticated path.
//! The same files are published on a public asset domain under their
//! original file name, so a public link is derived by keeping only the last
//! path segment.

use ::url::Url;

/// Derives the public image address for an internal image URL
///
/// The last path segment of `internal` is appended to `public_base`. If
/// `internal` does not parse as an absolute URL it is returned unchanged,
/// which also keeps the sentinel as-is.
///
/// # Examples
///
/// ```
/// use leveros_harvest::url::public_image_url;
///
/// let public = public_image_url(
///     "https://leverosintegra.dev.br/api/imagens/produto/123/split.png?v=2",
///     "https://www.vendas.leveros.com.br/upload/produto/imagem/",
/// );
/// assert_eq!(public, "https://www.vendas.leveros.com.br/upload/produto/imagem/split.png");
/// ```
pub fn public_image_url(internal: &str, public_base: &str) -> String {
    let parsed = match Url::parse(internal) {
        Ok(url) => url,
        Err(_) => return internal.to_string(),
    };

    let file_name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    join_public(public_base, file_name)
}

/// Joins a file name onto a base directory with exactly one separator
fn join_public(base: &str, file_name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file_name)
}
