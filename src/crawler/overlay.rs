//! Modal overlay dismissal
//!
//! The storefront opens a welcome dialog after login and occasionally leaves
//! a dialog backdrop over the category grid. Dismissal is always best-effort:
//! only session loss escapes from here.

use crate::browser::{BrowserResult, BrowserSession, ClickMode, Locator, Tolerate};

/// Backdrop that marks an open dialog
pub const BACKDROP_SELECTOR: &str = "div.q-dialog__backdrop";

/// One way of closing an open dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayTarget {
    /// The dialog's close icon button
    CloseIcon,
    /// Any button inside the dialog
    DialogButton,
    /// The backdrop itself
    Backdrop,
}

impl OverlayTarget {
    pub fn selector(&self) -> &'static str {
        match self {
            Self::CloseIcon => "div.q-dialog button i.material-icons",
            Self::DialogButton => "div.q-dialog button",
            Self::Backdrop => BACKDROP_SELECTOR,
        }
    }
}

/// Targets tried after login, in order
pub const LOGIN_TARGETS: &[OverlayTarget] = &[
    OverlayTarget::CloseIcon,
    OverlayTarget::DialogButton,
    OverlayTarget::Backdrop,
];

/// Targets tried before opening a category
pub const STRAY_TARGETS: &[OverlayTarget] = &[OverlayTarget::Backdrop];

/// What a dismissal attempt achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// No backdrop was present
    Absent,
    /// The overlay was clicked away through the given target
    Dismissed(OverlayTarget),
    /// A backdrop was present but no target could be clicked
    Stuck,
}

/// Closes an open dialog by synthetic-clicking the first target that works
pub async fn dismiss_overlay<S: BrowserSession>(
    session: &mut S,
    targets: &[OverlayTarget],
) -> BrowserResult<OverlayOutcome> {
    let backdrop = session
        .find_all(&Locator::css(BACKDROP_SELECTOR))
        .await
        .tolerate("checking for an overlay")?
        .unwrap_or_default();

    if backdrop.is_empty() {
        return Ok(OverlayOutcome::Absent);
    }

    for target in targets {
        let found = session
            .find_all(&Locator::css(target.selector()))
            .await
            .tolerate("looking for an overlay control")?
            .unwrap_or_default();

        let Some(element) = found.into_iter().next() else {
            continue;
        };

        let clicked = session
            .click(&element, ClickMode::Synthetic)
            .await
            .tolerate("clicking an overlay control")?;

        if clicked.is_some() {
            tracing::info!("Overlay dismissed via {:?}", target);
            return Ok(OverlayOutcome::Dismissed(*target));
        }
    }

    tracing::warn!("Overlay present but could not be dismissed");
    Ok(OverlayOutcome::Stuck)
}
