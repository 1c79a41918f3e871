//! Presentation context resolution.
//!
//! Card-present transactions show SDK-driven prompts on a host UI surface.
//! The bridge never assumes which surface that is: it asks a
//! [`PresentationProvider`] at the moment a payment starts.

use tauri::{AppHandle, Manager, Runtime};

/// The UI surface on which transaction prompts are displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationContext {
    /// Host identifier of the surface (the webview window label under Tauri).
    pub surface: String,
}

impl PresentationContext {
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
        }
    }
}

/// Accessor for the current foreground presentation surface.
pub trait PresentationProvider: Send + Sync {
    /// `None` when no surface can host transaction UI right now.
    fn current(&self) -> Option<PresentationContext>;
}

// ---------------------------------------------------------------------------
// Tauri window accessor
// ---------------------------------------------------------------------------

/// Resolves the focused webview window. Minimized, hidden and background
/// windows do not count: with no window reporting focus there is no context.
pub struct FocusedWindowPresenter<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> FocusedWindowPresenter<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> PresentationProvider for FocusedWindowPresenter<R> {
    fn current(&self) -> Option<PresentationContext> {
        let windows = self.app.webview_windows();
        focused_label(windows.iter().map(|(label, w)| (label.as_str(), w.is_focused())))
            .map(PresentationContext::new)
    }
}

/// Lowest label among windows whose focus query returned `Ok(true)`. A failed
/// query counts as unfocused.
fn focused_label<'a, E>(
    windows: impl IntoIterator<Item = (&'a str, Result<bool, E>)>,
) -> Option<&'a str> {
    windows
        .into_iter()
        .filter(|(_, focused)| matches!(focused, Ok(true)))
        .map(|(label, _)| label)
        .min()
}

// ---------------------------------------------------------------------------
// Fixed accessor
// ---------------------------------------------------------------------------

/// Provider returning a preconfigured surface, for hosts that manage a single
/// surface themselves.
#[derive(Debug, Clone, Default)]
pub struct FixedPresenter {
    context: Option<PresentationContext>,
}

impl FixedPresenter {
    pub fn new(context: Option<PresentationContext>) -> Self {
        Self { context }
    }
}

impl PresentationProvider for FixedPresenter {
    fn current(&self) -> Option<PresentationContext> {
        self.context.clone()
    }
}
