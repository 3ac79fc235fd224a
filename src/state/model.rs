/// Top-level interaction mode of the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Browsing,
    /// A crop session is open; gallery edits wait until it ends.
    Cropping,
}
