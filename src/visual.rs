//! Visual tree abstraction shared by all displays.
//!
//! Displays never hold element handles. They address slots through a closed
//! slot enum and ask a [`VisualTree`] to create, detach and update them, so the
//! same rendering logic drives a DOM, a terminal or a recording mock.

use core::fmt;

/// Text content of a single slot.
pub type SlotText = heapless::String<SLOT_TEXT_LEN>;

/// Maximum length of a slot's text.
pub const SLOT_TEXT_LEN: usize = 40;

/// Font size to glyph width ratio of the monospaced display font. A font size
/// of 5vw yields glyphs 3vw wide.
pub const FONT_SIZE_VW_RATIO: f32 = 5.0 / 3.0;

/// Font size to line height ratio of the display font.
pub const FONT_SIZE_VH_RATIO: f32 = 1.25;

/// A closed set of slots a display can address.
pub trait SlotId: Copy + Eq {
    /// Stable element id of the slot.
    fn id(self) -> &'static str;
}

/// Style applied to a slot on top of its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Emphasis {
    /// Regular rendering.
    Normal,
    /// Rendered but visually de-emphasized (padding, placeholder units).
    Dimmed,
    /// Present in the tree but not shown. Keeps layout stable.
    Hidden,
}

/// Font size as a viewport-relative `clamp()` expression.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FontSize {
    /// Preferred size in viewport widths.
    pub vw: f32,
    /// Optional upper bound in viewport heights.
    pub vh: Option<f32>,
    /// Lower clamp in rem.
    pub min_rem: f32,
    /// Upper clamp in rem.
    pub max_rem: f32,
}

/// Renders as CSS, e.g. `clamp(1.5rem, min(11.111vw, 62.500vh), 8rem)`.
impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vh {
            Some(vh) => write!(
                f,
                "clamp({}rem, min({:.3}vw, {:.3}vh), {}rem)",
                self.min_rem, self.vw, vh, self.max_rem
            ),
            None => write!(
                f,
                "clamp({}rem, {:.3}vw, {}rem)",
                self.min_rem, self.vw, self.max_rem
            ),
        }
    }
}

/// Trait for abstracting the host's visual tree.
///
/// Implement this for your rendering target. Slots are addressed by `K`, and
/// every slot except the display's root is created through this trait.
/// Rendering failures are the implementation's concern; these methods cannot
/// fail.
pub trait VisualTree<K: SlotId> {
    /// Returns true if the slot currently exists.
    fn contains(&self, slot: K) -> bool;

    /// Creates `slot` as a child of `parent`, inserted before `before` when
    /// given, appended otherwise.
    fn create(&mut self, slot: K, parent: K, before: Option<K>);

    /// Removes `slot` (and anything still under it) from the tree.
    fn detach(&mut self, slot: K);

    /// Replaces the slot's text content.
    fn set_text(&mut self, slot: K, text: &str);

    /// Sets the slot's font size.
    fn set_font_size(&mut self, slot: K, size: &FontSize);

    /// Sets the slot's emphasis.
    fn set_emphasis(&mut self, slot: K, emphasis: Emphasis);
}

/// Errors raised when a display's slots do not match its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError {
    /// A slot required by the current mode is absent.
    MissingSlot(&'static str),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingSlot(id) => write!(f, "slot '{}' is missing", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RenderError {}

/// Formats `value` zero-padded to `width` digits.
pub(crate) fn padded(value: i64, width: usize) -> SlotText {
    let mut text = SlotText::new();
    // An i64 is at most 20 characters.
    let _ = fmt::Write::write_fmt(&mut text, format_args!("{:0width$}", value, width = width));
    text
}

/// A run of `len` zero characters, truncated to slot capacity.
pub(crate) fn zeros(len: usize) -> SlotText {
    let mut text = SlotText::new();
    for _ in 0..len.min(SLOT_TEXT_LEN) {
        let _ = text.push('0');
    }
    text
}
