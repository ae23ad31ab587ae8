//! Browser adapters over `web-sys`.
//!
//! Enabled with the `web` feature on `wasm32`. The host still owns the timers
//! and the WebSocket; these types only cover the clock, local storage, the
//! theme and the DOM.

use core::marker::PhantomData;

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Storage};

use crate::logging::warning;
use crate::state::{KeyValueStore, StoredValue};
use crate::theme::{Theme, ThemeSink};
use crate::time::{Instant, TimeSource};
use crate::visual::{Emphasis, FontSize, SlotId, VisualTree};

/// Wall clock backed by `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl TimeSource for JsClock {
    fn now(&self) -> Instant {
        Instant::from_unix_millis(js_sys::Date::now() as i64)
    }
}

/// [`KeyValueStore`] over `window.localStorage`.
///
/// Without storage access (private browsing, sandboxed frames) reads miss and
/// writes are dropped, so every display falls back to its default mode.
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        if storage.is_none() {
            warning!("local storage unavailable");
        }
        Self { storage }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<StoredValue> {
        let value = self.storage.as_ref()?.get_item(key).ok().flatten()?;
        StoredValue::try_from(value.as_str()).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if storage.set_item(key, value).is_err() {
                warning!("failed to persist a display state");
            }
        }
    }
}

/// [`ThemeSink`] setting `data-theme` on the document body.
pub struct BodyTheme {
    document: Document,
}

impl BodyTheme {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl ThemeSink for BodyTheme {
    fn apply_theme(&mut self, theme: Theme) {
        let Some(body) = self.document.body() else {
            return;
        };
        if body.set_attribute("data-theme", theme.as_str()).is_err() {
            warning!("failed to apply the theme");
        }
    }
}

/// Reads the `prefers-color-scheme: dark` media query.
pub fn prefers_dark() -> bool {
    web_sys::window()
        .and_then(|window| window.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .is_some_and(|query| query.matches())
}

/// [`VisualTree`] over the page's DOM, addressing slots by element id.
///
/// Slots whose id ends in `-container` are created as `div`s, all others as
/// `span`s. Spacer slots carry the `spacer` class.
pub struct DomTree<K: SlotId> {
    document: Document,
    _slots: PhantomData<K>,
}

impl<K: SlotId> DomTree<K> {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            _slots: PhantomData,
        }
    }

    /// Uses `window.document`, if there is one.
    pub fn from_window() -> Option<Self> {
        web_sys::window()
            .and_then(|window| window.document())
            .map(Self::new)
    }

    fn element(&self, slot: K) -> Option<Element> {
        self.document.get_element_by_id(slot.id())
    }

    fn base_class(slot: K) -> &'static str {
        if slot.id().ends_with("-spacer") {
            "spacer"
        } else {
            ""
        }
    }
}

impl<K: SlotId> VisualTree<K> for DomTree<K> {
    fn contains(&self, slot: K) -> bool {
        self.element(slot).is_some()
    }

    fn create(&mut self, slot: K, parent: K, before: Option<K>) {
        let Some(parent) = self.element(parent) else {
            warning!("cannot create a slot under a missing parent");
            return;
        };

        let tag = if slot.id().ends_with("-container") {
            "div"
        } else {
            "span"
        };
        let Ok(element) = self.document.create_element(tag) else {
            return;
        };
        element.set_id(slot.id());
        element.set_class_name(Self::base_class(slot));

        let sibling = before.and_then(|before| self.element(before));
        let inserted = match sibling {
            Some(sibling) => parent.insert_before(&element, Some(&sibling)),
            None => parent.append_child(&element),
        };
        if inserted.is_err() {
            warning!("failed to insert a slot");
        }
    }

    fn detach(&mut self, slot: K) {
        if let Some(element) = self.element(slot) {
            element.remove();
        }
    }

    fn set_text(&mut self, slot: K, text: &str) {
        if let Some(element) = self.element(slot) {
            element.set_text_content(Some(text));
        }
    }

    fn set_font_size(&mut self, slot: K, size: &FontSize) {
        let Some(element) = self
            .element(slot)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };

        let value = size.to_string();
        if element.style().set_property("font-size", &value).is_err() {
            warning!("failed to set a font size");
        }
    }

    fn set_emphasis(&mut self, slot: K, emphasis: Emphasis) {
        let Some(element) = self.element(slot) else {
            return;
        };

        let emphasis_class = match emphasis {
            Emphasis::Normal => "",
            Emphasis::Dimmed => "very-dim-fg-color",
            Emphasis::Hidden => "hidden",
        };
        let base = Self::base_class(slot);
        let class = match (base.is_empty(), emphasis_class.is_empty()) {
            (true, _) => emphasis_class.to_string(),
            (false, true) => base.to_string(),
            (false, false) => format!("{} {}", base, emphasis_class),
        };
        element.set_class_name(&class);
    }
}
