//! Shared test infrastructure for countdown-widget integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::Cell;
use std::collections::HashMap;

use countdown_widget::state::StoredValue;
use countdown_widget::{
    Channel, ChannelState, Emphasis, FontSize, Instant, KeyValueStore, SlotId, Theme, ThemeSink,
    TimeSource, VisualTree,
};

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<Instant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self::at(0)
    }

    pub fn at(millis: i64) -> Self {
        Self {
            current_time: Cell::new(Instant::from_unix_millis(millis)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: i64) {
        let current = self.current_time.get().as_unix_millis();
        self.current_time.set(Instant::from_unix_millis(current + millis));
    }

    pub fn set_time(&self, time: Instant) {
        self.current_time.set(time);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Instant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Store
// ============================================================================

/// In-memory key-value store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        StoredValue::try_from(self.values.get(key)?.as_str()).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

// ============================================================================
// Recording Visual Tree
// ============================================================================

/// A single operation performed on a [`RecordingTree`]
#[derive(Debug, Clone, PartialEq)]
pub enum TreeOp<K> {
    Create { slot: K, parent: K, before: Option<K> },
    Detach(K),
    SetText(K, String),
    SetFontSize(K, String),
    SetEmphasis(K, Emphasis),
}

#[derive(Debug, Clone)]
struct Node<K> {
    slot: K,
    parent: Option<K>,
    children: Vec<K>,
    text: String,
    font_size: Option<String>,
    emphasis: Option<Emphasis>,
}

/// Visual tree that models parent/child order and records every operation
pub struct RecordingTree<K: SlotId> {
    nodes: Vec<Node<K>>,
    ops: Vec<TreeOp<K>>,
}

impl<K: SlotId + std::fmt::Debug> RecordingTree<K> {
    /// Tree holding only the host-supplied root
    pub fn with_root(root: K) -> Self {
        Self {
            nodes: vec![Node {
                slot: root,
                parent: None,
                children: Vec::new(),
                text: String::new(),
                font_size: None,
                emphasis: None,
            }],
            ops: Vec::new(),
        }
    }

    /// Tree without any slot
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn children(&self, slot: K) -> Vec<K> {
        self.node(slot).map(|node| node.children.clone()).unwrap_or_default()
    }

    pub fn parent(&self, slot: K) -> Option<K> {
        self.node(slot).and_then(|node| node.parent)
    }

    pub fn text(&self, slot: K) -> Option<&str> {
        self.node(slot).map(|node| node.text.as_str())
    }

    pub fn font_size(&self, slot: K) -> Option<&str> {
        self.node(slot).and_then(|node| node.font_size.as_deref())
    }

    pub fn emphasis(&self, slot: K) -> Option<Emphasis> {
        self.node(slot).and_then(|node| node.emphasis)
    }

    /// Every slot in the tree, depth first in document order
    pub fn slots(&self) -> Vec<K> {
        let mut out = Vec::new();
        for node in self.nodes.iter().filter(|node| node.parent.is_none()) {
            self.collect(node.slot, &mut out);
        }
        out
    }

    /// Concatenated text of every slot in document order
    pub fn rendered(&self) -> String {
        self.slots()
            .into_iter()
            .filter_map(|slot| self.text(slot))
            .collect()
    }

    pub fn ops(&self) -> &[TreeOp<K>] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Adds a slot outside the displays' control, as stale markup would
    pub fn insert_foreign(&mut self, slot: K, parent: K) {
        self.insert(slot, parent, None);
    }

    fn collect(&self, slot: K, out: &mut Vec<K>) {
        out.push(slot);
        for child in self.children(slot) {
            self.collect(child, out);
        }
    }

    fn node(&self, slot: K) -> Option<&Node<K>> {
        self.nodes.iter().find(|node| node.slot == slot)
    }

    fn node_mut(&mut self, slot: K) -> Option<&mut Node<K>> {
        self.nodes.iter_mut().find(|node| node.slot == slot)
    }

    fn insert(&mut self, slot: K, parent: K, before: Option<K>) {
        assert!(self.node(slot).is_none(), "{:?} created twice", slot);

        let parent_node = self
            .node_mut(parent)
            .unwrap_or_else(|| panic!("parent {:?} of {:?} is missing", parent, slot));
        match before {
            Some(before) => {
                let index = parent_node
                    .children
                    .iter()
                    .position(|child| *child == before)
                    .unwrap_or_else(|| panic!("{:?} is not a child of {:?}", before, parent));
                parent_node.children.insert(index, slot);
            }
            None => parent_node.children.push(slot),
        }

        self.nodes.push(Node {
            slot,
            parent: Some(parent),
            children: Vec::new(),
            text: String::new(),
            font_size: None,
            emphasis: None,
        });
    }

    fn remove_subtree(&mut self, slot: K) {
        for child in self.children(slot) {
            self.remove_subtree(child);
        }
        self.nodes.retain(|node| node.slot != slot);
    }
}

impl<K: SlotId + std::fmt::Debug> VisualTree<K> for RecordingTree<K> {
    fn contains(&self, slot: K) -> bool {
        self.node(slot).is_some()
    }

    fn create(&mut self, slot: K, parent: K, before: Option<K>) {
        self.ops.push(TreeOp::Create { slot, parent, before });
        self.insert(slot, parent, before);
    }

    fn detach(&mut self, slot: K) {
        self.ops.push(TreeOp::Detach(slot));
        if let Some(parent) = self.parent(slot) {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != slot);
            }
        }
        self.remove_subtree(slot);
    }

    fn set_text(&mut self, slot: K, text: &str) {
        self.ops.push(TreeOp::SetText(slot, text.to_string()));
        if let Some(node) = self.node_mut(slot) {
            node.text = text.to_string();
        }
    }

    fn set_font_size(&mut self, slot: K, size: &FontSize) {
        let css = size.to_string();
        self.ops.push(TreeOp::SetFontSize(slot, css.clone()));
        if let Some(node) = self.node_mut(slot) {
            node.font_size = Some(css);
        }
    }

    fn set_emphasis(&mut self, slot: K, emphasis: Emphasis) {
        self.ops.push(TreeOp::SetEmphasis(slot, emphasis));
        if let Some(node) = self.node_mut(slot) {
            node.emphasis = Some(emphasis);
        }
    }
}

// ============================================================================
// Mock Channel
// ============================================================================

/// Channel that records sent frames. `open` and `close` only start the
/// transition; tests complete it with [`MockChannel::set_state`].
#[derive(Debug)]
pub struct MockChannel {
    state: ChannelState,
    sent: Vec<Vec<u8>>,
    opened: u32,
    closed: u32,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            state: ChannelState::Closed,
            sent: Vec::new(),
            opened: 0,
            closed: 0,
        }
    }

    pub fn set_state(&mut self, state: ChannelState) {
        self.state = state;
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn open_calls(&self) -> u32 {
        self.opened
    }

    pub fn close_calls(&self) -> u32 {
        self.closed
    }
}

impl Channel for MockChannel {
    fn open(&mut self) {
        self.opened += 1;
        self.state = ChannelState::Connecting;
    }

    fn close(&mut self) {
        self.closed += 1;
        self.state = ChannelState::Closing;
    }

    fn send(&mut self, frame: &[u8]) {
        self.sent.push(frame.to_vec());
    }

    fn state(&self) -> ChannelState {
        self.state
    }
}

// ============================================================================
// Mock Theme Sink
// ============================================================================

/// Records every applied theme
#[derive(Debug, Default)]
pub struct RecordingTheme {
    applied: Vec<Theme>,
}

impl RecordingTheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> &[Theme] {
        &self.applied
    }
}

impl ThemeSink for RecordingTheme {
    fn apply_theme(&mut self, theme: Theme) {
        self.applied.push(theme);
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Unix milliseconds of a UTC calendar datetime
pub fn utc_millis(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> i64 {
    use chrono::TimeZone;
    chrono::Utc
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .unwrap()
        .timestamp_millis()
}

/// Instant of a UTC calendar datetime
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Instant {
    Instant::from_unix_millis(utc_millis(year, month, day, hour, minute, second))
}

/// Big-endian frame carrying `value`
pub fn frame(value: i64) -> [u8; 8] {
    value.to_be_bytes()
}
