#![forbid(unsafe_code)]

//! Layer (z-order) management.
//!
//! [`LayerStack`] owns every element on the wall and keeps their layer ids a
//! contiguous back-to-front permutation of `1..=N`. Storage is a `Vec`
//! whose index is always `id - 1`, so contiguity holds structurally and each
//! mutation only has to relabel.
//!
//! # Invariants
//!
//! 1. After every public method returns, ids are exactly `{1..=N}`.
//! 2. `elements[i].id() == i + 1`.
//! 3. Element keys are unique and never reused, even after removal.
//! 4. The selection, if any, names an element that is in the stack.
//!
//! # Failure Modes
//!
//! Unknown ids never fail hard: the operation is a no-op, logged at `warn`,
//! and reported as [`LayerOutcome::NotFound`]. Out-of-range target layers
//! are clamped into `[1, N]`.

use std::fmt;

use ledwall_core::geometry::{ScaleMultiplier, ScreenPoint};
use tracing::{debug, warn};

use crate::element::{Element, ElementKey, ElementKind, LayerId};

/// One element whose layer id changed during an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerChange {
    pub key: ElementKey,
    pub name: String,
    pub old: LayerId,
    pub new: LayerId,
}

/// Result of a layer mutation.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum LayerOutcome {
    /// The operation ran; `changes` lists every element whose id moved
    /// (empty for a no-op).
    Applied(Vec<LayerChange>),
    /// An element was removed and every higher layer shifted down.
    Removed {
        element: Element,
        changes: Vec<LayerChange>,
    },
    /// No element has the requested id. Nothing changed.
    NotFound { id: u32 },
}

impl LayerOutcome {
    /// Id changes caused by the operation.
    #[must_use]
    pub fn changes(&self) -> &[LayerChange] {
        match self {
            Self::Applied(changes) | Self::Removed { changes, .. } => changes,
            Self::NotFound { .. } => &[],
        }
    }

    /// Whether the stack is unchanged.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Applied(changes) => changes.is_empty(),
            Self::Removed { .. } => false,
            Self::NotFound { .. } => true,
        }
    }
}

/// The contiguity invariant was found broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContiguityError {
    pub index: usize,
    pub found: LayerId,
}

impl fmt::Display for ContiguityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layer slot {} holds id {} (expected {})",
            self.index,
            self.found,
            self.index + 1
        )
    }
}

impl std::error::Error for ContiguityError {}

/// Ordered, contiguously-numbered collection of wall elements.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    elements: Vec<Element>,
    next_key: u64,
    selected: Option<ElementKey>,
}

impl LayerStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from elements already in back-to-front order.
    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut stack = Self::new();
        for element in elements {
            stack.append(element);
        }
        stack
    }

    /// Replace every element, keeping keys monotonic across the reload.
    ///
    /// Clears the selection.
    pub fn replace_all(&mut self, elements: impl IntoIterator<Item = Element>) {
        self.elements.clear();
        self.selected = None;
        for element in elements {
            self.append(element);
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements back-to-front.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Element at layer `id`.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Element> {
        let index = (id as usize).checked_sub(1)?;
        self.elements.get(index)
    }

    #[must_use]
    pub fn by_key(&self, key: ElementKey) -> Option<&Element> {
        self.elements.iter().find(|e| e.key() == key)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Element names back-to-front.
    #[must_use]
    pub fn layer_list(&self) -> Vec<String> {
        self.elements.iter().map(|e| e.name.clone()).collect()
    }

    /// Name for the next auto-named element: the first `elem{K}` with
    /// `K > N` that no element uses.
    #[must_use]
    pub fn next_element_name(&self) -> String {
        (self.elements.len() + 1..)
            .map(|k| format!("elem{k}"))
            .find(|name| self.by_name(name).is_none())
            .unwrap_or_default()
    }

    /// Verify ids are exactly `1..=N` in storage order.
    pub fn check_contiguity(&self) -> Result<(), ContiguityError> {
        for (index, element) in self.elements.iter().enumerate() {
            if element.id() != LayerId::from_index(index) {
                return Err(ContiguityError {
                    index,
                    found: element.id(),
                });
            }
        }
        Ok(())
    }

    // ── Selection ────────────────────────────────────────────────────────

    /// Select the element at layer `id`. Returns `false` if there is none.
    pub fn select(&mut self, id: u32) -> bool {
        match self.get(id).map(Element::key) {
            Some(key) => {
                self.selected = Some(key);
                true
            }
            None => false,
        }
    }

    /// Select by stable key. Returns `false` if the key is not in the stack.
    pub fn select_key(&mut self, key: ElementKey) -> bool {
        if self.by_key(key).is_some() {
            self.selected = Some(key);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The selected element, resolved to its current layer.
    #[must_use]
    pub fn selected(&self) -> Option<&Element> {
        self.selected.and_then(|key| self.by_key(key))
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Push `element` on top as layer `N + 1` and return its new key.
    pub fn append(&mut self, mut element: Element) -> ElementKey {
        self.next_key += 1;
        let key = ElementKey::new(self.next_key);
        element.set_key(key);
        element.set_id(LayerId::from_index(self.elements.len()));
        debug!(element = %element.name, layer = %element.id(), "element appended");
        self.elements.push(element);
        key
    }

    /// Set the screen-space baseline of an element. Returns `false` if the
    /// key is unknown.
    pub fn set_location(&mut self, key: ElementKey, location: ScreenPoint) -> bool {
        match self.elements.iter_mut().find(|e| e.key() == key) {
            Some(element) => {
                element.location = location;
                true
            }
            None => false,
        }
    }

    /// Set an image's display scale. Returns `false` if the key is unknown,
    /// the element is text, or the scale is negative or not finite.
    pub fn set_scale(&mut self, key: ElementKey, scale: f64) -> bool {
        if !ElementKind::is_valid_scale(scale) {
            return false;
        }
        match self.elements.iter_mut().find(|e| e.key() == key) {
            Some(Element {
                kind: ElementKind::Image { scale: current, .. },
                ..
            }) => {
                *current = scale;
                true
            }
            _ => false,
        }
    }

    /// Rename an element. Returns `false` if the key is unknown or another
    /// element already has `name`.
    pub fn rename(&mut self, key: ElementKey, name: &str) -> bool {
        if self.elements.iter().any(|e| e.name == name && e.key() != key) {
            return false;
        }
        match self.elements.iter_mut().find(|e| e.key() == key) {
            Some(element) => {
                debug!(from = %element.name, to = name, "element renamed");
                element.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Re-express every baseline under a new scale.
    pub fn rescale(&mut self, previous: ScaleMultiplier, next: ScaleMultiplier) {
        for element in &mut self.elements {
            element.location = next.rescale_from(previous, element.location);
        }
    }

    /// Move the element at `current` to layer `target`.
    ///
    /// `target` is clamped into `[1, N]`. Elements between the old and new
    /// positions shift by one to make room; relative order is otherwise
    /// preserved.
    pub fn move_to_layer(&mut self, current: u32, target: i64) -> LayerOutcome {
        let Some(current) = self.get(current).map(Element::id) else {
            warn!(layer = current, "move_to_layer: no element at layer");
            return LayerOutcome::NotFound { id: current };
        };
        let n = self.elements.len();
        let target = target.clamp(1, n as i64) as usize;
        if target == current.get() as usize {
            return LayerOutcome::Applied(Vec::new());
        }

        // Single pass over the remaining elements in ascending id order;
        // the moved element is emitted when the output counter hits the
        // target layer.
        let mut rest = std::mem::take(&mut self.elements);
        let mut moved = Some(rest.remove(current.index()));
        let mut rest = rest.into_iter();
        let mut ordered = Vec::with_capacity(n);
        for counter in 1..=n {
            let next = if counter == target {
                moved.take()
            } else {
                rest.next()
            };
            ordered.extend(next);
        }
        self.elements = ordered;

        let changes = self.relabel();
        debug!(from = %current, to = target, changed = changes.len(), "moved to layer");
        LayerOutcome::Applied(changes)
    }

    /// Drag-and-drop reorder: remove `dragged` and reinsert it at the slot
    /// `target` occupied before the removal.
    pub fn move_by_drag(&mut self, dragged: u32, target: u32) -> LayerOutcome {
        let Some(from) = self.get(dragged).map(Element::id) else {
            warn!(layer = dragged, "move_by_drag: no element at dragged layer");
            return LayerOutcome::NotFound { id: dragged };
        };
        let Some(to) = self.get(target).map(Element::id) else {
            warn!(layer = target, "move_by_drag: no element at target layer");
            return LayerOutcome::NotFound { id: target };
        };
        if from == to {
            return LayerOutcome::Applied(Vec::new());
        }

        let element = self.elements.remove(from.index());
        self.elements.insert(to.index(), element);

        let changes = self.relabel();
        debug!(from = %from, to = %to, changed = changes.len(), "reordered by drag");
        LayerOutcome::Applied(changes)
    }

    /// Remove the element at layer `id`; every higher layer shifts down by one.
    pub fn remove(&mut self, id: u32) -> LayerOutcome {
        let Some(layer) = self.get(id).map(Element::id) else {
            warn!(layer = id, "remove: no element at layer");
            return LayerOutcome::NotFound { id };
        };
        let element = self.elements.remove(layer.index());
        if self.selected == Some(element.key()) {
            self.selected = None;
        }
        let changes = self.relabel();
        debug!(element = %element.name, layer = %layer, changed = changes.len(), "element removed");
        LayerOutcome::Removed { element, changes }
    }

    /// Rewrite ids from storage order, collecting every change.
    fn relabel(&mut self) -> Vec<LayerChange> {
        let mut changes = Vec::new();
        for (index, element) in self.elements.iter_mut().enumerate() {
            let new = LayerId::from_index(index);
            let old = element.id();
            if old != new {
                changes.push(LayerChange {
                    key: element.key(),
                    name: element.name.clone(),
                    old,
                    new,
                });
                element.set_id(new);
            }
        }
        changes
    }
}
