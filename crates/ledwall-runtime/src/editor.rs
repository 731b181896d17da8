#![forbid(unsafe_code)]

//! The editor: application state plus its reducer.
//!
//! [`EditorModel`] owns the topology, the resolved canvas, the
//! [`LayerStack`] and the [`DragPositioner`]. [`EditorMsg`] is every input
//! the editor reacts to, from user gestures to network results.
//!
//! # Load sequencing
//!
//! Topology and configuration are fetched concurrently. Element locations
//! can only be scaled once the canvas is resolved, so a configuration that
//! arrives first is parked and applied when the topology lands. Each load
//! carries a generation number; a response whose generation is older than
//! the latest request of the same kind is discarded.
//!
//! # Persistence
//!
//! | Action | Back end | Renderer |
//! |--------|----------|----------|
//! | Drag commit, set position | `push_position` | `move` |
//! | Layer change | `push_layer` per changed element, then `push_order` | none |
//! | Remove | `push_layer` per shifted element, then `push_order` | `remove` |
//! | Add | none until saved | `add image` / text commands |
//! | Set scale | none until saved | `scale` |
//! | Rename | none until saved | none |
//! | Save | `save_config` | none |
//!
//! Failures become [`Notice`]s; nothing is retried and the local state is
//! not rolled back. Edits the stack refuses (a taken name, a bad scale)
//! become notices too.
//!
//! Renderer commands address elements by a handle from [`RendererIds`],
//! not by layer, so they stay valid across reorders and removals.

use std::fmt;
use std::sync::Arc;

use ledwall_core::event::PointerEvent;
use ledwall_core::geometry::{ScaleMultiplier, ScreenPoint, Viewport, WallPoint};
use ledwall_core::resolver::{GeometryResolver, ResolvedCanvas};
use ledwall_core::topology::{MatrixTopology, TopologyDocument};
use ledwall_layers::{
    ConfigDocument, DragEffect, DragPositioner, DragTransition, Element, ElementKey, ElementKind,
    LayerChange, LayerOutcome, LayerStack, Settings, canvas_drop_position,
};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::program::{Cmd, Model};
use crate::render_command::{CommandSink, FileCommandSink, RenderCommand, RendererIds};
use crate::sync::{LayerOrder, LayerUpdate, PositionUpdate, RemoteSync, TransportError};

/// Back-end operation, for notices and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncOperation {
    FetchTopology,
    FetchConfig,
    PushPosition,
    PushLayer,
    PushOrder,
    SaveConfig,
}

impl SyncOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchTopology => "fetch_topology",
            Self::FetchConfig => "fetch_config",
            Self::PushPosition => "push_position",
            Self::PushLayer => "push_layer",
            Self::PushOrder => "push_order",
            Self::SaveConfig => "save_config",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a notice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSource {
    Sync(SyncOperation),
    /// The topology could not be resolved into a canvas.
    Geometry,
    /// The renderer command file could not be written.
    Renderer,
    /// The layer stack refused an edit.
    Edit,
}

/// Transient user-facing message about a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub source: NoticeSource,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            NoticeSource::Sync(op) => write!(f, "{op} failed: {}", self.message),
            NoticeSource::Geometry => write!(f, "wall layout unavailable: {}", self.message),
            NoticeSource::Renderer => write!(f, "renderer unreachable: {}", self.message),
            NoticeSource::Edit => write!(f, "edit rejected: {}", self.message),
        }
    }
}

/// Every input the editor reacts to.
#[derive(Debug)]
pub enum EditorMsg {
    /// Fetch topology and configuration.
    Reload,
    LoadTopology,
    LoadConfig,
    TopologyLoaded {
        generation: u64,
        result: Result<TopologyDocument, TransportError>,
    },
    ConfigLoaded {
        generation: u64,
        result: Result<ConfigDocument, TransportError>,
    },
    /// The canvas area changed size.
    ViewportResized(Viewport),
    /// Pointer input. `target` is the layer id under the pointer for
    /// presses, as hit-tested by the host.
    Pointer {
        event: PointerEvent,
        target: Option<u32>,
    },
    /// Focus loss or escape during a drag.
    CancelDrag,
    Select(u32),
    ClearSelection,
    /// Numeric layer entry from the details panel.
    MoveToLayer { current: u32, target: i64 },
    /// Drag-and-drop in the layer list.
    MoveByDrag { dragged: u32, target: u32 },
    Remove(u32),
    /// Exact wall position entered for the element at layer `id`.
    SetPosition { id: u32, wall: WallPoint },
    /// New image scale for the element at layer `id`.
    SetScale { id: u32, scale: f64 },
    Rename { id: u32, name: String },
    /// An image file dropped on the canvas at `drop_offset` from its origin.
    AddImage {
        filename: String,
        drop_offset: ScreenPoint,
    },
    AddText {
        name: String,
        content: String,
        font_path: String,
    },
    Save,
    /// Result of a fire-and-forget back-end call.
    Synced {
        operation: SyncOperation,
        result: Result<(), TransportError>,
    },
    /// Result of a renderer command write.
    Rendered(Result<(), String>),
    DismissNotice(usize),
    ClearNotices,
}

/// Editor state.
pub struct EditorModel {
    config: EditorConfig,
    sync: Arc<dyn RemoteSync>,
    sink: Option<Arc<dyn CommandSink>>,
    topology: Option<MatrixTopology>,
    canvas: Option<ResolvedCanvas>,
    stack: LayerStack,
    renderer_ids: RendererIds,
    drag: DragPositioner,
    settings: Settings,
    pending_config: Option<ConfigDocument>,
    topology_generation: u64,
    config_generation: u64,
    last_transition: Option<DragTransition>,
    notices: Vec<Notice>,
}

impl fmt::Debug for EditorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorModel")
            .field("sync", &self.sync.name())
            .field("canvas", &self.canvas)
            .field("elements", &self.stack.len())
            .field("drag", &self.drag.state())
            .field("notices", &self.notices.len())
            .finish()
    }
}

impl EditorModel {
    /// Create an editor. A renderer sink is attached when
    /// `config.command_file` is set.
    pub fn new(config: EditorConfig, sync: Arc<dyn RemoteSync>) -> Self {
        let sink = config
            .command_file
            .clone()
            .map(|path| Arc::new(FileCommandSink::new(path)) as Arc<dyn CommandSink>);
        Self {
            config,
            sync,
            sink,
            topology: None,
            canvas: None,
            stack: LayerStack::new(),
            renderer_ids: RendererIds::new(),
            drag: DragPositioner::new(),
            settings: Settings::default(),
            pending_config: None,
            topology_generation: 0,
            config_generation: 0,
            last_transition: None,
            notices: Vec::new(),
        }
    }

    /// Replace the renderer sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn CommandSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    // ── Reads ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Renderer handle of each element.
    #[must_use]
    pub fn renderer_ids(&self) -> &RendererIds {
        &self.renderer_ids
    }

    #[must_use]
    pub fn canvas(&self) -> Option<&ResolvedCanvas> {
        self.canvas.as_ref()
    }

    /// Current scale, if the canvas is resolved.
    #[must_use]
    pub fn scale(&self) -> Option<ScaleMultiplier> {
        self.canvas.map(|c| c.scale)
    }

    #[must_use]
    pub fn topology(&self) -> Option<&MatrixTopology> {
        self.topology.as_ref()
    }

    #[must_use]
    pub fn drag(&self) -> &DragPositioner {
        &self.drag
    }

    #[must_use]
    pub fn last_transition(&self) -> Option<&DragTransition> {
        self.last_transition.as_ref()
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Whether a configuration is waiting for the canvas.
    #[must_use]
    pub fn has_pending_config(&self) -> bool {
        self.pending_config.is_some()
    }

    /// Latest issued `(topology, config)` load generations.
    #[must_use]
    pub fn generations(&self) -> (u64, u64) {
        (self.topology_generation, self.config_generation)
    }

    /// Where to draw the element at layer `id` (baseline plus any drag
    /// offset).
    #[must_use]
    pub fn display_position(&self, id: u32) -> Option<ScreenPoint> {
        self.stack.get(id).map(|e| self.drag.display_position(e))
    }

    /// Wall-space position of the element at layer `id`.
    #[must_use]
    pub fn wall_position(&self, id: u32) -> Option<WallPoint> {
        let scale = self.scale()?;
        self.stack.get(id).map(|e| scale.to_wall(e.location))
    }

    /// Snapshot of the current layout as a configuration document.
    #[must_use]
    pub fn to_document(&self) -> Option<ConfigDocument> {
        let scale = self.scale()?;
        Some(ConfigDocument::from_stack(&self.stack, &self.settings, scale))
    }

    // ── Loads ────────────────────────────────────────────────────────────

    fn load_topology(&mut self) -> Cmd<EditorMsg> {
        self.topology_generation += 1;
        let generation = self.topology_generation;
        let sync = Arc::clone(&self.sync);
        debug!(generation, "loading topology");
        Cmd::task_named(SyncOperation::FetchTopology.as_str(), move || {
            EditorMsg::TopologyLoaded {
                generation,
                result: sync.fetch_topology(),
            }
        })
    }

    fn load_config(&mut self) -> Cmd<EditorMsg> {
        self.config_generation += 1;
        let generation = self.config_generation;
        let sync = Arc::clone(&self.sync);
        debug!(generation, "loading configuration");
        Cmd::task_named(SyncOperation::FetchConfig.as_str(), move || {
            EditorMsg::ConfigLoaded {
                generation,
                result: sync.fetch_config(),
            }
        })
    }

    fn on_topology_loaded(
        &mut self,
        generation: u64,
        result: Result<TopologyDocument, TransportError>,
    ) {
        if generation != self.topology_generation {
            debug!(generation, latest = self.topology_generation, "discarding stale topology");
            return;
        }
        let doc = match result {
            Ok(doc) => doc,
            Err(e) => return self.notify(NoticeSource::Sync(SyncOperation::FetchTopology), &e),
        };
        let resolved = MatrixTopology::from_document(&doc)
            .map_err(Into::into)
            .and_then(|t| {
                GeometryResolver::new(self.config.viewport)
                    .resolve(&t)
                    .map(|canvas| (t, canvas))
            });
        match resolved {
            Ok((topology, canvas)) => {
                info!(
                    panels = topology.instances().len(),
                    width = canvas.extent.width(),
                    height = canvas.extent.height(),
                    scale = canvas.scale.get(),
                    "topology loaded"
                );
                self.topology = Some(topology);
                self.install_canvas(canvas);
            }
            Err(e) => self.notify(NoticeSource::Geometry, &e),
        }
    }

    fn on_config_loaded(&mut self, generation: u64, result: Result<ConfigDocument, TransportError>) {
        if generation != self.config_generation {
            debug!(generation, latest = self.config_generation, "discarding stale configuration");
            return;
        }
        match result {
            Ok(doc) => match self.scale() {
                Some(scale) => self.apply_config(doc, scale),
                None => {
                    debug!("configuration parked until the canvas resolves");
                    self.pending_config = Some(doc);
                }
            },
            Err(e) => self.notify(NoticeSource::Sync(SyncOperation::FetchConfig), &e),
        }
    }

    /// Adopt a new canvas, rescaling placed elements to keep their wall
    /// positions, and apply any parked configuration.
    fn install_canvas(&mut self, canvas: ResolvedCanvas) {
        if let Some(previous) = self.canvas.replace(canvas)
            && previous.scale != canvas.scale
        {
            self.stack.rescale(previous.scale, canvas.scale);
        }
        if let Some(doc) = self.pending_config.take() {
            self.apply_config(doc, canvas.scale);
        }
    }

    fn apply_config(&mut self, doc: ConfigDocument, scale: ScaleMultiplier) {
        if self.drag.is_dragging() {
            self.drag.cancel();
        }
        self.stack.replace_all(doc.to_elements(scale));
        self.renderer_ids = RendererIds::from_stack(&self.stack);
        self.settings = doc.settings;
        info!(elements = self.stack.len(), "configuration loaded");
    }

    fn resize(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        let Some(topology) = &self.topology else {
            return;
        };
        match GeometryResolver::new(viewport).resolve(topology) {
            Ok(canvas) => self.install_canvas(canvas),
            Err(e) => self.notify(NoticeSource::Geometry, &e),
        }
    }

    // ── Sync helpers ─────────────────────────────────────────────────────

    fn push<F>(&self, operation: SyncOperation, call: F) -> Cmd<EditorMsg>
    where
        F: FnOnce(&dyn RemoteSync) -> Result<(), TransportError> + Send + 'static,
    {
        let sync = Arc::clone(&self.sync);
        Cmd::task_named(operation.as_str(), move || EditorMsg::Synced {
            operation,
            result: call(sync.as_ref()),
        })
    }

    /// One `push_layer` per change, then the full order, sent in that order.
    fn push_layer_changes(&self, changes: &[LayerChange]) -> Cmd<EditorMsg> {
        if changes.is_empty() {
            return Cmd::none();
        }
        let mut cmds: Vec<Cmd<EditorMsg>> = changes
            .iter()
            .map(|change| {
                let update = LayerUpdate::from(change);
                self.push(SyncOperation::PushLayer, move |s| s.push_layer(&update))
            })
            .collect();
        let order = LayerOrder {
            layer_list: self.stack.layer_list(),
        };
        cmds.push(self.push(SyncOperation::PushOrder, move |s| s.push_order(&order)));
        Cmd::sequence(cmds)
    }

    fn render(&self, commands: Vec<RenderCommand>) -> Cmd<EditorMsg> {
        let Some(sink) = &self.sink else {
            return Cmd::none();
        };
        if commands.is_empty() {
            return Cmd::none();
        }
        let sink = Arc::clone(sink);
        Cmd::task_named("render", move || {
            EditorMsg::Rendered(sink.send_all(&commands).map_err(|e| e.to_string()))
        })
    }

    fn notify(&mut self, source: NoticeSource, error: &dyn fmt::Display) {
        let notice = Notice {
            source,
            message: error.to_string(),
        };
        warn!(notice = %notice, "operation failed");
        self.notices.push(notice);
    }

    // ── Gestures ─────────────────────────────────────────────────────────

    fn on_pointer(&mut self, event: PointerEvent, target: Option<u32>) -> Cmd<EditorMsg> {
        let Some(scale) = self.scale() else {
            debug!("pointer input before canvas resolved");
            return Cmd::none();
        };
        let target = target.and_then(|id| self.stack.get(id)).map(Element::key);
        let transition = match self.drag.apply(&event, target, &mut self.stack, scale) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "pointer event rejected");
                return Cmd::none();
            }
        };
        self.last_transition = Some(transition);

        let DragEffect::Committed { key, wall, .. } = transition.effect else {
            return Cmd::none();
        };
        self.commit_position(key, wall)
    }

    /// Persist the wall position of `key` and move it on the renderer.
    fn commit_position(&mut self, key: ElementKey, wall: WallPoint) -> Cmd<EditorMsg> {
        let Some(layer) = self.stack.by_key(key).map(Element::id) else {
            return Cmd::none();
        };
        let update = PositionUpdate::new(layer, wall);
        let push = self.push(SyncOperation::PushPosition, move |s| s.push_position(&update));
        let handle = self.renderer_ids.assign(key);
        let render = self.render(RenderCommand::move_to(handle, wall).into_iter().collect());
        Cmd::batch(vec![push, render])
    }

    fn set_position(&mut self, id: u32, wall: WallPoint) -> Cmd<EditorMsg> {
        let Some(scale) = self.scale() else {
            debug!("position entered before canvas resolved");
            return Cmd::none();
        };
        let Some(key) = self.stack.get(id).map(Element::key) else {
            debug!(layer = id, "set position: no element at layer");
            return Cmd::none();
        };
        if self.drag.active() == Some(key) {
            self.last_transition = Some(self.drag.cancel());
        }
        self.stack.set_location(key, scale.to_screen(wall));
        self.commit_position(key, wall)
    }

    fn set_scale(&mut self, id: u32, scale: f64) -> Cmd<EditorMsg> {
        let Some(element) = self.stack.get(id) else {
            debug!(layer = id, "set scale: no element at layer");
            return Cmd::none();
        };
        let key = element.key();
        if !matches!(element.kind, ElementKind::Image { .. }) {
            let message = format!("{:?} is not an image and cannot be scaled", element.name);
            self.notify(NoticeSource::Edit, &message);
            return Cmd::none();
        }
        if !self.stack.set_scale(key, scale) {
            self.notify(NoticeSource::Edit, &format!("invalid scale {scale}"));
            return Cmd::none();
        }
        let id = self.renderer_ids.assign(key);
        self.render(vec![RenderCommand::Scale { id, scale }])
    }

    fn rename(&mut self, id: u32, name: String) {
        let Some(key) = self.stack.get(id).map(Element::key) else {
            debug!(layer = id, "rename: no element at layer");
            return;
        };
        if !self.stack.rename(key, &name) {
            self.notify(NoticeSource::Edit, &format!("the name {name:?} is already used"));
        }
    }

    fn on_layer_outcome(&mut self, outcome: LayerOutcome) -> Cmd<EditorMsg> {
        match outcome {
            LayerOutcome::NotFound { .. } => Cmd::none(),
            LayerOutcome::Applied(changes) => self.push_layer_changes(&changes),
            LayerOutcome::Removed { element, changes } => {
                if self.drag.active() == Some(element.key()) {
                    self.drag.cancel();
                }
                let render = match self.renderer_ids.release(element.key()) {
                    Some(id) => self.render(vec![RenderCommand::Remove { id }]),
                    None => Cmd::none(),
                };
                Cmd::batch(vec![self.push_layer_changes(&changes), render])
            }
        }
    }

    fn add(&mut self, element: Element, wall: WallPoint) -> Cmd<EditorMsg> {
        if self.stack.by_name(&element.name).is_some() {
            let message = format!("the name {:?} is already used", element.name);
            self.notify(NoticeSource::Edit, &message);
            return Cmd::none();
        }
        let key = self.stack.append(element);
        let handle = self.renderer_ids.assign(key);
        let Some(placed) = self.stack.by_key(key) else {
            return Cmd::none();
        };
        self.render(RenderCommand::place(handle, placed, wall))
    }
}

impl Model for EditorModel {
    type Message = EditorMsg;

    fn init(&mut self) -> Cmd<EditorMsg> {
        Cmd::msg(EditorMsg::Reload)
    }

    fn update(&mut self, msg: EditorMsg) -> Cmd<EditorMsg> {
        match msg {
            EditorMsg::Reload => Cmd::batch(vec![self.load_topology(), self.load_config()]),
            EditorMsg::LoadTopology => self.load_topology(),
            EditorMsg::LoadConfig => self.load_config(),
            EditorMsg::TopologyLoaded { generation, result } => {
                self.on_topology_loaded(generation, result);
                Cmd::none()
            }
            EditorMsg::ConfigLoaded { generation, result } => {
                self.on_config_loaded(generation, result);
                Cmd::none()
            }
            EditorMsg::ViewportResized(viewport) => {
                self.resize(viewport);
                Cmd::none()
            }
            EditorMsg::Pointer { event, target } => self.on_pointer(event, target),
            EditorMsg::CancelDrag => {
                self.last_transition = Some(self.drag.cancel());
                Cmd::none()
            }
            EditorMsg::Select(id) => {
                if !self.stack.select(id) {
                    debug!(layer = id, "select: no element at layer");
                }
                Cmd::none()
            }
            EditorMsg::ClearSelection => {
                self.stack.clear_selection();
                Cmd::none()
            }
            EditorMsg::MoveToLayer { current, target } => {
                let outcome = self.stack.move_to_layer(current, target);
                self.on_layer_outcome(outcome)
            }
            EditorMsg::MoveByDrag { dragged, target } => {
                let outcome = self.stack.move_by_drag(dragged, target);
                self.on_layer_outcome(outcome)
            }
            EditorMsg::Remove(id) => {
                let outcome = self.stack.remove(id);
                self.on_layer_outcome(outcome)
            }
            EditorMsg::SetPosition { id, wall } => self.set_position(id, wall),
            EditorMsg::SetScale { id, scale } => self.set_scale(id, scale),
            EditorMsg::Rename { id, name } => {
                self.rename(id, name);
                Cmd::none()
            }
            EditorMsg::AddImage {
                filename,
                drop_offset,
            } => {
                let Some(scale) = self.scale() else {
                    debug!("image dropped before canvas resolved");
                    return Cmd::none();
                };
                let wall = canvas_drop_position(drop_offset, scale);
                let name = self.stack.next_element_name();
                let element = Element::image(name, scale.to_screen(wall), &filename);
                self.add(element, wall)
            }
            EditorMsg::AddText {
                name,
                content,
                font_path,
            } => self.add(Element::text(name, content, font_path), WallPoint::ORIGIN),
            EditorMsg::Save => match self.to_document() {
                Some(doc) => self.push(SyncOperation::SaveConfig, move |s| s.save_config(&doc)),
                None => {
                    debug!("save requested before canvas resolved");
                    Cmd::none()
                }
            },
            EditorMsg::Synced { operation, result } => {
                match result {
                    Ok(()) => debug!(%operation, "synced"),
                    Err(e) => self.notify(NoticeSource::Sync(operation), &e),
                }
                Cmd::none()
            }
            EditorMsg::Rendered(result) => {
                if let Err(e) = result {
                    self.notify(NoticeSource::Renderer, &e);
                }
                Cmd::none()
            }
            EditorMsg::DismissNotice(index) => {
                if index < self.notices.len() {
                    self.notices.remove(index);
                }
                Cmd::none()
            }
            EditorMsg::ClearNotices => {
                self.notices.clear();
                Cmd::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::ProgramSimulator;
    use crate::sync::MemorySync;

    const TOPOLOGY: &str = r#"{
        "matrix-specs": { "p": { "width-height": [64, 32] } },
        "matrices": {
            "m0": { "pos": [0, 0], "rot": "down", "spec": "p" },
            "m1": { "pos": [64, 0], "rot": "down", "spec": "p" }
        }
    }"#;

    fn editor(sync: &Arc<MemorySync>) -> ProgramSimulator<EditorModel> {
        let config = EditorConfig::default().with_viewport(Viewport::new(256.0, 256.0));
        ProgramSimulator::new(EditorModel::new(config, Arc::clone(sync) as Arc<dyn RemoteSync>))
    }

    fn topology() -> TopologyDocument {
        serde_json::from_str(TOPOLOGY).unwrap()
    }

    #[test]
    fn config_waits_for_canvas() {
        let sync = Arc::new(MemorySync::new().with_config(ConfigDocument::default()));
        let mut sim = editor(&sync);
        sim.send(EditorMsg::LoadConfig);
        assert!(sim.model().has_pending_config());
        sync.set_topology(topology());
        sim.send(EditorMsg::LoadTopology);
        assert!(!sim.model().has_pending_config());
        assert_eq!(sim.model().scale().map(ScaleMultiplier::get), Some(2.0));
    }

    #[test]
    fn stale_topology_is_discarded() {
        let sync = Arc::new(MemorySync::new().with_topology(topology()));
        let mut sim = editor(&sync);
        sim.defer_tasks(true);
        sim.send(EditorMsg::LoadTopology);
        sim.send(EditorMsg::LoadTopology);
        assert_eq!(sim.model().generations().0, 2);
        // The first request answers last but is older: ignored.
        sync.set_topology(TopologyDocument::default());
        assert!(sim.complete_task(0));
        assert!(sim.model().canvas().is_none());
        assert!(sim.model().notices().is_empty());
    }

    #[test]
    fn geometry_failure_becomes_notice() {
        let sync = Arc::new(MemorySync::new().with_topology(TopologyDocument::default()));
        let mut sim = editor(&sync);
        sim.send(EditorMsg::LoadTopology);
        assert!(sim.model().canvas().is_none());
        assert_eq!(sim.model().notices()[0].source, NoticeSource::Geometry);
    }

    #[test]
    fn notices_can_be_dismissed() {
        let sync = Arc::new(MemorySync::new());
        let mut sim = editor(&sync);
        sim.send(EditorMsg::Reload);
        assert_eq!(sim.model().notices().len(), 2);
        sim.send(EditorMsg::DismissNotice(0));
        assert_eq!(
            sim.model().notices()[0].source,
            NoticeSource::Sync(SyncOperation::FetchConfig)
        );
        sim.send(EditorMsg::DismissNotice(9));
        sim.send(EditorMsg::ClearNotices);
        assert!(sim.model().notices().is_empty());
    }

    #[test]
    fn pointer_before_canvas_is_ignored() {
        let sync = Arc::new(MemorySync::new());
        let mut sim = editor(&sync);
        sim.send(EditorMsg::Pointer {
            event: PointerEvent::down(1.0, 1.0),
            target: Some(1),
        });
        assert!(sim.model().last_transition().is_none());
    }

    #[test]
    fn resize_rescales_elements() {
        let sync = Arc::new(MemorySync::new().with_topology(topology()));
        let mut sim = editor(&sync);
        sim.send(EditorMsg::LoadTopology);
        sim.send(EditorMsg::AddImage {
            filename: "a.png".into(),
            drop_offset: ScreenPoint::new(20.0, 40.0),
        });
        assert_eq!(sim.model().wall_position(1), Some(WallPoint::new(10, 20)));
        sim.send(EditorMsg::ViewportResized(Viewport::new(128.0, 128.0)));
        assert_eq!(sim.model().scale().map(ScaleMultiplier::get), Some(1.0));
        assert_eq!(sim.model().display_position(1), Some(ScreenPoint::new(10.0, 20.0)));
        assert_eq!(sim.model().wall_position(1), Some(WallPoint::new(10, 20)));
    }

    #[test]
    fn duplicate_text_name_is_rejected() {
        let sync = Arc::new(MemorySync::new());
        let mut sim = editor(&sync);
        sim.send(EditorMsg::AddText {
            name: "t".into(),
            content: "a".into(),
            font_path: "f.ttf".into(),
        });
        sim.send(EditorMsg::AddText {
            name: "t".into(),
            content: "b".into(),
            font_path: "f.ttf".into(),
        });
        assert_eq!(sim.model().stack().len(), 1);
        assert_eq!(sim.model().notices().len(), 1);
        assert_eq!(sim.model().notices()[0].source, NoticeSource::Edit);
    }

    #[test]
    fn dropped_images_get_fresh_names_after_removal() {
        let sync = Arc::new(MemorySync::new().with_topology(topology()));
        let mut sim = editor(&sync);
        sim.send(EditorMsg::LoadTopology);
        for _ in 0..2 {
            sim.send(EditorMsg::AddImage {
                filename: "a.png".into(),
                drop_offset: ScreenPoint::ZERO,
            });
        }
        sim.send(EditorMsg::Remove(1));
        sim.send(EditorMsg::AddImage {
            filename: "b.png".into(),
            drop_offset: ScreenPoint::ZERO,
        });
        assert_eq!(sim.model().stack().layer_list(), ["elem2", "elem3"]);
        assert!(sim.model().notices().is_empty());
    }

    #[test]
    fn set_scale_rejects_text_and_bad_values() {
        let sync = Arc::new(MemorySync::new().with_topology(topology()));
        let mut sim = editor(&sync);
        sim.send(EditorMsg::LoadTopology);
        sim.send(EditorMsg::AddImage {
            filename: "a.png".into(),
            drop_offset: ScreenPoint::ZERO,
        });
        sim.send(EditorMsg::AddText {
            name: "t".into(),
            content: "hi".into(),
            font_path: "f.ttf".into(),
        });
        sim.send(EditorMsg::SetScale { id: 1, scale: 0.25 });
        assert!(sim.model().notices().is_empty());
        sim.send(EditorMsg::SetScale { id: 1, scale: -1.0 });
        sim.send(EditorMsg::SetScale { id: 2, scale: 2.0 });
        assert_eq!(sim.model().notices().len(), 2);
        assert!(matches!(
            sim.model().stack().get(1).unwrap().kind,
            ElementKind::Image { scale, .. } if scale == 0.25
        ));
    }

    #[test]
    fn set_position_cancels_a_drag_of_the_same_element() {
        let sync = Arc::new(MemorySync::new().with_topology(topology()));
        let mut sim = editor(&sync);
        sim.send(EditorMsg::LoadTopology);
        sim.send(EditorMsg::AddImage {
            filename: "a.png".into(),
            drop_offset: ScreenPoint::ZERO,
        });
        sim.send(EditorMsg::Pointer {
            event: PointerEvent::down(1.0, 1.0),
            target: Some(1),
        });
        assert!(sim.model().drag().is_dragging());
        sim.send(EditorMsg::SetPosition {
            id: 1,
            wall: WallPoint::new(30, 12),
        });
        assert!(!sim.model().drag().is_dragging());
        assert_eq!(sim.model().wall_position(1), Some(WallPoint::new(30, 12)));
        assert_eq!(sim.model().display_position(1), Some(ScreenPoint::new(60.0, 24.0)));
    }

    #[test]
    fn rename_to_a_taken_name_is_a_notice() {
        let sync = Arc::new(MemorySync::new());
        let mut sim = editor(&sync);
        for name in ["a", "b"] {
            sim.send(EditorMsg::AddText {
                name: name.into(),
                content: String::new(),
                font_path: "f.ttf".into(),
            });
        }
        sim.send(EditorMsg::Rename {
            id: 1,
            name: "b".into(),
        });
        assert_eq!(sim.model().notices()[0].source, NoticeSource::Edit);
        sim.send(EditorMsg::Rename {
            id: 1,
            name: "title".into(),
        });
        assert_eq!(sim.model().stack().layer_list(), ["title", "b"]);
    }
}
