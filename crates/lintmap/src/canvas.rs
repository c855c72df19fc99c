//! The diagram canvas.
//!
//! [`Canvas`] owns everything that lives on the UI side of the diagram: the
//! constraint [`Solver`], the solver variables of each class box, the arena
//! of connector handles, the connectors themselves, the zoom factor and the
//! [`DrawingSurface`] that receives primitives.
//!
//! Class nodes in the [`Registry`] refer to handles by [`HandleKey`] only, so
//! dropping every connector on a rescan never leaves a dangling reference.

use std::{collections::HashMap, fmt};

use indexmap::IndexMap;
use log::{debug, trace};

use lintmap_core::{
    draw::Decoration,
    geometry::{Bounds, Point, Size},
    identifier::EntityKey,
};

use crate::{
    LintmapError,
    navigation::NavigationTarget,
    registry::{ClassNode, Registry},
    solver::{BoxVariables, ConstraintId, PointVariables, Solver},
    surface::{
        ClassBoxPrimitive, ConnectorPrimitive, DrawingSurface, Primitive, PrimitiveId,
        RecordingSurface,
    },
};

/// Multiplier applied by [`Canvas::zoom_in`] and divided by
/// [`Canvas::zoom_out`].
pub const ZOOM_STEP: f64 = 1.2;

/// Identifier of a connector on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(usize);

impl EdgeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Which end of a connector a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    Head,
    Tail,
}

/// Key of a connector handle in the canvas handle arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleKey {
    pub edge: EdgeId,
    pub role: EndpointRole,
}

impl HandleKey {
    pub fn head(edge: EdgeId) -> Self {
        Self {
            edge,
            role: EndpointRole::Head,
        }
    }

    pub fn tail(edge: EdgeId) -> Self {
        Self {
            edge,
            role: EndpointRole::Tail,
        }
    }
}

/// A line joining two class boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    id: EdgeId,
    head: EntityKey,
    tail: EntityKey,
    arrowhead: Decoration,
    arrowtail: Decoration,
    constraint: ConstraintId,
}

impl Connector {
    pub(crate) fn new(
        id: EdgeId,
        head: EntityKey,
        tail: EntityKey,
        arrowhead: Decoration,
        arrowtail: Decoration,
        constraint: ConstraintId,
    ) -> Self {
        Self {
            id,
            head,
            tail,
            arrowhead,
            arrowtail,
            constraint,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn head(&self) -> &EntityKey {
        &self.head
    }

    pub fn tail(&self) -> &EntityKey {
        &self.tail
    }

    pub fn arrowhead(&self) -> Decoration {
        self.arrowhead
    }

    pub fn arrowtail(&self) -> Decoration {
        self.arrowtail
    }

    pub fn head_handle(&self) -> HandleKey {
        HandleKey::head(self.id)
    }

    pub fn tail_handle(&self) -> HandleKey {
        HandleKey::tail(self.id)
    }
}

/// UI-side owner of the diagram geometry.
pub struct Canvas {
    solver: Solver,
    boxes: IndexMap<EntityKey, BoxVariables>,
    handles: HashMap<HandleKey, PointVariables>,
    connectors: IndexMap<EdgeId, Connector>,
    next_edge: usize,
    zoom: f64,
    surface: Box<dyn DrawingSurface>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("boxes", &self.boxes.len())
            .field("connectors", &self.connectors.len())
            .field("zoom", &self.zoom)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(Box::new(RecordingSurface::new()))
    }
}

impl Canvas {
    pub fn new(surface: Box<dyn DrawingSurface>) -> Self {
        Self {
            solver: Solver::new(),
            boxes: IndexMap::new(),
            handles: HashMap::new(),
            connectors: IndexMap::new(),
            next_edge: 0,
            zoom: 1.0,
            surface,
        }
    }

    pub fn surface(&self) -> &dyn DrawingSurface {
        self.surface.as_ref()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_in(&mut self) {
        self.zoom *= ZOOM_STEP;
        debug!(zoom = self.zoom; "Zoomed in");
    }

    pub fn zoom_out(&mut self) {
        self.zoom /= ZOOM_STEP;
        debug!(zoom = self.zoom; "Zoomed out");
    }

    /// Converts a point in view coordinates to canvas coordinates.
    pub fn view_to_canvas(&self, view: Point) -> Point {
        view.scale(1.0 / self.zoom)
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn contains_box(&self, key: &EntityKey) -> bool {
        self.boxes.contains_key(key)
    }

    /// Places the box for `key`, creating its solver variables on first use.
    ///
    /// Moving an existing box marks every connector attached to it dirty.
    pub fn place_box(&mut self, key: &EntityKey, bounds: Bounds) -> Result<(), LintmapError> {
        let center = bounds.center();
        let half = bounds.to_size().half_extents();

        if let Some(vars) = self.boxes.get(key).copied() {
            self.solver.set_value(vars.cx, center.x())?;
            self.solver.set_value(vars.cy, center.y())?;
            self.solver.set_value(vars.half_width, half.x())?;
            self.solver.set_value(vars.half_height, half.y())?;
        } else {
            let vars = BoxVariables {
                cx: self.solver.add_variable(center.x()),
                cy: self.solver.add_variable(center.y()),
                half_width: self.solver.add_variable(half.x()),
                half_height: self.solver.add_variable(half.y()),
            };
            self.boxes.insert(key.clone(), vars);
        }
        trace!(key:% = key, x = center.x(), y = center.y(); "Placed box");
        Ok(())
    }

    /// Moves the box for `key` to `center`, keeping its size.
    ///
    /// The registry copy of the node follows the move.
    pub fn move_box(
        &mut self,
        registry: &Registry,
        key: &EntityKey,
        center: Point,
    ) -> Result<(), LintmapError> {
        let bounds = self
            .box_bounds(key)?
            .ok_or_else(|| LintmapError::UnknownEndpoint(key.clone()))?;
        self.place_box(key, Bounds::new_from_center(center, bounds.to_size()))?;
        registry.update(key, |node| node.set_position(center));
        Ok(())
    }

    /// Current bounds of the box for `key`.
    pub fn box_bounds(&self, key: &EntityKey) -> Result<Option<Bounds>, LintmapError> {
        let Some(vars) = self.boxes.get(key) else {
            return Ok(None);
        };
        let center = Point::new(self.solver.peek(vars.cx)?, self.solver.peek(vars.cy)?);
        let size = Size::new(
            self.solver.peek(vars.half_width)? * 2.0,
            self.solver.peek(vars.half_height)? * 2.0,
        );
        Ok(Some(Bounds::new_from_center(center, size)))
    }

    /// Removes the box for `key` together with every connector touching it.
    pub fn remove_box(&mut self, registry: &Registry, key: &EntityKey) -> Result<(), LintmapError> {
        let attached: Vec<EdgeId> = self
            .connectors
            .values()
            .filter(|connector| connector.head() == key || connector.tail() == key)
            .map(Connector::id)
            .collect();
        for edge in attached {
            self.remove_connector(registry, edge)?;
        }

        if let Some(vars) = self.boxes.shift_remove(key) {
            for id in [vars.cx, vars.cy, vars.half_width, vars.half_height] {
                self.solver.remove_variable(id)?;
            }
        }
        self.surface.remove(&PrimitiveId::ClassBox(key.clone()));
        debug!(key:% = key; "Removed box");
        Ok(())
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn connector(&self, edge: EdgeId) -> Option<&Connector> {
        self.connectors.get(&edge)
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// Resolved position of a connector handle.
    pub fn handle_position(&mut self, handle: HandleKey) -> Result<Option<Point>, LintmapError> {
        let Some(vars) = self.handles.get(&handle).copied() else {
            return Ok(None);
        };
        Ok(Some(Point::new(
            self.solver.value(vars.x)?,
            self.solver.value(vars.y)?,
        )))
    }

    /// Resolved head and tail positions of a connector.
    pub fn connector_endpoints(&mut self, edge: EdgeId) -> Result<Option<(Point, Point)>, LintmapError> {
        let head = self.handle_position(HandleKey::head(edge))?;
        let tail = self.handle_position(HandleKey::tail(edge))?;
        Ok(head.zip(tail))
    }

    /// Removes one connector, its constraint and its handle variables.
    pub fn remove_connector(&mut self, registry: &Registry, edge: EdgeId) -> Result<(), LintmapError> {
        let Some(connector) = self.connectors.shift_remove(&edge) else {
            return Ok(());
        };
        self.solver.remove_constraint(connector.constraint)?;
        for handle in [connector.head_handle(), connector.tail_handle()] {
            if let Some(vars) = self.handles.remove(&handle) {
                self.solver.remove_variable(vars.x)?;
                self.solver.remove_variable(vars.y)?;
            }
        }
        for key in [connector.head(), connector.tail()] {
            registry.update(key, |node| node.retain_handles(|handle| handle.edge != edge));
        }
        self.surface.remove(&PrimitiveId::Connector(edge));
        Ok(())
    }

    /// Drops every connector and clears every node's handle list.
    pub fn clear_connectors(&mut self, registry: &Registry) -> Result<(), LintmapError> {
        let count = self.connectors.len();
        for (edge, connector) in std::mem::take(&mut self.connectors) {
            self.solver.remove_constraint(connector.constraint)?;
            self.surface.remove(&PrimitiveId::Connector(edge));
        }
        for (_, vars) in self.handles.drain() {
            self.solver.remove_variable(vars.x)?;
            self.solver.remove_variable(vars.y)?;
        }
        for node in registry.all_entries() {
            registry.update(node.key(), ClassNode::clear_handles);
        }
        debug!(count; "Cleared connectors");
        Ok(())
    }

    /// Resolves every constraint and re-renders all boxes and connectors.
    pub fn refresh(&mut self, registry: &Registry) -> Result<(), LintmapError> {
        self.solver.solve()?;
        for node in registry.all_entries() {
            self.render_node(&node)?;
        }
        let edges: Vec<EdgeId> = self.connectors.keys().copied().collect();
        for edge in edges {
            self.render_connector(edge)?;
        }
        Ok(())
    }

    /// Re-renders the box of a single node.
    pub fn render_node(&mut self, node: &ClassNode) -> Result<(), LintmapError> {
        let Some(bounds) = self.box_bounds(node.key())? else {
            return Ok(());
        };
        self.surface.add(Primitive::ClassBox(ClassBoxPrimitive {
            key: node.key().clone(),
            title: node.title().to_string(),
            bounds,
            error_count: node.errors().len(),
            severe: node.errors().iter().any(|marker| marker.kind.is_severe()),
        }));
        Ok(())
    }

    pub(crate) fn render_connector(&mut self, edge: EdgeId) -> Result<(), LintmapError> {
        let Some((head, tail)) = self.connector_endpoints(edge)? else {
            return Ok(());
        };
        let Some(connector) = self.connectors.get(&edge) else {
            return Ok(());
        };
        self.surface.add(Primitive::Connector(ConnectorPrimitive {
            edge,
            head,
            tail,
            arrowhead: connector.arrowhead,
            arrowtail: connector.arrowtail,
        }));
        Ok(())
    }

    /// The topmost box under `view`, a point in view coordinates.
    pub fn hit_test(&self, view: Point) -> Result<Option<EntityKey>, LintmapError> {
        let point = self.view_to_canvas(view);
        for key in self.boxes.keys().rev() {
            let hit = self
                .box_bounds(key)?
                .is_some_and(|bounds| bounds.contains(point));
            if hit {
                return Ok(Some(key.clone()));
            }
        }
        Ok(None)
    }

    /// Source location of the box under `view`, if any.
    pub fn on_double_click(
        &self,
        registry: &Registry,
        view: Point,
    ) -> Result<Option<NavigationTarget>, LintmapError> {
        let Some(key) = self.hit_test(view)? else {
            return Ok(None);
        };
        Ok(registry
            .lookup(&key)
            .map(|node| NavigationTarget::for_node(&node)))
    }

    pub(crate) fn box_variables(&self, key: &EntityKey) -> Option<BoxVariables> {
        self.boxes.get(key).copied()
    }

    pub(crate) fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    pub(crate) fn allocate_edge(&mut self) -> EdgeId {
        let edge = EdgeId(self.next_edge);
        self.next_edge += 1;
        edge
    }

    pub(crate) fn insert_handle(&mut self, handle: HandleKey, vars: PointVariables) {
        self.handles.insert(handle, vars);
    }

    pub(crate) fn insert_connector(&mut self, connector: Connector) {
        self.connectors.insert(connector.id, connector);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(registry: &Registry, canvas: &mut Canvas, name: &str, center: Point) -> EntityKey {
        let key = EntityKey::new("shapes.py", name);
        let size = Size::new(100.0, 60.0);
        let mut node = ClassNode::new(key.clone(), name, 1, size);
        node.set_position(center);
        registry.register(key.clone(), node);
        canvas
            .place_box(&key, Bounds::new_from_center(center, size))
            .unwrap();
        key
    }

    #[test]
    fn test_hit_test_respects_zoom() {
        let registry = Registry::new();
        let mut canvas = Canvas::default();
        let key = registered(&registry, &mut canvas, "Shape", Point::new(100.0, 100.0));

        assert_eq!(canvas.hit_test(Point::new(100.0, 100.0)).unwrap(), Some(key.clone()));
        assert_eq!(canvas.hit_test(Point::new(10.0, 10.0)).unwrap(), None);

        canvas.zoom_in();
        canvas.zoom_in();
        let view = Point::new(100.0 * ZOOM_STEP * ZOOM_STEP, 100.0 * ZOOM_STEP * ZOOM_STEP);
        assert_eq!(canvas.hit_test(view).unwrap(), Some(key));
        assert_eq!(canvas.hit_test(Point::new(100.0, 100.0)).unwrap(), None);
    }

    #[test]
    fn test_double_click_yields_source_location() {
        let registry = Registry::new();
        let mut canvas = Canvas::default();
        registered(&registry, &mut canvas, "Shape", Point::new(100.0, 100.0));

        let target = canvas
            .on_double_click(&registry, Point::new(120.0, 90.0))
            .unwrap()
            .unwrap();
        assert_eq!(target.filepath.to_str(), Some("shapes.py"));
        assert_eq!(target.line, 1);
        assert!(
            canvas
                .on_double_click(&registry, Point::new(500.0, 500.0))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_move_box_updates_registry() {
        let registry = Registry::new();
        let mut canvas = Canvas::default();
        let key = registered(&registry, &mut canvas, "Shape", Point::new(100.0, 100.0));

        canvas.move_box(&registry, &key, Point::new(300.0, 50.0)).unwrap();
        let bounds = canvas.box_bounds(&key).unwrap().unwrap();
        assert_eq!(bounds.center(), Point::new(300.0, 50.0));
        assert_eq!(bounds.width(), 100.0);
        assert_eq!(registry.lookup(&key).unwrap().position(), Point::new(300.0, 50.0));

        let missing = EntityKey::new("shapes.py", "Missing");
        assert!(matches!(
            canvas.move_box(&registry, &missing, Point::default()),
            Err(LintmapError::UnknownEndpoint(_))
        ));
    }

    #[test]
    fn test_refresh_renders_boxes() {
        let registry = Registry::new();
        let mut canvas = Canvas::default();
        let key = registered(&registry, &mut canvas, "Shape", Point::new(100.0, 100.0));

        canvas.refresh(&registry).unwrap();
        assert_eq!(canvas.surface().primitives().len(), 1);

        canvas.remove_box(&registry, &key).unwrap();
        assert!(canvas.surface().primitives().is_empty());
        assert_eq!(canvas.box_count(), 0);
    }
}
