//! Connector construction.
//!
//! A connector is two handle points bound to the borders of its boxes by a
//! [`BoundaryConstraint`]. Building one allocates the handle variables in the
//! solver, records the handle keys on both nodes, registers the constraint
//! and hands the resulting primitive to the drawing surface.

use log::debug;

use lintmap_core::{draw::Decoration, identifier::EntityKey, semantic::AssociationDescriptor};

use crate::{
    LintmapError,
    canvas::{Canvas, Connector, EdgeId, HandleKey},
    registry::Registry,
    solver::{BoundaryConstraint, PointVariables},
};

/// Builds connectors between class boxes already on a canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionBuilder;

impl ConnectionBuilder {
    /// Connects the two classes of `association`.
    ///
    /// # Errors
    ///
    /// Returns [`LintmapError::UnknownEndpoint`] when either class has no
    /// box on `canvas`.
    pub fn connect(
        canvas: &mut Canvas,
        registry: &Registry,
        association: &AssociationDescriptor,
    ) -> Result<EdgeId, LintmapError> {
        Self::connect_keys(
            canvas,
            registry,
            association.head(),
            association.tail(),
            association.arrowhead(),
            association.arrowtail(),
        )
    }

    /// Connects `head` to `tail` using decoration style names.
    ///
    /// # Errors
    ///
    /// Returns [`LintmapError::UnknownStyle`] when a style name is not
    /// recognized, before anything is added to the canvas.
    pub fn connect_styled(
        canvas: &mut Canvas,
        registry: &Registry,
        head: &EntityKey,
        tail: &EntityKey,
        arrowhead: &str,
        arrowtail: &str,
    ) -> Result<EdgeId, LintmapError> {
        let arrowhead: Decoration = arrowhead.parse()?;
        let arrowtail: Decoration = arrowtail.parse()?;
        Self::connect_keys(canvas, registry, head, tail, arrowhead, arrowtail)
    }

    fn connect_keys(
        canvas: &mut Canvas,
        registry: &Registry,
        head: &EntityKey,
        tail: &EntityKey,
        arrowhead: Decoration,
        arrowtail: Decoration,
    ) -> Result<EdgeId, LintmapError> {
        let head_box = canvas
            .box_variables(head)
            .ok_or_else(|| LintmapError::UnknownEndpoint(head.clone()))?;
        let tail_box = canvas
            .box_variables(tail)
            .ok_or_else(|| LintmapError::UnknownEndpoint(tail.clone()))?;

        let edge = canvas.allocate_edge();
        let solver = canvas.solver_mut();

        // Handles start at their box centers
        let head_center = (solver.peek(head_box.cx)?, solver.peek(head_box.cy)?);
        let tail_center = (solver.peek(tail_box.cx)?, solver.peek(tail_box.cy)?);
        let head_vars = PointVariables {
            x: solver.add_variable(head_center.0),
            y: solver.add_variable(head_center.1),
        };
        let tail_vars = PointVariables {
            x: solver.add_variable(tail_center.0),
            y: solver.add_variable(tail_center.1),
        };
        let constraint = match solver.add_constraint(Box::new(BoundaryConstraint::new(
            head_box, tail_box, head_vars, tail_vars,
        ))) {
            Ok(constraint) => constraint,
            Err(err) => {
                for id in [head_vars.x, head_vars.y, tail_vars.x, tail_vars.y] {
                    solver.remove_variable(id)?;
                }
                return Err(err.into());
            }
        };

        canvas.insert_handle(HandleKey::head(edge), head_vars);
        canvas.insert_handle(HandleKey::tail(edge), tail_vars);
        registry.update(head, |node| node.add_handle(HandleKey::head(edge)));
        registry.update(tail, |node| node.add_handle(HandleKey::tail(edge)));

        canvas.insert_connector(Connector::new(
            edge,
            head.clone(),
            tail.clone(),
            arrowhead,
            arrowtail,
            constraint,
        ));
        if let Err(err) = canvas.render_connector(edge) {
            canvas.remove_connector(registry, edge)?;
            return Err(err);
        }

        debug!(
            edge:% = edge,
            head:% = head,
            tail:% = tail,
            arrowhead = arrowhead.name();
            "Connected classes"
        );
        Ok(edge)
    }
}
