//! Drawing surface abstraction.
//!
//! The canvas never draws pixels. It hands [`Primitive`]s to a
//! [`DrawingSurface`], and each primitive can describe itself as a list of
//! logical [`PathCommand`]s. [`RecordingSurface`] keeps primitives in memory
//! and is what the command-line tool and the tests use.

use std::fmt;

use indexmap::IndexMap;

use lintmap_core::{
    draw::{Decoration, PathCommand},
    geometry::{Bounds, Point},
    identifier::EntityKey,
};

use crate::canvas::EdgeId;

/// Height of the title band drawn at the top of each class box.
const TITLE_BAND: f64 = 20.0;

/// Identity of a primitive on a surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveId {
    ClassBox(EntityKey),
    Connector(EdgeId),
}

/// A class box as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBoxPrimitive {
    pub key: EntityKey,
    pub title: String,
    pub bounds: Bounds,
    pub error_count: usize,
    /// At least one marker is an error or fatal message.
    pub severe: bool,
}

/// A connector as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPrimitive {
    pub edge: EdgeId,
    pub head: Point,
    pub tail: Point,
    pub arrowhead: Decoration,
    pub arrowtail: Decoration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    ClassBox(ClassBoxPrimitive),
    Connector(ConnectorPrimitive),
}

impl Primitive {
    pub fn id(&self) -> PrimitiveId {
        match self {
            Self::ClassBox(class_box) => PrimitiveId::ClassBox(class_box.key.clone()),
            Self::Connector(connector) => PrimitiveId::Connector(connector.edge),
        }
    }

    /// The logical path commands that render this primitive.
    pub fn draw(&self) -> Vec<PathCommand> {
        match self {
            Self::ClassBox(class_box) => {
                let b = class_box.bounds;
                let band = (b.min_y() + TITLE_BAND).min(b.max_y());
                vec![
                    PathCommand::MoveTo(b.north_west()),
                    PathCommand::LineTo(b.north_east()),
                    PathCommand::LineTo(b.south_east()),
                    PathCommand::LineTo(b.south_west()),
                    PathCommand::ClosePath,
                    PathCommand::MoveTo(Point::new(b.min_x(), band)),
                    PathCommand::LineTo(Point::new(b.max_x(), band)),
                    PathCommand::Stroke,
                ]
            }
            Self::Connector(connector) => {
                let mut commands = vec![
                    PathCommand::MoveTo(connector.head),
                    PathCommand::LineTo(connector.tail),
                    PathCommand::Stroke,
                ];
                commands.extend(
                    connector
                        .arrowhead
                        .commands_at(connector.head, connector.tail),
                );
                commands.extend(
                    connector
                        .arrowtail
                        .commands_at(connector.tail, connector.head),
                );
                commands
            }
        }
    }
}

/// Receiver of the canvas's drawable content.
pub trait DrawingSurface: fmt::Debug + Send {
    /// Adds a primitive, replacing any primitive with the same id.
    fn add(&mut self, primitive: Primitive);

    fn remove(&mut self, id: &PrimitiveId) -> Option<Primitive>;

    /// Primitives in drawing order.
    fn primitives(&self) -> Vec<&Primitive>;
}

/// In-memory surface that records primitives in insertion order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    items: IndexMap<PrimitiveId, Primitive>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PrimitiveId) -> Option<&Primitive> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl DrawingSurface for RecordingSurface {
    fn add(&mut self, primitive: Primitive) {
        self.items.insert(primitive.id(), primitive);
    }

    fn remove(&mut self, id: &PrimitiveId) -> Option<Primitive> {
        self.items.shift_remove(id)
    }

    fn primitives(&self) -> Vec<&Primitive> {
        self.items.values().collect()
    }
}
