//! Connector end decorations and the logical drawing contract.
//!
//! No pixel backend lives in this workspace. Drawing is expressed as a list
//! of [`PathCommand`]s in canvas coordinates, which a rendering surface may
//! replay onto any 2D path API.
//!
//! Each decoration routine is defined in a local frame whose origin is the
//! connector endpoint and whose positive x axis points along the connector,
//! away from the decorated box. [`EndpointFrame`] maps that frame onto the
//! canvas.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::geometry::Point;

/// Decoration drawn at one end of a connector.
///
/// The set is closed; every consumer matches it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Decoration {
    /// Non-navigable end, drawn as a small "x" crossmark.
    #[default]
    None,
    /// Navigable end, drawn as an open arrowhead.
    Navigable,
    /// Shared aggregation, drawn as an open diamond.
    Empty,
    /// Composite aggregation, drawn as a filled diamond.
    Diamond,
    /// Unspecified end; nothing is drawn.
    Undefined,
}

/// Error returned when a decoration style name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown decoration style: `{0}`")]
pub struct DecorationParseError(String);

impl DecorationParseError {
    /// The rejected style name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Decoration {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Navigable => "navigable",
            Self::Empty => "empty",
            Self::Diamond => "diamond",
            Self::Undefined => "undefined",
        }
    }

    /// Path commands for this decoration in its local frame.
    pub fn local_commands(self) -> Vec<PathCommand> {
        match self {
            Self::None => vec![
                PathCommand::MoveTo(Point::new(6.0, -4.0)),
                PathCommand::LineTo(Point::new(14.0, 4.0)),
                PathCommand::MoveTo(Point::new(14.0, -4.0)),
                PathCommand::LineTo(Point::new(6.0, 4.0)),
                PathCommand::Stroke,
            ],
            Self::Navigable => vec![
                PathCommand::MoveTo(Point::new(15.0, -6.0)),
                PathCommand::LineTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(15.0, 6.0)),
                PathCommand::Stroke,
            ],
            Self::Empty => {
                let mut commands = diamond_outline();
                commands.push(PathCommand::Stroke);
                commands
            }
            Self::Diamond => {
                let mut commands = diamond_outline();
                commands.push(PathCommand::Fill);
                commands
            }
            Self::Undefined => Vec::new(),
        }
    }

    /// Path commands for this decoration placed at `endpoint`, pointing
    /// toward `toward` (the opposite end of the connector).
    pub fn commands_at(self, endpoint: Point, toward: Point) -> Vec<PathCommand> {
        let frame = EndpointFrame::new(endpoint, toward);
        self.local_commands()
            .into_iter()
            .map(|command| frame.map_command(command))
            .collect()
    }
}

fn diamond_outline() -> Vec<PathCommand> {
    vec![
        PathCommand::MoveTo(Point::new(20.0, 0.0)),
        PathCommand::LineTo(Point::new(10.0, -6.0)),
        PathCommand::LineTo(Point::new(0.0, 0.0)),
        PathCommand::LineTo(Point::new(10.0, 6.0)),
        PathCommand::ClosePath,
    ]
}

impl fmt::Display for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Decoration {
    type Err = DecorationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "open" | "navigable" => Ok(Self::Navigable),
            "empty" | "shared" => Ok(Self::Empty),
            "diamond" | "composite" => Ok(Self::Diamond),
            "undefined" => Ok(Self::Undefined),
            _ => Err(DecorationParseError(s.to_string())),
        }
    }
}

/// A single logical path operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
    Stroke,
    Fill,
}

/// Local drawing frame anchored at a connector endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointFrame {
    origin: Point,
    axis: Point,
}

impl EndpointFrame {
    /// Creates a frame at `origin` whose x axis points toward `toward`.
    ///
    /// Coincident points fall back to the canvas x axis.
    pub fn new(origin: Point, toward: Point) -> Self {
        let axis = toward
            .sub_point(origin)
            .normalize()
            .unwrap_or(Point::new(1.0, 0.0));
        Self { origin, axis }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Unit vector of the frame's x axis.
    pub fn axis(&self) -> Point {
        self.axis
    }

    /// Maps a point from the local frame onto the canvas.
    pub fn to_canvas(&self, local: Point) -> Point {
        let along = self.axis.scale(local.x());
        let across = self.axis.perpendicular().scale(local.y());
        self.origin.add_point(along).add_point(across)
    }

    fn map_command(&self, command: PathCommand) -> PathCommand {
        match command {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(self.to_canvas(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(self.to_canvas(p)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("open".parse(), Ok(Decoration::Navigable));
        assert_eq!("navigable".parse(), Ok(Decoration::Navigable));
        assert_eq!("shared".parse(), Ok(Decoration::Empty));
        assert_eq!("composite".parse(), Ok(Decoration::Diamond));
        assert_eq!("none".parse(), Ok(Decoration::None));
        assert_eq!("undefined".parse(), Ok(Decoration::Undefined));
    }

    #[test]
    fn test_parse_unknown_is_error() {
        let err = "node".parse::<Decoration>().unwrap_err();
        assert_eq!(err.name(), "node");
        assert_eq!(err.to_string(), "Unknown decoration style: `node`");
    }

    #[test]
    fn test_undefined_draws_nothing() {
        assert!(Decoration::Undefined.local_commands().is_empty());
    }

    #[test]
    fn test_diamond_fills_and_empty_strokes() {
        assert_eq!(
            Decoration::Diamond.local_commands().last(),
            Some(&PathCommand::Fill)
        );
        assert_eq!(
            Decoration::Empty.local_commands().last(),
            Some(&PathCommand::Stroke)
        );
    }

    #[test]
    fn test_frame_points_toward_peer() {
        let frame = EndpointFrame::new(Point::new(10.0, 10.0), Point::new(10.0, 110.0));
        let tip = frame.to_canvas(Point::new(20.0, 0.0));
        assert!(approx_eq!(f64, tip.x(), 10.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, tip.y(), 30.0, epsilon = 1e-9));
    }

    #[test]
    fn test_arrow_tip_at_endpoint() {
        let commands = Decoration::Navigable.commands_at(Point::new(5.0, 5.0), Point::new(50.0, 5.0));
        assert_eq!(commands[1], PathCommand::LineTo(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_coincident_frame_uses_x_axis() {
        let frame = EndpointFrame::new(Point::new(3.0, 3.0), Point::new(3.0, 3.0));
        assert_eq!(frame.axis(), Point::new(1.0, 0.0));
    }
}
