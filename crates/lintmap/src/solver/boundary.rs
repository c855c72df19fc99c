//! Boundary constraint: pins both ends of a connector to the borders of the
//! boxes it joins.

use lintmap_core::geometry::{Bounds, Point, Segment, Size};

use super::{Constraint, Resolution, SolverError, VariableId};

/// Solver variables describing a box: center and half-extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxVariables {
    pub cx: VariableId,
    pub cy: VariableId,
    pub half_width: VariableId,
    pub half_height: VariableId,
}

impl BoxVariables {
    fn read(&self, resolution: &Resolution<'_>) -> Result<Bounds, SolverError> {
        let center = Point::new(resolution.get(self.cx)?, resolution.get(self.cy)?);
        let size = Size::new(
            resolution.get(self.half_width)? * 2.0,
            resolution.get(self.half_height)? * 2.0,
        );
        Ok(Bounds::new_from_center(center, size))
    }
}

/// Solver variables describing a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointVariables {
    pub x: VariableId,
    pub y: VariableId,
}

impl PointVariables {
    fn write(&self, resolution: &mut Resolution<'_>, point: Point) -> Result<(), SolverError> {
        resolution.set(self.x, point.x())?;
        resolution.set(self.y, point.y())
    }
}

/// Point where the line from the center of `bounds` toward `peer` leaves
/// the box.
///
/// Edges are tried in the order top, bottom, left, right; the first crossing
/// wins, so a line through a corner resolves to the top or bottom edge.
/// Returns `None` when nothing is crossed, e.g. when `peer` lies inside the
/// box.
pub fn boundary_point(bounds: Bounds, peer: Point) -> Option<Point> {
    let line = Segment::new(bounds.center(), peer);
    bounds
        .edges()
        .iter()
        .find_map(|edge| line.intersection(edge))
}

/// Keeps a head handle and a tail handle on the borders of their boxes.
///
/// Independent: both boxes' centers and half-extents. Dependent: both
/// handles' coordinates. A handle whose center line crosses no edge keeps
/// its previous position.
#[derive(Debug)]
pub struct BoundaryConstraint {
    head_box: BoxVariables,
    tail_box: BoxVariables,
    head: PointVariables,
    tail: PointVariables,
    independent: [VariableId; 8],
    dependent: [VariableId; 4],
}

impl BoundaryConstraint {
    pub fn new(
        head_box: BoxVariables,
        tail_box: BoxVariables,
        head: PointVariables,
        tail: PointVariables,
    ) -> Self {
        Self {
            head_box,
            tail_box,
            head,
            tail,
            independent: [
                head_box.cx,
                head_box.cy,
                head_box.half_width,
                head_box.half_height,
                tail_box.cx,
                tail_box.cy,
                tail_box.half_width,
                tail_box.half_height,
            ],
            dependent: [head.x, head.y, tail.x, tail.y],
        }
    }
}

impl Constraint for BoundaryConstraint {
    fn independent(&self) -> &[VariableId] {
        &self.independent
    }

    fn dependent(&self) -> &[VariableId] {
        &self.dependent
    }

    fn solve(&self, resolution: &mut Resolution<'_>) -> Result<(), SolverError> {
        let head_bounds = self.head_box.read(resolution)?;
        let tail_bounds = self.tail_box.read(resolution)?;

        if let Some(point) = boundary_point(head_bounds, tail_bounds.center()) {
            self.head.write(resolution, point)?;
        }
        if let Some(point) = boundary_point(tail_bounds, head_bounds.center()) {
            self.tail.write(resolution, point)?;
        }
        Ok(())
    }
}
