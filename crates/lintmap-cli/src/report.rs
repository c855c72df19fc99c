//! Plain-text rendering of a diagram session.

use std::fmt;

use lintmap::{
    DiagramSession,
    reporting::LintSummary,
    scan::ScanOutcome,
    surface::{ClassBoxPrimitive, ConnectorPrimitive, Primitive},
};

/// Textual report of the classes, connectors and problems of a diagram.
pub struct DiagramReport<'a> {
    session: &'a DiagramSession,
    outcome: &'a ScanOutcome,
    lint: Option<&'a LintSummary>,
}

impl<'a> DiagramReport<'a> {
    pub fn new(
        session: &'a DiagramSession,
        outcome: &'a ScanOutcome,
        lint: Option<&'a LintSummary>,
    ) -> Self {
        Self {
            session,
            outcome,
            lint,
        }
    }

    fn write_class(&self, f: &mut fmt::Formatter<'_>, class_box: &ClassBoxPrimitive) -> fmt::Result {
        let center = class_box.bounds.center();
        let node = self
            .session
            .context()
            .registry()
            .lookup(&class_box.key);
        writeln!(
            f,
            "  {} [{}:{}] center=({:.1}, {:.1}) size={:.1}x{:.1} errors={}",
            class_box.title,
            class_box.key.filepath().display(),
            node.as_ref().map_or(0, |node| node.line()),
            center.x(),
            center.y(),
            class_box.bounds.width(),
            class_box.bounds.height(),
            class_box.error_count,
        )?;
        for marker in node.iter().flat_map(|node| node.errors()) {
            writeln!(
                f,
                "    {} {} line {}: {}",
                marker.kind, marker.code, marker.line, marker.message
            )?;
        }
        Ok(())
    }

    fn write_connector(&self, f: &mut fmt::Formatter<'_>, primitive: &ConnectorPrimitive) -> fmt::Result {
        let Some(connector) = self.session.canvas().connector(primitive.edge) else {
            return Ok(());
        };
        writeln!(
            f,
            "  {} -> {} head={} tail={} from ({:.1}, {:.1}) to ({:.1}, {:.1})",
            connector.head().qualified_name(),
            connector.tail().qualified_name(),
            primitive.arrowhead,
            primitive.arrowtail,
            primitive.head.x(),
            primitive.head.y(),
            primitive.tail.x(),
            primitive.tail.y(),
        )
    }
}

impl fmt::Display for DiagramReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let primitives = self.session.canvas().surface().primitives();

        let mut classes: Vec<&ClassBoxPrimitive> = primitives
            .iter()
            .filter_map(|primitive| match primitive {
                Primitive::ClassBox(class_box) => Some(class_box),
                Primitive::Connector(_) => None,
            })
            .collect();
        classes.sort_by(|a, b| a.key.cmp(&b.key));

        let mut connectors: Vec<&ConnectorPrimitive> = primitives
            .iter()
            .filter_map(|primitive| match primitive {
                Primitive::Connector(connector) => Some(connector),
                Primitive::ClassBox(_) => None,
            })
            .collect();
        connectors.sort_by_key(|connector| connector.edge);

        writeln!(f, "classes: {}", classes.len())?;
        for class_box in classes {
            self.write_class(f, class_box)?;
        }

        writeln!(f, "connectors: {}", connectors.len())?;
        for connector in connectors {
            self.write_connector(f, connector)?;
        }

        writeln!(f, "extraction errors: {}", self.outcome.errors.len())?;
        for error in &self.outcome.errors {
            match error.line() {
                Some(line) => writeln!(f, "  {}:{line}: {}", error.filepath().display(), error.message())?,
                None => writeln!(f, "  {}", error)?,
            }
        }

        if let Some(lint) = self.lint {
            writeln!(
                f,
                "lint: attached={} filtered={} ignored={} unresolved={} module_errors={}",
                lint.attached,
                lint.filtered,
                lint.ignored,
                lint.unresolved,
                lint.module_errors.len()
            )?;
        }
        Ok(())
    }
}
