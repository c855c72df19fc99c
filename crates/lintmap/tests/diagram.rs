use std::{fs, path::Path, sync::Arc, time::Duration};

use float_cmp::approx_eq;
use lintmap::{
    DiagramSession,
    canvas::{Canvas, Connector, EdgeId, HandleKey},
    config::{LayoutConfig, NodeStyle},
    connection::ConnectionBuilder,
    context::{AppContext, ExclusionList},
    draw::{Decoration, PathCommand},
    geometry::{Bounds, Point},
    identifier::EntityKey,
    layout::{Engine, LayoutNode, measure_title},
    registry::{ClassNode, Registry},
    surface::{Primitive, PrimitiveId},
};
use lintmap_parser::{OutlineExtractor, parse_lint_output};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(30);

const SHAPES: &str = "\
class B:
    pass


class C:
    pass


class A(B):
    def __init__(self):
        self.c = C()
";

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn session() -> DiagramSession {
    DiagramSession::new(AppContext::default(), Arc::new(OutlineExtractor::new()))
}

fn key(dir: &TempDir, name: &str) -> EntityKey {
    EntityKey::new(dir.path().join("shapes.py"), name)
}

fn on_perimeter(bounds: Bounds, point: Point) -> bool {
    let eps = 1e-6;
    let within_x = point.x() >= bounds.min_x() - eps && point.x() <= bounds.max_x() + eps;
    let within_y = point.y() >= bounds.min_y() - eps && point.y() <= bounds.max_y() + eps;
    let on_vertical = approx_eq!(f64, point.x(), bounds.min_x(), epsilon = eps)
        || approx_eq!(f64, point.x(), bounds.max_x(), epsilon = eps);
    let on_horizontal = approx_eq!(f64, point.y(), bounds.min_y(), epsilon = eps)
        || approx_eq!(f64, point.y(), bounds.max_y(), epsilon = eps);
    within_x && within_y && (on_vertical || on_horizontal)
}

fn connector_from<'a>(session: &'a DiagramSession, head: &EntityKey) -> &'a Connector {
    session
        .canvas()
        .connectors()
        .find(|connector| connector.head() == head)
        .expect("connector should exist")
}

#[test]
fn test_inheritance_and_composition_are_connected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shapes.py", SHAPES);

    let mut session = session();
    let outcome = session.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();
    assert_eq!(outcome.added, 3);
    assert_eq!(outcome.connectors, 2);
    assert!(outcome.errors.is_empty());

    let (a, b, c) = (key(&dir, "A"), key(&dir, "B"), key(&dir, "C"));
    let registry = session.context().registry().clone();
    assert_eq!(registry.len(), 3);

    let inheritance = connector_from(&session, &b);
    assert_eq!(inheritance.tail(), &a);
    assert_eq!(inheritance.arrowhead(), Decoration::Empty);
    assert_eq!(inheritance.arrowtail(), Decoration::None);

    let composition = connector_from(&session, &a);
    assert_eq!(composition.tail(), &c);
    assert_eq!(composition.arrowhead(), Decoration::Diamond);
    assert_eq!(composition.arrowtail(), Decoration::None);

    let edges: Vec<_> = session.canvas().connectors().map(Connector::id).collect();
    for edge in edges {
        let connector = session.canvas().connector(edge).unwrap().clone();
        let head_bounds = session.canvas().box_bounds(connector.head()).unwrap().unwrap();
        let tail_bounds = session.canvas().box_bounds(connector.tail()).unwrap().unwrap();
        let (head, tail) = session
            .canvas_mut()
            .connector_endpoints(edge)
            .unwrap()
            .unwrap();
        if !head_bounds.contains(tail_bounds.center()) {
            assert!(on_perimeter(head_bounds, head), "{head:?} not on {head_bounds:?}");
        }
        if !tail_bounds.contains(head_bounds.center()) {
            assert!(on_perimeter(tail_bounds, tail), "{tail:?} not on {tail_bounds:?}");
        }
    }

    // Each node knows its handles by key
    assert_eq!(registry.lookup(&a).unwrap().handles().len(), 2);
    assert_eq!(registry.lookup(&b).unwrap().handles().len(), 1);
    assert_eq!(registry.lookup(&c).unwrap().handles().len(), 1);

    // Three boxes and two connectors on the surface
    let primitives = session.canvas().surface().primitives();
    assert_eq!(primitives.len(), 5);
    let composition_edge = connector_from(&session, &a).id();
    let drawn = primitives
        .iter()
        .find(|primitive| primitive.id() == PrimitiveId::Connector(composition_edge))
        .unwrap();
    assert!(drawn.draw().contains(&PathCommand::Fill));
}

fn assert_near(actual: Point, expected: Point) {
    assert!(
        approx_eq!(f64, actual.x(), expected.x(), epsilon = 1e-9)
            && approx_eq!(f64, actual.y(), expected.y(), epsilon = 1e-9),
        "{actual:?} != {expected:?}"
    );
}

fn drawn_connector(canvas: &Canvas, edge: EdgeId) -> Vec<PathCommand> {
    canvas
        .surface()
        .primitives()
        .into_iter()
        .find(|primitive| primitive.id() == PrimitiveId::Connector(edge))
        .map(Primitive::draw)
        .expect("connector should be drawn")
}

#[test]
fn test_composite_and_navigable_ends_are_decorated() {
    let (a, b, c) = (
        EntityKey::new("abc.py", "A"),
        EntityKey::new("abc.py", "B"),
        EntityKey::new("abc.py", "C"),
    );
    let style = NodeStyle::default();
    let nodes: Vec<LayoutNode> = [&a, &b, &c]
        .into_iter()
        .map(|key| LayoutNode::new(key.clone(), measure_title(key.qualified_name(), &style)))
        .collect();
    let edges = vec![(a.clone(), b.clone()), (b.clone(), c.clone())];
    let layout = Engine::from_config(&LayoutConfig::default())
        .calculate(&nodes, &edges)
        .unwrap();

    let registry = Registry::new();
    let mut canvas = Canvas::default();
    for node in &nodes {
        let class = ClassNode::new(node.key.clone(), node.key.qualified_name(), 1, node.size);
        registry.register(node.key.clone(), class);
        canvas
            .place_box(&node.key, layout.bounds(&node.key).unwrap())
            .unwrap();
    }

    let composite =
        ConnectionBuilder::connect_styled(&mut canvas, &registry, &a, &b, "composite", "none").unwrap();
    let navigable =
        ConnectionBuilder::connect_styled(&mut canvas, &registry, &b, &c, "none", "navigable").unwrap();

    assert_eq!(registry.len(), 3);
    assert_eq!(canvas.connector_count(), 2);
    assert!(registry.lookup(&a).unwrap().handles().contains(&HandleKey::head(composite)));
    assert!(registry.lookup(&c).unwrap().handles().contains(&HandleKey::tail(navigable)));

    // Line, then the head decoration, then the tail decoration
    let a_handle = canvas.handle_position(HandleKey::head(composite)).unwrap().unwrap();
    let commands = drawn_connector(&canvas, composite);
    assert_eq!(commands[8], PathCommand::Fill);
    match commands[5] {
        PathCommand::LineTo(tip) => assert_near(tip, a_handle),
        other => panic!("unexpected command {other:?}"),
    }
    assert!(!commands[9..].contains(&PathCommand::Fill));

    let c_handle = canvas.handle_position(HandleKey::tail(navigable)).unwrap().unwrap();
    let commands = drawn_connector(&canvas, navigable);
    assert_eq!(commands.len(), 3 + 5 + 4);
    match commands[9] {
        PathCommand::LineTo(tip) => assert_near(tip, c_handle),
        other => panic!("unexpected command {other:?}"),
    }
    assert!(!commands.contains(&PathCommand::Fill));

    let bounds = layout.bounds(&c).unwrap();
    if !bounds.contains(layout.position(&b).unwrap()) {
        assert!(on_perimeter(bounds, c_handle), "{c_handle:?} not on {bounds:?}");
    }
}

#[test]
fn test_broken_module_does_not_stop_the_scan() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shapes.py", SHAPES);
    write(dir.path(), "broken.py", "class Broken(B)\n    pass\n");
    write(dir.path(), "extra.py", "class Extra:\n    pass\n");

    let mut session = session();
    let outcome = session.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();
    assert_eq!(outcome.added, 4);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].filepath().ends_with("broken.py"));

    // The skipped module surfaces in the lint pass next to the findings
    let summary = session.apply_lint(&[]).unwrap();
    assert_eq!(summary.module_errors.len(), 1);
    assert!(summary.module_errors[0].contains("broken.py:1:"), "{:?}", summary.module_errors);
}

#[test]
fn test_excluded_paths_are_skipped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shapes.py", SHAPES);
    write(dir.path(), "vendor/lib.py", "class Vendored:\n    pass\n");

    let exclusions: ExclusionList = ["vendor"].into_iter().collect();
    let context = AppContext::default().with_exclusions(exclusions);
    let mut session = DiagramSession::new(context, Arc::new(OutlineExtractor::new()));
    let outcome = session.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();
    assert_eq!(outcome.added, 3);
}

#[test]
fn test_layout_is_deterministic() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shapes.py", SHAPES);

    let positions = |session: &DiagramSession| {
        session
            .context()
            .registry()
            .all_entries()
            .iter()
            .map(|node| (node.key().clone(), node.position()))
            .collect::<Vec<_>>()
    };

    let mut first = session();
    first.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();
    let mut second = session();
    second.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();
    assert_eq!(positions(&first), positions(&second));

    for (_, position) in positions(&first) {
        assert!(position.x() > 0.0 && position.y() > 0.0);
    }
}

#[test]
fn test_rescan_evicts_and_keeps_markers_until_next_lint_pass() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shapes.py", SHAPES);

    let mut session = session();
    session.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();

    let report = parse_lint_output(
        "************* Module shapes\n\
         shapes.py:9: [C0111(missing-docstring), A] Missing docstring\n\
         shapes.py:1: [C0114(missing-module-docstring), ] Missing module docstring\n",
    );
    let summary = session.apply_lint(&report.findings).unwrap();
    assert_eq!(summary.attached, 1);
    assert_eq!(summary.unresolved, 1);

    let a = key(&dir, "A");
    match session
        .canvas()
        .surface()
        .primitives()
        .into_iter()
        .find(|primitive| primitive.id() == PrimitiveId::ClassBox(a.clone()))
    {
        Some(Primitive::ClassBox(class_box)) => assert_eq!(class_box.error_count, 1),
        other => panic!("Expected class box, got {other:?}"),
    }

    write(
        dir.path(),
        "shapes.py",
        "class B:\n    pass\n\n\nclass A(B):\n    pass\n",
    );
    let outcome = session.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();
    assert_eq!((outcome.added, outcome.updated, outcome.removed), (0, 2, 1));
    assert_eq!(outcome.connectors, 1);

    let registry = session.context().registry();
    assert!(!registry.contains(&key(&dir, "C")));
    let node = registry.lookup(&a).unwrap();
    assert_eq!(node.line(), 5);
    assert_eq!(node.errors().len(), 1);
    assert_eq!(node.handles().len(), 1);
}

#[test]
fn test_double_click_navigates_to_declaration() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shapes.py", SHAPES);

    let mut session = session();
    session.scan(&[dir.path().to_path_buf()], TIMEOUT).unwrap();

    let a = key(&dir, "A");
    let center = session.context().registry().lookup(&a).unwrap().position();
    session.canvas_mut().zoom_in();
    let view = center.scale(session.canvas().zoom());

    let registry = session.context().registry().clone();
    let target = session
        .canvas()
        .on_double_click(&registry, view)
        .unwrap()
        .unwrap();
    assert_eq!(target.filepath, dir.path().join("shapes.py"));
    assert_eq!(target.line, 9);
}
