use beluga::{Borders, Canvas, Constraint, Error, Solver, Strength};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn frame_is_inset_by_the_borders() {
    let canvas = Canvas::new(600.0, 400.0, Borders::uniform(20.0)).unwrap();
    let c = canvas.canvas_geometry();
    let f = canvas.frame_geometry();

    assert!(close(c.left, 0.0));
    assert!(close(c.right, 600.0));
    assert!(close(c.bottom, 400.0));
    assert!(close(f.left, 20.0));
    assert!(close(f.top, 20.0));
    assert!(close(f.right, 580.0));
    assert!(close(f.bottom, 380.0));
    assert!(close(f.width, 560.0));
    assert!(close(f.hcenter, 300.0));
}

#[test]
fn solving_twice_is_bit_identical() {
    let mut canvas = Canvas::new(640.0, 480.0, Borders::default()).unwrap();
    let first = canvas.frame_geometry();
    canvas.solve().unwrap();
    let second = canvas.frame_geometry();

    let bits = |g: beluga::BoxGeometry| {
        [
            g.left, g.top, g.right, g.bottom, g.width, g.height, g.hcenter, g.vcenter,
        ]
        .map(f64::to_bits)
    };
    assert_eq!(bits(first), bits(second));
}

#[test]
fn resize_moves_the_far_edges() {
    let mut canvas = Canvas::new(300.0, 300.0, Borders::default()).unwrap();
    canvas.set_size(500.0, 200.0).unwrap();
    canvas.solve().unwrap();

    let f = canvas.frame_geometry();
    assert!(close(f.left, 5.0));
    assert!(close(f.right, 495.0));
    assert!(close(f.bottom, 195.0));
    assert_eq!(canvas.size(), (500.0, 200.0));
}

#[test]
fn tiny_canvas_keeps_frame_extent_non_negative() {
    let canvas = Canvas::new(6.0, 4.0, Borders::uniform(10.0)).unwrap();
    let f = canvas.frame_geometry();
    assert!(f.width >= -1e-6);
    assert!(f.height >= -1e-6);
    assert!(f.left >= -1e-6);
    assert!(f.right <= canvas.canvas_geometry().right + 1e-6);
}

#[test]
fn conflicting_required_layout_is_reported() {
    let mut solver = Solver::new();
    let b = beluga::LayoutBox::new(&mut solver, "b").unwrap();
    solver
        .add_constraint(Constraint::eq(b.width, -10.0, Strength::Required))
        .unwrap();
    assert!(matches!(
        solver.update_variables(),
        Err(Error::Unsatisfiable { .. })
    ));
}
