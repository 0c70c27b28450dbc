use swarmview::viewer;

/// Launch the viewer. An optional first argument names an OBJ file under
/// `assets/` to scatter instead of the built-in sphere.
fn main() -> anyhow::Result<()> {
    let model_path = std::env::args().nth(1);
    viewer::run(model_path)
}
