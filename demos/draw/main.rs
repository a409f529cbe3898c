//! Wayline demo — resolves two picks against a small way network,
//! stitches the path between them, and prints the derived point sets.
//!
//! Usage:
//! ```text
//! cargo run --example draw
//! RUST_LOG=wayline=debug cargo run --example draw
//! ```

use wayline::anchor::AnchorChain;
use wayline::engine::{EngineConfig, OffsetEngine};
use wayline::math::Point2;
use wayline::network::{SegmentRecord, SegmentRegistry};

fn main() -> wayline::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("wayline=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Three collinear segments with boundary runs two units to each side.
    let mut registry = SegmentRegistry::new();
    for i in 0..3 {
        let x0 = f64::from(i) * 10.0;
        let x1 = x0 + 10.0;
        registry.add_segment(SegmentRecord {
            a: Point2::new(x0, 0.0),
            b: Point2::new(x1, 0.0),
            boundaries: [
                vec![Point2::new(x0, 2.0), Point2::new(x1, 2.0)],
                vec![Point2::new(x0, -2.0), Point2::new(x1, -2.0)],
            ],
        });
    }
    let mut engine = OffsetEngine::new(registry, EngineConfig::default());

    // Two "clicks" slightly off the centerline.
    let mut chain = AnchorChain::new();
    for cursor in [Point2::new(3.0, 0.8), Point2::new(26.0, 0.8)] {
        match engine.resolve_anchor(&cursor, None, None)? {
            Some(anchor) => chain = chain.append(anchor, false).finalize_last(),
            None => println!("nothing resolvable near {cursor:?}"),
        }
    }

    let path = engine.resolve_path(&chain)?;
    println!("stitched path ({} vertices):", path.points.len());
    for p in &path.points {
        println!("  ({:.3}, {:.3})", p.x, p.y);
    }

    let schema = vec![
        ("left_rail".to_owned(), 1.0),
        ("axis".to_owned(), 0.0),
        ("right_rail".to_owned(), -1.0),
    ];
    let family = engine.point_sets(&chain, &schema)?;
    println!(
        "point sets (reference: {}):",
        family.reference.as_deref().unwrap_or("-")
    );
    for (name, points) in &family.sets {
        let first = points[0];
        let last = points[points.len() - 1];
        println!(
            "  {name}: {} vertices, ({:.3}, {:.3}) .. ({:.3}, {:.3})",
            points.len(),
            first.x,
            first.y,
            last.x,
            last.y
        );
    }
    Ok(())
}
