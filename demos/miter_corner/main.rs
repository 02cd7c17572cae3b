//! Resolves an L-shaped wall corner and triangulates the mitered layers.
//!
//! ```text
//! cargo run --example miter_corner
//! RUST_LOG=layer_miter=trace cargo run --example miter_corner
//! ```

use layer_miter::miter::{build_mitered_layer_geoms, MiteredLayerInput};
use layer_miter::{
    HostedPlane, LayerPriority, LayerSpec, MiterData, MiterEdge, MiterHost, PriorityGroup, Result, Tolerances,
    TriangulationParams,
};
use nalgebra::{Point3, Vector3};
use tracing::{info, warn};

fn assembly() -> Vec<LayerSpec> {
    vec![
        LayerSpec::new(1.5, LayerPriority::new(PriorityGroup::Finish, 0)),
        LayerSpec::new(14.0, LayerPriority::new(PriorityGroup::Structure, 0)),
        LayerSpec::new(1.5, LayerPriority::new(PriorityGroup::Finish, 0)),
    ]
}

fn walls() -> (HostedPlane, HostedPlane) {
    let p = Point3::new;
    let along_x = HostedPlane::new(
        1,
        vec![p(0.0, 0.0, 0.0), p(400.0, 0.0, 0.0), p(400.0, 0.0, 300.0), p(0.0, 0.0, 300.0)],
        Vector3::y(),
        assembly(),
    );
    let along_y = HostedPlane::new(
        2,
        vec![p(0.0, 0.0, 0.0), p(0.0, 0.0, 300.0), p(0.0, 300.0, 300.0), p(0.0, 300.0, 0.0)],
        Vector3::x(),
        assembly(),
    );
    (along_x, along_y)
}

/// One resolved miter per polygon edge of `host`, with `others` joining on
/// the edges they share.
fn miters_for(host: &HostedPlane, others: &[&dyn MiterHost]) -> Result<Vec<MiterData>> {
    let points = host.control_points();
    let tolerances = Tolerances::default();
    let mut miters = Vec::with_capacity(points.len());
    for i in 0..points.len() {
        let edge = MiterEdge::new(points[i], points[(i + 1) % points.len()]);
        let mut hosts: Vec<&dyn MiterHost> = vec![host];
        hosts.extend(others.iter().copied().filter(|other| {
            let shared = other.control_points();
            shared.contains(&edge.start) && shared.contains(&edge.end)
        }));

        let mut miter = MiterData::new(tolerances);
        miter.gather_details(&edge, &hosts)?;
        miter.calculate_mitering()?;
        miters.push(miter);
    }
    Ok(miters)
}

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("miter_corner=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let (along_x, along_y) = walls();
    let params = TriangulationParams::default();

    for (host, other) in [(&along_x, &along_y), (&along_y, &along_x)] {
        let miters = miters_for(host, &[other as &dyn MiterHost])?;
        let input = MiteredLayerInput::from_host(host, &miters)?;
        for (layer, geom) in build_mitered_layer_geoms(&input, &params.tolerances).into_iter().enumerate() {
            match geom.and_then(|def| def.triangulate_mesh(&params)) {
                Ok(mesh) => info!(host = host.host_id(), layer, triangles = mesh.triangle_count(), "layer mesh"),
                Err(error) => warn!(host = host.host_id(), layer, %error, "layer failed"),
            }
        }
    }
    Ok(())
}
