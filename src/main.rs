use anyhow::Result;
use pathweave::process::step::Order;
use pathweave::process::{anon, GraphTraversalSource, P};
use pathweave::structure::{detach, MemoryGraph, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG=pathweave=debug shows pipeline lifecycle
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Pathweave v{}", pathweave::version());
    println!("==========================================");
    println!();

    let graph = Arc::new(MemoryGraph::modern());
    let g = GraphTraversalSource::new(graph);

    demo_navigation(&g)?;
    demo_loops(&g)?;
    demo_aggregation(&g)?;
    demo_detachment(&g)?;
    Ok(())
}

fn show(title: &str, values: &[Value]) {
    println!("{}", title);
    for value in values {
        println!("  {}", value);
    }
}

fn demo_navigation(g: &GraphTraversalSource) -> Result<()> {
    println!("=== Demo 1: Navigation ===");
    let friends = g.v([1]).out(&["knows"]).values(&["name"]).to_list()?;
    show("marko knows:", &friends);

    let seniors = g
        .v_all()
        .has_label(&["person"])
        .has("age", P::gte(32))
        .order_by("age", Order::Asc)
        .values(&["name"])
        .to_list()?;
    show("people aged 32 and over:", &seniors);

    let co_creators = g
        .v([1])
        .out(&["created"])
        .in_(&["created"])
        .not(anon().has_id([1]))
        .values(&["name"])
        .dedup()
        .to_list()?;
    show("marko's co-creators:", &co_creators);
    println!();
    Ok(())
}

fn demo_loops(g: &GraphTraversalSource) -> Result<()> {
    println!("=== Demo 2: repeat / until / emit ===");
    let paths = g.v([1]).repeat(anon().out(&[])).times(2).path().to_list()?;
    show("two hops from marko:", &paths);

    let reached = g
        .v([1])
        .emit()
        .repeat(anon().out(&[]))
        .times(2)
        .values(&["name"])
        .to_list()?;
    show("marko and everything within two hops:", &reached);

    let to_ripple = g
        .v([1])
        .repeat(anon().out(&[]).simple_path())
        .until(anon().has("name", P::eq("ripple")))
        .path()
        .to_list()?;
    show("paths from marko to ripple:", &to_ripple);
    println!();
    Ok(())
}

fn demo_aggregation(g: &GraphTraversalSource) -> Result<()> {
    println!("=== Demo 3: Barriers ===");
    let edges = g.v_all().out_e(&[]).count().to_list()?;
    show("edge count:", &edges);

    let mean_age = g.v_all().has_label(&["person"]).values(&["age"]).mean().to_list()?;
    show("mean age:", &mean_age);

    let per_vertex = g
        .v_all()
        .has_label(&["person"])
        .local(anon().out(&[]).count())
        .fold()
        .to_list()?;
    show("out-degree per person:", &per_vertex);
    println!();
    Ok(())
}

fn demo_detachment(g: &GraphTraversalSource) -> Result<()> {
    println!("=== Demo 4: Detached results ===");
    let paths = g.v([1]).out(&["created"]).path().to_list()?;
    for path in &paths {
        let detached = detach(path, true);
        println!("  {}", serde_json::to_string(&detached)?);
    }
    Ok(())
}
