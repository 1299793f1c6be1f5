use std::path::PathBuf;
use tierview::{Command, Dataset, Explorer, ExplorerConfig};
use tracing_subscriber::EnvFilter;

// Usage: cargo run --example explore -- [dataset.json] [config.json]
//
// Without arguments a small built-in graph is used. Set RUST_LOG=tierview=debug
// to watch evictions and rebuilds.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let data = match args.next() {
        Some(path) => Dataset::from_path(&path)?,
        None => builtin(),
    };
    let mut config = ExplorerConfig::load(args.next().as_deref())?;
    config.seed.get_or_insert(42);
    config.node_budget = config.node_budget.max(12);

    let mut explorer = Explorer::from_dataset(config, data)?;
    report("initial", explorer.view());

    let clusters: Vec<String> = explorer
        .partition()
        .clusters()
        .iter()
        .map(|c| c.id.clone())
        .collect();
    for id in &clusters {
        if let Some(view) = explorer.dispatch(Command::Expand {
            node_id: id.clone(),
        }) {
            report(&format!("expand {id}"), &view);
        }
    }

    let center = explorer
        .view()
        .nodes
        .iter()
        .find(|n| n.is_real())
        .map(|n| n.id.clone());
    if let Some(center) = center {
        if let Some(view) = explorer.dispatch_token("neighbor-2", Some(&center))? {
            report(&format!("neighbor-2 {center}"), &view);
        }
    }

    if let Some(view) = explorer.dispatch_token("collapseAll", None)? {
        report("collapseAll", &view);
    }

    println!("{}", serde_json::to_string_pretty(&explorer.layout_tuning().settings)?);
    Ok(())
}

fn report(step: &str, view: &tierview::MixedView) {
    println!(
        "{step:>20}: {} nodes ({} aggregated), {} edges, {} warnings",
        view.nodes.len(),
        view.aggregated_count(),
        view.edges.len(),
        view.warnings.len()
    );
}

fn builtin() -> Dataset {
    Dataset::from_pairs(
        [
            "Myriel", "Napoleon", "Mlle.Baptistine", "Mme.Magloire", "CountessdeLo", "Geborand",
            "Valjean", "Marguerite", "Mme.deR", "Isabeau", "Gervais", "Tholomyes", "Listolier",
            "Fameuil", "Blacheville", "Favourite", "Dahlia", "Zephine", "Fantine",
        ],
        [
            ("Napoleon", "Myriel"),
            ("Mlle.Baptistine", "Myriel"),
            ("Mme.Magloire", "Myriel"),
            ("Mme.Magloire", "Mlle.Baptistine"),
            ("CountessdeLo", "Myriel"),
            ("Geborand", "Myriel"),
            ("Valjean", "Myriel"),
            ("Valjean", "Mlle.Baptistine"),
            ("Valjean", "Mme.Magloire"),
            ("Marguerite", "Valjean"),
            ("Mme.deR", "Valjean"),
            ("Isabeau", "Valjean"),
            ("Gervais", "Valjean"),
            ("Listolier", "Tholomyes"),
            ("Fameuil", "Tholomyes"),
            ("Fameuil", "Listolier"),
            ("Blacheville", "Tholomyes"),
            ("Blacheville", "Listolier"),
            ("Blacheville", "Fameuil"),
            ("Favourite", "Tholomyes"),
            ("Favourite", "Listolier"),
            ("Favourite", "Fameuil"),
            ("Favourite", "Blacheville"),
            ("Dahlia", "Favourite"),
            ("Zephine", "Dahlia"),
            ("Fantine", "Tholomyes"),
            ("Fantine", "Valjean"),
            ("Fantine", "Zephine"),
        ],
    )
}
