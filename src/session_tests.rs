#[cfg(test)]
mod tests {
    use crate::layout::LayoutTuning;
    use crate::positions::Position;
    use crate::session::{Explorer, Simulation};
    use crate::view::{MixedView, Warning};
    use crate::{Command, Dataset, Error, ExplorerConfig, Result};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tracing_test::traced_test;

    /// Three triangles chained by single bridges: {a,b,c} - {x,y,z} - {p,q,r}.
    fn triangles() -> Dataset {
        Dataset::from_pairs(
            ["a", "b", "c", "x", "y", "z", "p", "q", "r"],
            [
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("x", "y"),
                ("y", "z"),
                ("z", "x"),
                ("p", "q"),
                ("q", "r"),
                ("r", "p"),
                ("c", "x"),
                ("z", "p"),
            ],
        )
    }

    fn explorer(node_budget: usize) -> Result<Explorer> {
        let config = ExplorerConfig {
            node_budget,
            seed: Some(7),
            ..Default::default()
        };
        Explorer::from_dataset(config, triangles())
    }

    fn cluster_of(explorer: &Explorer, node: &str) -> String {
        explorer.partition().cluster_of(node).unwrap().id.clone()
    }

    #[test]
    fn test_initial_view_is_all_collapsed() -> Result<()> {
        let explorer = explorer(20)?;
        let view = explorer.view();

        assert_eq!(explorer.partition().len(), 3);
        assert_eq!(view.nodes.len(), 3);
        assert!(view.nodes.iter().all(|n| n.is_aggregated() && n.count == Some(3)));
        // three self loops plus two bridges
        assert_eq!(view.edges.len(), 5);
        assert_eq!(view.edges.iter().filter(|e| e.is_loop()).count(), 3);
        assert!(view.warnings.is_empty());
        Ok(())
    }

    #[test]
    fn test_expand_collapse_round_trip() -> Result<()> {
        let mut explorer = explorer(20)?;
        let c = cluster_of(&explorer, "a");

        let view = explorer
            .dispatch(Command::Expand { node_id: c.clone() })
            .unwrap();
        assert_eq!(view.nodes.len(), 5);
        assert!(view.node("a").unwrap().is_real());
        assert_eq!(view.node("a").unwrap().parent_id.as_deref(), Some(c.as_str()));
        // c-x becomes a virtual edge from the real endpoint to x's aggregate
        let xc = cluster_of(&explorer, "x");
        assert!(view
            .edges
            .iter()
            .any(|e| e.is_virtual && e.source == "c" && e.target == xc));

        let view = explorer
            .dispatch(Command::Collapse { node_id: "b".into() })
            .unwrap();
        assert_eq!(view.nodes.len(), 3);
        assert_eq!(view.node(&c).unwrap().count, Some(3));
        Ok(())
    }

    #[test]
    fn test_collapse_by_cluster_id_after_expand() -> Result<()> {
        let mut explorer = explorer(20)?;
        let c = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: c.clone() });
        assert!(explorer.view().node(&c).is_none());

        let view = explorer
            .dispatch(Command::Collapse { node_id: c.clone() })
            .unwrap();
        assert!(view.node(&c).is_some_and(|n| n.is_aggregated()));
        assert!(view.node("a").is_none());
        assert!(!explorer.tracker().is_expanded(&c));
        Ok(())
    }

    #[test]
    fn test_collapse_is_idempotent() -> Result<()> {
        let mut explorer = explorer(20)?;
        let c = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: c.clone() });

        assert!(explorer.dispatch(Command::Collapse { node_id: c.clone() }).is_some());
        let before = explorer.view().clone();
        assert!(explorer.dispatch(Command::Collapse { node_id: c }).is_none());
        assert_eq!(explorer.view(), &before);
        Ok(())
    }

    #[test]
    fn test_expand_real_or_expanded_node_is_noop() -> Result<()> {
        let mut explorer = explorer(20)?;
        let c = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: c.clone() });

        assert!(explorer.dispatch(Command::Expand { node_id: "a".into() }).is_none());
        assert!(explorer.dispatch(Command::Expand { node_id: "missing".into() }).is_none());
        Ok(())
    }

    #[test]
    fn test_budget_evicts_oldest_expansion() -> Result<()> {
        let mut explorer = explorer(6)?;
        let first = cluster_of(&explorer, "a");
        let second = cluster_of(&explorer, "x");

        explorer.dispatch(Command::Expand { node_id: first.clone() });
        let view = explorer
            .dispatch(Command::Expand { node_id: second.clone() })
            .unwrap();

        assert!(view.nodes.len() <= 6);
        assert!(!explorer.tracker().is_expanded(&first));
        assert!(explorer.tracker().is_expanded(&second));
        assert!(view.node(&first).is_some_and(|n| n.is_aggregated()));
        assert_eq!(explorer.tracker().collapsed()[0].parent_id.as_deref(), Some(first.as_str()));
        Ok(())
    }

    #[traced_test]
    #[test]
    fn test_cluster_larger_than_budget_is_refused() -> Result<()> {
        let mut explorer = explorer(2)?;
        let c = cluster_of(&explorer, "a");
        assert!(explorer.dispatch(Command::Expand { node_id: c }).is_none());
        assert_eq!(explorer.view().nodes.len(), 3);
        assert!(explorer.tracker().expanded().is_empty());
        assert!(logs_contain("cluster has more members than the node budget"));
        Ok(())
    }

    fn budgeted(node_budget: usize, data: Dataset) -> Result<Explorer> {
        let config = ExplorerConfig {
            node_budget,
            seed: Some(3),
            ..Default::default()
        };
        Explorer::from_dataset(config, data)
    }

    fn expanded_ids(explorer: &Explorer) -> Vec<String> {
        explorer
            .tracker()
            .expanded()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    #[test]
    fn test_third_unrelated_expansion_evicts_first() -> Result<()> {
        // room for two expanded pairs next to the third aggregate
        let data = Dataset::from_pairs(
            ["a", "b", "c", "d", "e", "f"],
            [("a", "b"), ("c", "d"), ("e", "f")],
        );
        let mut explorer = budgeted(5, data)?;
        let [first, second, third] = ["a", "c", "e"].map(|n| cluster_of(&explorer, n));

        assert!(explorer.dispatch(Command::Expand { node_id: first.clone() }).is_some());
        assert!(explorer.dispatch(Command::Expand { node_id: second.clone() }).is_some());
        assert_eq!(expanded_ids(&explorer), vec![first.clone(), second.clone()]);

        let view = explorer
            .dispatch(Command::Expand { node_id: third.clone() })
            .unwrap();
        assert_eq!(expanded_ids(&explorer), vec![second, third]);
        assert_eq!(view.nodes.len(), 5);
        assert!(view.node(&first).is_some_and(|n| n.is_aggregated()));
        Ok(())
    }

    #[test]
    fn test_expansion_accepted_when_aggregates_alone_exceed_budget() -> Result<()> {
        let data = Dataset::from_pairs(["a", "b", "c"], []);
        let mut explorer = budgeted(2, data)?;
        assert_eq!(explorer.partition().len(), 3);

        for node in ["a", "b", "c"] {
            let c = cluster_of(&explorer, node);
            assert!(explorer.dispatch(Command::Expand { node_id: c.clone() }).is_some());
            assert!(explorer.tracker().is_expanded(&c));
            assert_eq!(explorer.view().nodes.len(), 3);
        }
        Ok(())
    }

    #[traced_test]
    #[test]
    fn test_many_clusters_can_still_expand() -> Result<()> {
        let names: Vec<(String, String)> = (0..25)
            .map(|i| (format!("s{i}"), format!("t{i}")))
            .collect();
        let data = Dataset::from_pairs(
            names.iter().flat_map(|(s, t)| [s.as_str(), t.as_str()]),
            names.iter().map(|(s, t)| (s.as_str(), t.as_str())),
        );
        let mut explorer = budgeted(20, data)?;
        assert_eq!(explorer.partition().len(), 25);

        let first = cluster_of(&explorer, "s0");
        let view = explorer
            .dispatch(Command::Expand { node_id: first.clone() })
            .unwrap();
        assert_eq!(view.nodes.len(), 26);
        assert!(logs_contain("view stays over the node budget"));

        let second = cluster_of(&explorer, "s1");
        assert!(explorer.dispatch(Command::Expand { node_id: second.clone() }).is_some());
        assert_eq!(expanded_ids(&explorer), vec![second]);
        assert_eq!(explorer.view().nodes.len(), 26);
        Ok(())
    }

    #[test]
    fn test_collapse_all() -> Result<()> {
        let mut explorer = explorer(20)?;
        assert!(explorer.dispatch(Command::CollapseAll).is_none());

        let a = cluster_of(&explorer, "a");
        let x = cluster_of(&explorer, "x");
        explorer.dispatch(Command::Expand { node_id: a });
        explorer.dispatch(Command::Expand { node_id: x });
        let view = explorer.dispatch(Command::CollapseAll).unwrap();

        assert_eq!(view.aggregated_count(), 3);
        assert!(explorer.tracker().expanded().is_empty());
        assert!(explorer.tracker().collapsed().is_empty());
        Ok(())
    }

    #[test]
    fn test_hide_and_show() -> Result<()> {
        let mut explorer = explorer(20)?;
        let x = cluster_of(&explorer, "x");

        let view = explorer.dispatch(Command::Hide { item_id: x.clone() }).unwrap();
        assert!(view.node(&x).unwrap().hidden);
        assert!(view
            .edges
            .iter()
            .filter(|e| e.source == x || e.target == x)
            .all(|e| e.hidden));
        assert!(view.edges.iter().any(|e| !e.hidden));

        // hidden items survive a rebuild
        let a = cluster_of(&explorer, "a");
        let view = explorer.dispatch(Command::Expand { node_id: a }).unwrap();
        assert!(view.node(&x).unwrap().hidden);

        let view = explorer.dispatch(Command::Show).unwrap();
        assert!(view.nodes.iter().all(|n| !n.hidden));
        assert!(view.edges.iter().all(|e| !e.hidden));
        assert!(explorer.dispatch(Command::Show).is_none());
        Ok(())
    }

    #[test]
    fn test_neighbors_grow_cluster() -> Result<()> {
        let mut explorer = explorer(50)?;
        let c = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: c.clone() });

        let before = explorer.view().nodes.len();
        let view = explorer
            .dispatch(Command::Neighbors {
                node_id: "a".into(),
                steps: 1,
            })
            .unwrap();
        let added = view.nodes.len() - before;
        assert!((1..=10).contains(&added));
        assert_eq!(explorer.partition().cluster(&c).unwrap().members.len(), 3 + added);
        assert!(view
            .nodes
            .iter()
            .filter(|n| n.id.starts_with("nb-"))
            .all(|n| n.cluster_id.as_deref() == Some(c.as_str())));

        let view = explorer.dispatch(Command::Collapse { node_id: c.clone() }).unwrap();
        assert_eq!(view.node(&c).unwrap().count, Some(3 + added));
        Ok(())
    }

    #[test]
    fn test_neighbors_rejected_cases() -> Result<()> {
        let mut explorer = explorer(50)?;
        let c = cluster_of(&explorer, "a");
        // aggregated center
        assert!(explorer
            .dispatch(Command::Neighbors {
                node_id: c.clone(),
                steps: 1
            })
            .is_none());
        explorer.dispatch(Command::Expand { node_id: c });
        // zero steps
        assert!(explorer
            .dispatch(Command::Neighbors {
                node_id: "a".into(),
                steps: 0
            })
            .is_none());
        Ok(())
    }

    #[test]
    fn test_dispatch_token() -> Result<()> {
        let mut explorer = explorer(20)?;
        let c = cluster_of(&explorer, "a");

        let view = explorer.dispatch_token("expand", Some(&c))?.unwrap();
        assert_eq!(view.nodes.len(), 5);
        let view = explorer.dispatch_token("neighbor-1", Some("b"))?.unwrap();
        assert!(view.nodes.len() > 5);
        assert!(explorer.dispatch_token("collapseAll", None)?.is_some());

        assert!(matches!(
            explorer.dispatch_token("teleport", Some("a")),
            Err(Error::UnknownAction(_))
        ));
        Ok(())
    }

    #[test]
    fn test_change_node_color_persists() -> Result<()> {
        let mut explorer = explorer(20)?;
        let c = cluster_of(&explorer, "a");

        let view = explorer
            .dispatch(Command::ChangeNodeColor {
                node_id: c.clone(),
                fill: Some("#123456".into()),
                stroke: None,
            })
            .unwrap();
        let color = &view.node(&c).unwrap().color;
        assert_eq!(color.main_fill, "#123456");
        assert_eq!(color.main_stroke, "#fff");

        let x = cluster_of(&explorer, "x");
        let view = explorer.dispatch(Command::Expand { node_id: x }).unwrap();
        assert_eq!(view.node(&c).unwrap().color.main_fill, "#123456");
        Ok(())
    }

    #[test]
    fn test_change_edge_rewires_and_strokes() -> Result<()> {
        let mut explorer = explorer(20)?;
        let a = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: a });
        let edge = explorer
            .view()
            .edges
            .iter()
            .find(|e| e.is_real && e.source == "a" && e.target == "b")
            .map(|e| e.id.clone())
            .unwrap();

        let view = explorer
            .dispatch(Command::ChangeEdgeColor {
                edge_id: edge.clone(),
                source: Some("c".into()),
                target: Some("b".into()),
                stroke: Some("#ff0000".into()),
            })
            .unwrap();
        let e = view.edge(&edge).unwrap();
        assert_eq!((e.source.as_str(), e.target.as_str()), ("c", "b"));
        assert_eq!(e.style.stroke, "#ff0000");
        assert_eq!(view.node("a").unwrap().degree, 1);
        Ok(())
    }

    #[test]
    fn test_click_payloads() -> Result<()> {
        let mut explorer = explorer(20)?;
        let a = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: a });

        assert_eq!(explorer.node_click("a").unwrap().id, "a");
        assert!(explorer.node_click("nope").is_none());

        let edge = explorer.view().edges.iter().find(|e| e.is_real).unwrap().clone();
        let payload = explorer.edge_click(&edge.id).unwrap();
        assert_eq!(payload.source, edge.source);
        assert_eq!(payload.label, format!("{}-{}", edge.source, edge.target));
        Ok(())
    }

    #[test]
    fn test_positions_survive_rebuild() -> Result<()> {
        let mut explorer = explorer(20)?;
        let a = cluster_of(&explorer, "a");
        let x = cluster_of(&explorer, "x");
        explorer.sync_positions([
            (a.as_str(), Position::new(100.0, 100.0)),
            (x.as_str(), Position::new(-40.0, 5.0)),
        ]);

        let view = explorer.dispatch(Command::Expand { node_id: a.clone() }).unwrap();
        assert_eq!(view.node(&x).unwrap().position, Some(Position::new(-40.0, 5.0)));
        for id in ["a", "b", "c"] {
            let p = view.node(id).unwrap().position.unwrap();
            let d = ((p.x - 100.0).powi(2) + (p.y - 100.0).powi(2)).sqrt();
            assert!((d - 30.0).abs() < 1e-9, "{id} at distance {d}");
        }

        let tuning = explorer.layout_tuning();
        assert_eq!(tuning.node(&x).unwrap().mass, 5.0);
        assert_eq!(tuning.node("a").unwrap().mass, 1.0);
        assert_eq!(tuning.settings.min_movement, 0.0001);
        Ok(())
    }

    #[traced_test]
    #[test]
    fn test_dangling_dataset_edge_is_dropped() -> Result<()> {
        let mut data = triangles();
        data.edges.push(crate::graph::RawEdge::new("a", "ghost"));
        let config = ExplorerConfig {
            seed: Some(7),
            ..Default::default()
        };
        let explorer = Explorer::from_dataset(config, data)?;

        assert_eq!(explorer.view().nodes.len(), 3);
        assert!(matches!(
            explorer.view().warnings.as_slice(),
            [Warning::DanglingEdge { target_id, .. }] if target_id == "ghost"
        ));
        assert!(logs_contain("ghost"));
        Ok(())
    }

    #[derive(Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl Simulation for Recorder {
        fn stop(&mut self) {
            self.calls.borrow_mut().push("stop".into());
        }

        fn start(&mut self, view: &MixedView, tuning: &LayoutTuning) {
            assert_eq!(view.nodes.len(), tuning.nodes.len());
            self.calls
                .borrow_mut()
                .push(format!("start:{}", view.nodes.len()));
        }
    }

    #[test]
    fn test_simulation_stopped_before_restart() -> Result<()> {
        let mut explorer = explorer(20)?;
        let calls = Rc::new(RefCell::new(Vec::new()));
        explorer.attach_simulation(Box::new(Recorder {
            calls: Rc::clone(&calls),
        }));

        let a = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: a });
        assert_eq!(*calls.borrow(), vec!["stop".to_string(), "start:5".to_string()]);

        // hiding does not restart the simulation
        explorer.dispatch(Command::Hide { item_id: "a".into() });
        assert_eq!(calls.borrow().len(), 2);
        assert!(explorer.detach_simulation().is_some());
        Ok(())
    }

    #[test]
    fn test_set_dataset_resets_state() -> Result<()> {
        let mut explorer = explorer(20)?;
        let a = cluster_of(&explorer, "a");
        explorer.dispatch(Command::Expand { node_id: a });
        explorer.dispatch(Command::Hide { item_id: "b".into() });

        let view = explorer.set_dataset(Dataset::from_pairs(["m", "n"], [("m", "n")]));
        assert_eq!(view.nodes.len(), 1);
        assert!(view.nodes.iter().all(|n| !n.hidden));
        assert!(explorer.tracker().expanded().is_empty());
        Ok(())
    }

    #[derive(Debug, Clone)]
    enum Op {
        Expand(usize),
        Collapse(usize),
        CollapseAll,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0usize..3).prop_map(Op::Expand),
            2 => (0usize..3).prop_map(Op::Collapse),
            1 => Just(Op::CollapseAll),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Whatever the user does, the settled view fits in the budget and
        /// collapsed clusters report their full member count.
        #[test]
        fn prop_view_respects_budget(budget in 5usize..10, ops in proptest::collection::vec(op(), 1..12)) {
            let mut explorer = explorer(budget).unwrap();
            let clusters: Vec<String> = explorer
                .partition()
                .clusters()
                .iter()
                .map(|c| c.id.clone())
                .collect();

            for op in ops {
                match op {
                    Op::Expand(i) => {
                        explorer.dispatch(Command::Expand { node_id: clusters[i].clone() });
                    }
                    Op::Collapse(i) => {
                        let was_expanded = explorer.tracker().is_expanded(&clusters[i]);
                        let changed = explorer
                            .dispatch(Command::Collapse { node_id: clusters[i].clone() })
                            .is_some();
                        prop_assert_eq!(changed, was_expanded);
                        prop_assert!(!explorer.tracker().is_expanded(&clusters[i]));
                        prop_assert!(explorer.view().node(&clusters[i]).is_some());
                    }
                    Op::CollapseAll => {
                        explorer.dispatch(Command::CollapseAll);
                    }
                }

                let view = explorer.view();
                prop_assert!(view.nodes.len() <= budget, "{} nodes > {}", view.nodes.len(), budget);
                for node in view.nodes.iter().filter(|n| n.is_aggregated()) {
                    prop_assert_eq!(node.count, Some(3));
                }
                let ids: std::collections::HashSet<&str> =
                    view.nodes.iter().map(|n| n.id.as_str()).collect();
                prop_assert!(view
                    .edges
                    .iter()
                    .all(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str())));
            }
        }
    }
}
