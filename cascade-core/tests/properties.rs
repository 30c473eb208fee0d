//! Property tests over randomly layered graphs.
//!
//! Each graph has a few signals followed by computations that sum an
//! arbitrary selection of earlier nodes. After every write, each computation
//! downstream of the written signal must have derived exactly once, nothing
//! else may have derived, and every value must match a direct evaluation of
//! the same graph.

use std::cell::Cell;
use std::rc::Rc;

use cascade_core::{Computed, Runtime, Signal};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Layout {
    sources: usize,
    /// Inputs of each computation, as indices into `sources ++ computations`.
    nodes: Vec<Vec<usize>>,
}

impl Layout {
    fn evaluate(&self, sources: &[i64]) -> Vec<i64> {
        let mut values = sources.to_vec();
        for (i, inputs) in self.nodes.iter().enumerate() {
            let sum: i64 = inputs.iter().map(|&input| values[input]).sum();
            values.push(sum + i as i64);
        }
        values
    }

    /// Which nodes the given signal reaches, including itself.
    fn reach(&self, source: usize) -> Vec<bool> {
        let mut reached: Vec<bool> = (0..self.sources).map(|i| i == source).collect();
        for inputs in &self.nodes {
            let hit = inputs.iter().any(|&input| reached[input]);
            reached.push(hit);
        }
        reached
    }
}

fn arb_layout() -> impl Strategy<Value = Layout> {
    (1usize..4, 1usize..12).prop_flat_map(|(sources, count)| {
        let nodes: Vec<_> = (0..count)
            .map(|i| proptest::collection::vec(0..sources + i, 1..=3))
            .collect();
        (Just(sources), nodes).prop_map(|(sources, nodes)| Layout { sources, nodes })
    })
}

#[derive(Clone)]
enum Input {
    Source(Signal<i64>),
    Derived(Computed<i64>),
}

impl Input {
    fn get(&self) -> i64 {
        match self {
            Input::Source(signal) => signal.get(),
            Input::Derived(computed) => computed.get(),
        }
    }
}

struct Graph {
    runtime: Runtime,
    signals: Vec<Signal<i64>>,
    computeds: Vec<Computed<i64>>,
    runs: Vec<Rc<Cell<usize>>>,
}

impl Graph {
    fn build(layout: &Layout) -> Self {
        let runtime = Runtime::new();
        let signals: Vec<Signal<i64>> = (0..layout.sources).map(|_| runtime.signal(0)).collect();
        let mut inputs: Vec<Input> = signals.iter().cloned().map(Input::Source).collect();
        let mut computeds = Vec::new();
        let mut runs = Vec::new();

        for (i, node_inputs) in layout.nodes.iter().enumerate() {
            let reads: Vec<Input> = node_inputs.iter().map(|&j| inputs[j].clone()).collect();
            let count = Rc::new(Cell::new(0));
            let offset = i as i64;
            let computed = runtime
                .computed({
                    let count = Rc::clone(&count);
                    move || {
                        count.set(count.get() + 1);
                        reads.iter().map(Input::get).sum::<i64>() + offset
                    }
                })
                .unwrap();
            inputs.push(Input::Derived(computed.clone()));
            computeds.push(computed);
            runs.push(count);
        }

        Self {
            runtime,
            signals,
            computeds,
            runs,
        }
    }

    fn values(&self) -> Vec<i64> {
        self.signals
            .iter()
            .map(Signal::get_untracked)
            .chain(self.computeds.iter().map(Computed::get_untracked))
            .collect()
    }

    fn reset_runs(&self) {
        for count in &self.runs {
            count.set(0);
        }
    }
}

proptest! {
    #[test]
    fn writes_derive_each_affected_node_once(
        layout in arb_layout(),
        writes in proptest::collection::vec((0usize..4, -50i64..50), 1..8),
    ) {
        let graph = Graph::build(&layout);
        let mut current = vec![0i64; layout.sources];
        prop_assert_eq!(graph.values(), layout.evaluate(&current));

        for (source, value) in writes {
            let source = source % layout.sources;
            let changed = current[source] != value;
            graph.reset_runs();

            graph.signals[source].set(value).unwrap();
            current[source] = value;

            let reach = layout.reach(source);
            for (i, count) in graph.runs.iter().enumerate() {
                let expected = usize::from(changed && reach[layout.sources + i]);
                prop_assert_eq!(count.get(), expected, "computation {} after writing source {}", i, source);
            }
            prop_assert_eq!(graph.values(), layout.evaluate(&current));
            prop_assert!(graph.runtime.is_idle());
        }
    }

    #[test]
    fn staleness_is_zero_between_writes(
        layout in arb_layout(),
        value in -50i64..50,
    ) {
        let graph = Graph::build(&layout);
        graph.signals[0].set(value).unwrap();

        for computed in &graph.computeds {
            prop_assert_eq!(computed.staleness(), 0);
        }
        prop_assert!(graph.runtime.is_idle());
    }
}
