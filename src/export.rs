//! Graphviz rendering of genotypes.

use crate::genotype::{Genotype, NodeKind};

/// Edge color: grey when disabled, otherwise red for negative and blue for positive weights,
/// brighter with magnitude
fn edge_color(weight: f64, enabled: bool) -> String {
    if !enabled {
        return "#888888".into();
    }
    let level = (weight.abs() * 128.).round().clamp(0., 255.) as u8;
    if weight < 0. {
        format!("#{level:02x}0000")
    } else {
        format!("#0000{level:02x}")
    }
}

/// Render `genotype` as a left to right digraph. Bias and inputs share the first rank, outputs
/// the last one.
pub fn to_dot(genotype: &Genotype) -> String {
    let mut dot = String::from("digraph {\n");
    dot.push_str("  rankdir=\"LR\"\n");
    dot.push_str("  splines=polyline\n");
    dot.push_str("  node [style=filled fontsize=16]\n");
    dot.push_str("  edge [arrowhead=onormal penwidth=0.5]\n\n");

    let line = |id: usize, kind: NodeKind| match kind {
        NodeKind::Bias => format!("    node_{id} [label=\"{id}\\nBias\" shape=diamond]\n"),
        _ => format!("    node_{id} [label=\"{id}\"]\n"),
    };
    let nodes = |kinds: &[NodeKind]| {
        genotype
            .nodes()
            .iter()
            .filter(|(_, k)| kinds.contains(*k))
            .map(|(id, k)| line(*id, *k))
            .collect::<String>()
    };

    let hidden = nodes(&[NodeKind::Hidden]);
    dot.push_str(&format!(
        "  subgraph {{\n    rank=same\n    node [shape=square fillcolor=cyan]\n{}  }}\n",
        nodes(&[NodeKind::Bias, NodeKind::Input])
    ));
    if !hidden.is_empty() {
        dot.push_str(&format!(
            "  subgraph {{\n    node [shape=circle fillcolor=lightblue]\n{hidden}  }}\n"
        ));
    }
    dot.push_str(&format!(
        "  subgraph {{\n    rank=same\n    node [shape=square fillcolor=red]\n{}  }}\n\n",
        nodes(&[NodeKind::Output])
    ));

    for c in genotype.connections() {
        dot.push_str(&format!(
            "  node_{} -> node_{} [color=\"{}\"]\n",
            c.source,
            c.target,
            edge_color(c.weight, c.enabled)
        ));
    }
    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::genotype::{test::registry_io, ConnectionSpec, GenotypeSpec};

    #[test]
    fn test_edge_color() {
        assert_eq!(edge_color(5., false), "#888888");
        assert_eq!(edge_color(1., true), "#000080");
        assert_eq!(edge_color(-0.5, true), "#400000");
        assert_eq!(edge_color(100., true), "#0000ff");
    }

    #[test]
    fn test_to_dot() {
        let (mut r, i, o) = registry_io(1, 1);
        let inno = r.register_connection(i[0], o[0]).unwrap();
        let h = r.register_split(inno).unwrap();
        let spec = GenotypeSpec::new(
            [i[0], o[0], h],
            [
                ConnectionSpec::new(i[0], o[0], 1., false),
                ConnectionSpec::new(i[0], h, 1., true),
                ConnectionSpec::new(h, o[0], -1., true),
            ],
        );
        let g = Genotype::from_spec(0, &spec, &mut r).unwrap();
        let dot = to_dot(&g);

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("node_0 [label=\"0\\nBias\" shape=diamond]"));
        assert!(dot.contains(&format!("node_{h} [label=\"{h}\"]")));
        assert!(dot.contains(&format!("node_{} -> node_{} [color=\"#888888\"]", i[0], o[0])));
        assert!(dot.contains(&format!("node_{h} -> node_{} [color=\"#800000\"]", o[0])));
        assert_eq!(dot.matches(" -> ").count(), 3);
        assert!(dot.ends_with("}\n"));
    }
}
