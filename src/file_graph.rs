use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{Graph, NodeIndex};

use prost_types::FileDescriptorProto;

use crate::error::{GeneratorError, GeneratorResult};

/// `FileGraph` builds a graph of the request's files whose edges correspond
/// to imports. The request driver uses it to reject requests whose files
/// are missing a dependency or form an import cycle before any emission
/// starts.
pub struct FileGraph {
    /// Map<file name, graph node index>
    index: HashMap<String, NodeIndex>,
    /// Graph with file name as node weight.
    graph: Graph<String, ()>,
}

impl FileGraph {
    pub fn new<'a>(
        files: impl Iterator<Item = &'a FileDescriptorProto>,
    ) -> GeneratorResult<FileGraph> {
        let mut file_graph = FileGraph {
            index: HashMap::new(),
            graph: Graph::new(),
        };

        // Two passes: protoc sends files in dependency order, but the graph
        // has to exist in full before edges are checked so that a forward
        // reference is reported as a missing dependency, not a crash.
        let files: Vec<&FileDescriptorProto> = files.collect();
        for file in &files {
            let name = file.name().to_string();
            let node = file_graph.graph.add_node(name.clone());
            file_graph.index.insert(name, node);
        }

        for file in &files {
            let from = file_graph.index[file.name()];
            for dependency in &file.dependency {
                let to = match file_graph.index.get(dependency.as_str()) {
                    Some(to) => *to,
                    None => {
                        return Err(GeneratorError::MissingDependency {
                            file: file.name().to_string(),
                            dependency: dependency.clone(),
                        })
                    }
                };
                file_graph.graph.add_edge(from, to, ());
            }
        }

        if let Err(cycle) = toposort(&file_graph.graph, None) {
            return Err(GeneratorError::DependencyCycle(
                file_graph.graph[cycle.node_id()].clone(),
            ));
        }

        Ok(file_graph)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.index.contains_key(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, deps: &[&str]) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(name.to_string()),
            dependency: deps.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_linked() {
        let files = vec![
            file("a.proto", &[]),
            file("b.proto", &["a.proto"]),
            file("c.proto", &["a.proto", "b.proto"]),
        ];
        let graph = FileGraph::new(files.iter()).unwrap();
        assert!(graph.contains("b.proto"));
        assert!(!graph.contains("d.proto"));
    }

    #[test]
    fn test_missing_dependency() {
        let files = vec![file("b.proto", &["a.proto"])];
        match FileGraph::new(files.iter()) {
            Err(GeneratorError::MissingDependency { file, dependency }) => {
                assert_eq!(file, "b.proto");
                assert_eq!(dependency, "a.proto");
            }
            other => panic!("expected MissingDependency, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_cycle() {
        let files = vec![file("a.proto", &["b.proto"]), file("b.proto", &["a.proto"])];
        assert!(matches!(
            FileGraph::new(files.iter()),
            Err(GeneratorError::DependencyCycle(_))
        ));
    }
}
