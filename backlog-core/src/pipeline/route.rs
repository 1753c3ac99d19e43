//! Route definitions and interception at build time

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use super::{NodeDefinition, Pipeline, Processor};

/// Hook consulted once per node while a route is being built
///
/// Implementations may return the target unchanged or a processor that
/// decorates it.
pub trait InterceptStrategy: Send + Sync {
    /// Wrap the processor of `node`
    fn wrap_processor(
        &self,
        route: Option<&RouteDefinition>,
        node: &Arc<NodeDefinition>,
        target: Arc<dyn Processor>,
    ) -> Arc<dyn Processor>;

    /// Access to the concrete strategy, for lookups by type
    fn as_any(&self) -> &dyn Any;
}

/// One output of a route: its definition and the processor implementing it
#[derive(Clone)]
pub struct RouteOutput {
    pub node: Arc<NodeDefinition>,
    pub processor: Arc<dyn Processor>,
}

/// An ordered list of nodes sharing one entry point
#[derive(Clone, Default)]
pub struct RouteDefinition {
    id: Option<String>,
    outputs: Vec<RouteOutput>,
}

impl RouteDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a node and the processor implementing it
    pub fn to(mut self, node: NodeDefinition, processor: Arc<dyn Processor>) -> Self {
        self.outputs.push(RouteOutput {
            node: Arc::new(node),
            processor,
        });
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn outputs(&self) -> &[RouteOutput] {
        &self.outputs
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<NodeDefinition>> {
        self.outputs.iter().map(|output| &output.node)
    }

    /// Whether `node` is the first output of this route
    pub fn is_first_output(&self, node: &NodeDefinition) -> bool {
        self.outputs
            .first()
            .map(|first| first.node.key() == node.key())
            .unwrap_or(false)
    }
}

/// Builds runnable pipelines from route definitions
#[derive(Clone, Default)]
pub struct RouteBuilder {
    strategies: Vec<Arc<dyn InterceptStrategy>>,
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intercept strategy
    ///
    /// Strategies registered first end up outermost.
    pub fn intercept(mut self, strategy: Arc<dyn InterceptStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategies(&self) -> &[Arc<dyn InterceptStrategy>] {
        &self.strategies
    }

    /// Build the route into a pipeline, applying every strategy to each node
    pub fn build(&self, route: &RouteDefinition) -> Pipeline {
        let processors = route
            .outputs()
            .iter()
            .map(|output| {
                let mut processor = output.processor.clone();
                for strategy in self.strategies.iter().rev() {
                    processor = strategy.wrap_processor(Some(route), &output.node, processor);
                }
                processor
            })
            .collect();

        debug!(
            route_id = route.id().unwrap_or("<none>"),
            nodes = route.outputs().len(),
            "built route"
        );

        Pipeline::new(processors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{processor_fn, Exchange};

    struct Tagging(&'static str);

    impl InterceptStrategy for Tagging {
        fn wrap_processor(
            &self,
            _route: Option<&RouteDefinition>,
            _node: &Arc<NodeDefinition>,
            target: Arc<dyn Processor>,
        ) -> Arc<dyn Processor> {
            let tag = self.0;
            processor_fn(move |ex| {
                let mut trail = ex
                    .get_header("trail")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                trail.push_str(tag);
                ex.set_header("trail", trail);
                target.process(ex)
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_first_output() {
        let route = RouteDefinition::new()
            .with_id("orders")
            .to(NodeDefinition::new("from"), processor_fn(|_| Ok(())))
            .to(NodeDefinition::new("to"), processor_fn(|_| Ok(())));

        let nodes: Vec<_> = route.nodes().cloned().collect();
        assert!(route.is_first_output(&nodes[0]));
        assert!(!route.is_first_output(&nodes[1]));
        assert!(!route.is_first_output(&NodeDefinition::new("from")));
    }

    #[test]
    fn test_first_registered_strategy_is_outermost() {
        let route = RouteDefinition::new().to(NodeDefinition::new("to"), processor_fn(|_| Ok(())));
        let pipeline = RouteBuilder::new()
            .intercept(Arc::new(Tagging("a")))
            .intercept(Arc::new(Tagging("b")))
            .build(&route);

        let mut exchange = Exchange::new();
        pipeline.process(&mut exchange).unwrap();
        assert_eq!(exchange.get_header("trail").unwrap(), "ab");
    }
}
