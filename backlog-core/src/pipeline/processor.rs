//! Processors and pipelines

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

use super::Exchange;

/// One unit of work applied to an exchange
pub trait Processor: Send + Sync {
    /// Process the exchange
    fn process(&self, exchange: &mut Exchange) -> Result<()>;

    /// Called when the owning route is torn down
    fn stop(&self) {}
}

/// Adapter turning a closure into a [`Processor`]
pub struct FnProcessor<F> {
    f: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(&mut Exchange) -> Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Processor for FnProcessor<F>
where
    F: Fn(&mut Exchange) -> Result<()> + Send + Sync,
{
    fn process(&self, exchange: &mut Exchange) -> Result<()> {
        (self.f)(exchange)
    }
}

impl<F> fmt::Debug for FnProcessor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnProcessor")
    }
}

/// Shorthand for a shared closure processor
pub fn processor_fn<F>(f: F) -> Arc<dyn Processor>
where
    F: Fn(&mut Exchange) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnProcessor::new(f))
}

/// Runs processors in order, stopping at the first failure
#[derive(Clone, Default)]
pub struct Pipeline {
    processors: Vec<Arc<dyn Processor>>,
}

impl Pipeline {
    pub fn new(processors: Vec<Arc<dyn Processor>>) -> Self {
        Self { processors }
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Processor for Pipeline {
    fn process(&self, exchange: &mut Exchange) -> Result<()> {
        for processor in &self.processors {
            processor.process(exchange)?;
        }
        Ok(())
    }

    fn stop(&self) {
        for processor in &self.processors {
            processor.stop();
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("processors", &self.processors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BacklogError;

    #[test]
    fn test_pipeline_runs_in_order() {
        let pipeline = Pipeline::new(vec![
            processor_fn(|ex| {
                ex.set_body("a");
                Ok(())
            }),
            processor_fn(|ex| {
                ex.set_header("seen", true);
                Ok(())
            }),
        ]);

        let mut exchange = Exchange::new();
        pipeline.process(&mut exchange).unwrap();

        assert_eq!(exchange.body().type_name(), "text");
        assert!(exchange.get_header("seen").is_some());
    }

    #[test]
    fn test_pipeline_stops_at_first_failure() {
        let pipeline = Pipeline::new(vec![
            processor_fn(|_| {
                Err(BacklogError::ProcessingFailed {
                    node_id: "to1".to_string(),
                    reason: "refused".to_string(),
                })
            }),
            processor_fn(|ex| {
                ex.set_header("reached", true);
                Ok(())
            }),
        ]);

        let mut exchange = Exchange::new();
        assert!(pipeline.process(&mut exchange).is_err());
        assert!(exchange.get_header("reached").is_none());
    }
}
