//! Serverless routing policies.
//!
//! A routing policy is a pure selection function over a momentary list of
//! warm function instances; the dispatch layer then issues burst requests
//! against the chosen instance's machine. Policies are deterministic so
//! simulation runs stay reproducible.

use crate::compute::MachineId;

/// A deployed serverless function.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
}

/// A warm instance able to serve invocations of one function.
#[derive(Debug, Clone)]
pub struct FunctionInstance {
    pub id: u64,
    pub machine: MachineId,
    pub active_invocations: u32,
    pub max_concurrency: u32,
}

impl FunctionInstance {
    pub fn has_capacity(&self) -> bool {
        self.active_invocations < self.max_concurrency
    }
}

/// Routing policy: picks the candidate index an invocation should go to,
/// or `None` when no candidate qualifies.
pub trait RoutingPolicy {
    fn select(
        &self,
        instances: &[FunctionInstance],
        function: &FunctionDescriptor,
    ) -> Option<usize>;
}

/// First listed instance with spare concurrency.
pub struct FirstAvailable;

impl RoutingPolicy for FirstAvailable {
    fn select(
        &self,
        instances: &[FunctionInstance],
        _function: &FunctionDescriptor,
    ) -> Option<usize> {
        instances.iter().position(FunctionInstance::has_capacity)
    }
}

/// Instance with the fewest active invocations; first listed wins ties.
pub struct LeastActive;

impl RoutingPolicy for LeastActive {
    fn select(
        &self,
        instances: &[FunctionInstance],
        _function: &FunctionDescriptor,
    ) -> Option<usize> {
        instances
            .iter()
            .enumerate()
            .filter(|(_, inst)| inst.has_capacity())
            .min_by_key(|(_, inst)| inst.active_invocations)
            .map(|(i, _)| i)
    }
}
