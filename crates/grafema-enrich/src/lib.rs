//! Cross-module enrichment passes (spec §4.5): each pass is a
//! [`grafema_orchestrate::Plugin`] of phase [`grafema_orchestrate::Phase::Enrichment`]
//! that adds edges or metadata to an already-indexed graph. Enrichment
//! passes never create new identity-bearing nodes for source entities —
//! per spec §3 "Lifecycle", a node's producer is the indexing pass; these
//! plugins only add edges (or, for unresolved references, a synthetic
//! `issue:*` node per the "Cross-file dangling edges policy").

pub mod alias_tracker;
pub mod argument_parameter_linker;
pub mod dangling_edges;
pub mod instance_of_resolver;
pub mod method_call_resolver;
pub mod rejection_propagation;

pub use alias_tracker::AliasTracker;
pub use argument_parameter_linker::ArgumentParameterLinker;
pub use dangling_edges::DanglingEdgeReconciler;
pub use instance_of_resolver::InstanceOfResolver;
pub use method_call_resolver::MethodCallResolver;
pub use rejection_propagation::RejectionPropagationEnricher;

#[cfg(test)]
mod tests;
