pub mod counterfactual;
pub mod ranker;
pub mod sampler;
pub mod surrogate;

pub use counterfactual::{synthesize, CounterfactualEdit};
pub use ranker::AttributionRanker;
pub use sampler::sample;
pub use surrogate::{DegenerateReason, LocalSurrogate, SurrogateFit, SurrogateWeights};
